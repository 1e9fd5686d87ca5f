use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single chat session
///
/// `result` holds either pretty-printed quest JSON or an error line; the
/// persisted form does not tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    /// Unique id derived from the creation timestamp
    pub id: String,
    /// User-editable title
    pub title: String,
    /// Last edited setting text
    pub setting: String,
    /// Last generation result text
    pub result: String,
}

impl ChatSession {
    /// Create a session with the given id and title and empty content
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            setting: String::new(),
            result: String::new(),
        }
    }
}

/// On-disk shape of a session; the id is the enclosing map key
#[derive(Serialize)]
struct StoredChatRef<'a> {
    title: &'a str,
    setting: &'a str,
    result: &'a str,
}

#[derive(Deserialize)]
struct StoredChat {
    #[serde(default)]
    title: String,
    #[serde(default)]
    setting: String,
    #[serde(default)]
    result: String,
}

/// Insertion-ordered mapping of chat id to session
///
/// Serializes as one JSON object whose key order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatStore {
    sessions: Vec<ChatSession>,
}

impl ChatStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// True when `id` is present
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    /// Session by id
    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Mutable session by id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Insert a session, replacing an existing entry in place
    pub fn insert(&mut self, session: ChatSession) {
        match self.get_mut(&session.id) {
            Some(existing) => *existing = session,
            None => self.sessions.push(session),
        }
    }

    /// Remove a session by id
    pub fn remove(&mut self, id: &str) -> Option<ChatSession> {
        let index = self.sessions.iter().position(|s| s.id == id)?;
        Some(self.sessions.remove(index))
    }

    /// First session in insertion order
    pub fn first(&self) -> Option<&ChatSession> {
        self.sessions.first()
    }

    /// Sessions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ChatSession> {
        self.sessions.iter()
    }
}

impl Serialize for ChatStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sessions.len()))?;
        for session in &self.sessions {
            map.serialize_entry(
                &session.id,
                &StoredChatRef {
                    title: &session.title,
                    setting: &session.setting,
                    result: &session.result,
                },
            )?;
        }
        map.end()
    }
}

struct ChatStoreVisitor;

impl<'de> Visitor<'de> for ChatStoreVisitor {
    type Value = ChatStore;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of chat id to chat session")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut store = ChatStore::new();
        while let Some((id, chat)) = access.next_entry::<String, StoredChat>()? {
            store.insert(ChatSession {
                id,
                title: chat.title,
                setting: chat.setting,
                result: chat.result,
            });
        }
        Ok(store)
    }
}

impl<'de> Deserialize<'de> for ChatStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ChatStoreVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, title: &str) -> ChatSession {
        ChatSession::new(id, title)
    }

    #[test]
    fn test_serialization_keeps_insertion_order() {
        let mut store = ChatStore::new();
        store.insert(session("300", "Third by id"));
        store.insert(session("100", "First by id"));

        let json = serde_json::to_string(&store).unwrap();
        assert!(json.find("\"300\"").unwrap() < json.find("\"100\"").unwrap());

        let parsed: ChatStore = serde_json::from_str(&json).unwrap();
        let ids: Vec<&str> = parsed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["300", "100"]);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let parsed: ChatStore = serde_json::from_str(r#"{"1":{"title":"Chat 1"}}"#).unwrap();
        let chat = parsed.get("1").unwrap();
        assert_eq!(chat.title, "Chat 1");
        assert!(chat.setting.is_empty());
        assert!(chat.result.is_empty());
    }

    #[test]
    fn test_duplicate_keys_keep_first_position() {
        let parsed: ChatStore =
            serde_json::from_str(r#"{"a":{"title":"old"},"b":{"title":"b"},"a":{"title":"new"}}"#)
                .unwrap();
        let titles: Vec<&str> = parsed.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "b"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut store = ChatStore::new();
        store.insert(session("1", "one"));
        store.insert(session("2", "two"));
        store.insert(session("1", "uno"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.first().unwrap().title, "uno");
    }

    #[test]
    fn test_remove_returns_session() {
        let mut store = ChatStore::new();
        store.insert(session("1", "one"));
        assert_eq!(store.remove("1").unwrap().title, "one");
        assert!(store.remove("1").is_none());
        assert!(store.is_empty());
    }
}
