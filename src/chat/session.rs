//! Chat session management
//!
//! [`SessionManager`] owns the chat store and the active-session pointer.
//! Every mutating method persists before returning, so the stored state never
//! lags what the caller displays.

use super::store::LocalChatStore;
use super::types::{ChatSession, ChatStore};
use crate::error::{QuestgenError, Result};
use crate::storage::{keys, KeyValueStore};
use chrono::Utc;
use std::sync::Arc;

/// Default number of chats listed before the list is expanded
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Titles longer than this are shortened for display
pub const MAX_TITLE_DISPLAY_CHARS: usize = 30;

/// Result text of a freshly created session
pub const PLACEHOLDER_RESULT: &str = "Your quest will appear here.";

const ELLIPSIS: &str = "...";

/// Shorten `title` for display
///
/// Titles over 30 characters become their first 27 characters followed by
/// `...`. Characters are Unicode scalar values.
///
/// # Examples
///
/// ```
/// use questgen::chat::display_title;
///
/// assert_eq!(display_title("Chat 1"), "Chat 1");
/// let long = "a".repeat(31);
/// assert_eq!(display_title(&long), format!("{}...", "a".repeat(27)));
/// ```
pub fn display_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_DISPLAY_CHARS {
        let keep = MAX_TITLE_DISPLAY_CHARS - ELLIPSIS.len();
        let mut shortened: String = title.chars().take(keep).collect();
        shortened.push_str(ELLIPSIS);
        shortened
    } else {
        title.to_string()
    }
}

/// One row of the rendered chat list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListEntry {
    /// Session id
    pub id: String,
    /// Title shortened for display
    pub display_title: String,
    /// Whether this is the active session
    pub is_active: bool,
}

/// Rendered chat list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatList {
    /// Visible rows in insertion order
    pub entries: Vec<ChatListEntry>,
    /// Total number of sessions in the store
    pub total: usize,
    /// Whether the list is showing every session
    pub expanded: bool,
    /// Whether a show-more/show-less toggle is needed
    pub show_toggle: bool,
}

/// Owner of chat sessions and the active pointer
pub struct SessionManager {
    chats: LocalChatStore,
    kv: Arc<dyn KeyValueStore>,
    store: ChatStore,
    active: Option<String>,
    last_id: i64,
    expanded: bool,
    page_size: usize,
}

impl SessionManager {
    /// Load sessions from `kv` and resolve the active session
    ///
    /// The persisted active id wins when it still exists; otherwise the first
    /// session becomes active, and an empty store gets a fresh session.
    ///
    /// # Arguments
    ///
    /// * `kv` - Storage holding the `chats`, `active_chat` and `last_chat_id` keys
    /// * `page_size` - Number of chats listed before the list is expanded
    ///
    /// # Returns
    ///
    /// Returns a manager with exactly one active session
    ///
    /// # Errors
    ///
    /// Returns a storage error when the chat store cannot be read, or when
    /// persisting the resolved active session fails. Nothing is written after
    /// a failed read.
    ///
    /// # Examples
    ///
    /// ```
    /// use questgen::chat::{SessionManager, DEFAULT_PAGE_SIZE};
    /// use questgen::storage::MemoryStore;
    /// use std::sync::Arc;
    ///
    /// let sessions = SessionManager::open(Arc::new(MemoryStore::new()), DEFAULT_PAGE_SIZE).unwrap();
    /// assert_eq!(sessions.active_session().unwrap().title, "Chat 1");
    /// ```
    pub fn open(kv: Arc<dyn KeyValueStore>, page_size: usize) -> Result<Self> {
        let chats = LocalChatStore::new(kv.clone());
        let store = chats.load()?;

        let recorded = kv
            .get(keys::LAST_CHAT_ID)?
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(0);
        let last_id = store
            .iter()
            .filter_map(|s| s.id.parse::<i64>().ok())
            .fold(recorded, i64::max);

        let mut manager = Self {
            chats,
            kv,
            store,
            active: None,
            last_id,
            expanded: false,
            page_size,
        };

        let persisted = match manager.kv.get(keys::ACTIVE_CHAT) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read active chat pointer: {}", e);
                None
            }
        };

        match persisted.filter(|id| manager.store.contains(id)) {
            Some(id) => manager.active = Some(id),
            None => match manager.store.first().map(|s| s.id.clone()) {
                Some(first) => {
                    manager.active = Some(first);
                    manager.persist()?;
                }
                None => {
                    manager.create_session()?;
                }
            },
        }

        tracing::debug!(
            sessions = manager.store.len(),
            active = ?manager.active,
            "Opened chat sessions"
        );
        Ok(manager)
    }

    /// Id of the active session
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The active session
    pub fn active_session(&self) -> Option<&ChatSession> {
        self.active.as_deref().and_then(|id| self.store.get(id))
    }

    /// Session by id
    pub fn session(&self, id: &str) -> Option<&ChatSession> {
        self.store.get(id)
    }

    /// The underlying store
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Create a session and make it active
    ///
    /// The title is `Chat N` where N is the session count after creation.
    pub fn create_session(&mut self) -> Result<String> {
        let issued = self.next_id();
        let id = issued.to_string();
        self.kv.set(keys::LAST_CHAT_ID, &id)?;
        self.last_id = issued;

        let title = format!("Chat {}", self.store.len() + 1);
        let mut session = ChatSession::new(id.clone(), title);
        session.result = PLACEHOLDER_RESULT.to_string();

        self.store.insert(session);
        self.active = Some(id.clone());
        self.persist()?;

        tracing::info!("Created chat session {}", id);
        Ok(id)
    }

    /// Make `id` the active session and return it for display
    pub fn switch_session(&mut self, id: &str) -> Result<ChatSession> {
        let session = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| QuestgenError::UnknownSession(id.to_string()))?;

        self.active = Some(id.to_string());
        self.persist()?;

        tracing::debug!("Switched to chat session {}", id);
        Ok(session)
    }

    /// Rename a session
    ///
    /// A cancelled (`None`) or blank title leaves the session unchanged and
    /// returns `false`.
    pub fn rename_session(&mut self, id: &str, new_title: Option<&str>) -> Result<bool> {
        let title = match new_title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Ok(false),
        };

        let session = self
            .store
            .get_mut(id)
            .ok_or_else(|| QuestgenError::UnknownSession(id.to_string()))?;
        session.title = title;
        self.persist()?;

        tracing::debug!("Renamed chat session {}", id);
        Ok(true)
    }

    /// Delete a session
    ///
    /// Deleting the active session moves the pointer to the first remaining
    /// session, or creates a fresh one when none remain.
    pub fn delete_session(&mut self, id: &str) -> Result<()> {
        if self.store.remove(id).is_none() {
            return Err(QuestgenError::UnknownSession(id.to_string()).into());
        }
        tracing::info!("Deleted chat session {}", id);

        if self.active.as_deref() == Some(id) {
            self.active = self.store.first().map(|s| s.id.clone());
            if self.active.is_none() {
                self.create_session()?;
                return Ok(());
            }
        }

        self.persist()
    }

    /// Mirror edited setting text into the active session
    pub fn update_setting(&mut self, setting: &str) -> Result<()> {
        let session = self.active_session_mut()?;
        session.setting = setting.to_string();
        self.persist()
    }

    /// Store result text in the active session
    pub fn record_result(&mut self, result: &str) -> Result<()> {
        let session = self.active_session_mut()?;
        session.result = result.to_string();
        self.persist()
    }

    /// Expand or collapse the chat list
    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Flip the expanded state and return the new value
    pub fn toggle_expanded(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    /// Render the chat list in insertion order
    pub fn render_list(&self) -> ChatList {
        let total = self.store.len();
        let limit = if self.expanded { total } else { self.page_size };

        let entries = self
            .store
            .iter()
            .take(limit)
            .map(|s| ChatListEntry {
                id: s.id.clone(),
                display_title: display_title(&s.title),
                is_active: self.active.as_deref() == Some(s.id.as_str()),
            })
            .collect();

        ChatList {
            entries,
            total,
            expanded: self.expanded,
            show_toggle: total > self.page_size,
        }
    }

    fn active_session_mut(&mut self) -> Result<&mut ChatSession> {
        let id = match self.active.clone() {
            Some(id) => id,
            None => self.create_session()?,
        };
        self.store
            .get_mut(&id)
            .ok_or_else(|| QuestgenError::UnknownSession(id).into())
    }

    /// Millisecond timestamp, bumped past every id issued so far
    fn next_id(&self) -> i64 {
        let mut candidate = Utc::now().timestamp_millis().max(self.last_id + 1);
        while self.store.contains(&candidate.to_string()) {
            candidate += 1;
        }
        candidate
    }

    fn persist(&self) -> Result<()> {
        self.chats.save(&self.store)?;
        match &self.active {
            Some(id) => self.kv.set(keys::ACTIVE_CHAT, id),
            None => self.kv.remove(keys::ACTIVE_CHAT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::test_utils::{assert_error_contains, memory_store, FailingReadStore};

    fn open_manager() -> (SessionManager, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        let manager = SessionManager::open(kv.clone(), DEFAULT_PAGE_SIZE).expect("open failed");
        (manager, kv)
    }

    #[test]
    fn test_open_empty_store_creates_first_session() {
        let (manager, kv) = open_manager();
        let active = manager.active_session().expect("active session");
        assert_eq!(active.title, "Chat 1");
        assert_eq!(active.result, PLACEHOLDER_RESULT);
        assert!(active.setting.is_empty());
        assert_eq!(
            kv.get(keys::ACTIVE_CHAT).unwrap().as_deref(),
            Some(active.id.as_str())
        );
    }

    #[test]
    fn test_open_restores_persisted_active_session() {
        let kv = Arc::new(MemoryStore::new());
        let second = {
            let mut manager = SessionManager::open(kv.clone(), DEFAULT_PAGE_SIZE).unwrap();
            manager.create_session().unwrap()
        };
        let reopened = SessionManager::open(kv, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(reopened.active_id(), Some(second.as_str()));
    }

    #[test]
    fn test_open_with_dangling_pointer_picks_first() {
        let kv = memory_store(&[
            (keys::CHATS, r#"{"10":{"title":"A"},"20":{"title":"B"}}"#),
            (keys::ACTIVE_CHAT, "999"),
        ]);
        let manager = SessionManager::open(kv.clone(), DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(manager.active_id(), Some("10"));
        assert_eq!(kv.get(keys::ACTIVE_CHAT).unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn test_create_session_titles_are_ordinal() {
        let (mut manager, _kv) = open_manager();
        let id = manager.create_session().unwrap();
        assert_eq!(manager.session(&id).unwrap().title, "Chat 2");
        assert_eq!(manager.active_id(), Some(id.as_str()));
        assert_eq!(manager.store().len(), 2);
    }

    #[test]
    fn test_create_session_ids_are_unique() {
        let (mut manager, _kv) = open_manager();
        for _ in 0..20 {
            manager.create_session().unwrap();
        }
        let mut ids: Vec<&str> = manager.store().iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 21);
    }

    #[test]
    fn test_switch_session_returns_content() {
        let (mut manager, _kv) = open_manager();
        let first = manager.active_id().unwrap().to_string();
        manager.update_setting("a haunted lighthouse").unwrap();
        manager.create_session().unwrap();

        let shown = manager.switch_session(&first).unwrap();
        assert_eq!(shown.setting, "a haunted lighthouse");
        assert_eq!(manager.active_id(), Some(first.as_str()));
    }

    #[test]
    fn test_switch_to_unknown_session_fails_without_change() {
        let (mut manager, _kv) = open_manager();
        let before = manager.active_id().unwrap().to_string();
        let err = manager.switch_session("nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QuestgenError>(),
            Some(QuestgenError::UnknownSession(_))
        ));
        assert_eq!(manager.active_id(), Some(before.as_str()));
    }

    #[test]
    fn test_rename_ignores_blank_and_cancelled_titles() {
        let (mut manager, _kv) = open_manager();
        let id = manager.active_id().unwrap().to_string();

        assert!(!manager.rename_session(&id, None).unwrap());
        assert!(!manager.rename_session(&id, Some("   ")).unwrap());
        assert_eq!(manager.session(&id).unwrap().title, "Chat 1");

        assert!(manager.rename_session(&id, Some("Lighthouse")).unwrap());
        assert_eq!(manager.session(&id).unwrap().title, "Lighthouse");
    }

    #[test]
    fn test_rename_persists() {
        let kv = Arc::new(MemoryStore::new());
        let id = {
            let mut manager = SessionManager::open(kv.clone(), DEFAULT_PAGE_SIZE).unwrap();
            let id = manager.active_id().unwrap().to_string();
            manager.rename_session(&id, Some("Persisted")).unwrap();
            id
        };
        let reopened = SessionManager::open(kv, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(reopened.session(&id).unwrap().title, "Persisted");
    }

    #[test]
    fn test_delete_active_falls_back_to_first_remaining() {
        let (mut manager, _kv) = open_manager();
        let first = manager.active_id().unwrap().to_string();
        let second = manager.create_session().unwrap();
        let third = manager.create_session().unwrap();

        manager.switch_session(&second).unwrap();
        manager.delete_session(&second).unwrap();
        assert_eq!(manager.active_id(), Some(first.as_str()));

        manager.switch_session(&third).unwrap();
        manager.delete_session(&first).unwrap();
        assert_eq!(manager.active_id(), Some(third.as_str()));
    }

    #[test]
    fn test_delete_last_session_creates_exactly_one() {
        let (mut manager, kv) = open_manager();
        let only = manager.active_id().unwrap().to_string();

        manager.delete_session(&only).unwrap();

        assert_eq!(manager.store().len(), 1);
        let active = manager.active_id().unwrap().to_string();
        assert_ne!(active, only);
        assert!(manager.store().contains(&active));
        assert_eq!(kv.get(keys::ACTIVE_CHAT).unwrap(), Some(active));
    }

    #[test]
    fn test_deleted_ids_are_never_reissued() {
        let (mut manager, kv) = open_manager();
        let mut previous = manager.active_id().unwrap().parse::<i64>().unwrap();

        for _ in 0..10 {
            let only = manager.active_id().unwrap().to_string();
            manager.delete_session(&only).unwrap();
            let next = manager.active_id().unwrap().parse::<i64>().unwrap();
            assert!(next > previous);
            previous = next;
        }
        assert_eq!(
            kv.get(keys::LAST_CHAT_ID).unwrap(),
            Some(previous.to_string())
        );
    }

    #[test]
    fn test_ids_keep_increasing_across_reopen() {
        let kv = Arc::new(MemoryStore::new());
        let deleted = {
            let mut manager = SessionManager::open(kv.clone(), DEFAULT_PAGE_SIZE).unwrap();
            let first = manager.active_id().unwrap().to_string();
            let second = manager.create_session().unwrap();
            manager.delete_session(&second).unwrap();
            assert_eq!(manager.active_id(), Some(first.as_str()));
            second
        };

        let mut reopened = SessionManager::open(kv, DEFAULT_PAGE_SIZE).unwrap();
        let created = reopened.create_session().unwrap();
        assert!(created.parse::<i64>().unwrap() > deleted.parse::<i64>().unwrap());
    }

    #[test]
    fn test_ids_start_past_far_future_mark() {
        let far = "99999999999999";
        let kv = memory_store(&[(keys::LAST_CHAT_ID, far)]);
        let manager = SessionManager::open(kv, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(manager.active_id(), Some("100000000000000"));
    }

    #[test]
    fn test_open_fails_without_writing_when_read_fails() {
        let inner = Arc::new(MemoryStore::new());
        {
            let mut manager = SessionManager::open(inner.clone(), DEFAULT_PAGE_SIZE).unwrap();
            for _ in 0..4 {
                manager.create_session().unwrap();
            }
        }
        let before = inner.get(keys::CHATS).unwrap();

        let locked = Arc::new(FailingReadStore::new(inner.clone(), keys::CHATS));
        assert_error_contains(
            SessionManager::open(locked, DEFAULT_PAGE_SIZE),
            "database is locked",
        );

        assert_eq!(inner.get(keys::CHATS).unwrap(), before);
        let reopened = SessionManager::open(inner, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(reopened.store().len(), 5);
    }

    #[test]
    fn test_delete_inactive_keeps_pointer() {
        let (mut manager, _kv) = open_manager();
        let first = manager.active_id().unwrap().to_string();
        let second = manager.create_session().unwrap();

        manager.delete_session(&first).unwrap();
        assert_eq!(manager.active_id(), Some(second.as_str()));
    }

    #[test]
    fn test_delete_never_leaves_dangling_pointer() {
        let (mut manager, _kv) = open_manager();
        for _ in 0..4 {
            manager.create_session().unwrap();
        }
        let ids: Vec<String> = manager.store().iter().map(|s| s.id.clone()).collect();
        for id in ids {
            manager.switch_session(&id).unwrap();
            manager.delete_session(&id).unwrap();
            let active = manager.active_id().expect("active pointer");
            assert!(manager.store().contains(active));
        }
    }

    #[test]
    fn test_delete_unknown_session_fails() {
        let (mut manager, _kv) = open_manager();
        assert!(manager.delete_session("missing").is_err());
        assert_eq!(manager.store().len(), 1);
    }

    #[test]
    fn test_record_result_persists() {
        let kv = Arc::new(MemoryStore::new());
        {
            let mut manager = SessionManager::open(kv.clone(), DEFAULT_PAGE_SIZE).unwrap();
            manager.record_result("Error: rate limited").unwrap();
        }
        let reopened = SessionManager::open(kv, DEFAULT_PAGE_SIZE).unwrap();
        assert_eq!(reopened.active_session().unwrap().result, "Error: rate limited");
    }

    #[test]
    fn test_display_title_truncation() {
        assert_eq!(display_title(""), "");
        let exact = "x".repeat(30);
        assert_eq!(display_title(&exact), exact);

        let long = "The Haunted Lighthouse of Ashen Bay";
        let shown = display_title(long);
        assert_eq!(shown.chars().count(), 30);
        assert!(shown.ends_with("..."));
        assert!(long.starts_with(shown.trim_end_matches("...")));
    }

    #[test]
    fn test_display_title_counts_characters_not_bytes() {
        let cyrillic = "Заброшенный маяк на краю света у моря";
        let shown = display_title(cyrillic);
        assert_eq!(shown.chars().count(), 30);
        assert_eq!(
            shown,
            format!("{}...", cyrillic.chars().take(27).collect::<String>())
        );

        let short = "Маяк";
        assert_eq!(display_title(short), short);
    }

    #[test]
    fn test_render_list_pages_and_toggle() {
        let (mut manager, _kv) = open_manager();
        for _ in 0..9 {
            manager.create_session().unwrap();
        }

        let collapsed = manager.render_list();
        assert_eq!(collapsed.total, 10);
        assert_eq!(collapsed.entries.len(), DEFAULT_PAGE_SIZE);
        assert!(collapsed.show_toggle);
        assert!(!collapsed.expanded);
        assert_eq!(collapsed.entries[0].display_title, "Chat 1");

        assert!(manager.toggle_expanded());
        let expanded = manager.render_list();
        assert_eq!(expanded.entries.len(), 10);
        assert!(expanded.entries.last().unwrap().is_active);
        assert_eq!(expanded.entries.iter().filter(|e| e.is_active).count(), 1);
    }

    #[test]
    fn test_render_list_without_toggle_when_short() {
        let (manager, _kv) = open_manager();
        let list = manager.render_list();
        assert_eq!(list.entries.len(), 1);
        assert!(!list.show_toggle);
        assert!(list.entries[0].is_active);
    }
}
