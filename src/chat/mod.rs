//! Chat sessions and their persistence
//!
//! - `types`: [`ChatSession`] and the insertion-ordered [`ChatStore`]
//! - `store`: [`LocalChatStore`], the `chats` blob reader/writer
//! - `session`: [`SessionManager`], the owner of the active-session pointer

pub mod session;
pub mod store;
pub mod types;

pub use session::{
    display_title, ChatList, ChatListEntry, SessionManager, DEFAULT_PAGE_SIZE,
    MAX_TITLE_DISPLAY_CHARS, PLACEHOLDER_RESULT,
};
pub use store::LocalChatStore;
pub use types::{ChatSession, ChatStore};
