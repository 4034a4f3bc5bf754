//! Durable conversation storage
//!
//! Persists the conversation list and UI preferences in an embedded `sled`
//! key-value database. The whole list lives under a single key as one JSON
//! array, so `list_all` always reconstructs exactly what the last
//! successful `save`/`delete` left behind.
//!
//! The store never surfaces errors to callers: unreadable or malformed data
//! degrades to an empty list, and a failing write is retried after evicting
//! the oldest conversation until it succeeds or the list is empty.

use crate::error::{PoliqaError, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub mod types;
pub use types::{
    derive_title, ChatMessage, Conversation, SidebarState, Source, Theme, MAX_CONVERSATIONS,
};

/// Key holding the JSON-encoded conversation list
const CONVERSATIONS_KEY: &str = "conversations";
/// Key holding the last-selected visual theme ("light"/"dark")
const THEME_KEY: &str = "pref_theme";
/// Key holding the last sidebar collapse state ("expanded"/"collapsed")
const SIDEBAR_KEY: &str = "pref_sidebar";

/// Storage backend for the conversation list and preferences
///
/// Conversations are kept in insertion order, capped at
/// [`MAX_CONVERSATIONS`]; the oldest entry is evicted first when the cap is
/// exceeded. History UIs display the list most-recent-first by reversing it.
pub struct ChatStore {
    db: sled::Db,
}

impl ChatStore {
    /// Open the store at the default location
    ///
    /// The database lives in the user's data directory. `POLIQA_CHAT_DB`
    /// overrides the path, which makes it easy to point the binary at a
    /// test database without touching the user's data dir.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("POLIQA_CHAT_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "poliqa", "poliqa")
            .ok_or_else(|| PoliqaError::Storage("Could not determine data directory".into()))?;

        let db_path = proj_dirs.data_dir().join("chats.db");
        Self::new_with_path(db_path)
    }

    /// Open the store at a specific path
    ///
    /// Primarily useful for tests where the default application data
    /// directory is not desirable (for example, a temporary directory).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use poliqa::store::ChatStore;
    ///
    /// let store = ChatStore::new_with_path("/tmp/poliqa-chats.db").unwrap();
    /// assert!(store.list_all().is_empty());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PoliqaError::Storage(format!("Failed to create data directory: {}", e))
                })?;
            }
        }

        let db = sled::open(&path)
            .map_err(|e| PoliqaError::Storage(format!("Failed to open database: {}", e)))?;

        tracing::debug!("Opened chat store at {}", path.display());
        Ok(Self { db })
    }

    /// All stored conversations in insertion order
    ///
    /// Returns an empty list when storage is empty, unreadable, or contains
    /// malformed data. Never raises.
    pub fn list_all(&self) -> Vec<Conversation> {
        match self.db.get(CONVERSATIONS_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Conversation>>(&bytes) {
                Ok(list) => list,
                Err(e) => {
                    tracing::warn!("Stored conversation list is malformed, treating as empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read conversation list, treating as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Insert or replace a conversation by id and persist the full list
    ///
    /// A replaced conversation keeps its original position, so eviction
    /// order stays oldest-by-insertion. If the resulting count exceeds
    /// [`MAX_CONVERSATIONS`], the oldest entries are dropped first. When
    /// the underlying write fails, the single oldest conversation is
    /// evicted and the write retried; once the list is empty the write is
    /// abandoned silently.
    pub fn save(&self, conversation: &Conversation) {
        let mut list = self.list_all();

        match list.iter().position(|c| c.id == conversation.id) {
            Some(idx) => list[idx] = conversation.clone(),
            None => list.push(conversation.clone()),
        }

        while list.len() > MAX_CONVERSATIONS {
            let evicted = list.remove(0);
            tracing::debug!("Evicting oldest conversation {} (capacity)", evicted.id);
        }

        save_with_retry(&mut list, |l| self.write_list(l));
    }

    /// Remove the conversation with the given id, if present
    ///
    /// Idempotent: deleting an absent id is a no-op.
    pub fn delete(&self, id: &str) {
        let mut list = self.list_all();
        let before = list.len();
        list.retain(|c| c.id != id);

        if list.len() == before {
            return;
        }

        if let Err(e) = self.write_list(&list) {
            tracing::warn!("Failed to persist deletion of {}: {}", id, e);
        }
    }

    /// The persisted theme preference, defaulting to light
    pub fn theme(&self) -> Theme {
        self.read_pref(THEME_KEY)
            .map(|s| Theme::parse_or_default(&s))
            .unwrap_or_default()
    }

    /// Persist the theme preference
    pub fn set_theme(&self, theme: Theme) {
        self.write_pref(THEME_KEY, theme.as_str());
    }

    /// The persisted sidebar state, defaulting to expanded
    pub fn sidebar(&self) -> SidebarState {
        self.read_pref(SIDEBAR_KEY)
            .map(|s| SidebarState::parse_or_default(&s))
            .unwrap_or_default()
    }

    /// Persist the sidebar state
    pub fn set_sidebar(&self, state: SidebarState) {
        self.write_pref(SIDEBAR_KEY, state.as_str());
    }

    fn write_list(&self, list: &[Conversation]) -> Result<()> {
        let value = serde_json::to_vec(list)
            .map_err(|e| PoliqaError::Storage(format!("Serialization failed: {}", e)))?;

        self.db
            .insert(CONVERSATIONS_KEY, value)
            .map_err(|e| PoliqaError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| PoliqaError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    fn read_pref(&self, key: &str) -> Option<String> {
        match self.db.get(key) {
            Ok(Some(bytes)) => String::from_utf8(bytes.to_vec()).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read preference {}: {}", key, e);
                None
            }
        }
    }

    fn write_pref(&self, key: &str, value: &str) {
        if let Err(e) = self.db.insert(key, value.as_bytes()) {
            tracing::warn!("Failed to persist preference {}: {}", key, e);
            return;
        }
        if let Err(e) = self.db.flush() {
            tracing::warn!("Failed to flush preference {}: {}", key, e);
        }
    }
}

/// Write the list, evicting the single oldest conversation and retrying
/// on failure. Iterative with an explicit termination condition: once the
/// list is empty the write is abandoned silently.
fn save_with_retry<F>(list: &mut Vec<Conversation>, mut write: F)
where
    F: FnMut(&[Conversation]) -> Result<()>,
{
    loop {
        match write(list) {
            Ok(()) => return,
            Err(e) => {
                if list.is_empty() {
                    tracing::warn!("Abandoning conversation write, storage unavailable: {}", e);
                    return;
                }
                let evicted = list.remove(0);
                tracing::warn!(
                    "Conversation write failed ({}), evicting {} and retrying",
                    e,
                    evicted.id
                );
            }
        }
    }
}
