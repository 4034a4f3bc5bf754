//! Persisted conversation data model
//!
//! These types are the single source of truth for a conversation: message
//! content is stored as the raw answer text returned by the service, and
//! rendering is recomputed from it on every display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of conversations kept in storage. Saving one more evicts
/// the oldest-by-insertion entry.
pub const MAX_CONVERSATIONS: usize = 20;

/// Maximum length of a derived conversation title, ellipsis included.
const TITLE_MAX_CHARS: usize = 36;

/// A grounding citation attached to an assistant answer
///
/// Mirrors the answering service's source records. Sources are not
/// deduplicated by the client; any deduplication is the service's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Document the citation points into
    pub doc_name: String,
    /// Section label, when the service could resolve one
    #[serde(default)]
    pub section: Option<String>,
    /// Clause number, when the service could resolve one
    #[serde(default)]
    pub clause: Option<String>,
    /// Page number within the document
    pub page: u32,
    /// Relevance score in [0, 1]
    #[serde(default)]
    pub score: Option<f64>,
    /// Short excerpt of the cited passage
    #[serde(default)]
    pub snippet: Option<String>,
}

/// A single message in a conversation
///
/// User messages never carry sources or follow-ups; both collections are
/// omitted from the serialized form when empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender ("user" or "assistant")
    pub role: String,
    /// Raw message text as typed or as returned by the service
    pub content: String,
    /// Grounding citations (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    /// Suggested follow-up questions (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<String>,
}

impl ChatMessage {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use poliqa::store::ChatMessage;
    ///
    /// let msg = ChatMessage::user("Is wear and tear covered?");
    /// assert_eq!(msg.role, "user");
    /// assert!(msg.sources.is_empty());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            sources: Vec::new(),
            follow_ups: Vec::new(),
        }
    }

    /// Creates a new assistant message with citations and follow-ups
    pub fn assistant(
        content: impl Into<String>,
        sources: Vec<Source>,
        follow_ups: Vec<String>,
    ) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            sources,
            follow_ups,
        }
    }
}

/// One titled, persisted sequence of user/assistant exchanges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier (ULID), assigned once at creation
    pub id: String,
    /// Title derived once from the first user message
    pub title: String,
    /// Ordered message list
    pub messages: Vec<ChatMessage>,
    /// When the conversation was last persisted
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates an empty conversation with the given id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Appends a message, deriving the title from the first user message.
    ///
    /// The title is set exactly once and never recomputed afterwards.
    pub fn push(&mut self, message: ChatMessage) {
        if self.title.is_empty() && message.role == "user" {
            self.title = derive_title(&message.content);
        }
        self.messages.push(message);
    }

    /// Whether the conversation has any messages yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Derives a conversation title from the first user message.
///
/// Content longer than 36 characters becomes the first 33 characters plus
/// `...`, so the result is always at most 36 characters long. Counting is
/// per `char` so multi-byte content cannot split a code point.
///
/// # Examples
///
/// ```
/// use poliqa::store::derive_title;
///
/// assert_eq!(derive_title("Short question"), "Short question");
/// let long = "a".repeat(50);
/// let title = derive_title(&long);
/// assert_eq!(title.chars().count(), 36);
/// assert!(title.ends_with("..."));
/// ```
pub fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let head: String = content.chars().take(TITLE_MAX_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

/// Visual theme preference persisted alongside the conversation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light theme (the safe default)
    #[default]
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// Parse a stored theme value, falling back to the default for
    /// anything unrecognized.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "dark" => Self::Dark,
            _ => Self::Light,
        }
    }

    /// The stored string form ("light" or "dark")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme
    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Sidebar collapse preference persisted alongside the conversation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidebarState {
    /// History sidebar shown (the safe default)
    #[default]
    Expanded,
    /// History sidebar hidden
    Collapsed,
}

impl SidebarState {
    /// Parse a stored sidebar value, falling back to the default for
    /// anything unrecognized.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "collapsed" => Self::Collapsed,
            _ => Self::Expanded,
        }
    }

    /// The stored string form ("expanded" or "collapsed")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::Collapsed => "collapsed",
        }
    }

    /// The other state
    pub fn toggled(&self) -> Self {
        match self {
            Self::Expanded => Self::Collapsed,
            Self::Collapsed => Self::Expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_content_unchanged() {
        assert_eq!(derive_title("0123456789"), "0123456789");
    }

    #[test]
    fn test_derive_title_exactly_36_chars_unchanged() {
        let content = "a".repeat(36);
        assert_eq!(derive_title(&content), content);
    }

    #[test]
    fn test_derive_title_50_chars_truncates_to_36_with_ellipsis() {
        let content = "x".repeat(50);
        let title = derive_title(&content);
        assert_eq!(title.chars().count(), 36);
        assert!(title.ends_with("..."));
        assert_eq!(&title[..33], &content[..33]);
    }

    #[test]
    fn test_derive_title_multibyte_content() {
        let content = "é".repeat(40);
        let title = derive_title(&content);
        assert_eq!(title.chars().count(), 36);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_conversation_title_set_once_from_first_user_message() {
        let mut conv = Conversation::new("01ARZ3NDEKTSV4RRFFQ69G5FAV");
        conv.push(ChatMessage::user("First question"));
        conv.push(ChatMessage::assistant("An answer", vec![], vec![]));
        conv.push(ChatMessage::user("Second question"));
        assert_eq!(conv.title, "First question");
    }

    #[test]
    fn test_conversation_title_ignores_leading_assistant_message() {
        let mut conv = Conversation::new("id");
        conv.push(ChatMessage::assistant("greeting", vec![], vec![]));
        assert!(conv.title.is_empty());
        conv.push(ChatMessage::user("the actual question"));
        assert_eq!(conv.title, "the actual question");
    }

    #[test]
    fn test_user_message_serializes_without_sources_or_follow_ups() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("sources"));
        assert!(!json.contains("follow_ups"));
    }

    #[test]
    fn test_message_roundtrip_preserves_sources() {
        let source = Source {
            doc_name: "Policy.pdf".to_string(),
            section: Some("General Exclusions".to_string()),
            clause: Some("3.2".to_string()),
            page: 12,
            score: Some(0.81),
            snippet: Some("Wear and tear is excluded".to_string()),
        };
        let msg = ChatMessage::assistant("answer", vec![source.clone()], vec!["next?".into()]);
        let json = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sources.len(), 1);
        assert_eq!(back.sources[0], source);
        assert_eq!(back.follow_ups, vec!["next?".to_string()]);
    }

    #[test]
    fn test_source_optional_fields_default_to_none() {
        let json = r#"{"doc_name":"Policy.pdf","page":3}"#;
        let source: Source = serde_json::from_str(json).unwrap();
        assert!(source.section.is_none());
        assert!(source.clause.is_none());
        assert!(source.score.is_none());
        assert!(source.snippet.is_none());
    }

    #[test]
    fn test_theme_parse_and_toggle() {
        assert_eq!(Theme::parse_or_default("dark"), Theme::Dark);
        assert_eq!(Theme::parse_or_default("light"), Theme::Light);
        assert_eq!(Theme::parse_or_default("garbage"), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().as_str(), "light");
    }

    #[test]
    fn test_sidebar_parse_and_toggle() {
        assert_eq!(
            SidebarState::parse_or_default("collapsed"),
            SidebarState::Collapsed
        );
        assert_eq!(
            SidebarState::parse_or_default("nonsense"),
            SidebarState::Expanded
        );
        assert_eq!(SidebarState::Expanded.toggled().as_str(), "collapsed");
    }
}
