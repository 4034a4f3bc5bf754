//! Conversation session control
//!
//! [`SessionController`] owns the single active conversation and the
//! request lifecycle. It is the only component with internal mutable
//! state; everything it holds is instance-local, so independent sessions
//! (and tests) never interfere with each other.
//!
//! The lifecycle is a two-state machine: Idle and AwaitingResponse. While
//! a request is outstanding, further `ask` calls are ignored, not queued
//! and not rejected. There is no cancellation or timeout primitive beyond
//! the HTTP client's own; a hung request keeps the session busy until it
//! settles. Known limitation.

use crate::client::AskClient;
use crate::error::PoliqaError;
use crate::store::{ChatMessage, ChatStore, Conversation};
use chrono::Utc;
use ulid::Ulid;

/// Prefix marking an assistant-authored error message
pub const ERROR_MARKER: &str = "⚠️ ";

/// Fixed text shown when the request never reached the service.
/// Transport failures are never conflated with service error payloads.
pub const TRANSPORT_ERROR_TEXT: &str =
    "⚠️ Could not connect to the answering service. Please check that it is running.";

/// What happened to an `ask` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// An exchange was appended (real answer or error message) and the
    /// conversation was persisted
    Completed,
    /// The call was ignored: empty question, or a request already in flight
    Skipped,
}

/// Owns the active conversation and orchestrates service and storage calls
pub struct SessionController {
    store: ChatStore,
    client: AskClient,
    active: Option<Conversation>,
    awaiting: bool,
}

impl SessionController {
    /// Create a controller with no active conversation
    pub fn new(store: ChatStore, client: AskClient) -> Self {
        Self {
            store,
            client,
            active: None,
            awaiting: false,
        }
    }

    /// Messages of the active conversation, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        self.active.as_ref().map(|c| c.messages.as_slice()).unwrap_or(&[])
    }

    /// Id of the active conversation, if one exists yet
    pub fn conversation_id(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.id.as_str())
    }

    /// Whether a request is currently outstanding
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// The underlying store (for preference access)
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// The answering-service client
    pub fn client(&self) -> &AskClient {
        &self.client
    }

    /// Persisted conversations, most recently saved first
    pub fn history(&self) -> Vec<Conversation> {
        let mut list = self.store.list_all();
        list.reverse();
        list
    }

    /// Ask a question and append the resulting exchange
    ///
    /// The question is trimmed first; an empty result is skipped without
    /// an error. A call while a request is already in flight is ignored.
    /// Otherwise the user message is appended synchronously (before the
    /// network call resolves), the service is called, and exactly one
    /// assistant message follows: the real answer on success, a
    /// marker-prefixed error text on failure. The conversation is
    /// persisted either way, so a failed exchange still keeps the user's
    /// question.
    pub async fn ask(&mut self, question: &str) -> AskOutcome {
        let question = question.trim();
        if question.is_empty() {
            return AskOutcome::Skipped;
        }
        if self.awaiting {
            tracing::debug!("Ignoring ask() while a request is in flight");
            return AskOutcome::Skipped;
        }
        self.awaiting = true;

        // Lazily create the conversation: it exists only once the first
        // question is asked in this session.
        let conversation = self
            .active
            .get_or_insert_with(|| Conversation::new(Ulid::new().to_string()));
        conversation.push(ChatMessage::user(question));

        let assistant = match self.client.ask(question).await {
            Ok(response) => {
                ChatMessage::assistant(response.answer, response.sources, response.follow_ups)
            }
            Err(err) => ChatMessage::assistant(error_text(&err), Vec::new(), Vec::new()),
        };

        if let Some(conversation) = self.active.as_mut() {
            conversation.push(assistant);
        }
        self.persist_active();
        self.awaiting = false;

        AskOutcome::Completed
    }

    /// Persist the active conversation and start a fresh, empty one
    pub fn start_new_chat(&mut self) {
        self.persist_active();
        self.active = None;
        self.awaiting = false;
    }

    /// Switch to a stored conversation
    ///
    /// The outgoing conversation is persisted strictly before the incoming
    /// one is loaded, so the last exchange is never lost. The loaded
    /// messages are an independent copy; mutating the session does not
    /// touch the stored record until the next save.
    ///
    /// Returns `false` when no conversation with that id exists.
    pub fn switch_to(&mut self, id: &str) -> bool {
        self.persist_active();

        match self.store.list_all().into_iter().find(|c| c.id == id) {
            Some(conversation) => {
                self.active = Some(conversation);
                self.awaiting = false;
                true
            }
            None => {
                tracing::warn!("No stored conversation with id {}", id);
                false
            }
        }
    }

    /// Delete a stored conversation
    ///
    /// When the deleted conversation is the active one, the active state is
    /// cleared first so no later reset can re-persist the deleted record.
    pub fn delete_conversation(&mut self, id: &str) {
        if self.conversation_id() == Some(id) {
            self.active = None;
            self.awaiting = false;
        }
        self.store.delete(id);
    }

    fn persist_active(&mut self) {
        if let Some(conversation) = self.active.as_mut() {
            if !conversation.is_empty() {
                conversation.updated_at = Utc::now();
                self.store.save(conversation);
            }
        }
    }
}

/// Map a request failure to the user-visible assistant message text
fn error_text(err: &anyhow::Error) -> String {
    match err.downcast_ref::<PoliqaError>() {
        Some(PoliqaError::Service { status, message }) => {
            tracing::warn!("Answering service error (HTTP {}): {}", status, message);
            format!("{}{}", ERROR_MARKER, message)
        }
        Some(PoliqaError::Transport(detail)) => {
            tracing::error!("Transport failure reaching answering service: {}", detail);
            TRANSPORT_ERROR_TEXT.to_string()
        }
        _ => {
            tracing::error!("Unexpected request failure: {}", err);
            format!("{}{}", ERROR_MARKER, err)
        }
    }
}
