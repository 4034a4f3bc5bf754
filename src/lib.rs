//! Poliqa - conversation client for a grounded policy Q&A assistant
//!
//! This library provides the client-side conversation manager for a
//! question-answering assistant: persistent multi-chat storage with
//! eviction, the request lifecycle around the remote answering service,
//! and the pipeline that turns raw answer text plus citation/follow-up
//! metadata into renderable content blocks.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: the session controller owning the active conversation and
//!   the request lifecycle
//! - `store`: sled-backed persistence of the conversation list and UI
//!   preferences
//! - `client`: the HTTP contract with the external answering service
//! - `render`: the pure data-to-blocks pipeline (content, citations,
//!   follow-ups) plus the HTML adapter
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//! - `commands`: CLI command handlers and the terminal block printer
//!
//! # Example
//!
//! ```no_run
//! use poliqa::client::AskClient;
//! use poliqa::session::SessionController;
//! use poliqa::store::ChatStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = ChatStore::new()?;
//!     let client = AskClient::new("http://localhost:5000", 60)?;
//!     let mut session = SessionController::new(store, client);
//!
//!     session.ask("Is wear and tear covered?").await;
//!     for message in session.messages() {
//!         println!("{}: {}", message.role, message.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use client::AskClient;
pub use config::Config;
pub use error::{PoliqaError, Result};
pub use session::{AskOutcome, SessionController};
pub use store::{ChatMessage, ChatStore, Conversation, Source};
