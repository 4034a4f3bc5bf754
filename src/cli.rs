//! Command-line interface definition for Poliqa
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, and
//! conversation history management.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Poliqa - conversation client for a grounded policy Q&A assistant
///
/// Ask questions about indexed policy documents and get answers with
/// clause-level citations and suggested follow-ups.
#[derive(Parser, Debug, Clone)]
#[command(name = "poliqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the answering service base URL
    #[arg(long, env = "POLIQA_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Override the chat database path
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Poliqa
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Resume a stored conversation by id
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,
    },

    /// Manage stored conversations
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List stored conversations, most recent first
    List,

    /// Print a stored conversation transcript
    Show {
        /// Conversation id
        id: String,
    },

    /// Delete a stored conversation
    Delete {
        /// Conversation id
        id: String,
    },

    /// Export a stored conversation to an HTML file
    Export {
        /// Conversation id
        id: String,

        /// Output file (defaults to <id>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            service_url: None,
            storage_path: None,
            command: Commands::Chat { resume: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Chat { resume: None }));
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["poliqa", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { resume: None }));
    }

    #[test]
    fn test_cli_parse_chat_with_resume() {
        let cli = Cli::try_parse_from(["poliqa", "chat", "--resume", "01ARZ3"]).unwrap();
        if let Commands::Chat { resume } = cli.command {
            assert_eq!(resume, Some("01ARZ3".to_string()));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_ask_command() {
        let cli = Cli::try_parse_from(["poliqa", "ask", "Is wear and tear covered?"]).unwrap();
        if let Commands::Ask { question } = cli.command {
            assert_eq!(question, "Is wear and tear covered?");
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_history_list() {
        let cli = Cli::try_parse_from(["poliqa", "history", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History {
                command: HistoryCommand::List
            }
        ));
    }

    #[test]
    fn test_cli_parse_history_delete() {
        let cli = Cli::try_parse_from(["poliqa", "history", "delete", "some-id"]).unwrap();
        if let Commands::History {
            command: HistoryCommand::Delete { id },
        } = cli.command
        {
            assert_eq!(id, "some-id");
        } else {
            panic!("Expected History Delete command");
        }
    }

    #[test]
    fn test_cli_parse_history_export_with_output() {
        let cli =
            Cli::try_parse_from(["poliqa", "history", "export", "some-id", "-o", "out.html"])
                .unwrap();
        if let Commands::History {
            command: HistoryCommand::Export { id, output },
        } = cli.command
        {
            assert_eq!(id, "some-id");
            assert_eq!(output, Some(PathBuf::from("out.html")));
        } else {
            panic!("Expected History Export command");
        }
    }

    #[test]
    fn test_cli_parse_service_url_override() {
        let cli =
            Cli::try_parse_from(["poliqa", "--service-url", "http://host:1", "chat"]).unwrap();
        assert_eq!(cli.service_url, Some("http://host:1".to_string()));
    }
}
