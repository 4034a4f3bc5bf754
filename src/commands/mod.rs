/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`    — Interactive chat session
- `ask`     — One-shot question
- `history` — Stored conversation management

The handlers are intentionally small and use the library components:
the session controller, the answering-service client, and the chat store.
The block-printing helpers here are the terminal adapter for the pure
rendering pipeline; they own all presentation decisions (colors, collapse
hints) and none of the content decisions.
*/

use crate::client::AskClient;
use crate::config::Config;
use crate::error::Result;
use crate::render::{Block, CitationsBlock, FollowUpsBlock, Inline, RenderedMessage};
use crate::store::{ChatStore, Conversation, Theme};
use colored::Colorize;

/// Open the chat store at the configured location
fn open_store(config: &Config) -> Result<ChatStore> {
    match &config.storage.db_path {
        Some(path) => ChatStore::new_with_path(path.clone()),
        None => ChatStore::new(),
    }
}

/// Build the answering-service client from config
fn build_client(config: &Config) -> Result<AskClient> {
    AskClient::new(&config.service.url, config.service.timeout_seconds)
}

/// Resolve a conversation id or unique id prefix against the stored list
///
/// Accepts the full ULID or any unambiguous prefix, so the short ids
/// shown by `history list` work everywhere an id is accepted.
fn resolve_id(conversations: &[Conversation], input: &str) -> Option<String> {
    if conversations.iter().any(|c| c.id == input) {
        return Some(input.to_string());
    }
    let matches: Vec<&Conversation> = conversations
        .iter()
        .filter(|c| c.id.starts_with(input))
        .collect();
    match matches.as_slice() {
        [single] => Some(single.id.clone()),
        _ => None,
    }
}

/// Accent color for the active theme
fn accent(text: &str, theme: Theme) -> colored::ColoredString {
    match theme {
        Theme::Light => text.blue(),
        Theme::Dark => text.cyan(),
    }
}

fn inlines_to_ansi(spans: &[Inline]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Inline::Text(t) => out.push_str(t),
            Inline::Bold(inner) => out.push_str(&inlines_to_ansi(inner).bold().to_string()),
            Inline::Italic(inner) => out.push_str(&inlines_to_ansi(inner).italic().to_string()),
            Inline::Code(code) => out.push_str(&code.yellow().to_string()),
            Inline::LineBreak => out.push('\n'),
        }
    }
    out
}

fn print_block(block: &Block, theme: Theme, indent: &str) {
    match block {
        Block::Paragraph(spans) => {
            for line in inlines_to_ansi(spans).lines() {
                println!("{}{}", indent, line);
            }
        }
        Block::Heading { content, .. } => {
            println!("{}{}", indent, inlines_to_ansi(content).bold());
        }
        Block::List(items) => {
            for item in items {
                println!("{}  • {}", indent, inlines_to_ansi(item));
            }
        }
        Block::Quote(spans) => {
            println!("{}  {} {}", indent, "│".dimmed(), inlines_to_ansi(spans).italic());
        }
        Block::Callout(inner) => {
            println!("{}{}", indent, accent("ℹ No definitive answer found", theme));
            for block in inner {
                print_block(block, theme, &format!("{}  ", indent));
            }
        }
    }
}

fn print_citations(citations: &CitationsBlock, theme: Theme, expanded: bool) {
    if !expanded {
        println!(
            "{} {}",
            accent(&format!("▸ {}", citations.header), theme),
            "(/sources to expand)".dimmed()
        );
        return;
    }

    println!("{}", accent(&format!("▾ {}", citations.header), theme));
    for card in &citations.cards {
        println!("  {}", card.doc_name.bold());
        println!("  {}", card.meta.dimmed());
        if let Some(snippet) = &card.snippet {
            println!("  {}", snippet.italic().dimmed());
        }
    }
}

fn print_follow_ups(follow_ups: &FollowUpsBlock, theme: Theme) {
    println!("{}", accent("Suggested follow-ups:", theme));
    for (i, item) in follow_ups.items.iter().enumerate() {
        println!("  [{}] {}", i + 1, item);
    }
}

/// Print a rendered message to the terminal
///
/// `expand_sources` controls the collapsible citations block; the block
/// itself always starts collapsed, this is the toggle state.
pub fn print_rendered(rendered: &RenderedMessage, theme: Theme, expand_sources: bool) {
    for block in &rendered.blocks {
        print_block(block, theme, "");
    }
    if let Some(citations) = &rendered.citations {
        println!();
        print_citations(citations, theme, expand_sources);
    }
    if let Some(follow_ups) = &rendered.follow_ups {
        println!();
        print_follow_ups(follow_ups, theme);
    }
}

/// Special commands recognized by the interactive chat loop
#[derive(Debug, Clone, PartialEq, Eq)]
enum SpecialCommand {
    NewChat,
    ListHistory,
    Switch(String),
    Delete(String),
    ToggleSources,
    ToggleTheme,
    ToggleSidebar,
    Help,
    Exit,
    /// Not a special command; treat as a question
    None,
}

fn parse_special_command(input: &str) -> SpecialCommand {
    let mut parts = input.split_whitespace();
    match parts.next() {
        Some("/new") => SpecialCommand::NewChat,
        Some("/list") | Some("/history") => SpecialCommand::ListHistory,
        Some("/switch") => match parts.next() {
            Some(arg) => SpecialCommand::Switch(arg.to_string()),
            None => SpecialCommand::Help,
        },
        Some("/delete") => match parts.next() {
            Some(arg) => SpecialCommand::Delete(arg.to_string()),
            None => SpecialCommand::Help,
        },
        Some("/sources") => SpecialCommand::ToggleSources,
        Some("/theme") => SpecialCommand::ToggleTheme,
        Some("/sidebar") => SpecialCommand::ToggleSidebar,
        Some("/help") => SpecialCommand::Help,
        Some("/quit") | Some("/exit") => SpecialCommand::Exit,
        _ => SpecialCommand::None,
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /new             start a new conversation (current one is saved)");
    println!("  /list            list saved conversations");
    println!("  /switch <n|id>   switch to a saved conversation");
    println!("  /delete <n|id>   delete a saved conversation");
    println!("  /sources         expand or collapse citation details");
    println!("  /theme           toggle light/dark accent colors");
    println!("  /sidebar         toggle the history panel shown at startup");
    println!("  /help            show this help");
    println!("  /quit            exit");
    println!();
    println!("Type a number to ask a suggested follow-up question.");
}

/// Print the numbered history list, most recent first
fn print_history_list(history: &[Conversation], theme: Theme) {
    if history.is_empty() {
        println!("{}", "No saved conversations.".yellow());
        return;
    }
    println!("{}", accent("Saved conversations:", theme));
    for (i, conv) in history.iter().enumerate() {
        let id_short = &conv.id[..conv.id.len().min(8)];
        println!(
            "  [{}] {}  {}  {}",
            i + 1,
            id_short.dimmed(),
            conv.title,
            format!("({} messages)", conv.messages.len()).dimmed()
        );
    }
}

/// Resolve `/switch` and `/delete` arguments: a 1-based index into the
/// most-recent-first history list, a full id, or a unique id prefix.
fn resolve_history_arg(history: &[Conversation], arg: &str) -> Option<String> {
    if let Ok(index) = arg.parse::<usize>() {
        if index >= 1 && index <= history.len() {
            return Some(history[index - 1].id.clone());
        }
        return None;
    }
    resolve_id(history, arg)
}

// Interactive chat command handler
pub mod chat {
    //! Interactive chat session.
    //!
    //! Runs a readline loop feeding questions into the session controller
    //! and printing rendered answer blocks. Follow-up suggestions are
    //! selected by number and resubmitted exactly as if typed.

    use super::*;
    use crate::render::render_message;
    use crate::session::SessionController;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start an interactive chat session
    pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
        let store = open_store(&config)?;
        let client = build_client(&config)?;
        let service_url = client.base_url().to_string();
        let mut session = SessionController::new(store, client);

        let mut theme = session.store().theme();
        let mut expand_sources = false;

        print_banner(&session, &service_url, theme).await;

        if let Some(id_or_prefix) = resume {
            let history = session.history();
            match resolve_history_arg(&history, &id_or_prefix) {
                Some(id) => {
                    session.switch_to(&id);
                    println!("{}", accent("Resumed conversation:", theme));
                    replay_transcript(&session, theme, expand_sources);
                }
                None => {
                    println!(
                        "{}",
                        format!("No saved conversation matches '{}'.", id_or_prefix).yellow()
                    );
                }
            }
        }

        let mut rl = DefaultEditor::new()?;

        loop {
            let prompt = format!("{} ", accent("poliqa ❯", theme));
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_special_command(trimmed) {
                        SpecialCommand::NewChat => {
                            session.start_new_chat();
                            println!("Started a new conversation.\n");
                            continue;
                        }
                        SpecialCommand::ListHistory => {
                            print_history_list(&session.history(), theme);
                            continue;
                        }
                        SpecialCommand::Switch(arg) => {
                            let history = session.history();
                            let resolved = resolve_history_arg(&history, &arg);
                            match resolved {
                                Some(id) => {
                                    if session.switch_to(&id) {
                                        replay_transcript(&session, theme, expand_sources);
                                    }
                                }
                                None => println!(
                                    "{}",
                                    format!("No saved conversation matches '{}'.", arg).yellow()
                                ),
                            }
                            continue;
                        }
                        SpecialCommand::Delete(arg) => {
                            let history = session.history();
                            match resolve_history_arg(&history, &arg) {
                                Some(id) => {
                                    session.delete_conversation(&id);
                                    println!("Deleted conversation {}.", &id[..id.len().min(8)]);
                                }
                                None => println!(
                                    "{}",
                                    format!("No saved conversation matches '{}'.", arg).yellow()
                                ),
                            }
                            continue;
                        }
                        SpecialCommand::ToggleSources => {
                            expand_sources = !expand_sources;
                            if let Some(last) = last_assistant(&session) {
                                print_rendered(&render_message(&last), theme, expand_sources);
                            } else {
                                println!(
                                    "Citation details {}.",
                                    if expand_sources { "expanded" } else { "collapsed" }
                                );
                            }
                            continue;
                        }
                        SpecialCommand::ToggleTheme => {
                            theme = theme.toggled();
                            session.store().set_theme(theme);
                            println!("Theme set to {}.", theme.as_str());
                            continue;
                        }
                        SpecialCommand::ToggleSidebar => {
                            let state = session.store().sidebar().toggled();
                            session.store().set_sidebar(state);
                            println!("History panel {} at startup.", state.as_str());
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {}
                    }

                    // A bare number selects a follow-up from the last
                    // answer and submits it exactly as if typed.
                    let question = match follow_up_for_index(&session, trimmed) {
                        Some(text) => {
                            println!("{} {}", accent("you ❯", theme), text);
                            text
                        }
                        None => trimmed.to_string(),
                    };

                    ask_and_print(&mut session, &question, theme, expand_sources).await;
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::error!("Readline error: {}", e);
                    break;
                }
            }
        }

        session.start_new_chat(); // flush the active conversation on exit
        println!("Goodbye!");
        Ok(())
    }

    async fn print_banner(session: &SessionController, service_url: &str, theme: Theme) {
        println!("{}", accent("Poliqa Policy Q&A", theme).bold());

        match stats_line(session).await {
            Some(line) => println!("{}", line.dimmed()),
            None => println!(
                "{}",
                format!("Could not reach the answering service at {}", service_url).yellow()
            ),
        }
        println!("{}", "Type /help for commands.".dimmed());
        println!();

        if session.store().sidebar() == crate::store::SidebarState::Expanded {
            print_history_list(&session.history(), theme);
            println!();
        }
    }

    async fn stats_line(session: &SessionController) -> Option<String> {
        let stats = session.client().stats().await.ok()?;
        Some(format!(
            "Connected: {} document(s), {} chunks indexed ({} backend)",
            stats.documents, stats.chunks, stats.llm_backend
        ))
    }

    fn last_assistant(session: &SessionController) -> Option<crate::store::ChatMessage> {
        session
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == "assistant")
            .cloned()
    }

    fn follow_up_for_index(session: &SessionController, input: &str) -> Option<String> {
        let index: usize = input.parse().ok()?;
        let last = last_assistant(session)?;
        if index >= 1 && index <= last.follow_ups.len() {
            Some(last.follow_ups[index - 1].clone())
        } else {
            None
        }
    }

    async fn ask_and_print(
        session: &mut SessionController,
        question: &str,
        theme: Theme,
        expand_sources: bool,
    ) {
        use crate::session::AskOutcome;

        println!("{}", "Thinking...".dimmed());
        if session.ask(question).await == AskOutcome::Completed {
            if let Some(last) = last_assistant(session) {
                println!();
                print_rendered(&render_message(&last), theme, expand_sources);
                println!();
            }
        }
    }

    fn replay_transcript(session: &SessionController, theme: Theme, expand_sources: bool) {
        for message in session.messages() {
            if message.role == "user" {
                println!("{} {}", accent("you ❯", theme), message.content);
            } else {
                print_rendered(&render_message(message), theme, expand_sources);
            }
            println!();
        }
    }
}

// One-shot question handler
pub mod ask {
    //! Ask a single question, print the rendered answer, and exit.
    //!
    //! The exchange is persisted like any other, so a later `chat --resume`
    //! can pick it up.

    use super::*;
    use crate::render::render_message;
    use crate::session::{AskOutcome, SessionController};

    /// Ask one question and print the answer with expanded citations
    pub async fn run_ask(config: Config, question: String) -> Result<()> {
        let store = open_store(&config)?;
        let client = build_client(&config)?;
        let mut session = SessionController::new(store, client);
        let theme = session.store().theme();

        if session.ask(&question).await == AskOutcome::Skipped {
            println!("{}", "Nothing to ask.".yellow());
            return Ok(());
        }

        if let Some(answer) = session.messages().iter().rev().find(|m| m.role == "assistant") {
            // One-shot output expands citations; there is no toggle here.
            print_rendered(&render_message(answer), theme, true);
        }
        Ok(())
    }
}

// History command handlers
pub mod history {
    //! Stored conversation management: list, show, delete, export.

    use super::*;
    use crate::cli::HistoryCommand;
    use crate::render::{html, render_message};
    use prettytable::{format, Table};

    /// Handle history commands
    pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
        let store = open_store(config)?;
        let theme = store.theme();

        match command {
            HistoryCommand::List => {
                let mut conversations = store.list_all();
                conversations.reverse(); // display most-recent-first

                if conversations.is_empty() {
                    println!("{}", "No conversation history found.".yellow());
                    return Ok(());
                }

                let mut table = Table::new();
                table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
                table.add_row(prettytable::row![
                    "ID".bold(),
                    "Title".bold(),
                    "Messages".bold(),
                    "Last Updated".bold()
                ]);

                for conv in conversations {
                    let id_short = conv.id[..conv.id.len().min(8)].to_string();
                    let updated = conv.updated_at.format("%Y-%m-%d %H:%M").to_string();
                    table.add_row(prettytable::row![
                        id_short.cyan(),
                        conv.title,
                        conv.messages.len(),
                        updated
                    ]);
                }

                println!("\nConversation History:");
                table.printstd();
                println!();
                println!(
                    "Use {} to resume a conversation.",
                    "poliqa chat --resume <ID>".cyan()
                );
                println!();
            }
            HistoryCommand::Show { id } => {
                let conversations = store.list_all();
                let resolved =
                    resolve_id(&conversations, &id).and_then(|full_id| {
                        conversations.iter().find(|c| c.id == full_id)
                    });
                match resolved {
                    Some(conv) => {
                        println!("{}\n", conv.title.bold());
                        for message in &conv.messages {
                            if message.role == "user" {
                                println!("{} {}", accent("you ❯", theme), message.content);
                            } else {
                                print_rendered(&render_message(message), theme, true);
                            }
                            println!();
                        }
                    }
                    None => println!("{}", format!("No conversation matches '{}'.", id).yellow()),
                }
            }
            HistoryCommand::Delete { id } => {
                let conversations = store.list_all();
                match resolve_id(&conversations, &id) {
                    Some(full_id) => {
                        store.delete(&full_id);
                        println!("{}", format!("Deleted conversation {}", full_id).green());
                    }
                    None => println!("{}", format!("No conversation matches '{}'.", id).yellow()),
                }
            }
            HistoryCommand::Export { id, output } => {
                let conversations = store.list_all();
                let resolved =
                    resolve_id(&conversations, &id).and_then(|full_id| {
                        conversations.iter().find(|c| c.id == full_id)
                    });
                match resolved {
                    Some(conv) => {
                        let path = output
                            .unwrap_or_else(|| std::path::PathBuf::from(format!("{}.html", conv.id)));
                        std::fs::write(&path, html::conversation_to_html(conv))?;
                        println!(
                            "{}",
                            format!("Exported conversation to {}", path.display()).green()
                        );
                    }
                    None => println!("{}", format!("No conversation matches '{}'.", id).yellow()),
                }
            }
        }

        Ok(())
    }
}
