//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use std::sync::PoisonError;
use streamchat_application::{TurnController, TurnHandle, TurnOutcome};
use streamchat_domain::Role;
use tracing::{debug, warn};

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    /// `/mode` shows the current mode, `/mode <key>` switches
    Mode(Option<String>),
    Modes,
    Clear,
    History,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::to_string);
        match name {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/mode" | "/m" => ReplCommand::Mode(arg),
            "/modes" => ReplCommand::Modes,
            "/clear" => ReplCommand::Clear,
            "/history" => ReplCommand::History,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

/// Where the REPL keeps its line history.
///
/// An explicit path wins (with a leading `~/` expanded); otherwise the
/// platform data dir is used.
pub fn resolve_history_path(configured: Option<&str>) -> Option<PathBuf> {
    match configured {
        Some(path) => match path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(path)),
        },
        None => dirs::data_dir().map(|p| p.join("streamchat").join("history.txt")),
    }
}

/// Wait for a submitted turn, cancelling it on Ctrl-C.
pub async fn wait_with_interrupt(handle: TurnHandle) -> TurnOutcome {
    let canceller = handle.canceller();
    let wait = handle.wait();
    tokio::pin!(wait);

    tokio::select! {
        outcome = &mut wait => outcome,
        _ = tokio::signal::ctrl_c() => {
            debug!("Ctrl-C received, cancelling turn");
            canceller.cancel();
            wait.await
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    controller: TurnController,
    mode: String,
    system_prompt: Option<String>,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    /// Create a new ChatRepl starting in the catalog's default mode
    pub fn new(controller: TurnController) -> Self {
        let mode = controller.catalog().default_mode().key.to_string();
        Self {
            controller,
            mode,
            system_prompt: None,
            history_path: resolve_history_path(None),
        }
    }

    /// Start in `mode` (already validated against the catalog)
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// System prompt re-inserted after `/clear`
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            let prompt = format!("{}> ", self.mode);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    if line.starts_with('/') {
                        if self.handle_command(ReplCommand::parse(line)) {
                            break;
                        }
                        continue;
                    }

                    self.process_message(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            if let Err(e) = rl.save_history(path) {
                warn!("Could not save history to {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│              streamchat - Chat              │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Mode: {}", self.mode.bold());
        println!("Press Ctrl-C while a reply streams to cancel it.");
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /mode [key]       - Show or switch the current mode");
        println!("  /modes            - List available modes");
        println!("  /clear            - Start a new conversation");
        println!("  /history          - Show the conversation so far");
        println!("  /quit, /exit, /q  - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&mut self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => {
                println!();
                Self::print_help();
            }
            ReplCommand::Mode(None) => {
                println!("Current mode: {}", self.mode.bold());
            }
            ReplCommand::Mode(Some(key)) => match self.controller.catalog().resolve(&key) {
                Ok(resolved) => {
                    self.mode = resolved.key.to_string();
                    println!(
                        "Switched to {} ({})",
                        self.mode.bold(),
                        resolved.model_identifier
                    );
                }
                Err(e) => {
                    println!("{} {}", "Error:".red().bold(), e);
                    println!("Type /modes for available modes");
                }
            },
            ReplCommand::Modes => {
                println!();
                print!(
                    "{}",
                    ConsoleFormatter::modes(self.controller.catalog(), &self.mode)
                );
                println!();
            }
            ReplCommand::Clear => {
                self.reset_conversation();
                println!("Conversation cleared.");
            }
            ReplCommand::History => {
                let turns = self
                    .controller
                    .conversation()
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .snapshot();
                println!();
                print!("{}", ConsoleFormatter::transcript(&turns));
                println!();
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    fn reset_conversation(&self) {
        let mut store = self
            .controller
            .conversation()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        store.reset();
        if let Some(system) = &self.system_prompt {
            if let Err(e) = store.append_turn(Role::System, system.clone()) {
                warn!("Could not restore system prompt: {}", e);
            }
        }
    }

    async fn process_message(&self, message: &str) {
        let handle = match self.controller.submit_turn(message, &self.mode) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                return;
            }
        };
        println!();
        let outcome = wait_with_interrupt(handle).await;
        debug!("{} finished as {}", outcome.turn_id, outcome.status);
        println!();
    }
}
