//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for streamchat
#[derive(Parser, Debug)]
#[command(name = "streamchat")]
#[command(author, version, about = "Streaming chat client for OpenAI-compatible endpoints")]
#[command(long_about = r#"
streamchat sends each message, together with the whole conversation so far,
to an OpenAI-compatible endpoint and prints the reply as it streams in.

Modes map short names to backend models (see --list-modes). Press Ctrl-C
while a reply is streaming to cancel it; the partial reply is kept.

Configuration files are loaded from (in priority order):
1. STREAMCHAT_* environment variables
2. --config <path>         Explicit config file
3. ./streamchat.toml       Project-level config
4. ~/.config/streamchat/config.toml   Global config

Example:
  streamchat "What is 2+2?"
  streamchat -m fast --system "Answer in one word" "Capital of France?"
  streamchat
"#)]
pub struct Cli {
    /// Send a single message and exit (starts the chat REPL when omitted)
    pub prompt: Option<String>,

    /// Mode to use (a key from the [modes] table)
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,

    /// System prompt placed at the start of the conversation
    #[arg(long, value_name = "TEXT")]
    pub system: Option<String>,

    /// Inactivity timeout in seconds (overrides stream.inactivity_timeout_secs)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write turn lifecycle events to a JSONL file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// List configured modes and exit
    #[arg(long)]
    pub list_modes: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
