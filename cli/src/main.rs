//! CLI entrypoint for streamchat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use streamchat_application::{
    ConversationLogger, NoConversationLogger, SharedConversation, TurnController,
};
use streamchat_domain::{ConversationStore, Role};
use streamchat_infrastructure::{
    ConfigLoader, FileConfig, HttpInferenceGateway, JsonlConversationLogger,
};
use streamchat_presentation::chat::resolve_history_path;
use streamchat_presentation::{
    ChatRepl, Cli, ConsoleFormatter, StreamReporter, wait_with_interrupt,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    // stdout carries the streamed reply
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let catalog = config
        .mode_catalog()
        .context("Invalid [modes] configuration")?;

    if cli.list_modes {
        print!(
            "{}",
            ConsoleFormatter::modes(&catalog, catalog.default_mode().key.as_str())
        );
        return Ok(());
    }

    let mode = match &cli.mode {
        Some(key) => catalog.resolve(key).map_err(|e| {
            anyhow!(
                "{} (available: {})",
                e,
                catalog.keys().collect::<Vec<_>>().join(", ")
            )
        })?,
        None => catalog.default_mode(),
    };

    let mut settings = config.stream_settings();
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout must be at least 1 second");
        }
        settings = settings.with_inactivity_timeout(Duration::from_secs(secs));
    }

    info!(
        "Starting streamchat: mode={}, model={}",
        mode.key, mode.model_identifier
    );

    // === Dependency Injection ===
    let gateway = Arc::new(
        HttpInferenceGateway::new(config.gateway_config())
            .context("Failed to create inference gateway")?,
    );

    let conversation: SharedConversation = Arc::new(Mutex::new(ConversationStore::new()));
    {
        let mut store = conversation
            .lock()
            .map_err(|_| anyhow!("conversation lock poisoned"))?;
        let show_progress = !cli.quiet && config.repl.show_progress;
        store.subscribe(Arc::new(StreamReporter::stdout(show_progress)));
        if let Some(system) = &cli.system {
            store.append_turn(Role::System, system.clone())?;
        }
    }

    let controller = TurnController::new(conversation, Arc::new(catalog), gateway)
        .with_settings(settings)
        .with_conversation_logger(conversation_logger(&cli, &config));

    // Single message mode
    if let Some(prompt) = &cli.prompt {
        let handle = controller.submit_turn(prompt, mode.key.as_str())?;
        let outcome = wait_with_interrupt(handle).await;
        if let Some(reason) = outcome.failure {
            bail!("{} ended: {}", outcome.turn_id, reason);
        }
        return Ok(());
    }

    let mut repl = ChatRepl::new(controller)
        .with_mode(mode.key.as_str())
        .with_system_prompt(cli.system.clone())
        .with_history_path(resolve_history_path(config.repl.history_file.as_deref()));
    repl.run().await?;

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
        eprintln!("{}", issue);
    }
    let errors: Vec<String> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(|i| i.message.clone())
        .collect();
    if !errors.is_empty() {
        bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }

    Ok(config)
}

fn conversation_logger(cli: &Cli, config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let path = cli
        .log_file
        .clone()
        .or_else(|| config.logging.conversation_log.as_ref().map(Into::into));

    match path.and_then(JsonlConversationLogger::new) {
        Some(logger) => {
            info!("Conversation log: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}
