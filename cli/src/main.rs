//! CLI entrypoint for finsense
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use finsense_application::{
    ConversationLogger, NoConversationLogger, ToolCache, ToolOptimizer, ToolRouter,
    TurnOrchestrator,
};
use finsense_domain::ToolRegistry;
use finsense_infrastructure::{
    ConfigLoader, FileConfig, HistoryContextBuilder, InMemoryAnalytics, InMemoryConversation,
    InMemoryPreferences, JsonlConversationLogger, KeywordIntentClassifier, Severity,
    connection_registry,
};
use finsense_presentation::{ChatRepl, Cli, ConsoleResponseFormatter};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Install the stderr subscriber and, when configured, a daily rolling log file.
///
/// The returned guard must live until exit so buffered file lines are flushed.
fn init_tracing(cli: &Cli, config: &FileConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &config.logging.file_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "finsense.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| *e)
        .context("Failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = load_config(&cli)?;
    let _log_guard = init_tracing(&cli, &config);

    info!("Starting finsense");

    for issue in config.validate() {
        match issue.severity {
            Severity::Error => error!("Config error: {}", issue),
            Severity::Warning => warn!("Config warning: {}", issue),
        }
    }

    if cli.no_color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let params = config.execution_params();
    let connections = connection_registry(config.server_specs());
    info!("Configured tool servers: {:?}", connections.names());

    let cache = Arc::new(ToolCache::new());
    let optimizer = Arc::new(ToolOptimizer::new(connections.clone(), cache, params.clone()));
    let router = ToolRouter::new(Arc::new(ToolRegistry::finsense()), params.default_timeframe.clone());

    let formatter = ConsoleResponseFormatter::new().with_color(!cli.no_color);
    let logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log {
        Some(path) => match JsonlConversationLogger::open(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };

    let orchestrator = Arc::new(
        TurnOrchestrator::new(
            Arc::new(KeywordIntentClassifier::new()),
            Arc::new(InMemoryPreferences::new()),
            Arc::new(InMemoryConversation::new(config.conversation.max_history)),
            router,
            optimizer,
            Arc::new(formatter.clone()),
        )
        .with_context_builder(Arc::new(
            HistoryContextBuilder::new().with_follow_ups(!cli.no_follow_ups),
        ))
        .with_analytics(Arc::new(InMemoryAnalytics::new()))
        .with_conversation_logger(logger)
        .with_context_window(params.context_window),
    );

    let outcome = match cli.query {
        Some(query) => {
            let report = orchestrator.process_message(&query).await;
            println!("{}", report.response);
            Ok(())
        }
        None => {
            let repl = ChatRepl::new(Arc::clone(&orchestrator)).with_formatter(formatter);
            repl.run().await.context("Chat session failed")
        }
    };

    connections.close_all().await;
    info!("All tool servers closed");

    outcome
}
