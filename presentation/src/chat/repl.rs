//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleResponseFormatter;
use colored::Colorize;
use finsense_application::TurnOrchestrator;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

const HISTORY_CAPACITY: usize = 1000;

/// Slash commands understood by the REPL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Stats,
    Cache,
    ClearCache,
    Quit,
    Unknown,
}

impl ReplCommand {
    pub fn parse(input: &str) -> Self {
        match input.split_whitespace().next().unwrap_or_default() {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/stats" => ReplCommand::Stats,
            "/cache" => ReplCommand::Cache,
            "/clear-cache" => ReplCommand::ClearCache,
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            _ => ReplCommand::Unknown,
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    orchestrator: Arc<TurnOrchestrator>,
    formatter: ConsoleResponseFormatter,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    pub fn new(orchestrator: Arc<TurnOrchestrator>) -> Self {
        Self {
            orchestrator,
            formatter: ConsoleResponseFormatter::new(),
            history_path: dirs::data_dir().map(|p| p.join("finsense").join("history.txt")),
        }
    }

    pub fn with_formatter(mut self, formatter: ConsoleResponseFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.history_path else {
            return editor;
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("Chat history disabled ({}): {}", path.display(), e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> std::io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("finsense".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.process_query(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                #[allow(unreachable_patterns)]
                _ => continue,
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "finsense - financial research chat".bold());
        println!();
        println!("Ask about the market, a sector, a stock, risks or recent news.");
        println!("Type /help for commands.");
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /stats            - Show session analytics");
        println!("  /cache            - Show tool cache statistics");
        println!("  /clear-cache      - Drop all cached tool results");
        println!("  /quit, /exit, /q  - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, cmd: &str) -> bool {
        match ReplCommand::parse(cmd) {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => self.print_help(),
            ReplCommand::Stats => {
                let summary = self.orchestrator.analytics().summary();
                println!("{}\n", self.formatter.analytics(&summary));
            }
            ReplCommand::Cache => {
                let stats = self.orchestrator.optimizer().cache_stats();
                println!("{}\n", self.formatter.cache(&stats));
            }
            ReplCommand::ClearCache => {
                self.orchestrator.optimizer().clear_cache();
                println!("Tool cache cleared.\n");
            }
            ReplCommand::Unknown => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
            }
        }
        false
    }

    async fn process_query(&self, query: &str) {
        println!();
        let report = self.orchestrator.process_message(query).await;
        debug!(
            "Turn finished in {:?} via {:?}",
            report.elapsed, report.states
        );
        if report.failed() {
            eprintln!("{}", report.response.red());
        } else {
            println!("{}", report.response);
        }
        println!();
    }
}
