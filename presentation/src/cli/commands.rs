//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for finsense
#[derive(Parser, Debug)]
#[command(name = "finsense")]
#[command(author, version, about = "Financial research assistant over stdio tool servers")]
#[command(long_about = r#"
finsense answers market, sector, stock, risk and news questions by routing
them to tool servers (market, news, risk) spoken to over stdio JSON-RPC.

Each message is classified, routed to the tools that serve its intent,
executed through a shared result cache and rendered as text.

Configuration files are loaded from (in priority order):
1. FINSENSE_* environment variables (FINSENSE_CACHE__DEFAULT_TTL_SECS=60)
2. --config <path>     Explicit config file
3. ./finsense.toml     Project-level config
4. ~/.config/finsense/config.toml   Global config

Example:
  finsense "How is the market doing today?"
  finsense "Compare technology and energy"
  finsense            (starts interactive chat)
"#)]
pub struct Cli {
    /// A single query to answer; starts interactive chat when omitted
    pub query: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Do not append suggested follow-up questions to answers
    #[arg(long)]
    pub no_follow_ups: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Default tracing filter for the verbosity flag
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
