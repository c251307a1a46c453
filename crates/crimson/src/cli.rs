//! Clap derive structures for the `crimson` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// crimson -- CrimsonGuard VPN dashboard for the terminal
#[derive(Debug, Parser)]
#[command(
    name = "crimson",
    version,
    about = "Browse CrimsonGuard VPN endpoints and run simulated sessions",
    long_about = "Browse the CrimsonGuard endpoint catalog, ask the security advisor\n\
        about a location, and run a simulated connection with live traffic.\n\n\
        Advisory text comes from the Generative Language API when an API key\n\
        is configured, and falls back to stock guidance otherwise.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, env = "CRIMSON_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CRIMSON_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Never contact the advisory service; use stock guidance
    #[arg(long, env = "CRIMSON_OFFLINE", global = true)]
    pub offline: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the endpoint catalog
    #[command(alias = "srv", alias = "s")]
    Servers(ServersArgs),

    /// Show security advice for one endpoint
    Advise(AdviseArgs),

    /// Ask the advisor for the best endpoint
    #[command(alias = "rec")]
    Recommend,

    /// Run a simulated session and stream its traffic
    #[command(alias = "up")]
    Connect(ConnectArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SERVERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ServersArgs {
    #[command(subcommand)]
    pub command: ServersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServersCommand {
    /// List endpoints, optionally filtered
    #[command(alias = "ls")]
    List(ServerListArgs),

    /// Show one endpoint in detail
    Show {
        /// Endpoint id
        id: String,
    },
}

#[derive(Debug, Default, Args)]
pub struct ServerListArgs {
    /// Case-insensitive match on city or country
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Exact country name (case-insensitive)
    #[arg(long, short = 'c')]
    pub country: Option<String>,

    /// Only endpoints at or below this load percentage
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub max_load: Option<u8>,

    /// Only endpoints at or below this latency in milliseconds
    #[arg(long, value_name = "MS")]
    pub max_latency: Option<u32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ADVISE / CONNECT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AdviseArgs {
    /// Endpoint id
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Endpoint to connect through (defaults to the first catalog entry)
    #[arg(long, short = 's', value_name = "ID")]
    pub server: Option<String>,

    /// Disconnect after this many seconds of connected time (default: until Ctrl-C)
    #[arg(long, short = 'd', value_name = "SECS")]
    pub duration: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Create initial config file with guided setup
    Init,

    /// Store the advisor API key in the system keyring
    SetApiKey {
        /// Write the key into the config file instead of the keyring
        #[arg(long)]
        plaintext: bool,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
