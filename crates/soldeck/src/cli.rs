//! Clap derive structures for the `soldeck` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// soldeck -- push Home Assistant solar data to an ESP32 touch display
#[derive(Debug, Parser)]
#[command(
    name = "soldeck",
    version,
    about = "Push Home Assistant solar data to an ESP32 touch display",
    long_about = "A headless daemon that samples entity states from Home Assistant,\n\
        rotates display pages, and pushes an aggregated payload to the\n\
        display's ESPHome update service on a fixed cadence.",
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
    /// Config file path
    #[arg(long, short = 'c', env = "SOLDECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Home Assistant URL (overrides config)
    #[arg(long, env = "SOLDECK_URL", global = true)]
    pub url: Option<String>,

    /// Long-lived access token (overrides config)
    #[arg(long, env = "SOLDECK_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the push daemon until interrupted
    Run,

    /// Run a single update cycle and print the raw payload as JSON
    Cycle,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the loaded configuration as TOML (token redacted)
    Show,

    /// Write a default config template
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
