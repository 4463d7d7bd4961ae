use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Statistics on masked geophysical grid fields.
#[derive(Parser)]
#[command(
    name = "cmbs",
    version,
    about = "Statistics on masked geophysical grid fields"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Load one variable and summarize it as JSON.
    Inspect(InspectArgs),
}

/// Arguments for the `inspect` subcommand.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "cmbs.toml")]
    pub config: PathBuf,

    /// Write the JSON summary here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
