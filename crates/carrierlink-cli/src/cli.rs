//! Command-line interface argument parsing and definitions
//!
//! One subcommand per carrier contract operation, plus provider listing
//! and shell completions.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Carrierlink CLI - quote, book, track and cancel shipments across carriers
///
/// Every carrier is driven through the same commands and prints the same
/// canonical result shapes, whichever provider API sits underneath.
#[derive(Parser, Debug)]
#[command(
    name = "carrierlink",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CARRIERLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List supported providers and whether credentials are configured
    Providers,

    /// Check that a provider accepts the configured credentials
    TestConnection(ProviderArgs),

    /// Quote shipping rates for a rate request file
    Rates(RequestFileArgs),

    /// Book a shipment from a shipment request file
    Ship(ShipArgs),

    /// Show the tracking history of a shipment
    Track(TrackArgs),

    /// Cancel a booked shipment
    Cancel(CancelArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for commands that only need a provider
#[derive(Parser, Debug)]
pub struct ProviderArgs {
    /// Provider id (see `carrierlink providers`)
    #[arg(value_name = "PROVIDER")]
    pub provider: String,
}

/// Arguments for the rates command
#[derive(Parser, Debug)]
pub struct RequestFileArgs {
    /// Provider id (see `carrierlink providers`)
    #[arg(value_name = "PROVIDER")]
    pub provider: String,

    /// Rate request file (JSON or YAML)
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,
}

/// Arguments for the ship command
#[derive(Parser, Debug)]
pub struct ShipArgs {
    /// Provider id (see `carrierlink providers`)
    #[arg(value_name = "PROVIDER")]
    pub provider: String,

    /// Shipment request file (JSON or YAML)
    #[arg(value_name = "REQUEST")]
    pub request: PathBuf,

    /// Service code from `carrierlink rates`, overriding the one in the file
    #[arg(short, long)]
    pub service_code: Option<String>,
}

/// Arguments for the track command
#[derive(Parser, Debug)]
pub struct TrackArgs {
    /// Provider id (see `carrierlink providers`)
    #[arg(value_name = "PROVIDER")]
    pub provider: String,

    /// Carrier tracking number (AWB)
    #[arg(value_name = "TRACKING_NUMBER")]
    pub tracking_number: String,
}

/// Arguments for the cancel command
#[derive(Parser, Debug)]
pub struct CancelArgs {
    /// Provider id (see `carrierlink providers`)
    #[arg(value_name = "PROVIDER")]
    pub provider: String,

    /// Provider-side shipment id returned by `carrierlink ship`
    #[arg(value_name = "PROVIDER_SHIPMENT_ID")]
    pub provider_shipment_id: String,
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Commands {
    /// Provider the command targets, if any
    pub fn provider(&self) -> Option<&str> {
        match self {
            Commands::TestConnection(args) => Some(&args.provider),
            Commands::Rates(args) => Some(&args.provider),
            Commands::Ship(args) => Some(&args.provider),
            Commands::Track(args) => Some(&args.provider),
            Commands::Cancel(args) => Some(&args.provider),
            Commands::Providers | Commands::Completions(_) => None,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
