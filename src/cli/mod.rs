//! CLI module for Paykit
//!
//! Provides analytics commands:
//! - `events`: List known analytics event names
//! - `payload`: Print the payload an event would produce
//! - `log`: Dispatch an event through the analytics client

use clap::{Args, Parser, Subcommand};

pub mod dispatch;

/// Paykit SDK tooling
#[derive(Parser, Debug)]
#[command(name = "paykit")]
#[command(about = "Payments SDK analytics tooling")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List analytics event names and usage keys
    Events,
    /// Print the payload for an event as JSON
    Payload(EventArgs),
    /// Log an event (sent, captured, or dropped depending on the environment)
    Log {
        #[command(flatten)]
        event: EventArgs,
        /// Milliseconds to wait for the fire-and-forget request before exiting
        #[arg(long, default_value_t = 1500)]
        wait_ms: u64,
    },
}

/// Describes one analytic on the command line
#[derive(Args, Debug, Clone)]
pub struct EventArgs {
    /// Event wire name (see `paykit events`)
    pub event: String,
    /// Event param as key=value; values that parse as JSON are sent as JSON
    #[arg(short, long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
    /// Additional info tag
    #[arg(long = "info", value_name = "TAG")]
    pub info: Vec<String>,
    /// Usage key to register before logging
    #[arg(long = "usage", value_name = "KEY")]
    pub usage: Vec<String>,
    /// Attach an API error of this type (e.g. card_error)
    #[arg(long)]
    pub error_type: Option<String>,
    /// Code for the attached API error
    #[arg(long, requires = "error_type")]
    pub error_code: Option<String>,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Events) => {
            dispatch::list_events();
            Ok(())
        }
        Some(Commands::Payload(args)) => dispatch::print_payload(&args),
        Some(Commands::Log { event, wait_ms }) => dispatch::log_event(&event, wait_ms).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
