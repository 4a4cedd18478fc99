use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

use crate::{config::Config, pattern::Inject};

/// The command line interface for linkburst.
///
/// No positional arguments are accepted; the tool talks to a serial
/// device, not to stdin.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Bit rate on the line [default: 115200]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub bit_rate: Option<u32>,

    /// Serial device to open [default: /dev/ttyUSB0]
    #[arg(short, long)]
    pub port: Option<String>,

    /// Receive and verify the pattern
    #[arg(short, long)]
    pub receive: bool,

    /// Transmit the pattern
    #[arg(short, long)]
    pub transmit: bool,

    /// Use hardware (RTS/CTS) flow control
    #[arg(short, long)]
    pub flow_control: bool,

    /// Be verbose; repeat for more chatter
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Keep testing after an unresolvable desync instead of exiting
    #[arg(short = 'R', long)]
    pub restart: bool,

    /// Deliberately fault the transmitted pattern, once per period.
    /// Lets a loopback cable exercise the receive-side diagnosis.
    #[arg(long, value_enum)]
    pub inject: Option<Inject>,

    /// Path to a configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The default log level this invocation asked for.
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Commands available in the command line interface.
#[derive(Subcommand)]
pub enum Commands {
    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),
}

/// Helpful examples for users.
#[derive(Subcommand, Clone)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,
}

/// Act on a subcommand.
pub fn handle_command(command: Commands) {
    match command {
        Commands::Examples(example) => match example {
            Examples::Config => {
                println!("{}", Config::example().serialize_pretty());
            }
        },
    }
}
