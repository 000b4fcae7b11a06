// Command-line interface definitions for voskpipe
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voskpipe")]
#[command(author, version, about = "Streamed speech recognition via a Vosk recognizer CLI")]
#[command(long_about = "
Voskpipe manages an external Vosk-based recognizer process and the acoustic
models it consumes. It spawns the recognizer, decodes its JSON event stream,
and can download and install model archives.

SETUP:
  1. Install the recognizer CLI (vosk-cli) on PATH, or set recognizer.path
     in ~/.config/voskpipe/config.toml
  2. Run: voskpipe model ensure --url <archive-url> (to install a model)
  3. Run: voskpipe listen (to stream recognition events)
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream recognition events from the recognizer (default command)
    Listen {
        /// Audio device index (see `voskpipe devices`)
        #[arg(short, long, value_name = "INDEX")]
        device: Option<i32>,

        /// Model directory to pass to the recognizer
        #[arg(short, long, value_name = "DIR")]
        model: Option<std::path::PathBuf>,

        /// Print raw JSON events instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// List the recognizer's audio capture devices
    Devices {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the recognizer's version
    Version,

    /// Manage recognition models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// Download and install the configured model if missing
    Ensure {
        /// Archive URL (overrides model.url from config)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Re-download even if the model is already installed
        #[arg(long)]
        force: bool,
    },

    /// Report whether the configured model is installed
    Status,

    /// Print the resolved model directory path
    Path,
}
