use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rush-output")]
#[command(author, version, about = "Real-time RUSH container muxer")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture synthetic audio/video into a RUSH file
    Generate {
        /// Output file (overrides the configured path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds of media to capture before the scheduled stop
        #[arg(long, default_value = "2")]
        seconds: u64,

        /// Stop after this many milliseconds instead of --seconds
        #[arg(long)]
        stop_after_ms: Option<u64>,
    },

    /// List the frames of a RUSH file
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Output one JSON object per frame
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
