//! Command-line interface for parley
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live speech translation for the terminal
#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Live speech translation for the terminal")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v: lifecycle events, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device name (default: interactive selection)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Source language: en, ja, ko, fr, or "mixed" (default: interactive selection)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Transcribe an audio file (one-shot, not live)
    Transcribe {
        /// Audio file to transcribe (mp3, wav, m4a, flac, ogg, webm)
        file: PathBuf,

        /// Output file path (default: input file with .txt extension)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Skip ffmpeg noise-reduction preprocessing
        #[arg(long)]
        no_preprocess: bool,
    },
}
