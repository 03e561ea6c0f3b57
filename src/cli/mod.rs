//! CLI Module
//!
//! Command-line interface for clipforge.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Clipforge - narration and music bed mixer
#[derive(Parser, Debug)]
#[command(name = "clipforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON mix settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mix narration over a music bed looped to the narration's length
    #[command(name = "merge")]
    Merge {
        /// Speech source (WAV, MP3, FLAC, OGG, M4A)
        #[arg(long)]
        speech: PathBuf,

        /// Background music source
        #[arg(long)]
        music: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Speech gain factor (default 1.0)
        #[arg(long)]
        speech_volume: Option<f32>,

        /// Music gain factor (default 0.5)
        #[arg(long)]
        music_volume: Option<f32>,
    },

    /// Render a single asset descriptor
    #[command(name = "render")]
    Render {
        /// Asset descriptor (JSON)
        asset: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render every asset descriptor found under a directory
    #[command(name = "batch")]
    Batch {
        /// Directory to search for *.json descriptors
        dir: PathBuf,

        /// Directory rendered WAV files are written to
        #[arg(short = 'd', long)]
        output_dir: PathBuf,
    },

    /// Print duration, format and peak level of an audio file
    #[command(name = "inspect")]
    Inspect {
        /// Audio file
        path: PathBuf,
    },
}
