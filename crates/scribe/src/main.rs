//! scribe - turn decoded note stems into controller event tracks
//!
//! Subcommands:
//! - `scribe transcribe <input>` - Transcribe a note-stem JSON document
//! - `scribe key <input>` - Report the detected key only
//! - `scribe config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribeconf::ScribeConfig;
use transcribe::ReductionPreset;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Transcribe note stems into controller-playable events")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./scribe.toml)
    #[arg(short, long, global = true, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe a note-stem JSON document ("-" reads stdin)
    Transcribe {
        /// Input document path
        input: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat the stem as drums
        #[arg(long)]
        drums: bool,

        /// Emit single notes only, never chords
        #[arg(long)]
        force_notes: bool,

        /// Clip notes that overlap the next onset
        #[arg(long)]
        trim_overlaps: bool,

        /// Override the document's tempo
        #[arg(long)]
        bpm: Option<f64>,

        /// Simplification preset: off, hard, medium, easy
        #[arg(short, long)]
        reduction: Option<ReductionPreset>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Detect the key of a note-stem JSON document
    Key {
        /// Input document path
        input: PathBuf,

        /// Print the key as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration as TOML
    Config {
        /// Also list the files and environment variables that were applied
        #[arg(long)]
        sources: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ScribeConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    telemetry::init(&config.telemetry.log_level)?;

    match cli.command {
        Commands::Transcribe {
            input,
            output,
            drums,
            force_notes,
            trim_overlaps,
            bpm,
            reduction,
            compact,
        } => {
            let overrides = commands::TranscribeOverrides {
                drums,
                force_notes,
                trim_overlaps,
                bpm,
                reduction,
                compact,
            };
            commands::transcribe_file(&config, &input, output.as_deref(), &overrides)?;
        }
        Commands::Key { input, json } => {
            commands::key(&config, &input, json)?;
        }
        Commands::Config { sources: show } => {
            commands::show_config(&config, show.then_some(&sources));
        }
    }

    Ok(())
}
