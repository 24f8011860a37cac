//! CLI command implementations

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use scribeconf::{ConfigSources, ScribeConfig};
use tracing::{debug, info};
use transcribe::{ApproxLevel, ReductionPreset, TranscriptionInput, TranscriptionResult};

/// Command-line settings layered over config and the input document.
#[derive(Debug, Default)]
pub struct TranscribeOverrides {
    pub drums: bool,
    pub force_notes: bool,
    pub trim_overlaps: bool,
    pub bpm: Option<f64>,
    pub reduction: Option<ReductionPreset>,
    pub compact: bool,
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .context("Failed to read input from stdin")?;
        Ok(contents)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display()))
    }
}

/// Parse a note-stem document.
///
/// A document without an `options` object (or with `null`) takes the
/// configured engine defaults; one with `options` uses its own, missing fields defaulted.
fn load_input(config: &ScribeConfig, path: &Path) -> Result<TranscriptionInput> {
    let contents = read_source(path)?;
    let document: serde_json::Value = serde_json::from_str(&contents)
        .with_context(|| format!("Input {} is not valid JSON", path.display()))?;
    let has_options = document.get("options").is_some_and(|o| !o.is_null());

    let mut input: TranscriptionInput = serde_json::from_value(document)
        .with_context(|| format!("Input {} is not a note-stem document", path.display()))?;
    if !has_options {
        input.options = config.transcribe;
    }

    debug!(
        notes = input.notes.len(),
        bpm = input.bpm,
        configured_options = !has_options,
        "loaded input"
    );
    Ok(input)
}

fn render(result: &TranscriptionResult, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(json)
}

/// Transcribe a document and write the result JSON.
pub fn transcribe_file(
    config: &ScribeConfig,
    input_path: &Path,
    output_path: Option<&Path>,
    overrides: &TranscribeOverrides,
) -> Result<()> {
    let mut input = load_input(config, input_path)?;
    if overrides.drums {
        input.is_drum_stem = true;
    }
    if overrides.force_notes {
        input.options.force_note_mode = true;
    }
    if overrides.trim_overlaps {
        input.options.trim_overlaps = true;
    }
    if let Some(bpm) = overrides.bpm {
        input.bpm = bpm;
    }

    let mut result = transcribe::transcribe(&input)
        .with_context(|| format!("Failed to transcribe {}", input_path.display()))?;

    let reduction = overrides.reduction.unwrap_or(config.output.reduction);
    if reduction != ReductionPreset::Off {
        info!(%reduction, "applying reduction");
        transcribe::apply_reduction(&mut result.events, reduction, result.timing.seconds_per_beat);
    }

    let json = render(&result, config.output.pretty && !overrides.compact)?;

    match output_path {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_summary(&result, path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn print_summary(result: &TranscriptionResult, path: &Path) {
    let stats = &result.stats;
    println!(
        "{} {} events ({} chords, {} notes) in {} -> {}",
        "✓".green(),
        stats.total,
        stats.chord_events,
        stats.note_events,
        result.key.to_string().bold(),
        path.display()
    );
    println!(
        "  difficulty {} ({}), {} exact",
        stats.difficulty.rating,
        stats.difficulty.label.cyan(),
        stats.approx_counts.get(ApproxLevel::Exact)
    );
    for (level, count) in stats.approx_counts.iter() {
        if count > 0 && !level.is_exact() {
            println!("  {:?}: {}", level, count.yellow());
        }
    }
}

/// Print the key the engine would use for a document.
pub fn key(config: &ScribeConfig, input_path: &Path, json: bool) -> Result<()> {
    let input = load_input(config, input_path)?;
    let key = transcribe::detect_key(&input.notes, input.key_signature.as_ref());

    if json {
        println!("{}", serde_json::to_string(&key)?);
    } else {
        println!("{}", key.to_string().bold());
    }
    Ok(())
}

/// Print the effective config, optionally with where it came from.
pub fn show_config(config: &ScribeConfig, sources: Option<&ConfigSources>) {
    if let Some(sources) = sources {
        if sources.files.is_empty() {
            println!("# No config files loaded (using defaults)");
        }
        for file in &sources.files {
            println!("# loaded: {}", file.display());
        }
        for var in &sources.env_overrides {
            println!("# env: {}", var);
        }
        println!();
    }
    print!("{}", config.to_toml());
}
