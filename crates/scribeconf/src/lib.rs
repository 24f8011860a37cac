//! Layered configuration for the scribe transcription tool.
//!
//! Engine defaults, logging, and output handling come from TOML files and
//! environment variables, so the CLI and anything embedding the engine
//! agree on the same knobs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use scribeconf::ScribeConfig;
//!
//! let config = ScribeConfig::load().expect("Failed to load config");
//! println!("quantize division: {}", config.transcribe.quantize.division);
//! println!("log level: {}", config.telemetry.log_level);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/scribe/config.toml` (system)
//! 2. `~/.config/scribe/config.toml` (user)
//! 3. `./scribe.toml` (local override) or an explicit path
//! 4. Environment variables (`SCRIBE_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [telemetry]
//! log_level = "debug"
//!
//! [transcribe]
//! trim_overlaps = true
//! octave_anchor = "first-bar"
//!
//! [transcribe.quantize]
//! division = 8
//! tolerance_ms = 20.0
//!
//! [transcribe.grouping]
//! cluster_window = 0.04
//!
//! [output]
//! reduction = "medium"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{OutputConfig, TelemetryConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use transcribe::{OctaveAnchor, TranscribeOptions};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete scribe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScribeConfig {
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Engine defaults; an input document's own options still win.
    #[serde(default)]
    pub transcribe: TranscribeOptions,

    #[serde(default)]
    pub output: OutputConfig,
}

impl ScribeConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/scribe/config.toml`
    /// 3. `~/.config/scribe/config.toml`
    /// 4. `./scribe.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` replacing the local `./scribe.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = ScribeConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);
        config.transcribe = config.transcribe.normalized();

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so sections come out in a stable, readable order
        let mut output = String::new();
        let options = &self.transcribe;

        output.push_str("# Scribe Configuration\n\n");

        output.push_str("[telemetry]\n");
        output.push_str(&format!("log_level = \"{}\"\n", self.telemetry.log_level));

        output.push_str("\n[transcribe]\n");
        output.push_str(&format!("trim_overlaps = {}\n", options.trim_overlaps));
        output.push_str(&format!("force_note_mode = {}\n", options.force_note_mode));
        output.push_str(&format!(
            "octave_anchor = \"{}\"\n",
            match options.octave_anchor {
                OctaveAnchor::Fixed => "fixed",
                OctaveAnchor::FirstBar => "first-bar",
            }
        ));

        output.push_str("\n[transcribe.quantize]\n");
        output.push_str(&format!("division = {}\n", options.quantize.division));
        output.push_str(&format!("tolerance_ms = {:?}\n", options.quantize.tolerance_ms));

        output.push_str("\n[transcribe.grouping]\n");
        output.push_str(&format!(
            "cluster_window = {:?}\n",
            options.grouping.cluster_window
        ));
        output.push_str(&format!(
            "arpeggio_window = {:?}\n",
            options.grouping.arpeggio_window
        ));

        output.push_str("\n[output]\n");
        output.push_str(&format!("reduction = \"{}\"\n", self.output.reduction));
        output.push_str(&format!("pretty = {}\n", self.output.pretty));

        output
    }
}
