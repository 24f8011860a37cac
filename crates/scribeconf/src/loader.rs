//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, ScribeConfig};
use std::env;
use std::path::{Path, PathBuf};
use transcribe::{OctaveAnchor, ReductionPreset};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided it replaces the local override. A missing
/// CLI path is still returned so loading it reports the error.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/scribe/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("scribe/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("scribe.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a TOML file and overlay the keys it sets onto `config`.
pub fn apply_file(config: &mut ScribeConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)
}

fn parse_error(path: &Path, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Typed lookups over one TOML table. Absent keys are `None`; present keys
/// of the wrong type are errors.
struct Section<'a> {
    table: Option<&'a toml::Table>,
    /// Dotted path from the document root; empty for the root itself.
    name: String,
    path: &'a Path,
}

impl<'a> Section<'a> {
    fn root(table: &'a toml::Table, path: &'a Path) -> Self {
        Self {
            table: Some(table),
            name: String::new(),
            path,
        }
    }

    fn key_path(&self, key: &str) -> String {
        if self.name.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.name, key)
        }
    }

    fn child(&self, key: &str) -> Result<Section<'a>, ConfigError> {
        let name = self.key_path(key);
        let table = match self.table.and_then(|t| t.get(key)) {
            None => None,
            Some(value) => Some(
                value
                    .as_table()
                    .ok_or_else(|| parse_error(self.path, format!("[{}] must be a table", name)))?,
            ),
        };
        Ok(Section {
            table,
            name,
            path: self.path,
        })
    }

    fn value(&self, key: &str) -> Option<&'a toml::Value> {
        self.table.and_then(|t| t.get(key))
    }

    fn wrong_type(&self, key: &str, expected: &str) -> ConfigError {
        parse_error(self.path, format!("{} must be {}", self.key_path(key), expected))
    }

    fn str(&self, key: &str) -> Result<Option<&'a str>, ConfigError> {
        self.value(key)
            .map(|v| v.as_str().ok_or_else(|| self.wrong_type(key, "a string")))
            .transpose()
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.value(key)
            .map(|v| v.as_bool().ok_or_else(|| self.wrong_type(key, "a boolean")))
            .transpose()
    }

    fn float(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        self.value(key)
            .map(|v| match v {
                toml::Value::Float(f) => Ok(*f),
                toml::Value::Integer(i) => Ok(*i as f64),
                _ => Err(self.wrong_type(key, "a number")),
            })
            .transpose()
    }

    fn u32(&self, key: &str) -> Result<Option<u32>, ConfigError> {
        self.value(key)
            .map(|v| {
                v.as_integer()
                    .and_then(|i| u32::try_from(i).ok())
                    .ok_or_else(|| self.wrong_type(key, "a non-negative integer"))
            })
            .transpose()
    }
}

/// Overlay the keys present in a TOML document onto `config`.
fn apply_toml(config: &mut ScribeConfig, contents: &str, path: &Path) -> Result<(), ConfigError> {
    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_error(path, e.to_string()))?;
    let root = Section::root(&table, path);

    let telemetry = root.child("telemetry")?;
    if let Some(v) = telemetry.str("log_level")? {
        config.telemetry.log_level = v.to_string();
    }

    let engine = root.child("transcribe")?;
    let options = &mut config.transcribe;
    if let Some(v) = engine.bool("trim_overlaps")? {
        options.trim_overlaps = v;
    }
    if let Some(v) = engine.bool("force_note_mode")? {
        options.force_note_mode = v;
    }
    if let Some(v) = engine.str("octave_anchor")? {
        options.octave_anchor = parse_octave_anchor(v)
            .ok_or_else(|| engine.wrong_type("octave_anchor", "\"fixed\" or \"first-bar\""))?;
    }

    let quantize = engine.child("quantize")?;
    if let Some(v) = quantize.u32("division")? {
        options.quantize.division = v;
    }
    if let Some(v) = quantize.float("tolerance_ms")? {
        options.quantize.tolerance_ms = v;
    }

    let grouping = engine.child("grouping")?;
    if let Some(v) = grouping.float("cluster_window")? {
        options.grouping.cluster_window = v;
    }
    if let Some(v) = grouping.float("arpeggio_window")? {
        options.grouping.arpeggio_window = v;
    }

    let output = root.child("output")?;
    if let Some(v) = output.str("reduction")? {
        config.output.reduction = v
            .parse::<ReductionPreset>()
            .map_err(|message| parse_error(path, message))?;
    }
    if let Some(v) = output.bool("pretty")? {
        config.output.pretty = v;
    }

    Ok(())
}

fn parse_octave_anchor(value: &str) -> Option<OctaveAnchor> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fixed" => Some(OctaveAnchor::Fixed),
        "first-bar" | "first_bar" => Some(OctaveAnchor::FirstBar),
        _ => None,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut ScribeConfig, sources: &mut ConfigSources) {
    apply_env_overrides_with(config, sources, |name| env::var(name).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Values that fail to parse are skipped and not recorded as sources.
pub fn apply_env_overrides_with<F>(config: &mut ScribeConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut record = |name: &str| sources.env_overrides.push(name.to_string());

    if let Some(v) = lookup("SCRIBE_LOG_LEVEL") {
        config.telemetry.log_level = v;
        record("SCRIBE_LOG_LEVEL");
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        record("RUST_LOG");
    }

    let options = &mut config.transcribe;
    if let Some(v) = lookup("SCRIBE_QUANTIZE_DIVISION").and_then(|v| v.trim().parse().ok()) {
        options.quantize.division = v;
        record("SCRIBE_QUANTIZE_DIVISION");
    }
    if let Some(v) = lookup("SCRIBE_QUANTIZE_TOLERANCE_MS").and_then(|v| v.trim().parse().ok()) {
        options.quantize.tolerance_ms = v;
        record("SCRIBE_QUANTIZE_TOLERANCE_MS");
    }
    if let Some(v) = lookup("SCRIBE_CLUSTER_WINDOW").and_then(|v| v.trim().parse().ok()) {
        options.grouping.cluster_window = v;
        record("SCRIBE_CLUSTER_WINDOW");
    }
    if let Some(v) = lookup("SCRIBE_ARPEGGIO_WINDOW").and_then(|v| v.trim().parse().ok()) {
        options.grouping.arpeggio_window = v;
        record("SCRIBE_ARPEGGIO_WINDOW");
    }
    if let Some(v) = lookup("SCRIBE_TRIM_OVERLAPS").and_then(|v| parse_flag(&v)) {
        options.trim_overlaps = v;
        record("SCRIBE_TRIM_OVERLAPS");
    }
    if let Some(v) = lookup("SCRIBE_FORCE_NOTE_MODE").and_then(|v| parse_flag(&v)) {
        options.force_note_mode = v;
        record("SCRIBE_FORCE_NOTE_MODE");
    }
    if let Some(v) = lookup("SCRIBE_REDUCTION").and_then(|v| v.parse().ok()) {
        config.output.reduction = v;
        record("SCRIBE_REDUCTION");
    }
}
