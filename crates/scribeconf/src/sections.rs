//! Non-engine configuration sections.

use serde::{Deserialize, Serialize};
use transcribe::ReductionPreset;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive (trace, debug, info, warn, error, or per-target).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    pub(crate) fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

/// How results are post-processed and written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Simplification applied after transcription.
    /// Default: off
    #[serde(default)]
    pub reduction: ReductionPreset,

    /// Pretty-print JSON output.
    /// Default: true
    #[serde(default = "OutputConfig::default_pretty")]
    pub pretty: bool,
}

impl OutputConfig {
    pub(crate) fn default_pretty() -> bool {
        true
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reduction: ReductionPreset::default(),
            pretty: Self::default_pretty(),
        }
    }
}
