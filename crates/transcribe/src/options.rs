//! Transcription options.
//!
//! Every recognized knob lives here with its default. Partial documents
//! deserialize cleanly; `normalized()` repairs out-of-range values once at
//! the entry point so the pipeline never re-checks them.

use serde::{Deserialize, Serialize};

/// Grid snapping for note onsets and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizeOptions {
    /// Notes per whole note: 16 = sixteenth-note grid.
    /// Default: 16
    #[serde(default = "QuantizeOptions::default_division")]
    pub division: u32,

    /// Times already within this many milliseconds of the grid are kept verbatim.
    /// Default: 15
    #[serde(default = "QuantizeOptions::default_tolerance_ms")]
    pub tolerance_ms: f64,
}

impl QuantizeOptions {
    fn default_division() -> u32 {
        16
    }

    fn default_tolerance_ms() -> f64 {
        15.0
    }
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            division: Self::default_division(),
            tolerance_ms: Self::default_tolerance_ms(),
        }
    }
}

/// Windows used to split the note list into chords, arpeggios and single notes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupingOptions {
    /// Seconds from the anchor onset within which notes count as simultaneous.
    /// Default: 0.03
    #[serde(default = "GroupingOptions::default_cluster_window")]
    pub cluster_window: f64,

    /// Seconds from the anchor onset scanned for a fast run.
    /// Default: 0.2
    #[serde(default = "GroupingOptions::default_arpeggio_window")]
    pub arpeggio_window: f64,
}

impl GroupingOptions {
    fn default_cluster_window() -> f64 {
        0.03
    }

    fn default_arpeggio_window() -> f64 {
        0.2
    }
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            cluster_window: Self::default_cluster_window(),
            arpeggio_window: Self::default_arpeggio_window(),
        }
    }
}

/// Reference octave for the octave-up decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OctaveAnchor {
    /// Always octave 4 (MIDI 48 + tonic + step).
    #[default]
    Fixed,
    /// Octave 4 shifted by the recommended offset measured over the first bar.
    FirstBar,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscribeOptions {
    #[serde(default)]
    pub quantize: QuantizeOptions,

    /// Clip each note at the next note's onset before grouping.
    #[serde(default)]
    pub trim_overlaps: bool,

    #[serde(default)]
    pub grouping: GroupingOptions,

    /// Emit every note as its own NOTE event, never a CHORD.
    #[serde(default)]
    pub force_note_mode: bool,

    #[serde(default)]
    pub octave_anchor: OctaveAnchor,
}

impl TranscribeOptions {
    /// Replace unusable values with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.quantize.division == 0 {
            self.quantize.division = QuantizeOptions::default_division();
        }
        if !self.quantize.tolerance_ms.is_finite() || self.quantize.tolerance_ms < 0.0 {
            self.quantize.tolerance_ms = QuantizeOptions::default_tolerance_ms();
        }
        if !self.grouping.cluster_window.is_finite() || self.grouping.cluster_window < 0.0 {
            self.grouping.cluster_window = GroupingOptions::default_cluster_window();
        }
        if !self.grouping.arpeggio_window.is_finite() || self.grouping.arpeggio_window < 0.0 {
            self.grouping.arpeggio_window = GroupingOptions::default_arpeggio_window();
        }
        self
    }
}
