//! Post-transcription simplification presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chord_templates::ChordQuality;
use crate::quantize::round_half_up;
use crate::types::{Event, Modifiers, RequiredInput};

/// Beat grid used by the snapping presets (eighth notes in 4/4).
pub const REDUCTION_GRID_BEATS: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReductionPreset {
    #[default]
    Off,
    /// Strip modifiers.
    Hard,
    /// Snap to eighths and strip modifiers.
    Medium,
    /// Snap, strip, and collapse octave-up.
    Easy,
}

impl ReductionPreset {
    pub const ALL: [ReductionPreset; 4] = [
        ReductionPreset::Off,
        ReductionPreset::Hard,
        ReductionPreset::Medium,
        ReductionPreset::Easy,
    ];

    fn grid(self) -> Option<f64> {
        match self {
            ReductionPreset::Easy | ReductionPreset::Medium => Some(REDUCTION_GRID_BEATS),
            _ => None,
        }
    }

    fn strips_modifiers(self) -> bool {
        self != ReductionPreset::Off
    }

    fn collapses_octave(self) -> bool {
        self == ReductionPreset::Easy
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReductionPreset::Off => "off",
            ReductionPreset::Hard => "hard",
            ReductionPreset::Medium => "medium",
            ReductionPreset::Easy => "easy",
        }
    }
}

impl fmt::Display for ReductionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == wanted)
            .ok_or_else(|| format!("unknown reduction preset '{}' (expected off, hard, medium or easy)", s))
    }
}

/// Simplify events in place according to `preset`, keeping them time-ordered.
///
/// Snapped events get `time_sec` recomputed from the new beat. Stripped
/// chords fall back to the chord type their button plays bare.
pub fn apply_reduction(events: &mut [Event], preset: ReductionPreset, seconds_per_beat: f64) {
    if preset == ReductionPreset::Off {
        return;
    }

    for event in events.iter_mut() {
        if let Some(grid) = preset.grid() {
            let snapped = round_half_up(event.time_beat / grid) * grid;
            if snapped != event.time_beat {
                event.time_beat = snapped;
                event.time_sec = snapped * seconds_per_beat;
            }
        }

        match &mut event.required_input {
            RequiredInput::Note {
                modifiers,
                octave_up,
                ..
            } => {
                if preset.strips_modifiers() {
                    *modifiers = Modifiers::NONE;
                }
                if preset.collapses_octave() {
                    *octave_up = false;
                }
            }
            RequiredInput::Chord {
                button,
                modifiers,
                chord_type,
                ..
            } => {
                if preset.strips_modifiers() {
                    *modifiers = Modifiers::NONE;
                    *chord_type = ChordQuality::for_bare_button(*button);
                }
            }
            RequiredInput::Drum { .. } => {}
        }
    }

    events.sort_by(|a, b| a.time_sec.total_cmp(&b.time_sec));
}
