use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::chord_templates::ChordQuality;

const PITCH_CLASS_LABELS: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    #[default]
    Major,
    Minor,
}

impl KeyMode {
    /// Case-insensitive mode name. Anything other than minor is major.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case("minor") {
            KeyMode::Minor
        } else {
            if !label.is_empty() && !label.eq_ignore_ascii_case("major") {
                warn!(mode = label, "unknown key mode, using major");
            }
            KeyMode::Major
        }
    }
}

impl<'de> Deserialize<'de> for KeyMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(KeyMode::from_label).unwrap_or_default())
    }
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

/// Tonal center of a transcription run. Computed once, then shared read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    /// Pitch class 0–11 (C=0, C#=1, ...)
    pub tonic_pitch_class: u8,
    pub mode: KeyMode,
}

impl Key {
    pub const C_MAJOR: Key = Key {
        tonic_pitch_class: 0,
        mode: KeyMode::Major,
    };

    pub fn new(tonic_pitch_class: u8, mode: KeyMode) -> Self {
        Self {
            tonic_pitch_class: tonic_pitch_class % 12,
            mode,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = PITCH_CLASS_LABELS[(self.tonic_pitch_class % 12) as usize];
        match self.mode {
            KeyMode::Major => write!(f, "{} Major", label),
            KeyMode::Minor => write!(f, "{} Minor", label),
        }
    }
}

/// Key-signature metadata supplied by the note source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySignature {
    /// Note-name label such as "D", "F#", "Bb".
    pub label: String,
    #[serde(default)]
    pub mode: KeyMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar; sets bar length for sections and the opening-bar window.
    pub beats: u8,
    /// Note value of one beat. Carried through for callers; bar math only uses `beats`.
    pub unit: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self { beats: 4, unit: 4 }
    }
}

/// How a musical fact was bent to fit the discrete input scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApproxLevel {
    Exact,
    DiatonicSnap,
    ChromaticShift,
    OctaveFolded,
    Simplified,
    PowerChordFallback,
    RootFallback,
}

impl ApproxLevel {
    pub const ALL: [ApproxLevel; 7] = [
        ApproxLevel::Exact,
        ApproxLevel::DiatonicSnap,
        ApproxLevel::ChromaticShift,
        ApproxLevel::OctaveFolded,
        ApproxLevel::Simplified,
        ApproxLevel::PowerChordFallback,
        ApproxLevel::RootFallback,
    ];

    pub fn is_exact(self) -> bool {
        self == ApproxLevel::Exact
    }
}

/// Per-level event tally. Every level is always present, zero or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApproxCounts(BTreeMap<ApproxLevel, usize>);

impl ApproxCounts {
    pub fn new() -> Self {
        Self(ApproxLevel::ALL.iter().map(|&level| (level, 0)).collect())
    }

    pub fn record(&mut self, level: ApproxLevel) {
        *self.0.entry(level).or_insert(0) += 1;
    }

    pub fn get(&self, level: ApproxLevel) -> usize {
        self.0.get(&level).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ApproxLevel, usize)> + '_ {
        self.0.iter().map(|(&level, &count)| (level, count))
    }
}

impl Default for ApproxCounts {
    fn default() -> Self {
        Self::new()
    }
}

/// Face buttons, listed in lane order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    X,
    Y,
    A,
    B,
}

impl Button {
    pub const LANES: [Button; 4] = [Button::X, Button::Y, Button::A, Button::B];

    pub fn lane(self) -> u8 {
        match self {
            Button::X => 0,
            Button::Y => 1,
            Button::A => 2,
            Button::B => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Left bumper: passing-tone degree for notes, alternate chord bank for chords.
    pub lb: bool,
    /// D-pad left: flat for notes, altered chord bank for chords.
    pub dleft: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        lb: false,
        dleft: false,
    };
    pub const LB: Modifiers = Modifiers {
        lb: true,
        dleft: false,
    };
    pub const DLEFT: Modifiers = Modifiers {
        lb: false,
        dleft: true,
    };
}

/// Drum lanes, by General MIDI pitch range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumLane {
    Kick,
    Snare,
    Hats,
    Cymbals,
}

impl DrumLane {
    pub fn from_pitch(pitch: u8) -> Self {
        match pitch {
            0..=36 => DrumLane::Kick,
            37..=40 => DrumLane::Snare,
            41..=46 => DrumLane::Hats,
            _ => DrumLane::Cymbals,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// The exact discrete input a player needs to reproduce an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RequiredInput {
    Note {
        degree: u8,
        button: Button,
        modifiers: Modifiers,
        octave_up: bool,
    },
    Chord {
        degree: u8,
        button: Button,
        modifiers: Modifiers,
        chord_type: ChordQuality,
    },
    Drum {
        lane: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Note,
    Chord,
    Drum,
}

impl EventKind {
    pub fn recommended_mode(self) -> InputMode {
        match self {
            EventKind::Note => InputMode::Note,
            EventKind::Chord => InputMode::Chord,
            EventKind::Drum => InputMode::Drum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Note,
    Chord,
    Drum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub time_beat: f64,
    pub time_sec: f64,
    pub lane: u8,
    pub kind: EventKind,
    pub required_input: RequiredInput,
    /// Always > 0; a 0.05 s floor is applied before conversion to beats.
    pub sustain_beats: f64,
    pub original_pitches: Vec<u8>,
    pub approx_level: ApproxLevel,
    pub recommended_mode: InputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub bpm: f64,
    pub seconds_per_beat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub start_beat: f64,
    pub end_beat: f64,
    pub bars: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty {
    /// 1–5
    pub rating: u8,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionStats {
    pub total: usize,
    pub chord_events: usize,
    pub note_events: usize,
    pub approx_counts: ApproxCounts,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub events: Vec<Event>,
    pub key: Key,
    pub timing: Timing,
    /// Median octave of the opening bar relative to octave 4, clamped to ±2.
    pub recommended_octave_offset: i8,
    pub stats: TranscriptionStats,
    pub sections: Vec<Section>,
}
