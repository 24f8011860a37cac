//! Note-stream transcription.
//!
//! Turns decoded, timed notes into controller events: each moment becomes a
//! single note, a chord, or a drum hit, tagged with the button and modifiers
//! that play it and with how far the mapping had to approximate. The whole
//! run is a pure, deterministic batch transform.

pub mod chord_templates;
pub mod cluster;
pub mod difficulty;
pub mod events;
pub mod fingering;
pub mod key;
pub mod note;
pub mod options;
pub mod quantize;
pub mod reduce;
pub mod scale;
pub mod types;

pub use chord_templates::{analyze_chord, ChordAnalysis, ChordMatch, ChordQuality};
pub use cluster::{group_notes, Cluster};
pub use difficulty::estimate_difficulty;
pub use events::EventBuilder;
pub use fingering::{select_chord_input, ChordFingering};
pub use key::{detect_key, pitch_class_from_label};
pub use note::Note;
pub use options::{GroupingOptions, OctaveAnchor, QuantizeOptions, TranscribeOptions};
pub use reduce::{apply_reduction, ReductionPreset};
pub use scale::{map_pitch_to_degree, resolve_octave, DegreeMapping, OctaveResolution};
pub use types::{
    ApproxCounts, ApproxLevel, Button, Difficulty, DrumLane, Event, EventKind, InputMode, Key,
    KeyMode, KeySignature, Modifiers, RequiredInput, Section, TimeSignature, Timing,
    TranscriptionResult, TranscriptionStats,
};

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("note {index} is invalid: {reason}")]
    InvalidNote { index: usize, reason: String },

    #[error("tempo must be finite and non-negative, got {0}")]
    InvalidTempo(f64),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One stem's worth of decoded notes plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionInput {
    pub notes: Vec<Note>,
    /// Zero means unknown and is treated as 120.
    #[serde(default)]
    pub bpm: f64,
    #[serde(default)]
    pub key_signature: Option<KeySignature>,
    #[serde(default)]
    pub time_signature: Option<TimeSignature>,
    #[serde(default)]
    pub is_drum_stem: bool,
    /// `null` reads as all defaults.
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: TranscribeOptions,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TranscriptionInput {
    pub fn new(notes: Vec<Note>, bpm: f64) -> Self {
        Self {
            notes,
            bpm,
            key_signature: None,
            time_signature: None,
            is_drum_stem: false,
            options: TranscribeOptions::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm < 0.0 {
            return Err(Error::InvalidTempo(self.bpm));
        }
        for (index, note) in self.notes.iter().enumerate() {
            note.validate()
                .map_err(|reason| Error::InvalidNote { index, reason })?;
        }
        Ok(())
    }
}

/// Transcribe one stem.
///
/// Fails only on structurally invalid input. Musical ambiguity never
/// errors; it shows up as approximation levels on the events instead.
pub fn transcribe(input: &TranscriptionInput) -> Result<TranscriptionResult> {
    input.validate()?;
    let options = input.options.normalized();

    let key = detect_key(&input.notes, input.key_signature.as_ref());
    let timing = quantize::build_timing(input.bpm);
    let beats_per_bar = input.time_signature.unwrap_or_default().beats;

    let quantized = quantize::quantize_notes(&input.notes, timing.bpm, &options.quantize);
    let notes = if options.trim_overlaps {
        quantize::trim_overlaps(&quantized)
    } else {
        quantized
    };

    let recommended_octave_offset = scale::initial_octave_offset(&notes, &key, &timing, beats_per_bar);
    let anchor_offset = match options.octave_anchor {
        OctaveAnchor::Fixed => 0,
        OctaveAnchor::FirstBar => recommended_octave_offset,
    };

    let clusters = group_notes(&notes, &options.grouping);
    let mut builder = EventBuilder::new(key, timing, anchor_offset);
    for cluster in &clusters {
        if input.is_drum_stem {
            builder.push_drums(cluster);
        } else {
            builder.push_cluster(cluster, options.force_note_mode);
        }
    }
    let (events, approx_counts) = builder.finish();

    let chord_events = events.iter().filter(|e| e.kind == EventKind::Chord).count();
    let note_events = events.len() - chord_events;
    let difficulty = estimate_difficulty(timing.bpm, &events, chord_events);
    let total_sec = events.last().map(|e| e.time_sec).unwrap_or(0.0);
    let sections = quantize::build_sections(total_sec, &timing, beats_per_bar);

    info!(
        key = %key,
        bpm = timing.bpm,
        notes = input.notes.len(),
        events = events.len(),
        chords = chord_events,
        drums = input.is_drum_stem,
        rating = difficulty.rating,
        "transcribed stem"
    );

    Ok(TranscriptionResult {
        events,
        key,
        timing,
        recommended_octave_offset,
        stats: TranscriptionStats {
            total: chord_events + note_events,
            chord_events,
            note_events,
            approx_counts,
            difficulty,
        },
        sections,
    })
}
