use crate::note::Note;
use crate::options::QuantizeOptions;
use crate::types::{Section, Timing};

pub const DEFAULT_BPM: f64 = 120.0;

/// Shortest note (seconds) that survives quantization.
pub const MIN_NOTE_SEC: f64 = 0.05;

/// Round to nearest, halves toward positive infinity.
pub(crate) fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Tempo with zero, negative or non-finite values replaced by 120 BPM.
pub fn effective_bpm(bpm: f64) -> f64 {
    if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        DEFAULT_BPM
    }
}

pub fn build_timing(bpm: f64) -> Timing {
    let bpm = effective_bpm(bpm);
    Timing {
        bpm,
        seconds_per_beat: 60.0 / bpm,
    }
}

/// Snap a time to the tempo grid.
///
/// Grid spacing is `(60 / bpm) / (division / 4)`. A time already within
/// `tolerance_ms` of a grid line is returned unchanged, which keeps the
/// micro-timing of tight performances and makes the operation idempotent.
pub fn quantize_time(time_sec: f64, bpm: f64, options: &QuantizeOptions) -> f64 {
    let seconds_per_beat = 60.0 / effective_bpm(bpm);
    let division = options.division.max(1) as f64;
    let grid = seconds_per_beat / (division / 4.0);
    let snapped = round_half_up(time_sec / grid) * grid;
    let diff_ms = (snapped - time_sec).abs() * 1000.0;
    // Slack absorbs float error when re-snapping an already snapped time.
    if diff_ms <= options.tolerance_ms + 1e-9 {
        time_sec
    } else {
        snapped
    }
}

/// Quantize every note and return them stable-sorted by onset.
///
/// Offsets are floored to `onset + 0.05 s` so no note collapses to zero length.
pub fn quantize_notes(notes: &[Note], bpm: f64, options: &QuantizeOptions) -> Vec<Note> {
    let mut quantized: Vec<Note> = notes
        .iter()
        .map(|note| {
            let onset_sec = quantize_time(note.onset_sec, bpm, options);
            let offset_sec =
                quantize_time(note.offset_sec, bpm, options).max(onset_sec + MIN_NOTE_SEC);
            Note {
                onset_sec,
                offset_sec,
                ..note.clone()
            }
        })
        .collect();
    quantized.sort_by(|a, b| a.onset_sec.total_cmp(&b.onset_sec));
    quantized
}

/// Clip any note that is still sounding when the next note starts.
///
/// Expects onset-sorted input. Simultaneous onsets clip to zero length;
/// the event builder's sustain floor keeps those events audible.
pub fn trim_overlaps(notes: &[Note]) -> Vec<Note> {
    let mut trimmed = notes.to_vec();
    trimmed.sort_by(|a, b| a.onset_sec.total_cmp(&b.onset_sec));
    for i in 1..trimmed.len() {
        let next_onset = trimmed[i].onset_sec;
        let current = &mut trimmed[i - 1];
        if next_onset < current.offset_sec {
            current.offset_sec = current.onset_sec.max(next_onset);
        }
    }
    trimmed
}

/// A single section named "song" covering the whole transcription.
pub fn build_sections(total_sec: f64, timing: &Timing, beats_per_bar: u8) -> Vec<Section> {
    let total_beats = total_sec / timing.seconds_per_beat;
    let beats_per_bar = beats_per_bar.max(1) as f64;
    let bars = (total_beats / beats_per_bar).ceil().max(1.0) as u32;
    vec![Section {
        name: "song".into(),
        start_beat: 0.0,
        end_beat: total_beats,
        bars,
    }]
}
