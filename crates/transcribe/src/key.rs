use tracing::warn;

use crate::note::Note;
use crate::quantize::MIN_NOTE_SEC;
use crate::types::{Key, KeyMode, KeySignature};

/// Krumhansl-Kessler major key profile (duration-weighted perception studies).
const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];

/// Krumhansl-Kessler minor key profile.
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Candidate order for the histogram search: tonic ascending, major before minor.
const MODE_ORDER: [(KeyMode, &[f64; 12]); 2] = [
    (KeyMode::Major, &MAJOR_PROFILE),
    (KeyMode::Minor, &MINOR_PROFILE),
];

/// Determine the tonal center for a run.
///
/// A non-blank key-signature label wins outright. Otherwise the key comes
/// from a duration-weighted pitch-class histogram.
pub fn detect_key(notes: &[Note], key_signature: Option<&KeySignature>) -> Key {
    if let Some(signature) = key_signature {
        if !signature.label.trim().is_empty() {
            return Key::new(pitch_class_from_label(&signature.label), signature.mode);
        }
    }
    detect_key_from_histogram(&pitch_class_histogram(notes))
}

/// Pitch-class histogram weighted by duration, each note counting at least 0.05 s.
pub fn pitch_class_histogram(notes: &[Note]) -> [f64; 12] {
    let mut histogram = [0.0_f64; 12];
    for note in notes {
        let duration = (note.offset_sec - note.onset_sec).max(MIN_NOTE_SEC);
        histogram[note.pitch_class() as usize] += duration;
    }
    histogram
}

/// Pick the best of the 24 keys against the reference profiles.
///
/// Only a strictly greater score replaces the current best, so on ties
/// the earliest candidate in `MODE_ORDER` x ascending tonic wins. An empty
/// histogram therefore yields C major.
pub fn detect_key_from_histogram(histogram: &[f64; 12]) -> Key {
    let mut best = Key::C_MAJOR;
    let mut best_score = f64::NEG_INFINITY;

    for tonic in 0..12u8 {
        for (mode, profile) in MODE_ORDER {
            let score = profile_score(histogram, profile, tonic);
            if score > best_score {
                best_score = score;
                best = Key::new(tonic, mode);
            }
        }
    }

    best
}

/// Profile-weighted sum of the histogram rotated so `tonic` sits at index 0.
fn profile_score(histogram: &[f64; 12], profile: &[f64; 12], tonic: u8) -> f64 {
    profile
        .iter()
        .enumerate()
        .map(|(i, weight)| weight * histogram[(i + tonic as usize) % 12])
        .sum()
}

/// Parse the tonic pitch class from a note-name label ("F#", "Bb", "e minor").
///
/// Whitespace is ignored; anything unparseable resolves to C.
pub fn pitch_class_from_label(label: &str) -> u8 {
    let normalized: String = label.chars().filter(|c| !c.is_whitespace()).collect();
    let mut chars = normalized.chars();

    let base: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => {
            warn!(label, "unparseable key signature label, assuming C");
            return 0;
        }
    };

    let accidental = match chars.next() {
        Some('#') => 1,
        Some('b') => -1,
        _ => 0,
    };

    (base + accidental).rem_euclid(12) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_notes(pitches: &[u8]) -> Vec<Note> {
        pitches
            .iter()
            .enumerate()
            .map(|(i, &p)| Note::new(p, i as f64, i as f64 + 1.0))
            .collect()
    }

    #[test]
    fn empty_notes_returns_c_major() {
        assert_eq!(detect_key(&[], None), Key::C_MAJOR);
    }

    #[test]
    fn c_major_arpeggio_detected() {
        let notes = scale_notes(&[60, 64, 67]);
        assert_eq!(detect_key(&notes, None), Key::new(0, KeyMode::Major));
    }

    #[test]
    fn c_major_scale_with_held_tonic_detected() {
        let mut notes = scale_notes(&[62, 64, 65, 67, 69, 71]);
        notes.push(Note::new(60, 6.0, 10.0));
        assert_eq!(detect_key(&notes, None), Key::new(0, KeyMode::Major));
    }

    #[test]
    fn bare_white_key_scale_leans_relative_minor() {
        // Equal weights favour A minor over C major under these profiles.
        let notes = scale_notes(&[60, 62, 64, 65, 67, 69, 71]);
        assert_eq!(detect_key(&notes, None), Key::new(9, KeyMode::Minor));
    }

    #[test]
    fn a_minor_triad_detected() {
        // A C E held with A weighted heaviest
        let notes = vec![
            Note::new(57, 0.0, 4.0),
            Note::new(60, 0.0, 1.0),
            Note::new(64, 0.0, 2.0),
        ];
        assert_eq!(detect_key(&notes, None), Key::new(9, KeyMode::Minor));
    }

    #[test]
    fn key_signature_bypasses_histogram() {
        let notes = scale_notes(&[60, 64, 67]);
        let signature = KeySignature {
            label: "D".into(),
            mode: KeyMode::Minor,
        };
        assert_eq!(detect_key(&notes, Some(&signature)), Key::new(2, KeyMode::Minor));
    }

    #[test]
    fn blank_key_signature_falls_back_to_histogram() {
        let notes = scale_notes(&[67, 71, 74]);
        let signature = KeySignature {
            label: "  ".into(),
            mode: KeyMode::Minor,
        };
        assert_eq!(detect_key(&notes, Some(&signature)), Key::new(7, KeyMode::Major));
    }

    #[test]
    fn label_parsing_handles_accidentals() {
        assert_eq!(pitch_class_from_label("C"), 0);
        assert_eq!(pitch_class_from_label("F#"), 6);
        assert_eq!(pitch_class_from_label("Bb"), 10);
        assert_eq!(pitch_class_from_label("Cb"), 11);
        assert_eq!(pitch_class_from_label(" e b "), 3);
        assert_eq!(pitch_class_from_label("d"), 2);
        assert_eq!(pitch_class_from_label("H"), 0);
        assert_eq!(pitch_class_from_label(""), 0);
    }

    #[test]
    fn tie_keeps_first_candidate() {
        // Pinned behavior: a flat histogram scores every major key identically
        // and every minor key identically; the first candidate (C major) must
        // win only if it is not beaten strictly.
        let flat = [1.0; 12];
        let major_total: f64 = MAJOR_PROFILE.iter().sum();
        let minor_total: f64 = MINOR_PROFILE.iter().sum();
        let expected_mode = if minor_total > major_total {
            KeyMode::Minor
        } else {
            KeyMode::Major
        };
        assert_eq!(detect_key_from_histogram(&flat), Key::new(0, expected_mode));
    }

    #[test]
    fn tie_between_tonics_keeps_lowest() {
        // Symmetric histogram: C and F# weighted equally. Rotations by 6
        // give identical scores, so the lower tonic must be reported.
        let mut histogram = [0.0; 12];
        histogram[0] = 1.0;
        histogram[6] = 1.0;
        let key = detect_key_from_histogram(&histogram);
        assert!(key.tonic_pitch_class < 6, "got {:?}", key);
    }
}
