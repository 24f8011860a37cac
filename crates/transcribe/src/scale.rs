//! Scale-degree mapping and octave resolution relative to a detected key.

use crate::note::Note;
use crate::quantize::round_half_up;
use crate::types::{ApproxLevel, Button, Key, KeyMode, Modifiers, Timing};

const MAJOR_STEPS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_STEPS: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

/// MIDI pitch of the tonic at octave 4 with tonic C (12 * 4).
const OCTAVE_4_BASE: i32 = 48;

/// Degree buttons: (button, degree played bare, degree played with LB).
const NOTE_INPUTS: [(Button, u8, u8); 4] = [
    (Button::A, 1, 2),
    (Button::X, 3, 4),
    (Button::Y, 5, 6),
    (Button::B, 8, 7),
];

impl KeyMode {
    pub fn steps(self) -> &'static [u8; 7] {
        match self {
            KeyMode::Major => &MAJOR_STEPS,
            KeyMode::Minor => &MINOR_STEPS,
        }
    }
}

/// The seven scale pitch classes of `key`, in ascending degree order.
pub fn scale_pitch_classes(key: &Key) -> [u8; 7] {
    let steps = key.mode.steps();
    let mut pcs = [0u8; 7];
    for (pc, step) in pcs.iter_mut().zip(steps) {
        *pc = (key.tonic_pitch_class + step) % 12;
    }
    pcs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeMapping {
    /// 1-based scale degree
    pub degree: u8,
    pub chromatic: bool,
    /// Pitch sits one semitone above the matched tone (D-left modifier).
    pub flat: bool,
    pub approx_level: ApproxLevel,
}

/// Map a pitch class onto a 1-based degree of `key`.
///
/// Off-scale pitches take the nearest scale tone by circular semitone
/// distance. Degrees are scanned in ascending order and only a strictly
/// closer tone replaces the current match, so the lower degree wins ties.
pub fn map_pitch_to_degree(pitch_class: u8, key: &Key) -> DegreeMapping {
    let pitch_class = pitch_class % 12;
    let scale = scale_pitch_classes(key);

    if let Some(index) = scale.iter().position(|&pc| pc == pitch_class) {
        return DegreeMapping {
            degree: index as u8 + 1,
            chromatic: false,
            flat: false,
            approx_level: ApproxLevel::Exact,
        };
    }

    let mut best_degree = 1u8;
    let mut best_distance = u8::MAX;
    let mut best_flat = false;
    for (index, &pc) in scale.iter().enumerate() {
        let diff = (pitch_class + 12 - pc) % 12;
        let distance = diff.min(12 - diff);
        if distance < best_distance {
            best_distance = distance;
            best_degree = index as u8 + 1;
            best_flat = diff == 1;
        }
    }

    DegreeMapping {
        degree: best_degree,
        chromatic: true,
        flat: best_flat,
        approx_level: if best_flat {
            ApproxLevel::ChromaticShift
        } else {
            ApproxLevel::DiatonicSnap
        },
    }
}

/// Expected MIDI pitch of `degree` at the anchor octave.
fn expected_pitch(degree: u8, key: &Key, octave_offset: i8) -> i32 {
    let steps = key.mode.steps();
    let step = steps
        .get(degree.saturating_sub(1) as usize)
        .copied()
        .unwrap_or(steps[0]);
    OCTAVE_4_BASE + key.tonic_pitch_class as i32 + step as i32 + octave_offset as i32 * 12
}

fn octave_difference(pitch: u8, degree: u8, key: &Key, octave_offset: i8) -> i32 {
    let expected = expected_pitch(degree, key, octave_offset);
    round_half_up((pitch as i32 - expected) as f64 / 12.0) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctaveResolution {
    pub octave_up: bool,
    pub approx_level: ApproxLevel,
}

/// Fold a pitch into the ±1 octave range around its expected position.
pub fn resolve_octave(pitch: u8, degree: u8, key: &Key, octave_offset: i8) -> OctaveResolution {
    let diff = octave_difference(pitch, degree, key, octave_offset);
    let clamped = diff.clamp(-1, 1);
    OctaveResolution {
        octave_up: clamped > 0,
        approx_level: if clamped != diff {
            ApproxLevel::OctaveFolded
        } else {
            ApproxLevel::Exact
        },
    }
}

/// Button and LB modifier that play a scale degree.
///
/// Degrees past the octave wrap back onto 1–7.
pub fn note_input_for_degree(degree: u8) -> (Button, Modifiers) {
    let degree = if degree > 8 {
        (degree - 1) % 7 + 1
    } else {
        degree
    };
    let (button, _, passing) = NOTE_INPUTS
        .iter()
        .copied()
        .find(|&(_, base, passing)| base == degree || passing == degree)
        .unwrap_or(NOTE_INPUTS[0]);
    let modifiers = Modifiers {
        lb: passing == degree,
        dleft: false,
    };
    (button, modifiers)
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Typical octave of the opening bar relative to octave 4, clamped to ±2.
///
/// Looks at notes starting inside the first bar; if none do, the whole list.
pub fn initial_octave_offset(notes: &[Note], key: &Key, timing: &Timing, beats_per_bar: u8) -> i8 {
    if notes.is_empty() {
        return 0;
    }
    let window_end = timing.seconds_per_beat * beats_per_bar.max(1) as f64;
    let in_window: Vec<&Note> = notes.iter().filter(|n| n.onset_sec < window_end).collect();
    let sample: Vec<&Note> = if in_window.is_empty() {
        notes.iter().collect()
    } else {
        in_window
    };

    let mut diffs: Vec<f64> = sample
        .iter()
        .map(|note| {
            let mapping = map_pitch_to_degree(note.pitch_class(), key);
            octave_difference(note.pitch, mapping.degree, key, 0) as f64
        })
        .collect();

    round_half_up(median(&mut diffs)).clamp(-2.0, 2.0) as i8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::build_timing;
    use pretty_assertions::assert_eq;

    const C_MAJOR: Key = Key::C_MAJOR;

    #[test]
    fn scale_pitch_classes_follow_mode() {
        assert_eq!(scale_pitch_classes(&C_MAJOR), [0, 2, 4, 5, 7, 9, 11]);
        assert_eq!(
            scale_pitch_classes(&Key::new(9, KeyMode::Minor)),
            [9, 11, 0, 2, 4, 5, 7]
        );
        assert_eq!(
            scale_pitch_classes(&Key::new(7, KeyMode::Major)),
            [7, 9, 11, 0, 2, 4, 6]
        );
    }

    #[test]
    fn tonic_maps_exactly() {
        let mapping = map_pitch_to_degree(0, &C_MAJOR);
        assert_eq!(
            mapping,
            DegreeMapping {
                degree: 1,
                chromatic: false,
                flat: false,
                approx_level: ApproxLevel::Exact,
            }
        );
        assert_eq!(map_pitch_to_degree(11, &C_MAJOR).degree, 7);
    }

    #[test]
    fn sharp_takes_lower_neighbour_with_flat_modifier() {
        // C# is one semitone from both C and D; ascending scan keeps C.
        let mapping = map_pitch_to_degree(1, &C_MAJOR);
        assert_eq!(mapping.degree, 1);
        assert!(mapping.chromatic);
        assert!(mapping.flat);
        assert_eq!(mapping.approx_level, ApproxLevel::ChromaticShift);

        let f_sharp = map_pitch_to_degree(6, &C_MAJOR);
        assert_eq!(f_sharp.degree, 4);
        assert_eq!(f_sharp.approx_level, ApproxLevel::ChromaticShift);
    }

    #[test]
    fn wraparound_neighbour_snaps_diatonically() {
        // In C minor, B sits between Bb (degree 7) and C (degree 1); C is
        // scanned first and lies above, so no flat modifier applies.
        let mapping = map_pitch_to_degree(11, &Key::new(0, KeyMode::Minor));
        assert_eq!(mapping.degree, 1);
        assert!(!mapping.flat);
        assert_eq!(mapping.approx_level, ApproxLevel::DiatonicSnap);
    }

    #[test]
    fn octave_within_range_is_exact() {
        // C3 (48) is degree 1's home pitch
        let home = resolve_octave(48, 1, &C_MAJOR, 0);
        assert!(!home.octave_up);
        assert_eq!(home.approx_level, ApproxLevel::Exact);

        let up = resolve_octave(60, 1, &C_MAJOR, 0);
        assert!(up.octave_up);
        assert_eq!(up.approx_level, ApproxLevel::Exact);

        let down = resolve_octave(36, 1, &C_MAJOR, 0);
        assert!(!down.octave_up);
        assert_eq!(down.approx_level, ApproxLevel::Exact);
    }

    #[test]
    fn extreme_octaves_fold() {
        let high = resolve_octave(84, 1, &C_MAJOR, 0);
        assert!(high.octave_up);
        assert_eq!(high.approx_level, ApproxLevel::OctaveFolded);

        let low = resolve_octave(24, 1, &C_MAJOR, 0);
        assert!(!low.octave_up);
        assert_eq!(low.approx_level, ApproxLevel::OctaveFolded);
    }

    #[test]
    fn octave_anchor_offset_shifts_expectation() {
        let res = resolve_octave(72, 1, &C_MAJOR, 2);
        assert_eq!(res.approx_level, ApproxLevel::Exact);
        assert!(!res.octave_up);

        let res = resolve_octave(96, 1, &C_MAJOR, 2);
        assert!(res.octave_up);
        assert_eq!(res.approx_level, ApproxLevel::OctaveFolded);
    }

    #[test]
    fn half_octave_rounds_up() {
        // 54 - 48 = 6 semitones -> +0.5 octave rounds to +1
        assert!(resolve_octave(54, 1, &C_MAJOR, 0).octave_up);
        // 42 - 48 = -6 -> -0.5 rounds to 0, not -1
        assert_eq!(resolve_octave(42, 1, &C_MAJOR, 0).approx_level, ApproxLevel::Exact);
    }

    #[test]
    fn degree_buttons() {
        assert_eq!(note_input_for_degree(1), (Button::A, Modifiers::NONE));
        assert_eq!(note_input_for_degree(2), (Button::A, Modifiers::LB));
        assert_eq!(note_input_for_degree(3), (Button::X, Modifiers::NONE));
        assert_eq!(note_input_for_degree(4), (Button::X, Modifiers::LB));
        assert_eq!(note_input_for_degree(5), (Button::Y, Modifiers::NONE));
        assert_eq!(note_input_for_degree(6), (Button::Y, Modifiers::LB));
        assert_eq!(note_input_for_degree(7), (Button::B, Modifiers::LB));
        assert_eq!(note_input_for_degree(8), (Button::B, Modifiers::NONE));
        assert_eq!(note_input_for_degree(9), (Button::A, Modifiers::LB));
    }

    #[test]
    fn initial_offset_reads_first_bar() {
        let timing = build_timing(120.0);
        // first bar (2 s) sits two octaves up; later notes are ignored
        let notes = vec![
            Note::new(72, 0.0, 0.5),
            Note::new(76, 0.5, 1.0),
            Note::new(79, 1.0, 1.5),
            Note::new(36, 4.0, 4.5),
        ];
        assert_eq!(initial_octave_offset(&notes, &C_MAJOR, &timing, 4), 2);
        assert_eq!(initial_offset_for_late_start(&timing), -1);
        assert_eq!(initial_octave_offset(&[], &C_MAJOR, &timing, 4), 0);
    }

    fn initial_offset_for_late_start(timing: &Timing) -> i8 {
        // nothing in the first bar: whole list is sampled
        let notes = vec![Note::new(36, 8.0, 9.0), Note::new(38, 9.0, 10.0)];
        initial_octave_offset(&notes, &C_MAJOR, timing, 4)
    }
}
