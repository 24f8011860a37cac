//! Controller fingerings for classified chords.
//!
//! Each chord quality owns a short list of combo shapes. Selection is a
//! bounded scan with a fixed three-level preference, so identical input
//! always lands on the same button.

use tracing::debug;

use crate::chord_templates::ChordQuality;
use crate::types::{Button, Modifiers};

/// Combos wider than this (semitones between lowest and highest interval)
/// are skipped when a narrower one exists.
pub const MAX_FRET_SPAN: u8 = 7;

/// Preferred button per root pitch class: three neighbouring classes per button.
const ROOT_BASE_FINGERING: [Button; 12] = [
    Button::A,
    Button::A,
    Button::A,
    Button::X,
    Button::X,
    Button::X,
    Button::Y,
    Button::Y,
    Button::Y,
    Button::B,
    Button::B,
    Button::B,
];

/// One playable voicing of a chord quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combo {
    /// Chord input the combo is played with.
    pub input: ChordQuality,
    pub intervals: &'static [u8],
    pub root_position: bool,
}

impl Combo {
    const fn root(input: ChordQuality, intervals: &'static [u8]) -> Self {
        Self {
            input,
            intervals,
            root_position: true,
        }
    }

    const fn inverted(input: ChordQuality, intervals: &'static [u8]) -> Self {
        Self {
            input,
            intervals,
            root_position: false,
        }
    }

    pub fn span(&self) -> u8 {
        let max = self.intervals.iter().copied().max().unwrap_or(0);
        let min = self.intervals.iter().copied().min().unwrap_or(0);
        max - min
    }

    pub fn button(&self) -> Button {
        self.input.input().0
    }
}

const TRIAD_COMBOS: &[Combo] = &[
    Combo::root(ChordQuality::Triad, &[0, 4, 7]),
    Combo::inverted(ChordQuality::TriadInv1, &[0, 3, 8]),
    Combo::inverted(ChordQuality::TriadInv2, &[0, 5, 9]),
];
const TRIAD_INV1_COMBOS: &[Combo] = &[Combo::inverted(ChordQuality::TriadInv1, &[0, 3, 8])];
const TRIAD_INV2_COMBOS: &[Combo] = &[Combo::inverted(ChordQuality::TriadInv2, &[0, 5, 9])];
const SUS2_COMBOS: &[Combo] = &[Combo::root(ChordQuality::Sus2, &[0, 2, 7])];
const SUS4_COMBOS: &[Combo] = &[Combo::root(ChordQuality::Sus4, &[0, 5, 7])];
const SEVENTH_COMBOS: &[Combo] = &[Combo::root(ChordQuality::Seventh, &[0, 4, 7, 10])];
const ADD9_COMBOS: &[Combo] = &[Combo::root(ChordQuality::Add9, &[0, 2, 4, 7])];
const DIM_COMBOS: &[Combo] = &[Combo::root(ChordQuality::Dim, &[0, 3, 6])];
const AUG_COMBOS: &[Combo] = &[Combo::root(ChordQuality::Aug, &[0, 4, 8])];
const POWER_COMBOS: &[Combo] = &[
    Combo::root(ChordQuality::Power, &[0, 7]),
    Combo::inverted(ChordQuality::Power, &[0, 5]),
];

impl ChordQuality {
    /// Button and modifier bank that play this chord type.
    pub fn input(self) -> (Button, Modifiers) {
        match self {
            ChordQuality::Power => (Button::B, Modifiers::NONE),
            ChordQuality::Triad => (Button::A, Modifiers::NONE),
            ChordQuality::TriadInv1 => (Button::X, Modifiers::NONE),
            ChordQuality::TriadInv2 => (Button::Y, Modifiers::NONE),
            ChordQuality::Sus2 => (Button::A, Modifiers::LB),
            ChordQuality::Sus4 => (Button::X, Modifiers::LB),
            ChordQuality::Seventh => (Button::Y, Modifiers::LB),
            ChordQuality::Add9 => (Button::B, Modifiers::LB),
            ChordQuality::Dim => (Button::A, Modifiers::DLEFT),
            ChordQuality::Aug => (Button::Y, Modifiers::DLEFT),
        }
    }

    /// Chord type a bare button press plays (no modifiers held).
    pub fn for_bare_button(button: Button) -> Self {
        match button {
            Button::A => ChordQuality::Triad,
            Button::X => ChordQuality::TriadInv1,
            Button::Y => ChordQuality::TriadInv2,
            Button::B => ChordQuality::Power,
        }
    }

    pub fn combos(self) -> &'static [Combo] {
        match self {
            ChordQuality::Triad => TRIAD_COMBOS,
            ChordQuality::TriadInv1 => TRIAD_INV1_COMBOS,
            ChordQuality::TriadInv2 => TRIAD_INV2_COMBOS,
            ChordQuality::Sus2 => SUS2_COMBOS,
            ChordQuality::Sus4 => SUS4_COMBOS,
            ChordQuality::Seventh => SEVENTH_COMBOS,
            ChordQuality::Add9 => ADD9_COMBOS,
            ChordQuality::Dim => DIM_COMBOS,
            ChordQuality::Aug => AUG_COMBOS,
            ChordQuality::Power => POWER_COMBOS,
        }
    }
}

pub fn preferred_button(root_pitch_class: u8) -> Button {
    ROOT_BASE_FINGERING[(root_pitch_class % 12) as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordFingering {
    pub chord_type: ChordQuality,
    pub button: Button,
    pub modifiers: Modifiers,
    pub span: u8,
}

/// Choose the combo for a classified chord.
///
/// Combos wider than `MAX_FRET_SPAN` are dropped unless all are. Among the
/// rest, in order: the root's preferred button, root position, smaller span.
/// The first combo stands until a later one wins on that ordering.
pub fn select_chord_input(root_pitch_class: u8, quality: ChordQuality) -> ChordFingering {
    let preferred = preferred_button(root_pitch_class);
    let combos = quality.combos();

    let viable: Vec<&Combo> = combos
        .iter()
        .filter(|combo| combo.span() <= MAX_FRET_SPAN)
        .collect();
    let candidates: Vec<&Combo> = if viable.is_empty() {
        combos.iter().collect()
    } else {
        viable
    };

    let mut best = candidates[0];
    for &combo in &candidates[1..] {
        let stable = combo.button() == preferred;
        let best_stable = best.button() == preferred;
        if stable && !best_stable {
            best = combo;
        } else if stable == best_stable {
            if combo.root_position && !best.root_position {
                best = combo;
            } else if combo.root_position == best.root_position && combo.span() < best.span() {
                best = combo;
            }
        }
    }

    let (button, modifiers) = best.input.input();
    debug!(
        root = root_pitch_class,
        ?quality,
        chosen = ?best.input,
        ?button,
        span = best.span(),
        candidates = candidates.len(),
        "chord fingering"
    );

    ChordFingering {
        chord_type: best.input,
        button,
        modifiers,
        span: best.span(),
    }
}
