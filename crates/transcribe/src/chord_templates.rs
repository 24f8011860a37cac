use serde::{Deserialize, Serialize};

use crate::types::ApproxLevel;

/// Chord shapes the controller can express.
///
/// The inversion variants are fingering shapes only; classification never
/// produces them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChordQuality {
    Triad,
    #[serde(rename = "triad-inv1")]
    TriadInv1,
    #[serde(rename = "triad-inv2")]
    TriadInv2,
    Sus2,
    Sus4,
    Seventh,
    Add9,
    Dim,
    Aug,
    Power,
}

/// A recognition template: quality + interval set from root (as bitmask over 12 pitch classes).
pub struct ChordTemplate {
    pub quality: ChordQuality,
    pub intervals: &'static [u8],
    pub mask: u16,
}

impl ChordTemplate {
    const fn new(quality: ChordQuality, intervals: &'static [u8]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << intervals[i];
            i += 1;
        }
        Self {
            quality,
            intervals,
            mask,
        }
    }

    pub fn size(&self) -> usize {
        self.intervals.len()
    }
}

/// Recognition templates in scan order. Several qualities accept more than
/// one voicing (minor triads count as triads, any seventh as seventh).
pub static TEMPLATES: &[ChordTemplate] = &[
    ChordTemplate::new(ChordQuality::Triad, &[0, 4, 7]),
    ChordTemplate::new(ChordQuality::Triad, &[0, 3, 7]),
    ChordTemplate::new(ChordQuality::Sus2, &[0, 2, 7]),
    ChordTemplate::new(ChordQuality::Sus4, &[0, 5, 7]),
    ChordTemplate::new(ChordQuality::Seventh, &[0, 4, 7, 10]),
    ChordTemplate::new(ChordQuality::Seventh, &[0, 3, 7, 10]),
    ChordTemplate::new(ChordQuality::Seventh, &[0, 4, 7, 11]),
    ChordTemplate::new(ChordQuality::Add9, &[0, 2, 4, 7]),
    ChordTemplate::new(ChordQuality::Add9, &[0, 2, 3, 7]),
    ChordTemplate::new(ChordQuality::Dim, &[0, 3, 6]),
    ChordTemplate::new(ChordQuality::Aug, &[0, 4, 8]),
    ChordTemplate::new(ChordQuality::Power, &[0, 7]),
    ChordTemplate::new(ChordQuality::Power, &[0, 5]),
];

/// Minimum template score for a root to be considered at all.
pub const MIN_CHORD_SCORE: f64 = 0.5;

/// Convert a set of pitch classes to an interval bitmask relative to a root.
fn to_interval_mask(pitch_classes: &[u8], root: u8) -> u16 {
    let mut mask = 0u16;
    for &pc in pitch_classes {
        let interval = (pc % 12 + 12 - root % 12) % 12;
        mask |= 1 << interval;
    }
    mask
}

/// Best template for one candidate root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordMatch {
    pub quality: ChordQuality,
    /// |matched| / |union of cluster intervals and template|
    pub score: f64,
    pub matched: usize,
    pub template: &'static [u8],
    pub approx_level: ApproxLevel,
}

/// Score every template against the pitch classes heard from `root`.
///
/// Ranking is score, then matched interval count, then template size;
/// an earlier template keeps its place unless beaten outright. Returns
/// `None` when the best score is below `MIN_CHORD_SCORE`.
pub fn match_templates(pitch_classes: &[u8], root: u8) -> Option<ChordMatch> {
    let intervals = to_interval_mask(pitch_classes, root);
    let interval_count = intervals.count_ones() as usize;

    let mut best: Option<(&ChordTemplate, f64, usize)> = None;
    for template in TEMPLATES {
        let matched = (intervals & template.mask).count_ones() as usize;
        let union = (intervals | template.mask).count_ones() as usize;
        let score = if union == 0 {
            0.0
        } else {
            matched as f64 / union as f64
        };

        let better = match best {
            None => true,
            Some((current, best_score, best_matched)) => {
                score > best_score
                    || (score == best_score && matched > best_matched)
                    || (score == best_score
                        && matched == best_matched
                        && template.size() > current.size())
            }
        };
        if better {
            best = Some((template, score, matched));
        }
    }

    let (template, score, matched) = best?;
    if score < MIN_CHORD_SCORE {
        return None;
    }

    let exact = score == 1.0 && interval_count == template.size();
    let approx_level = if exact {
        ApproxLevel::Exact
    } else if template.quality == ChordQuality::Power {
        ApproxLevel::PowerChordFallback
    } else {
        ApproxLevel::Simplified
    };

    Some(ChordMatch {
        quality: template.quality,
        score,
        matched,
        template: template.intervals,
        approx_level,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordAnalysis {
    pub root_pitch_class: u8,
    pub bass_pitch_class: u8,
    /// `None` when no root reached `MIN_CHORD_SCORE`; the root is then the bass.
    pub chord: Option<ChordMatch>,
}

/// Classify a simultaneous cluster by trying each sounding pitch class as root.
///
/// Candidate roots are the distinct pitch classes in ascending pitch order,
/// starting with the bass. A later root must score strictly higher to win,
/// and an equal score only moves the root onto the bass.
pub fn analyze_chord(pitches: &[u8]) -> Option<ChordAnalysis> {
    let mut sorted = pitches.to_vec();
    sorted.sort_unstable();

    let mut pitch_classes: Vec<u8> = Vec::with_capacity(sorted.len());
    for pitch in &sorted {
        let pc = pitch % 12;
        if !pitch_classes.contains(&pc) {
            pitch_classes.push(pc);
        }
    }
    let bass = *pitch_classes.first()?;

    let mut best: Option<(u8, ChordMatch)> = None;
    for &candidate in &pitch_classes {
        let Some(chord) = match_templates(&pitch_classes, candidate) else {
            continue;
        };
        let replace = match &best {
            None => true,
            Some((root, current)) => {
                chord.score > current.score
                    || (chord.score == current.score && candidate == bass && *root != bass)
            }
        };
        if replace {
            best = Some((candidate, chord));
        }
    }

    Some(match best {
        Some((root, chord)) => ChordAnalysis {
            root_pitch_class: root,
            bass_pitch_class: bass,
            chord: Some(chord),
        },
        None => ChordAnalysis {
            root_pitch_class: bass,
            bass_pitch_class: bass,
            chord: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn c_major_triad_is_exact() {
        let analysis = analyze_chord(&[60, 64, 67]).unwrap();
        assert_eq!(analysis.root_pitch_class, 0);
        let chord = analysis.chord.unwrap();
        assert_eq!(chord.quality, ChordQuality::Triad);
        assert_eq!(chord.score, 1.0);
        assert_eq!(chord.approx_level, ApproxLevel::Exact);
    }

    #[test]
    fn first_inversion_still_finds_root() {
        // E G C: bass E, but only C as root matches a full template
        let analysis = analyze_chord(&[52, 55, 60]).unwrap();
        assert_eq!(analysis.bass_pitch_class, 4);
        assert_eq!(analysis.root_pitch_class, 0);
        assert_eq!(analysis.chord.unwrap().quality, ChordQuality::Triad);
    }

    #[test]
    fn minor_triad_counts_as_triad() {
        let chord = analyze_chord(&[62, 65, 69]).unwrap().chord.unwrap();
        assert_eq!(chord.quality, ChordQuality::Triad);
        assert_eq!(chord.template, &[0, 3, 7]);
        assert_eq!(chord.approx_level, ApproxLevel::Exact);
    }

    #[test]
    fn dominant_seventh() {
        let analysis = analyze_chord(&[55, 59, 62, 65]).unwrap();
        assert_eq!(analysis.root_pitch_class, 7);
        assert_eq!(analysis.chord.unwrap().quality, ChordQuality::Seventh);
    }

    #[test]
    fn power_chord_exact_and_inverted() {
        let fifth = analyze_chord(&[48, 55]).unwrap();
        assert_eq!(fifth.root_pitch_class, 0);
        assert_eq!(fifth.chord.unwrap().quality, ChordQuality::Power);
        assert_eq!(fifth.chord.unwrap().approx_level, ApproxLevel::Exact);

        // G below C: bass-rooted fourth matches the inverted power template
        let fourth = analyze_chord(&[43, 48]).unwrap();
        assert_eq!(fourth.root_pitch_class, 7);
        assert_eq!(fourth.chord.unwrap().template, &[0, 5]);
    }

    #[test]
    fn extra_tone_is_simplified() {
        // C C# E G: C major with a clashing semitone
        let analysis = analyze_chord(&[60, 61, 64, 67]).unwrap();
        assert_eq!(analysis.root_pitch_class, 0);
        let chord = analysis.chord.unwrap();
        assert_eq!(chord.quality, ChordQuality::Triad);
        assert_eq!(chord.score, 0.75);
        assert_eq!(chord.approx_level, ApproxLevel::Simplified);
    }

    #[test]
    fn incomplete_power_shape_is_power_fallback() {
        // C F# G: only the fifth template covers two of three tones
        let chord = match_templates(&[0, 7, 6], 0).unwrap();
        assert_eq!(chord.quality, ChordQuality::Power);
        assert_eq!(chord.approx_level, ApproxLevel::PowerChordFallback);
    }

    #[test]
    fn semitone_trio_scores_exactly_half() {
        // C C# D: root C against sus2 {0,2,7} matches 2 of 4 -> accepted at the threshold
        let analysis = analyze_chord(&[60, 61, 62]).unwrap();
        let chord = analysis.chord.unwrap();
        assert_eq!(analysis.root_pitch_class, 0);
        assert_eq!(chord.quality, ChordQuality::Sus2);
        assert_eq!(chord.score, 0.5);
        assert_eq!(chord.approx_level, ApproxLevel::Simplified);
    }

    #[test]
    fn chromatic_cluster_falls_back_to_bass() {
        let analysis = analyze_chord(&[60, 61, 62, 63, 64, 65]).unwrap();
        assert_eq!(analysis.chord, None);
        assert_eq!(analysis.root_pitch_class, 0);
    }

    #[test]
    fn empty_cluster_has_no_analysis() {
        assert_eq!(analyze_chord(&[]), None);
    }

    #[test]
    fn interval_mask_wraps() {
        assert_eq!(to_interval_mask(&[0, 4, 7], 0), 0b0000_1001_0001);
        assert_eq!(to_interval_mask(&[11], 0), 1 << 11);
        assert_eq!(to_interval_mask(&[0], 11), 1 << 1);
    }
}
