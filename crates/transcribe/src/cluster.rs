use tracing::debug;

use crate::note::Note;
use crate::options::GroupingOptions;

/// Notes considered together for chord or arpeggio interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Never empty, in onset order.
    pub notes: Vec<Note>,
    pub is_arpeggio: bool,
}

impl Cluster {
    pub fn onset_sec(&self) -> f64 {
        self.notes.first().map(|n| n.onset_sec).unwrap_or(0.0)
    }

    /// Latest offset minus first onset.
    pub fn duration_sec(&self) -> f64 {
        let end = self
            .notes
            .iter()
            .map(|n| n.offset_sec)
            .fold(f64::NEG_INFINITY, f64::max);
        end - self.onset_sec()
    }

    pub fn pitches(&self) -> Vec<u8> {
        self.notes.iter().map(|n| n.pitch).collect()
    }

    /// Lowest-pitched note; first one wins on equal pitch.
    pub fn lowest(&self) -> Option<&Note> {
        self.notes
            .iter()
            .reduce(|low, n| if n.pitch < low.pitch { n } else { low })
    }
}

/// Partition onset-sorted notes into simultaneous, arpeggio and single clusters.
///
/// Each anchor absorbs followers within `cluster_window` of its onset. A lone
/// anchor instead looks ahead `arpeggio_window`; three or more notes there
/// form an arpeggio and are consumed together. Every note lands in exactly
/// one cluster.
pub fn group_notes(notes: &[Note], options: &GroupingOptions) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let mut index = 0;

    while index < notes.len() {
        let anchor = notes[index].onset_sec;
        let mut next = index + 1;
        while next < notes.len() && notes[next].onset_sec - anchor <= options.cluster_window {
            next += 1;
        }

        if next - index == 1 {
            let mut lookahead = next;
            while lookahead < notes.len()
                && notes[lookahead].onset_sec - anchor <= options.arpeggio_window
            {
                lookahead += 1;
            }
            if lookahead - index >= 3 {
                clusters.push(Cluster {
                    notes: notes[index..lookahead].to_vec(),
                    is_arpeggio: true,
                });
                index = lookahead;
                continue;
            }
        }

        clusters.push(Cluster {
            notes: notes[index..next].to_vec(),
            is_arpeggio: false,
        });
        index = next;
    }

    debug!(
        notes = notes.len(),
        clusters = clusters.len(),
        arpeggios = clusters.iter().filter(|c| c.is_arpeggio).count(),
        "grouped notes"
    );
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(pitch: u8, onset: f64) -> Note {
        Note::new(pitch, onset, onset + 0.5)
    }

    fn shapes(clusters: &[Cluster]) -> Vec<(usize, bool)> {
        clusters.iter().map(|c| (c.notes.len(), c.is_arpeggio)).collect()
    }

    #[test]
    fn simultaneous_notes_form_one_cluster() {
        let notes = vec![at(60, 0.0), at(64, 0.01), at(67, 0.03), at(72, 1.0)];
        let clusters = group_notes(&notes, &GroupingOptions::default());
        assert_eq!(shapes(&clusters), vec![(3, false), (1, false)]);
    }

    #[test]
    fn fast_run_becomes_arpeggio() {
        let notes = vec![at(60, 0.0), at(64, 0.08), at(67, 0.16), at(72, 1.0)];
        let clusters = group_notes(&notes, &GroupingOptions::default());
        assert_eq!(shapes(&clusters), vec![(3, true), (1, false)]);
    }

    #[test]
    fn two_quick_notes_stay_single() {
        let notes = vec![at(60, 0.0), at(64, 0.1)];
        let clusters = group_notes(&notes, &GroupingOptions::default());
        assert_eq!(shapes(&clusters), vec![(1, false), (1, false)]);
    }

    #[test]
    fn every_note_is_assigned_once() {
        let notes: Vec<Note> = (0..40).map(|i| at(60 + (i % 12) as u8, i as f64 * 0.037)).collect();
        let clusters = group_notes(&notes, &GroupingOptions::default());
        let total: usize = clusters.iter().map(|c| c.notes.len()).sum();
        assert_eq!(total, notes.len());
        assert!(clusters.iter().all(|c| !c.notes.is_empty()));
    }

    #[test]
    fn empty_input_has_no_clusters() {
        assert!(group_notes(&[], &GroupingOptions::default()).is_empty());
    }

    #[test]
    fn cluster_helpers() {
        let cluster = Cluster {
            notes: vec![Note::new(64, 1.0, 1.2), Note::new(48, 1.0, 2.0), Note::new(48, 1.01, 1.5)],
            is_arpeggio: false,
        };
        assert_eq!(cluster.onset_sec(), 1.0);
        assert_eq!(cluster.duration_sec(), 1.0);
        assert_eq!(cluster.pitches(), vec![64, 48, 48]);
        assert_eq!(cluster.lowest().unwrap().offset_sec, 2.0);
    }
}
