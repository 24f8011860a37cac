//! Turns clusters into controller events.

use tracing::debug;

use crate::chord_templates::analyze_chord;
use crate::cluster::Cluster;
use crate::fingering::select_chord_input;
use crate::note::Note;
use crate::quantize::MIN_NOTE_SEC;
use crate::scale::{map_pitch_to_degree, note_input_for_degree, resolve_octave};
use crate::types::{
    ApproxCounts, ApproxLevel, DrumLane, Event, EventKind, Key, RequiredInput, Timing,
};

/// Accumulates events and per-level approximation tallies for one run.
pub struct EventBuilder {
    key: Key,
    timing: Timing,
    /// Octave anchor shift applied when resolving octave-up.
    octave_offset: i8,
    events: Vec<Event>,
    approx_counts: ApproxCounts,
}

impl EventBuilder {
    pub fn new(key: Key, timing: Timing, octave_offset: i8) -> Self {
        Self {
            key,
            timing,
            octave_offset,
            events: Vec::new(),
            approx_counts: ApproxCounts::new(),
        }
    }

    /// Events from a melodic cluster.
    pub fn push_cluster(&mut self, cluster: &Cluster, force_note_mode: bool) {
        if cluster.is_arpeggio || force_note_mode {
            for note in &cluster.notes {
                self.push_note(note, None);
            }
            return;
        }

        if cluster.notes.len() >= 2 {
            self.push_chord(cluster);
            return;
        }

        if let Some(note) = cluster.notes.first() {
            self.push_note(note, None);
        }
    }

    /// One DRUM event per note; drum stems never form chords.
    ///
    /// Every hit in a cluster sustains for the whole cluster.
    pub fn push_drums(&mut self, cluster: &Cluster) {
        let duration_sec = cluster.duration_sec();
        for note in &cluster.notes {
            let lane = DrumLane::from_pitch(note.pitch).index();
            self.push_event(
                note.onset_sec,
                duration_sec,
                lane,
                EventKind::Drum,
                RequiredInput::Drum { lane },
                vec![note.pitch],
                ApproxLevel::Exact,
            );
        }
    }

    fn push_chord(&mut self, cluster: &Cluster) {
        let pitches = cluster.pitches();
        let analysis = analyze_chord(&pitches);
        let Some((root, chord)) = analysis.and_then(|a| a.chord.map(|c| (a.root_pitch_class, c)))
        else {
            if let Some(lowest) = cluster.lowest() {
                debug!(?pitches, "no chord template fits, falling back to root note");
                self.push_note(lowest, Some(ApproxLevel::RootFallback));
            }
            return;
        };

        let mapping = map_pitch_to_degree(root, &self.key);
        let fingering = select_chord_input(root, chord.quality);
        let approx_level = if mapping.approx_level.is_exact() {
            chord.approx_level
        } else {
            mapping.approx_level
        };

        self.push_event(
            cluster.onset_sec(),
            cluster.duration_sec(),
            fingering.button.lane(),
            EventKind::Chord,
            RequiredInput::Chord {
                degree: mapping.degree,
                button: fingering.button,
                modifiers: fingering.modifiers,
                chord_type: fingering.chord_type,
            },
            pitches,
            approx_level,
        );
    }

    fn push_note(&mut self, note: &Note, approx_override: Option<ApproxLevel>) {
        let mapping = map_pitch_to_degree(note.pitch_class(), &self.key);
        let octave = resolve_octave(note.pitch, mapping.degree, &self.key, self.octave_offset);
        let (button, mut modifiers) = note_input_for_degree(mapping.degree);
        modifiers.dleft = mapping.flat;

        let derived = [mapping.approx_level, octave.approx_level]
            .into_iter()
            .find(|level| !level.is_exact())
            .unwrap_or(ApproxLevel::Exact);

        self.push_event(
            note.onset_sec,
            note.duration_sec(),
            button.lane(),
            EventKind::Note,
            RequiredInput::Note {
                degree: mapping.degree,
                button,
                modifiers,
                octave_up: octave.octave_up,
            },
            vec![note.pitch],
            approx_override.unwrap_or(derived),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn push_event(
        &mut self,
        onset_sec: f64,
        duration_sec: f64,
        lane: u8,
        kind: EventKind,
        required_input: RequiredInput,
        original_pitches: Vec<u8>,
        approx_level: ApproxLevel,
    ) {
        let seconds_per_beat = self.timing.seconds_per_beat;
        self.approx_counts.record(approx_level);
        self.events.push(Event {
            time_beat: onset_sec / seconds_per_beat,
            time_sec: onset_sec,
            lane,
            kind,
            required_input,
            sustain_beats: duration_sec.max(MIN_NOTE_SEC) / seconds_per_beat,
            original_pitches,
            approx_level,
            recommended_mode: kind.recommended_mode(),
        });
    }

    /// Events stable-sorted by time, with their tallies.
    pub fn finish(mut self) -> (Vec<Event>, ApproxCounts) {
        self.events.sort_by(|a, b| a.time_sec.total_cmp(&b.time_sec));
        (self.events, self.approx_counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord_templates::ChordQuality;
    use crate::quantize::build_timing;
    use crate::types::{Button, Modifiers};
    use pretty_assertions::assert_eq;

    fn builder() -> EventBuilder {
        EventBuilder::new(Key::C_MAJOR, build_timing(120.0), 0)
    }

    fn cluster(notes: Vec<Note>, is_arpeggio: bool) -> Cluster {
        Cluster { notes, is_arpeggio }
    }

    #[test]
    fn triad_cluster_becomes_chord() {
        let mut b = builder();
        b.push_cluster(
            &cluster(
                vec![Note::new(60, 0.0, 1.0), Note::new(64, 0.0, 1.0), Note::new(67, 0.0, 1.0)],
                false,
            ),
            false,
        );
        let (events, counts) = b.finish();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.kind, EventKind::Chord);
        assert_eq!(event.lane, Button::A.lane());
        assert_eq!(event.sustain_beats, 2.0);
        assert_eq!(event.original_pitches, vec![60, 64, 67]);
        assert_eq!(
            event.required_input,
            RequiredInput::Chord {
                degree: 1,
                button: Button::A,
                modifiers: Modifiers::NONE,
                chord_type: ChordQuality::Triad,
            }
        );
        assert_eq!(counts.get(ApproxLevel::Exact), 1);
    }

    #[test]
    fn off_scale_chord_root_takes_degree_level() {
        // Eb major in C major: root Eb snaps, the triad itself is exact
        let mut b = builder();
        b.push_cluster(
            &cluster(
                vec![Note::new(63, 0.0, 0.5), Note::new(67, 0.0, 0.5), Note::new(70, 0.0, 0.5)],
                false,
            ),
            false,
        );
        let (events, _) = b.finish();
        assert_eq!(events[0].kind, EventKind::Chord);
        assert_eq!(events[0].approx_level, ApproxLevel::ChromaticShift);
    }

    #[test]
    fn unclassifiable_cluster_falls_back_to_lowest_note() {
        let notes: Vec<Note> = (60..66).rev().map(|p| Note::new(p, 0.0, 0.25)).collect();
        let mut b = builder();
        b.push_cluster(&cluster(notes, false), false);
        let (events, counts) = b.finish();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Note);
        assert_eq!(events[0].original_pitches, vec![60]);
        assert_eq!(events[0].approx_level, ApproxLevel::RootFallback);
        assert_eq!(counts.get(ApproxLevel::RootFallback), 1);
    }

    #[test]
    fn arpeggio_and_forced_notes_emit_one_event_each() {
        let notes = vec![Note::new(60, 0.0, 0.1), Note::new(64, 0.08, 0.2), Note::new(67, 0.16, 0.3)];
        let mut b = builder();
        b.push_cluster(&cluster(notes.clone(), true), false);
        b.push_cluster(&cluster(notes, false), true);
        let (events, counts) = b.finish();
        assert_eq!(events.len(), 6);
        assert!(events.iter().all(|e| e.kind == EventKind::Note));
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn note_event_carries_degree_and_flat() {
        let mut b = builder();
        b.push_cluster(&cluster(vec![Note::new(61, 0.5, 0.5)], false), false);
        let (events, _) = b.finish();
        let event = &events[0];
        assert_eq!(event.time_beat, 1.0);
        assert_eq!(event.sustain_beats, 0.1);
        assert_eq!(
            event.required_input,
            RequiredInput::Note {
                degree: 1,
                button: Button::A,
                modifiers: Modifiers::DLEFT,
                octave_up: true,
            }
        );
        assert_eq!(event.approx_level, ApproxLevel::ChromaticShift);
    }

    #[test]
    fn drums_emit_per_note_with_fixed_lanes() {
        let notes = vec![Note::new(36, 0.0, 0.1), Note::new(49, 0.0, 0.1), Note::new(42, 0.0, 0.1)];
        let mut b = builder();
        b.push_drums(&cluster(notes, false));
        let (events, counts) = b.finish();
        let lanes: Vec<u8> = events.iter().map(|e| e.lane).collect();
        assert_eq!(lanes, vec![0, 3, 2]);
        assert!(events.iter().all(|e| e.kind == EventKind::Drum));
        assert_eq!(counts.get(ApproxLevel::Exact), 3);
    }

    #[test]
    fn drum_hits_share_cluster_sustain() {
        let notes = vec![Note::new(36, 0.0, 0.1), Note::new(49, 0.0, 2.0)];
        let mut b = builder();
        b.push_drums(&cluster(notes, false));
        let (events, _) = b.finish();
        let sustains: Vec<f64> = events.iter().map(|e| e.sustain_beats).collect();
        assert_eq!(sustains, vec![4.0, 4.0]);
    }

    #[test]
    fn finish_sorts_by_time_stably() {
        let mut b = builder();
        b.push_cluster(&cluster(vec![Note::new(67, 1.0, 1.5)], false), false);
        b.push_cluster(&cluster(vec![Note::new(60, 0.0, 0.5)], false), false);
        b.push_cluster(&cluster(vec![Note::new(64, 1.0, 1.5)], false), false);
        let (events, _) = b.finish();
        let pitches: Vec<u8> = events.iter().map(|e| e.original_pitches[0]).collect();
        assert_eq!(pitches, vec![60, 67, 64]);
    }
}
