use crate::types::{Difficulty, Event};

/// Shortest duration (seconds) used for note density.
const MIN_DURATION_SEC: f64 = 1.0;

fn label_for(rating: u8) -> &'static str {
    match rating {
        0..=2 => "Easy",
        3 => "Medium",
        4 => "Hard",
        _ => "Expert",
    }
}

/// Rate a transcription 1–5 from tempo, note density and chord share.
///
/// `events` must be time-ordered; the last event's start is the duration.
pub fn estimate_difficulty(bpm: f64, events: &[Event], chord_events: usize) -> Difficulty {
    let Some(last) = events.last() else {
        return Difficulty {
            rating: 1,
            label: label_for(1).to_string(),
        };
    };

    let duration = last.time_sec.max(MIN_DURATION_SEC);
    let notes_per_minute = events.len() as f64 / duration * 60.0;
    let chordiness = chord_events as f64 / events.len() as f64;

    let tempo_score = (bpm / 180.0).clamp(0.0, 2.0);
    let density_score = (notes_per_minute / 120.0).clamp(0.0, 2.0);
    let chord_score = (chordiness * 2.0).clamp(0.0, 2.0);

    let raw = density_score * 1.2 + chord_score * 1.1 + tempo_score * 0.8;
    let rating = (raw * 1.4).ceil().clamp(1.0, 5.0) as u8;

    Difficulty {
        rating,
        label: label_for(rating).to_string(),
    }
}
