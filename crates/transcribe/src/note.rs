use serde::{Deserialize, Serialize};

/// A single note with absolute timing in seconds.
///
/// Input notes are never mutated; quantization and overlap trimming
/// produce new copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub onset_sec: f64,
    pub offset_sec: f64,
    pub pitch: u8,
    #[serde(default = "Note::default_velocity")]
    pub velocity: u8,
    #[serde(default)]
    pub channel: u8,
}

impl Note {
    pub fn new(pitch: u8, onset_sec: f64, offset_sec: f64) -> Self {
        Self {
            onset_sec,
            offset_sec,
            pitch,
            velocity: Self::default_velocity(),
            channel: 0,
        }
    }

    fn default_velocity() -> u8 {
        100
    }

    pub fn duration_sec(&self) -> f64 {
        (self.offset_sec - self.onset_sec).max(0.0)
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }

    /// Check the structural invariants callers are expected to uphold.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.onset_sec.is_finite() || !self.offset_sec.is_finite() {
            return Err("non-finite timing".into());
        }
        if self.onset_sec < 0.0 {
            return Err(format!("negative onset {}", self.onset_sec));
        }
        if self.offset_sec < self.onset_sec {
            return Err(format!(
                "offset {} precedes onset {}",
                self.offset_sec, self.onset_sec
            ));
        }
        if self.pitch > 127 {
            return Err(format!("pitch {} out of range", self.pitch));
        }
        if self.velocity > 127 {
            return Err(format!("velocity {} out of range", self.velocity));
        }
        Ok(())
    }
}
