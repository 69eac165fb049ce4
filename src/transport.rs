use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BPM, MAX_TEMPO, MAX_TIME_SIGNATURE_NUMERATOR, MIN_TEMPO,
    VALID_TIME_SIGNATURE_DENOMINATORS,
};
use crate::error::{Result, TimelineError};
use crate::time_utils::{TimeConverter, format_playhead};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0
            || numerator > MAX_TIME_SIGNATURE_NUMERATOR
            || !VALID_TIME_SIGNATURE_DENOMINATORS.contains(&denominator)
        {
            return Err(TimelineError::InvalidTimeSignature {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }
}

/// Playhead, tempo and meter. Positions are in beats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    playhead: f64,
    is_playing: bool,
    tempo: f64,
    time_signature: TimeSignature,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            playhead: 0.0,
            is_playing: false,
            tempo: DEFAULT_BPM,
            time_signature: TimeSignature::default(),
        }
    }
}

impl Transport {
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn play(&mut self) {
        self.is_playing = true;
    }

    /// Stops without moving the playhead.
    pub fn stop(&mut self) {
        self.is_playing = false;
    }

    pub fn toggle_playback(&mut self) {
        self.is_playing = !self.is_playing;
    }

    pub fn set_position(&mut self, beat: f64) {
        self.playhead = beat.max(0.0);
    }

    /// Clamped to the supported tempo range.
    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo = if bpm.is_nan() {
            DEFAULT_BPM
        } else {
            bpm.clamp(MIN_TEMPO, MAX_TEMPO)
        };
    }

    pub fn set_time_signature(&mut self, numerator: u32, denominator: u32) -> Result<()> {
        self.time_signature = TimeSignature::new(numerator, denominator)?;
        Ok(())
    }

    /// Bring deserialized values back inside the supported ranges. Tempo and
    /// playhead are clamped; an impossible meter is an error.
    pub fn validated(mut self) -> Result<Self> {
        let TimeSignature {
            numerator,
            denominator,
        } = self.time_signature;
        self.set_time_signature(numerator, denominator)?;
        self.set_tempo(self.tempo);
        self.set_position(self.playhead);
        Ok(self)
    }

    pub fn rewind(&mut self) {
        self.set_position(0.0);
    }

    pub fn fast_forward(&mut self, beats: f64) {
        self.set_position(self.playhead + beats);
    }

    pub fn rewind_beats(&mut self, beats: f64) {
        self.set_position(self.playhead - beats);
    }

    pub fn converter(&self) -> TimeConverter {
        TimeConverter::new(self.tempo)
    }

    pub fn format_position(&self) -> String {
        format_playhead(self.playhead, self.time_signature.numerator)
    }
}

/// Turns host frame timestamps into playhead advances.
///
/// The first tick after (re)starting only records a baseline.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    last_ms: Option<f64>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }

    /// Returns the beat delta applied, if any.
    pub fn tick(&mut self, now_ms: f64, transport: &mut Transport) -> Option<f64> {
        if !transport.is_playing() {
            self.reset();
            return None;
        }
        let Some(last) = self.last_ms.replace(now_ms) else {
            return None;
        };
        let delta = transport.converter().millis_to_beats((now_ms - last).max(0.0));
        transport.set_position(transport.playhead() + delta);
        Some(delta)
    }
}
