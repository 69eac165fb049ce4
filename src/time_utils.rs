use serde::{Deserialize, Serialize};

use crate::constants::TICKS_PER_BEAT;

/// Position expressed as bars, beats and ticks. Bars and beats are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicalTime {
    pub bars: u32,
    pub beats: u32,
    pub ticks: u32,
}

/// Tempo-aware conversions between seconds and beats
#[derive(Debug, Clone, Copy)]
pub struct TimeConverter {
    bpm: f64,
}

impl TimeConverter {
    pub fn new(bpm: f64) -> Self {
        Self { bpm }
    }

    /// Convert seconds to beats
    #[inline]
    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * (self.bpm / 60.0)
    }

    /// Convert beats to seconds
    #[inline]
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * 60.0 / self.bpm
    }

    /// Beats travelled over a wall-clock interval in milliseconds
    #[inline]
    pub fn millis_to_beats(&self, millis: f64) -> f64 {
        self.bpm / 60_000.0 * millis
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.bpm = bpm;
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }
}

#[inline]
pub fn beats_to_pixels(beat: f64, pixels_per_beat: f64, zoom: f64) -> f64 {
    beat * pixels_per_beat * zoom
}

#[inline]
pub fn pixels_to_beats(pixels: f64, pixels_per_beat: f64, zoom: f64) -> f64 {
    pixels / (pixels_per_beat * zoom)
}

/// Split a beat position into bars, beats and ticks.
///
/// Rounds to the nearest whole tick first so `ticks` always stays below
/// `ticks_per_beat`. Negative positions are treated as zero.
pub fn beats_to_musical_time(beats: f64, numerator: u32, ticks_per_beat: u32) -> MusicalTime {
    let numerator = numerator.max(1) as u64;
    let tpb = ticks_per_beat.max(1) as u64;
    let total_ticks = (beats.max(0.0) * tpb as f64).round() as u64;

    let whole_beats = total_ticks / tpb;
    MusicalTime {
        bars: (whole_beats / numerator + 1) as u32,
        beats: (whole_beats % numerator + 1) as u32,
        ticks: (total_ticks % tpb) as u32,
    }
}

pub fn musical_time_to_beats(time: MusicalTime, numerator: u32, ticks_per_beat: u32) -> f64 {
    let whole_beats = time.bars.saturating_sub(1) as f64 * numerator.max(1) as f64
        + time.beats.saturating_sub(1) as f64;
    whole_beats + time.ticks as f64 / ticks_per_beat.max(1) as f64
}

pub fn seconds_to_musical_time(
    seconds: f64,
    tempo: f64,
    numerator: u32,
    ticks_per_beat: u32,
) -> MusicalTime {
    let beats = TimeConverter::new(tempo).seconds_to_beats(seconds);
    beats_to_musical_time(beats, numerator, ticks_per_beat)
}

pub fn musical_time_to_seconds(
    time: MusicalTime,
    tempo: f64,
    numerator: u32,
    ticks_per_beat: u32,
) -> f64 {
    let beats = musical_time_to_beats(time, numerator, ticks_per_beat);
    TimeConverter::new(tempo).beats_to_seconds(beats)
}

/// Format as `BB:bb:TTT`
pub fn format_musical_time(time: MusicalTime) -> String {
    format!("{:02}:{:02}:{:03}", time.bars, time.beats, time.ticks)
}

/// Playhead label for a beat position
pub fn format_playhead(beats: f64, numerator: u32) -> String {
    format_musical_time(beats_to_musical_time(beats, numerator, TICKS_PER_BEAT))
}

/// Quantize a beat position to the nearest grid point
#[inline]
pub fn quantize_to_grid(beat: f64, grid_size: f64) -> f64 {
    if grid_size > 0.0 {
        (beat / grid_size).round() * grid_size
    } else {
        beat
    }
}
