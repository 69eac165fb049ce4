use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_TIMELINE_BEATS, DEFAULT_TRACK_COUNT, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM,
    PIXELS_PER_BEAT, SCROLL_SETTLE_MS, TRACK_HEIGHT, WHEEL_ZOOM_STEP,
};
use crate::time_utils::{beats_to_pixels, pixels_to_beats};

#[inline]
fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        DEFAULT_ZOOM
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

/// Wheel input in screen pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub client_x: f64,
    /// Ctrl/Cmd held: the wheel zooms instead of scrolling.
    pub zoom_modifier: bool,
}

/// Per-session zoom and scroll state. Never persisted with the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    zoom: f64,
    pixels_per_beat: f64,
    horizontal_scroll: f64,
    vertical_scroll: f64,
    viewport_width: f64,
    viewport_height: f64,
    content_width: f64,
    content_height: f64,
    track_height: f64,
    #[serde(skip)]
    scrolling_since: Option<f64>,
}

impl Default for TimelineView {
    fn default() -> Self {
        Self::new(DEFAULT_TIMELINE_BEATS, DEFAULT_TRACK_COUNT)
    }
}

impl TimelineView {
    pub fn new(initial_beats: f64, initial_tracks: usize) -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            pixels_per_beat: PIXELS_PER_BEAT,
            horizontal_scroll: 0.0,
            vertical_scroll: 0.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
            content_width: initial_beats * PIXELS_PER_BEAT * DEFAULT_ZOOM,
            content_height: initial_tracks as f64 * TRACK_HEIGHT,
            track_height: TRACK_HEIGHT,
            scrolling_since: None,
        }
    }

    pub fn with_pixels_per_beat(mut self, pixels_per_beat: f64) -> Self {
        if pixels_per_beat > 0.0 {
            self.content_width = self.content_width / self.pixels_per_beat * pixels_per_beat;
            self.pixels_per_beat = pixels_per_beat;
        }
        self
    }

    pub fn with_track_height(mut self, track_height: f64) -> Self {
        if track_height > 0.0 {
            self.content_height = self.content_height / self.track_height * track_height;
            self.track_height = track_height;
        }
        self
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pixels_per_beat(&self) -> f64 {
        self.pixels_per_beat
    }

    pub fn horizontal_scroll(&self) -> f64 {
        self.horizontal_scroll
    }

    pub fn vertical_scroll(&self) -> f64 {
        self.vertical_scroll
    }

    pub fn content_width(&self) -> f64 {
        self.content_width
    }

    pub fn content_height(&self) -> f64 {
        self.content_height
    }

    pub fn viewport(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn track_height(&self) -> f64 {
        self.track_height
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling_since.is_some()
    }

    #[inline]
    pub fn beat_to_pixel(&self, beat: f64) -> f64 {
        beats_to_pixels(beat, self.pixels_per_beat, self.zoom)
    }

    #[inline]
    pub fn pixel_to_beat(&self, pixel: f64) -> f64 {
        pixels_to_beats(pixel, self.pixels_per_beat, self.zoom)
    }

    /// Beat under a screen x coordinate, accounting for scroll.
    pub fn beat_at(&self, client_x: f64, container_left: f64) -> f64 {
        self.pixel_to_beat(client_x - container_left + self.horizontal_scroll)
    }

    /// Beat range currently inside the viewport.
    pub fn visible_beats(&self) -> (f64, f64) {
        let start = self.pixel_to_beat(self.horizontal_scroll);
        let end = self.pixel_to_beat(self.horizontal_scroll + self.viewport_width);
        (start, end)
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width.max(0.0);
        self.viewport_height = height.max(0.0);
    }

    pub fn update_content_dimensions(&mut self, beats: f64, track_count: usize) {
        self.content_width = beats * self.pixels_per_beat * self.zoom;
        self.content_height = track_count as f64 * self.track_height;
    }

    /// Content width scales with zoom; scroll is left alone.
    pub fn set_zoom(&mut self, zoom: f64) {
        let zoom = clamp_zoom(zoom);
        self.content_width = self.content_width / self.zoom * zoom;
        self.zoom = zoom;
    }

    /// Zoom by `delta` while keeping the content under `anchor_x` fixed on screen.
    pub fn zoom_at(&mut self, delta: f64, anchor_x: f64, container_left: f64) {
        let offset = anchor_x - container_left;
        let fraction = if self.content_width > 0.0 {
            (offset + self.horizontal_scroll) / self.content_width
        } else {
            0.0
        };

        let zoom = clamp_zoom(self.zoom + delta);
        self.content_width = self.content_width / self.zoom * zoom;
        self.zoom = zoom;
        self.horizontal_scroll = fraction * self.content_width - offset;
        log::debug!("Zoom {:.2} anchored at {:.1}px", zoom, offset);
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.horizontal_scroll = x;
        self.vertical_scroll = y;
    }

    pub fn scroll_to_beat(&mut self, beat: f64) {
        self.horizontal_scroll = self.beat_to_pixel(beat);
    }

    /// Record a user scroll. The scrolling flag clears after a short pause.
    pub fn handle_scroll(&mut self, x: f64, y: f64, now_ms: f64) {
        self.scroll_to(x, y);
        self.scrolling_since = Some(now_ms);
    }

    pub fn settle(&mut self, now_ms: f64) {
        if let Some(since) = self.scrolling_since
            && now_ms - since >= SCROLL_SETTLE_MS
        {
            self.scrolling_since = None;
        }
    }

    /// Modifier + wheel zooms around the pointer (wheel down zooms out); plain wheel scrolls.
    pub fn handle_wheel(&mut self, wheel: WheelInput, container_left: f64, now_ms: f64) {
        if wheel.zoom_modifier {
            let delta = if wheel.delta_y > 0.0 {
                -WHEEL_ZOOM_STEP
            } else {
                WHEEL_ZOOM_STEP
            };
            self.zoom_at(delta, wheel.client_x, container_left);
        } else {
            self.handle_scroll(
                self.horizontal_scroll + wheel.delta_x,
                self.vertical_scroll + wheel.delta_y,
                now_ms,
            );
        }
    }
}
