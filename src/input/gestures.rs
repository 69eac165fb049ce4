use serde::{Deserialize, Serialize};

use crate::constants::{
    DOUBLE_CLICK_MAX_DISTANCE, DOUBLE_CLICK_MAX_INTERVAL_MS, DRAG_TRACK_THRESHOLD,
    EDGE_RESIZE_THRESHOLD, TRACK_HEIGHT,
};

/// Pointer position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

impl Pointer {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Pointer) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Left,
    Right,
}

/// Which part of a clip a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipHit {
    Body,
    Edge(ResizeEdge),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub drag_track_threshold: f64,     // 20px
    pub track_height: f64,             // 80px
    pub edge_resize_threshold: f64,    // 8px
    pub double_click_max_interval: f64, // 300ms
    pub double_click_max_distance: f64, // 20px
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_track_threshold: DRAG_TRACK_THRESHOLD,
            track_height: TRACK_HEIGHT,
            edge_resize_threshold: EDGE_RESIZE_THRESHOLD,
            double_click_max_interval: DOUBLE_CLICK_MAX_INTERVAL_MS,
            double_click_max_distance: DOUBLE_CLICK_MAX_DISTANCE,
        }
    }
}

impl GestureConfig {
    /// Classify a pointer x (content pixels) against a clip spanning `left..right`.
    pub fn hit_test(&self, x: f64, left: f64, right: f64) -> Option<ClipHit> {
        if x < left || x > right {
            return None;
        }
        // Narrow clips keep a grabbable body in the middle.
        let edge = self.edge_resize_threshold.min((right - left) / 3.0);
        if x - left <= edge {
            Some(ClipHit::Edge(ResizeEdge::Left))
        } else if right - x <= edge {
            Some(ClipHit::Edge(ResizeEdge::Right))
        } else {
            Some(ClipHit::Body)
        }
    }
}

/// Tells single clicks from double clicks by timing and travel.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_click: Option<(f64, Pointer)>,
}

impl ClickTracker {
    pub fn register(&mut self, now_ms: f64, pos: Pointer, config: &GestureConfig) -> ClickKind {
        if let Some((at, last_pos)) = self.last_click
            && now_ms - at <= config.double_click_max_interval
            && pos.distance(last_pos) <= config.double_click_max_distance
        {
            self.last_click = None;
            return ClickKind::Double;
        }
        self.last_click = Some((now_ms, pos));
        ClickKind::Single
    }
}
