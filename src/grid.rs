use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GRID_SNAP;
use crate::time_utils::quantize_to_grid;

/// Snapping quantum applied to drag, resize and clip creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSnap {
    pub enabled: bool,
    pub grid_size: f64,
}

impl Default for GridSnap {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_size: DEFAULT_GRID_SNAP,
        }
    }
}

impl GridSnap {
    pub fn new(grid_size: f64) -> Self {
        Self {
            enabled: true,
            grid_size,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    #[inline]
    pub fn snap(&self, beat: f64) -> f64 {
        if self.enabled {
            quantize_to_grid(beat, self.grid_size)
        } else {
            beat
        }
    }

    /// Smallest length a gesture may produce, never less than `floor`.
    pub fn min_length(&self, floor: f64) -> f64 {
        if self.enabled && self.grid_size > 0.0 {
            self.grid_size.max(floor)
        } else {
            floor
        }
    }
}
