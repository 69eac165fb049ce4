use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GROUP_NAME, DEFAULT_TRACK_COLOR, DEFAULT_TRACK_NAME, TRACK_HEIGHT};

use super::clip::ClipId;
use super::group::group_color;

pub type TrackId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    #[default]
    Midi,
    Audio,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: TrackId,
    pub name: String,
    pub track_type: TrackType,
    /// Dense 0-indexed position among tracks sharing the same `group_id`.
    pub position: usize,
    pub color: String,
    pub muted: bool,
    pub solo: bool,
    pub height: f64,
    pub group_id: Option<TrackId>,
    pub is_group: bool,
    pub clips: Vec<ClipId>,
    #[serde(default)]
    pub context: String,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            id: 0,
            name: DEFAULT_TRACK_NAME.to_string(),
            track_type: TrackType::Midi,
            position: 0,
            color: DEFAULT_TRACK_COLOR.to_string(),
            muted: false,
            solo: false,
            height: TRACK_HEIGHT,
            group_id: None,
            is_group: false,
            clips: Vec::new(),
            context: String::new(),
        }
    }
}

/// Input for `TimelineStore::add_track`. Unset fields fall back to `Track::default()`.
#[derive(Debug, Clone, Default)]
pub struct TrackBuilder {
    name: Option<String>,
    track_type: TrackType,
    color: Option<String>,
    height: Option<f64>,
    group_id: Option<TrackId>,
    is_group: bool,
    context: Option<String>,
}

impl TrackBuilder {
    pub fn new(track_type: TrackType) -> Self {
        Self {
            track_type,
            ..Default::default()
        }
    }

    pub fn group() -> Self {
        Self {
            is_group: true,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn in_group(mut self, group_id: TrackId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn group_id(&self) -> Option<TrackId> {
        self.group_id
    }

    pub fn is_group(&self) -> bool {
        self.is_group
    }

    /// Id and position are assigned by the store. Groups without an explicit
    /// color take one from the palette.
    pub fn build(self, id: TrackId, position: usize) -> Track {
        let defaults = Track::default();
        let (name, color) = if self.is_group {
            (
                self.name.unwrap_or_else(|| DEFAULT_GROUP_NAME.to_string()),
                self.color.unwrap_or_else(|| group_color(id).to_string()),
            )
        } else {
            (
                self.name.unwrap_or(defaults.name.clone()),
                self.color.unwrap_or(defaults.color.clone()),
            )
        };
        Track {
            id,
            name,
            track_type: self.track_type,
            position,
            color,
            height: self.height.unwrap_or(defaults.height),
            group_id: if self.is_group { None } else { self.group_id },
            is_group: self.is_group,
            context: self.context.unwrap_or_default(),
            ..defaults
        }
    }
}

/// Partial update merged into an existing track.
///
/// Structural fields (`position`, `group_id`, `clips`) are changed through
/// dedicated store operations instead.
#[derive(Debug, Clone, Default)]
pub struct TrackPatch {
    pub name: Option<String>,
    pub track_type: Option<TrackType>,
    pub color: Option<String>,
    pub muted: Option<bool>,
    pub solo: Option<bool>,
    pub height: Option<f64>,
    pub context: Option<String>,
}

impl TrackPatch {
    pub fn apply(self, track: &mut Track) {
        if let Some(name) = self.name {
            track.name = name;
        }
        if let Some(track_type) = self.track_type {
            track.track_type = track_type;
        }
        if let Some(color) = self.color {
            track.color = color;
        }
        if let Some(muted) = self.muted {
            track.muted = muted;
        }
        if let Some(solo) = self.solo {
            track.solo = solo;
        }
        if let Some(height) = self.height {
            track.height = height;
        }
        if let Some(context) = self.context {
            track.context = context;
        }
    }
}
