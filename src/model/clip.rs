use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CLIP_LEN;

use super::track::TrackId;

pub type ClipId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    #[default]
    Idle,
    Processing,
    Complete,
    Error,
}

/// A time-bounded prompt placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default)]
    pub id: ClipId,
    pub track_id: TrackId,
    pub start_time: f64,
    pub duration: f64,
    pub content: String,
    pub status: ClipStatus,
    pub output: Option<serde_json::Value>,
    /// Clips whose output this clip consumes.
    #[serde(default)]
    pub dependencies: Vec<ClipId>,
    /// Clips consuming this clip's output.
    #[serde(default)]
    pub output_refs: Vec<ClipId>,
    pub context: Option<String>,
    /// Bumped on every mutation; lets background work detect stale results.
    #[serde(skip)]
    pub revision: u64,
}

impl Clip {
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    #[inline]
    pub fn contains(&self, beat: f64) -> bool {
        beat > self.start_time && beat < self.end_time()
    }
}

#[derive(Debug, Clone)]
pub struct ClipBuilder {
    track_id: TrackId,
    start_time: f64,
    duration: f64,
    content: String,
    context: Option<String>,
}

impl ClipBuilder {
    pub fn new(track_id: TrackId) -> Self {
        Self {
            track_id,
            start_time: 0.0,
            duration: DEFAULT_CLIP_LEN,
            content: String::new(),
            context: None,
        }
    }

    pub fn at(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Clamps start to zero and duration to `min_duration`.
    pub fn build(self, id: ClipId, min_duration: f64) -> Clip {
        Clip {
            id,
            track_id: self.track_id,
            start_time: self.start_time.max(0.0),
            duration: self.duration.max(min_duration),
            content: self.content,
            status: ClipStatus::Idle,
            output: None,
            dependencies: Vec::new(),
            output_refs: Vec::new(),
            context: self.context,
            revision: 0,
        }
    }
}

/// Partial update for content-level fields. Timing goes through move/resize.
#[derive(Debug, Clone, Default)]
pub struct ClipPatch {
    pub content: Option<String>,
    pub status: Option<ClipStatus>,
    pub output: Option<Option<serde_json::Value>>,
    pub context: Option<Option<String>>,
}

impl ClipPatch {
    pub fn apply(self, clip: &mut Clip) {
        if let Some(content) = self.content {
            clip.content = content;
        }
        if let Some(status) = self.status {
            clip.status = status;
        }
        if let Some(output) = self.output {
            clip.output = output;
        }
        if let Some(context) = self.context {
            clip.context = context;
        }
    }
}
