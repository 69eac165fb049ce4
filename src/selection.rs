use serde::{Deserialize, Serialize};

use crate::model::{ClipId, TrackId};

/// Selected tracks and clips. Only one kind is selected at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    tracks: Vec<TrackId>,
    clips: Vec<ClipId>,
}

impl Selection {
    pub fn tracks(&self) -> &[TrackId] {
        &self.tracks
    }

    pub fn clips(&self) -> &[ClipId] {
        &self.clips
    }

    pub fn is_track_selected(&self, id: TrackId) -> bool {
        self.tracks.contains(&id)
    }

    pub fn is_clip_selected(&self, id: ClipId) -> bool {
        self.clips.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.clips.is_empty()
    }

    /// Most recently selected clip
    pub fn primary_clip(&self) -> Option<ClipId> {
        self.clips.last().copied()
    }

    pub fn select_track(&mut self, id: TrackId, multi: bool) {
        self.clips.clear();
        if multi {
            if !self.tracks.contains(&id) {
                self.tracks.push(id);
            }
        } else {
            self.tracks.clear();
            self.tracks.push(id);
        }
    }

    pub fn select_clip(&mut self, id: ClipId, multi: bool) {
        self.tracks.clear();
        if multi {
            if !self.clips.contains(&id) {
                self.clips.push(id);
            }
        } else {
            self.clips.clear();
            self.clips.push(id);
        }
    }

    pub fn deselect_track(&mut self, id: TrackId) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| *t != id);
        before != self.tracks.len()
    }

    pub fn deselect_clip(&mut self, id: ClipId) -> bool {
        let before = self.clips.len();
        self.clips.retain(|c| *c != id);
        before != self.clips.len()
    }

    pub fn clear_tracks(&mut self) {
        self.tracks.clear();
    }

    pub fn clear_clips(&mut self) {
        self.clips.clear();
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.clips.clear();
    }
}
