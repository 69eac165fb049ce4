use crate::constants::DEFAULT_CLIP_LEN;
use crate::error::{Result, TimelineError};
use crate::grid::GridSnap;
use crate::model::{ClipBuilder, ClipId, TrackId};
use crate::store::TimelineStore;
use crate::view::TimelineView;

use super::gestures::{
    ClickKind, ClickTracker, ClipHit, GestureConfig, Modifiers, Pointer, ResizeEdge,
};

/// What an active pointer gesture is doing, with the values captured at pointer-down.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineInteraction {
    DragClip {
        clip_id: ClipId,
        initial_start: f64,
        initial_track: TrackId,
    },
    ResizeClipLeft {
        clip_id: ClipId,
        original_start: f64,
        original_end_beat: f64,
    },
    ResizeClipRight {
        clip_id: ClipId,
        original_duration: f64,
    },
}

/// A gesture in progress. Ends when consumed by `on_end`.
#[derive(Debug)]
pub struct GestureSession {
    interaction: TimelineInteraction,
    origin: Pointer,
    grid: GridSnap,
    config: GestureConfig,
}

impl GestureSession {
    pub fn interaction(&self) -> &TimelineInteraction {
        &self.interaction
    }

    pub fn clip_id(&self) -> ClipId {
        match self.interaction {
            TimelineInteraction::DragClip { clip_id, .. }
            | TimelineInteraction::ResizeClipLeft { clip_id, .. }
            | TimelineInteraction::ResizeClipRight { clip_id, .. } => clip_id,
        }
    }

    /// Apply the pointer position to the store.
    ///
    /// Returns `Ok(false)` when the move was ignored, e.g. a left resize that
    /// would make the clip too short.
    pub fn on_move(
        &self,
        store: &mut TimelineStore,
        view: &TimelineView,
        pointer: Pointer,
    ) -> Result<bool> {
        let delta_beat = view.pixel_to_beat(pointer.x - self.origin.x);
        let min_len = self.grid.min_length(store.min_clip_duration());

        match self.interaction {
            TimelineInteraction::DragClip {
                clip_id,
                initial_start,
                initial_track,
            } => {
                let new_start = self.grid.snap(initial_start + delta_beat).max(0.0);
                let target = self.target_track(store, initial_track, pointer.y - self.origin.y);
                store.move_clip(clip_id, new_start, target)?;
                Ok(true)
            }
            TimelineInteraction::ResizeClipRight {
                clip_id,
                original_duration,
            } => {
                let new_duration = self.grid.snap(original_duration + delta_beat).max(min_len);
                store.resize_clip(clip_id, new_duration)?;
                Ok(true)
            }
            TimelineInteraction::ResizeClipLeft {
                clip_id,
                original_start,
                original_end_beat,
            } => {
                let new_start = self.grid.snap(original_start + delta_beat).max(0.0);
                let new_duration = original_end_beat - new_start;
                if new_duration < min_len {
                    if store.clip(clip_id).is_none() {
                        return Err(TimelineError::ClipNotFound(clip_id));
                    }
                    return Ok(false);
                }
                store.set_clip_span(clip_id, new_start, new_duration)?;
                Ok(true)
            }
        }
    }

    /// Finish the gesture. Returns the clip it acted on.
    pub fn on_end(self) -> ClipId {
        log::debug!("Gesture ended: {:?}", self.interaction);
        self.clip_id()
    }

    /// Track under the pointer once vertical travel passes the threshold.
    /// `None` keeps the clip on its current track.
    fn target_track(&self, store: &TimelineStore, initial: TrackId, dy: f64) -> Option<TrackId> {
        if dy.abs() <= self.config.drag_track_threshold {
            return Some(initial).filter(|t| store.track(*t).is_some());
        }
        let order = store.display_order();
        let start = order.iter().position(|t| *t == initial)?;
        let index = (dy / self.config.track_height).floor() as i64 + start as i64;
        if index < 0 {
            return Some(initial);
        }
        order.get(index as usize).copied().or(Some(initial))
    }
}

/// Turns pointer input on the timeline into store edits.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    pub grid: GridSnap,
    pub config: GestureConfig,
    clicks: ClickTracker,
}

impl InteractionController {
    pub fn new(grid: GridSnap, config: GestureConfig) -> Self {
        Self {
            grid,
            config,
            clicks: ClickTracker::default(),
        }
    }

    fn session(&self, interaction: TimelineInteraction, origin: Pointer) -> GestureSession {
        log::debug!("Gesture started: {:?}", interaction);
        GestureSession {
            interaction,
            origin,
            grid: self.grid,
            config: self.config,
        }
    }

    /// Select the clip (shift adds to the selection) and start moving it.
    pub fn begin_drag(
        &self,
        store: &mut TimelineStore,
        clip_id: ClipId,
        pointer: Pointer,
        modifiers: Modifiers,
    ) -> Result<GestureSession> {
        let Some(clip) = store.clip(clip_id) else {
            return Err(TimelineError::ClipNotFound(clip_id));
        };
        let interaction = TimelineInteraction::DragClip {
            clip_id,
            initial_start: clip.start_time,
            initial_track: clip.track_id,
        };
        store.select_clip(clip_id, modifiers.shift)?;
        Ok(self.session(interaction, pointer))
    }

    pub fn begin_resize(
        &self,
        store: &TimelineStore,
        clip_id: ClipId,
        edge: ResizeEdge,
        pointer: Pointer,
    ) -> Result<GestureSession> {
        let Some(clip) = store.clip(clip_id) else {
            return Err(TimelineError::ClipNotFound(clip_id));
        };
        let interaction = match edge {
            ResizeEdge::Left => TimelineInteraction::ResizeClipLeft {
                clip_id,
                original_start: clip.start_time,
                original_end_beat: clip.end_time(),
            },
            ResizeEdge::Right => TimelineInteraction::ResizeClipRight {
                clip_id,
                original_duration: clip.duration,
            },
        };
        Ok(self.session(interaction, pointer))
    }

    /// Start whichever gesture the pointer lands on: a resize near either
    /// edge, otherwise a drag.
    pub fn begin_at(
        &self,
        store: &mut TimelineStore,
        view: &TimelineView,
        clip_id: ClipId,
        pointer: Pointer,
        container_left: f64,
        modifiers: Modifiers,
    ) -> Result<GestureSession> {
        let Some(clip) = store.clip(clip_id) else {
            return Err(TimelineError::ClipNotFound(clip_id));
        };
        let left = view.beat_to_pixel(clip.start_time);
        let right = view.beat_to_pixel(clip.end_time());
        let x = pointer.x - container_left + view.horizontal_scroll();
        match self.config.hit_test(x, left, right) {
            Some(ClipHit::Edge(edge)) => self.begin_resize(store, clip_id, edge, pointer),
            _ => self.begin_drag(store, clip_id, pointer, modifiers),
        }
    }

    /// Click on empty track space. A single click clears the selection; a
    /// double click creates a clip there and returns its id.
    pub fn click_empty(
        &mut self,
        store: &mut TimelineStore,
        view: &TimelineView,
        track_id: TrackId,
        pointer: Pointer,
        container_left: f64,
        now_ms: f64,
    ) -> Result<Option<ClipId>> {
        match self.clicks.register(now_ms, pointer, &self.config) {
            ClickKind::Single => {
                store.clear_selection();
                Ok(None)
            }
            ClickKind::Double => self
                .create_clip_at(store, view, track_id, pointer.x, container_left)
                .map(Some),
        }
    }

    /// Create a default-length clip at the snapped beat under `client_x` and select it.
    pub fn create_clip_at(
        &self,
        store: &mut TimelineStore,
        view: &TimelineView,
        track_id: TrackId,
        client_x: f64,
        container_left: f64,
    ) -> Result<ClipId> {
        let beat = self
            .grid
            .snap(view.beat_at(client_x, container_left))
            .max(0.0);
        let clip_id = store.add_clip(
            ClipBuilder::new(track_id)
                .at(beat)
                .with_duration(DEFAULT_CLIP_LEN),
        )?;
        store.select_clip(clip_id, false)?;
        Ok(clip_id)
    }

    /// Remove every selected clip. Returns how many were removed.
    pub fn delete_selected(&self, store: &mut TimelineStore) -> usize {
        let selected = store.selection().clips().to_vec();
        selected
            .into_iter()
            .filter(|id| store.remove_clip(*id).is_ok())
            .count()
    }
}
