use std::collections::BTreeMap;

use crossbeam_channel::{Receiver, Sender};

use crate::constants::MIN_CLIP_DURATION;
use crate::error::{Result, TimelineError};
use crate::idgen::IdGen;
use crate::messages::StoreEvent;
use crate::model::{
    Clip, ClipBuilder, ClipId, ClipPatch, ClipStatus, ContextLevel, ContextScope, Track,
    TrackBuilder, TrackId, TrackPatch,
};
use crate::project::{ProjectInfo, ProjectSnapshot};
use crate::selection::Selection;
use crate::transport::{PlaybackClock, Transport};

fn reject<T>(err: TimelineError) -> Result<T> {
    log::warn!("Rejected timeline edit: {}", err);
    Err(err)
}

/// Authoritative owner of tracks, clips, selection and transport.
///
/// Every mutation either applies completely or returns an error and leaves
/// the store untouched.
pub struct TimelineStore {
    project: ProjectInfo,
    tracks: BTreeMap<TrackId, Track>,
    clips: BTreeMap<ClipId, Clip>,
    selection: Selection,
    transport: Transport,
    ids: IdGen,
    min_clip_duration: f64,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineStore {
    pub fn new() -> Self {
        Self {
            project: ProjectInfo::default(),
            tracks: BTreeMap::new(),
            clips: BTreeMap::new(),
            selection: Selection::default(),
            transport: Transport::default(),
            ids: IdGen::new(),
            min_clip_duration: MIN_CLIP_DURATION,
            subscribers: Vec::new(),
        }
    }

    pub fn with_min_clip_duration(mut self, min: f64) -> Self {
        if min > 0.0 {
            self.min_clip_duration = min;
        }
        self
    }

    /// Register a listener. Dropped receivers are pruned on the next event.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn changed(&mut self, event: StoreEvent) {
        self.project.touch();
        self.emit(event);
    }

    // Queries

    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    pub fn min_clip_duration(&self) -> f64 {
        self.min_clip_duration
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(&id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.clips.values()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Clips on a track ordered by start time.
    pub fn clips_on_track(&self, track_id: TrackId) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self
            .tracks
            .get(&track_id)
            .map(|t| t.clips.iter().filter_map(|id| self.clips.get(id)).collect())
            .unwrap_or_default();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }

    /// Tracks sharing `parent`, ordered by position.
    pub fn siblings(&self, parent: Option<TrackId>) -> Vec<TrackId> {
        let mut ids: Vec<&Track> = self
            .tracks
            .values()
            .filter(|t| t.group_id == parent)
            .collect();
        ids.sort_by_key(|t| t.position);
        ids.into_iter().map(|t| t.id).collect()
    }

    /// Top-level tracks by position, each group followed by its members.
    pub fn display_order(&self) -> Vec<TrackId> {
        let mut order = Vec::with_capacity(self.tracks.len());
        for id in self.siblings(None) {
            order.push(id);
            if self.tracks.get(&id).is_some_and(|t| t.is_group) {
                order.extend(self.siblings(Some(id)));
            }
        }
        order
    }

    // Tracks

    pub fn add_track(&mut self, builder: TrackBuilder) -> Result<TrackId> {
        let parent = if builder.is_group() {
            None
        } else {
            builder.group_id()
        };
        if let Some(group_id) = parent {
            self.require_group(group_id)?;
        }

        let id = self.ids.next();
        let position = self.siblings(parent).len();
        let track = builder.build(id, position);
        log::debug!("Adding track {} '{}' at position {}", id, track.name, position);
        self.tracks.insert(id, track);
        self.changed(StoreEvent::TrackAdded(id));
        Ok(id)
    }

    pub fn create_group(&mut self, name: impl Into<String>) -> Result<TrackId> {
        self.add_track(TrackBuilder::group().with_name(name))
    }

    pub fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        let Some(track) = self.tracks.remove(&id) else {
            return reject(TimelineError::TrackNotFound(id));
        };
        log::debug!("Removing track {} with {} clips", id, track.clips.len());

        for clip_id in &track.clips {
            self.detach_clip(*clip_id);
        }
        self.selection.deselect_track(id);
        self.reindex(track.group_id);

        if track.is_group {
            // Members move to the end of the top level, keeping their order.
            let members = self.siblings(Some(id));
            let mut next = self.siblings(None).len();
            for member in members {
                if let Some(t) = self.tracks.get_mut(&member) {
                    t.group_id = None;
                    t.position = next;
                    next += 1;
                }
            }
        }

        self.changed(StoreEvent::TrackRemoved(id));
        Ok(track)
    }

    pub fn update_track(&mut self, id: TrackId, patch: TrackPatch) -> Result<()> {
        let Some(track) = self.tracks.get_mut(&id) else {
            return reject(TimelineError::TrackNotFound(id));
        };
        patch.apply(track);
        self.changed(StoreEvent::TrackUpdated(id));
        Ok(())
    }

    /// Place a track at `new_position` among its siblings and renumber them densely.
    pub fn move_track(&mut self, id: TrackId, new_position: usize) -> Result<()> {
        let Some(parent) = self.tracks.get(&id).map(|t| t.group_id) else {
            return reject(TimelineError::TrackNotFound(id));
        };
        let mut order: Vec<TrackId> = self
            .siblings(parent)
            .into_iter()
            .filter(|t| *t != id)
            .collect();
        order.insert(new_position.min(order.len()), id);
        self.apply_order(&order);
        self.changed(StoreEvent::TracksReordered(parent));
        Ok(())
    }

    pub fn add_to_group(&mut self, track_id: TrackId, group_id: TrackId) -> Result<()> {
        self.require_group(group_id)?;
        let Some(track) = self.tracks.get(&track_id) else {
            return reject(TimelineError::TrackNotFound(track_id));
        };
        if track.is_group {
            return reject(TimelineError::InvalidGroup(track_id));
        }
        let old_parent = track.group_id;
        if old_parent == Some(group_id) {
            return Ok(());
        }
        self.reparent(track_id, Some(group_id), old_parent);
        Ok(())
    }

    pub fn remove_from_group(&mut self, track_id: TrackId) -> Result<()> {
        let Some(track) = self.tracks.get(&track_id) else {
            return reject(TimelineError::TrackNotFound(track_id));
        };
        if let Some(old_parent) = track.group_id {
            self.reparent(track_id, None, Some(old_parent));
        }
        Ok(())
    }

    fn reparent(&mut self, track_id: TrackId, parent: Option<TrackId>, old: Option<TrackId>) {
        let position = self.siblings(parent).len();
        if let Some(t) = self.tracks.get_mut(&track_id) {
            t.group_id = parent;
            t.position = position;
        }
        self.reindex(old);
        self.changed(StoreEvent::TrackUpdated(track_id));
        self.emit(StoreEvent::TracksReordered(old));
    }

    fn require_group(&self, group_id: TrackId) -> Result<()> {
        match self.tracks.get(&group_id) {
            Some(g) if g.is_group => Ok(()),
            Some(_) => reject(TimelineError::InvalidGroup(group_id)),
            None => reject(TimelineError::TrackNotFound(group_id)),
        }
    }

    fn reindex(&mut self, parent: Option<TrackId>) {
        let order = self.siblings(parent);
        self.apply_order(&order);
    }

    fn apply_order(&mut self, order: &[TrackId]) {
        for (position, id) in order.iter().enumerate() {
            if let Some(t) = self.tracks.get_mut(id) {
                t.position = position;
            }
        }
    }

    // Clips

    pub fn add_clip(&mut self, builder: ClipBuilder) -> Result<ClipId> {
        let track_id = builder.track_id();
        if !self.tracks.contains_key(&track_id) {
            return reject(TimelineError::TrackNotFound(track_id));
        }
        let id = self.ids.next();
        let clip = builder.build(id, self.min_clip_duration);
        log::debug!(
            "Adding clip {} on track {} at {} for {} beats",
            id,
            track_id,
            clip.start_time,
            clip.duration
        );
        self.clips.insert(id, clip);
        if let Some(track) = self.tracks.get_mut(&track_id) {
            track.clips.push(id);
        }
        self.changed(StoreEvent::ClipAdded(id));
        Ok(id)
    }

    pub fn update_clip(&mut self, id: ClipId, patch: ClipPatch) -> Result<()> {
        let Some(clip) = self.clips.get_mut(&id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        patch.apply(clip);
        clip.revision += 1;
        self.changed(StoreEvent::ClipUpdated(id));
        Ok(())
    }

    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip> {
        let Some(clip) = self.clips.get(&id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        let track_id = clip.track_id;
        if let Some(track) = self.tracks.get_mut(&track_id) {
            track.clips.retain(|c| *c != id);
        }
        let Some(clip) = self.detach_clip(id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        log::debug!("Removed clip {} from track {}", id, track_id);
        self.changed(StoreEvent::ClipRemoved(id));
        Ok(clip)
    }

    /// Drop a clip from the table, selection and every dependency list.
    /// The owning track's `clips` is left to the caller.
    fn detach_clip(&mut self, id: ClipId) -> Option<Clip> {
        let clip = self.clips.remove(&id)?;
        self.selection.deselect_clip(id);
        for other in self.clips.values_mut() {
            other.dependencies.retain(|c| *c != id);
            other.output_refs.retain(|c| *c != id);
        }
        Some(clip)
    }

    /// Move a clip in time and optionally onto another track.
    pub fn move_clip(
        &mut self,
        id: ClipId,
        new_start: f64,
        new_track: Option<TrackId>,
    ) -> Result<()> {
        let Some(from_track) = self.clips.get(&id).map(|c| c.track_id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        let to_track = new_track.unwrap_or(from_track);
        if !self.tracks.contains_key(&to_track) {
            return reject(TimelineError::TrackNotFound(to_track));
        }

        if to_track != from_track {
            if let Some(t) = self.tracks.get_mut(&from_track) {
                t.clips.retain(|c| *c != id);
            }
            if let Some(t) = self.tracks.get_mut(&to_track) {
                t.clips.push(id);
            }
        }
        if let Some(clip) = self.clips.get_mut(&id) {
            clip.start_time = new_start.max(0.0);
            clip.track_id = to_track;
            clip.revision += 1;
        }

        if to_track != from_track {
            log::debug!("Moved clip {} from track {} to {}", id, from_track, to_track);
            self.changed(StoreEvent::ClipMoved {
                clip_id: id,
                from_track,
                to_track,
            });
        } else {
            self.changed(StoreEvent::ClipUpdated(id));
        }
        Ok(())
    }

    /// Change duration only. Floors at the minimum clip duration.
    pub fn resize_clip(&mut self, id: ClipId, new_duration: f64) -> Result<()> {
        let min = self.min_clip_duration;
        let Some(clip) = self.clips.get_mut(&id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        clip.duration = new_duration.max(min);
        clip.revision += 1;
        self.changed(StoreEvent::ClipUpdated(id));
        Ok(())
    }

    /// Set start and duration together, as a left-edge resize does.
    pub fn set_clip_span(&mut self, id: ClipId, start: f64, duration: f64) -> Result<()> {
        let min = self.min_clip_duration;
        let Some(clip) = self.clips.get_mut(&id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        clip.start_time = start.max(0.0);
        clip.duration = duration.max(min);
        clip.revision += 1;
        self.changed(StoreEvent::ClipUpdated(id));
        Ok(())
    }

    /// Cut a clip in two at `at`. Both halves must be at least the minimum
    /// clip duration. Returns the id of the new right-hand clip.
    pub fn split_clip(&mut self, id: ClipId, at: f64) -> Result<ClipId> {
        let Some(original) = self.clips.get(&id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        let min = self.min_clip_duration;
        if !original.contains(at)
            || at - original.start_time < min
            || original.end_time() - at < min
        {
            return reject(TimelineError::SplitOutOfRange { clip_id: id, at });
        }

        let new_id = self.ids.next();
        let second = Clip {
            id: new_id,
            track_id: original.track_id,
            start_time: at,
            duration: original.end_time() - at,
            content: original.content.clone(),
            status: ClipStatus::Idle,
            output: None,
            dependencies: Vec::new(),
            output_refs: Vec::new(),
            context: original.context.clone(),
            revision: 0,
        };
        let track_id = second.track_id;

        if let Some(first) = self.clips.get_mut(&id) {
            first.duration = at - first.start_time;
            first.revision += 1;
        }
        self.clips.insert(new_id, second);
        if let Some(track) = self.tracks.get_mut(&track_id) {
            let index = track
                .clips
                .iter()
                .position(|c| *c == id)
                .map_or(track.clips.len(), |i| i + 1);
            track.clips.insert(index, new_id);
        }

        log::debug!("Split clip {} at {} into {}", id, at, new_id);
        self.changed(StoreEvent::ClipUpdated(id));
        self.emit(StoreEvent::ClipAdded(new_id));
        Ok(new_id)
    }

    /// Copy a clip and place the copy right after it on the same track.
    pub fn duplicate_clip(&mut self, id: ClipId) -> Result<ClipId> {
        let Some(source) = self.clips.get(&id) else {
            return reject(TimelineError::ClipNotFound(id));
        };
        let mut builder = ClipBuilder::new(source.track_id)
            .at(source.end_time())
            .with_duration(source.duration)
            .with_content(source.content.clone());
        if let Some(context) = &source.context {
            builder = builder.with_context(context.clone());
        }
        self.add_clip(builder)
    }

    /// Record that `clip_id` consumes the output of `depends_on`.
    pub fn add_dependency(&mut self, clip_id: ClipId, depends_on: ClipId) -> Result<()> {
        for id in [clip_id, depends_on] {
            if !self.clips.contains_key(&id) {
                return reject(TimelineError::ClipNotFound(id));
            }
        }
        if clip_id == depends_on || self.depends_transitively(depends_on, clip_id) {
            return reject(TimelineError::InvalidDependency {
                clip_id,
                depends_on,
            });
        }

        if let Some(clip) = self.clips.get_mut(&clip_id)
            && !clip.dependencies.contains(&depends_on)
        {
            clip.dependencies.push(depends_on);
        }
        if let Some(source) = self.clips.get_mut(&depends_on)
            && !source.output_refs.contains(&clip_id)
        {
            source.output_refs.push(clip_id);
        }
        self.changed(StoreEvent::ClipUpdated(clip_id));
        self.emit(StoreEvent::ClipUpdated(depends_on));
        Ok(())
    }

    /// Returns whether a dependency existed.
    pub fn remove_dependency(&mut self, clip_id: ClipId, depends_on: ClipId) -> Result<bool> {
        let Some(clip) = self.clips.get_mut(&clip_id) else {
            return reject(TimelineError::ClipNotFound(clip_id));
        };
        let before = clip.dependencies.len();
        clip.dependencies.retain(|c| *c != depends_on);
        let existed = before != clip.dependencies.len();
        if let Some(source) = self.clips.get_mut(&depends_on) {
            source.output_refs.retain(|c| *c != clip_id);
        }
        if existed {
            self.changed(StoreEvent::ClipUpdated(clip_id));
        }
        Ok(existed)
    }

    fn depends_transitively(&self, from: ClipId, target: ClipId) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if let Some(clip) = self.clips.get(&id) {
                stack.extend(clip.dependencies.iter().copied());
            }
        }
        false
    }

    /// Context layers feeding a clip, from project down to the clip itself.
    pub fn aggregated_context(&self, clip_id: ClipId) -> Result<Vec<ContextLevel>> {
        let Some(clip) = self.clips.get(&clip_id) else {
            return Err(TimelineError::ClipNotFound(clip_id));
        };
        let track = self.tracks.get(&clip.track_id);
        let group = track
            .and_then(|t| t.group_id)
            .and_then(|g| self.tracks.get(&g));

        let level = |scope, target_id, content: &str| ContextLevel {
            scope,
            target_id,
            content: content.to_string(),
            enabled: !content.trim().is_empty(),
        };
        let mut levels = vec![level(ContextScope::Project, None, &self.project.global_context)];
        if let Some(g) = group {
            levels.push(level(ContextScope::Group, Some(g.id), &g.context));
        }
        if let Some(t) = track {
            levels.push(level(ContextScope::Track, Some(t.id), &t.context));
        }
        levels.push(level(
            ContextScope::Clip,
            Some(clip_id),
            clip.context.as_deref().unwrap_or_default(),
        ));
        Ok(levels)
    }

    pub fn set_global_context(&mut self, context: impl Into<String>) {
        self.project.global_context = context.into();
        self.project.touch();
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project.name = name.into();
        self.project.touch();
    }

    // Selection

    pub fn select_track(&mut self, id: TrackId, multi: bool) -> Result<()> {
        if !self.tracks.contains_key(&id) {
            return reject(TimelineError::TrackNotFound(id));
        }
        self.selection.select_track(id, multi);
        self.emit(StoreEvent::SelectionChanged);
        Ok(())
    }

    pub fn select_clip(&mut self, id: ClipId, multi: bool) -> Result<()> {
        if !self.clips.contains_key(&id) {
            return reject(TimelineError::ClipNotFound(id));
        }
        self.selection.select_clip(id, multi);
        self.emit(StoreEvent::SelectionChanged);
        Ok(())
    }

    pub fn deselect_track(&mut self, id: TrackId) {
        if self.selection.deselect_track(id) {
            self.emit(StoreEvent::SelectionChanged);
        }
    }

    pub fn deselect_clip(&mut self, id: ClipId) {
        if self.selection.deselect_clip(id) {
            self.emit(StoreEvent::SelectionChanged);
        }
    }

    pub fn deselect_all_tracks(&mut self) {
        self.selection.clear_tracks();
        self.emit(StoreEvent::SelectionChanged);
    }

    pub fn deselect_all_clips(&mut self) {
        self.selection.clear_clips();
        self.emit(StoreEvent::SelectionChanged);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.emit(StoreEvent::SelectionChanged);
    }

    // Transport

    pub fn play(&mut self) {
        self.transport.play();
        self.emit(StoreEvent::TransportChanged);
    }

    pub fn stop(&mut self) {
        self.transport.stop();
        self.emit(StoreEvent::TransportChanged);
    }

    pub fn toggle_playback(&mut self) {
        self.transport.toggle_playback();
        self.emit(StoreEvent::TransportChanged);
    }

    pub fn set_playhead(&mut self, beat: f64) {
        self.transport.set_position(beat);
        self.emit(StoreEvent::PlayheadMoved(self.transport.playhead()));
    }

    pub fn rewind(&mut self) {
        self.set_playhead(0.0);
    }

    pub fn fast_forward(&mut self, beats: f64) {
        self.transport.fast_forward(beats);
        self.emit(StoreEvent::PlayheadMoved(self.transport.playhead()));
    }

    pub fn rewind_beats(&mut self, beats: f64) {
        self.transport.rewind_beats(beats);
        self.emit(StoreEvent::PlayheadMoved(self.transport.playhead()));
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.transport.set_tempo(bpm);
        self.emit(StoreEvent::TransportChanged);
    }

    pub fn set_time_signature(&mut self, numerator: u32, denominator: u32) -> Result<()> {
        if let Err(e) = self.transport.set_time_signature(numerator, denominator) {
            return reject(e);
        }
        self.emit(StoreEvent::TransportChanged);
        Ok(())
    }

    /// Advance the playhead from a host frame timestamp.
    pub fn advance_playback(&mut self, clock: &mut PlaybackClock, now_ms: f64) {
        if clock.tick(now_ms, &mut self.transport).is_some() {
            self.emit(StoreEvent::PlayheadMoved(self.transport.playhead()));
        }
    }

    // Snapshots

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            project: self.project.clone(),
            tracks: self.tracks.values().cloned().collect(),
            clips: self.clips.values().cloned().collect(),
            transport: self.transport.clone(),
        }
    }

    /// Rebuild a store from a snapshot, rejecting inconsistent data.
    pub fn from_snapshot(snapshot: ProjectSnapshot) -> Result<Self> {
        let mut store = Self::new();
        let max_id = snapshot
            .tracks
            .iter()
            .map(|t| t.id)
            .chain(snapshot.clips.iter().map(|c| c.id))
            .max()
            .unwrap_or(0);
        store.ids.seed_from_max(max_id);
        store.project = snapshot.project;
        store.transport = snapshot.transport.validated()?;
        store.tracks = snapshot.tracks.into_iter().map(|t| (t.id, t)).collect();
        store.clips = snapshot.clips.into_iter().map(|c| (c.id, c)).collect();
        store
            .check_invariants()
            .map_err(TimelineError::InvalidSnapshot)?;
        Ok(store)
    }

    /// Verify the structural invariants linking tracks, clips and selection.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut parents: Vec<Option<TrackId>> = vec![None];
        for track in self.tracks.values() {
            if let Some(g) = track.group_id {
                if track.is_group {
                    return Err(format!("group {} is nested", track.id));
                }
                match self.tracks.get(&g) {
                    Some(parent) if parent.is_group => {}
                    _ => return Err(format!("track {} has invalid group {}", track.id, g)),
                }
            }
            if track.is_group {
                parents.push(Some(track.id));
            }
            for (i, clip_id) in track.clips.iter().enumerate() {
                if track.clips[..i].contains(clip_id) {
                    return Err(format!("clip {} listed twice on track {}", clip_id, track.id));
                }
                match self.clips.get(clip_id) {
                    Some(c) if c.track_id == track.id => {}
                    _ => return Err(format!("track {} lists foreign clip {}", track.id, clip_id)),
                }
            }
        }
        for parent in parents {
            for (expected, id) in self.siblings(parent).iter().enumerate() {
                if self.tracks.get(id).map(|t| t.position) != Some(expected) {
                    return Err(format!("positions under {:?} are not dense", parent));
                }
            }
        }
        for clip in self.clips.values() {
            let listed = self
                .tracks
                .get(&clip.track_id)
                .is_some_and(|t| t.clips.contains(&clip.id));
            if !listed {
                return Err(format!("clip {} missing from track {}", clip.id, clip.track_id));
            }
            if clip.start_time < 0.0 || clip.duration <= 0.0 {
                return Err(format!("clip {} has an invalid span", clip.id));
            }
            for dep in clip.dependencies.iter().chain(&clip.output_refs) {
                if !self.clips.contains_key(dep) {
                    return Err(format!("clip {} references missing clip {}", clip.id, dep));
                }
            }
        }
        for id in self.selection.tracks() {
            if !self.tracks.contains_key(id) {
                return Err(format!("selected track {} does not exist", id));
            }
        }
        for id in self.selection.clips() {
            if !self.clips.contains_key(id) {
                return Err(format!("selected clip {} does not exist", id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrackType;

    fn store_with_track() -> (TimelineStore, TrackId) {
        let mut store = TimelineStore::new();
        let track = store.add_track(TrackBuilder::new(TrackType::Midi)).unwrap();
        (store, track)
    }

    fn positions(store: &TimelineStore, parent: Option<TrackId>) -> Vec<usize> {
        store
            .siblings(parent)
            .iter()
            .map(|id| store.track(*id).unwrap().position)
            .collect()
    }

    #[test]
    fn test_add_track_appends_position() {
        let mut store = TimelineStore::new();
        let a = store.add_track(TrackBuilder::default()).unwrap();
        let b = store.add_track(TrackBuilder::default()).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.track(a).unwrap().position, 0);
        assert_eq!(store.track(b).unwrap().position, 1);
    }

    #[test]
    fn test_remove_track_cascades_and_reindexes() {
        let mut store = TimelineStore::new();
        let a = store.add_track(TrackBuilder::default()).unwrap();
        let b = store.add_track(TrackBuilder::default()).unwrap();
        let c = store.add_track(TrackBuilder::default()).unwrap();
        let clip = store.add_clip(ClipBuilder::new(b)).unwrap();
        store.select_clip(clip, false).unwrap();

        store.remove_track(b).unwrap();
        assert!(store.clip(clip).is_none());
        assert!(store.selection().clips().is_empty());
        assert_eq!(store.siblings(None), vec![a, c]);
        assert_eq!(positions(&store, None), vec![0, 1]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_missing_track_is_error() {
        let mut store = TimelineStore::new();
        assert_eq!(
            store.remove_track(42).unwrap_err(),
            TimelineError::TrackNotFound(42)
        );
    }

    #[test]
    fn test_move_track_keeps_positions_dense() {
        let mut store = TimelineStore::new();
        let ids: Vec<_> = (0..4)
            .map(|_| store.add_track(TrackBuilder::default()).unwrap())
            .collect();
        store.move_track(ids[3], 0).unwrap();
        assert_eq!(store.siblings(None), vec![ids[3], ids[0], ids[1], ids[2]]);
        store.move_track(ids[3], 99).unwrap();
        assert_eq!(store.siblings(None), vec![ids[0], ids[1], ids[2], ids[3]]);
        assert_eq!(positions(&store, None), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_add_clip_requires_track() {
        let mut store = TimelineStore::new();
        assert_eq!(
            store.add_clip(ClipBuilder::new(9)).unwrap_err(),
            TimelineError::TrackNotFound(9)
        );
        assert_eq!(store.clip_count(), 0);
    }

    #[test]
    fn test_add_and_remove_clip_keep_track_list_in_sync() {
        let (mut store, track) = store_with_track();
        let clip = store
            .add_clip(ClipBuilder::new(track).at(2.0).with_content("pads"))
            .unwrap();
        assert_eq!(store.track(track).unwrap().clips, vec![clip]);
        assert_eq!(store.clip(clip).unwrap().duration, 4.0);

        let removed = store.remove_clip(clip).unwrap();
        assert_eq!(removed.content, "pads");
        assert!(store.track(track).unwrap().clips.is_empty());
        assert!(store.remove_clip(clip).is_err());
    }

    #[test]
    fn test_move_clip_to_missing_track_leaves_state() {
        let (mut store, track) = store_with_track();
        let clip = store.add_clip(ClipBuilder::new(track).at(1.0)).unwrap();
        assert!(store.move_clip(clip, 5.0, Some(77)).is_err());
        assert_eq!(store.clip(clip).unwrap().start_time, 1.0);
        assert_eq!(store.clip(clip).unwrap().track_id, track);
    }

    #[test]
    fn test_move_clip_clamps_start() {
        let (mut store, track) = store_with_track();
        let clip = store.add_clip(ClipBuilder::new(track).at(1.0)).unwrap();
        store.move_clip(clip, -3.0, None).unwrap();
        assert_eq!(store.clip(clip).unwrap().start_time, 0.0);
    }

    #[test]
    fn test_resize_floors_at_one_beat() {
        let (mut store, track) = store_with_track();
        let clip = store.add_clip(ClipBuilder::new(track).at(3.0)).unwrap();
        store.resize_clip(clip, 0.25).unwrap();
        let c = store.clip(clip).unwrap();
        assert_eq!(c.duration, 1.0);
        assert_eq!(c.start_time, 3.0);
    }

    #[test]
    fn test_split_inserts_after_original() {
        let (mut store, track) = store_with_track();
        let a = store
            .add_clip(ClipBuilder::new(track).with_duration(8.0).with_context("ctx"))
            .unwrap();
        let b = store.add_clip(ClipBuilder::new(track).at(10.0)).unwrap();
        let c = store.split_clip(a, 3.0).unwrap();
        assert_eq!(store.track(track).unwrap().clips, vec![a, c, b]);
        let second = store.clip(c).unwrap();
        assert_eq!(second.context.as_deref(), Some("ctx"));
        assert_eq!(second.status, ClipStatus::Idle);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_split_respects_min_duration() {
        let (mut store, track) = store_with_track();
        let a = store
            .add_clip(ClipBuilder::new(track).with_duration(8.0))
            .unwrap();
        let b = store
            .add_clip(ClipBuilder::new(track).at(20.0).with_duration(8.0))
            .unwrap();

        assert_eq!(
            store.split_clip(a, 0.1),
            Err(TimelineError::SplitOutOfRange { clip_id: a, at: 0.1 })
        );
        assert_eq!(
            store.split_clip(b, 27.9),
            Err(TimelineError::SplitOutOfRange { clip_id: b, at: 27.9 })
        );
        assert_eq!(store.clip(a).unwrap().duration, 8.0);
        assert_eq!(store.clip(b).unwrap().duration, 8.0);
        assert_eq!(store.clip_count(), 2);

        // Exactly the minimum on either side is allowed.
        let right = store.split_clip(a, 1.0).unwrap();
        assert_eq!(store.clip(a).unwrap().duration, 1.0);
        let tail = store.split_clip(b, 27.0).unwrap();
        assert_eq!(store.clip(tail).unwrap().duration, 1.0);
        assert_eq!(store.clip(right).unwrap().duration, 7.0);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_duplicate_places_copy_after_source() {
        let (mut store, track) = store_with_track();
        let a = store
            .add_clip(ClipBuilder::new(track).at(2.0).with_duration(3.0).with_content("x"))
            .unwrap();
        let b = store.duplicate_clip(a).unwrap();
        let copy = store.clip(b).unwrap();
        assert_eq!(copy.start_time, 5.0);
        assert_eq!(copy.duration, 3.0);
        assert_eq!(copy.content, "x");
    }

    #[test]
    fn test_dependencies_are_bidirectional_and_cleaned() {
        let (mut store, track) = store_with_track();
        let a = store.add_clip(ClipBuilder::new(track)).unwrap();
        let b = store.add_clip(ClipBuilder::new(track).at(4.0)).unwrap();
        store.add_dependency(b, a).unwrap();
        assert_eq!(store.clip(b).unwrap().dependencies, vec![a]);
        assert_eq!(store.clip(a).unwrap().output_refs, vec![b]);

        assert!(store.add_dependency(a, b).is_err());
        assert!(store.add_dependency(a, a).is_err());

        store.remove_clip(a).unwrap();
        assert!(store.clip(b).unwrap().dependencies.is_empty());
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_dependency() {
        let (mut store, track) = store_with_track();
        let a = store.add_clip(ClipBuilder::new(track)).unwrap();
        let b = store.add_clip(ClipBuilder::new(track)).unwrap();
        store.add_dependency(b, a).unwrap();
        assert!(store.remove_dependency(b, a).unwrap());
        assert!(!store.remove_dependency(b, a).unwrap());
        assert!(store.clip(a).unwrap().output_refs.is_empty());
    }

    #[test]
    fn test_groups_and_display_order() {
        let mut store = TimelineStore::new();
        let lead = store.add_track(TrackBuilder::default()).unwrap();
        let group = store.create_group("Rhythm").unwrap();
        let drums = store
            .add_track(TrackBuilder::default().in_group(group))
            .unwrap();
        let bass = store.add_track(TrackBuilder::default()).unwrap();
        store.add_to_group(bass, group).unwrap();

        assert_eq!(store.display_order(), vec![lead, group, drums, bass]);
        assert_eq!(store.track(bass).unwrap().position, 1);
        store.check_invariants().unwrap();

        store.remove_from_group(drums).unwrap();
        assert_eq!(store.display_order(), vec![lead, group, bass, drums]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_group_rules() {
        let mut store = TimelineStore::new();
        let plain = store.add_track(TrackBuilder::default()).unwrap();
        let group = store.create_group("G").unwrap();
        assert_eq!(
            store.add_track(TrackBuilder::default().in_group(plain)),
            Err(TimelineError::InvalidGroup(plain))
        );
        let other = store.create_group("H").unwrap();
        assert!(store.add_to_group(other, group).is_err());
    }

    #[test]
    fn test_removing_group_ungroups_members() {
        let mut store = TimelineStore::new();
        let group = store.create_group("G").unwrap();
        let a = store.add_track(TrackBuilder::default().in_group(group)).unwrap();
        let b = store.add_track(TrackBuilder::default().in_group(group)).unwrap();
        store.remove_track(group).unwrap();
        assert_eq!(store.siblings(None), vec![a, b]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_select_missing_entity_fails() {
        let mut store = TimelineStore::new();
        assert!(store.select_clip(1, false).is_err());
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_subscribers_receive_events() {
        let mut store = TimelineStore::new();
        let rx = store.subscribe();
        let track = store.add_track(TrackBuilder::default()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::TrackAdded(track));

        drop(rx);
        store.add_track(TrackBuilder::default()).unwrap();
        assert!(store.subscribers.is_empty());
    }

    #[test]
    fn test_aggregated_context_layers() {
        let mut store = TimelineStore::new();
        store.set_global_context("lofi");
        let group = store.create_group("G").unwrap();
        let track = store
            .add_track(TrackBuilder::default().in_group(group).with_context("piano"))
            .unwrap();
        let clip = store
            .add_clip(ClipBuilder::new(track).with_context("sad"))
            .unwrap();
        let levels = store.aggregated_context(clip).unwrap();
        let scopes: Vec<_> = levels.iter().map(|l| l.scope).collect();
        assert_eq!(
            scopes,
            vec![
                ContextScope::Project,
                ContextScope::Group,
                ContextScope::Track,
                ContextScope::Clip
            ]
        );
        assert!(!levels[1].enabled);
        assert_eq!(levels[3].content, "sad");
    }

    #[test]
    fn test_create_group_announces_final_color() {
        let mut store = TimelineStore::new();
        let events = store.subscribe();
        let group = store.create_group("Rhythm").unwrap();

        assert_eq!(events.try_recv(), Ok(StoreEvent::TrackAdded(group)));
        assert!(events.try_recv().is_err());
        let track = store.track(group).unwrap();
        assert_eq!(track.color, crate::model::group_color(group));
        assert_eq!(track.name, "Rhythm");
    }

    #[test]
    fn test_snapshot_restore_keeps_ids_fresh() {
        let (mut store, track) = store_with_track();
        let clip = store.add_clip(ClipBuilder::new(track)).unwrap();
        let json = store.snapshot().to_json().unwrap();

        let mut restored =
            TimelineStore::from_snapshot(ProjectSnapshot::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.clip(clip).unwrap().track_id, track);
        let next = restored.add_clip(ClipBuilder::new(track)).unwrap();
        assert!(next > clip);
    }

    #[test]
    fn test_snapshot_with_dangling_clip_is_rejected() {
        let (mut store, track) = store_with_track();
        store.add_clip(ClipBuilder::new(track)).unwrap();
        let mut snapshot = store.snapshot();
        snapshot.tracks[0].clips.clear();
        assert!(matches!(
            TimelineStore::from_snapshot(snapshot),
            Err(TimelineError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_snapshot_transport_is_validated() {
        let store = TimelineStore::new();
        let mut value = serde_json::to_value(store.snapshot()).unwrap();
        value["transport"]["tempo"] = serde_json::json!(0.0);
        let snapshot: ProjectSnapshot = serde_json::from_value(value.clone()).unwrap();
        let restored = TimelineStore::from_snapshot(snapshot).unwrap();
        assert_eq!(restored.transport().tempo(), 20.0);
        assert!(restored.transport().converter().beats_to_seconds(4.0).is_finite());

        value["transport"]["time_signature"] = serde_json::json!({
            "numerator": 0,
            "denominator": 3,
        });
        let snapshot: ProjectSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(
            TimelineStore::from_snapshot(snapshot).err(),
            Some(TimelineError::InvalidTimeSignature {
                numerator: 0,
                denominator: 3
            })
        );
    }
}
