use crossbeam_channel::Receiver;

use crate::config::Config;
use crate::error::Result;
use crate::input::InteractionController;
use crate::messages::StoreEvent;
use crate::midi_out::MidiService;
use crate::model::{ClipId, TrackId};
use crate::processing::ProcessingQueue;
use crate::store::TimelineStore;
use crate::transport::PlaybackClock;
use crate::view::{TimelineView, WheelInput};

/// One open timeline: the store plus the per-session services that act on it.
pub struct TimelineSession {
    pub config: Config,
    pub store: TimelineStore,
    pub view: TimelineView,
    pub interactions: InteractionController,
    pub processing: ProcessingQueue,
    pub midi: MidiService,
    clock: PlaybackClock,
    events: Receiver<StoreEvent>,
    pending: Vec<StoreEvent>,
}

impl TimelineSession {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_midi(config, MidiService::new())
    }

    pub fn with_midi(config: Config, mut midi: MidiService) -> Result<Self> {
        let timeline = &config.timeline;

        let mut store = TimelineStore::new().with_min_clip_duration(timeline.min_clip_duration);
        store.set_tempo(config.transport.bpm);
        let (numerator, denominator) = config.transport.time_signature;
        store.set_time_signature(numerator, denominator)?;
        let events = store.subscribe();

        let mut view = TimelineView::new(timeline.initial_beats, timeline.initial_tracks)
            .with_pixels_per_beat(timeline.pixels_per_beat)
            .with_track_height(timeline.gestures.track_height);
        view.set_zoom(timeline.initial_zoom);

        if config.midi.enabled && midi.initialize() {
            if let Some(preferred) = &config.midi.preferred_output
                && !midi.select_output_device(preferred)
            {
                log::warn!("Preferred MIDI output '{}' not available", preferred);
            }
        }

        Ok(Self {
            interactions: InteractionController::new(timeline.grid(), timeline.gestures),
            processing: ProcessingQueue::new(config.behavior.processing_delay_ms),
            config,
            store,
            view,
            midi,
            clock: PlaybackClock::new(),
            events,
            pending: Vec::new(),
        })
    }

    /// Drive time-based work from the host frame loop. Returns clips whose
    /// processing completed on this tick.
    ///
    /// Playhead events are coalesced here, so a host that drains rarely only
    /// ever holds the latest one.
    pub fn tick(&mut self, now_ms: f64) -> Vec<ClipId> {
        self.store.advance_playback(&mut self.clock, now_ms);
        if self.config.behavior.follow_playhead && self.store.transport().is_playing() {
            self.follow_playhead();
        }
        self.view.settle(now_ms);
        let completed = self.processing.poll(&mut self.store, now_ms);
        self.collect_events();
        completed
    }

    fn collect_events(&mut self) {
        for event in self.events.try_iter() {
            if matches!(event, StoreEvent::PlayheadMoved(_)) {
                self.pending
                    .retain(|e| !matches!(e, StoreEvent::PlayheadMoved(_)));
            }
            self.pending.push(event);
        }
    }

    fn follow_playhead(&mut self) {
        let x = self.view.beat_to_pixel(self.store.transport().playhead());
        let (width, _) = self.view.viewport();
        let left = self.view.horizontal_scroll();
        if width > 0.0 && (x < left || x > left + width) {
            self.view.scroll_to(x, self.view.vertical_scroll());
        }
    }

    pub fn handle_wheel(&mut self, wheel: WheelInput, container_left: f64, now_ms: f64) {
        self.view.handle_wheel(wheel, container_left, now_ms);
    }

    pub fn select_track(&mut self, id: TrackId, multi: bool) -> Result<()> {
        self.store.select_track(id, multi)?;
        if self.config.behavior.stop_on_track_selection && self.store.transport().is_playing() {
            self.stop();
        }
        Ok(())
    }

    pub fn toggle_playback(&mut self) {
        if self.store.transport().is_playing() {
            self.stop();
        } else {
            self.store.play();
        }
    }

    /// Stop the transport and silence any hanging notes.
    pub fn stop(&mut self) {
        self.store.stop();
        self.midi.send_all_notes_off(None);
    }

    pub fn process_clip(&mut self, clip_id: ClipId, now_ms: f64) -> Result<()> {
        self.processing.enqueue(&mut self.store, clip_id, now_ms)
    }

    /// Grow the scrollable area to cover every clip and track.
    pub fn sync_content(&mut self) {
        let last_end = self
            .store
            .clips()
            .map(|c| c.end_time())
            .fold(0.0_f64, f64::max);
        let beats = self.config.timeline.initial_beats.max(last_end.ceil());
        let tracks = self
            .config
            .timeline
            .initial_tracks
            .max(self.store.display_order().len());
        self.view.update_content_dimensions(beats, tracks);
    }

    /// Store events since the last call. Keeps the content size in step
    /// with structural changes.
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        self.collect_events();
        let events = std::mem::take(&mut self.pending);
        let structural = events.iter().any(|e| {
            !matches!(
                e,
                StoreEvent::SelectionChanged
                    | StoreEvent::TransportChanged
                    | StoreEvent::PlayheadMoved(_)
            )
        });
        if structural {
            self.sync_content();
        }
        events
    }
}
