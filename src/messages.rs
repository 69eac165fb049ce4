use crate::model::{ClipId, TrackId};

/// Change notifications published by `TimelineStore` to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    TrackAdded(TrackId),
    TrackRemoved(TrackId),
    TrackUpdated(TrackId),
    /// Sibling positions under this parent (None = top level) were rewritten.
    TracksReordered(Option<TrackId>),

    ClipAdded(ClipId),
    ClipRemoved(ClipId),
    ClipUpdated(ClipId),
    ClipMoved {
        clip_id: ClipId,
        from_track: TrackId,
        to_track: TrackId,
    },

    SelectionChanged,
    TransportChanged,
    PlayheadMoved(f64),
}
