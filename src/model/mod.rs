pub mod clip;
pub mod group;
pub mod track;

pub use clip::{Clip, ClipBuilder, ClipId, ClipPatch, ClipStatus};
pub use group::{COLOR_PALETTE, ContextLevel, ContextScope, group_color};
pub use track::{Track, TrackBuilder, TrackId, TrackPatch, TrackType};
