pub mod gestures;
pub mod interaction;

pub use gestures::{ClickKind, ClipHit, GestureConfig, Modifiers, Pointer, ResizeEdge};
pub use interaction::{GestureSession, InteractionController, TimelineInteraction};
