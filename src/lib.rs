pub mod config;
pub mod constants;
pub mod error;
pub mod grid;
pub mod idgen;
pub mod input;
pub mod messages;
pub mod midi_out;
pub mod model;
pub mod paths;
pub mod processing;
pub mod project;
pub mod selection;
pub mod session;
pub mod store;
pub mod time_utils;
pub mod transport;
pub mod view;

pub use error::{Result, TimelineError};
pub use session::TimelineSession;
pub use store::TimelineStore;
