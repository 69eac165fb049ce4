use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineError {
    TrackNotFound(u64),
    ClipNotFound(u64),
    InvalidGroup(u64),
    SplitOutOfRange { clip_id: u64, at: f64 },
    InvalidDependency { clip_id: u64, depends_on: u64 },
    InvalidTimeSignature { numerator: u32, denominator: u32 },
    InvalidSnapshot(String),
    Midi(String),
    Config(String),
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimelineError::TrackNotFound(id) => write!(f, "Track {} not found", id),
            TimelineError::ClipNotFound(id) => write!(f, "Clip {} not found", id),
            TimelineError::InvalidGroup(id) => write!(f, "Track {} is not a group", id),
            TimelineError::SplitOutOfRange { clip_id, at } => {
                write!(f, "Cannot split clip {} at {}", clip_id, at)
            }
            TimelineError::InvalidDependency {
                clip_id,
                depends_on,
            } => write!(
                f,
                "Clip {} cannot depend on clip {}",
                clip_id, depends_on
            ),
            TimelineError::InvalidTimeSignature {
                numerator,
                denominator,
            } => write!(f, "Invalid time signature {}/{}", numerator, denominator),
            TimelineError::InvalidSnapshot(msg) => write!(f, "Invalid snapshot: {}", msg),
            TimelineError::Midi(msg) => write!(f, "MIDI error: {}", msg),
            TimelineError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for TimelineError {}

pub type Result<T> = std::result::Result<T, TimelineError>;

// Conversion helpers
impl From<std::io::Error> for TimelineError {
    fn from(err: std::io::Error) -> Self {
        TimelineError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for TimelineError {
    fn from(err: anyhow::Error) -> Self {
        TimelineError::Midi(err.to_string())
    }
}
