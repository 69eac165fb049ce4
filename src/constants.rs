// Coordinate Constants
pub const PIXELS_PER_BEAT: f64 = 100.0;
pub const DEFAULT_ZOOM: f64 = 1.0;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
pub const WHEEL_ZOOM_STEP: f64 = 0.1;
pub const TICKS_PER_BEAT: u32 = 960;

// Timeline Constants
pub const DEFAULT_GRID_SNAP: f64 = 0.25; // 1/16th notes
pub const DEFAULT_TIMELINE_BEATS: f64 = 64.0;
pub const DEFAULT_TRACK_COUNT: usize = 8;
pub const TRACK_HEIGHT: f64 = 80.0;

// Clip Constants
pub const DEFAULT_CLIP_LEN: f64 = 4.0;
pub const MIN_CLIP_DURATION: f64 = 1.0;

// Interaction Constants
pub const DRAG_TRACK_THRESHOLD: f64 = 20.0; // px of vertical travel before changing track

// Transport Constants
pub const DEFAULT_BPM: f64 = 120.0;
pub const MIN_TEMPO: f64 = 20.0;
pub const MAX_TEMPO: f64 = 300.0;
pub const MAX_TIME_SIGNATURE_NUMERATOR: u32 = 32;
pub const VALID_TIME_SIGNATURE_DENOMINATORS: &[u32] = &[1, 2, 4, 8, 16, 32];

// Processing
pub const DEFAULT_PROCESSING_DELAY_MS: u64 = 2000;
pub const CHARS_PER_TOKEN: usize = 4;

// Default Names
pub const DEFAULT_TRACK_NAME: &str = "New Track";
pub const DEFAULT_GROUP_NAME: &str = "New Group";
pub const DEFAULT_TRACK_COLOR: &str = "#48bb78";
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

// MIDI
pub const MIDI_CLIENT_NAME: &str = "PromptDAW Output";
pub const MIDI_CONNECTION_NAME: &str = "promptdaw-output";
pub const SCROLL_SETTLE_MS: f64 = 150.0;
pub const EDGE_RESIZE_THRESHOLD: f64 = 8.0; // px from a clip edge that grabs the resize handle
pub const DOUBLE_CLICK_MAX_INTERVAL_MS: f64 = 300.0;
pub const DOUBLE_CLICK_MAX_DISTANCE: f64 = 20.0;
