use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PROJECT_NAME;
use crate::model::{Clip, Track};
use crate::transport::Transport;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectInfo {
    pub version: String,
    pub name: String,
    /// Prompt context shared by every clip in the project.
    pub global_context: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub modified_at: chrono::DateTime<chrono::Utc>,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        let now = chrono::Utc::now();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: DEFAULT_PROJECT_NAME.to_string(),
            global_context: String::new(),
            created_at: now,
            modified_at: now,
        }
    }
}

impl ProjectInfo {
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now();
    }
}

/// Serializable copy of everything a store owns, minus selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSnapshot {
    pub project: ProjectInfo,
    pub tracks: Vec<Track>,
    pub clips: Vec<Clip>,
    pub transport: Transport,
}

impl ProjectSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
