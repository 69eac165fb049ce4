use serde::{Deserialize, Serialize};

/// Predefined color palette for new groups
pub const COLOR_PALETTE: &[&str] = &[
    "#e74c3c", // Red
    "#e67e22", // Orange
    "#f1c40f", // Yellow
    "#2ecc71", // Green
    "#1abc9c", // Teal
    "#3498db", // Blue
    "#9b59b6", // Purple
    "#95a5a6", // Gray
];

/// Pick a palette color based on id for variety
pub fn group_color(id: u64) -> &'static str {
    COLOR_PALETTE[(id as usize) % COLOR_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextScope {
    Project,
    Group,
    Track,
    Clip,
}

/// One layer of prompt context that flows into a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextLevel {
    pub scope: ContextScope,
    pub target_id: Option<u64>,
    pub content: String,
    pub enabled: bool,
}

impl ContextLevel {
    /// Rough estimate, about four characters per token.
    pub fn estimated_tokens(&self) -> usize {
        if !self.enabled {
            return 0;
        }
        let chars = self.content.chars().count();
        (chars + crate::constants::CHARS_PER_TOKEN / 2) / crate::constants::CHARS_PER_TOKEN
    }
}
