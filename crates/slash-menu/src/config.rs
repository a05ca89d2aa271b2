use serde::{Deserialize, Serialize};

use crate::error::PaletteError;
use crate::geometry::Placement;

pub const DEFAULT_TRIGGER: char = '/';
pub const DEFAULT_MAX_VISIBLE: usize = 8;
pub const DEFAULT_EMPTY_LABEL: &str = "No results";

/// Palette settings. Zero or empty fields fall back to the defaults, so a
/// host settings file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub trigger: char,
    pub max_visible: usize,
    pub placement: Placement,
    pub empty_label: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER,
            max_visible: DEFAULT_MAX_VISIBLE,
            placement: Placement::default(),
            empty_label: DEFAULT_EMPTY_LABEL.to_string(),
        }
    }
}

impl PaletteConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.trigger == '\0' {
            self.trigger = DEFAULT_TRIGGER;
        }
        if self.max_visible == 0 {
            self.max_visible = DEFAULT_MAX_VISIBLE;
        }
        if self.empty_label.is_empty() {
            self.empty_label = DEFAULT_EMPTY_LABEL.to_string();
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, PaletteError> {
        let config: Self = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }
}
