use crate::history::{DEFAULT_MAX_HISTORY, DEFAULT_MERGE_THRESHOLD_MS};
use crate::layout::DEFAULT_GRID_SIZE;
use serde::{Deserialize, Serialize};

/// Editor tuning. Every field has a default so hosts can pass a partial
/// JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub max_history_size: usize,
    pub merge_threshold_ms: u64,
    pub auto_merge: bool,
    pub grid_size: f64,
    pub grid_snap: bool,
    /// Interval for `poll_auto_save`; `None` disables it.
    pub auto_save_interval_ms: Option<u64>,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Extra slack around node shapes and edge lines when hit-testing.
    pub hit_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            max_history_size: DEFAULT_MAX_HISTORY,
            merge_threshold_ms: DEFAULT_MERGE_THRESHOLD_MS,
            auto_merge: true,
            grid_size: DEFAULT_GRID_SIZE,
            grid_snap: true,
            auto_save_interval_ms: None,
            min_zoom: 0.1,
            max_zoom: 5.0,
            hit_tolerance: 6.0,
        }
    }
}

impl EditorConfig {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if !zoom.is_finite() {
            return 1.0f64.clamp(self.min_zoom, self.max_zoom);
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Display toggles for the rendering layer. Saved with the document but
/// never part of undo history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewSettings {
    pub show_grid: bool,
    pub show_minimap: bool,
    pub show_labels: bool,
    pub highlight_selection: bool,
    pub read_only: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            show_grid: true,
            show_minimap: false,
            show_labels: true,
            highlight_selection: true,
            read_only: false,
        }
    }
}
