//! Configuration types for the Easel canvas engine.
//!
//! All types implement [`serde::Deserialize`] and fall back to defaults for
//! every missing field, so a partial configuration file is always valid.
//!
//! # Overview
//!
//! - [`EditorConfig`] - Top-level configuration combining every section.
//! - [`InteractionConfig`] - Hit radii, drag threshold and label editing behaviour.
//! - [`ViewportConfig`] - Zoom limits and wheel sensitivity.
//! - [`HistoryConfig`] - Undo depth.
//!
//! # Example
//!
//! ```
//! # use easel::config::EditorConfig;
//! let config = EditorConfig::default();
//! assert!(config.interaction().escape_commits_label());
//! assert_eq!(config.history().limit(), 100);
//! ```

use serde::Deserialize;

use easel_core::geometry::Size;

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorConfig {
    /// Interaction configuration section.
    #[serde(default)]
    interaction: InteractionConfig,

    /// Viewport configuration section.
    #[serde(default)]
    viewport: ViewportConfig,

    /// History configuration section.
    #[serde(default)]
    history: HistoryConfig,
}

impl EditorConfig {
    pub fn new(
        interaction: InteractionConfig,
        viewport: ViewportConfig,
        history: HistoryConfig,
    ) -> Self {
        Self {
            interaction,
            viewport,
            history,
        }
    }

    /// Returns the interaction configuration.
    pub fn interaction(&self) -> &InteractionConfig {
        &self.interaction
    }

    /// Returns the viewport configuration.
    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Returns the history configuration.
    pub fn history(&self) -> &HistoryConfig {
        &self.history
    }
}

/// Gesture tuning. Radii and thresholds are in screen pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Distance within which a pointer grabs a connection point.
    connection_point_radius: f32,

    /// Distance within which a pointer grabs a resize handle.
    resize_handle_radius: f32,

    /// Distance within which a pointer hits a connector path.
    connector_hit_tolerance: f32,

    /// Pointer travel before a press on a shape turns into a drag.
    drag_threshold: f32,

    /// Smallest width a shape can be resized to, in canvas units.
    min_shape_width: f32,

    /// Smallest height a shape can be resized to, in canvas units.
    min_shape_height: f32,

    /// Whether Escape while editing a label saves the text (`true`) or
    /// discards it (`false`).
    escape_commits_label: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            connection_point_radius: 8.0,
            resize_handle_radius: 6.0,
            connector_hit_tolerance: 5.0,
            drag_threshold: 4.0,
            min_shape_width: 20.0,
            min_shape_height: 20.0,
            escape_commits_label: true,
        }
    }
}

impl InteractionConfig {
    pub fn connection_point_radius(&self) -> f32 {
        self.connection_point_radius
    }

    pub fn resize_handle_radius(&self) -> f32 {
        self.resize_handle_radius
    }

    pub fn connector_hit_tolerance(&self) -> f32 {
        self.connector_hit_tolerance
    }

    pub fn drag_threshold(&self) -> f32 {
        self.drag_threshold
    }

    /// Returns the minimum shape size for resizing.
    pub fn min_shape_size(&self) -> Size {
        Size::new(self.min_shape_width, self.min_shape_height)
    }

    pub fn escape_commits_label(&self) -> bool {
        self.escape_commits_label
    }

    /// Sets how Escape ends label editing.
    pub fn with_escape_commits_label(mut self, commits: bool) -> Self {
        self.escape_commits_label = commits;
        self
    }
}

/// Zoom limits and wheel behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    min_zoom: f32,
    max_zoom: f32,

    /// Zoom multiplier applied per wheel step.
    zoom_step: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 8.0,
            zoom_step: 1.1,
        }
    }
}

impl ViewportConfig {
    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn zoom_step(&self) -> f32 {
        self.zoom_step
    }

    /// Clamps `zoom` into the configured range.
    ///
    /// Tolerates a misconfigured range where `min_zoom > max_zoom`.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

/// Undo history settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo entries kept per diagram.
    limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl HistoryConfig {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
