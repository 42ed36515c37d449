use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number >= 0, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be a finite number > 0, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("initial_size_fraction must be in (0, 1], got {0}")]
    SizeFraction(f32),
}

/// Tunables for sticker layout and gesture handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Side of the square corner handles
    pub corner_handle_size: f32,
    /// Long side of the edge capsules
    pub edge_handle_length: f32,
    /// Short side of the edge capsules
    pub edge_handle_thickness: f32,
    pub edge_handle_corner_radius: f32,
    /// Width of the selection border the edge handles straddle
    pub border_width: f32,
    /// Margin between the sticker bounds and the image it carries
    pub content_inset: f32,
    /// Edge resizes producing an extent at or below this are ignored
    pub min_edge_extent: f32,
    /// Fraction of the sticker that must stay inside the overlay while panning
    pub min_visible_fraction: f32,
    /// New stickers take this fraction of the aspect-fit image size
    pub initial_size_fraction: f32,
    pub pinch_to_scale: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            corner_handle_size: 40.0,
            edge_handle_length: 32.0,
            edge_handle_thickness: 16.0,
            edge_handle_corner_radius: 5.0,
            border_width: 2.0,
            content_inset: 24.0,
            min_edge_extent: 20.0,
            min_visible_fraction: 0.3,
            initial_size_fraction: 0.4,
            pinch_to_scale: false,
        }
    }
}

impl EditorConfig {
    /// Reject values the layout and gesture math cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("corner_handle_size", self.corner_handle_size),
            ("edge_handle_length", self.edge_handle_length),
            ("edge_handle_thickness", self.edge_handle_thickness),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        for (field, value) in [
            ("edge_handle_corner_radius", self.edge_handle_corner_radius),
            ("border_width", self.border_width),
            ("content_inset", self.content_inset),
            ("min_edge_extent", self.min_edge_extent),
            ("min_visible_fraction", self.min_visible_fraction),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let fraction = self.initial_size_fraction;
        if !(fraction.is_finite() && fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::SizeFraction(fraction));
        }

        Ok(())
    }
}
