//! Viewer configuration.
//!
//! Every field has a default matching the stock viewer, so an empty JSON
//! object (or no config at all) yields [`ViewerConfig::default`]. Hosts pass
//! overrides as JSON; [`ViewerConfig::from_json`] validates before returning.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    EXPORT_STROKE, EXPORT_STROKE_WIDTH, MAX_ZOOM_RATIO, MIN_ZOOM_RATIO, SCROLL_SENSITIVITY, SOURCE_DEFAULT_RGBA,
    SURFACE_SIZE, USER_SEGMENT_RGBA,
};
use crate::error::ViewerError;
use crate::scene::{ExportStyle, Rgba};
use crate::viewbox::ZoomSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Edge length of the square drawing surface in pixels.
    pub surface_size: f64,
    pub scroll_sensitivity: f64,
    pub min_zoom_ratio: f64,
    pub max_zoom_ratio: f64,
    /// Key names that restore the load-time viewbox.
    pub reset_keys: Vec<String>,
    pub user_segment_color: Rgba,
    /// Color for source lines without a usable `stroke`.
    pub source_default_color: Rgba,
    pub export_stroke: String,
    pub export_stroke_width: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            surface_size: SURFACE_SIZE,
            scroll_sensitivity: SCROLL_SENSITIVITY,
            min_zoom_ratio: MIN_ZOOM_RATIO,
            max_zoom_ratio: MAX_ZOOM_RATIO,
            reset_keys: vec!["r".to_owned(), "R".to_owned()],
            user_segment_color: Rgba::from_array(USER_SEGMENT_RGBA),
            source_default_color: Rgba::from_array(SOURCE_DEFAULT_RGBA),
            export_stroke: EXPORT_STROKE.to_owned(),
            export_stroke_width: EXPORT_STROKE_WIDTH.to_owned(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a JSON override. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ViewerError::ConfigParse`] for malformed JSON, [`ViewerError::InvalidConfig`]
    /// when a value is out of range.
    pub fn from_json(text: &str) -> Result<Self, ViewerError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ViewerError> {
        if !(self.surface_size.is_finite() && self.surface_size > 0.0) {
            return Err(ViewerError::InvalidConfig(format!("surface_size must be positive, got {}", self.surface_size)));
        }
        if !(self.scroll_sensitivity.is_finite() && self.scroll_sensitivity > 0.0) {
            return Err(ViewerError::InvalidConfig(format!(
                "scroll_sensitivity must be positive, got {}",
                self.scroll_sensitivity
            )));
        }
        if !(self.min_zoom_ratio.is_finite() && self.min_zoom_ratio > 0.0) {
            return Err(ViewerError::InvalidConfig(format!(
                "min_zoom_ratio must be positive, got {}",
                self.min_zoom_ratio
            )));
        }
        if !self.max_zoom_ratio.is_finite() || self.max_zoom_ratio < self.min_zoom_ratio {
            return Err(ViewerError::InvalidConfig(format!(
                "max_zoom_ratio {} is below min_zoom_ratio {}",
                self.max_zoom_ratio, self.min_zoom_ratio
            )));
        }
        if self.min_zoom_ratio > 1.0 || self.max_zoom_ratio < 1.0 {
            return Err(ViewerError::InvalidConfig("zoom ratios must bracket 1.0".to_owned()));
        }
        Ok(())
    }

    #[must_use]
    pub fn zoom_settings(&self) -> ZoomSettings {
        ZoomSettings {
            sensitivity: self.scroll_sensitivity,
            min_ratio: self.min_zoom_ratio,
            max_ratio: self.max_zoom_ratio,
        }
    }

    #[must_use]
    pub fn export_style(&self) -> ExportStyle {
        ExportStyle { stroke: self.export_stroke.clone(), stroke_width: self.export_stroke_width.clone() }
    }

    #[must_use]
    pub fn is_reset_key(&self, key: &str) -> bool {
        self.reset_keys.iter().any(|k| k == key)
    }
}
