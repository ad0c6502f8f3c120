//! Editor configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. Values are validated after parsing, never silently clamped.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::{ExportFormat, DEFAULT_JPEG_QUALITY};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::pixels::DEFAULT_BITMAP_CAPACITY;
use crate::transform::{ZoomLimits, DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE};

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Maximum number of edit snapshots kept for undo.
    pub history_capacity: usize,
    /// Maximum number of baked pixel versions kept, original included.
    pub bitmap_history_capacity: usize,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Quiet period before a run of slider changes becomes one history entry.
    pub debounce_ms: u64,
    pub export_format: ExportFormat,
    pub jpeg_quality: u8,
    /// Longest edge of draft thumbnails.
    pub thumbnail_max_dim: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            bitmap_history_capacity: DEFAULT_BITMAP_CAPACITY,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            debounce_ms: 500,
            export_format: ExportFormat::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            thumbnail_max_dim: 256,
        }
    }
}

impl EditorConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(text)?;
        config.validated()
    }

    /// Check value ranges, returning `self` unchanged when valid.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.history_capacity == 0 {
            return Err(invalid("history_capacity", "must be at least 1"));
        }
        if self.bitmap_history_capacity < 2 {
            return Err(invalid("bitmap_history_capacity", "must be at least 2"));
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(invalid("min_scale", "must be a positive number"));
        }
        if !(self.max_scale.is_finite() && self.max_scale >= self.min_scale) {
            return Err(invalid("max_scale", "must be finite and at least min_scale"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(invalid("jpeg_quality", "must be between 1 and 100"));
        }
        if self.thumbnail_max_dim == 0 {
            return Err(invalid("thumbnail_max_dim", "must be non-zero"));
        }
        Ok(self)
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.min_scale,
            max: self.max_scale,
        }
    }

    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default().validated().unwrap();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.debounce_ms, 500);
        assert_eq!(config.zoom_limits(), ZoomLimits::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{ "history_capacity": 10, "export_format": "jpeg" }"#)
            .unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.export_format, ExportFormat::Jpeg);
        assert_eq!(config.bitmap_history_capacity, DEFAULT_BITMAP_CAPACITY);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = EditorConfig::from_json(r#"{ "histroy_capacity": 10 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values() {
        let err = EditorConfig::from_json(r#"{ "bitmap_history_capacity": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "bitmap_history_capacity", .. }));

        let err = EditorConfig::from_json(r#"{ "min_scale": 2.0, "max_scale": 1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_scale", .. }));

        let err = EditorConfig::from_json(r#"{ "jpeg_quality": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jpeg_quality", .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("retouch.json");
        std::fs::write(&path, r#"{ "jpeg_quality": 75 }"#).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.jpeg_quality, 75);

        let missing = EditorConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }
}
