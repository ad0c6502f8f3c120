//! Persisted edit drafts.
//!
//! A draft is the serialized shape of an edit: source reference, toggles,
//! view, rotation, crop bounds and the nine sliders, stored as a JSON sidecar
//! next to the source image. Keys are camelCase. The filter is stored by name
//! so catalog reordering never changes what a draft means.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::adjustments::AdjustmentParams;
use crate::filter::FilterType;
use crate::transform::{Rotation, SourceCropRect, ViewTransform, ZoomLimits};

/// Suffix appended to the source file name for the sidecar.
pub const SIDECAR_SUFFIX: &str = ".retouch.json";

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("failed to access draft: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed draft: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Draft {
    pub original_image_uri: String,
    pub is_grayscale_enabled: bool,
    pub scale_factor: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub rotation_angle: f32,
    /// Crop bounds relative to the original source. Absent when uncropped.
    pub crop_left: Option<f32>,
    pub crop_top: Option<f32>,
    pub crop_right: Option<f32>,
    pub crop_bottom: Option<f32>,
    pub thumbnail_path: Option<String>,
    pub filter_type: String,
    #[serde(flatten)]
    pub adjustments: AdjustmentParams,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Default for Draft {
    fn default() -> Self {
        Self::new("")
    }
}

impl Draft {
    /// An unedited draft for `original_image_uri`.
    pub fn new(original_image_uri: &str) -> Self {
        let now = Utc::now();
        Self {
            original_image_uri: original_image_uri.to_string(),
            is_grayscale_enabled: false,
            scale_factor: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation_angle: 0.0,
            crop_left: None,
            crop_top: None,
            crop_right: None,
            crop_bottom: None,
            thumbnail_path: None,
            filter_type: FilterType::None.name().to_string(),
            adjustments: AdjustmentParams::default(),
            created_at: now,
            modified_at: now,
        }
    }

    /// The stored filter. Unknown names fall back to `None`.
    pub fn filter(&self) -> FilterType {
        FilterType::from_name(&self.filter_type).unwrap_or_else(|| {
            warn!(name = %self.filter_type, "unknown filter in draft, using NONE");
            FilterType::None
        })
    }

    pub fn rotation(&self) -> Rotation {
        Rotation::snap(self.rotation_angle)
    }

    /// The stored view, re-validated against `limits`.
    pub fn view(&self, limits: ZoomLimits) -> ViewTransform {
        ViewTransform {
            scale: self.scale_factor,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            rotation: self.rotation(),
        }
        .sanitized(limits)
    }

    /// Crop relative to the original source, if all four bounds are present.
    pub fn crop(&self) -> Option<SourceCropRect> {
        match (self.crop_left, self.crop_top, self.crop_right, self.crop_bottom) {
            (Some(left), Some(top), Some(right), Some(bottom)) => {
                Some(SourceCropRect::new(left, top, right, bottom))
            }
            (None, None, None, None) => None,
            _ => {
                warn!("draft has partial crop bounds, ignoring crop");
                None
            }
        }
    }

    pub fn set_crop(&mut self, crop: Option<SourceCropRect>) {
        self.crop_left = crop.map(|c| c.left);
        self.crop_top = crop.map(|c| c.top);
        self.crop_right = crop.map(|c| c.right);
        self.crop_bottom = crop.map(|c| c.bottom);
    }

    /// Sidecar location for a source image: `photo.jpg` → `photo.jpg.retouch.json`.
    pub fn sidecar_path(source: &Path) -> PathBuf {
        let mut name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "edit".to_string());
        name.push_str(SIDECAR_SUFFIX);
        source.with_file_name(name)
    }

    pub fn from_json(text: &str) -> Result<Self, DraftError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, DraftError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, DraftError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load the sidecar for `source`, `Ok(None)` if there is none.
    pub fn load_for(source: &Path) -> Result<Option<Self>, DraftError> {
        let path = Self::sidecar_path(source);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<(), DraftError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
