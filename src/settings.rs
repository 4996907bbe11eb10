//! Import Settings
//!
//! [`ImportSettings`] collects the few policy knobs of the pipeline. Every
//! field has a sensible default, so most callers never touch it.
//!
//! ```rust,ignore
//! use myth_import::ImportSettings;
//! use myth_import::core::timeline::InterpolationMode;
//!
//! // Blockier but cheaper playback of resampled cubic curves
//! let settings = ImportSettings {
//!     cubic_resample_mode: InterpolationMode::None,
//!     ..Default::default()
//! };
//! ```
//!
//! Settings can also be loaded from JSON; missing keys fall back to defaults:
//!
//! ```rust,ignore
//! let settings = ImportSettings::from_json(r#"{ "resample_rate": 30.0 }"#)?;
//! ```

use serde::Deserialize;

use crate::core::timeline::InterpolationMode;
use crate::errors::{ImportError, Result};

/// Default sampling rate used to rasterize cubic-spline curves (samples per second).
pub const DEFAULT_RESAMPLE_RATE: f64 = 25.0;

/// Default silence inserted between consecutive clips of a merged timeline.
pub const DEFAULT_CLIP_GAP: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Interpolation stored for channels rasterized from cubic-spline samplers.
    ///
    /// `Linear` gives smoother playback, `None` is cheaper and blockier.
    pub cubic_resample_mode: InterpolationMode,

    /// Samples per second when rasterizing cubic-spline samplers.
    pub resample_rate: f64,

    /// Seconds of silence between two clips concatenated into one timeline.
    pub clip_gap: f64,

    /// Remove helper entities carrying no mesh, light, skeleton or timeline.
    pub prune_helper_nodes: bool,

    /// Decode material textures. Disable to import geometry and animation only.
    pub load_textures: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            cubic_resample_mode: InterpolationMode::Linear,
            resample_rate: DEFAULT_RESAMPLE_RATE,
            clip_gap: DEFAULT_CLIP_GAP,
            prune_helper_nodes: true,
            load_textures: true,
        }
    }
}

impl ImportSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    #[must_use]
    pub fn with_cubic_resample_mode(mut self, mode: InterpolationMode) -> Self {
        self.cubic_resample_mode = mode;
        self
    }

    #[must_use]
    pub fn with_resample_rate(mut self, rate: f64) -> Self {
        self.resample_rate = rate;
        self
    }

    #[must_use]
    pub fn with_clip_gap(mut self, gap: f64) -> Self {
        self.clip_gap = gap;
        self
    }

    #[must_use]
    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune_helper_nodes = prune;
        self
    }

    /// Time between two resampled keyframes.
    #[inline]
    #[must_use]
    pub fn resample_step(&self) -> f64 {
        1.0 / self.resample_rate
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.resample_rate.is_finite() && self.resample_rate > 0.0) {
            return Err(ImportError::argument(format!(
                "resample_rate must be a positive number, got {}",
                self.resample_rate
            )));
        }
        if !(self.clip_gap.is_finite() && self.clip_gap > 0.0) {
            return Err(ImportError::argument(format!(
                "clip_gap must be a positive number, got {}",
                self.clip_gap
            )));
        }
        Ok(())
    }
}
