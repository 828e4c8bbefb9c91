//! Optional TOML configuration.
//!
//! Every section may be omitted; missing values fall back to the built-in
//! red cloak defaults.
//!
//! ```toml
//! [color]
//! ranges = [
//!     { lower = [0, 120, 70], upper = [10, 255, 255] },
//!     { lower = [170, 120, 70], upper = [180, 255, 255] },
//! ]
//!
//! [refine]
//! kernel_size = 3
//! open_iterations = 2
//! dilate_iterations = 1
//!
//! [background]
//! warmup_frames = 30
//! settle_frames = 60
//! sample_frames = 30
//! ```

use crate::background::CaptureSettings;
use crate::capture::SourceOpener;
use crate::pipeline::CloakPipeline;
use crate::segmentation::{ColorMaskSegmenter, ColorRange, MaskRefiner};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloakConfig {
    pub color: ColorRange,
    pub refine: MaskRefiner,
    pub background: CaptureSettings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl CloakConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CloakConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.color.ranges().is_empty() {
            return Err(ConfigError::Invalid("color.ranges must not be empty".into()));
        }
        if let Some(range) = self.color.ranges().iter().find(|r| !r.is_ordered()) {
            return Err(ConfigError::Invalid(format!(
                "color range lower bound {:?} exceeds upper bound {:?}",
                range.lower, range.upper
            )));
        }
        if self.refine.kernel_size == 0 || self.refine.kernel_size % 2 == 0 {
            return Err(ConfigError::Invalid(format!(
                "refine.kernel_size must be odd, got {}",
                self.refine.kernel_size
            )));
        }
        Ok(())
    }

    /// Assemble a pipeline around `opener` with these settings
    pub fn build_pipeline<O: SourceOpener>(&self, opener: O) -> CloakPipeline<O> {
        CloakPipeline::new(
            opener,
            ColorMaskSegmenter::new(self.color.clone()),
            self.refine,
            self.background,
        )
    }
}
