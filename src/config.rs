use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Which side of the Otsu threshold counts as an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// The class covering most of the image border is background
    #[default]
    Auto,
    DarkObjects,
    BrightObjects,
}

/// Memory layout of the classifier's input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    /// [1, H, W, C], as exported from Keras
    #[default]
    Nhwc,
    /// [1, C, H, W]
    Nchw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// The classifier was trained on OpenCV-decoded images
    #[default]
    Bgr,
    Rgb,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProposerConfig {
    /// Contours enclosing less than this many pixels² are dropped
    pub min_area: f64,
    /// Side of the square Gaussian kernel, odd
    pub blur_kernel_size: u32,
    pub polarity: Polarity,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            min_area: 1000.0,
            blur_kernel_size: 5,
            polarity: Polarity::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Regions are resized to input_size x input_size
    pub input_size: u32,
    pub layout: TensorLayout,
    pub channel_order: ChannelOrder,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            input_size: 224,
            layout: TensorLayout::Nhwc,
            channel_order: ChannelOrder::Bgr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// TrueType font for captions; common system fonts are tried when unset
    pub font_path: Option<PathBuf>,
    pub line_thickness: u32,
    /// Caption height in pixels
    pub font_scale: f32,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            line_thickness: 2,
            font_scale: 16.0,
        }
    }
}

/// Full detector configuration, loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Probabilities at or above this are labelled E-Waste
    pub threshold: f32,
    pub proposer: ProposerConfig,
    pub classifier: ClassifierConfig,
    pub annotator: AnnotatorConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            proposer: ProposerConfig::default(),
            classifier: ClassifierConfig::default(),
            annotator: AnnotatorConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Config { reason, .. } => Error::Config {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: DetectorConfig = serde_json::from_str(text).map_err(|e| Error::Config {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values, then re-check
    pub fn with_overrides(
        mut self,
        threshold: Option<f32>,
        min_area: Option<f64>,
        font_path: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(threshold) = threshold {
            self.threshold = threshold;
        }
        if let Some(min_area) = min_area {
            self.proposer.min_area = min_area;
        }
        if font_path.is_some() {
            self.annotator.font_path = font_path;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the detector cannot run with, NaN included
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::Config {
            path: PathBuf::from("<inline>"),
            reason,
        };
        if self.proposer.blur_kernel_size == 0 || self.proposer.blur_kernel_size % 2 == 0 {
            return Err(invalid(format!(
                "blur_kernel_size must be odd, got {}",
                self.proposer.blur_kernel_size
            )));
        }
        if self.classifier.input_size == 0 {
            return Err(invalid("input_size must be positive".to_string()));
        }
        if self.proposer.min_area.is_nan() || self.proposer.min_area < 0.0 {
            return Err(invalid(format!(
                "min_area must be non-negative, got {}",
                self.proposer.min_area
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(invalid(format!(
                "threshold must lie in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
