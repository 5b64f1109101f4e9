use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::DynamicImage;
use log::debug;
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, Tensor};

use crate::config::{ChannelOrder, ClassifierConfig, TensorLayout};
use crate::error::{Error, Result};

/// Anything that scores a cropped region with the probability that it shows e-waste.
///
/// The pipeline only borrows the classifier, so one instance is loaded up
/// front and shared by every run.
pub trait RegionClassifier {
    fn classify(&self, region: &DynamicImage) -> Result<f32>;
}

impl<C: RegionClassifier + ?Sized> RegionClassifier for Box<C> {
    fn classify(&self, region: &DynamicImage) -> Result<f32> {
        (**self).classify(region)
    }
}

/// Resize a region to the model's input size, scale to [0, 1] and add a batch axis
pub fn prepare_input(region: &DynamicImage, config: &ClassifierConfig) -> NdTensor<f32, 4> {
    let size = config.input_size;
    let side = size as usize;
    let resized = imageops::resize(&region.to_rgb8(), size, size, FilterType::CatmullRom);

    let mut data = vec![0.0f32; 3 * side * side];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let source = match config.channel_order {
                ChannelOrder::Bgr => 2 - c,
                ChannelOrder::Rgb => c,
            };
            let index = match config.layout {
                TensorLayout::Nhwc => (y * side + x) * 3 + c,
                TensorLayout::Nchw => c * side * side + y * side + x,
            };
            data[index] = pixel[source] as f32 / 255.0;
        }
    }

    let shape = match config.layout {
        TensorLayout::Nhwc => [1, side, side, 3],
        TensorLayout::Nchw => [1, 3, side, side],
    };
    NdTensor::from_data(shape, data)
}

/// Binary classifier backed by an `.rten` or `.onnx` model, chosen by file extension
pub struct ModelClassifier {
    model: Model,
    config: ClassifierConfig,
    path: PathBuf,
}

impl ModelClassifier {
    /// Load the model and check it maps one input image to one score
    pub fn load<P: AsRef<Path>>(path: P, config: ClassifierConfig) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |reason: String| Error::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(load_error("file not found".to_string()));
        }

        let model = Model::load_file(path).map_err(|e| load_error(e.to_string()))?;
        if model.input_ids().len() != 1 || model.output_ids().is_empty() {
            return Err(load_error(format!(
                "expected one input and at least one output, found {} and {}",
                model.input_ids().len(),
                model.output_ids().len()
            )));
        }

        let classifier = Self {
            model,
            config,
            path: path.to_path_buf(),
        };

        let warm_up = DynamicImage::new_rgb8(1, 1);
        let score = classifier
            .classify(&warm_up)
            .map_err(|e| load_error(format!("warm-up pass failed: {e}")))?;
        debug!(
            "Loaded model {} (warm-up score {:.4})",
            classifier.path.display(),
            score
        );

        Ok(classifier)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn forward(&self, input: NdTensor<f32, 4>) -> Result<f32> {
        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| Error::Inference(e.to_string()))?;
        let scores: Tensor<f32> = output
            .try_into()
            .map_err(|e| Error::Inference(format!("unexpected output type: {e:?}")))?;

        if scores.len() != 1 {
            return Err(Error::Inference(format!(
                "expected a single score, got shape {:?}",
                scores.shape()
            )));
        }
        scores
            .iter()
            .next()
            .copied()
            .ok_or_else(|| Error::Inference("empty output".to_string()))
    }
}

impl RegionClassifier for ModelClassifier {
    fn classify(&self, region: &DynamicImage) -> Result<f32> {
        self.forward(prepare_input(region, &self.config))
    }
}

impl Drop for ModelClassifier {
    fn drop(&mut self) {
        debug!("Releasing model {}", self.path.display());
    }
}
