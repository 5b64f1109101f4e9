use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageReader, RgbImage};
use log::{debug, info, warn};

use crate::config::DetectorConfig;
use crate::detection::{decide, Annotator, RegionClassifier, RegionProposer};
use crate::error::{Error, Result};
use crate::models::Detection;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for intermediate images
    pub output_dir: PathBuf,
}

/// Load an image from disk, guessing the format from its content
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    let load_error = |source: image::ImageError| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| load_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| load_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(load_error)
}

/// Region proposal, classification and annotation for one image at a time.
///
/// The pipeline holds no per-image state: every run works on its own copy
/// of the image and borrows the caller's classifier.
pub struct Pipeline {
    proposer: RegionProposer,
    annotator: Annotator,
    threshold: f32,
    debug: Option<DebugConfig>,
}

impl Pipeline {
    /// Pipeline with default parameters
    pub fn new() -> Self {
        Self::from_config(&DetectorConfig::default())
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self {
            proposer: RegionProposer::new(config.proposer.clone()),
            annotator: Annotator::new(&config.annotator),
            threshold: config.threshold,
            debug: None,
        }
    }

    /// Probabilities at or above the threshold are labelled E-Waste
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.proposer = self.proposer.with_min_area(min_area);
        self
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(Error::DebugOutput(format!(
                    "directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn proposer(&self) -> &RegionProposer {
        &self.proposer
    }

    /// Load an image and run the pipeline on it
    pub fn run<P, C>(&self, image_path: P, classifier: &C) -> Result<(RgbImage, Vec<Detection>)>
    where
        P: AsRef<Path>,
        C: RegionClassifier + ?Sized,
    {
        let image_path = image_path.as_ref();
        let img = load_image(image_path)?;
        debug!(
            "Loaded {} ({}x{})",
            image_path.display(),
            img.width(),
            img.height()
        );

        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let debug_dir = self.debug_dir_for(&stem);

        let result = self.execute(&img, classifier, debug_dir.as_deref())?;
        info!(
            "{}: {} detection(s)",
            image_path.display(),
            result.1.len()
        );
        Ok(result)
    }

    /// Run the pipeline on an already decoded image
    pub fn run_image<C>(
        &self,
        img: &DynamicImage,
        classifier: &C,
    ) -> Result<(RgbImage, Vec<Detection>)>
    where
        C: RegionClassifier + ?Sized,
    {
        let debug_dir = self.debug_dir_for("image");
        self.execute(img, classifier, debug_dir.as_deref())
    }

    /// First unused `<stem>`, `<stem>-2`, `<stem>-3`, ... under the debug root,
    /// so images sharing a file stem never overwrite each other's stages
    fn debug_dir_for(&self, stem: &str) -> Option<PathBuf> {
        let root = &self.debug.as_ref()?.output_dir;
        let mut dir = root.join(stem);
        let mut n = 2;
        while dir.exists() {
            dir = root.join(format!("{stem}-{n}"));
            n += 1;
        }
        Some(dir)
    }

    fn execute<C>(
        &self,
        img: &DynamicImage,
        classifier: &C,
        debug_dir: Option<&Path>,
    ) -> Result<(RgbImage, Vec<Detection>)>
    where
        C: RegionClassifier + ?Sized,
    {
        let stages = self.proposer.run_stages(img);
        let mut display = img.to_rgb8();

        if let Some(dir) = debug_dir {
            std::fs::create_dir_all(dir)?;
            save_debug(img, &dir.join("00_input.png"))?;
            save_debug_gray(&stages.grayscale, &dir.join("01_grayscale.png"))?;
            save_debug_gray(&stages.blurred, &dir.join("02_blur.png"))?;
            if let Some(binary) = &stages.binary {
                save_debug_gray(binary, &dir.join("03_binary.png"))?;
            }
        }

        let mut detections = Vec::with_capacity(stages.regions.len());

        for (i, region) in stages.regions.iter().enumerate() {
            let Some(roi) = region.bbox.extract_roi(img) else {
                warn!("Skipping region {} with empty crop at {}", i + 1, region.bbox);
                continue;
            };

            if let Some(dir) = debug_dir {
                let regions_dir = dir.join("04_regions");
                std::fs::create_dir_all(&regions_dir)?;
                save_debug(&roi, &regions_dir.join(format!("{:02}.png", i + 1)))?;
            }

            let probability = classifier.classify(&roi)?;
            let detection = Detection {
                label: decide(probability, self.threshold),
                confidence: probability,
                bbox: region.bbox,
            };
            debug!(
                "Region {} at {} (area {:.0}): {}",
                i + 1,
                region.bbox,
                region.area,
                detection.caption()
            );

            self.annotator.draw(&mut display, &detection);
            detections.push(detection);
        }

        if let Some(dir) = debug_dir {
            display
                .save(dir.join("05_annotated.png"))
                .map_err(|e| Error::DebugOutput(format!("failed to save annotated image: {e}")))?;
        }

        Ok((display, detections))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn save_debug(img: &DynamicImage, path: &Path) -> Result<()> {
    img.save(path)
        .map_err(|e| Error::DebugOutput(format!("failed to save {}: {e}", path.display())))
}

fn save_debug_gray(img: &GrayImage, path: &Path) -> Result<()> {
    img.save(path)
        .map_err(|e| Error::DebugOutput(format!("failed to save {}: {e}", path.display())))
}
