pub mod annotate;
pub mod classifier;
pub mod contours;
pub mod preprocessing;

use image::{DynamicImage, GrayImage};
use log::debug;

use crate::config::ProposerConfig;
use crate::models::{BoundingBox, Region};

pub use annotate::{decide, Annotator};
pub use classifier::{prepare_input, ModelClassifier, RegionClassifier};

/// Intermediate images produced while proposing regions
pub struct ProposalStages {
    pub grayscale: GrayImage,
    pub blurred: GrayImage,
    /// None when the image is flat
    pub binary: Option<GrayImage>,
    pub regions: Vec<Region>,
}

/// Finds candidate object regions with blur, Otsu threshold and external contours
#[derive(Debug, Clone, Default)]
pub struct RegionProposer {
    pub config: ProposerConfig,
}

impl RegionProposer {
    pub fn new(config: ProposerConfig) -> Self {
        Self { config }
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.config.min_area = min_area;
        self
    }

    /// Bounding boxes of all regions large enough to classify
    pub fn propose(&self, img: &DynamicImage) -> Vec<BoundingBox> {
        self.propose_regions(img).into_iter().map(|r| r.bbox).collect()
    }

    pub fn propose_regions(&self, img: &DynamicImage) -> Vec<Region> {
        self.run_stages(img).regions
    }

    /// Run every proposal stage, keeping the intermediate images
    pub fn run_stages(&self, img: &DynamicImage) -> ProposalStages {
        let grayscale = preprocessing::to_grayscale(img);
        let blurred = preprocessing::apply_blur(&grayscale, self.config.blur_kernel_size);
        let binary = preprocessing::binarize(&blurred, self.config.polarity);

        let regions = match &binary {
            Some(binary) => {
                let all = contours::find_external_regions(binary);
                let total = all.len();
                let kept = contours::filter_by_area(all, self.config.min_area);
                debug!(
                    "Found {} external contours, {} with area >= {}",
                    total,
                    kept.len(),
                    self.config.min_area
                );
                kept
            }
            None => {
                debug!("Image is flat, no regions to propose");
                Vec::new()
            }
        };

        ProposalStages {
            grayscale,
            blurred,
            binary,
            regions,
        }
    }
}
