use image::{DynamicImage, Rgb, RgbImage};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use wastescan::{AnnotatorConfig, Annotator, DetectorConfig, Pipeline, RegionClassifier, Result};

/// Axis-aligned filled square: (x, y, side)
pub type Square = (u32, u32, u32);

/// Creates a canvas of the given colour with filled squares drawn on it.
pub fn canvas_with_squares(
    width: u32,
    height: u32,
    background: Rgb<u8>,
    foreground: Rgb<u8>,
    squares: &[Square],
) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let inside = squares
            .iter()
            .any(|&(sx, sy, side)| x >= sx && x < sx + side && y >= sy && y < sy + side);
        if inside { foreground } else { background }
    });
    DynamicImage::ImageRgb8(img)
}

/// The 300x300 white image with one black 100x100 square at (50, 50).
pub fn single_square_image() -> DynamicImage {
    canvas_with_squares(300, 300, WHITE, BLACK, &[(50, 50, 100)])
}

/// Saves an image to a temp PNG; the file is removed when dropped.
pub fn save_temp_png(img: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Pipeline with default parameters that draws boxes only, so tests do not
/// depend on fonts installed on the machine.
pub fn test_pipeline() -> Pipeline {
    let config = DetectorConfig::default();
    let annotator = Annotator::without_captions(&AnnotatorConfig::default());
    Pipeline::from_config(&config).with_annotator(annotator)
}

/// Path of a file checked in under tests/fixtures/.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Classifier stub returning the same score for every region, counting calls.
pub struct ConstantClassifier {
    pub score: f32,
    pub calls: Cell<usize>,
}

impl ConstantClassifier {
    pub fn new(score: f32) -> Self {
        Self {
            score,
            calls: Cell::new(0),
        }
    }
}

impl RegionClassifier for ConstantClassifier {
    fn classify(&self, _region: &DynamicImage) -> Result<f32> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.score)
    }
}

/// Classifier stub scoring a region by its mean darkness, in [0, 1].
pub struct DarknessClassifier;

impl RegionClassifier for DarknessClassifier {
    fn classify(&self, region: &DynamicImage) -> Result<f32> {
        let gray = region.to_luma8();
        let sum: u64 = gray.pixels().map(|p| p[0] as u64).sum();
        let count = (gray.width() * gray.height()).max(1) as f32;
        Ok(1.0 - sum as f32 / count / 255.0)
    }
}

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Asserts that two box edges are within a few pixels of each other.
pub fn assert_close(actual: u32, expected: u32, what: &str) {
    let diff = (actual as i64 - expected as i64).abs();
    assert!(diff <= 3, "{what}: expected ~{expected}, got {actual}");
}
