use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::separable_filter_equal;

use crate::config::Polarity;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Sigma OpenCV picks for a Gaussian kernel of the given size when none is supplied
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian taps for an odd kernel size
pub fn gaussian_kernel(kernel_size: u32) -> Vec<f32> {
    let sigma = sigma_for_kernel(kernel_size);
    let half = (kernel_size / 2) as i32;
    let taps: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Apply a square Gaussian blur of fixed kernel size
pub fn apply_blur(img: &GrayImage, kernel_size: u32) -> GrayImage {
    separable_filter_equal(img, &gaussian_kernel(kernel_size))
}

/// Otsu binarization. Object pixels become 255, background 0.
/// Returns None for a flat image, which has nothing to separate.
pub fn binarize(img: &GrayImage, polarity: Polarity) -> Option<GrayImage> {
    let (lo, hi) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if lo >= hi {
        return None;
    }

    let level = otsu_level(img);
    let bright = threshold(img, level, ThresholdType::Binary);

    let dark_objects = match polarity {
        Polarity::DarkObjects => true,
        Polarity::BrightObjects => false,
        Polarity::Auto => border_foreground_ratio(&bright) > 0.5,
    };

    if dark_objects {
        Some(threshold(img, level, ThresholdType::BinaryInverted))
    } else {
        Some(bright)
    }
}

/// Fraction of border pixels that are set in a binary image
fn border_foreground_ratio(binary: &GrayImage) -> f32 {
    let (width, height) = binary.dimensions();
    let mut set = 0u64;
    let mut total = 0u64;

    for (x, y, pixel) in binary.enumerate_pixels() {
        if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
            total += 1;
            if pixel[0] > 0 {
                set += 1;
            }
        }
    }

    if total == 0 {
        return 0.0;
    }
    set as f32 / total as f32
}
