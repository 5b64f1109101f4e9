use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::RgbImage;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use log::{debug, warn};

use crate::config::AnnotatorConfig;
use crate::models::{Detection, WasteClass};

/// Gap between a caption's baseline and the top edge of its box
const CAPTION_GAP: i32 = 10;

/// Fonts tried when no caption font is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Label a probability. The threshold itself counts as e-waste.
pub fn decide(probability: f32, threshold: f32) -> WasteClass {
    if probability >= threshold {
        WasteClass::EWaste
    } else {
        WasteClass::NormalWaste
    }
}

/// Draws detections onto the display copy of an image
pub struct Annotator {
    font: Option<FontVec>,
    scale: PxScale,
    thickness: u32,
}

impl Annotator {
    pub fn new(config: &AnnotatorConfig) -> Self {
        let font = match &config.font_path {
            Some(path) => load_font(path),
            None => SYSTEM_FONTS.iter().map(Path::new).find_map(load_font),
        };
        if font.is_none() {
            warn!("No caption font available; detections will be drawn without labels");
        }

        Self {
            font,
            scale: PxScale::from(config.font_scale),
            thickness: config.line_thickness.max(1),
        }
    }

    /// Annotator that only draws boxes
    pub fn without_captions(config: &AnnotatorConfig) -> Self {
        Self {
            font: None,
            scale: PxScale::from(config.font_scale),
            thickness: config.line_thickness.max(1),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Box outline plus caption, both in the label's colour
    pub fn draw(&self, canvas: &mut RgbImage, detection: &Detection) {
        let color = detection.label.color();
        let bbox = detection.bbox;

        for t in 0..self.thickness {
            let width = bbox.width.saturating_sub(2 * t);
            let height = bbox.height.saturating_sub(2 * t);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at((bbox.x + t) as i32, (bbox.y + t) as i32).of_size(width, height);
            draw_hollow_rect_mut(canvas, rect, color);
        }

        if let Some(font) = &self.font {
            let caption = detection.caption();
            let (_, text_height) = text_size(self.scale, font, &caption);
            let top = (bbox.y as i32 - CAPTION_GAP - text_height as i32).max(0);
            draw_text_mut(canvas, color, bbox.x as i32, top, self.scale, font, &caption);
        }
    }
}

fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = std::fs::read(path).ok()?;
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            debug!("Using caption font {}", path.display());
            Some(font)
        }
        Err(e) => {
            warn!("Ignoring font {}: {}", path.display(), e);
            None
        }
    }
}

