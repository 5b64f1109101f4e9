use std::fmt;

use image::{DynamicImage, Rgb};
use serde::Serialize;

/// Axis-aligned box in source image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Clamp the box to an image of the given size.
    /// Returns None when nothing of the box is left.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<BoundingBox> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }
        let width = self.width.min(image_width - self.x);
        let height = self.height.min(image_height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(BoundingBox::new(self.x, self.y, width, height))
    }

    /// Cut the region of interest out of the source image
    pub fn extract_roi(&self, img: &DynamicImage) -> Option<DynamicImage> {
        let clamped = self.clamp_to(img.width(), img.height())?;
        Some(img.crop_imm(clamped.x, clamped.y, clamped.width, clamped.height))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.width, self.height)
    }
}

/// One external contour found by the region proposer
#[derive(Debug, Clone)]
pub struct Region {
    /// Compressed outline: only the vertices where the direction changes
    pub vertices: Vec<(i32, i32)>,
    /// Polygon area enclosed by the outline, in pixels²
    pub area: f64,
    pub bbox: BoundingBox,
}

impl Region {
    pub fn from_vertices(vertices: Vec<(i32, i32)>) -> Option<Self> {
        let min_x = vertices.iter().map(|p| p.0).min()?;
        let min_y = vertices.iter().map(|p| p.1).min()?;
        let max_x = vertices.iter().map(|p| p.0).max()?;
        let max_y = vertices.iter().map(|p| p.1).max()?;
        if min_x < 0 || min_y < 0 {
            return None;
        }

        let bbox = BoundingBox::new(
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        );
        let area = polygon_area(&vertices);

        Some(Self { vertices, area, bbox })
    }
}

/// Shoelace area of a closed polygon
pub fn polygon_area(vertices: &[(i32, i32)]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: i64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.0 as i64 * b.1 as i64 - b.0 as i64 * a.1 as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WasteClass {
    #[serde(rename = "E-Waste")]
    EWaste,
    #[serde(rename = "Normal Waste")]
    NormalWaste,
}

impl WasteClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteClass::EWaste => "E-Waste",
            WasteClass::NormalWaste => "Normal Waste",
        }
    }

    /// Overlay colour for boxes and captions
    pub fn color(&self) -> Rgb<u8> {
        match self {
            WasteClass::EWaste => Rgb([255, 0, 0]),
            WasteClass::NormalWaste => Rgb([0, 255, 0]),
        }
    }
}

impl fmt::Display for WasteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub label: WasteClass,
    /// Raw classifier probability for the box's crop
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    /// Caption text drawn above the box
    pub fn caption(&self) -> String {
        format!("{}: {:.2}", self.label, self.confidence)
    }
}
