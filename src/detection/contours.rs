use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};

use crate::models::Region;

/// Outer borders of the top-level foreground components, in scan order.
/// Borders of holes, and components nested inside holes, are skipped.
pub fn find_external_regions(binary: &GrayImage) -> Vec<Region> {
    // Components touching the image edge are only traced as outer borders
    // when surrounded by background, so trace on a 1px zero frame.
    let (width, height) = binary.dimensions();
    let mut padded = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut padded, binary, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| {
            let points: Vec<(i32, i32)> = c.points.iter().map(|p| (p.x - 1, p.y - 1)).collect();
            Region::from_vertices(compress_chain(&points))
        })
        .collect()
}

/// Keep only the vertices of a closed chain where the step direction changes
pub fn compress_chain(points: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let mut points = points.to_vec();
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    let n = points.len();
    if n < 3 {
        return points;
    }

    let direction = |a: (i32, i32), b: (i32, i32)| ((b.0 - a.0).signum(), (b.1 - a.1).signum());

    let mut kept = Vec::new();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        if direction(prev, cur) != direction(cur, next) {
            kept.push(cur);
        }
    }
    kept
}

/// Drop regions enclosing less than min_area pixels²
pub fn filter_by_area(regions: Vec<Region>, min_area: f64) -> Vec<Region> {
    regions.into_iter().filter(|r| r.area >= min_area).collect()
}
