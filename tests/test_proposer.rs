//! Integration tests for region proposal.
//!
//! Tests cover:
//! - Tight boxes around single and multiple objects
//! - Flat images producing no regions
//! - Minimum-area filtering
//! - Holes and objects nested in holes
//! - Foreground polarity selection

mod common;

use image::Rgb;
use wastescan::ProposerConfig;
use wastescan::detection::contours::{compress_chain, find_external_regions};
use wastescan::detection::preprocessing::{binarize, gaussian_kernel, sigma_for_kernel};
use wastescan::models::polygon_area;

use common::*;

#[test]
fn test_single_square_yields_one_tight_box() {
    let img = single_square_image();
    let boxes = RegionProposer::default().propose(&img);

    assert_eq!(boxes.len(), 1, "Expected exactly one box, got {boxes:?}");
    let bbox = boxes[0];
    assert_close(bbox.x, 50, "x");
    assert_close(bbox.y, 50, "y");
    assert_close(bbox.width, 100, "width");
    assert_close(bbox.height, 100, "height");
}

#[test]
fn test_region_area_is_polygon_area() {
    let img = single_square_image();
    let regions = RegionProposer::default().propose_regions(&img);

    assert_eq!(regions.len(), 1);
    // Outline runs through border pixel centres, so a 100px square encloses ~99²
    let area = regions[0].area;
    assert!((9000.0..=10_500.0).contains(&area), "unexpected area {area}");
}

#[test]
fn test_uniform_images_yield_nothing() {
    for color in [WHITE, BLACK, Rgb([128, 64, 200])] {
        let img = canvas_with_squares(200, 150, color, color, &[]);
        let boxes = RegionProposer::default().propose(&img);
        assert!(boxes.is_empty(), "Uniform {color:?} image produced {boxes:?}");
    }
}

#[test]
fn test_two_disjoint_squares_yield_two_boxes() {
    let img = canvas_with_squares(400, 300, WHITE, BLACK, &[(30, 40, 80), (220, 150, 60)]);
    let mut boxes = RegionProposer::default().propose(&img);
    assert_eq!(boxes.len(), 2);

    // Proposal order is unspecified
    boxes.sort_by_key(|b| b.x);
    assert_close(boxes[0].x, 30, "first x");
    assert_close(boxes[0].width, 80, "first width");
    assert_close(boxes[1].x, 220, "second x");
    assert_close(boxes[1].height, 60, "second height");
}

#[test]
fn test_small_specks_are_filtered() {
    let img = canvas_with_squares(300, 300, WHITE, BLACK, &[(50, 50, 100), (220, 220, 20)]);

    let boxes = RegionProposer::default().propose(&img);
    assert_eq!(boxes.len(), 1, "Speck should be under the default minimum area");

    let boxes = RegionProposer::default().with_min_area(100.0).propose(&img);
    assert_eq!(boxes.len(), 2, "Speck should pass a lowered minimum area");
}

#[test]
fn test_holes_and_nested_objects_are_ignored() {
    // Black frame with a white hole, and a black square inside the hole
    let mut img = canvas_with_squares(300, 300, WHITE, BLACK, &[(50, 50, 200)]).to_rgb8();
    for y in 100..200 {
        for x in 100..200 {
            let inner = (130..170).contains(&x) && (130..170).contains(&y);
            img.put_pixel(x, y, if inner { BLACK } else { WHITE });
        }
    }
    let img = image::DynamicImage::ImageRgb8(img);

    let boxes = RegionProposer::default().propose(&img);
    assert_eq!(boxes.len(), 1, "Only the outer frame should be proposed: {boxes:?}");
    assert_close(boxes[0].width, 200, "width");
}

#[test]
fn test_bright_object_on_dark_background() {
    let img = canvas_with_squares(300, 300, BLACK, WHITE, &[(120, 80, 90)]);

    let boxes = RegionProposer::default().propose(&img);
    assert_eq!(boxes.len(), 1);
    assert_close(boxes[0].x, 120, "x");
    assert_close(boxes[0].width, 90, "width");

    let bright = RegionProposer::new(ProposerConfig {
        polarity: Polarity::BrightObjects,
        ..Default::default()
    });
    assert_eq!(bright.propose(&img), boxes);
}

#[test]
fn test_forced_polarity_can_select_background() {
    let img = single_square_image();
    let proposer = RegionProposer::new(ProposerConfig {
        polarity: Polarity::BrightObjects,
        ..Default::default()
    });

    // The white background becomes one region spanning the whole frame
    let boxes = proposer.propose(&img);
    assert_eq!(boxes, vec![BoundingBox::new(0, 0, 300, 300)]);
}

#[test]
fn test_proposal_is_deterministic() {
    let img = canvas_with_squares(400, 300, WHITE, BLACK, &[(30, 40, 80), (220, 150, 60)]);
    let proposer = RegionProposer::default();
    assert_eq!(proposer.propose(&img), proposer.propose(&img));
}

#[test]
fn test_boxes_stay_inside_image() {
    // One object touching the image corner, one in the interior
    let img = canvas_with_squares(200, 200, WHITE, BLACK, &[(0, 0, 60), (150, 150, 50)]);
    let mut boxes = RegionProposer::default().propose(&img);
    assert_eq!(boxes.len(), 2, "Both objects should be proposed: {boxes:?}");

    for bbox in &boxes {
        assert!(bbox.width > 0 && bbox.height > 0);
        assert!(bbox.x + bbox.width <= 200, "{bbox:?} exceeds width");
        assert!(bbox.y + bbox.height <= 200, "{bbox:?} exceeds height");
    }

    boxes.sort_by_key(|b| b.x);
    assert_eq!((boxes[0].x, boxes[0].y), (0, 0));
    assert_close(boxes[0].width, 60, "corner width");
    assert_close(boxes[0].height, 60, "corner height");
}

#[test]
fn test_objects_touching_left_and_top_edges() {
    let left = canvas_with_squares(200, 200, WHITE, BLACK, &[(0, 70, 60)]);
    let boxes = RegionProposer::default().propose(&left);
    assert_eq!(boxes.len(), 1, "Left-edge object missing: {boxes:?}");
    assert_eq!(boxes[0].x, 0);
    assert_close(boxes[0].y, 70, "left y");
    assert_close(boxes[0].width, 60, "left width");

    let top = canvas_with_squares(200, 200, WHITE, BLACK, &[(90, 0, 60)]);
    let boxes = RegionProposer::default().propose(&top);
    assert_eq!(boxes.len(), 1, "Top-edge object missing: {boxes:?}");
    assert_eq!(boxes[0].y, 0);
    assert_close(boxes[0].x, 90, "top x");
}

#[test]
fn test_edge_touching_component_on_binary_image() {
    let binary = image::GrayImage::from_fn(200, 200, |x, y| {
        let inside = x < 60 && (70..130).contains(&y);
        image::Luma([if inside { 255 } else { 0 }])
    });
    let regions = find_external_regions(&binary);

    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].bbox, BoundingBox::new(0, 70, 60, 60));
    assert_eq!(regions[0].area, 59.0 * 59.0);
}

#[test]
fn test_compress_chain_keeps_corners() {
    let chain = vec![(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2), (0, 1)];
    assert_eq!(compress_chain(&chain), vec![(0, 0), (2, 0), (2, 2), (0, 2)]);
    assert_eq!(polygon_area(&compress_chain(&chain)), 4.0);
}

#[test]
fn test_external_contours_on_binary_image() {
    let binary = image::GrayImage::from_fn(50, 50, |x, y| {
        let inside = (10..30).contains(&x) && (5..25).contains(&y);
        image::Luma([if inside { 255 } else { 0 }])
    });
    let regions = find_external_regions(&binary);

    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].bbox, BoundingBox::new(10, 5, 20, 20));
    assert_eq!(regions[0].vertices.len(), 4);
    assert_eq!(regions[0].area, 19.0 * 19.0);
}

#[test]
fn test_gaussian_kernel_matches_auto_sigma() {
    assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);

    let kernel = gaussian_kernel(5);
    assert_eq!(kernel.len(), 5);
    assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    assert_eq!(kernel[0], kernel[4]);
    assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);
}

#[test]
fn test_binarize_flat_image_is_none() {
    let flat = image::GrayImage::from_pixel(10, 10, image::Luma([42]));
    assert!(binarize(&flat, Polarity::Auto).is_none());
}
