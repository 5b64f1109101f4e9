#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from wastescan for tests
#[allow(unused_imports)]
pub use wastescan::{
    BoundingBox, Detection, DetectorConfig, Error, Pipeline, Polarity, RegionProposer, WasteClass,
};
