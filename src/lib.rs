pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use config::{
    AnnotatorConfig, ChannelOrder, ClassifierConfig, DetectorConfig, Polarity, ProposerConfig,
    TensorLayout,
};
pub use detection::{decide, Annotator, ModelClassifier, RegionClassifier, RegionProposer};
pub use error::{Error, Result};
pub use models::{BoundingBox, Detection, Region, WasteClass};
pub use pipeline::{load_image, DebugConfig, Pipeline};
