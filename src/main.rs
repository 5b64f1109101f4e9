use anyhow::Context;
use clap::Parser;
use log::error;
use std::path::{Path, PathBuf};

use wastescan::{Detection, DetectorConfig, ModelClassifier, Pipeline};

#[derive(Parser)]
#[command(name = "wastescan")]
#[command(about = "Find objects in images and classify them as e-waste or normal waste")]
struct Cli {
    /// Input image files
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Classifier model file
    #[arg(short, long, value_name = "PATH", default_value = "waste_classifier_binary.rten")]
    model: PathBuf,

    /// JSON detector configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Probability at or above which a region is labelled E-Waste
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Minimum contour area in pixels²
    #[arg(long)]
    min_area: Option<f64>,

    /// TrueType font for box captions
    #[arg(long, value_name = "PATH")]
    font: Option<PathBuf>,

    /// Save annotated images to this directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Print detections as JSON
    #[arg(long)]
    json: bool,

    /// Save intermediate images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(serde::Serialize)]
struct ImageReport<'a> {
    image: &'a Path,
    detections: &'a [Detection],
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match &args.config {
        Some(path) => DetectorConfig::from_file(path)?,
        None => DetectorConfig::default(),
    }
    .with_overrides(args.threshold, args.min_area, args.font.clone())?;

    let classifier = ModelClassifier::load(&args.model, config.classifier.clone())?;

    let mut pipeline = Pipeline::from_config(&config);
    if let Some(debug_dir) = args.debug_out {
        pipeline = pipeline.with_debug(debug_dir)?;
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut failures = 0usize;

    for image_path in &args.images {
        let (annotated, detections) = match pipeline.run(image_path, &classifier) {
            Ok(result) => result,
            Err(e) => {
                error!("{e}");
                failures += 1;
                continue;
            }
        };

        if args.json {
            let report = ImageReport {
                image: image_path,
                detections: &detections,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("\n=== {} ===", image_path.display());
            if detections.is_empty() {
                println!("No objects detected.");
            }
            for (i, detection) in detections.iter().enumerate() {
                println!(
                    "Object {}: {} (Confidence: {:.2}) at {}",
                    i + 1,
                    detection.label,
                    detection.confidence,
                    detection.bbox
                );
            }
        }

        if let Some(dir) = &args.output_dir {
            let output_path = dir.join(annotated_file_name(image_path));
            annotated
                .save(&output_path)
                .with_context(|| format!("Failed to save {}", output_path.display()))?;
        }
    }

    drop(classifier);

    if failures > 0 {
        anyhow::bail!("{} of {} image(s) could not be processed", failures, args.images.len());
    }

    Ok(())
}

fn annotated_file_name(image_path: &Path) -> String {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{stem}_annotated.png")
}
