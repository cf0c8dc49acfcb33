use clap::Parser;
use infer_bbox::io::{load_image_size, save_annotated};
use infer_bbox::{AnchorShape, Detection, DetectorConfig, InferBbox};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "InferBbox CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for the filter stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectorConfigJson {
    image_width: usize,
    image_height: usize,
    grid_width: usize,
    grid_height: usize,
    anchor_shapes: Vec<[f64; 2]>,
    labels: Vec<String>,
    nms_intersection_thresh: f64,
    n_top_detections: usize,
    epsilon: f64,
    parallel: bool,
}

impl Default for DetectorConfigJson {
    fn default() -> Self {
        let cfg = DetectorConfig::default();
        Self {
            image_width: cfg.image_width,
            image_height: cfg.image_height,
            grid_width: cfg.grid_width,
            grid_height: cfg.grid_height,
            anchor_shapes: cfg
                .anchor_shapes
                .iter()
                .map(|s| [s.width, s.height])
                .collect(),
            labels: cfg.labels,
            nms_intersection_thresh: cfg.nms_intersection_thresh,
            n_top_detections: cfg.n_top_detections,
            epsilon: cfg.epsilon,
            parallel: cfg.parallel,
        }
    }
}

impl DetectorConfigJson {
    fn into_config(self, threshold: f64) -> DetectorConfig {
        DetectorConfig {
            image_width: self.image_width,
            image_height: self.image_height,
            grid_width: self.grid_width,
            grid_height: self.grid_height,
            anchor_shapes: self
                .anchor_shapes
                .into_iter()
                .map(|[w, h]| AnchorShape::new(w, h))
                .collect(),
            labels: self.labels,
            intersection_thresh: threshold,
            nms_intersection_thresh: self.nms_intersection_thresh,
            n_top_detections: self.n_top_detections,
            epsilon: self.epsilon,
            parallel: self.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    prediction_path: String,
    output_path: Option<String>,
    threshold: f64,
    image_path: Option<String>,
    annotated_path: Option<String>,
    detector: DetectorConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prediction_path: String::new(),
            output_path: None,
            threshold: infer_bbox::DEFAULT_THRESH,
            image_path: None,
            annotated_path: None,
            detector: DetectorConfigJson::default(),
        }
    }
}

/// Raw model outputs, flattened in anchor-major order.
#[derive(Debug, Deserialize)]
struct PredictionFile {
    delta_bbox: Vec<f32>,
    class_scores: Vec<f32>,
    conf_scores: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: String,
    class_idx: usize,
    prob: f64,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    pixel_rect: [i32; 4],
}

impl From<&Detection> for DetectionRecord {
    fn from(value: &Detection) -> Self {
        Self {
            label: value.label_name.clone(),
            class_idx: value.class_idx,
            prob: value.class_prob,
            xmin: value.xmin,
            ymin: value.ymin,
            xmax: value.xmax,
            ymax: value.ymax,
            pixel_rect: value.pixel_rect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    threshold: f64,
    detections: Vec<DetectionRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("infer_bbox=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.prediction_path.is_empty() {
        return Err("prediction_path must be set in the config".into());
    }
    if config.annotated_path.is_some() && config.image_path.is_none() {
        return Err("annotated_path requires image_path".into());
    }

    let detector_cfg = config.detector.into_config(config.threshold);
    if let Some(image_path) = &config.image_path {
        let (width, height) = load_image_size(image_path)?;
        if (width, height) != (detector_cfg.image_width, detector_cfg.image_height) {
            return Err(format!(
                "image is {width}x{height} but the detector expects {}x{}",
                detector_cfg.image_width, detector_cfg.image_height
            )
            .into());
        }
    }

    let prediction_text = fs::read_to_string(&config.prediction_path)?;
    let prediction: PredictionFile = serde_json::from_str(&prediction_text)?;

    let mut infer = InferBbox::with_config(
        detector_cfg,
        &prediction.delta_bbox,
        &prediction.class_scores,
        &prediction.conf_scores,
    )?;
    infer.filter(config.threshold);
    tracing::info!(count = infer.detections().len(), "filter finished");

    if let (Some(image_path), Some(annotated_path)) = (&config.image_path, &config.annotated_path)
    {
        save_annotated(image_path, annotated_path, infer.detections())?;
    }

    let output = Output {
        threshold: config.threshold,
        detections: infer.detections().iter().map(DetectionRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
