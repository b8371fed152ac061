//! snapshot - one-shot capture, detect, annotate, save
//!
//! Grabs a frame from the configured camera, runs the detector once, draws
//! the detections, and writes the annotated frame as a JPEG. Useful for
//! checking camera framing and model behavior without a display attached.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use spotter::detect::DetectorSettings;
use spotter::overlay::annotate;
use spotter::{
    retain_confident, CameraConfig, CameraSource, DetectorBackend, SpotterConfig, StubBackend,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file path (otherwise SPOTTER_CONFIG, otherwise defaults).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Camera device path, or a stub:// name for the synthetic source.
    #[arg(long)]
    camera: Option<String>,
    /// ONNX detection model path.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Output image path.
    #[arg(long, default_value = "snapshot.jpg")]
    out: PathBuf,
    /// Frames to discard before the captured one (camera auto-exposure).
    #[arg(long, default_value_t = 3)]
    warmup: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = SpotterConfig::load_from(args.config.as_deref())?;
    if let Some(camera) = args.camera {
        config.camera.device = camera;
    }
    if let Some(model) = args.model {
        config.detection.model_path = Some(model);
    }

    let mut source = CameraSource::new(CameraConfig {
        device: config.camera.device.clone(),
        width: config.camera.width,
        height: config.camera.height,
        target_fps: config.camera.target_fps,
        frame_limit: None,
    })?;
    source.connect()?;

    for _ in 0..args.warmup {
        source.next_frame().context("warm-up capture failed")?;
    }
    let frame = source.next_frame().context("capture failed")?;

    let mut detector = build_detector(&config)?;
    let mut detections = detector.detect(frame.pixels(), frame.width, frame.height)?;
    retain_confident(&mut detections, config.detection.confidence_threshold);

    if detections.is_empty() {
        println!("no objects detected");
    } else {
        println!(
            "{} object{} detected",
            detections.len(),
            if detections.len() == 1 { "" } else { "s" }
        );
        for (i, det) in detections.iter().enumerate() {
            println!("  {}. {} ({:.0}%)", i + 1, det.label(), det.confidence * 100.0);
        }
    }

    let annotated = annotate(&frame, &detections);
    annotated
        .save(&args.out)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    log::info!("wrote {}", args.out.display());

    Ok(())
}

fn build_detector(config: &SpotterConfig) -> Result<Box<dyn DetectorBackend>> {
    let settings = DetectorSettings {
        confidence_threshold: config.detection.confidence_threshold,
        iou_threshold: config.detection.iou_threshold,
        input_size: config.detection.input_size,
    };
    match &config.detection.model_path {
        Some(path) => {
            #[cfg(feature = "backend-tract")]
            {
                let backend = spotter::TractBackend::new(path, settings)?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                let _ = (path, settings);
                Err(anyhow::anyhow!(
                    "model inference requires the backend-tract feature"
                ))
            }
        }
        None => Ok(Box::new(StubBackend::new())),
    }
}
