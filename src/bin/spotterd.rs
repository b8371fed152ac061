//! spotterd - the frame loop daemon
//!
//! 1. Loads configuration (file + env + CLI overrides)
//! 2. Opens the camera source and the selected display backend
//! 3. Builds the detector (ONNX model, or the stub when none is configured)
//! 4. Runs the capture/detect/render/display loop until interrupted
//! 5. Prints a session summary on every exit path

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use spotter::detect::DetectorSettings;
use spotter::{
    CameraConfig, CameraSource, DetectorBackend, DisplayBackend, FrameLoop, LoopSettings,
    SpotterConfig, StubBackend,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file path (otherwise SPOTTER_CONFIG, otherwise defaults).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Display backend: console, window, oled, or tft.
    #[arg(long)]
    display: Option<String>,
    /// Camera device path, or a stub:// name for the synthetic source.
    #[arg(long)]
    camera: Option<String>,
    /// ONNX detection model path.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = SpotterConfig::load_from(args.config.as_deref())?;
    if let Some(display) = args.display.as_deref() {
        config.display = display.parse()?;
    }
    if let Some(camera) = args.camera {
        config.camera.device = camera;
    }
    if let Some(model) = args.model {
        config.detection.model_path = Some(model);
    }
    if let Some(max_frames) = args.max_frames {
        config.max_frames = Some(max_frames);
    }

    let mut source = CameraSource::new(CameraConfig {
        device: config.camera.device.clone(),
        width: config.camera.width,
        height: config.camera.height,
        target_fps: config.camera.target_fps,
        frame_limit: None,
    })?;
    source.connect()?;

    let mut detector = build_detector(&config)?;
    detector.warm_up().context("detector warm-up failed")?;

    let display = DisplayBackend::open(config.display, &config)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handle = stop.clone();
    ctrlc::set_handler(move || {
        stop_handle.store(true, Ordering::Relaxed);
    })
    .context("failed to install interrupt handler")?;

    log::info!(
        "spotterd running: camera={} display={} detector={}",
        config.camera.device,
        display.name(),
        detector.name()
    );
    log::info!(
        "detection: every {} frames, confidence >= {:.2}, iou <= {:.2}",
        config.detection.interval,
        config.detection.confidence_threshold,
        config.detection.iou_threshold
    );

    let mut frame_loop = FrameLoop::new(
        source,
        detector,
        display,
        LoopSettings::from_config(&config),
        stop,
    );
    let outcome = frame_loop.run();

    let stats = frame_loop.stats();
    println!("--- session summary ---");
    println!("total frames:      {}", stats.frames);
    println!("detection cycles:  {}", stats.detect_cycles);
    println!(
        "recovered faults:  {} detection, {} display",
        stats.detect_failures, stats.display_failures
    );
    println!("elapsed:           {:.2}s", stats.elapsed().as_secs_f64());
    println!("average FPS:       {:.2}", stats.average_fps());

    outcome
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
        None => {
            log::info!("no model configured; using the stub scene-change detector");
            Ok(Box::new(StubBackend::new()))
        }
    }
}
