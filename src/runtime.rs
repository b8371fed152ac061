//! The frame loop controller.
//!
//! One iteration: capture a frame, run the detector when the frame index
//! lands on the detection interval (reusing the cached detections
//! otherwise), then present the result on the active display backend.
//!
//! Fault policy: a capture fault is fatal and ends the loop; detection and
//! display faults are logged, counted, and skipped. Termination is
//! cooperative via a shared stop flag polled once per iteration. The camera
//! and display handles are owned by the loop and released by drop on every
//! exit path.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::capture::CameraSource;
use crate::config::SpotterConfig;
use crate::detect::{retain_confident, Detection, DetectorBackend};
use crate::display::{DisplayBackend, DisplayStatus, FrameReport};

// ----------------------------------------------------------------------------
// Fault classification
// ----------------------------------------------------------------------------

/// Pipeline stage a fault originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Capture,
    Detection,
    Display,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Detection => "detection",
            Stage::Display => "display",
        }
    }
}

/// Classified pipeline fault. Capture faults terminate the loop; detection
/// and display faults are recovered by skipping the affected stage.
#[derive(Debug)]
pub struct PipelineError {
    pub stage: Stage,
    pub message: String,
}

impl PipelineError {
    pub fn capture(err: anyhow::Error) -> Self {
        Self {
            stage: Stage::Capture,
            message: format!("{:#}", err),
        }
    }

    pub fn detection(err: anyhow::Error) -> Self {
        Self {
            stage: Stage::Detection,
            message: format!("{:#}", err),
        }
    }

    pub fn display(err: anyhow::Error) -> Self {
        Self {
            stage: Stage::Display,
            message: format!("{:#}", err),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.stage.as_str(), self.message)
    }
}

impl std::error::Error for PipelineError {}

// ----------------------------------------------------------------------------
// Loop settings and session counters
// ----------------------------------------------------------------------------

/// Loop behavior knobs, derived from the startup configuration.
#[derive(Clone, Copy, Debug)]
pub struct LoopSettings {
    /// Frames between successive detector invocations.
    pub detection_interval: u32,
    /// Minimum confidence for a detection to be presented.
    pub confidence_threshold: f32,
    /// Pace iterations to this rate (0 = free-running).
    pub target_fps: u32,
    /// Stop cleanly after this many frames (None = until interrupted).
    pub max_frames: Option<u64>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            detection_interval: 5,
            confidence_threshold: 0.5,
            target_fps: 0,
            max_frames: None,
        }
    }
}

impl LoopSettings {
    pub fn from_config(config: &SpotterConfig) -> Self {
        Self {
            detection_interval: config.detection.interval,
            confidence_threshold: config.detection.confidence_threshold,
            target_fps: config.camera.target_fps,
            max_frames: config.max_frames,
        }
    }
}

/// Session counters: one increment per loop iteration, reset only at
/// process start. FPS estimates derive from these and wall time alone.
#[derive(Debug)]
pub struct LoopStats {
    pub frames: u64,
    pub detect_cycles: u64,
    pub detect_failures: u64,
    pub display_failures: u64,
    started: Instant,
}

impl LoopStats {
    fn new() -> Self {
        Self {
            frames: 0,
            detect_cycles: 0,
            detect_failures: 0,
            display_failures: 0,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Average FPS over the whole session.
    pub fn average_fps(&self) -> f64 {
        self.fps_for(self.frames)
    }

    fn fps_for(&self, frames: u64) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs > 0.0 {
            frames as f64 / secs
        } else {
            0.0
        }
    }
}

// ----------------------------------------------------------------------------
// Frame loop
// ----------------------------------------------------------------------------

/// The frame loop controller. Owns the camera, detector, and display for the
/// lifetime of the run.
pub struct FrameLoop {
    source: CameraSource,
    detector: Box<dyn DetectorBackend>,
    display: DisplayBackend,
    settings: LoopSettings,
    stop: Arc<AtomicBool>,
    cached: Vec<Detection>,
    stats: LoopStats,
}

impl FrameLoop {
    pub fn new(
        source: CameraSource,
        detector: Box<dyn DetectorBackend>,
        display: DisplayBackend,
        settings: LoopSettings,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            detector,
            display,
            settings,
            stop,
            cached: Vec::new(),
            stats: LoopStats::new(),
        }
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Run until the stop flag is set, the frame limit is reached, the
    /// display closes, or the camera fails.
    pub fn run(&mut self) -> Result<()> {
        self.stats = LoopStats::new();
        let pace = (self.settings.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(self.settings.target_fps)));
        let mut last_health_log = Instant::now();

        loop {
            if self.stop.load(Ordering::Relaxed) {
                log::info!("stop requested; shutting down");
                break;
            }
            if let Some(limit) = self.settings.max_frames {
                if self.stats.frames >= limit {
                    log::info!("frame limit of {} reached", limit);
                    break;
                }
            }

            let iteration_start = Instant::now();
            let frame_index = self.stats.frames;

            let frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    let err = PipelineError::capture(err);
                    log::error!("{}", err);
                    return Err(err.into());
                }
            };

            if frame_index % u64::from(self.settings.detection_interval) == 0 {
                match self
                    .detector
                    .detect(frame.pixels(), frame.width, frame.height)
                {
                    Ok(mut detections) => {
                        retain_confident(&mut detections, self.settings.confidence_threshold);
                        log::debug!(
                            "frame {}: {} backend reported {} detections",
                            frame_index,
                            self.detector.name(),
                            detections.len()
                        );
                        self.stats.detect_cycles += 1;
                        self.cached = detections;
                    }
                    Err(err) => {
                        self.stats.detect_failures += 1;
                        log::warn!(
                            "{}; keeping previous detections",
                            PipelineError::detection(err)
                        );
                    }
                }
            }

            let report = FrameReport {
                frame_index,
                detections: &self.cached,
                fps: self.stats.fps_for(frame_index + 1),
            };
            match self.display.present(&frame, &report) {
                Ok(DisplayStatus::Active) => {}
                Ok(DisplayStatus::Closed) => {
                    self.stats.frames += 1;
                    log::info!("display closed; shutting down");
                    break;
                }
                Err(err) => {
                    self.stats.display_failures += 1;
                    log::warn!("{}; continuing", PipelineError::display(err));
                }
            }

            self.stats.frames += 1;

            if last_health_log.elapsed() >= Duration::from_secs(5) {
                let source_stats = self.source.stats();
                log::info!(
                    "camera health={} frames={} device={} fps={:.1}",
                    self.source.is_healthy(),
                    source_stats.frames_captured,
                    source_stats.device,
                    self.stats.fps_for(self.stats.frames)
                );
                last_health_log = Instant::now();
            }

            if let Some(pace) = pace {
                let spent = iteration_start.elapsed();
                if spent < pace {
                    std::thread::sleep(pace - spent);
                }
            }
        }

        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
