//! Spotter
//!
//! A small edge-vision pipeline: camera frames flow through a pretrained
//! object-detection model and the results are rendered on one display
//! backend chosen at startup.
//!
//! # Architecture
//!
//! The whole system is one synchronous, cooperative loop:
//!
//! 1. Capture a frame from the camera source.
//! 2. Every Nth frame, run the detector and cache the resulting
//!    (label, confidence, box) list; skipped frames reuse the cache.
//! 3. Render the cached detections (text block or annotated frame copy).
//! 4. Dispatch to the active backend: console, window, OLED, or TFT.
//!
//! Capture faults end the run; detection and display faults are logged and
//! skipped. There is no persistence and no network surface.
//!
//! # Module Structure
//!
//! - `frame`: packed RGB frame buffer
//! - `capture`: camera sources (synthetic `stub://`, V4L2 devices)
//! - `detect`: detector backends, detection results, COCO classes, NMS
//! - `overlay`: rendering shared by every backend
//! - `display`: the backend dispatch (console / window / OLED / TFT)
//! - `config`: startup configuration (JSON file + env overrides)
//! - `runtime`: the frame loop controller

pub mod capture;
pub mod config;
pub mod detect;
pub mod display;
pub mod frame;
pub mod overlay;
pub mod runtime;

pub use capture::{CameraConfig, CameraSource, CameraStats};
pub use config::{
    CameraSettings, DetectionSettings, OledSettings, SpotterConfig, TftSettings,
};
pub use detect::{
    class_name, nms, retain_confident, BBox, Detection, DetectorBackend, DetectorSettings,
    StubBackend, COCO_CLASSES, PERSON_CLASS,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use display::{
    ConsoleDisplay, DisplayBackend, DisplayMode, DisplayStatus, FrameReport,
};
pub use frame::Frame;
pub use runtime::{FrameLoop, LoopSettings, LoopStats, PipelineError, Stage};
