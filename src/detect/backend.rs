use anyhow::Result;

use crate::detect::result::Detection;

/// Thresholds and model geometry handed to detector backends at startup.
#[derive(Clone, Copy, Debug)]
pub struct DetectorSettings {
    /// Minimum model-reported probability for a detection to be kept.
    pub confidence_threshold: f32,
    /// Maximum allowed box overlap before the lower-confidence detection is
    /// suppressed.
    pub iou_threshold: f32,
    /// Square model input edge in pixels (YOLO-family models use 640).
    pub input_size: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            iou_threshold: 0.45,
            input_size: 640,
        }
    }
}

/// Detector backend trait.
///
/// Implementations must treat the pixel slice as read-only and ephemeral:
/// detections flow out, pixels never do. The returned list is ordered by
/// descending confidence (the model's own ranking after suppression).
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a packed RGB frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
