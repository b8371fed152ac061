//! Camera frame sources.
//!
//! A `CameraSource` produces one `Frame` per loop iteration:
//! - `stub://` device strings select a deterministic synthetic scene
//!   (tests, bring-up on machines without a camera)
//! - real device paths (e.g. `/dev/video0`) use V4L2 capture
//!   (feature: capture-v4l2)
//!
//! Sources own their device handle exclusively and release it on drop. A
//! source that is exhausted or loses its device fails `next_frame`, which
//! the frame loop treats as fatal.

#[cfg(feature = "capture-v4l2")]
mod v4l2;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g. "/dev/video0") or a `stub://` name.
    pub device: String,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
    /// Target frame rate hint for the device (frames per second).
    pub target_fps: u32,
    /// Synthetic sources stop after this many frames (None = unbounded).
    pub frame_limit: Option<u64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://bench".to_string(),
            width: 640,
            height: 480,
            target_fps: 10,
            frame_limit: None,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "capture-v4l2")]
    V4l2(v4l2::DeviceCamera),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config)),
            })
        } else {
            #[cfg(feature = "capture-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::V4l2(v4l2::DeviceCamera::new(config)?),
                })
            }
            #[cfg(not(feature = "capture-v4l2"))]
            {
                Err(anyhow!(
                    "camera device {} requires the capture-v4l2 feature",
                    config.device
                ))
            }
        }
    }

    /// Open the device and start streaming.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::V4l2(source) => source.connect(),
        }
    }

    /// Capture the next frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::V4l2(source) => source.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::V4l2(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::V4l2(source) => source.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and bring-up
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
    /// Simulated scene state; changes periodically so scene-change detectors
    /// have something to see.
    scene_state: u8,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("CameraSource: connected to {} (synthetic)", self.config.device);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        if let Some(limit) = self.config.frame_limit {
            if self.frame_count >= limit {
                return Err(anyhow!(
                    "synthetic source {} exhausted after {} frames",
                    self.config.device,
                    limit
                ));
            }
        }
        self.frame_count += 1;

        let pixels = self.generate_synthetic_pixels();
        Frame::new(self.config.width, self.config.height, pixels)
    }

    /// Generate a deterministic pixel pattern. The pattern shifts with the
    /// frame counter and jumps every 50 frames to simulate object entry.
    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.config.width * self.config.height * 3) as usize;

        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }

        pixels
    }

    fn is_healthy(&self) -> bool {
        self.config
            .frame_limit
            .map_or(true, |limit| self.frame_count < limit)
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config() -> CameraConfig {
        CameraConfig {
            device: "stub://test".to_string(),
            width: 64,
            height: 48,
            target_fps: 0,
            frame_limit: None,
        }
    }

    #[test]
    fn synthetic_source_produces_frames() -> Result<()> {
        let mut source = CameraSource::new(stub_config())?;
        source.connect()?;

        let frame = source.next_frame()?;
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.pixels().len(), 64 * 48 * 3);
        assert_eq!(source.stats().frames_captured, 1);

        Ok(())
    }

    #[test]
    fn synthetic_source_honors_frame_limit() -> Result<()> {
        let mut config = stub_config();
        config.frame_limit = Some(3);
        let mut source = CameraSource::new(config)?;
        source.connect()?;

        for _ in 0..3 {
            source.next_frame()?;
        }
        assert!(source.next_frame().is_err());
        assert!(!source.is_healthy());
        assert_eq!(source.stats().frames_captured, 3);

        Ok(())
    }

    #[cfg(not(feature = "capture-v4l2"))]
    #[test]
    fn device_paths_require_the_v4l2_feature() {
        let config = CameraConfig {
            device: "/dev/video0".to_string(),
            ..stub_config()
        };
        assert!(CameraSource::new(config).is_err());
    }
}
