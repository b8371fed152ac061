//! RGB frame buffer.
//!
//! A `Frame` is a fixed-resolution packed RGB8 pixel buffer captured once per
//! loop iteration. It is owned exclusively by the iteration that captured it;
//! rendering always works on a copy, so the source frame is never mutated in
//! place.

use anyhow::{anyhow, Result};
use image::RgbImage;

/// Packed RGB8 frame: `data.len() == width * height * 3`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a packed RGB buffer. Fails when the buffer does not match the
    /// declared dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame buffer size mismatch: expected {} RGB bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raw pixel bytes, row-major packed RGB.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Copy the frame into an `RgbImage` for drawing.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .expect("frame dimensions validated at construction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_short_buffer() {
        assert!(Frame::new(4, 4, vec![0u8; 10]).is_err());
    }

    #[test]
    fn frame_round_trips_through_image() {
        let data: Vec<u8> = (0..4 * 2 * 3).map(|i| i as u8).collect();
        let frame = Frame::new(4, 2, data.clone()).unwrap();
        let img = frame.to_image();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 2);
        assert_eq!(img.into_raw(), data);
        // The frame itself is untouched by the copy.
        assert_eq!(frame.pixels(), data.as_slice());
    }
}
