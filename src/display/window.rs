#![cfg(feature = "display-window")]

use anyhow::{Context, Result};
use minifb::{Key, Window, WindowOptions};

use crate::display::{DisplayStatus, FrameReport};
use crate::frame::Frame;
use crate::overlay::annotate;

/// Windowed backend: blits the annotated frame into a framebuffer window.
pub struct WindowDisplay {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowDisplay {
    pub fn open(width: u32, height: u32) -> Result<Self> {
        let window = Window::new(
            "spotter",
            width as usize,
            height as usize,
            WindowOptions::default(),
        )
        .context("failed to open display window")?;

        Ok(Self {
            window,
            buffer: vec![0u32; (width * height) as usize],
            width: width as usize,
            height: height as usize,
        })
    }

    pub(crate) fn present(
        &mut self,
        frame: &Frame,
        report: &FrameReport<'_>,
    ) -> Result<DisplayStatus> {
        if !self.window.is_open() || self.window.is_key_down(Key::Escape) {
            return Ok(DisplayStatus::Closed);
        }

        let annotated = annotate(frame, report.detections);
        let annotated = if (annotated.width() as usize, annotated.height() as usize)
            == (self.width, self.height)
        {
            annotated
        } else {
            image::imageops::resize(
                &annotated,
                self.width as u32,
                self.height as u32,
                image::imageops::FilterType::Triangle,
            )
        };

        for (dst, px) in self.buffer.iter_mut().zip(annotated.pixels()) {
            let [r, g, b] = px.0;
            *dst = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .context("window update failed")?;

        Ok(DisplayStatus::Active)
    }
}
