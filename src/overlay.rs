//! Rendering shared by every display backend.
//!
//! All backends present the same detection list; only the artifact differs:
//! - `annotate` draws boxes + label tags onto a copy of the frame
//!   (windowed and TFT backends)
//! - `console_block` formats the per-iteration text block (console backend)
//! - `panel_lines` formats the short summary for small panels (OLED backend)
//!
//! Keeping these here means switching the display mode never changes what is
//! rendered, only where it goes.

use std::fmt::Write as _;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::Text,
};
use image::{Rgb, RgbImage};
use imageproc::rect::Rect;

use crate::detect::Detection;
use crate::frame::Frame;

/// Box colors, assigned per class.
const PALETTE: [[u8; 3]; 6] = [
    [0, 220, 60],
    [0, 200, 255],
    [255, 220, 0],
    [255, 0, 220],
    [255, 140, 0],
    [255, 80, 80],
];

fn palette_color(class_id: usize) -> [u8; 3] {
    PALETTE[class_id % PALETTE.len()]
}

/// Draw every detection (hollow box + `label conf%` tag) onto a copy of the
/// frame. The source frame is never touched.
pub fn annotate(frame: &Frame, detections: &[Detection]) -> RgbImage {
    let mut img = frame.to_image();

    for det in detections {
        let bbox = det.bbox.clamp_to(frame.width, frame.height);
        if bbox.w < 1.0 || bbox.h < 1.0 {
            continue;
        }
        let color = palette_color(det.class_id);
        let rect = Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.w as u32, bbox.h as u32);
        imageproc::drawing::draw_hollow_rect_mut(&mut img, rect, Rgb(color));

        let tag = format!("{} {:.0}%", det.label(), det.confidence * 100.0);
        let style = MonoTextStyle::new(&FONT_6X10, Rgb888::new(color[0], color[1], color[2]));
        // Baseline sits just above the box, clamped so tags near the top edge
        // stay visible.
        let baseline = (bbox.y as i32 - 3).max(9);
        let _ = Text::new(&tag, Point::new(bbox.x as i32 + 1, baseline), style)
            .draw(&mut ImageCanvas(&mut img));
    }

    img
}

/// The per-iteration console block: frame index + count header, one
/// `N. label (conf%)` line per detection, then the FPS line.
pub fn console_block(frame_index: u64, detections: &[Detection], fps: f64) -> String {
    let mut out = String::new();
    if detections.is_empty() {
        let _ = writeln!(out, "[frame {}] no objects detected", frame_index);
    } else {
        let _ = writeln!(
            out,
            "[frame {}] {} object{} detected",
            frame_index,
            detections.len(),
            if detections.len() == 1 { "" } else { "s" }
        );
        for (i, det) in detections.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} ({:.0}%)",
                i + 1,
                det.label(),
                det.confidence * 100.0
            );
        }
    }
    let _ = writeln!(out, "Current FPS: {:.2}", fps);
    out
}

/// Short text summary for small panels. At most `max_entries` detections are
/// listed; the count line still reports the full total.
pub fn panel_lines(
    frame_index: u64,
    detections: &[Detection],
    fps: f64,
    max_entries: usize,
) -> Vec<String> {
    let mut lines = vec![
        "spotter".to_string(),
        format!("FPS:{:.1} F:{}", fps, frame_index),
    ];
    if detections.is_empty() {
        lines.push("No objects".to_string());
    } else {
        lines.push(format!("Found: {}", detections.len()));
        for (i, det) in detections.iter().take(max_entries).enumerate() {
            lines.push(format!(
                "{}.{} {:.0}%",
                i + 1,
                det.label(),
                det.confidence * 100.0
            ));
        }
    }
    lines
}

/// `DrawTarget` adapter so embedded-graphics text renders onto an `RgbImage`.
struct ImageCanvas<'a>(&'a mut RgbImage);

impl DrawTarget for ImageCanvas<'_> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                let (x, y) = (point.x as u32, point.y as u32);
                if x < self.0.width() && y < self.0.height() {
                    self.0
                        .put_pixel(x, y, Rgb([color.r(), color.g(), color.b()]));
                }
            }
        }
        Ok(())
    }
}

impl OriginDimensions for ImageCanvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.0.width(), self.0.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BBox;

    fn person(confidence: f32) -> Detection {
        Detection {
            class_id: 0,
            confidence,
            bbox: BBox {
                x: 10.0,
                y: 10.0,
                w: 50.0,
                h: 50.0,
            },
        }
    }

    fn gray_frame(width: u32, height: u32) -> Frame {
        Frame::new(width, height, vec![128u8; (width * height * 3) as usize]).unwrap()
    }

    #[test]
    fn console_block_lists_detections_and_fps() {
        let dets = vec![
            person(0.9),
            Detection {
                class_id: 16,
                confidence: 0.75,
                bbox: BBox {
                    x: 100.0,
                    y: 20.0,
                    w: 30.0,
                    h: 30.0,
                },
            },
        ];
        let block = console_block(12, &dets, 9.873);
        assert_eq!(
            block,
            "[frame 12] 2 objects detected\n  1. person (90%)\n  2. dog (75%)\nCurrent FPS: 9.87\n"
        );
    }

    #[test]
    fn console_block_without_detections() {
        let block = console_block(3, &[], 0.0);
        assert_eq!(block, "[frame 3] no objects detected\nCurrent FPS: 0.00\n");
    }

    #[test]
    fn annotate_draws_on_a_copy() {
        let frame = gray_frame(100, 100);
        let before = frame.pixels().to_vec();

        let img = annotate(&frame, &[person(0.9)]);

        // Source frame untouched.
        assert_eq!(frame.pixels(), before.as_slice());
        // Box perimeter painted with the class color.
        assert_eq!(img.get_pixel(10, 10).0, PALETTE[0]);
        assert_eq!(img.get_pixel(59, 30).0, PALETTE[0]);
        // Interior left alone.
        assert_eq!(img.get_pixel(35, 35).0, [128, 128, 128]);
    }

    #[test]
    fn annotate_survives_out_of_bounds_boxes() {
        let frame = gray_frame(40, 40);
        let det = Detection {
            class_id: 2,
            confidence: 0.6,
            bbox: BBox {
                x: -10.0,
                y: 30.0,
                w: 100.0,
                h: 100.0,
            },
        };
        let img = annotate(&frame, &[det]);
        assert_eq!(img.width(), 40);
    }

    #[test]
    fn panel_lines_truncate_but_report_full_count() {
        let dets: Vec<Detection> = (0..5).map(|_| person(0.9)).collect();
        let lines = panel_lines(7, &dets, 4.2, 3);
        assert_eq!(lines[1], "FPS:4.2 F:7");
        assert_eq!(lines[2], "Found: 5");
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3], "1.person 90%");
    }
}
