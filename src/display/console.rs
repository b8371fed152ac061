use std::io::Write;

use anyhow::{Context, Result};

use crate::display::{DisplayStatus, FrameReport};
use crate::frame::Frame;
use crate::overlay::console_block;

/// Console backend: writes the per-iteration text block to a sink
/// (stdout in production, a capture buffer in tests).
pub struct ConsoleDisplay {
    out: Box<dyn Write + Send>,
}

impl ConsoleDisplay {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    pub(crate) fn present(
        &mut self,
        _frame: &Frame,
        report: &FrameReport<'_>,
    ) -> Result<DisplayStatus> {
        let block = console_block(report.frame_index, report.detections, report.fps);
        self.out
            .write_all(block.as_bytes())
            .context("console write failed")?;
        self.out.flush().context("console flush failed")?;
        Ok(DisplayStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BBox, Detection};
    use std::sync::{Arc, Mutex};

    fn test_frame() -> Frame {
        Frame::new(8, 8, vec![0u8; 8 * 8 * 3]).unwrap()
    }

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn console_display_writes_blocks() {
        let buf = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        let mut display = ConsoleDisplay::with_writer(Box::new(buf.clone()));

        let dets = vec![Detection {
            class_id: 0,
            confidence: 0.9,
            bbox: BBox {
                x: 10.0,
                y: 10.0,
                w: 50.0,
                h: 50.0,
            },
        }];
        let status = display
            .present(&test_frame(), &FrameReport {
                frame_index: 0,
                detections: &dets,
                fps: 5.0,
            })
            .unwrap();
        assert_eq!(status, DisplayStatus::Active);

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("[frame 0] 1 object detected"));
        assert!(text.contains("1. person (90%)"));
        assert!(text.contains("Current FPS: 5.00"));
    }
}
