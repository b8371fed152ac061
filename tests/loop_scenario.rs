//! End-to-end loop scenario over the synthetic camera and the console
//! backend: a 10-frame source with a detection every 5th frame must print
//! one block per frame, reusing the cached detection text between cycles.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use spotter::{
    BBox, CameraConfig, CameraSource, ConsoleDisplay, Detection, DetectorBackend, DisplayBackend,
    FrameLoop, LoopSettings, PipelineError, Stage,
};

#[derive(Clone)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Always reports the same single person detection.
struct FixedDetector {
    calls: Arc<AtomicU64>,
}

impl DetectorBackend for FixedDetector {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(vec![Detection {
            class_id: 0,
            confidence: 0.9,
            bbox: BBox {
                x: 10.0,
                y: 10.0,
                w: 50.0,
                h: 50.0,
            },
        }])
    }
}

#[test]
fn ten_frame_run_prints_identical_blocks_per_cycle() {
    let source = CameraSource::new(CameraConfig {
        device: "stub://scenario".to_string(),
        width: 64,
        height: 48,
        target_fps: 0,
        frame_limit: Some(10),
    })
    .unwrap();

    let calls = Arc::new(AtomicU64::new(0));
    let detector = FixedDetector {
        calls: calls.clone(),
    };
    let buf = SharedBuf::new();
    let display = DisplayBackend::Console(ConsoleDisplay::with_writer(Box::new(buf.clone())));

    let mut frame_loop = FrameLoop::new(
        source,
        Box::new(detector),
        display,
        LoopSettings {
            detection_interval: 5,
            confidence_threshold: 0.5,
            target_fps: 0,
            max_frames: None,
        },
        Arc::new(AtomicBool::new(false)),
    );

    // The source runs dry after frame 9; the loop ends with a capture error.
    let err = frame_loop.run().unwrap_err();
    let pipeline = err
        .downcast_ref::<PipelineError>()
        .expect("classified pipeline fault");
    assert_eq!(pipeline.stage, Stage::Capture);

    // 10 frames processed, detection on frames 0 and 5 only.
    assert_eq!(frame_loop.stats().frames, 10);
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert_eq!(frame_loop.stats().detect_cycles, 2);

    let text = buf.text();

    // One block per frame, indices incrementing each iteration.
    let mut detection_lines = Vec::new();
    for index in 0..10 {
        let header = format!("[frame {}] 1 object detected", index);
        let start = text
            .find(&header)
            .unwrap_or_else(|| panic!("missing block for frame {}: {}", index, text));
        let rest = &text[start + header.len()..];
        let fps_at = rest.find("Current FPS:").expect("FPS line closes the block");
        detection_lines.push(rest[..fps_at].trim().to_string());
    }
    assert!(!text.contains("[frame 10]"));

    // Cached detection text is identical for frames 0-4 and for frames 5-9.
    for lines in &detection_lines[0..5] {
        assert_eq!(lines, &detection_lines[0]);
    }
    for lines in &detection_lines[5..10] {
        assert_eq!(lines, &detection_lines[5]);
    }
    assert_eq!(detection_lines[0], "1. person (90%)");

    // Every block carries a performance line.
    assert_eq!(text.matches("Current FPS:").count(), 10);
}
