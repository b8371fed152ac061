use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::classes::PERSON_CLASS;
use crate::detect::result::{BBox, Detection};

/// Stub backend for bring-up and tests. Hashes the frame and reports a single
/// centered detection whenever the scene changes between detection cycles.
pub struct StubBackend {
    last_hash: Option<[u8; 32]>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self { last_hash: None }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let current_hash: [u8; 32] = Sha256::digest(pixels).into();

        let changed = self.last_hash.is_some_and(|prev| prev != current_hash);

        self.last_hash = Some(current_hash);

        if !changed {
            return Ok(Vec::new());
        }

        let w = width as f32 / 2.0;
        let h = height as f32 / 2.0;
        Ok(vec![Detection {
            class_id: PERSON_CLASS,
            confidence: 0.85,
            bbox: BBox {
                x: w / 2.0,
                y: h / 2.0,
                w,
                h,
            },
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_backend_reports_scene_changes() {
        let mut backend = StubBackend::new();

        let r1 = backend.detect(b"frame1", 100, 100).unwrap();
        assert!(r1.is_empty());

        let r2 = backend.detect(b"frame2", 100, 100).unwrap();
        assert_eq!(r2.len(), 1);
        assert_eq!(r2[0].label(), "person");
        assert_eq!(r2[0].confidence, 0.85);
        assert_eq!(r2[0].bbox.w, 50.0);

        let r3 = backend.detect(b"frame2", 100, 100).unwrap();
        assert!(r3.is_empty());
    }
}
