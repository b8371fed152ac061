#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::{DetectorBackend, DetectorSettings};
use crate::detect::result::{nms, BBox, Detection};

/// Tract-based backend for YOLO-family ONNX models.
///
/// Loads a local model file and performs inference on RGB frames. The model
/// is expected to take a `[1, 3, S, S]` float input in [0, 1] and produce the
/// YOLOv8-style `[1, 4 + classes, proposals]` output head (cx, cy, w, h
/// followed by per-class scores). No network I/O beyond model loading.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    settings: DetectorSettings,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, settings: DetectorSettings) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = settings.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self { model, settings })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected_len,
                width,
                height,
                pixels.len()
            ));
        }

        let size = self.settings.input_size;
        let img = RgbImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match dimensions"))?;
        let resized = image::imageops::resize(&img, size, size, FilterType::Triangle);
        let raw = resized.as_raw();

        let size = size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            raw[(y * size + x) * 3 + c] as f32 / 255.0
        });

        Ok(input.into_tensor())
    }

    /// Decode the `[1, 4 + classes, proposals]` head into frame-space
    /// detections, filter by confidence, and suppress overlaps.
    fn decode(&self, outputs: TVec<TValue>, width: u32, height: u32) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let shape = view.shape();
        if shape.len() != 3 || shape[1] < 5 {
            return Err(anyhow!(
                "unexpected model output shape {:?} (want [1, 4 + classes, proposals])",
                shape
            ));
        }
        let num_classes = shape[1] - 4;
        let num_proposals = shape[2];

        let scale_x = width as f32 / self.settings.input_size as f32;
        let scale_y = height as f32 / self.settings.input_size as f32;

        let mut candidates = Vec::new();
        for i in 0..num_proposals {
            let mut best_class = 0usize;
            let mut best_score = 0f32;
            for c in 0..num_classes {
                let score = view[[0, 4 + c, i]];
                if score > best_score {
                    best_score = score;
                    best_class = c;
                }
            }
            if best_score < self.settings.confidence_threshold {
                continue;
            }

            let cx = view[[0, 0, i]];
            let cy = view[[0, 1, i]];
            let w = view[[0, 2, i]];
            let h = view[[0, 3, i]];

            let bbox = BBox {
                x: (cx - w / 2.0) * scale_x,
                y: (cy - h / 2.0) * scale_y,
                w: w * scale_x,
                h: h * scale_y,
            }
            .clamp_to(width, height);

            candidates.push(Detection {
                class_id: best_class,
                confidence: best_score,
                bbox,
            });
        }

        Ok(nms(candidates, self.settings.iou_threshold))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, width, height)
    }

    fn warm_up(&mut self) -> Result<()> {
        // One inference on a black frame so the first real cycle is not
        // paying graph-allocation cost.
        let size = self.settings.input_size;
        let pixels = vec![0u8; (size * size * 3) as usize];
        self.detect(&pixels, size, size).map(|_| ())
    }
}
