use crate::detect::classes::class_name;

/// Axis-aligned bounding box in pixel coordinates of the source frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix = self.x.max(other.x);
        let iy = self.y.max(other.y);
        let iw = (self.right().min(other.right()) - ix).max(0.0);
        let ih = (self.bottom().min(other.bottom()) - iy).max(0.0);
        let inter = iw * ih;
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamp the box to frame bounds, preserving the covered region.
    pub fn clamp_to(&self, width: u32, height: u32) -> BBox {
        let x = self.x.clamp(0.0, width as f32);
        let y = self.y.clamp(0.0, height as f32);
        BBox {
            x,
            y,
            w: (self.right().min(width as f32) - x).max(0.0),
            h: (self.bottom().min(height as f32) - y).max(0.0),
        }
    }
}

/// One detected object. Produced fresh each detection cycle and never
/// modified afterwards; the next cycle supersedes the whole list.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// COCO class index (0..80).
    pub class_id: usize,
    /// Model-reported probability in [0, 1].
    pub confidence: f32,
    pub bbox: BBox,
}

impl Detection {
    pub fn label(&self) -> &'static str {
        class_name(self.class_id)
    }
}

/// Greedy non-maximum suppression: sort by confidence descending, drop any
/// box overlapping an already-kept box above `iou_threshold`.
pub fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_unstable_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for det in detections {
        if kept.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_threshold) {
            kept.push(det);
        }
    }
    kept
}

/// Drop detections below the configured confidence threshold.
pub fn retain_confident(detections: &mut Vec<Detection>, threshold: f32) {
    detections.retain(|det| det.confidence >= threshold);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class_id: usize, confidence: f32, x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: BBox { x, y, w, h },
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let b = BBox {
            x: 10.0,
            y: 10.0,
            w: 50.0,
            h: 50.0,
        };
        assert!((b.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BBox {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        let b = BBox {
            x: 20.0,
            y: 20.0,
            w: 10.0,
            h: 10.0,
        };
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn nms_suppresses_overlap_and_keeps_best() {
        let kept = nms(
            vec![
                det(0, 0.6, 12.0, 12.0, 50.0, 50.0),
                det(0, 0.9, 10.0, 10.0, 50.0, 50.0),
                det(16, 0.7, 200.0, 200.0, 40.0, 40.0),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].class_id, 16);
    }

    #[test]
    fn nms_output_is_descending_confidence() {
        let kept = nms(
            vec![
                det(2, 0.5, 0.0, 0.0, 10.0, 10.0),
                det(3, 0.8, 100.0, 0.0, 10.0, 10.0),
                det(4, 0.65, 0.0, 100.0, 10.0, 10.0),
            ],
            0.45,
        );
        let confs: Vec<f32> = kept.iter().map(|d| d.confidence).collect();
        assert_eq!(confs, vec![0.8, 0.65, 0.5]);
    }

    #[test]
    fn retain_confident_applies_threshold() {
        let mut dets = vec![
            det(0, 0.9, 0.0, 0.0, 10.0, 10.0),
            det(0, 0.3, 50.0, 50.0, 10.0, 10.0),
        ];
        retain_confident(&mut dets, 0.5);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].confidence, 0.9);
    }

    #[test]
    fn clamp_keeps_box_inside_frame() {
        let b = BBox {
            x: -5.0,
            y: 470.0,
            w: 20.0,
            h: 30.0,
        };
        let clamped = b.clamp_to(640, 480);
        assert_eq!(clamped.x, 0.0);
        assert_eq!(clamped.right(), 15.0);
        assert_eq!(clamped.bottom(), 480.0);
    }
}
