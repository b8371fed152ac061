mod backend;
mod backends;
pub mod classes;
mod result;

pub use backend::{DetectorBackend, DetectorSettings};
pub use backends::StubBackend;
pub use classes::{class_name, COCO_CLASSES, PERSON_CLASS};
pub use result::{nms, retain_confident, BBox, Detection};

#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
