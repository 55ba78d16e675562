use serde::Serialize;

use crate::geometry::BoundingBox;

/// A single detection result. Lives for one detector invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: i32,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: i32, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

/// Whole-frame object detector.
///
/// Output order is preserved by the selector: the first qualifying entry wins.
pub trait Detector<F> {
    fn detect(&mut self, frame: &F) -> anyhow::Result<Vec<Detection>>;
}

impl<F, D: Detector<F> + ?Sized> Detector<F> for Box<D> {
    fn detect(&mut self, frame: &F) -> anyhow::Result<Vec<Detection>> {
        (**self).detect(frame)
    }
}
