//! OpenCV legacy MOSSE correlation filter.
use anyhow::{bail, Result};
use opencv::{
    core::{Mat, Ptr, Rect2d},
    prelude::*,
    tracking::legacy_TrackerMOSSE,
};

use crate::correlation::{CorrelationTracker, TrackerAdapter};
use crate::geometry::BoundingBox;

pub struct MosseTracker {
    inner: Ptr<legacy_TrackerMOSSE>,
}

impl MosseTracker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: legacy_TrackerMOSSE::create()?,
        })
    }

    /// Adapter that builds a fresh MOSSE instance on every initialization.
    pub fn adapter() -> TrackerAdapter<Self> {
        TrackerAdapter::new(Self::new)
    }
}

impl CorrelationTracker<Mat> for MosseTracker {
    fn init(&mut self, frame: &Mat, bbox: BoundingBox) -> Result<()> {
        let rect = Rect2d::new(
            f64::from(bbox.x),
            f64::from(bbox.y),
            f64::from(bbox.width),
            f64::from(bbox.height),
        );
        if !self.inner.init(frame, rect)? {
            bail!("MOSSE rejected initial box {:?}", bbox);
        }
        Ok(())
    }

    fn update(&mut self, frame: &Mat) -> Result<Option<BoundingBox>> {
        let mut rect = Rect2d::default();
        if !self.inner.update(frame, &mut rect)? {
            return Ok(None);
        }
        Ok(Some(BoundingBox::new(
            rect.x as i32,
            rect.y as i32,
            rect.width as i32,
            rect.height as i32,
        )))
    }
}
