//! Lifecycle wrapper around an external single-object correlation tracker.
use anyhow::Result;
use log::warn;

use crate::geometry::BoundingBox;

/// A stateful single-object tracker (MOSSE-class correlation filter).
///
/// The filter math lives in the implementation; the adapter only cares whether
/// a step succeeded.
pub trait CorrelationTracker<F> {
    /// Learn the target appearance inside `bbox` on `frame`.
    fn init(&mut self, frame: &F, bbox: BoundingBox) -> Result<()>;

    /// One tracking step. `Ok(None)` means the target was lost.
    fn update(&mut self, frame: &F) -> Result<Option<BoundingBox>>;
}

/// Outcome of one adapter step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackUpdate {
    Success(BoundingBox),
    Failure,
}

type Factory<T> = Box<dyn FnMut() -> Result<T>>;

/// Owns at most one tracker instance.
///
/// A fresh instance is built on every `init`; any failed step drops it, so the
/// adapter has to be re-initialized before it can track again.
pub struct TrackerAdapter<T> {
    factory: Factory<T>,
    tracker: Option<T>,
}

impl<T> TrackerAdapter<T> {
    pub fn new(factory: impl FnMut() -> Result<T> + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            tracker: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.tracker.is_some()
    }

    /// Drop the current instance, if any.
    pub fn clear(&mut self) {
        self.tracker = None;
    }

    /// (Re)initialize on `bbox`. On error the adapter is left inactive.
    pub fn init<F>(&mut self, frame: &F, bbox: BoundingBox) -> Result<()>
    where
        T: CorrelationTracker<F>,
    {
        self.tracker = None;
        let mut tracker = (self.factory)()?;
        tracker.init(frame, bbox)?;
        self.tracker = Some(tracker);
        Ok(())
    }

    pub fn update<F>(&mut self, frame: &F) -> TrackUpdate
    where
        T: CorrelationTracker<F>,
    {
        let Some(tracker) = self.tracker.as_mut() else {
            return TrackUpdate::Failure;
        };

        match tracker.update(frame) {
            Ok(Some(bbox)) => TrackUpdate::Success(bbox),
            Ok(None) => {
                self.tracker = None;
                TrackUpdate::Failure
            }
            Err(e) => {
                warn!("correlation tracker update failed: {:#}", e);
                self.tracker = None;
                TrackUpdate::Failure
            }
        }
    }
}
