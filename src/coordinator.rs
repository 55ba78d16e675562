//! Per-frame decision logic: detect while searching, correlate while tracking,
//! and keep the reference region anchored on the target.
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::Serialize;

use crate::cadence::CadenceController;
use crate::config::Config;
use crate::correlation::{CorrelationTracker, TrackUpdate, TrackerAdapter};
use crate::detection::{Detection, Detector};
use crate::error::{Error, Result};
use crate::geometry::{self, BoundingBox, Point};
use crate::region::{Classification, ReferenceRegion};
use crate::selector;

/// Track lifecycle. `Tracking` holds exactly when the tracker adapter is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackState {
    Searching,
    Tracking {
        /// Confidence of the detection that last anchored the tracker.
        confidence: f32,
        bbox: BoundingBox,
    },
}

impl TrackState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, TrackState::Tracking { .. })
    }

    pub fn phase(&self) -> TrackPhase {
        match self {
            TrackState::Searching => TrackPhase::Searching,
            TrackState::Tracking { .. } => TrackPhase::Tracking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackPhase {
    Searching,
    Tracking,
}

/// What happened during one frame. This is everything a renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    /// State after the step.
    pub state: TrackPhase,
    /// Box from a successful correlation update this frame.
    pub tracked_box: Option<BoundingBox>,
    pub confidence: Option<f32>,
    pub target_center: Option<Point>,
    /// Target center against `classified_region`.
    pub classification: Option<Classification>,
    /// Region as it stood when the target was classified, before any recentering.
    pub classified_region: Option<ReferenceRegion>,
    /// Region after the step.
    pub region: ReferenceRegion,
    /// Detection that (re)initialized the tracker this frame.
    pub acquired: Option<Detection>,
    pub lost_track: bool,
    pub reacquire_attempted: bool,
    pub detector_invoked: bool,
}

impl FrameReport {
    fn new(frame_index: u64, region: ReferenceRegion) -> Self {
        Self {
            frame_index,
            state: TrackPhase::Searching,
            tracked_box: None,
            confidence: None,
            target_center: None,
            classification: None,
            classified_region: None,
            region,
            acquired: None,
            lost_track: false,
            reacquire_attempted: false,
            detector_invoked: false,
        }
    }
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    pub frames: u64,
    pub detector_runs: u64,
    pub acquisitions: u64,
    pub reacquire_attempts: u64,
    pub tracker_failures: u64,
    pub resets: u64,
}

/// Owns the session state: region, track state and cadence.
pub struct Coordinator<D, T> {
    detector: D,
    tracker: TrackerAdapter<T>,
    region: ReferenceRegion,
    cadence: CadenceController,
    state: TrackState,
    target_class_id: i32,
    min_confidence: f32,
    reacquire_interval: u32,
    outside_streak: u32,
    frame_index: u64,
    stats: CoordinatorStats,
}

impl<D, T> Coordinator<D, T> {
    pub fn new(cfg: &Config, detector: D, tracker: TrackerAdapter<T>, now: Instant) -> Self {
        let [width, height] = cfg.frame_size;
        Self {
            detector,
            tracker,
            region: ReferenceRegion::centered_in(width, height, cfg.region_side_length),
            cadence: CadenceController::new(cfg.fast_fps, cfg.slow_fps, now),
            state: TrackState::Searching,
            target_class_id: cfg.target_class_id,
            min_confidence: cfg.min_confidence,
            reacquire_interval: cfg.reacquire_interval.max(1),
            outside_streak: 0,
            frame_index: 0,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn region(&self) -> &ReferenceRegion {
        &self.region
    }

    pub fn cadence(&self) -> &CadenceController {
        &self.cadence
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    pub fn is_tracker_active(&self) -> bool {
        self.tracker.is_active()
    }

    pub fn delay_for_next_frame(&self) -> Duration {
        self.cadence.delay_for_next_frame()
    }

    /// Process one frame.
    ///
    /// Only detector faults are returned as errors; lost tracks and empty
    /// detections are handled here.
    pub fn step<F>(&mut self, frame: &F, now: Instant) -> Result<FrameReport>
    where
        D: Detector<F>,
        T: CorrelationTracker<F>,
    {
        let mut report = FrameReport::new(self.frame_index, self.region);
        self.frame_index += 1;

        match self.state {
            TrackState::Tracking { confidence, .. } => match self.tracker.update(frame) {
                TrackUpdate::Success(bbox) => {
                    self.state = TrackState::Tracking { confidence, bbox };
                    report.tracked_box = Some(bbox);
                    report.confidence = Some(confidence);
                    self.follow(frame, bbox, &mut report)?;
                }
                TrackUpdate::Failure => {
                    debug!("frame {}: correlation track lost", report.frame_index);
                    self.state = TrackState::Searching;
                    self.outside_streak = 0;
                    self.stats.tracker_failures += 1;
                    report.lost_track = true;
                    report.detector_invoked = true;
                    report.acquired = self.acquire(frame)?;
                }
            },
            TrackState::Searching => {
                report.detector_invoked = true;
                report.acquired = self.acquire(frame)?;
            }
        }

        report.state = self.state.phase();
        report.region = self.region;

        self.cadence.record_frame_processed();
        self.cadence.tick(now);
        self.stats.frames += 1;

        debug_assert_eq!(self.state.is_tracking(), self.tracker.is_active());
        Ok(report)
    }

    /// Drop the current track and search again on `frame` right away.
    pub fn reset<F>(&mut self, frame: &F) -> Result<Option<Detection>>
    where
        D: Detector<F>,
        T: CorrelationTracker<F>,
    {
        info!("tracking reset requested");
        self.tracker.clear();
        self.state = TrackState::Searching;
        self.outside_streak = 0;
        self.stats.resets += 1;
        self.acquire(frame)
    }

    /// Classify a freshly tracked box and react: slow down inside, speed up
    /// and try to re-acquire outside.
    fn follow<F>(&mut self, frame: &F, bbox: BoundingBox, report: &mut FrameReport) -> Result<()>
    where
        D: Detector<F>,
        T: CorrelationTracker<F>,
    {
        let target = geometry::center(&bbox);
        let classification = self.region.classify(&target);
        report.target_center = Some(target);
        report.classification = Some(classification);
        report.classified_region = Some(self.region);

        match classification {
            Classification::Inside => {
                self.cadence.set_target(false);
                self.outside_streak = 0;
            }
            Classification::Outside(sides) => {
                self.cadence.set_target(true);
                let due = self.outside_streak % self.reacquire_interval == 0;
                self.outside_streak = self.outside_streak.saturating_add(1);
                debug!(
                    "frame {}: target at ({}, {}) outside region {:?}",
                    report.frame_index, target.x, target.y, sides
                );
                if due {
                    self.stats.reacquire_attempts += 1;
                    report.reacquire_attempted = true;
                    report.detector_invoked = true;
                    report.acquired = self.acquire(frame)?;
                }
            }
        }
        Ok(())
    }

    /// Run the detector and, on a qualifying hit, (re)initialize the tracker
    /// and shift the region onto the target.
    fn acquire<F>(&mut self, frame: &F) -> Result<Option<Detection>>
    where
        D: Detector<F>,
        T: CorrelationTracker<F>,
    {
        self.stats.detector_runs += 1;
        let detections = self.detector.detect(frame).map_err(Error::Detector)?;

        let Some(det) = selector::select(&detections, self.target_class_id, self.min_confidence)
        else {
            debug!("no qualifying detection among {}", detections.len());
            return Ok(None);
        };

        if let Err(e) = self.tracker.init(frame, det.bbox) {
            warn!("tracker init on {:?} failed: {:#}", det.bbox, e);
            self.state = TrackState::Searching;
            return Ok(None);
        }

        self.state = TrackState::Tracking {
            confidence: det.confidence,
            bbox: det.bbox,
        };
        let shift = geometry::offset(&self.region.center(), &geometry::center(&det.bbox));
        self.region.recenter_by(shift);
        self.stats.acquisitions += 1;

        info!(
            "acquired class {} ({:.1}%) at {:?}, region shifted by ({}, {})",
            det.class_id,
            det.confidence * 100.0,
            det.bbox,
            shift.x,
            shift.y
        );
        Ok(Some(det))
    }
}
