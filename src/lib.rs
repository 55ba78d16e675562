pub mod cadence;
pub mod config;
pub mod coordinator;
pub mod correlation;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod region;
pub mod selector;
pub mod session;
pub mod source;
pub mod utils;
pub mod visualization;

#[cfg(feature = "opencv")]
pub mod mosse;
#[cfg(feature = "torch")]
pub mod yolo;

// Re-export main types
pub use crate::config::Config;
pub use crate::coordinator::{Coordinator, CoordinatorStats, FrameReport, TrackPhase, TrackState};
pub use crate::correlation::{CorrelationTracker, TrackUpdate, TrackerAdapter};
pub use crate::detection::{Detection, Detector};
pub use crate::error::{Error, Result};
pub use crate::geometry::BoundingBox;
pub use crate::region::{Classification, ReferenceRegion};
pub use crate::session::{Command, CommandInput, Session, SessionSummary, StopReason};
