use std::path::PathBuf;

use thiserror::Error;

/// Failures that end a tracking session.
///
/// Lost tracks and frames without a qualifying detection are not errors; the
/// coordinator handles them inside its per-frame step.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config {path:?}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("frame source failed")]
    FrameSource(#[source] anyhow::Error),

    #[error("detector failed")]
    Detector(#[source] anyhow::Error),

    #[error("renderer failed")]
    Render(#[source] anyhow::Error),

    #[error("command input failed")]
    Input(#[source] anyhow::Error),

    #[error("failed to write frame report")]
    Report(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
