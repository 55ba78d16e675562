use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Runtime configuration, loaded from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Class the selector accepts.
    pub target_class_id: i32,
    /// Detections need a confidence strictly above this.
    pub min_confidence: f32,
    /// Side of the square reference region, pixels.
    pub region_side_length: i32,
    /// Target rate while the target is outside the region.
    pub fast_fps: u32,
    /// Target rate while the target is inside the region.
    pub slow_fps: u32,
    /// Working resolution every frame is resized to, [width, height].
    pub frame_size: [i32; 2],
    /// Run the outside re-acquisition detection every N-th consecutive outside frame.
    pub reacquire_interval: u32,
    /// Label drawn next to the tracked box.
    pub target_label: String,
    pub model_path: String,
    pub device: String,
    pub input_size: [i32; 2],
    pub conf_threshold: f32,
    pub nms_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_class_id: 0,
            min_confidence: 0.3,
            region_side_length: 250,
            fast_fps: 30,
            slow_fps: 15,
            frame_size: [640, 640],
            reacquire_interval: 1,
            target_label: "IHA".to_string(),
            model_path: "weights/yolov5.torchscript".to_string(),
            device: "cpu".to_string(),
            input_size: [640, 640],
            conf_threshold: 0.25,
            nms_threshold: 0.45,
        }
    }
}

impl Config {
    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let cfg: Config = serde_json::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.region_side_length <= 0 {
            return Err(invalid(format!(
                "region_side_length must be positive, got {}",
                self.region_side_length
            )));
        }
        if self.fast_fps == 0 || self.slow_fps == 0 {
            return Err(invalid(format!(
                "fast_fps and slow_fps must be positive, got {} / {}",
                self.fast_fps, self.slow_fps
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(invalid(format!(
                "min_confidence must lie in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.reacquire_interval == 0 {
            return Err(invalid("reacquire_interval must be at least 1".to_string()));
        }
        if self.frame_size.iter().chain(&self.input_size).any(|&d| d <= 0) {
            return Err(invalid(format!(
                "frame_size {:?} and input_size {:?} must be positive",
                self.frame_size, self.input_size
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> Error {
    Error::InvalidConfig(msg)
}
