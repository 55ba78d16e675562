//! Frame sources.
//!
//! The coordinator expects every frame at the configured working resolution;
//! sources are responsible for resizing before handing a frame over.

/// Supplies successive frames. `Ok(None)` signals end of stream.
pub trait FrameSource<F> {
    fn next_frame(&mut self) -> anyhow::Result<Option<F>>;
}

#[cfg(feature = "opencv")]
pub use self::video::VideoSource;

#[cfg(feature = "opencv")]
mod video {
    use anyhow::{bail, Context, Result};
    use log::info;
    use opencv::{
        core::{Mat, Size},
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };

    use super::FrameSource;

    /// Video file or camera, resized to the working resolution.
    pub struct VideoSource {
        cap: VideoCapture,
        size: Size,
    }

    impl VideoSource {
        /// `input` is a file path, or a camera index when it parses as one.
        pub fn open(input: &str, frame_size: [i32; 2]) -> Result<Self> {
            let cap = match input.parse::<i32>() {
                Ok(index) => VideoCapture::new(index, videoio::CAP_ANY)?,
                Err(_) => VideoCapture::from_file(input, videoio::CAP_ANY)?,
            };
            if !cap.is_opened()? {
                bail!("failed to open video input {:?}", input);
            }

            info!(
                "opened {:?}: {}x{} @ {:.2} fps, resizing to {}x{}",
                input,
                cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32,
                cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32,
                cap.get(videoio::CAP_PROP_FPS)?,
                frame_size[0],
                frame_size[1]
            );

            Ok(Self {
                cap,
                size: Size::new(frame_size[0], frame_size[1]),
            })
        }
    }

    impl FrameSource<Mat> for VideoSource {
        fn next_frame(&mut self) -> Result<Option<Mat>> {
            let mut raw = Mat::default();
            if !self.cap.read(&mut raw).context("video read failed")? || raw.empty() {
                return Ok(None);
            }

            let mut frame = Mat::default();
            imgproc::resize(&raw, &mut frame, self.size, 0.0, 0.0, imgproc::INTER_LINEAR)?;
            Ok(Some(frame))
        }
    }
}
