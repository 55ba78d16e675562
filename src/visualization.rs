//! Overlay drawing for the coordinator's per-frame output.
use crate::coordinator::FrameReport;
use crate::geometry::{Point, Side, Sides};
use crate::region::ReferenceRegion;

/// Arrow inset from the target center and the region edge, pixels.
const ARROW_INSET: i32 = 20;

/// Visualizes a frame report. Has no influence on coordinator decisions.
pub trait Renderer<F> {
    fn render(&mut self, frame: &F, report: &FrameReport, fps: f64) -> anyhow::Result<()>;
}

/// Renderer that draws nothing, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl<F> Renderer<F> for NullRenderer {
    fn render(&mut self, _frame: &F, _report: &FrameReport, _fps: f64) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Arrow segments `(from, to)` pointing from the target towards each violated
/// region edge.
pub fn direction_arrows(region: &ReferenceRegion, target: &Point, sides: &Sides) -> Vec<(Point, Point)> {
    let (tl, br) = (region.top_left(), region.bottom_right());
    sides
        .iter()
        .map(|side| match side {
            Side::Left => (
                Point::new(target.x + ARROW_INSET, target.y),
                Point::new(tl.x + ARROW_INSET, target.y),
            ),
            Side::Right => (
                Point::new(target.x - ARROW_INSET, target.y),
                Point::new(br.x - ARROW_INSET, target.y),
            ),
            Side::Top => (
                Point::new(target.x, target.y + ARROW_INSET),
                Point::new(target.x, tl.y + ARROW_INSET),
            ),
            Side::Bottom => (
                Point::new(target.x, target.y - ARROW_INSET),
                Point::new(target.x, br.y - ARROW_INSET),
            ),
        })
        .collect()
}

/// Text drawn above the tracked box.
pub fn track_label(label: &str, confidence: f32) -> String {
    format!("{} ({:.1}%)", label, confidence * 100.0)
}

#[cfg(feature = "opencv")]
pub use self::display::{KeyboardInput, OverlayRenderer};

#[cfg(feature = "opencv")]
mod display {
    use std::time::Duration;

    use opencv::{
        core::{self, Mat, Rect, Scalar},
        highgui, imgproc,
        prelude::*,
    };

    use super::{direction_arrows, track_label, Renderer};
    use crate::coordinator::FrameReport;
    use crate::geometry::{BoundingBox, Point};
    use crate::region::Classification;
    use crate::session::{Command, CommandInput};

    const ESC: i32 = 27;

    // BGR
    fn blue() -> Scalar {
        Scalar::new(255.0, 0.0, 0.0, 0.0)
    }
    fn green() -> Scalar {
        Scalar::new(0.0, 255.0, 0.0, 0.0)
    }
    fn red() -> Scalar {
        Scalar::new(0.0, 0.0, 255.0, 0.0)
    }

    fn cv_point(p: Point) -> core::Point {
        core::Point::new(p.x, p.y)
    }

    fn draw_box(img: &mut Mat, bbox: &BoundingBox, color: Scalar) -> opencv::Result<()> {
        let rect = Rect::new(bbox.x, bbox.y, bbox.width, bbox.height);
        imgproc::rectangle(img, rect, color, 2, imgproc::LINE_8, 0)
    }

    fn put_text(img: &mut Mat, text: &str, org: Point, scale: f64, color: Scalar) -> opencv::Result<()> {
        imgproc::put_text(
            img,
            text,
            cv_point(org),
            imgproc::FONT_HERSHEY_SIMPLEX,
            scale,
            color,
            2,
            imgproc::LINE_8,
            false,
        )
    }

    /// Draws the region, the tracked box, the inside/outside status and the
    /// throughput onto a copy of the frame and shows it in a highgui window.
    pub struct OverlayRenderer {
        window_name: String,
        label: String,
    }

    impl OverlayRenderer {
        pub fn new(window_name: &str, label: &str) -> opencv::Result<Self> {
            highgui::named_window(window_name, highgui::WINDOW_AUTOSIZE)?;
            Ok(Self {
                window_name: window_name.to_string(),
                label: label.to_string(),
            })
        }

        /// Draw the overlay onto `canvas`.
        pub fn draw(&self, canvas: &mut Mat, report: &FrameReport, fps: f64) -> opencv::Result<()> {
            let region = report.classified_region.unwrap_or(report.region);
            let (tl, br) = (region.top_left(), region.bottom_right());
            imgproc::rectangle_points(canvas, cv_point(tl), cv_point(br), blue(), 2, imgproc::LINE_8, 0)?;

            if let Some(bbox) = &report.tracked_box {
                draw_box(canvas, bbox, green())?;
                let confidence = report.confidence.unwrap_or_default();
                put_text(
                    canvas,
                    &track_label(&self.label, confidence),
                    Point::new(bbox.x, bbox.y - 10),
                    1.0,
                    green(),
                )?;
            }

            let status_at = Point::new(tl.x + 10, tl.y - 10);
            match (&report.classification, &report.target_center) {
                (Some(Classification::Inside), _) => {
                    put_text(canvas, "INSIDE", status_at, 1.0, green())?;
                }
                (Some(Classification::Outside(sides)), Some(target)) => {
                    put_text(canvas, "OUTSIDE", status_at, 1.0, red())?;
                    for (from, to) in direction_arrows(&region, target, sides) {
                        imgproc::arrowed_line(
                            canvas,
                            cv_point(from),
                            cv_point(to),
                            red(),
                            2,
                            imgproc::LINE_8,
                            0,
                            0.1,
                        )?;
                    }
                }
                _ => {}
            }

            put_text(canvas, &format!("FPS: {}", fps as i32), Point::new(50, 50), 0.7, blue())
        }
    }

    impl Renderer<Mat> for OverlayRenderer {
        fn render(&mut self, frame: &Mat, report: &FrameReport, fps: f64) -> anyhow::Result<()> {
            let mut canvas = frame.try_clone()?;
            self.draw(&mut canvas, report, fps)?;
            highgui::imshow(&self.window_name, &canvas)?;
            Ok(())
        }
    }

    /// highgui key polling: `q`/ESC quit, `r` resets the track.
    #[derive(Debug, Default)]
    pub struct KeyboardInput;

    impl CommandInput for KeyboardInput {
        fn wait(&mut self, delay: Duration) -> anyhow::Result<Option<Command>> {
            let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX).max(1);
            let key = highgui::wait_key(ms)?;
            if key < 0 {
                return Ok(None);
            }
            Ok(match key & 0xFF {
                k if k == i32::from(b'q') || k == ESC => Some(Command::Quit),
                k if k == i32::from(b'r') => Some(Command::Reset),
                _ => None,
            })
        }
    }
}
