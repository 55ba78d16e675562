//! Frame loop: source -> coordinator -> renderer -> paced command wait.
use std::io::Write;
use std::time::{Duration, Instant};

use log::info;

use crate::coordinator::{Coordinator, CoordinatorStats};
use crate::correlation::CorrelationTracker;
use crate::detection::Detector;
use crate::error::{Error, Result};
use crate::source::FrameSource;
use crate::visualization::Renderer;

/// Edge-triggered operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    Quit,
}

/// Delivers operator commands. `wait` also paces the loop: it blocks for up
/// to `delay` while listening for a command.
pub trait CommandInput {
    fn wait(&mut self, delay: Duration) -> anyhow::Result<Option<Command>>;
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub stop: StopReason,
    pub stats: CoordinatorStats,
}

/// Drives one coordinator over one frame source, strictly in arrival order.
pub struct Session<S, R, I, D, T> {
    source: S,
    renderer: R,
    input: I,
    coordinator: Coordinator<D, T>,
    report_sink: Option<Box<dyn Write>>,
}

impl<S, R, I, D, T> Session<S, R, I, D, T> {
    pub fn new(source: S, renderer: R, input: I, coordinator: Coordinator<D, T>) -> Self {
        Self {
            source,
            renderer,
            input,
            coordinator,
            report_sink: None,
        }
    }

    /// Write every frame report as one JSON line.
    pub fn with_report_sink(mut self, sink: impl Write + 'static) -> Self {
        self.report_sink = Some(Box::new(sink));
        self
    }

    pub fn coordinator(&self) -> &Coordinator<D, T> {
        &self.coordinator
    }

    pub fn run<F>(&mut self) -> Result<SessionSummary>
    where
        S: FrameSource<F>,
        R: Renderer<F>,
        I: CommandInput,
        D: Detector<F>,
        T: CorrelationTracker<F>,
    {
        let stop = loop {
            let Some(frame) = self.source.next_frame().map_err(Error::FrameSource)? else {
                break StopReason::EndOfStream;
            };

            let report = self.coordinator.step(&frame, Instant::now())?;

            if let Some(sink) = self.report_sink.as_mut() {
                serde_json::to_writer(&mut *sink, &report).map_err(|e| Error::Report(e.into()))?;
                writeln!(sink).map_err(Error::Report)?;
            }

            self.renderer
                .render(&frame, &report, self.coordinator.cadence().measured_fps())
                .map_err(Error::Render)?;

            let command = self
                .input
                .wait(self.coordinator.delay_for_next_frame())
                .map_err(Error::Input)?;

            match command {
                Some(Command::Quit) => break StopReason::Quit,
                Some(Command::Reset) => {
                    self.coordinator.reset(&frame)?;
                }
                None => {}
            }
        };

        if let Some(sink) = self.report_sink.as_mut() {
            sink.flush().map_err(Error::Report)?;
        }

        let stats = self.coordinator.stats();
        info!(
            "session stopped ({:?}): {} frames, {} detector runs, {} acquisitions, {} re-acquire attempts, {} track losses, {} resets",
            stop,
            stats.frames,
            stats.detector_runs,
            stats.acquisitions,
            stats.reacquire_attempts,
            stats.tracker_failures,
            stats.resets
        );

        Ok(SessionSummary { stop, stats })
    }
}
