//! Scripted collaborators. Frames are plain frame numbers.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use roitrack::{
    session::{Command, CommandInput},
    source::FrameSource,
    visualization::Renderer,
    BoundingBox, Config, Coordinator, CorrelationTracker, Detection, Detector, FrameReport,
    TrackerAdapter,
};

pub type Frame = u32;

pub fn det(class_id: i32, confidence: f32, x: i32, y: i32, w: i32, h: i32) -> Detection {
    Detection::new(class_id, confidence, BoundingBox::new(x, y, w, h))
}

/// Shared view into what the scripted collaborators saw and will return.
#[derive(Default)]
pub struct Probe {
    /// One entry per detector call; empty output once exhausted.
    pub detections: RefCell<VecDeque<Vec<Detection>>>,
    /// Frames the detector was called on.
    pub detect_calls: RefCell<Vec<Frame>>,
    /// Set to make the next detector call fail.
    pub detector_fault: RefCell<bool>,
    /// One entry per tracker update; `None` loses the target. Lost once exhausted.
    pub updates: RefCell<VecDeque<Option<BoundingBox>>>,
    /// (frame, box) for every tracker init.
    pub inits: RefCell<Vec<(Frame, BoundingBox)>>,
    /// Frames the tracker was updated on.
    pub update_calls: RefCell<Vec<Frame>>,
    /// Reject every init.
    pub reject_init: RefCell<bool>,
}

impl Probe {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn push_detections(&self, dets: Vec<Detection>) {
        self.detections.borrow_mut().push_back(dets);
    }

    pub fn push_update(&self, update: Option<BoundingBox>) {
        self.updates.borrow_mut().push_back(update);
    }

    pub fn detector_calls(&self) -> usize {
        self.detect_calls.borrow().len()
    }
}

pub struct ScriptedDetector(pub Rc<Probe>);

impl Detector<Frame> for ScriptedDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        if *self.0.detector_fault.borrow() {
            bail!("detector backend crashed");
        }
        self.0.detect_calls.borrow_mut().push(*frame);
        Ok(self.0.detections.borrow_mut().pop_front().unwrap_or_default())
    }
}

pub struct ScriptedTracker(pub Rc<Probe>);

impl CorrelationTracker<Frame> for ScriptedTracker {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<()> {
        if *self.0.reject_init.borrow() {
            bail!("tracker rejected box");
        }
        self.0.inits.borrow_mut().push((*frame, bbox));
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Result<Option<BoundingBox>> {
        self.0.update_calls.borrow_mut().push(*frame);
        Ok(self.0.updates.borrow_mut().pop_front().flatten())
    }
}

pub type TestCoordinator = Coordinator<ScriptedDetector, ScriptedTracker>;

pub fn coordinator_with(cfg: &Config, probe: &Rc<Probe>) -> TestCoordinator {
    let for_tracker = Rc::clone(probe);
    Coordinator::new(
        cfg,
        ScriptedDetector(Rc::clone(probe)),
        TrackerAdapter::new(move || Ok(ScriptedTracker(Rc::clone(&for_tracker)))),
        Instant::now(),
    )
}

pub fn coordinator(probe: &Rc<Probe>) -> TestCoordinator {
    coordinator_with(&Config::default(), probe)
}

/// Yields frames 0..n, then end of stream. Counts polls.
pub struct CountingSource {
    pub next: Frame,
    pub total: Frame,
    pub polls: Rc<RefCell<u32>>,
    pub fail_at: Option<Frame>,
}

impl CountingSource {
    pub fn new(total: Frame) -> Self {
        Self {
            next: 0,
            total,
            polls: Rc::new(RefCell::new(0)),
            fail_at: None,
        }
    }
}

impl FrameSource<Frame> for CountingSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        *self.polls.borrow_mut() += 1;
        if self.fail_at == Some(self.next) {
            bail!("camera unplugged");
        }
        if self.next >= self.total {
            return Ok(None);
        }
        let frame = self.next;
        self.next += 1;
        Ok(Some(frame))
    }
}

/// Keeps every report it is asked to draw.
#[derive(Clone, Default)]
pub struct RecordingRenderer(pub Rc<RefCell<Vec<(Frame, FrameReport)>>>);

impl Renderer<Frame> for RecordingRenderer {
    fn render(&mut self, frame: &Frame, report: &FrameReport, _fps: f64) -> Result<()> {
        self.0.borrow_mut().push((*frame, report.clone()));
        Ok(())
    }
}

/// Replays commands, one per wait; records requested delays.
#[derive(Default)]
pub struct ScriptedInput {
    pub commands: VecDeque<Option<Command>>,
    pub delays: Rc<RefCell<Vec<Duration>>>,
}

impl ScriptedInput {
    pub fn new(commands: Vec<Option<Command>>) -> Self {
        Self {
            commands: commands.into(),
            delays: Rc::default(),
        }
    }
}

impl CommandInput for ScriptedInput {
    fn wait(&mut self, delay: Duration) -> Result<Option<Command>> {
        self.delays.borrow_mut().push(delay);
        Ok(self.commands.pop_front().flatten())
    }
}
