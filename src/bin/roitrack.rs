use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;
use opencv::core::Mat;
use roitrack::{
    mosse::MosseTracker,
    source::VideoSource,
    visualization::{KeyboardInput, OverlayRenderer},
    yolo::YoloDetector,
    Config, Coordinator, Session,
};

const WINDOW_NAME: &str = "roitrack";

#[derive(Parser)]
#[command(
    name = "roitrack",
    about = "Keep a reference region on a single target, switching between detection and MOSSE tracking",
    version
)]
struct Args {
    /// Video file path or camera index
    #[arg(short, long, required = true)]
    input: String,

    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to TorchScript model weights
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Inference device ("cpu" or "cuda")
    #[arg(long)]
    device: Option<String>,

    /// Target class id
    #[arg(long)]
    class: Option<i32>,

    /// Write one JSON report per processed frame to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("loading configuration from {:?}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    // Command line overrides
    if let Some(weights) = &args.weights {
        config.model_path = weights.to_string_lossy().to_string();
    }
    if let Some(device) = &args.device {
        config.device = device.clone();
    }
    if let Some(class) = args.class {
        config.target_class_id = class;
    }
    config.validate()?;

    info!(
        "target class {} above {:.2}, region {}px, cadence {}/{} fps",
        config.target_class_id,
        config.min_confidence,
        config.region_side_length,
        config.fast_fps,
        config.slow_fps
    );

    info!("loading detector weights from {:?} on {}", config.model_path, config.device);
    let detector = YoloDetector::from_config(&config)
        .with_context(|| format!("failed to load model {:?}", config.model_path))?;

    let source = VideoSource::open(&args.input, config.frame_size)?;
    let renderer = OverlayRenderer::new(WINDOW_NAME, &config.target_label)?;
    let coordinator = Coordinator::new(&config, detector, MosseTracker::adapter(), Instant::now());

    let mut session = Session::new(source, renderer, KeyboardInput, coordinator);
    if let Some(path) = &args.report {
        let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
        info!("writing frame reports to {:?}", path);
        session = session.with_report_sink(BufWriter::new(file));
    }

    let summary = session.run::<Mat>()?;
    info!("stopped after {} frames ({:?})", summary.stats.frames, summary.stop);

    opencv::highgui::destroy_all_windows()?;
    Ok(())
}
