use anyhow::bail;
use clap::Parser;
use env_logger::Env;
use log::info;
use opencv::{
    core::{Rect, Scalar, Vector},
    imgcodecs, imgproc,
    prelude::*,
};
use roitrack::{
    selector, visualization::track_label, yolo::YoloDetector, Config, Detector,
};

/// Run the detector once on a single image and mark the detection the tracker would lock on to.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the config JSON file
    #[arg(long)]
    config: Option<String>,
    /// Input image path
    #[arg(long)]
    input: String,
    /// Output image path
    #[arg(long, default_value = "output.jpg")]
    output: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let mut detector = YoloDetector::from_config(&cfg)?;

    let mut img = imgcodecs::imread(&args.input, imgcodecs::IMREAD_COLOR)?;
    if img.empty() {
        bail!("failed to load image {:?}", args.input);
    }

    let dets = detector.detect(&img)?;
    info!("{} detections", dets.len());
    for det in &dets {
        info!(
            "class={} conf={:.3} box=[{}, {}, {}, {}]",
            det.class_id, det.confidence, det.bbox.x, det.bbox.y, det.bbox.width, det.bbox.height
        );
    }

    match selector::select(&dets, cfg.target_class_id, cfg.min_confidence) {
        Some(det) => {
            let b = det.bbox;
            let color = Scalar::new(0.0, 255.0, 0.0, 0.0);
            imgproc::rectangle(&mut img, Rect::new(b.x, b.y, b.width, b.height), color, 2, imgproc::LINE_8, 0)?;
            imgproc::put_text(
                &mut img,
                &track_label(&cfg.target_label, det.confidence),
                opencv::core::Point::new(b.x, b.y - 10),
                imgproc::FONT_HERSHEY_SIMPLEX,
                1.0,
                color,
                2,
                imgproc::LINE_8,
                false,
            )?;
            info!("selected {:?}", det);
        }
        None => info!(
            "no detection of class {} above {:.2}",
            cfg.target_class_id, cfg.min_confidence
        ),
    }

    imgcodecs::imwrite(&args.output, &img, &Vector::new())?;
    info!("wrote {}", args.output);
    Ok(())
}
