//! TorchScript YOLOv5 detector.
use anyhow::{bail, Result};
use log::debug;
use opencv::{
    core::{Mat, Size, Vec3f, CV_32F},
    imgproc,
    prelude::*,
};
use tch::{Device, IValue, Kind, Tensor};

use crate::config::Config;
use crate::detection::{Detection, Detector};
use crate::geometry::BoundingBox;
use crate::utils;

/// Number of leading values per prediction row: cx, cy, w, h, objectness.
const BOX_FIELDS: usize = 5;

/// Wraps an exported YOLOv5 TorchScript module.
pub struct YoloDetector {
    model: tch::CModule,
    device: Device,
    input_size: (i32, i32),
    pub conf_threshold: f32,
    pub nms_threshold: f32,
}

impl YoloDetector {
    /// Create a new detector from a model file and device ("cpu"/"cuda").
    pub fn new(
        model_path: &str,
        device: &str,
        input_size: (i32, i32),
        conf_threshold: f32,
        nms_threshold: f32,
    ) -> Result<Self> {
        let device = if device == "cuda" && tch::Cuda::is_available() {
            Device::Cuda(0)
        } else {
            Device::Cpu
        };

        let mut model = tch::CModule::load_on_device(model_path, device)?;
        model.set_eval();

        Ok(Self {
            model,
            device,
            input_size,
            conf_threshold,
            nms_threshold,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.model_path,
            &cfg.device,
            (cfg.input_size[0], cfg.input_size[1]),
            cfg.conf_threshold,
            cfg.nms_threshold,
        )
    }

    /// Resize, BGR -> RGB, scale to [0,1] and lay out as [1, C, H, W].
    fn preprocess(&self, frame: &Mat) -> Result<Tensor> {
        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size.0, self.input_size.1),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let mut rgb = Mat::default();
        imgproc::cvt_color(&resized, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let mut float_mat = Mat::default();
        rgb.convert_to(&mut float_mat, CV_32F, 1.0 / 255.0, 0.0)?;

        let pixels: Vec<f32> = float_mat
            .data_typed::<Vec3f>()?
            .iter()
            .flat_map(|px| px.0)
            .collect();

        let tensor = Tensor::from_slice(&pixels)
            .reshape([float_mat.rows() as i64, float_mat.cols() as i64, 3])
            .permute([2, 0, 1])
            .unsqueeze(0)
            .to_device(self.device)
            .to_kind(Kind::Float);

        Ok(tensor)
    }

    /// Run the module; exported YOLOv5 graphs return either the prediction
    /// tensor or a tuple whose first element is it.
    fn inference(&self, input: &Tensor) -> Result<Tensor> {
        let output = tch::no_grad(|| self.model.forward_is(&[IValue::Tensor(input.shallow_clone())]))?;
        match output {
            IValue::Tensor(t) => Ok(t),
            IValue::Tuple(mut values) | IValue::GenericList(mut values) if !values.is_empty() => {
                match values.swap_remove(0) {
                    IValue::Tensor(t) => Ok(t),
                    other => bail!("unexpected first output element: {:?}", other),
                }
            }
            other => bail!("unexpected model output: {:?}", other),
        }
    }

    /// Turn raw [1, N, 5 + classes] predictions into frame-space detections,
    /// highest score first.
    fn postprocess(&self, output: &Tensor, orig_size: (i32, i32)) -> Result<Vec<Detection>> {
        let shape = output.size();
        if shape.len() != 3 || (shape[2] as usize) <= BOX_FIELDS {
            bail!("unknown output tensor format: {:?}", shape);
        }
        let stride = shape[2] as usize;

        let (orig_w, orig_h) = orig_size;
        let scale_w = orig_w as f32 / self.input_size.0 as f32;
        let scale_h = orig_h as f32 / self.input_size.1 as f32;

        let flat = output
            .to_device(Device::Cpu)
            .to_kind(Kind::Float)
            .flatten(0, -1);
        let values = Vec::<f32>::try_from(&flat)?;

        let mut boxes = Vec::new();
        let mut scores = Vec::new();
        let mut classes = Vec::new();

        for row in values.chunks_exact(stride) {
            let objectness = row[4];
            if objectness < self.conf_threshold {
                continue;
            }

            let (class_id, class_conf) = row[BOX_FIELDS..]
                .iter()
                .enumerate()
                .fold((0usize, f32::MIN), |best, (c, &conf)| {
                    if conf > best.1 {
                        (c, conf)
                    } else {
                        best
                    }
                });

            let score = objectness * class_conf;
            if score < self.conf_threshold {
                continue;
            }

            let w = row[2] * scale_w;
            let h = row[3] * scale_h;
            let x1 = row[0] * scale_w - w / 2.0;
            let y1 = row[1] * scale_h - h / 2.0;

            boxes.push([x1, y1, w, h]);
            scores.push(score);
            classes.push(class_id as i32);
        }

        let keep = utils::batched_nms(&boxes, &scores, &classes, self.nms_threshold);
        debug!("{} candidates, {} kept after NMS", boxes.len(), keep.len());

        Ok(keep
            .into_iter()
            .map(|i| {
                let [x, y, w, h] = boxes[i];
                Detection::new(
                    classes[i],
                    scores[i],
                    BoundingBox::from_tlbr(x, y, x + w, y + h),
                )
            })
            .collect())
    }
}

impl Detector<Mat> for YoloDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<Detection>> {
        let orig_size = (frame.cols(), frame.rows());
        let input = self.preprocess(frame)?;
        let output = self.inference(&input)?;
        self.postprocess(&output, orig_size)
    }
}
