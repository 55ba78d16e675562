//! Box overlap helpers used by detector post-processing.

/// Offset applied per class so boxes of different classes never overlap.
const CLASS_OFFSET: f32 = 4096.0;

/// Perform non-max suppression on (tlwh) boxes & scores, return indices to keep
/// ordered by descending score.
pub fn nms(boxes: &[[f32; 4]], scores: &[f32], iou_thresh: f32) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..boxes.len()).collect();
    idxs.sort_by(|&i, &j| scores[j].total_cmp(&scores[i]));
    let mut keep = Vec::new();
    while let Some(&i) = idxs.first() {
        keep.push(i);
        idxs = idxs
            .into_iter()
            .skip(1)
            .filter(|&j| compute_iou_array(&boxes[i], &boxes[j]) < iou_thresh)
            .collect();
    }
    keep
}

/// Class-aware NMS: boxes only suppress boxes of the same class.
pub fn batched_nms(
    boxes: &[[f32; 4]],
    scores: &[f32],
    classes: &[i32],
    iou_thresh: f32,
) -> Vec<usize> {
    let shifted: Vec<[f32; 4]> = boxes
        .iter()
        .zip(classes)
        .map(|(b, &c)| {
            let off = c as f32 * CLASS_OFFSET;
            [b[0] + off, b[1] + off, b[2], b[3]]
        })
        .collect();
    nms(&shifted, scores, iou_thresh)
}

/// Compute IoU between two bounding boxes as arrays: [x1, y1, w, h]
pub fn compute_iou_array(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    compute_iou_tlbr(
        (a[0], a[1], a[0] + a[2], a[1] + a[3]),
        (b[0], b[1], b[0] + b[2], b[1] + b[3]),
    )
}

fn compute_iou_tlbr(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> f32 {
    let x1 = a.0.max(b.0);
    let y1 = a.1.max(b.1);
    let x2 = a.2.min(b.2);
    let y2 = a.3.min(b.3);

    let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let a_area = (a.2 - a.0) * (a.3 - a.1);
    let b_area = (b.2 - b.0) * (b.3 - b.1);

    if a_area + b_area - inter_area <= 0.0 {
        return 0.0;
    }

    inter_area / (a_area + b_area - inter_area)
}
