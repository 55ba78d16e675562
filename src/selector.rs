use crate::detection::Detection;

/// Whether a detection may anchor the tracker: target class, confidence strictly
/// above the threshold, and a box with positive extents.
pub fn qualifies(det: &Detection, target_class: i32, min_confidence: f32) -> bool {
    det.class_id == target_class && det.confidence > min_confidence && det.bbox.is_well_formed()
}

/// First qualifying detection in detector order. No re-sorting.
pub fn select(detections: &[Detection], target_class: i32, min_confidence: f32) -> Option<Detection> {
    detections
        .iter()
        .find(|det| qualifies(det, target_class, min_confidence))
        .copied()
}
