mod common;

use std::time::Instant;

use common::{coordinator, coordinator_with, det, Probe};
use roitrack::{
    geometry::{Point, Side},
    BoundingBox, Classification, Config, Error, TrackPhase, TrackState,
};

/// Lock on to a target centered in the frame, leaving the region where it started.
fn tracking_centered(probe: &std::rc::Rc<Probe>) -> common::TestCoordinator {
    let mut coord = coordinator(probe);
    probe.push_detections(vec![det(0, 0.9, 300, 300, 40, 40)]);
    let report = coord.step(&0u32, Instant::now()).unwrap();
    assert_eq!(report.state, TrackPhase::Tracking);
    assert_eq!(coord.region().top_left(), Point::new(195, 195));
    coord
}

#[test]
fn test_scenario_a_inside_slows_cadence() {
    let probe = Probe::new();
    let mut coord = tracking_centered(&probe);

    probe.push_update(Some(BoundingBox::new(300, 300, 40, 40)));
    let report = coord.step(&1u32, Instant::now()).unwrap();

    assert_eq!(report.classification, Some(Classification::Inside));
    assert_eq!(report.target_center, Some(Point::new(320, 320)));
    assert_eq!(coord.cadence().target_fps(), 15);
    assert!(!report.detector_invoked);
    assert_eq!(probe.detector_calls(), 1);
    assert!(coord.state().is_tracking());
}

#[test]
fn test_scenario_b_outside_speeds_up_and_reacquires() {
    let probe = Probe::new();
    let mut coord = tracking_centered(&probe);

    // Settle on the slow rate first so the toggle is observable
    probe.push_update(Some(BoundingBox::new(300, 300, 40, 40)));
    coord.step(&1u32, Instant::now()).unwrap();
    assert_eq!(coord.cadence().target_fps(), 15);

    probe.push_update(Some(BoundingBox::new(10, 10, 20, 20)));
    let report = coord.step(&2u32, Instant::now()).unwrap();

    let Some(Classification::Outside(sides)) = report.classification else {
        panic!("expected outside, got {:?}", report.classification);
    };
    assert!(sides.contains(Side::Left));
    assert!(sides.contains(Side::Top));
    assert_eq!(sides.len(), 2);
    assert_eq!(coord.cadence().target_fps(), 30);

    // Re-acquisition ran on this very frame, found nothing, and the track survives
    assert!(report.reacquire_attempted);
    assert_eq!(*probe.detect_calls.borrow(), vec![0, 2]);
    assert_eq!(report.acquired, None);
    assert_eq!(report.state, TrackPhase::Tracking);
    assert!(coord.is_tracker_active());
    assert_eq!(coord.region().top_left(), Point::new(195, 195));
}

#[test]
fn test_outside_reacquire_reanchors_tracker_and_region() {
    let probe = Probe::new();
    let mut coord = tracking_centered(&probe);

    probe.push_update(Some(BoundingBox::new(10, 10, 20, 20)));
    probe.push_detections(vec![det(0, 0.7, 12, 12, 20, 20)]);
    let report = coord.step(&1u32, Instant::now()).unwrap();

    assert_eq!(report.acquired, Some(det(0, 0.7, 12, 12, 20, 20)));
    assert_eq!(probe.inits.borrow().last(), Some(&(1, BoundingBox::new(12, 12, 20, 20))));
    // Classified against the old region, then recentered onto (22, 22)
    assert_eq!(report.classified_region.unwrap().top_left(), Point::new(195, 195));
    assert_eq!(coord.region().center(), Point::new(22, 22));
    assert_eq!(report.region.center(), Point::new(22, 22));
    assert_eq!(
        coord.state(),
        TrackState::Tracking {
            confidence: 0.7,
            bbox: BoundingBox::new(12, 12, 20, 20)
        }
    );

    // Next frame the target sits inside the moved region
    probe.push_update(Some(BoundingBox::new(12, 12, 20, 20)));
    let next = coord.step(&2u32, Instant::now()).unwrap();
    assert_eq!(next.classification, Some(Classification::Inside));
    assert_eq!(coord.cadence().target_fps(), 15);
}

#[test]
fn test_scenario_c_first_qualifying_detection_anchors() {
    let probe = Probe::new();
    let mut coord = coordinator(&probe);
    probe.push_detections(vec![
        det(0, 0.5, 100, 100, 50, 50),
        det(1, 0.9, 10, 10, 20, 20),
    ]);

    let before = coord.region().top_left();
    let report = coord.step(&0u32, Instant::now()).unwrap();

    assert_eq!(report.state, TrackPhase::Tracking);
    assert_eq!(report.acquired.map(|d| d.class_id), Some(0));
    assert_eq!(*probe.inits.borrow(), vec![(0, BoundingBox::new(100, 100, 50, 50))]);

    let shift = coord.region().top_left() - before;
    assert_eq!((shift.x, shift.y), (125 - 320, 125 - 320));
    assert_eq!(coord.region().top_left(), Point::new(0, 0));
    assert_eq!(coord.region().bottom_right(), Point::new(250, 250));
    assert_eq!(
        coord.state(),
        TrackState::Tracking {
            confidence: 0.5,
            bbox: BoundingBox::new(100, 100, 50, 50)
        }
    );
}

#[test]
fn test_searching_without_match_changes_nothing() {
    let probe = Probe::new();
    let mut coord = coordinator(&probe);
    probe.push_detections(vec![det(1, 0.9, 10, 10, 20, 20), det(0, 0.2, 5, 5, 9, 9)]);

    let report = coord.step(&0u32, Instant::now()).unwrap();

    assert_eq!(report.state, TrackPhase::Searching);
    assert!(report.detector_invoked);
    assert!(report.tracked_box.is_none());
    assert!(probe.inits.borrow().is_empty());
    assert_eq!(coord.region().top_left(), Point::new(195, 195));
    assert_eq!(coord.cadence().target_fps(), 30);
}

#[test]
fn test_scenario_d_lost_track_falls_back_same_frame() {
    let probe = Probe::new();
    let mut coord = tracking_centered(&probe);

    probe.push_update(None);
    let report = coord.step(&1u32, Instant::now()).unwrap();

    assert!(report.lost_track);
    assert_eq!(report.state, TrackPhase::Searching);
    assert_eq!(coord.state(), TrackState::Searching);
    assert!(!coord.is_tracker_active());
    assert_eq!(*probe.detect_calls.borrow(), vec![0, 1]);
    assert_eq!(coord.stats().tracker_failures, 1);

    // Searching afterwards: no tracker updates, only detection
    coord.step(&2u32, Instant::now()).unwrap();
    assert_eq!(*probe.update_calls.borrow(), vec![1]);
    assert_eq!(*probe.detect_calls.borrow(), vec![0, 1, 2]);
}

#[test]
fn test_lost_track_recovered_by_fallback_detection() {
    let probe = Probe::new();
    let mut coord = tracking_centered(&probe);

    probe.push_update(None);
    probe.push_detections(vec![det(0, 0.6, 400, 400, 40, 40)]);
    let report = coord.step(&1u32, Instant::now()).unwrap();

    assert!(report.lost_track);
    assert_eq!(report.state, TrackPhase::Tracking);
    assert_eq!(probe.inits.borrow().len(), 2);
    assert_eq!(coord.region().center(), Point::new(420, 420));
}

#[test]
fn test_tracker_init_failure_keeps_searching() {
    let probe = Probe::new();
    *probe.reject_init.borrow_mut() = true;
    let mut coord = coordinator(&probe);
    probe.push_detections(vec![det(0, 0.9, 300, 300, 40, 40)]);

    let report = coord.step(&0u32, Instant::now()).unwrap();

    assert_eq!(report.state, TrackPhase::Searching);
    assert_eq!(report.acquired, None);
    assert!(!coord.is_tracker_active());
    assert_eq!(coord.region().top_left(), Point::new(195, 195));
}

#[test]
fn test_detector_fault_is_fatal() {
    let probe = Probe::new();
    *probe.detector_fault.borrow_mut() = true;
    let mut coord = coordinator(&probe);

    assert!(matches!(coord.step(&0u32, Instant::now()), Err(Error::Detector(_))));
}

#[test]
fn test_reset_forces_search_on_current_frame() {
    let probe = Probe::new();
    let mut coord = tracking_centered(&probe);

    let found = coord.reset(&7u32).unwrap();

    assert_eq!(found, None);
    assert_eq!(coord.state(), TrackState::Searching);
    assert!(!coord.is_tracker_active());
    assert_eq!(*probe.detect_calls.borrow(), vec![0, 7]);

    probe.push_detections(vec![det(0, 0.8, 300, 300, 40, 40)]);
    let found = coord.reset(&8u32).unwrap();
    assert!(found.is_some());
    assert!(coord.state().is_tracking());
    assert_eq!(coord.stats().resets, 2);
}

#[test]
fn test_cadence_follows_latest_classification() {
    let probe = Probe::new();
    let mut coord = tracking_centered(&probe);

    let inside = BoundingBox::new(300, 300, 40, 40);
    let outside = BoundingBox::new(600, 300, 20, 20);
    let sequence = [outside, inside, inside, outside, outside, inside];
    for (i, bbox) in sequence.iter().enumerate() {
        probe.push_update(Some(*bbox));
        let report = coord.step(&(i as u32 + 1), Instant::now()).unwrap();
        let expected = if report.classification.unwrap().is_inside() { 15 } else { 30 };
        assert_eq!(coord.cadence().target_fps(), expected);
    }
}

#[test]
fn test_reacquire_interval_rate_limits_outside_detection() {
    let probe = Probe::new();
    let cfg = Config {
        reacquire_interval: 3,
        ..Config::default()
    };
    let mut coord = coordinator_with(&cfg, &probe);
    probe.push_detections(vec![det(0, 0.9, 300, 300, 40, 40)]);
    coord.step(&0u32, Instant::now()).unwrap();

    let outside = BoundingBox::new(600, 300, 20, 20);
    let mut attempts = Vec::new();
    for frame in 1..=7u32 {
        probe.push_update(Some(outside));
        let report = coord.step(&frame, Instant::now()).unwrap();
        assert_eq!(report.state, TrackPhase::Tracking);
        attempts.push(report.reacquire_attempted);
    }

    assert_eq!(attempts, vec![true, false, false, true, false, false, true]);
    assert_eq!(*probe.detect_calls.borrow(), vec![0, 1, 4, 7]);
    assert_eq!(coord.cadence().target_fps(), 30);
}

#[test]
fn test_region_size_survives_repeated_reacquisition() {
    let probe = Probe::new();
    let mut coord = coordinator(&probe);

    let targets = [(0, 0, 10, 10), (600, 20, 30, 30), (-50, 700, 12, 8), (320, 320, 1, 1)];
    for (frame, (x, y, w, h)) in targets.into_iter().enumerate() {
        coord.reset(&(frame as u32)).unwrap();
        probe.push_detections(vec![det(0, 0.9, x, y, w, h)]);
        coord.reset(&(frame as u32)).unwrap();

        let region = coord.region();
        assert_eq!(region.side(), 250);
        assert_eq!(region.bottom_right().y - region.top_left().y, 250);
        assert_eq!(region.center(), roitrack::geometry::center(&BoundingBox::new(x, y, w, h)));
    }
}

#[test]
fn test_invariant_tracking_iff_adapter_active() {
    let probe = Probe::new();
    let mut coord = coordinator(&probe);

    probe.push_detections(vec![]);
    probe.push_detections(vec![det(0, 0.9, 300, 300, 40, 40)]);
    probe.push_update(Some(BoundingBox::new(600, 600, 10, 10)));
    probe.push_update(None);

    for frame in 0..6u32 {
        coord.step(&frame, Instant::now()).unwrap();
        assert_eq!(coord.state().is_tracking(), coord.is_tracker_active());
    }
}
