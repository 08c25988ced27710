use dupescan::duplicates::{
    wait_for_report, ControlError, EngineConfig, ScanController, ScanEvent, ScanOutcome,
    ScanReport,
};
use dupescan::progress::NoProgress;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn populated_dir(files: usize) -> TempDir {
    let dir = tempdir().unwrap();
    for i in 0..files {
        fs::write(dir.path().join(format!("f{i:03}")), format!("{}", i % 5)).unwrap();
    }
    dir
}

fn full_scan(root: &Path) -> ScanReport {
    let mut controller = ScanController::new(EngineConfig::default());
    let (_handle, events) = controller.start_scan(root).unwrap();
    let report = wait_for_report(&events, &NoProgress).unwrap();
    controller.finish().unwrap();
    report
}

/// Every group of `partial` lies inside some group of `full`.
fn is_refinement(partial: &ScanReport, full: &ScanReport) -> bool {
    let full_groups = full.duplicates.grouping();
    partial.duplicates.grouping().iter().all(|group: &BTreeSet<PathBuf>| {
        full_groups.iter().any(|f| group.is_subset(f))
    })
}

#[test]
fn test_cancel_mid_scan_delivers_partial_result() {
    let dir = populated_dir(60);
    let full = full_scan(dir.path());

    let mut controller = ScanController::new(EngineConfig::default());
    let (handle, events) = controller.start_scan(dir.path()).unwrap();

    let mut done = 0;
    let mut report = None;
    for event in events.iter() {
        match event {
            ScanEvent::FileProcessed { count, .. } if count == 2 => handle.request_cancel(),
            ScanEvent::Done(r) => {
                done += 1;
                report = Some(r);
            }
            _ => {}
        }
    }
    controller.finish().unwrap();

    let report = report.unwrap();
    assert_eq!(done, 1);
    assert!(report.summary.processed_files >= 2);
    assert!(report.summary.processed_files <= 60);
    if report.summary.outcome == ScanOutcome::Cancelled {
        assert!(report.summary.processed_files < 60);
    }
    assert_eq!(report.duplicates.file_count(), report.summary.processed_files);
    assert!(is_refinement(&report, &full));
}

#[test]
fn test_cancel_then_wait_leaves_no_worker() {
    let dir = populated_dir(30);
    let mut controller = ScanController::new(EngineConfig::default());
    let (_handle, events) = controller.start_scan(dir.path()).unwrap();

    controller.cancel_and_wait().unwrap();
    assert!(!controller.is_active());

    let last = events.try_iter().last();
    assert!(matches!(last, Some(ScanEvent::Done(_))));
}

#[test]
fn test_cancel_when_idle_is_noop() {
    let controller = ScanController::new(EngineConfig::default());
    controller.request_cancel();
    controller.request_cancel();
    assert!(!controller.is_active());
}

#[test]
fn test_new_scan_after_cancel_is_unaffected() {
    let dir = populated_dir(20);
    let mut controller = ScanController::new(EngineConfig::default());

    let (handle, events) = controller.start_scan(dir.path()).unwrap();
    handle.request_cancel();
    let _ = wait_for_report(&events, &NoProgress).unwrap();
    controller.finish().unwrap();

    let (second, events) = controller.start_scan(dir.path()).unwrap();
    let report = wait_for_report(&events, &NoProgress).unwrap();
    controller.finish().unwrap();

    assert!(!second.is_cancel_requested());
    assert_eq!(report.summary.outcome, ScanOutcome::Completed);
    assert_eq!(report.duplicates.file_count(), 20);
}

#[test]
fn test_concurrent_start_rejected_or_reaped() {
    let dir = populated_dir(40);
    let mut controller = ScanController::new(EngineConfig::default());
    let (handle, events) = controller.start_scan(dir.path()).unwrap();

    match controller.start_scan(dir.path()) {
        Err(ControlError::ScanInProgress) => {
            handle.request_cancel();
            assert!(wait_for_report(&events, &NoProgress).is_some());
        }
        // The first worker already exited and was reaped
        Ok((_, second_events)) => {
            assert!(wait_for_report(&events, &NoProgress).is_some());
            assert!(wait_for_report(&second_events, &NoProgress).is_some());
        }
        Err(e) => panic!("Unexpected error: {e}"),
    }
    controller.finish().unwrap();
}
