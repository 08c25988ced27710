use dupescan::duplicates::{
    wait_for_report, EngineConfig, ScanController, ScanOutcome, ScanReport,
};
use dupescan::progress::{NoProgress, ProgressCallback};
use dupescan::scanner::{count_files, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

fn scan(root: &Path, config: EngineConfig) -> ScanReport {
    let mut controller = ScanController::new(config);
    let (_handle, events) = controller.start_scan(root).unwrap();
    let report = wait_for_report(&events, &NoProgress).unwrap();
    controller.finish().unwrap();
    report
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[derive(Default)]
struct Recorder {
    total: Mutex<Option<usize>>,
    counts: Mutex<Vec<usize>>,
    ended: Mutex<usize>,
}

impl ProgressCallback for Recorder {
    fn on_scan_start(&self, total: usize) {
        *self.total.lock().unwrap() = Some(total);
    }

    fn on_file_processed(&self, count: usize, _path: &Path) {
        self.counts.lock().unwrap().push(count);
    }

    fn on_scan_end(&self, _summary: &dupescan::duplicates::ScanSummary) {
        *self.ended.lock().unwrap() += 1;
    }
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let report = scan(dir.path(), EngineConfig::default());

    assert!(report.duplicates.is_empty());
    assert_eq!(report.summary.total_files, 0);
    assert_eq!(report.summary.outcome, ScanOutcome::Completed);
}

#[test]
fn test_scan_groups_by_content_across_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("one/two")).unwrap();
    fs::write(dir.path().join("a.txt"), b"shared").unwrap();
    fs::write(dir.path().join("one/b.txt"), b"shared").unwrap();
    fs::write(dir.path().join("one/two/c.txt"), b"shared").unwrap();
    fs::write(dir.path().join("one/d.txt"), b"unique").unwrap();

    let report = scan(dir.path(), EngineConfig::default());
    let groups: Vec<_> = report.duplicates.duplicate_groups().collect();

    assert_eq!(groups.len(), 1);
    let mut found = names(groups[0].1);
    found.sort();
    assert_eq!(found, vec!["a.txt", "b.txt", "c.txt"]);
    assert_eq!(report.duplicates.len(), 2);
}

#[test]
fn test_paths_are_absolute() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"x").unwrap();

    let report = scan(dir.path(), EngineConfig::default());
    for (_, files) in report.duplicates.iter() {
        for file in files {
            assert!(file.is_absolute(), "{} is not absolute", file.display());
        }
    }
}

#[test]
fn test_empty_files_share_a_group() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("empty1"), b"").unwrap();
    fs::write(dir.path().join("empty2"), b"").unwrap();

    let report = scan(dir.path(), EngineConfig::default());
    assert_eq!(report.duplicates.duplicate_group_count(), 1);
    assert_eq!(report.summary.bytes_hashed, 0);
}

#[test]
fn test_same_size_different_content_not_grouped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.bin"), vec![0u8; 200_000]).unwrap();
    let mut other = vec![0u8; 200_000];
    other[199_999] = 1;
    fs::write(dir.path().join("b.bin"), other).unwrap();

    let config = EngineConfig::default().with_buffer_size(4096);
    let report = scan(dir.path(), config);

    assert_eq!(report.duplicates.duplicate_group_count(), 0);
    assert_eq!(report.summary.bytes_hashed, 400_000);
}

#[test]
fn test_huge_buffer_size_completes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"X").unwrap();
    fs::write(dir.path().join("b.txt"), b"X").unwrap();

    let report = scan(dir.path(), EngineConfig::default().with_buffer_size(usize::MAX));

    assert_eq!(report.summary.outcome, ScanOutcome::Completed);
    assert_eq!(report.duplicates.duplicate_group_count(), 1);
}

#[test]
fn test_completeness_matches_count() {
    let dir = tempdir().unwrap();
    for i in 0..25 {
        let sub = dir.path().join(format!("d{}", i % 4));
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join(format!("f{i}")), format!("{}", i % 7)).unwrap();
    }

    let expected = count_files(dir.path(), &WalkerConfig::default());
    let report = scan(dir.path(), EngineConfig::default());

    assert_eq!(expected, 25);
    assert_eq!(report.duplicates.file_count(), expected);
    assert_eq!(report.summary.processed_files, expected);
    assert_eq!(report.duplicates.len(), 7);
}

#[test]
fn test_repeated_scans_group_identically() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        fs::write(dir.path().join(format!("f{i}")), format!("{}", i % 3)).unwrap();
    }

    let first = scan(dir.path(), EngineConfig::default());
    let second = scan(dir.path(), EngineConfig::default());
    assert_eq!(first.duplicates.grouping(), second.duplicates.grouping());
}

#[test]
fn test_progress_is_strictly_increasing_and_bounded() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        fs::write(dir.path().join(format!("f{i}")), b"data").unwrap();
    }

    let recorder = Recorder::default();
    let mut controller = ScanController::new(EngineConfig::default());
    let (_handle, events) = controller.start_scan(dir.path()).unwrap();
    let report = wait_for_report(&events, &recorder).unwrap();
    controller.finish().unwrap();

    let total = recorder.total.lock().unwrap().unwrap();
    let counts = recorder.counts.lock().unwrap().clone();
    assert_eq!(total, 10);
    assert_eq!(counts, (1..=10).collect::<Vec<_>>());
    assert_eq!(*recorder.ended.lock().unwrap(), 1);
    assert_eq!(report.summary.processed_files, 10);
}

#[test]
fn test_walker_options_apply_to_scan() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".hidden")).unwrap();
    fs::create_dir(dir.path().join("build")).unwrap();
    fs::write(dir.path().join("keep1.txt"), b"same").unwrap();
    fs::write(dir.path().join("keep2.txt"), b"same").unwrap();
    fs::write(dir.path().join(".hidden/h.txt"), b"same").unwrap();
    fs::write(dir.path().join("build/out.txt"), b"same").unwrap();
    fs::write(dir.path().join("notes.log"), b"same").unwrap();

    let walker = WalkerConfig::new(
        false,
        true,
        vec!["build/".to_string(), "*.log".to_string()],
    );
    let report = scan(dir.path(), EngineConfig::default().with_walker_config(walker));

    let (_, files) = report.duplicates.duplicate_groups().next().unwrap();
    let mut found = names(files);
    found.sort();
    assert_eq!(found, vec!["keep1.txt", "keep2.txt"]);
}

#[test]
fn test_drop_singletons_keeps_only_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"X").unwrap();
    fs::write(dir.path().join("b.txt"), b"X").unwrap();
    fs::write(dir.path().join("c.txt"), b"Y").unwrap();

    let report = scan(
        dir.path(),
        EngineConfig::default().with_retain_singletons(false),
    );

    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.summary.hashed_files, 3);
}

#[test]
fn test_missing_root_yields_empty_report() {
    let dir = tempdir().unwrap();
    let report = scan(&dir.path().join("missing"), EngineConfig::default());

    assert!(report.duplicates.is_empty());
    assert_eq!(report.summary.outcome, ScanOutcome::Completed);
    assert!(report.summary.has_errors());
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_not_counted_by_default() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real.txt"), b"content").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();

    let report = scan(dir.path(), EngineConfig::default());
    assert_eq!(report.duplicates.file_count(), 1);

    let follow = EngineConfig::default().with_walker_config(WalkerConfig::new(true, false, vec![]));
    let report = scan(dir.path(), follow);
    assert_eq!(report.duplicates.file_count(), 2);
    assert_eq!(report.duplicates.duplicate_group_count(), 1);
}
