use dupe_eraser::actions::{quarantine_file, ResolutionExecutor};
use dupe_eraser::stats::RunStatistics;
use dupe_eraser::{classify, scan, Action, ClassifierConfig, Policy};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn classify_dir(root: &Path, safe: &Path) -> Vec<dupe_eraser::DuplicateGroup> {
    let found: Vec<_> = scan(root, true, Some(safe))
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    classify(found, &ClassifierConfig::default()).0
}

#[test]
fn test_quarantine_same_base_names_never_lost() {
    let dir = tempdir().unwrap();
    for sub in ["keep", "x", "y", "z"] {
        fs::create_dir(dir.path().join(sub)).unwrap();
    }
    fs::write(dir.path().join("keep/report.pdf"), "same bytes").unwrap();
    fs::write(dir.path().join("x/report.pdf"), "same bytes").unwrap();
    fs::write(dir.path().join("y/report.pdf"), "same bytes").unwrap();
    fs::write(dir.path().join("z/report.pdf"), "same bytes").unwrap();
    let safe = dir.path().join("safe");

    let groups = classify_dir(dir.path(), &safe);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicate_count(), 3);

    let stats = RunStatistics::new();
    let outcomes = ResolutionExecutor::new(Policy::Quarantine, &safe, &stats).resolve(&groups);

    let mut moved: Vec<_> = outcomes
        .iter()
        .map(|o| match &o.action {
            Action::Quarantined(target) => target.file_name().unwrap().to_string_lossy().into_owned(),
            other => panic!("unexpected outcome {other:?}"),
        })
        .collect();
    moved.sort();
    assert_eq!(
        moved,
        vec!["report.pdf", "report_copy.pdf", "report_copy_copy.pdf"]
    );
    for name in &moved {
        assert_eq!(fs::read_to_string(safe.join(name)).unwrap(), "same bytes");
    }
    assert!(dir.path().join("keep/report.pdf").exists());
    assert_eq!(stats.bytes_saved(), 30);
}

#[test]
fn test_quarantine_preexisting_target_untouched() {
    let dir = tempdir().unwrap();
    let safe = dir.path().join("safe");
    fs::create_dir(&safe).unwrap();
    fs::write(safe.join("notes.txt"), "from an earlier run").unwrap();

    let source = dir.path().join("notes.txt");
    fs::write(&source, "new duplicate").unwrap();

    let target = quarantine_file(&source, &safe).unwrap();
    assert_eq!(target, safe.join("notes_copy.txt"));
    assert_eq!(
        fs::read_to_string(safe.join("notes.txt")).unwrap(),
        "from an earlier run"
    );
    assert!(!source.exists());
}

#[test]
fn test_touched_duplicate_fails_and_run_continues() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "dup").unwrap();
    fs::write(dir.path().join("b"), "dup").unwrap();
    fs::write(dir.path().join("c"), "dup").unwrap();
    let safe = dir.path().join("safe");
    let groups = classify_dir(dir.path(), &safe);

    // same size, new mtime
    filetime::set_file_mtime(dir.path().join("c"), FileTime::from_unix_time(1_000_000, 0)).unwrap();

    let stats = RunStatistics::new();
    let outcomes = ResolutionExecutor::new(Policy::Delete, &safe, &stats).resolve(&groups);

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].path, groups[0].duplicates[1].file.path);
    assert_eq!(outcomes[0].action, Action::Failed("modified since scan".into()));
    assert_eq!(outcomes[1].action, Action::Deleted);
    assert!(dir.path().join("c").exists());
    assert!(!dir.path().join("b").exists());
    assert_eq!(stats.failures(), 1);
    assert_eq!(stats.bytes_saved(), 3);
}

#[test]
fn test_original_removed_after_scan_keeps_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "dup").unwrap();
    fs::write(dir.path().join("b"), "dup").unwrap();
    let safe = dir.path().join("safe");
    let groups = classify_dir(dir.path(), &safe);

    fs::remove_file(dir.path().join("a")).unwrap();

    let stats = RunStatistics::new();
    let outcomes = ResolutionExecutor::new(Policy::Quarantine, &safe, &stats).resolve(&groups);

    assert_eq!(outcomes[0].action, Action::Kept);
    assert!(dir.path().join("b").exists());
    assert!(!safe.exists());
}

#[test]
fn test_stats_accumulate_across_classify_and_resolve() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "12345678").unwrap();
    fs::write(dir.path().join("b"), "12345678").unwrap();
    fs::write(dir.path().join("c"), "87654321").unwrap();
    let safe = dir.path().join("safe");

    let stats = Arc::new(RunStatistics::new());
    let found: Vec<_> = scan(dir.path(), false, Some(&safe))
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    let (groups, _) = classify(
        found,
        &ClassifierConfig::default().with_stats(Arc::clone(&stats)),
    );
    ResolutionExecutor::new(Policy::Delete, &safe, &stats).resolve(&groups);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.files_processed, 3);
    assert_eq!(snapshot.bytes_processed, 24);
    assert_eq!(snapshot.duplicates_found, 1);
    assert_eq!(snapshot.bytes_saved, 8);
    assert_eq!(snapshot.algorithms.len(), 1);
    assert_eq!(snapshot.algorithms[0].algorithm, "xxh3_128");
    assert_eq!(snapshot.algorithms[0].files, 3);
}

#[test]
#[cfg(unix)]
fn test_deleting_a_linked_duplicate_reclaims_nothing() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let target = outside.path().join("target.bin");
    fs::write(&target, vec![9u8; 4096]).unwrap();
    fs::write(dir.path().join("a.bin"), vec![9u8; 4096]).unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("z_link.bin")).unwrap();
    let safe = dir.path().join("safe");

    let groups = classify_dir(dir.path(), &safe);
    assert_eq!(groups.len(), 1);
    assert!(groups[0].duplicates[0].file.path.ends_with("z_link.bin"));

    let stats = RunStatistics::new();
    let outcomes = ResolutionExecutor::new(Policy::Delete, &safe, &stats).resolve(&groups);

    assert_eq!(outcomes[0].action, Action::Deleted);
    assert_eq!(outcomes[0].bytes_reclaimed, 0);
    assert_eq!(stats.bytes_saved(), 0);
    assert!(target.exists());
}

#[test]
#[cfg(unix)]
fn test_quarantining_a_linked_duplicate_reclaims_nothing() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let target = outside.path().join("target.bin");
    fs::write(&target, vec![3u8; 2048]).unwrap();
    fs::write(dir.path().join("a.bin"), vec![3u8; 2048]).unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("z_link.bin")).unwrap();
    let safe = dir.path().join("safe");

    let groups = classify_dir(dir.path(), &safe);
    let stats = RunStatistics::new();
    let outcomes = ResolutionExecutor::new(Policy::Quarantine, &safe, &stats).resolve(&groups);

    assert!(matches!(outcomes[0].action, Action::Quarantined(_)));
    assert_eq!(outcomes[0].bytes_reclaimed, 0);
    assert_eq!(stats.bytes_saved(), 0);
    assert!(target.exists());
}
