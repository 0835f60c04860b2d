use dupe_eraser::duplicates::MatchKind;
use dupe_eraser::scanner::{Algorithm, StrongAlgorithm};
use dupe_eraser::stats::RunStatistics;
use dupe_eraser::{classify, resolve, scan, Action, ClassifierConfig, FileCandidate, Policy};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

const SHA256: Algorithm = Algorithm::Strong(StrongAlgorithm::Sha256);

fn candidates(root: &Path, recursive: bool) -> Vec<FileCandidate> {
    scan(root, recursive, None)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn group_sets(groups: &[dupe_eraser::DuplicateGroup]) -> BTreeSet<BTreeSet<PathBuf>> {
    groups
        .iter()
        .map(|g| g.paths().into_iter().collect())
        .collect()
}

#[test]
fn test_hello_world_scenario() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();

    let stats = Arc::new(RunStatistics::new());
    let config = ClassifierConfig::new(SHA256).with_stats(Arc::clone(&stats));
    let (groups, summary) = classify(candidates(dir.path(), false), &config);

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.original.path.file_name().unwrap(), "a.txt");
    assert_eq!(group.duplicates.len(), 1);
    assert_eq!(group.duplicates[0].file.path.file_name().unwrap(), "b.txt");
    assert_eq!(summary.duplicate_files, 1);

    let outcomes = resolve(&groups, Policy::Delete, &dir.path().join("safe"), &stats);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].action, Action::Deleted);
    assert!(!dir.path().join("b.txt").exists());
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("c.txt").exists());
    assert_eq!(stats.bytes_saved(), 5);
    assert_eq!(stats.files_processed(), 3);
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();

    let found = candidates(dir.path(), true);
    assert!(found.is_empty());

    let (groups, summary) = classify(found, &ClassifierConfig::default());
    assert!(groups.is_empty());
    assert_eq!(summary.duplicate_groups, 0);

    let stats = RunStatistics::new();
    let outcomes = resolve(&groups, Policy::Delete, &dir.path().join("safe"), &stats);
    assert!(outcomes.is_empty());
    assert_eq!(stats.duplicates_found(), 0);
    assert!(!dir.path().join("safe").exists());
}

#[test]
fn test_every_strong_algorithm_groups_identical_content_in_any_order() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("one.bin"), b"identical payload").unwrap();
    fs::write(sub.join("two.bin"), b"identical payload").unwrap();
    fs::write(dir.path().join("three.bin"), b"identical payload").unwrap();
    fs::write(dir.path().join("other.bin"), b"different payload").unwrap();

    let forward = candidates(dir.path(), true);
    let mut backward = forward.clone();
    backward.reverse();

    for strong in StrongAlgorithm::ALL {
        let config = ClassifierConfig::new(Algorithm::Strong(strong));
        let (groups_fwd, _) = classify(forward.clone(), &config);
        let (groups_bwd, _) = classify(backward.clone(), &config);

        assert_eq!(groups_fwd.len(), 1, "{strong}");
        assert_eq!(groups_fwd[0].duplicate_count(), 2, "{strong}");
        assert_eq!(group_sets(&groups_fwd), group_sets(&groups_bwd), "{strong}");
        assert_ne!(
            groups_fwd[0].original.path, groups_bwd[0].original.path,
            "original follows enumeration order"
        );
    }
}

#[test]
fn test_report_is_idempotent() {
    let dir = tempdir().unwrap();
    for (name, content) in [("a", "x1"), ("b", "x1"), ("c", "x2"), ("d", "x2"), ("e", "x3")] {
        fs::write(dir.path().join(name), content).unwrap();
    }
    let config = ClassifierConfig::new(SHA256).with_shallow_check(true);
    let stats = RunStatistics::new();

    let (first, _) = classify(candidates(dir.path(), true), &config);
    let outcomes = resolve(&first, Policy::Report, &dir.path().join("safe"), &stats);
    assert!(outcomes.iter().all(|o| o.action == Action::Reported));

    let (second, _) = classify(candidates(dir.path(), true), &config);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert!(!dir.path().join("safe").exists());
}

#[test]
fn test_different_sizes_never_grouped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("short"), "abc").unwrap();
    fs::write(dir.path().join("long"), "abcabc").unwrap();

    let (groups, summary) = classify(candidates(dir.path(), false), &ClassifierConfig::default());
    assert!(groups.is_empty());
    assert_eq!(summary.grouping.eliminated_unique, 2);
    assert_eq!(summary.fingerprinted, 0);
}

#[test]
fn test_shallow_check_marks_verified() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), vec![9u8; 20_000]).unwrap();
    fs::write(dir.path().join("b"), vec![9u8; 20_000]).unwrap();

    let config = ClassifierConfig::default().with_shallow_check(true);
    let (groups, summary) = classify(candidates(dir.path(), false), &config);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicates[0].matched_by, MatchKind::Verified);
    assert_eq!(summary.verified_pairs, 1);
    assert_eq!(summary.collisions_rejected, 0);
}

#[test]
fn test_quarantine_dir_inside_root_is_not_rescanned() {
    let dir = tempdir().unwrap();
    let safe = dir.path().join("dupe_eraser_safe");
    fs::write(dir.path().join("a.txt"), "dup").unwrap();
    fs::write(dir.path().join("b.txt"), "dup").unwrap();

    let stats = RunStatistics::new();
    let found: Vec<_> = scan(dir.path(), true, Some(&safe))
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    let (groups, _) = classify(found, &ClassifierConfig::default());
    resolve(&groups, Policy::Quarantine, &safe, &stats);
    assert!(safe.join("b.txt").exists());

    let rescanned: Vec<_> = scan(dir.path(), true, Some(&safe))
        .unwrap()
        .filter_map(Result::ok)
        .collect();
    assert_eq!(rescanned.len(), 1);
    let (groups, _) = classify(rescanned, &ClassifierConfig::default());
    assert!(groups.is_empty());
}
