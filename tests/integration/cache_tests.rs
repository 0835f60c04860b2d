use dupe_eraser::cache::FingerprintCache;
use dupe_eraser::duplicates::Classifier;
use dupe_eraser::scanner::{Algorithm, StrongAlgorithm};
use dupe_eraser::{scan, ClassifierConfig, FileCandidate, Fingerprint};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn candidates(root: &Path) -> Vec<FileCandidate> {
    scan(root, true, None).unwrap().filter_map(Result::ok).collect()
}

#[test]
fn test_second_run_served_from_cache() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "cached").unwrap();
    fs::write(dir.path().join("b.txt"), "cached").unwrap();

    let classifier = Classifier::new(ClassifierConfig::new(Algorithm::Strong(
        StrongAlgorithm::Blake3,
    )));
    let (first, summary) = classifier.classify(candidates(dir.path()));
    assert_eq!(summary.cache_misses, 2);
    assert_eq!(summary.cache_hits, 0);

    let (second, summary) = classifier.classify(candidates(dir.path()));
    assert_eq!(summary.cache_hits, 2);
    assert_eq!(summary.cache_misses, 0);
    assert_eq!(first, second);
    assert_eq!(classifier.cache().len(), 2);
}

#[test]
fn test_modified_file_is_rehashed() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    fs::write(&a, "before").unwrap();
    fs::write(&b, "before").unwrap();
    let past = FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&a, past).unwrap();
    filetime::set_file_mtime(&b, past).unwrap();

    let classifier = Classifier::new(ClassifierConfig::default());
    let (groups, _) = classifier.classify(candidates(dir.path()));
    assert_eq!(groups.len(), 1);

    // same size, new content, new mtime
    fs::write(&b, "after!").unwrap();
    filetime::set_file_mtime(&b, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let (groups, summary) = classifier.classify(candidates(dir.path()));
    assert!(groups.is_empty());
    assert_eq!(summary.cache_hits, 1);
    assert_eq!(summary.cache_misses, 1);
}

#[test]
fn test_entries_are_per_algorithm() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("f.bin");
    fs::write(&path, "x").unwrap();
    let candidate = FileCandidate::from_path(&path).unwrap();
    let sha = Algorithm::Strong(StrongAlgorithm::Sha256);

    let cache = FingerprintCache::new();
    cache.insert(&candidate, sha, Fingerprint::NotApplicable);

    assert!(cache.get(&candidate, Algorithm::default()).is_none());
    assert!(cache.get(&candidate, sha).is_some());
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
}

#[test]
fn test_stale_entry_is_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("f.bin");
    fs::write(&path, "one").unwrap();
    let before = FileCandidate::from_path(&path).unwrap();

    let cache = FingerprintCache::new();
    cache.insert(&before, Algorithm::default(), Fingerprint::NotApplicable);

    fs::write(&path, "three").unwrap();
    let after = FileCandidate::from_path(&path).unwrap();

    assert!(cache.get(&after, Algorithm::default()).is_none());
    assert!(cache.is_empty());
}
