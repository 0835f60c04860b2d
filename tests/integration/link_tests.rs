use dupe_eraser::scanner::hardlink::LinkTracker;
use dupe_eraser::stats::RunStatistics;
use dupe_eraser::{classify, resolve, scan, Action, ClassifierConfig, FileCandidate, Policy};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn candidates(root: &Path) -> Vec<FileCandidate> {
    scan(root, true, None).unwrap().filter_map(Result::ok).collect()
}

#[test]
fn test_hardlinks_to_same_file_not_counted_as_duplicates() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    let hardlink = dir.path().join("hardlink.txt");

    File::create(&original)
        .unwrap()
        .write_all(b"identical content")
        .unwrap();

    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let files = candidates(dir.path());
    let (groups, _) = classify(files.clone(), &ClassifierConfig::default());

    if LinkTracker::is_supported() {
        assert_eq!(files.len(), 1);
        assert!(groups.is_empty());
    } else {
        assert_eq!(files.len(), 2);
    }
}

#[test]
fn test_hardlink_beside_real_copy() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    fs::write(&a, "shared bytes").unwrap();
    fs::write(dir.path().join("c.txt"), "shared bytes").unwrap();
    if fs::hard_link(&a, dir.path().join("b.txt")).is_err() || !LinkTracker::is_supported() {
        return;
    }

    let (groups, _) = classify(candidates(dir.path()), &ClassifierConfig::default());

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicates.len(), 1);
    assert!(groups[0].original.path.ends_with("a.txt"));
    assert!(groups[0].duplicates[0].file.path.ends_with("c.txt"));
}

#[test]
#[cfg(unix)]
fn test_symlink_to_copy_is_not_deleted_as_duplicate() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real.txt");
    fs::write(&real, "only copy").unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("alias.txt")).unwrap();

    let stats = RunStatistics::new();
    let (groups, _) = classify(candidates(dir.path()), &ClassifierConfig::default());
    let outcomes = resolve(&groups, Policy::Delete, &dir.path().join("safe"), &stats);

    assert!(groups.is_empty());
    assert!(outcomes.is_empty());
    assert_eq!(fs::read_to_string(&real).unwrap(), "only copy");
}

#[test]
#[cfg(unix)]
fn test_symlinked_directory_is_not_followed() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("inner.txt"), "inner").unwrap();
    std::os::unix::fs::symlink(&sub, dir.path().join("loop")).unwrap();

    let files = candidates(dir.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("sub/inner.txt"));
}

#[test]
#[cfg(unix)]
fn test_link_to_outside_file_groups_with_inside_copy() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let target = outside.path().join("target.txt");
    fs::write(&target, "mirror").unwrap();
    fs::write(dir.path().join("copy.txt"), "mirror").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("alias.txt")).unwrap();

    let stats = RunStatistics::new();
    let (groups, _) = classify(candidates(dir.path()), &ClassifierConfig::default());
    let outcomes = resolve(&groups, Policy::Report, &dir.path().join("safe"), &stats);

    assert_eq!(groups.len(), 1);
    assert!(groups[0].original.path.ends_with("alias.txt"));
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].action, Action::Reported);
}
