use dupe_eraser::duplicates::MatchKind;
use dupe_eraser::scanner::perceptual::DEFAULT_THRESHOLD;
use dupe_eraser::scanner::{Algorithm, FingerprintComputer, PerceptualAlgorithm};
use dupe_eraser::{classify, scan, ClassifierConfig, FileCandidate, Fingerprint};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn gradient(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 255) / width) as u8;
        let w = ((y * 255) / height) as u8;
        image::Rgb([v, w, 200 - v / 2])
    })
}

fn candidates(root: &Path) -> Vec<FileCandidate> {
    scan(root, false, None).unwrap().filter_map(Result::ok).collect()
}

#[test]
fn test_resized_png_copies_are_within_threshold() {
    let dir = tempdir().unwrap();
    let big = dir.path().join("big.png");
    let small = dir.path().join("small.png");
    gradient(128, 128).save(&big).unwrap();
    gradient(64, 64).save(&small).unwrap();

    let algorithm = Algorithm::Perceptual(PerceptualAlgorithm::Dhash);
    let computer = FingerprintComputer::new();
    let a = computer
        .compute(&FileCandidate::from_path(&big).unwrap(), algorithm)
        .unwrap();
    let b = computer
        .compute(&FileCandidate::from_path(&small).unwrap(), algorithm)
        .unwrap();

    let distance = a.hamming_distance(&b).unwrap();
    assert!(distance <= DEFAULT_THRESHOLD, "distance {distance}");
}

#[test]
fn test_non_images_are_not_applicable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "plain text").unwrap();
    let candidate = FileCandidate::from_path(&path).unwrap();

    let fp = FingerprintComputer::new()
        .compute(&candidate, Algorithm::Perceptual(PerceptualAlgorithm::Phash))
        .unwrap();

    assert!(matches!(fp, Fingerprint::NotApplicable));
    assert_ne!(fp, fp.clone());
}

#[test]
fn test_perceptual_primary_never_groups_non_images() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "identical").unwrap();
    fs::write(dir.path().join("b.txt"), "identical").unwrap();
    gradient(40, 40).save(dir.path().join("c.png")).unwrap();
    fs::copy(dir.path().join("c.png"), dir.path().join("d.png")).unwrap();

    let config = ClassifierConfig::new(Algorithm::Perceptual(PerceptualAlgorithm::Phash));
    let (groups, _) = classify(candidates(dir.path()), &config);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].original.path.file_name().unwrap(), "c.png");
    assert_eq!(groups[0].duplicates[0].file.path.file_name().unwrap(), "d.png");
}

#[test]
fn test_fallback_catches_near_duplicate_images_of_equal_size() {
    let dir = tempdir().unwrap();
    let base = gradient(48, 48);
    let mut retouched = base.clone();
    for x in 0..3 {
        retouched.put_pixel(x, 0, image::Rgb([0, 0, 0]));
    }
    base.save(dir.path().join("holiday.bmp")).unwrap();
    retouched.save(dir.path().join("holiday_edit.bmp")).unwrap();

    let plain = ClassifierConfig::default();
    assert!(classify(candidates(dir.path()), &plain).0.is_empty());

    let with_fallback =
        ClassifierConfig::default().with_perceptual(PerceptualAlgorithm::Dhash, DEFAULT_THRESHOLD);
    let (groups, summary) = classify(candidates(dir.path()), &with_fallback);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicates[0].matched_by, MatchKind::Perceptual);
    assert_eq!(summary.perceptual_matches, 1);
}

#[test]
fn test_undecodable_image_is_left_alone() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.png"), b"not a png at all").unwrap();
    fs::write(dir.path().join("b.png"), b"not a png either").unwrap();

    let config =
        ClassifierConfig::default().with_perceptual(PerceptualAlgorithm::Phash, DEFAULT_THRESHOLD);
    let (groups, summary) = classify(candidates(dir.path()), &config);

    assert!(groups.is_empty());
    assert!(summary.failures.is_empty());
}

#[test]
fn test_recompressed_jpeg_copies_are_within_threshold() {
    let dir = tempdir().unwrap();
    let big = dir.path().join("photo.jpg");
    let small = dir.path().join("photo_small.jpeg");
    gradient(128, 128).save(&big).unwrap();
    gradient(96, 96).save(&small).unwrap();

    let algorithm = Algorithm::Perceptual(PerceptualAlgorithm::Dhash);
    let computer = FingerprintComputer::new();
    let a = computer
        .compute(&FileCandidate::from_path(&big).unwrap(), algorithm)
        .unwrap();
    let b = computer
        .compute(&FileCandidate::from_path(&small).unwrap(), algorithm)
        .unwrap();

    assert!(matches!(a, Fingerprint::Perceptual { .. }));
    let distance = a.hamming_distance(&b).unwrap();
    assert!(distance <= DEFAULT_THRESHOLD, "distance {distance}");
}

#[test]
fn test_identical_jpegs_group_under_perceptual_primary() {
    let dir = tempdir().unwrap();
    gradient(32, 32).save(dir.path().join("photo.jpg")).unwrap();
    fs::copy(dir.path().join("photo.jpg"), dir.path().join("photo2.jpg")).unwrap();

    let config = ClassifierConfig::new(Algorithm::Perceptual(PerceptualAlgorithm::Phash));
    let (groups, summary) = classify(candidates(dir.path()), &config);

    assert!(summary.failures.is_empty());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicates[0].file.path.file_name().unwrap(), "photo2.jpg");
}
