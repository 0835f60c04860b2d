use clap::Parser;
use dupe_eraser::cli::{Cli, Commands};
use dupe_eraser::error::{exit_code_for, ExitCode};
use dupe_eraser::output::OutputFormat;
use dupe_eraser::run_app;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Scan arguments with an empty config file so a user config cannot leak in.
fn scan_cli(root: &Path, config_dir: &TempDir, extra: &[&str]) -> Cli {
    let config = config_dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let mut args = vec![
        "dupe-eraser".to_string(),
        "-q".to_string(),
        "scan".to_string(),
        root.display().to_string(),
        "--no-progress".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    args.extend(extra.iter().map(|s| (*s).to_string()));
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_no_duplicates_exits_with_2() {
    let root = tempdir().unwrap();
    let config = tempdir().unwrap();
    fs::write(root.path().join("one.txt"), "one").unwrap();
    fs::write(root.path().join("two.txt"), "two!").unwrap();

    let code = run_app(scan_cli(root.path(), &config, &[])).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_report_run_exits_with_0_and_touches_nothing() {
    let root = tempdir().unwrap();
    let config = tempdir().unwrap();
    fs::write(root.path().join("a.txt"), "same").unwrap();
    fs::write(root.path().join("b.txt"), "same").unwrap();

    let code = run_app(scan_cli(root.path(), &config, &["-o", "json"])).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(root.path().join("b.txt").exists());
}

#[test]
fn test_quarantine_run_moves_duplicates() {
    let root = tempdir().unwrap();
    let config = tempdir().unwrap();
    let nested = root.path().join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(root.path().join("a.txt"), "payload").unwrap();
    fs::write(nested.join("a.txt"), "payload").unwrap();

    let cli = scan_cli(root.path(), &config, &["-r", "--quarantine", "-a", "sha256"]);
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);

    assert!(root.path().join("a.txt").exists());
    assert!(!nested.join("a.txt").exists());
    let held = root.path().join("dupe_eraser_safe").join("a.txt");
    assert_eq!(fs::read_to_string(held).unwrap(), "payload");
}

#[test]
fn test_delete_run_removes_duplicates() {
    let root = tempdir().unwrap();
    let config = tempdir().unwrap();
    fs::write(root.path().join("a.bin"), "xyz").unwrap();
    fs::write(root.path().join("b.bin"), "xyz").unwrap();
    fs::write(root.path().join("c.bin"), "xyz").unwrap();

    let cli = scan_cli(root.path(), &config, &["--delete", "--shallow"]);
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);

    let left: Vec<_> = fs::read_dir(root.path()).unwrap().collect();
    assert_eq!(left.len(), 1);
    assert!(root.path().join("a.bin").exists());
}

#[test]
fn test_delete_with_quarantine_is_a_config_error() {
    let root = tempdir().unwrap();
    let config = tempdir().unwrap();
    let cli = scan_cli(root.path(), &config, &["--delete", "--quarantine"]);

    let err = run_app(cli).unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::ConfigError);
    assert_eq!(exit_code_for(&err).as_i32(), 4);
}

#[test]
fn test_unsupported_algorithm_is_a_config_error() {
    let root = tempdir().unwrap();
    let config = tempdir().unwrap();
    let cli = scan_cli(root.path(), &config, &["--algorithm", "crc32"]);

    let err = run_app(cli).unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::ConfigError);
    assert!(format!("{err:#}").contains("crc32"));
}

#[test]
fn test_missing_root_is_a_config_error() {
    let root = tempdir().unwrap();
    let config = tempdir().unwrap();
    let cli = scan_cli(&root.path().join("missing"), &config, &[]);

    let err = run_app(cli).unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::ConfigError);
}

#[test]
fn test_algorithms_command() {
    let cli = Cli::try_parse_from(["dupe-eraser", "algorithms"]).unwrap();
    assert!(matches!(cli.command, Commands::Algorithms));
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);
}

#[test]
fn test_benchmark_command() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("sample.bin");
    fs::write(&file, vec![1u8; 64 * 1024]).unwrap();

    let cli = Cli::try_parse_from([
        "dupe-eraser",
        "-q",
        "benchmark",
        file.to_str().unwrap(),
        "--iterations",
        "1",
        "--output",
        "json",
    ])
    .unwrap();
    match &cli.command {
        Commands::Benchmark(args) => {
            assert_eq!(args.iterations, 1);
            assert_eq!(args.output, OutputFormat::Json);
        }
        other => panic!("unexpected command {other:?}"),
    }
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);
}

#[test]
fn test_benchmark_rejects_zero_iterations() {
    let result = Cli::try_parse_from(["dupe-eraser", "benchmark", "f", "--iterations", "0"]);
    assert!(result.is_err());
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    let result = Cli::try_parse_from(["dupe-eraser", "-q", "-v", "scan", "."]);
    assert!(result.is_err());
}
