use clap::Parser;
use dupescan::cli::Cli;
use dupescan::error::ExitCode;
use dupescan::run_app;
use std::fs;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dupescan", "-q", "--no-color"];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

fn settings_file(dir: &std::path::Path, content: &str) -> String {
    let path = dir.join("settings.toml");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_scan_with_duplicates_succeeds() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"X").unwrap();
    fs::write(dir.path().join("b.txt"), b"X").unwrap();
    let config = settings_file(dir.path(), "");

    let code = run(&["--config", &config, "scan", dir.path().to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_scan_without_duplicates() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"X").unwrap();
    fs::write(data.join("b.txt"), b"Y").unwrap();
    let config = settings_file(dir.path(), "");

    let code = run(&[
        "--config",
        &config,
        "scan",
        data.to_str().unwrap(),
        "--output",
        "json",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_scan_missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    assert!(run(&["scan", missing.to_str().unwrap()]).is_err());
}

#[test]
fn test_scan_file_path_is_an_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, b"x").unwrap();

    let err = run(&["scan", file.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("Not a directory"));
}

#[test]
fn test_count_command() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"X").unwrap();
    let config = settings_file(dir.path(), "");

    let code = run(&["--config", &config, "count", dir.path().to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = run(&[
        "--config",
        missing.to_str().unwrap(),
        "scan",
        dir.path().to_str().unwrap(),
    ])
    .unwrap_err();
    assert!(format!("{err:#}").contains("Config file not found"));
}

#[test]
fn test_config_file_options_reach_the_scan() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"X").unwrap();
    fs::write(data.join("b.bak"), b"X").unwrap();

    let config = settings_file(dir.path(), "ignore_patterns = [\"*.bak\"]\n");
    let code = run(&["--config", &config, "scan", data.to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    let empty = dir.path().join("empty.toml");
    fs::write(&empty, "").unwrap();
    let code = run(&[
        "--config",
        empty.to_str().unwrap(),
        "scan",
        data.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}
