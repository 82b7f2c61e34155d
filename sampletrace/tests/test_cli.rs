use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/simple_record.jsonl")
}

fn sampletrace() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sampletrace"))
}

#[test]
fn test_protobuf_report_then_dump() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let trace = dir.path().join("report.trace");
    let dumped = dir.path().join("dump.txt");

    let status = sampletrace()
        .arg("-i")
        .arg(fixture())
        .arg("-o")
        .arg(&trace)
        .args(["--protobuf", "--show-callchain"])
        .status()
        .expect("Failed to run sampletrace");
    assert!(status.success());

    let status = sampletrace()
        .arg("--dump-protobuf-report")
        .arg(&trace)
        .arg("-o")
        .arg(&dumped)
        .status()
        .expect("Failed to run sampletrace");
    assert!(status.success());

    let text = std::fs::read_to_string(&dumped).expect("Failed to read dump");
    assert!(text.starts_with("magic: SIMPLEPERF\nversion: 1\n"));
    assert!(text.contains("sample 4:"));
}

#[test]
fn test_protobuf_defaults_to_report_sample_trace() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let status = sampletrace()
        .current_dir(dir.path())
        .arg("-i")
        .arg(fixture())
        .arg("--protobuf")
        .status()
        .expect("Failed to run sampletrace");
    assert!(status.success());

    let bytes = std::fs::read(dir.path().join("report_sample.trace")).expect("No default output");
    assert_eq!(&bytes[..10], b"SIMPLEPERF");
}

#[test]
fn test_text_report_on_stdout() {
    let output = sampletrace().arg("-i").arg(fixture()).output().expect("Failed to run sampletrace");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.starts_with("meta_info:\n"));
    assert!(text.contains("lost_situation:\n"));
}

#[test]
fn test_failures_exit_with_one() {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let output = sampletrace()
        .arg("-i")
        .arg(dir.path().join("missing.jsonl"))
        .output()
        .expect("Failed to run sampletrace");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));

    let bogus = dir.path().join("bogus.trace");
    std::fs::write(&bogus, b"not a report stream").unwrap();
    let output = sampletrace()
        .arg("--dump-protobuf-report")
        .arg(&bogus)
        .output()
        .expect("Failed to run sampletrace");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad magic"));
}
