/*!
 * Integration tests for the protree command line
 */

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn protree() -> Command {
    Command::new(env!("CARGO_BIN_EXE_protree"))
}

#[test]
fn test_encode_then_decode() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("app");
    fs::create_dir_all(project.join("src").join("bin")).unwrap();
    fs::create_dir_all(project.join("fixtures")).unwrap();
    fs::write(project.join("src").join("lib.rs"), "pub fn answer() -> u32 {\n    42\n}\n").unwrap();
    fs::write(project.join("notes.txt"), "no newline at end").unwrap();

    let out = temp.path().join("out");
    let output = protree()
        .arg("encode")
        .arg(&project)
        .arg("--output-dir")
        .arg(&out)
        .arg("--quiet")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("directory.txt").is_file());
    assert!(out.join("contents.txt").is_file());
    assert!(out.join("app_structure_with_code.md").is_file());

    let rebuilt = temp.path().join("rebuilt");
    let output = protree()
        .arg("decode")
        .arg("--tree")
        .arg(out.join("directory.txt"))
        .arg("--contents")
        .arg(out.join("contents.txt"))
        .arg("--output")
        .arg(&rebuilt)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("RECONSTRUCTION COMPLETE"));

    assert!(rebuilt.join("src").join("bin").is_dir());
    assert!(rebuilt.join("fixtures").is_dir());
    assert_eq!(
        fs::read_to_string(rebuilt.join("src").join("lib.rs")).unwrap(),
        "pub fn answer() -> u32 {\n    42\n}\n"
    );
    assert_eq!(
        fs::read_to_string(rebuilt.join("notes.txt")).unwrap(),
        "no newline at end"
    );
}

#[test]
fn test_encode_json_summary() {
    let temp = tempdir().unwrap();
    let project = temp.path().join("app");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("main.py"), "print('hi')\n").unwrap();

    let output = protree()
        .args(["--format", "json", "encode", "--no-report"])
        .arg(&project)
        .arg("-o")
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["files_processed"], 1);
    assert_eq!(summary["output_files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_decode_reports_unsafe_path() {
    let temp = tempdir().unwrap();
    let contents = temp.path().join("contents.txt");
    fs::write(&contents, "<../escape.txt>\nnope\n</../escape.txt>\n<ok.txt>\nfine\n</ok.txt>\n").unwrap();

    let rebuilt = temp.path().join("rebuilt");
    let output = protree()
        .args(["--quiet", "decode", "--no-tree", "--contents"])
        .arg(&contents)
        .arg("-o")
        .arg(&rebuilt)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(rebuilt.join("ok.txt")).unwrap(), "fine\n");
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_decode_missing_input_fails() {
    let temp = tempdir().unwrap();
    let output = protree()
        .arg("decode")
        .arg("--tree")
        .arg(temp.path().join("absent.txt"))
        .arg("--no-contents")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_completions() {
    let output = protree().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("protree"));
}
