use std::fs;

use assert_cmd::Command;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_densegraph"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_exits_with_success_on_help() {
    cli().arg("--help").assert().success();
}

#[test]
fn test_cli_without_mode_prints_help() {
    let output = cli().output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[test]
fn test_cli_generate_only_writes_graph() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("run");
    cli()
        .args(["-g", "-v", "12", "-t", "3", "-q", "-o"])
        .arg(&base)
        .assert()
        .success();
    let graph = fs::read(dir.path().join("run.graph")).unwrap();
    assert_eq!(graph.len(), 3 + 12 * 25);
    assert!(!dir.path().join("run.parent").exists());
}

#[test]
fn test_cli_generate_and_traverse_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("full");
    cli()
        .args(["-v", "30", "-d", "10", "--seed", "4", "--undirected", "-q", "-o"])
        .arg(&base)
        .assert()
        .success();
    assert!(dir.path().join("full.graph").exists());
    let parents = fs::read_to_string(dir.path().join("full.parent")).unwrap();
    assert_eq!(parents.lines().count(), 30);
    assert!(parents.starts_with("0 -1\n"));
}

#[test]
fn test_cli_reads_input_graph() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.graph");
    fs::write(&input, "3\n0 1 0 \n0 0 1 \n0 0 0 \n").unwrap();
    let base = dir.path().join("out");
    cli()
        .args(["-q", "-t", "2", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&base)
        .assert()
        .success();
    let parents = fs::read_to_string(dir.path().join("out.parent")).unwrap();
    assert_eq!(parents, "0 -1\n1 0\n2 1\n");
}

#[test]
fn test_cli_report_prints_phase_json() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("rep");
    let output = cli()
        .args(["-v", "8", "-q", "--report", "-o"])
        .arg(&base)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report.as_array().map(Vec::len), Some(5));
}

#[test]
fn test_cli_generate_without_vertices_is_config_error() {
    cli().arg("-g").assert().code(2);
}

#[test]
fn test_cli_input_with_vertices_is_config_error() {
    cli().args(["-i", "x.graph", "-v", "4"]).assert().code(2);
}

#[test]
fn test_cli_density_out_of_range_is_config_error() {
    cli().args(["-v", "4", "-d", "101"]).assert().code(2);
}

#[test]
fn test_cli_corrupt_input_fails_at_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.graph");
    fs::write(&input, "2\n0 1 \n1 x \n").unwrap();
    cli()
        .arg("-q")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("bad"))
        .assert()
        .code(1);
}
