use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(&path, content).expect("write file");
    path.canonicalize().expect("canonical path")
}

/// Project with a `.git` marker so root detection stops at the temp dir.
fn setup_repo() -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    fs::create_dir_all(temp.path().join(".git")).expect("git dir");
    write(
        temp.path(),
        "src/services/orders.py",
        "from src.models.user import User\nimport json\n",
    );
    write(temp.path(), "src/models/user.py", "from .base import Model\n");
    write(temp.path(), "src/models/base.py", "class Model:\n    pass\n");
    temp
}

#[allow(deprecated)]
fn cli(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("context-trace").expect("binary");
    cmd.current_dir(workdir).env_remove("RUST_LOG");
    cmd
}

fn stdout_lines(output: &std::process::Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn prints_inclusion_set_for_glob_seeds() {
    let temp = setup_repo();
    let root = temp.path();

    let output = cli(root)
        .arg("src/services/*.py")
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");

    let expected: Vec<String> = [
        "src/services/orders.py",
        "src/models/user.py",
        "src/models/base.py",
    ]
    .iter()
    .map(|rel| root.join(rel).canonicalize().expect("canonical").display().to_string())
    .collect();
    assert_eq!(stdout_lines(&output), expected);
}

#[test]
fn json_report_lists_files_and_counts() {
    let temp = setup_repo();

    let output = cli(temp.path())
        .args(["--json", "--quiet", "src/services/orders.py"])
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["files"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["seeds"], 1);
    assert_eq!(body["counts"]["resolved"], 2);
    assert_eq!(body["counts"]["skipped"]["external"], 1);
    assert_eq!(body["diagnostics"][0]["specifier"], "json");
}

#[test]
fn max_depth_flag_limits_expansion() {
    let temp = setup_repo();

    let output = cli(temp.path())
        .args(["--max-depth", "1", "src/services/orders.py"])
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_lines(&output).len(), 2);
}

#[test]
fn config_file_in_working_dir_is_applied() {
    let temp = setup_repo();
    fs::write(temp.path().join("context-trace.toml"), "max_depth = 0\n").expect("config");

    let output = cli(temp.path())
        .arg("src/services/orders.py")
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_lines(&output).len(), 1);
}

#[test]
fn alias_flag_resolves_bare_imports() {
    let temp = TempDir::new().expect("tempdir");
    let page = write(temp.path(), "web/pages/home.ts", "import { api } from '~/lib/api';\n");
    let api = write(temp.path(), "web/lib/api.ts", "export const api = {};\n");

    let output = cli(temp.path())
        .args(["--root", ".", "--alias", "~/=web", "web/pages/home.ts"])
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_lines(&output),
        vec![page.display().to_string(), api.display().to_string()]
    );
}

#[test]
fn verbose_prints_markdown_diagnostics() {
    let temp = setup_repo();

    cli(temp.path())
        .args(["--verbose", "src/services/orders.py"])
        .assert()
        .success()
        .stderr(predicate::str::contains("# Import trace report"))
        .stderr(predicate::str::contains("external"));
}

#[test]
fn missing_seed_fails_with_message() {
    let temp = setup_repo();

    cli(temp.path())
        .arg("src/nope.py")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid seed file"));
}

#[test]
fn invalid_root_fails() {
    let temp = setup_repo();

    cli(temp.path())
        .args(["--root", "does-not-exist", "src/services/orders.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project root"));
}

#[test]
fn zero_concurrency_is_rejected() {
    let temp = setup_repo();

    cli(temp.path())
        .args(["--concurrency", "0", "src/services/orders.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency must be > 0"));
}
