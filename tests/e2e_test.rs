/// End-to-end tests for the CLI
///
/// Every run uses the Pipfile.lock fixture or an unsupported directory, so
/// no external tool and no network service is involved.
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SIGNER: &str = "ci@example.com";

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn pipenv_project() -> String {
    fixtures_path()
        .join("pipenv-project")
        .to_string_lossy()
        .into_owned()
}

/// A command running inside `dir`, isolated from the caller's environment
fn vcn_bom(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("vcn-bom");
    cmd.current_dir(dir.path())
        .env_remove("VCN_SIGNER_ID")
        .env_remove("GOSUMDB");
    cmd
}

fn ledger_arg(dir: &TempDir) -> String {
    dir.path().join("ledger.json").to_string_lossy().into_owned()
}

// Exit code tests for CLI
mod exit_code_tests {
    use super::*;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("vcn-bom").arg("--help").assert().code(0);
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("vcn-bom")
            .arg("--version")
            .assert()
            .code(0)
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_argument() {
        cargo_bin_cmd!("vcn-bom")
            .args([".", "--invalid-option"])
            .assert()
            .code(2);
    }

    /// Exit code 2: Trust level outside 0-2
    #[test]
    fn test_exit_code_invalid_trust_level() {
        let dir = TempDir::new().unwrap();
        vcn_bom(&dir)
            .args([&pipenv_project(), "--signer-id", SIGNER, "--trust-level", "3"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid trust level"));
    }

    /// Exit code 2: Threshold outside 0-100
    #[test]
    fn test_exit_code_invalid_max_unsupported() {
        let dir = TempDir::new().unwrap();
        vcn_bom(&dir)
            .args([&pipenv_project(), "--signer-id", SIGNER, "--max-unsupported", "150"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("valid percentage value (0-100)"));
    }

    /// Exit code 2: Missing signer ID
    #[test]
    fn test_exit_code_missing_signer_id() {
        let dir = TempDir::new().unwrap();
        vcn_bom(&dir)
            .args([&pipenv_project(), "--ledger", &ledger_arg(&dir)])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("signer ID"));
    }

    /// Exit code 2: Non-existent artifact path
    #[test]
    fn test_exit_code_nonexistent_path() {
        let dir = TempDir::new().unwrap();
        vcn_bom(&dir)
            .args([
                "/nonexistent/path/that/does/not/exist",
                "--signer-id",
                SIGNER,
                "--ledger",
                &ledger_arg(&dir),
            ])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Path does not exist"));
    }

    /// Exit code 3: Unsupported artifact
    #[test]
    fn test_exit_code_unsupported_artifact() {
        let dir = TempDir::new().unwrap();
        let project = fixtures_path().join("unsupported-project");
        vcn_bom(&dir)
            .args([
                project.to_str().unwrap(),
                "--signer-id",
                SIGNER,
                "--ledger",
                &ledger_arg(&dir),
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Unsupported artifact format/language"));
        assert!(!dir.path().join(".bom").exists());
    }

    /// Exit code 1: Unsupported dependencies below the trusted level
    #[test]
    fn test_exit_code_policy_failure() {
        let dir = TempDir::new().unwrap();
        vcn_bom(&dir)
            .args([&pipenv_project(), "--signer-id", SIGNER, "--ledger", &ledger_arg(&dir)])
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "3 dependencies failed the Trusted trust level requirement",
            ))
            .stderr(predicate::str::contains("requests@2.31.0: Unsupported"))
            .stderr(predicate::str::contains("certifi@2023.7.22: Unsupported"))
            .stderr(predicate::str::contains("idna@3.4: Unsupported"));
        assert!(!dir.path().join(".bom").exists());
    }
}

#[test]
fn test_unsupported_level_writes_bom_file() {
    let dir = TempDir::new().unwrap();
    vcn_bom(&dir)
        .args([
            &pipenv_project(),
            "--signer-id",
            SIGNER,
            "--trust-level",
            "1",
            "--ledger",
            &ledger_arg(&dir),
        ])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Detected python artifact"));

    let content = fs::read_to_string(dir.path().join(".bom")).unwrap();
    assert_eq!(content.lines().count(), 3);
    assert!(content.contains(&format!("vcn..{}", "90".repeat(32))));
}

#[test]
fn test_auto_notarize_then_trusted() {
    let dir = TempDir::new().unwrap();
    let bom_file = dir.path().join("out.bom");

    vcn_bom(&dir)
        .args([
            &pipenv_project(),
            "--signer-id",
            SIGNER,
            "--nd",
            "--max-unsupported",
            "100",
            "--ledger",
            &ledger_arg(&dir),
            "--bom-file",
            bom_file.to_str().unwrap(),
        ])
        .assert()
        .code(0);

    let ledger = fs::read_to_string(dir.path().join("ledger.json")).unwrap();
    assert!(ledger.contains(&format!("vcn.{}.{}", SIGNER, "90".repeat(32))));

    // second run finds the notarized records and needs no threshold
    vcn_bom(&dir)
        .args([&pipenv_project(), "--signer-id", SIGNER, "--ledger", &ledger_arg(&dir)])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("3 trusted, 0 unsupported, 0 untrusted"));

    let content = fs::read_to_string(dir.path().join(".bom")).unwrap();
    assert!(content
        .lines()
        .all(|line| line.starts_with(&format!("vcn.{}.", SIGNER))));
}

#[test]
fn test_spdx_output_file() {
    let dir = TempDir::new().unwrap();
    let spdx = dir.path().join("bom.spdx");

    vcn_bom(&dir)
        .args([
            &pipenv_project(),
            "--signer-id",
            SIGNER,
            "--trust-level",
            "1",
            "--ledger",
            &ledger_arg(&dir),
            "--spdx",
            spdx.to_str().unwrap(),
        ])
        .assert()
        .code(0);

    let document = fs::read_to_string(&spdx).unwrap();
    assert!(document.starts_with("SPDXVersion: SPDX-2.2\n"));
    assert!(document.contains("DocumentName: pipenv-project\n"));
    assert!(document.contains("PackageName: requests\n"));
    assert!(document.contains(&format!("PackageChecksum: SHA256: {}\n", "90".repeat(32))));
}

#[test]
fn test_spdx_to_stdout() {
    let dir = TempDir::new().unwrap();

    vcn_bom(&dir)
        .args([
            &pipenv_project(),
            "--signer-id",
            SIGNER,
            "--trust-level",
            "1",
            "--ledger",
            &ledger_arg(&dir),
            "--spdx",
            "-",
        ])
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("SPDXVersion: SPDX-2.2"))
        .stdout(predicate::str::contains("PackageName: idna"));
}

#[test]
fn test_signer_id_from_environment() {
    let dir = TempDir::new().unwrap();
    vcn_bom(&dir)
        .env("VCN_SIGNER_ID", "env@example.com")
        .args([&pipenv_project(), "--trust-level", "1", "--ledger", &ledger_arg(&dir)])
        .assert()
        .code(0);
}
