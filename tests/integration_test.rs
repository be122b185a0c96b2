/// Integration tests for the application layer
mod test_utilities;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use test_utilities::mocks::*;
use vcn_bom::ports::outbound::LedgerStatus;
use vcn_bom::prelude::*;

const SIGNER: &str = "ci@example.com";
const GO_LIST: &str =
    "go list --deps -f {{if not .Standard}}{{.Module.Path}} {{.Module.Version}}{{end}} ./...";

struct Harness {
    runner: Arc<MockCommandRunner>,
    reporter: MockProgressReporter,
    context: EcosystemContext,
}

impl Harness {
    fn new(runner: MockCommandRunner, sumdb: MockHashSource, pypi: MockHashSource) -> Self {
        let runner = Arc::new(runner);
        let reporter = MockProgressReporter::new();
        let context = EcosystemContext::new(
            Arc::clone(&runner) as Arc<dyn CommandRunner>,
            Arc::new(sumdb),
            Arc::new(pypi),
            Arc::new(MockHashSource::new()),
        )
        .with_workers(3);

        Self {
            runner,
            reporter,
            context,
        }
    }

    fn use_case<L: Ledger>(&self, ledger: L) -> GenerateBomUseCase<L> {
        GenerateBomUseCase::new(
            ledger,
            self.context.clone(),
            Arc::new(self.reporter.clone()),
        )
    }
}

fn request(path: &Path, bom_file: PathBuf, trust_level: TrustLevel, auto_notarize: bool, max_unsupported: u32) -> BomRequest {
    BomRequest::new(
        path.to_path_buf(),
        TrustPolicyOptions {
            signer_id: SIGNER.to_string(),
            trust_level: trust_level.as_i64(),
            auto_notarize,
            max_unsupported: UnsupportedThreshold::new(max_unsupported),
        },
        bom_file,
    )
}

fn policy_failure(err: &anyhow::Error) -> &vcn_bom::shared::error::PolicyFailure {
    match err.downcast_ref::<BomError>() {
        Some(BomError::TrustPolicyViolation(failure)) => failure,
        other => panic!("expected policy violation, got {:?}", other),
    }
}

/// A Go module whose `go list` output names the main module and two dependencies
fn go_module() -> (TempDir, PathBuf, Harness) {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("app");
    fs::create_dir(&project).unwrap();
    fs::write(project.join("go.mod"), "module example.com/app\n\ngo 1.21\n").unwrap();

    let runner = MockCommandRunner::new().with_output(
        GO_LIST,
        "example.com/app \nrsc.io/quote v1.5.2\nrsc.io/sampler v1.3.0\nrsc.io/quote v1.5.2\n",
    );
    let sumdb = MockHashSource::new()
        .with_hash("rsc.io/quote", "v1.5.2", 0xaa)
        .with_hash("rsc.io/sampler", "v1.3.0", 0xbb);

    (temp_dir, project, Harness::new(runner, sumdb, MockHashSource::new()))
}

#[tokio::test]
async fn test_go_module_happy_path() {
    let (temp_dir, project, harness) = go_module();
    let ledger = MockLedger::new().with_record(&MockHashSource::hex(0xaa), LedgerStatus::Trusted);
    let bom_file = temp_dir.path().join(".bom");

    let response = harness
        .use_case(ledger)
        .execute(request(&project, bom_file.clone(), TrustLevel::Unsupported, false, 0))
        .await
        .unwrap();

    assert_eq!(response.kind, ArtifactKind::Go);
    assert_eq!(response.dependencies.len(), 2);
    assert_eq!(response.count(TrustLevel::Trusted), 1);
    assert_eq!(response.count(TrustLevel::Unsupported), 1);

    let content = fs::read_to_string(&bom_file).unwrap();
    let mut lines: Vec<&str> = content.lines().collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            format!("vcn.{}.{}", SIGNER, MockHashSource::hex(0xaa)),
            format!("vcn..{}", MockHashSource::hex(0xbb)),
        ]
    );
    assert_eq!(harness.runner.call_count(GO_LIST), 1);
}

#[tokio::test]
async fn test_policy_failure_enumerates_every_offender() {
    let (temp_dir, project, harness) = go_module();
    let ledger = MockLedger::new().with_revoked(&MockHashSource::hex(0xaa));
    let bom_file = temp_dir.path().join(".bom");

    let err = harness
        .use_case(ledger)
        .execute(request(&project, bom_file.clone(), TrustLevel::Trusted, false, 100))
        .await
        .unwrap_err();

    let failure = policy_failure(&err);
    let mut offenders: Vec<(String, TrustLevel)> = failure
        .offenders
        .iter()
        .map(|o| (o.name.clone(), o.level))
        .collect();
    offenders.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        offenders,
        vec![
            ("rsc.io/quote".to_string(), TrustLevel::Untrusted),
            ("rsc.io/sampler".to_string(), TrustLevel::Unsupported),
        ]
    );
    assert_eq!(ExitCode::for_error(&err), ExitCode::PolicyFailure);
    assert!(!bom_file.exists());
}

#[tokio::test]
async fn test_ledger_compromised_aborts_pass() {
    let (temp_dir, project, harness) = go_module();
    let ledger = MockLedger::new().with_unverified(&MockHashSource::hex(0xbb));

    let err = harness
        .use_case(ledger)
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Untrusted, true, 100))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BomError>(),
        Some(BomError::LedgerCompromised { dependency }) if dependency == "rsc.io/sampler"
    ));
    assert!(!temp_dir.path().join(".bom").exists());
}

#[tokio::test]
async fn test_unsupported_threshold_unlimited_never_fails() {
    let (temp_dir, project, harness) = go_module();

    let response = harness
        .use_case(MockLedger::new())
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Trusted, false, 100))
        .await
        .unwrap();

    assert_eq!(response.count(TrustLevel::Unsupported), 2);
}

fn pipfile_lock_project() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("svc");
    fs::create_dir(&project).unwrap();
    fs::write(
        project.join("Pipfile.lock"),
        format!(
            r#"{{
    "_meta": {{"hash": {{"sha256": "0000"}}}},
    "default": {{
        "requests": {{
            "hashes": ["sha256:{a}", "sha256:{b}"],
            "version": "==2.31.0"
        }},
        "idna": {{
            "hashes": ["sha256:{c}"],
            "version": "==3.4"
        }}
    }},
    "develop": {{}}
}}"#,
            a = "0f".repeat(32),
            b = "f0".repeat(32),
            c = "12".repeat(32)
        ),
    )
    .unwrap();
    (temp_dir, project)
}

#[tokio::test]
async fn test_auto_notarize_writes_ledger_records() {
    let (temp_dir, project) = pipfile_lock_project();
    let harness = Harness::new(MockCommandRunner::new(), MockHashSource::new(), MockHashSource::new());
    let use_case = harness.use_case(MockLedger::new());

    let response = use_case
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Trusted, true, 100))
        .await
        .unwrap();

    assert_eq!(response.kind, ArtifactKind::Python);
    assert_eq!(response.count(TrustLevel::Trusted), 2);
    assert!(response
        .dependencies
        .iter()
        .all(|dep| dep.signer_id() == Some(SIGNER)));

    let signed = use_case.ledger().signed();
    assert_eq!(signed.len(), 2);
    let (requests, signer) = signed
        .iter()
        .find(|(artifact, _)| artifact.name == "requests")
        .unwrap();
    assert_eq!(signer, SIGNER);
    assert_eq!(requests.kind, "python");
    assert_eq!(requests.hash, "ff".repeat(32));
    assert_eq!(requests.size, 0);
    assert_eq!(requests.content_type, "text/plain; charset=utf-8");
    assert_eq!(requests.metadata.get("version").map(String::as_str), Some("2.31.0"));
    assert_eq!(requests.metadata.get("hashType").map(String::as_str), Some("SHA256"));

    // no external tool is needed for a Pipfile.lock
    assert!(harness.runner.calls().is_empty());
}

#[tokio::test]
async fn test_notarization_failure_aborts() {
    let (temp_dir, project) = pipfile_lock_project();
    let harness = Harness::new(MockCommandRunner::new(), MockHashSource::new(), MockHashSource::new());

    let err = harness
        .use_case(MockLedger::new().with_sign_failure())
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Trusted, true, 100))
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("Notarization of"));
    assert!(!temp_dir.path().join(".bom").exists());
}

#[tokio::test]
async fn test_revoked_dependency_is_not_notarized() {
    let (temp_dir, project) = pipfile_lock_project();
    let harness = Harness::new(MockCommandRunner::new(), MockHashSource::new(), MockHashSource::new());
    let ledger = MockLedger::new().with_revoked(&"12".repeat(32));
    let use_case = harness.use_case(ledger);

    let response = use_case
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Untrusted, true, 100))
        .await
        .unwrap();

    assert_eq!(response.count(TrustLevel::Untrusted), 1);
    assert_eq!(response.count(TrustLevel::Trusted), 1);
    let signed = use_case.ledger().signed();
    assert_eq!(signed.len(), 1);
    assert_eq!(signed[0].0.name, "requests");
}

const PIP_LIST: &str = "\
Package  Version Location                 Installer
-------- ------- ------------------------ ---------
idna     3.4     /venv/lib/site-packages  pip
requests 2.31.0  /venv/lib/site-packages  pip
";

fn requirements_project() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("tool");
    fs::create_dir(&project).unwrap();
    fs::write(project.join("requirements.txt"), "requests>=2.0\n").unwrap();
    (temp_dir, project)
}

#[tokio::test]
async fn test_requirements_resolved_through_pip_and_index() {
    let (temp_dir, project) = requirements_project();
    let runner = MockCommandRunner::new()
        .with_failure("python -m pip list -v", "python: command not found")
        .with_output("python3 -m pip list -v", PIP_LIST)
        .with_output("python3 -m pip show requests", "Name: requests\nRequires: idna\n")
        .with_output("python3 -m pip show idna", "Name: idna\nRequires:\n");
    let pypi = MockHashSource::new()
        .with_hash("requests", "2.31.0", 0x01)
        .with_hash("idna", "3.4", 0x02);
    let harness = Harness::new(runner, MockHashSource::new(), pypi);

    let response = harness
        .use_case(MockLedger::new())
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Unsupported, false, 0))
        .await
        .unwrap();

    let mut names: Vec<&str> = response.dependencies.iter().map(|dep| dep.name()).collect();
    names.sort();
    assert_eq!(names, vec!["idna", "requests"]);
}

#[tokio::test]
async fn test_index_failure_fails_whole_resolution() {
    let (temp_dir, project) = requirements_project();
    let runner = MockCommandRunner::new()
        .with_output("python -m pip list -v", PIP_LIST)
        .with_output("python -m pip show requests", "Name: requests\nRequires: idna\n")
        .with_output("python -m pip show idna", "Name: idna\nRequires:\n");
    let pypi = MockHashSource::new()
        .with_hash("requests", "2.31.0", 0x01)
        .with_failure("idna", "3.4", "index unreachable");
    let harness = Harness::new(runner, MockHashSource::new(), pypi);

    let err = harness
        .use_case(MockLedger::new())
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Unsupported, false, 0))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BomError>(),
        Some(BomError::HashLookup { dependency, .. }) if dependency == "idna@3.4"
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::ApplicationError);
    assert!(!temp_dir.path().join(".bom").exists());
}

#[tokio::test]
async fn test_dependencies_are_cached() {
    let (_temp_dir, project, harness) = go_module();
    let artifact = ArtifactFactory::detect(&project, &harness.context)
        .unwrap()
        .unwrap();

    let first = artifact.dependencies().await.unwrap().to_vec();
    let second = artifact.dependencies().await.unwrap().to_vec();

    assert_eq!(first, second);
    assert_eq!(harness.runner.call_count(GO_LIST), 1);
}

#[tokio::test]
async fn test_node_packages_digested_deterministically() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("web");
    let package_dir = project.join("node_modules").join("left-pad");
    fs::create_dir_all(package_dir.join("lib")).unwrap();
    fs::write(project.join("package-lock.json"), "{}").unwrap();
    fs::write(package_dir.join("package.json"), r#"{"name":"left-pad"}"#).unwrap();
    fs::write(package_dir.join("lib").join("index.js"), "module.exports = pad;\n").unwrap();

    let listing = serde_json::json!({
        "name": "web",
        "version": "1.0.0",
        "dependencies": {
            "left-pad": {
                "version": "1.3.0",
                "path": package_dir.to_string_lossy(),
            },
            "ghost": {
                "missing": true
            }
        }
    })
    .to_string();
    let npm = "npm ls -a -l -p --json";

    let mut hashes = Vec::new();
    for _ in 0..2 {
        let harness = Harness::new(
            MockCommandRunner::new().with_output(npm, &listing),
            MockHashSource::new(),
            MockHashSource::new(),
        );
        let artifact = ArtifactFactory::detect(&project, &harness.context)
            .unwrap()
            .unwrap();
        assert_eq!(artifact.kind(), ArtifactKind::Node);

        let dependencies = artifact.dependencies().await.unwrap();
        assert_eq!(dependencies.len(), 1);
        assert_eq!(dependencies[0].name(), "left-pad");
        assert_eq!(dependencies[0].hash_type(), HashType::Sha256);
        hashes.push(dependencies[0].hash().to_string());
    }

    assert_eq!(hashes[0].len(), 64);
    assert_eq!(hashes[0], hashes[1]);
}

#[tokio::test]
async fn test_dotnet_lock_file_needs_no_restore() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("api");
    fs::create_dir(&project).unwrap();
    fs::write(project.join("Api.csproj"), "<Project Sdk=\"Microsoft.NET.Sdk\" />").unwrap();
    fs::write(
        project.join("packages.lock.json"),
        format!(
            r#"{{
  "version": 1,
  "dependencies": {{
    "net8.0": {{
      "Newtonsoft.Json": {{
        "type": "Direct",
        "requested": "[13.0.3, )",
        "resolved": "13.0.3",
        "contentHash": "{}"
      }}
    }}
  }}
}}"#,
            STANDARD.encode([0x5au8; 64])
        ),
    )
    .unwrap();
    let harness = Harness::new(MockCommandRunner::new(), MockHashSource::new(), MockHashSource::new());

    let response = harness
        .use_case(MockLedger::new())
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Unsupported, false, 0))
        .await
        .unwrap();

    assert_eq!(response.kind, ArtifactKind::DotNet);
    assert_eq!(response.dependencies.len(), 1);
    let dependency = response.dependencies[0].dependency();
    assert_eq!(dependency.name(), "Newtonsoft.Json");
    assert_eq!(dependency.version(), "13.0.3");
    assert_eq!(dependency.hash_type(), HashType::Sha512);
    assert_eq!(dependency.hash(), "5a".repeat(64));
    assert!(harness.runner.calls().is_empty());
}

#[tokio::test]
async fn test_progress_reported_to_user() {
    let (temp_dir, project, harness) = go_module();

    harness
        .use_case(MockLedger::new())
        .execute(request(&project, temp_dir.path().join(".bom"), TrustLevel::Unsupported, false, 0))
        .await
        .unwrap();

    assert!(harness.reporter.contains("Detected go artifact"));
    assert!(harness.reporter.contains("Found 2 dependencies"));
    assert!(harness.reporter.contains("Completed: Success"));
}
