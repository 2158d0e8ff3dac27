//! Test: Deploy Flow - configuration, build stage and release wired together

use crate::helpers::*;
use fsd::core::{Config, ConfigError};
use fsd::execution::{DeployError, Deployer, SkipParts};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn config_for(root: &Path) -> Config {
    let yaml = format!(
        r#"
postgresql_path: ""
application:
  - name: shop
    backend:
      path: {root}/api
      command: cargo
      args: ["build", "--release"]
      environment:
        - name: RUSTFLAGS
          value: "-C target-cpu=native"
    frontend:
      path: {root}/web
      command: npm
      args: ["run", "build"]
    deploy:
      path: {root}
      dist:
        source: build
        dest: dist
      app_source: bin/shop
  - name: blog
    frontend:
      path: {root}/blog
      command: hugo
"#,
        root = root.display()
    );
    Config::from_yaml(&yaml).unwrap()
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_build_output(dir.path());
    dir
}

#[tokio::test]
async fn test_full_deploy() {
    let dir = workspace();
    let config = config_for(dir.path());
    let runner = MockRunner::new()
        .succeed("cargo build", "Finished release")
        .delay("cargo build", Duration::from_millis(50))
        .succeed("npm run", "webpack compiled")
        .succeed("eb status", "Deployed Version: 3.0.9\n")
        .succeed("git describe", "v3.0.9\n");
    let log = EventLog::new();

    let mut deployer = Deployer::new(runner.clone(), ScriptedOperator::new(&["3.1.0", "spring sale"]));
    deployer.add_event_handler(log.handler());
    let report = deployer
        .deploy(&config, "shop", SkipParts::default())
        .await
        .unwrap();

    assert_eq!(report.version, "3.1.0");
    assert_eq!(report.platform_version, "3.0.9");
    assert_eq!(report.steps_completed, 5);
    assert_eq!(
        deployer.operator().asked,
        vec!["Version identifier", "Comment"]
    );

    // Builds first, release afterwards
    let calls = runner.calls();
    assert_eq!(&calls[..2], &["cargo build", "npm run"]);
    assert_eq!(
        &calls[2..],
        &[
            "eb status",
            "git describe",
            "git add",
            "git update-index",
            "git commit",
            "git tag",
            "eb deploy",
        ]
    );
    assert_eq!(
        runner.find("git update-index").unwrap().args,
        vec!["update-index", "--chmod=+x", "bin/shop"]
    );
    let backend = runner.find("cargo build").unwrap();
    assert_eq!(backend.work_dir, Some(dir.path().join("api")));
    assert_eq!(
        backend.env,
        vec![("RUSTFLAGS".to_string(), "-C target-cpu=native".to_string())]
    );

    let names = log.names();
    assert_eq!(names.first().map(String::as_str), Some("DeployStarted"));
    assert_eq!(names.last().map(String::as_str), Some("ReleaseCompleted"));
    assert!(dir.path().join("dist/index.html").is_file());
}

#[tokio::test]
async fn test_unknown_application() {
    let dir = workspace();
    let config = config_for(dir.path());
    let runner = MockRunner::new();

    let mut deployer = Deployer::new(runner.clone(), ScriptedOperator::new(&[]));
    let err = deployer
        .deploy(&config, "billing", SkipParts::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Config(ConfigError::UnknownApplication(ref name)) if name == "billing"
    ));
    assert!(runner.calls().is_empty());
}

/// Incomplete configuration is refused before anything runs
#[tokio::test]
async fn test_incomplete_application_spawns_nothing() {
    let dir = workspace();
    let config = config_for(dir.path());
    let runner = MockRunner::new();

    let mut deployer = Deployer::new(runner.clone(), ScriptedOperator::new(&["1.0", "x"]));
    let err = deployer
        .deploy(&config, "blog", SkipParts::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeployError::Config(ConfigError::Incomplete { ref field, .. }) if field == "backend.path"
    ));
    assert!(runner.calls().is_empty());
    assert!(!dir.path().join("dist").exists());
}

/// Skipped parts are neither checked nor built
#[tokio::test]
async fn test_skipping_backend_and_frontend() {
    let dir = workspace();
    let config = config_for(dir.path());
    let runner = MockRunner::new();

    let mut deployer = Deployer::new(runner.clone(), ScriptedOperator::new(&["1.0.1", "hotfix"]));
    deployer
        .deploy(
            &config,
            "shop",
            SkipParts {
                backend: true,
                frontend: true,
            },
        )
        .await
        .unwrap();

    assert!(runner.find("cargo build").is_none());
    assert!(runner.find("npm run").is_none());
    assert_eq!(release_calls(&runner).len(), 5);
}

/// A failed build never reaches the release pipeline
#[tokio::test]
async fn test_build_failure_skips_release() {
    let dir = workspace();
    let config = config_for(dir.path());
    let runner = MockRunner::new()
        .succeed("cargo build", "")
        .fail("npm run", "npm ERR! missing script: build");

    let mut deployer = Deployer::new(runner.clone(), ScriptedOperator::new(&["1.0", "x"]));
    let err = deployer
        .deploy(&config, "shop", SkipParts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Build(_)));
    assert_eq!(err.to_string(), "frontend build failed: npm exited with code 1: npm ERR! missing script: build");
    assert_eq!(runner.calls().len(), 2);
    assert!(!dir.path().join("dist").exists());
    assert!(deployer.operator().asked.is_empty());
}

#[tokio::test]
async fn test_release_failure_surfaces_step() {
    let dir = workspace();
    let config = config_for(dir.path());
    let runner = MockRunner::new().fail("git tag", "fatal: tag '3.1.0' already exists");

    let mut deployer = Deployer::new(runner.clone(), ScriptedOperator::new(&["3.1.0", "again"]));
    let err = deployer
        .deploy(&config, "shop", SkipParts::default())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("release step 4 (git tag) failed"));
    assert_eq!(release_calls(&runner), vec!["git add", "git update-index", "git commit", "git tag"]);
}

#[test]
fn test_duplicate_application_names_rejected() {
    let yaml = r#"
application:
  - name: shop
  - name: shop
"#;
    assert!(matches!(
        Config::from_yaml(yaml),
        Err(ConfigError::DuplicateApplication(ref name)) if name == "shop"
    ));
}
