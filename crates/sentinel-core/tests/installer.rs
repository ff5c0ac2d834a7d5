mod support;

use sentinel_core::error::SentinelError;
use sentinel_core::install::{InstallConfig, Installer};
use sentinel_core::phase::Phase;
use sentinel_core::policy::{MARKER_END, MARKER_START};
use sentinel_core::template::LayeredTemplates;
use tempfile::TempDir;

use support::{Call, FakeAdapter, Listing, git_repo, snapshot};

fn p(n: u8) -> Phase {
    Phase::new(n).unwrap()
}

fn installer(fake: &FakeAdapter) -> Installer {
    Installer::new(Box::new(fake.clone()))
}

#[tokio::test]
async fn cumulative_install_covers_every_phase_up_to_target() {
    let repo = git_repo();
    let fake = FakeAdapter::new();
    let config = InstallConfig::new(repo.path()).with_phase(p(2));

    let result = installer(&fake).install(&config).await.unwrap();

    assert_eq!(result.phases, vec![p(1), p(2)]);
    assert_eq!(
        result.workflows,
        vec!["sentinel-triage.yml", "sentinel-fix.yml", "sentinel-review.yml"]
    );
    for file in &result.workflows {
        assert!(repo.path().join(".github/workflows").join(file).is_file(), "{file}");
    }
    assert_eq!(
        result.labels,
        vec![
            "sentinel",
            "sentinel:triage",
            "needs-info",
            "sentinel:fix",
            "sentinel:needs-review"
        ]
    );
    assert!(result.claude_md_patched);
}

#[tokio::test]
async fn shared_label_is_created_once() {
    let repo = git_repo();
    let fake = FakeAdapter::new();
    let config = InstallConfig::new(repo.path()).with_phase(p(4));

    installer(&fake).install(&config).await.unwrap();

    let sentinel_calls = fake
        .label_calls()
        .into_iter()
        .filter(|name| name == "sentinel")
        .count();
    assert_eq!(sentinel_calls, 1);
}

#[tokio::test]
async fn explicit_phases_install_only_the_listed_phases() {
    let repo = git_repo();
    let fake = FakeAdapter::new();
    let config = InstallConfig::new(repo.path())
        .with_phase(p(4))
        .with_phases([p(2)]);

    let result = installer(&fake).install(&config).await.unwrap();

    assert_eq!(result.phases, vec![p(2)]);
    assert_eq!(result.workflows, vec!["sentinel-fix.yml", "sentinel-review.yml"]);
    assert!(
        !repo
            .path()
            .join(".github/workflows/sentinel-triage.yml")
            .exists()
    );
    assert!(!result.labels.contains(&"sentinel:triage".to_string()));
    assert_eq!(result.missing.secrets, vec!["ANTHROPIC_API_KEY"]);
    assert_eq!(result.missing.variables, vec!["SENTINEL_MODEL"]);
}

#[tokio::test]
async fn unknown_explicit_phase_is_rejected() {
    let repo = git_repo();
    let fake = FakeAdapter::new();
    let config = InstallConfig::new(repo.path()).with_phases([p(1), p(9)]);

    let err = installer(&fake).install(&config).await.unwrap_err();

    assert!(matches!(err, SentinelError::UnknownPhase { phase } if phase == p(9)));
    assert!(snapshot(repo.path()).is_empty());
}

#[tokio::test]
async fn dry_run_changes_nothing() {
    let repo = git_repo();
    std::fs::write(repo.path().join("CLAUDE.md"), "# Project notes\n").unwrap();
    let before = snapshot(repo.path());

    let fake = FakeAdapter::new();
    let config = InstallConfig::new(repo.path())
        .with_phase(p(4))
        .with_dry_run(true);
    let result = installer(&fake).install(&config).await.unwrap();

    assert_eq!(snapshot(repo.path()), before);
    assert!(fake.label_calls().is_empty());
    assert!(
        fake.calls()
            .iter()
            .all(|call| matches!(call, Call::ListSecrets | Call::ListVariables))
    );

    assert!(result.dry_run);
    assert_eq!(result.workflows.len(), 5);
    assert!(result.labels.contains(&"sentinel:deploy-blocked".to_string()));
    assert!(result.claude_md_patched);
}

#[tokio::test]
async fn validation_failure_reports_every_problem_and_mutates_nothing() {
    let dir = TempDir::new().unwrap();
    let fake = FakeAdapter::new().without_cli();
    let config = InstallConfig::new(dir.path()).with_phase(p(2));

    let err = installer(&fake).install(&config).await.unwrap_err();

    match err {
        SentinelError::EnvironmentValidation { problems } => {
            assert_eq!(problems.len(), 2);
            assert!(problems[0].contains("git repository"));
            assert!(problems[1].contains("install the fake CLI"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(fake.calls().is_empty());
    assert!(snapshot(dir.path()).is_empty());
}

#[tokio::test]
async fn rerun_leaves_policy_document_unchanged() {
    let repo = git_repo();
    std::fs::write(repo.path().join("CLAUDE.md"), "# Team rules\n\nBe kind.\n").unwrap();
    let fake = FakeAdapter::new();
    let config = InstallConfig::new(repo.path()).with_phase(p(3));

    let first = installer(&fake).install(&config).await.unwrap();
    let after_first = std::fs::read_to_string(repo.path().join("CLAUDE.md")).unwrap();
    let second = installer(&fake).install(&config).await.unwrap();
    let after_second = std::fs::read_to_string(repo.path().join("CLAUDE.md")).unwrap();

    assert!(first.claude_md_patched);
    assert!(!second.claude_md_patched);
    assert_eq!(after_first, after_second);
    assert!(after_second.starts_with("# Team rules\n\nBe kind.\n\n"));
    assert_eq!(after_second.matches(MARKER_START).count(), 1);
    assert_eq!(after_second.matches(MARKER_END).count(), 1);
}

#[tokio::test]
async fn label_failure_is_reported_without_aborting() {
    let repo = git_repo();
    let fake = FakeAdapter::new().failing_label("sentinel:fix");
    let config = InstallConfig::new(repo.path()).with_phase(p(2));

    let result = installer(&fake).install(&config).await.unwrap();

    assert_eq!(result.labels.len(), 5);
    assert_eq!(result.label_failures.len(), 1);
    assert_eq!(result.label_failures[0].0, "sentinel:fix");
    assert!(fake.label_calls().contains(&"sentinel:needs-review".to_string()));
    assert!(result.claude_md_patched);
}

#[tokio::test]
async fn secrets_auth_failure_marks_install_partial() {
    let repo = git_repo();
    let fake = FakeAdapter::new().with_secrets(Listing::AuthFailure);
    let config = InstallConfig::new(repo.path()).with_phase(p(3));

    let result = installer(&fake).install(&config).await.unwrap();

    assert!(!result.secrets_ok);
    assert_eq!(
        result.missing.secrets,
        vec!["ANTHROPIC_API_KEY", "SENTINEL_APP_PRIVATE_KEY"]
    );
    assert_eq!(
        result.missing.variables,
        vec!["SENTINEL_MODEL", "SENTINEL_APP_ID"]
    );
    assert_eq!(result.workflows.len(), 4);
}

#[tokio::test]
async fn configured_secrets_make_install_complete() {
    let repo = git_repo();
    let fake = FakeAdapter::new()
        .with_secrets(Listing::names(&["ANTHROPIC_API_KEY"]))
        .with_variables(Listing::names(&["SENTINEL_MODEL", "UNRELATED"]));
    let config = InstallConfig::new(repo.path()).with_phase(p(2));

    let result = installer(&fake).install(&config).await.unwrap();

    assert!(result.secrets_ok);
    assert!(result.missing.secrets.is_empty());
    assert!(result.missing.variables.is_empty());
}

#[tokio::test]
async fn rendered_workflows_keep_platform_expressions() {
    let repo = git_repo();
    let fake = FakeAdapter::new();
    let config = InstallConfig::new(repo.path())
        .with_allowed_paths(["src/"])
        .with_variable("NODE_VERSION", "22");

    installer(&fake).install(&config).await.unwrap();

    let triage =
        std::fs::read_to_string(repo.path().join(".github/workflows/sentinel-triage.yml")).unwrap();
    assert!(triage.contains("${{ secrets.ANTHROPIC_API_KEY }}"));
    assert!(triage.contains("node-version: \"22\""));
    assert!(triage.contains("(phase 1)"));
    assert!(!triage.contains("__PHASES__"));

    let policy = std::fs::read_to_string(repo.path().join("CLAUDE.md")).unwrap();
    assert!(policy.contains("- `src/`"));
    assert!(policy.contains("`.github/workflows`"));
}

#[tokio::test]
async fn post_install_instructions_follow_installed_files() {
    let repo = git_repo();
    let fake = FakeAdapter::new();

    let result = installer(&fake)
        .install(&InstallConfig::new(repo.path()).with_phase(p(3)))
        .await
        .unwrap();
    assert!(result.post_install.is_none());

    let result = installer(&fake)
        .install(&InstallConfig::new(repo.path()).with_phases([p(4)]))
        .await
        .unwrap();
    assert_eq!(
        result.post_install.as_deref(),
        Some("protect the deploy environment")
    );
}

#[tokio::test]
async fn template_override_directory_is_used() {
    let repo = git_repo();
    let overrides = TempDir::new().unwrap();
    std::fs::create_dir_all(overrides.path().join("policy")).unwrap();
    std::fs::write(
        overrides.path().join("policy/sentinel-rules.md"),
        "Custom rules for __PLATFORM__.\n",
    )
    .unwrap();

    let fake = FakeAdapter::new();
    let installer = Installer::new(Box::new(fake.clone()))
        .with_templates(Box::new(LayeredTemplates::new(overrides.path())));
    installer
        .install(&InstallConfig::new(repo.path()))
        .await
        .unwrap();

    let policy = std::fs::read_to_string(repo.path().join("CLAUDE.md")).unwrap();
    assert_eq!(
        policy,
        format!("{MARKER_START}\nCustom rules for GitHub.\n{MARKER_END}")
    );
}
