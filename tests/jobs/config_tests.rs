use content_core::config::ConfigManager;
use content_core::ContentOrchestrator;
use std::io::Write;

#[test]
fn test_toml_file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[catalog]
default_workflow = "quick"

[jobs]
default_list_limit = 5
max_list_limit = 20

[feedback]
high_priority_ratio = 0.75
"#
    )
    .unwrap();

    let manager = ConfigManager::load_with_env(Some(file.path()), "test").unwrap();
    let config = manager.config();

    assert_eq!(config.catalog.default_workflow, "quick");
    assert!(config.catalog.include_builtin);
    assert_eq!(config.jobs.default_list_limit, 5);
    assert_eq!(config.feedback.high_priority_ratio, 0.75);
    assert_eq!(manager.environment(), "test");
    assert_eq!(manager.source(), Some(file.path()));

    let orchestrator = ContentOrchestrator::builder()
        .with_config(config.clone())
        .build()
        .unwrap();
    assert_eq!(orchestrator.default_workflow(), "quick");
}

#[test]
fn test_unknown_default_workflow_is_rejected_at_build() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[catalog]\ndefault_workflow = \"does-not-exist\"").unwrap();

    // The file itself is well-formed; the catalog check happens when wiring
    let manager = ConfigManager::load_with_env(Some(file.path()), "test").unwrap();
    let built = ContentOrchestrator::builder()
        .with_config(manager.config().clone())
        .build();

    assert!(built.is_err());
}

#[test]
fn test_invalid_limits_fail_to_load() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[jobs]\ndefault_list_limit = 100\nmax_list_limit = 10").unwrap();

    assert!(ConfigManager::load_with_env(Some(file.path()), "test").is_err());
}
