use mission_control::config::{ControlConfig, EngineConfig, EventBusConfig, StageSpec};
use mission_control::error::ControlError;

#[test]
fn test_defaults() {
    let config = ControlConfig::default();
    assert_eq!(config.engine.max_healing_attempts, 2);
    assert_eq!(config.engine.start_progress, 5);
    assert_eq!(config.events.queue_capacity, 1000);

    let checkpoints: Vec<(&str, u8)> = config
        .engine
        .stages
        .iter()
        .map(|s| (s.id.as_str(), s.progress))
        .collect();
    assert_eq!(
        checkpoints,
        vec![
            ("generate", 25),
            ("apply", 50),
            ("verify", 75),
            ("finalize", 100)
        ]
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_stage_sequence_rejected() {
    let config = EngineConfig {
        stages: Vec::new(),
        ..EngineConfig::default()
    };
    assert!(matches!(config.validate(), Err(ControlError::Config(_))));
}

#[test]
fn test_regressing_checkpoints_rejected() {
    let config = EngineConfig {
        stages: vec![StageSpec::new("a", 50), StageSpec::new("b", 25)],
        ..EngineConfig::default()
    };
    assert!(matches!(config.validate(), Err(ControlError::Config(_))));
}

#[test]
fn test_checkpoint_over_100_rejected() {
    let config = EngineConfig {
        stages: vec![StageSpec::new("a", 120)],
        ..EngineConfig::default()
    };
    assert!(matches!(config.validate(), Err(ControlError::Config(_))));
}

#[test]
fn test_zero_capacity_rejected() {
    let config = EventBusConfig { queue_capacity: 0 };
    assert!(matches!(config.validate(), Err(ControlError::Config(_))));
}

#[tokio::test]
async fn test_toml_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = ControlConfig::default();
    config.engine.max_healing_attempts = 3;
    config.events.queue_capacity = 64;
    config.save(&path).await.unwrap();

    let loaded = ControlConfig::load(&path).await.unwrap();
    assert_eq!(loaded.engine.max_healing_attempts, 3);
    assert_eq!(loaded.events.queue_capacity, 64);
    assert_eq!(loaded.engine.stages, config.engine.stages);
}

#[tokio::test]
async fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = ControlConfig::load(&dir.path().join("absent.toml"))
        .await
        .unwrap();
    assert_eq!(loaded.engine.max_healing_attempts, 2);
}
