use wf_models::ModelConfig;
use wf_project::schema::*;
use wf_project::{ProjectError, load_json, load_yaml, save_json, save_yaml, validate_config};

fn full_config() -> WakeConfig {
    let mut config = WakeConfig::new(
        "Full farm",
        ModelConfig::new("BastankhahGaussianDeficit")
            .with("k", 0.04)
            .with_model(
                "rotor_avg_model",
                Some(ModelConfig::new("GridRotorAvg").with("n", 3u64)),
            ),
    );
    config.superposition_model = Some(ModelSpec::instance("WeightedSum"));
    config.blockage_deficit_model = Some(
        ModelConfig::new("SelfSimilarityDeficit")
            .with("upstream_only", true)
            .into(),
    );
    config.turbulence_model = Some(ModelSpec::instance("CrespoHernandez"));
    config.deflection_model = Some(ModelConfig::new("JimenezWakeDeflection").with("beta", 0.12).into());
    config
}

#[test]
fn roundtrip_yaml_minimal_config() {
    let config = WakeConfig::new("Minimal", ModelSpec::instance("NOJDeficit"));
    validate_config(&config).unwrap();

    let path = std::env::temp_dir().join("wf_project_roundtrip_minimal.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn roundtrip_yaml_full_config() {
    let config = full_config();

    let path = std::env::temp_dir().join("wf_project_roundtrip_full.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn roundtrip_json_full_config() {
    let config = full_config();

    let path = std::env::temp_dir().join("wf_project_roundtrip_full.json");
    save_json(&path, &config).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn invalid_config_is_not_saved() {
    let config = WakeConfig::new("Bare", ModelSpec::TypeRef("NOJDeficit".into()));
    let path = std::env::temp_dir().join("wf_project_roundtrip_rejected.yaml");
    let _ = std::fs::remove_file(&path);

    let err = save_yaml(&path, &config).unwrap_err();
    assert!(matches!(err, ProjectError::NotAnInstance { .. }));
    assert!(!path.exists());
}

#[test]
fn bare_model_name_is_rejected_on_load() {
    let text = "name: Bare\nwake_deficit_model: NOJDeficit\n";
    let path = std::env::temp_dir().join("wf_project_roundtrip_bare.yaml");
    std::fs::write(&path, text).unwrap();

    let err = load_yaml(&path).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Argument, wake_deficit_model, must be a WakeDeficitModel instance. \
         Did you forget the brackets: NOJDeficit()"
    );
}

#[test]
fn yaml_text_parses_nested_models() {
    let text = r#"
name: Parsed
wake_deficit_model:
  model: NOJDeficit
  params:
    k: 0.05
    ground_model:
      model: Mirror
turbulence_model:
  model: CrespoHernandez
  params:
    rotor_avg_model: null
"#;
    let config: WakeConfig = serde_yaml::from_str(text).unwrap();
    validate_config(&config).unwrap();

    match &config.wake_deficit_model {
        ModelSpec::Instance(cfg) => {
            assert_eq!(cfg.params["k"], 0.05);
            assert_eq!(cfg.params["ground_model"]["model"], "Mirror");
        }
        ModelSpec::TypeRef(name) => panic!("expected an instance, got {name}"),
    }
    assert!(config.superposition_model.is_none());
    assert!(config.deflection_model.is_none());
}

#[test]
fn model_in_wrong_slot_is_rejected() {
    let mut config = WakeConfig::new("Swapped", ModelSpec::instance("NOJDeficit"));
    config.turbulence_model = Some(ModelSpec::instance("JimenezWakeDeflection"));

    let err = validate_config(&config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Argument, turbulence_model, must be a TurbulenceModel instance, \
         but is a JimenezWakeDeflection instance"
    );
}
