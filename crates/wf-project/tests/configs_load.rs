use std::path::PathBuf;

use wf_core::ArgKey;
use wf_models::{BlockageDeficitModel, DeficitModel, TurbulenceModel};
use wf_project::build_models;

#[test]
fn configs_load_and_build() {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root");

    let configs = [
        "configs/01_noj_linear.yaml",
        "configs/02_gaussian_weighted.yaml",
        "configs/03_blockage_ground.yaml",
    ];

    for rel in configs {
        let path = root.join(rel);
        let config = wf_project::load_yaml(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e));
        let models = build_models(&config)
            .unwrap_or_else(|e| panic!("Failed to build {}: {}", path.display(), e));
        assert!(
            models.required_args().contains(ArgKey::DwIjlk),
            "{} does not read downwind distance",
            path.display()
        );
    }
}

#[test]
fn blockage_config_attaches_all_models() {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let path = crate_dir.join("../../configs/03_blockage_ground.yaml");
    let models = build_models(&wf_project::load_yaml(&path).unwrap()).unwrap();

    assert_eq!(models.superposition().name(), "SquaredSum");
    let blockage = models.blockage_deficit.as_ref().unwrap();
    assert!(blockage.base().container().attachment().is_attached());
    assert_eq!(
        blockage.blockage_superposition().unwrap().name(),
        "LinearSum"
    );
    let turbulence = models.turbulence.as_ref().unwrap();
    assert!(turbulence.container().rotor_avg().is_none());
    assert_eq!(turbulence.superposition().name(), "MaxSum");
}
