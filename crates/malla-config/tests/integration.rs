//! Integration tests for malla-config.

use malla_config::DspConfig;

#[test]
fn full_toml_overrides_every_field() {
    let text = r#"
        tempo_bpm = 140
        global_volume = 0.75
        envelope_coefficient = 0.05
        envelope_exponent = 0.2
        reverb_on = true
        reverb_mix = 0.4
        reverb_size = 0.8
        reverb_cutoff_hz = 5000.0
    "#;

    let config = DspConfig::from_toml_str(text).unwrap();
    assert_eq!(config.tempo_bpm, 140);
    assert_eq!(config.global_volume, 0.75);
    assert!(config.reverb_on);
    assert_eq!(config.reverb_mix, 0.4);
    assert_eq!(config.reverb_size, 0.8);
    assert_eq!(config.reverb_cutoff_hz, 5000.0);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_toml_is_the_default_config() {
    let config = DspConfig::from_toml_str("").unwrap();
    assert_eq!(config, DspConfig::default());
}

#[test]
fn save_then_load_round_trips_via_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("malla.toml");

    let config = DspConfig {
        tempo_bpm: 96,
        reverb_on: true,
        ..DspConfig::default()
    };
    let text = toml::to_string_pretty(&config).unwrap();
    std::fs::write(&path, text).unwrap();

    let loaded = DspConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}
