//! The shipped configuration file must parse and match the built-in defaults

use society::core::config::SocietyConfig;
use std::path::Path;

#[test]
fn test_shipped_config_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/society.toml");
    let loaded = SocietyConfig::load(&path).unwrap();
    let defaults = SocietyConfig::default();

    loaded.validate().unwrap();
    assert_eq!(
        serde_json::to_value(&loaded).unwrap(),
        serde_json::to_value(&defaults).unwrap()
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let result = SocietyConfig::load(Path::new("does/not/exist.toml"));
    assert!(matches!(
        result,
        Err(society::core::SocietyError::IoError(_))
    ));
}
