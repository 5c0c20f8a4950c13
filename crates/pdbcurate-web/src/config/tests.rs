use super::*;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::io::Write;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_empty_file_gives_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:3001");
    assert_eq!(config.backend.timeout_secs, 30);
    assert_eq!(config.dataset.preset, "usc_backup");
    assert!(config.access.password.is_none());
    assert_eq!(config.structure.thumbnail_host, RCSB_IMAGE_HOST);
}

#[test]
fn test_sections_parse() {
    let config = Config::from_toml(
        r#"
        [server]
        bind = "0.0.0.0:8080"

        [backend]
        url = "https://example.supabase.co"
        api_key = "anon-key"
        timeout_secs = 5

        [access]
        password = "hunter2"

        [dataset]
        preset = "annotated"
        table = "pdb_entries_v2"
        "#,
    )
    .unwrap();

    assert_eq!(config.server.bind, "0.0.0.0:8080");
    assert_eq!(config.backend.timeout(), Duration::from_secs(5));
    assert_eq!(config.backend.api_key.as_ref().unwrap().expose_secret(), "anon-key");
    assert_eq!(config.access.password.as_ref().unwrap().expose_secret(), "hunter2");

    let schema = config.schema().unwrap();
    assert_eq!(schema.table, "pdb_entries_v2");
    assert!(schema.annotation.is_some());
}

#[test]
fn test_env_overrides_file_values() {
    let mut config = Config::from_toml("[access]\npassword = \"from-file\"").unwrap();
    config.apply_env(env(&[
        (ENV_PASSWORD, "from-env"),
        (ENV_BACKEND_URL, "https://env.supabase.co"),
        (ENV_API_KEY, "  "),
    ]));

    assert_eq!(config.access.password.as_ref().unwrap().expose_secret(), "from-env");
    assert_eq!(config.backend.url, "https://env.supabase.co");
    assert!(config.backend.api_key.is_none());
}

#[test]
fn test_blank_secret_is_treated_as_absent() {
    let config = Config::from_toml("[access]\npassword = \"\"").unwrap();
    assert!(config.access.password.is_none());
}

#[test]
fn test_unknown_preset_is_an_error() {
    let config = Config::from_toml("[dataset]\npreset = \"nope\"").unwrap();
    assert!(config.schema().is_err());
}

#[test]
fn test_descriptor_file_wins_over_preset() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "name: Custom\ntable: custom_table\nfields:\n  - key: title\n    label: Title"
    )
    .unwrap();

    let mut config = Config::default();
    config.dataset.descriptor = Some(file.path().to_path_buf());
    let schema = config.schema().unwrap();
    assert_eq!(schema.name, "Custom");
    assert_eq!(schema.table, "custom_table");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.dataset.preset, "usc_backup");
}
