//! End-to-end tests against a real filesystem backend.

use std::path::PathBuf;

use devconf_store::{ConfigStore, FsBackend, SaveUrgency};

fn fs_store(dir: &tempfile::TempDir) -> ConfigStore<FsBackend> {
    let backend = FsBackend::new(PathBuf::from(dir.path())).unwrap();
    ConfigStore::new(backend)
}

#[test]
fn save_and_reload_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), b"{}").unwrap();

    {
        let mut store = fs_store(&dir);
        assert!(store.load_configuration_file("config.json"));

        assert!(store.set("device|name", "thermostat", SaveUrgency::Deferred));
        assert!(store.set("device|enabled", true, SaveUrgency::Deferred));
        assert!(store.set("wifi|channel", 6, SaveUrgency::Deferred));
        assert!(store.set("calib|scale", 1.25, SaveUrgency::Deferred));
        assert!(store.set_at("sensors", 1, "pin", 14, SaveUrgency::Deferred));
        assert!(store.save_settings());
        assert!(!store.outdated());
    }

    // A fresh store sees everything the first one wrote.
    let mut store = fs_store(&dir);
    assert!(store.load_configuration_file("config.json"));

    assert_eq!(store.get_str("device|name", ""), "thermostat");
    assert_eq!(store.get("device|enabled", false), true);
    assert_eq!(store.get("wifi|channel", 0), 6);
    assert_eq!(store.get("calib|scale", 0.0), 1.25);
    assert_eq!(store.get_at("sensors", 1, "pin", 0), 14);
    assert_eq!(store.elements("sensors"), 2);
}

#[test]
fn save_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.json"), b"{}").unwrap();

    let mut store = fs_store(&dir);
    assert!(store.load_configuration_file("config.json"));
    assert!(store.set("key", 1, SaveUrgency::Critical));

    assert!(dir.path().join("config.json").exists());
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn missing_file_load_fails_then_defaults_restore_it() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("def-config.json"), br#"{"factory": true}"#).unwrap();

    let mut store = fs_store(&dir);
    assert!(!store.load_configuration_file("config.json"));

    // The filename was remembered, so a defaults restore and a reload
    // recover the device.
    assert!(store.reset_to_default_settings());
    assert!(store.load_configuration_file("config.json"));
    assert_eq!(store.get("factory", false), true);
}

#[test]
fn typed_reads_degrade_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        br#"{"port": 8080, "host": "device.local"}"#,
    )
    .unwrap();

    let mut store = fs_store(&dir);
    assert!(store.load_configuration_file("config.json"));

    assert_eq!(store.get("port", 0), 8080);
    assert_eq!(store.get_str("port", "fallback"), "fallback");
    assert_eq!(store.get("host", 0), 0);
    assert_eq!(store.get_str("host", ""), "device.local");
    assert_eq!(store.get("absent|deep|path", -1), -1);
}
