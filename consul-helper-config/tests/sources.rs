//! Loading configuration from files on disk.

use consul_helper_config::{ConfigLoader, ConfigManager, FileFormat};
use std::io::Write;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_json_then_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let json = write_file(
        &dir,
        "appsettings.json",
        r#"{"ServiceDiscovery": {"Name": "billing", "ConsulUrl": "http://consul:8500"}}"#,
    );
    let toml = write_file(
        &dir,
        "override.toml",
        "[ServiceDiscovery]\nConsulUrl = \"http://consul.internal:8500\"\n",
    );

    let manager = ConfigManager::new();
    manager.load_file(&json, FileFormat::Json).unwrap();
    manager.load_file(&toml, FileFormat::Toml).unwrap();

    assert_eq!(manager.get_string("servicediscovery.name").unwrap(), "billing");
    assert_eq!(
        manager.get_string("servicediscovery.consulurl").unwrap(),
        "http://consul.internal:8500"
    );
}

#[test]
fn test_auto_detected_loader_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "settings.toml", "[ServiceDiscovery]\nPort = 5000\n");

    let value = ConfigLoader::auto(&path).unwrap().load_file(&path).unwrap();
    assert_eq!(value["ServiceDiscovery"]["Port"], 5000);
}

#[test]
fn test_missing_file_is_a_load_error() {
    let manager = ConfigManager::new();
    let result = manager.load_file("/definitely/not/here.json", FileFormat::Json);

    assert!(result.is_err());
}

#[test]
fn test_dotenv_file_feeds_prefixed_environment() {
    let dir = tempfile::tempdir().unwrap();
    let dotenv = write_file(
        &dir,
        ".env",
        "CONSUL_HELPER_SOURCES_TEST_SERVICEDISCOVERY__NAME=from-dotenv\n",
    );

    let manager = ConfigManager::with_prefix("CONSUL_HELPER_SOURCES_TEST");
    manager.load_dotenv(Some(&dotenv)).unwrap();

    assert_eq!(
        manager.get_string("servicediscovery.name").unwrap(),
        "from-dotenv"
    );
}
