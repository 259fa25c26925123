//! Tests for the init and check-config commands

use mintcore_cli::commands::config::check;
use mintcore_cli::commands::init::{execute, write_default_config, InitArgs};
use mintcore_cli::utils::OutputFormat;
use mintcore_cli::{CliError, DEFAULT_CONFIG_FILE};
use mintcore_config::Config;
use tempfile::tempdir;

#[test]
fn test_init_writes_default_config() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
    let data_dir = temp_dir.path().join("data");

    let args = InitArgs {
        data_dir: Some(data_dir.to_string_lossy().to_string()),
        ..Default::default()
    };
    execute(args, &config_path, OutputFormat::Json).unwrap();

    assert!(config_path.exists());
    assert!(data_dir.exists());

    let loaded = Config::load(&config_path).unwrap();
    assert_eq!(loaded.storage.data_dir, data_dir.to_string_lossy());
    assert_eq!(loaded.fork_choice, Config::default().fork_choice);
    assert_eq!(loaded.at, Config::default().at);
}

#[test]
fn test_init_creates_parent_directories() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nested").join("node").join("mintcore.toml");

    let args = InitArgs {
        data_dir: Some(temp_dir.path().join("data").to_string_lossy().to_string()),
        chain_name: Some("testnet".to_string()),
        force: false,
    };
    let result = write_default_config(args, &config_path).unwrap();

    assert_eq!(result.chain_name, "testnet");
    assert_eq!(Config::load(&config_path).unwrap().chain.chain_name, "testnet");
}

#[test]
fn test_init_refuses_to_overwrite() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
    let data_dir = temp_dir.path().join("data").to_string_lossy().to_string();

    let first = InitArgs {
        data_dir: Some(data_dir.clone()),
        ..Default::default()
    };
    write_default_config(first, &config_path).unwrap();

    let second = InitArgs {
        data_dir: Some(data_dir.clone()),
        chain_name: Some("other".to_string()),
        force: false,
    };
    let err = write_default_config(second, &config_path).unwrap_err();
    assert!(matches!(err, CliError::InvalidArgument(_)));
    assert_eq!(Config::load(&config_path).unwrap().chain.chain_name, "mintcore");

    let forced = InitArgs {
        data_dir: Some(data_dir),
        chain_name: Some("other".to_string()),
        force: true,
    };
    write_default_config(forced, &config_path).unwrap();
    assert_eq!(Config::load(&config_path).unwrap().chain.chain_name, "other");
}

#[test]
fn test_init_rejects_invalid_overrides() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);

    let args = InitArgs {
        data_dir: Some(temp_dir.path().join("data").to_string_lossy().to_string()),
        chain_name: Some("   ".to_string()),
        force: false,
    };
    let err = write_default_config(args, &config_path).unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
    assert!(!config_path.exists());
}

#[test]
fn test_check_config_reports_loaded_values() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
    std::fs::write(
        &config_path,
        "[fork_choice]\nchain_weight_shift = 12\n\n[logging]\nformat = \"json\"\n",
    )
    .unwrap();

    let report = check(&config_path).unwrap();
    assert_eq!(report.config.fork_choice.chain_weight_shift, 12);
    assert!(report.config.logging.is_json());
    assert!(report.config_file.ends_with(DEFAULT_CONFIG_FILE));
}

#[test]
fn test_check_config_rejects_invalid_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
    std::fs::write(&config_path, "[at]\nfee_per_step = -5\n").unwrap();

    let err = check(&config_path).unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}

#[test]
fn test_check_config_missing_file() {
    let temp_dir = tempdir().unwrap();
    let err = check(&temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}
