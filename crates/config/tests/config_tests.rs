//! Tests for Config module

use mintcore_config::{
    AtConfig, ChainConfig, Config, ConfigError, ForkChoiceConfig, LoggingConfig, StorageConfig,
};
use mintcore_consensus::{ChainWeightRule, WeightParams};
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.chain.chain_name, "mintcore");
    assert_eq!(config.fork_choice.accounts_count_shift, 249);
    assert_eq!(config.fork_choice.chain_weight_shift, 8);
    assert_eq!(config.at.fee_per_step, 1_000);
    assert_eq!(config.at.max_steps_per_round, 500);
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = Config::from_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_sections() {
    let config = Config::from_str(
        r#"
        [fork_choice]
        chain_weight_shift = 16
        mutual_height_activation_timestamp = 1700000000000

        [at]
        fee_per_step = 5
        "#,
    )
    .unwrap();

    assert_eq!(config.fork_choice.accounts_count_shift, 249);
    assert_eq!(config.fork_choice.weight_params(), WeightParams::new(249, 16));
    assert_eq!(config.at.fee_schedule().fee_per_step, 5);
    assert_eq!(config.at.fee_schedule().max_steps_per_round, 500);

    let selector = config.fork_choice.selector();
    assert_eq!(selector.rule_at(1_699_999_999_999), ChainWeightRule::Legacy);
    assert_eq!(selector.rule_at(1_700_000_000_000), ChainWeightRule::MutualHeight);
}

#[test]
fn test_invalid_chain_name() {
    let mut config = ChainConfig::default();
    config.chain_name = "  ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidChainName)));
}

#[test]
fn test_invalid_shifts() {
    let mut config = ForkChoiceConfig::default();
    config.accounts_count_shift = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidShift { name: "accounts_count_shift", value: 0, .. })
    ));

    let mut config = ForkChoiceConfig::default();
    config.chain_weight_shift = 65;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidShift { name: "chain_weight_shift", value: 65, min: 1, max: 64 })
    ));

    let mut config = ForkChoiceConfig::default();
    config.accounts_count_shift = 512;
    config.chain_weight_shift = 64;
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_activation_timestamp() {
    let mut config = ForkChoiceConfig::default();
    config.mutual_height_activation_timestamp = -1;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidActivationTimestamp(-1))
    ));
}

#[test]
fn test_invalid_at_fees() {
    let mut config = AtConfig::default();
    config.fee_per_step = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidFeePerStep(0))));

    let mut config = AtConfig::default();
    config.max_steps_per_round = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxSteps(0))));
}

#[test]
fn test_storage_validation() {
    let mut config = StorageConfig::default();
    config.data_dir = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingField("storage.data_dir"))
    ));

    let mut config = StorageConfig::default();
    config.max_open_files = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxOpenFiles(0))));

    config.max_open_files = -1;
    assert!(config.validate().is_ok());
}

#[test]
fn test_database_config() {
    let mut config = StorageConfig::default();
    config.data_dir = "/var/lib/mintcore".to_string();
    config.enable_compression = false;

    let db = config.database_config();
    assert_eq!(db.path, "/var/lib/mintcore/ats");
    assert!(!db.enable_compression);
    assert_eq!(db.max_open_files, 512);
}

#[test]
fn test_logging_validation() {
    let mut config = LoggingConfig::default();
    config.level = "verbose".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidLogLevel(_))));

    let mut config = LoggingConfig::default();
    config.format = "xml".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidLogFormat(_))));

    let mut config = LoggingConfig::default();
    config.format = "JSON".to_string();
    config.level = "DEBUG".to_string();
    assert!(config.validate().is_ok());
    assert!(config.is_json());
}

#[test]
fn test_invalid_value_in_file_rejected() {
    let err = Config::from_str("[at]\nmax_steps_per_round = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMaxSteps(0)));

    let err = Config::from_str("[at]\nfee_per_step = \"lots\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::TomlParse(_)));
}

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mintcore.toml");

    let mut config = Config::default();
    config.chain.chain_name = "testnet".to_string();
    config.fork_choice.mutual_height_activation_timestamp = 42;
    config.logging.format = "json".to_string();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileRead { .. }));
}
