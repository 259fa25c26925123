//! Tests for the `at show` command

use mintcore_cli::commands::at::{execute, show, AtCommands};
use mintcore_cli::utils::OutputFormat;
use mintcore_cli::CliError;
use mintcore_config::Config;
use mintcore_storage::{AtRepository, MemoryAtStore, RocksAtStore};
use mintcore_types::{AtAddress, AtData, AtStateData, AtTimestamp, PublicKey, H256};
use tempfile::tempdir;

fn sample_at() -> AtData {
    let creator = PublicKey::new([4u8; 32]);
    let code = vec![1u8, 2, 3, 4];
    AtData {
        address: AtAddress::derive(&creator, 1_000, &code),
        creator_public_key: creator,
        creation_timestamp: 1_000,
        creation_height: 5,
        version: 2,
        asset_id: 0,
        code_hash: H256::digest(&code),
        code_bytes: code,
        is_sleeping: true,
        sleep_until_height: None,
        is_finished: false,
        had_fatal_error: false,
        is_frozen: false,
        frozen_balance: None,
        sleep_until_message_timestamp: Some(AtTimestamp::new(7, 0)),
    }
}

#[test]
fn test_show_latest_state() {
    let store = MemoryAtStore::new();
    let at = sample_at();
    store.save_at(&at).unwrap();
    store
        .save_at_state(&AtStateData::new(at.address, 5, vec![0u8; 16], 0, true, None))
        .unwrap();
    store
        .save_at_state(&AtStateData::new(
            at.address,
            7,
            vec![1u8; 24],
            3_000,
            false,
            Some(AtTimestamp::new(7, 0)),
        ))
        .unwrap();

    let report = show(&store, &at.address.to_string()).unwrap();
    assert_eq!(report.at, at);

    let latest = report.latest_state.unwrap();
    assert_eq!(latest.height, 7);
    assert_eq!(latest.state_size, 24);
    assert_eq!(latest.fees, 3_000);
    assert!(!latest.is_initial);
    assert_eq!(latest.state_hash, H256::digest(&[1u8; 24]).to_string());
    assert_eq!(latest.sleep_until_message_timestamp.as_deref(), Some("7:0"));
}

#[test]
fn test_show_unknown_at() {
    let store = MemoryAtStore::new();
    let err = show(&store, &sample_at().address.to_string()).unwrap_err();
    assert!(matches!(err, CliError::NotFound(_)));

    let err = show(&store, "0xnothex").unwrap_err();
    assert!(matches!(err, CliError::Parse(_)));
}

#[test]
fn test_show_from_rocks_store() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.storage.data_dir = dir.path().to_string_lossy().to_string();

    let at = sample_at();
    {
        let store = RocksAtStore::open(config.storage.database_config()).unwrap();
        store.save_at(&at).unwrap();
    }

    let store = RocksAtStore::open(config.storage.database_config()).unwrap();
    let report = show(&store, &at.address.to_hex()).unwrap();
    assert_eq!(report.at.creation_height, 5);
    assert!(report.latest_state.is_none());
    drop(store);

    let cmd = AtCommands::Show {
        address: at.address.to_string(),
    };
    execute(cmd, &config, OutputFormat::Json).unwrap();
}

#[test]
fn test_execute_without_database() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.storage.data_dir = dir.path().join("missing").to_string_lossy().to_string();

    let cmd = AtCommands::Show {
        address: sample_at().address.to_string(),
    };
    let err = execute(cmd, &config, OutputFormat::Text).unwrap_err();
    assert!(matches!(err, CliError::NotFound(_)));
}
