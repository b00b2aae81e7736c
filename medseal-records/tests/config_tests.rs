use medseal_records::{RecordsConfig, RecordsError, DEFAULT_MAX_PAYLOAD_BYTES};
use std::path::PathBuf;

#[test]
fn default_keeps_blobs_in_memory() {
    let config = RecordsConfig::default();
    assert!(config.blob_root.is_none());
    assert_eq!(config, RecordsConfig::in_memory());
}

#[test]
fn default_pins_and_verifies() {
    let config = RecordsConfig::default();
    assert!(config.pin_on_store);
    assert!(config.verify_digest_on_fetch);
}

#[test]
fn default_upload_limit_is_ten_mib() {
    let config = RecordsConfig::default();
    assert_eq!(config.max_payload_bytes, 10_485_760);
    assert_eq!(config.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
}

#[test]
fn default_record_prefix() {
    assert_eq!(RecordsConfig::default().record_id_prefix, "EHR");
}

#[test]
fn with_blob_root_sets_root_only() {
    let config = RecordsConfig::with_blob_root("/var/lib/medseal/blobs");
    assert_eq!(config.blob_root, Some(PathBuf::from("/var/lib/medseal/blobs")));
    assert_eq!(config.max_payload_bytes, DEFAULT_MAX_PAYLOAD_BYTES);
}

#[test]
fn serialization_roundtrip() {
    let config = RecordsConfig::with_blob_root("/tmp/blobs");
    let json = serde_json::to_string(&config).unwrap();
    let deserialized: RecordsConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn from_json_fills_missing_fields() {
    let config = RecordsConfig::from_json(r#"{"max_payload_bytes": 2048}"#).unwrap();
    assert_eq!(config.max_payload_bytes, 2048);
    assert!(config.pin_on_store);
    assert_eq!(config.record_id_prefix, "EHR");
}

#[test]
fn from_json_rejects_zero_limit() {
    let err = RecordsConfig::from_json(r#"{"max_payload_bytes": 0}"#).unwrap_err();
    assert!(matches!(err, RecordsError::Config(_)));
}

#[test]
fn from_json_rejects_malformed_input() {
    let err = RecordsConfig::from_json("{not json").unwrap_err();
    assert!(matches!(err, RecordsError::Serialization(_)));
}

#[test]
fn validate_rejects_blank_prefix() {
    let config = RecordsConfig {
        record_id_prefix: "  ".to_string(),
        ..RecordsConfig::default()
    };
    assert!(matches!(config.validate(), Err(RecordsError::Config(_))));
}

#[test]
fn validate_rejects_empty_blob_root() {
    let config = RecordsConfig::with_blob_root("");
    assert!(matches!(config.validate(), Err(RecordsError::Config(_))));
}
