//! Engine configuration and schema document parsing tests

use colevo::core::config::EngineConfig;
use colevo::{ConversionEngine, DataType, Error, Record, Schema, SchemaValidator};

#[test]
fn test_parse_partial_yaml_config() {
    let yaml = r#"
schema_dir: "/var/lib/colevo/schemas"
empty_as_null: false
worker_threads: 8
"#;
    let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.schema_dir.to_str(), Some("/var/lib/colevo/schemas"));
    assert!(!cfg.empty_as_null);
    assert_eq!(cfg.worker_threads, 8);
    // Unset keys keep their defaults.
    assert_eq!(cfg.key_field, "uid");
    assert_eq!(cfg.migration_step_secs, 60);
    cfg.validate().unwrap();
}

#[test]
fn test_yaml_required_fields_drive_validation() {
    let yaml = r#"
key_field: "player_id"
required_fields:
  - "player_id"
  - "rating"
"#;
    let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
    let validator = SchemaValidator::from_config(&cfg);

    let schema: Schema = serde_json::from_str(
        r#"{"fields": [
            {"name": "player_id", "type": "int64", "nullable": false},
            {"name": "nickname", "type": "utf8", "nullable": true}
        ]}"#,
    )
    .unwrap();
    match validator.validate(&schema).unwrap_err() {
        Error::ValidationFailed { missing } => assert_eq!(missing, vec!["rating".to_string()]),
        other => panic!("unexpected {other:?}"),
    }

    // The configured key names records in errors.
    let engine = ConversionEngine::from_config(&cfg);
    let bad = Record::new().with("player_id", 77_i64).with("nickname", 3);
    let err = engine.to_table(&[bad], &schema).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { ref key, .. } if key == "player_id=77"));
}

#[test]
fn test_schema_document_type_names() {
    let json = r#"{"fields": [
        {"name": "a", "type": "int32", "nullable": false},
        {"name": "b", "type": "float64", "nullable": true},
        {"name": "c", "type": "bool", "nullable": true},
        {"name": "d", "type": "large_utf8", "nullable": true},
        {"name": "e", "type": "json", "nullable": false}
    ]}"#;
    let schema: Schema = serde_json::from_str(json).unwrap();
    let types: Vec<DataType> = schema.fields().iter().map(|f| f.data_type).collect();
    assert_eq!(
        types,
        vec![
            DataType::Int32,
            DataType::Float64,
            DataType::Boolean,
            DataType::LargeString,
            DataType::SerializedJson,
        ]
    );
}

#[test]
fn test_schema_document_rejects_duplicates() {
    let json = r#"{"fields": [
        {"name": "uid", "type": "int64", "nullable": false},
        {"name": "uid", "type": "utf8", "nullable": false}
    ]}"#;
    assert!(serde_json::from_str::<Schema>(json).is_err());
    assert!(serde_json::from_str::<Schema>(r#"{"fields": [{"name": "x", "type": "decimal", "nullable": false}]}"#).is_err());
}
