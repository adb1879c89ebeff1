//! Structural validation and backward-compatibility checks.

use serde::{Deserialize, Serialize};

use colevo_core::config::EngineConfig;
use colevo_core::error::{Error, Result};
use colevo_core::player;
use colevo_core::schema::{DataType, Field, Schema};

/// Checks a schema against a required-field set and old/new pairs against
/// the promotion rules.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    required: Vec<String>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::player()
    }
}

impl SchemaValidator {
    /// Validator for the player domain.
    pub fn player() -> Self {
        Self::with_required(player::REQUIRED_FIELDS.iter().copied())
    }

    pub fn with_required<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::with_required(cfg.required_fields.iter().cloned())
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Every required field must be present. All missing names are reported
    /// together, in required-set order.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        if schema.is_empty() {
            return Err(Error::InvalidArgument("schema has no fields".into()));
        }
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| schema.field_by_name(name).is_none())
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed { missing })
        }
    }

    pub fn are_types_compatible(&self, old: DataType, new: DataType) -> bool {
        old.can_promote_to(new)
    }

    /// Data written under `old` must stay readable under `new`.
    ///
    /// Fields added in `new` are not inspected.
    pub fn validate_compatibility(&self, old: &Schema, new: &Schema) -> Result<()> {
        if old.is_empty() || new.is_empty() {
            return Err(Error::InvalidArgument(
                "compatibility check needs two non-empty schemas".into(),
            ));
        }
        for old_field in old.fields() {
            let new_field = new.field_by_name(&old_field.name).ok_or_else(|| {
                Error::IncompatibleSchema {
                    field: old_field.name.clone(),
                    reason: "field removed".into(),
                }
            })?;
            check_field_change(old_field, new_field)?;
        }
        Ok(())
    }
}

pub(crate) fn check_field_change(old: &Field, new: &Field) -> Result<()> {
    if !old.data_type.can_promote_to(new.data_type) {
        return Err(Error::IncompatibleSchema {
            field: old.name.clone(),
            reason: format!(
                "type change {} -> {} is not a promotion",
                old.data_type, new.data_type
            ),
        });
    }
    if old.nullable && !new.nullable {
        return Err(Error::IncompatibleSchema {
            field: old.name.clone(),
            reason: "nullable field made non-nullable".into(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaChange {
    pub kind: ChangeKind,
    pub field_name: String,
    pub description: String,
}

/// Human-readable field-level comparison of two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaComparison {
    pub compatible: bool,
    pub changes: Vec<SchemaChange>,
}

/// Same rules as the evolution diff, phrased for display.
pub fn compare_schemas(old: &Schema, new: &Schema) -> SchemaComparison {
    let mut changes = Vec::new();
    let mut compatible = true;

    for field in new.fields() {
        if old.field_by_name(&field.name).is_none() {
            changes.push(SchemaChange {
                kind: ChangeKind::Added,
                field_name: field.name.clone(),
                description: format!(
                    "added {} ({})",
                    field.data_type,
                    if field.nullable { "nullable" } else { "required" }
                ),
            });
        }
    }

    for field in old.fields() {
        if new.field_by_name(&field.name).is_none() {
            compatible = false;
            changes.push(SchemaChange {
                kind: ChangeKind::Removed,
                field_name: field.name.clone(),
                description: format!("removed {}", field.data_type),
            });
        }
    }

    for field in new.fields() {
        let Some(before) = old.field_by_name(&field.name) else {
            continue;
        };
        if before == field {
            continue;
        }
        let mut parts = Vec::new();
        if before.data_type != field.data_type {
            parts.push(format!("type {} -> {}", before.data_type, field.data_type));
        }
        if before.nullable != field.nullable {
            parts.push(format!("nullable {} -> {}", before.nullable, field.nullable));
        }
        if check_field_change(before, field).is_err() {
            compatible = false;
        }
        changes.push(SchemaChange {
            kind: ChangeKind::Modified,
            field_name: field.name.clone(),
            description: parts.join(", "),
        });
    }

    SchemaComparison {
        compatible,
        changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Schema {
        Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("name", DataType::String, false),
            Field::new("pac", DataType::Int32, false),
            Field::new("club", DataType::String, true),
        ])
        .unwrap()
    }

    #[test]
    fn player_schema_passes_default_validator() {
        SchemaValidator::player()
            .validate(&player::player_schema())
            .unwrap();
    }

    #[test]
    fn every_missing_field_is_reported() {
        let err = SchemaValidator::player().validate(&base()).unwrap_err();
        match err {
            Error::ValidationFailed { missing } => {
                assert!(missing.contains(&"position".to_string()));
                assert!(missing.contains(&"overall".to_string()));
                assert!(!missing.contains(&"uid".to_string()));
                assert_eq!(missing.len(), player::REQUIRED_FIELDS.len() - 4);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_schema_is_invalid_argument() {
        let v = SchemaValidator::with_required(["uid"]);
        assert!(matches!(v.validate(&Schema::empty()), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn promotion_table() {
        let v = SchemaValidator::default();
        assert!(v.are_types_compatible(DataType::Int32, DataType::Int64));
        assert!(!v.are_types_compatible(DataType::Int64, DataType::Int32));
        assert!(v.are_types_compatible(DataType::String, DataType::LargeString));
        assert!(!v.are_types_compatible(DataType::Int32, DataType::Float64));
        assert!(v.are_types_compatible(DataType::SerializedJson, DataType::SerializedJson));
    }

    #[test]
    fn nullability_narrowing_rejected_widening_accepted() {
        let v = SchemaValidator::default();
        let widened = Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("name", DataType::String, true),
            Field::new("pac", DataType::Int64, false),
            Field::new("club", DataType::LargeString, true),
        ])
        .unwrap();
        v.validate_compatibility(&base(), &widened).unwrap();

        let narrowed = Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("name", DataType::String, false),
            Field::new("pac", DataType::Int32, false),
            Field::new("club", DataType::String, false),
        ])
        .unwrap();
        let err = v.validate_compatibility(&base(), &narrowed).unwrap_err();
        assert!(matches!(err, Error::IncompatibleSchema { ref field, .. } if field == "club"));
    }

    #[test]
    fn removal_is_incompatible() {
        let dropped = Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("pac", DataType::Int32, false),
            Field::new("club", DataType::String, true),
        ])
        .unwrap();
        let err = SchemaValidator::default()
            .validate_compatibility(&base(), &dropped)
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleSchema { ref field, .. } if field == "name"));
    }

    #[test]
    fn empty_schemas_are_rejected_in_compatibility_checks() {
        let v = SchemaValidator::default();
        let uid_only = Schema::try_new(vec![Field::new("uid", DataType::Int64, false)]).unwrap();
        for (old, new) in [
            (Schema::empty(), uid_only.clone()),
            (uid_only, Schema::empty()),
            (Schema::empty(), Schema::empty()),
        ] {
            assert!(matches!(
                v.validate_compatibility(&old, &new),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn comparison_lists_each_change() {
        let new = Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("pac", DataType::Int64, false),
            Field::new("club", DataType::String, true),
            Field::new("bio", DataType::LargeString, true),
        ])
        .unwrap();
        let cmp = compare_schemas(&base(), &new);
        assert!(!cmp.compatible);
        let kinds: Vec<_> = cmp.changes.iter().map(|c| (c.kind, c.field_name.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (ChangeKind::Added, "bio"),
                (ChangeKind::Removed, "name"),
                (ChangeKind::Modified, "pac"),
            ]
        );
        assert_eq!(cmp.changes[2].description, "type int32 -> int64");
    }
}
