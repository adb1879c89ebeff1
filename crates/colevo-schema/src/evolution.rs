//! Schema diffing and migration planning.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use colevo_core::config::EngineConfig;
use colevo_core::error::{Error, Result};
use colevo_core::schema::{DataType, Field, Schema};

use crate::migration::{MigrationPlan, MigrationStep};
use crate::registry::Registry;
use crate::validator::check_field_change;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModification {
    pub field_name: String,
    pub old_type: DataType,
    pub new_type: DataType,
    pub old_nullable: bool,
    pub new_nullable: bool,
    pub compatible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEvolution {
    /// Registered version of the old schema, `0` when unregistered.
    pub from_version: u32,
    pub to_version: u32,
    pub added_fields: Vec<Field>,
    pub removed_fields: Vec<Field>,
    pub modified_fields: Vec<FieldModification>,
    pub compatible: bool,
    /// Field-level steps in the order added, removed, modified.
    pub migration_plan: Vec<MigrationStep>,
    pub created_at: DateTime<Utc>,
}

impl SchemaEvolution {
    pub fn is_unchanged(&self) -> bool {
        self.added_fields.is_empty() && self.removed_fields.is_empty() && self.modified_fields.is_empty()
    }
}

/// Diffs schemas and turns diffs between registered versions into plans.
#[derive(Debug, Clone)]
pub struct EvolutionAnalyzer {
    registry: Arc<Registry>,
    step_cost: Duration,
}

impl EvolutionAnalyzer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            step_cost: Duration::from_secs(60),
        }
    }

    pub fn from_config(registry: Arc<Registry>, cfg: &EngineConfig) -> Self {
        Self::new(registry).with_step_cost(Duration::from_secs(cfg.migration_step_secs))
    }

    /// Estimated cost of one field-level migration step.
    pub fn with_step_cost(mut self, step_cost: Duration) -> Self {
        self.step_cost = step_cost;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn diff(&self, old: &Schema, new: &Schema) -> Result<SchemaEvolution> {
        if old.is_empty() || new.is_empty() {
            return Err(Error::InvalidArgument("cannot diff a schema with no fields".into()));
        }
        let from_version = self.registry.version_of(old).unwrap_or(0);
        let to_version = self.registry.version_of(new).unwrap_or(0);
        Ok(diff_schemas(old, new, from_version, to_version))
    }

    pub fn plan_migration(&self, from: u32, to: u32) -> Result<MigrationPlan> {
        let old = self.registry.by_version(from)?;
        let new = self.registry.by_version(to)?;
        let evolution = diff_schemas(&old, &new, from, to);

        let plan = MigrationPlan::bracketed(
            from,
            to,
            evolution.migration_plan,
            evolution.compatible,
            self.step_cost,
        );
        tracing::info!(
            from,
            to,
            steps = plan.steps.len(),
            reversible = plan.reversible,
            "migration planned"
        );
        Ok(plan)
    }
}

fn diff_schemas(old: &Schema, new: &Schema, from_version: u32, to_version: u32) -> SchemaEvolution {
    let mut steps = Vec::new();

    let added_fields: Vec<Field> = new
        .fields()
        .iter()
        .filter(|f| old.field_by_name(&f.name).is_none())
        .cloned()
        .collect();
    steps.extend(added_fields.iter().map(MigrationStep::add_field));

    let removed_fields: Vec<Field> = old
        .fields()
        .iter()
        .filter(|f| new.field_by_name(&f.name).is_none())
        .cloned()
        .collect();
    steps.extend(removed_fields.iter().map(MigrationStep::remove_field));

    let mut modified_fields = Vec::new();
    for field in new.fields() {
        let Some(before) = old.field_by_name(&field.name) else {
            continue;
        };
        if before.data_type == field.data_type && before.nullable == field.nullable {
            continue;
        }
        let reason = check_field_change(before, field).err().map(|e| match e {
            Error::IncompatibleSchema { reason, .. } => reason,
            other => other.to_string(),
        });
        let compatible = reason.is_none();
        steps.push(MigrationStep::modify_field(before, field, compatible));
        modified_fields.push(FieldModification {
            field_name: field.name.clone(),
            old_type: before.data_type,
            new_type: field.data_type,
            old_nullable: before.nullable,
            new_nullable: field.nullable,
            compatible,
            reason,
        });
    }

    let compatible = removed_fields.is_empty() && modified_fields.iter().all(|m| m.compatible);

    SchemaEvolution {
        from_version,
        to_version,
        added_fields,
        removed_fields,
        modified_fields,
        compatible,
        migration_plan: steps,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationStepKind;
    use crate::validator::SchemaValidator;

    fn analyzer() -> EvolutionAnalyzer {
        let registry = Registry::in_memory(SchemaValidator::with_required(["uid"]));
        EvolutionAnalyzer::new(Arc::new(registry))
    }

    fn schema(fields: Vec<Field>) -> Schema {
        Schema::try_new(fields).unwrap()
    }

    #[test]
    fn diff_orders_changes() {
        let old = schema(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("pac", DataType::Int32, false),
            Field::new("club", DataType::String, true),
            Field::new("age", DataType::Int32, false),
        ]);
        let new = schema(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("bio", DataType::LargeString, true),
            Field::new("club", DataType::String, false),
            Field::new("pac", DataType::Int64, false),
            Field::new("form", DataType::Float32, true),
        ]);

        let evo = analyzer().diff(&old, &new).unwrap();
        let added: Vec<_> = evo.added_fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(added, vec!["bio", "form"]);
        assert_eq!(evo.removed_fields[0].name, "age");
        let modified: Vec<_> = evo.modified_fields.iter().map(|m| m.field_name.as_str()).collect();
        assert_eq!(modified, vec!["club", "pac"]);
        assert!(!evo.modified_fields[0].compatible);
        assert!(evo.modified_fields[1].compatible);
        assert!(!evo.compatible);
        assert_eq!(evo.from_version, 0);

        let kinds: Vec<_> = evo.migration_plan.iter().map(|s| s.step_type).collect();
        assert_eq!(
            kinds,
            vec![
                MigrationStepKind::AddField,
                MigrationStepKind::AddField,
                MigrationStepKind::RemoveField,
                MigrationStepKind::ModifyField,
                MigrationStepKind::ModifyField,
            ]
        );
    }

    #[test]
    fn identical_schemas_are_unchanged() {
        let s = schema(vec![Field::new("uid", DataType::Int64, false)]);
        let evo = analyzer().diff(&s, &s).unwrap();
        assert!(evo.is_unchanged());
        assert!(evo.compatible);
    }

    #[test]
    fn diff_rejects_empty_schema() {
        let s = schema(vec![Field::new("uid", DataType::Int64, false)]);
        assert!(matches!(
            analyzer().diff(&Schema::empty(), &s),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn plan_requires_registered_versions() {
        let a = analyzer();
        a.registry()
            .register(1, &schema(vec![Field::new("uid", DataType::Int64, false)]))
            .unwrap();
        assert!(matches!(a.plan_migration(1, 2), Err(Error::NotFound { version: 2 })));
        assert!(matches!(a.plan_migration(9, 1), Err(Error::NotFound { version: 9 })));
        assert!(a.plan_migration(1, 1).unwrap().is_empty());
    }

    #[test]
    fn duration_scales_with_field_steps() {
        let a = analyzer().with_step_cost(Duration::from_secs(30));
        a.registry()
            .register(1, &schema(vec![Field::new("uid", DataType::Int64, false)]))
            .unwrap();
        a.registry()
            .register(
                2,
                &schema(vec![
                    Field::new("uid", DataType::Int64, false),
                    Field::new("a", DataType::Int32, true),
                    Field::new("b", DataType::Int32, false),
                ]),
            )
            .unwrap();
        let plan = a.plan_migration(1, 2).unwrap();
        assert_eq!(plan.steps.len(), 4);
        assert_eq!(plan.estimated_duration, Duration::from_secs(60));
        assert!(plan.reversible);
        assert!(!plan.steps[1].required);
        assert!(plan.steps[2].required);
    }
}
