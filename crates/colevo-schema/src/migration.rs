//! Migration plan model.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use colevo_core::schema::{DataType, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MigrationStepKind {
    AddField,
    RemoveField,
    ModifyField,
    ValidateData,
    BackupData,
    /// Reserved for data rewrites; the planner does not emit it yet.
    TransformData,
}

impl MigrationStepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStepKind::AddField => "ADD_FIELD",
            MigrationStepKind::RemoveField => "REMOVE_FIELD",
            MigrationStepKind::ModifyField => "MODIFY_FIELD",
            MigrationStepKind::ValidateData => "VALIDATE_DATA",
            MigrationStepKind::BackupData => "BACKUP_DATA",
            MigrationStepKind::TransformData => "TRANSFORM_DATA",
        }
    }

    /// Steps that touch a single field, as opposed to whole-dataset steps.
    pub fn is_field_step(&self) -> bool {
        matches!(
            self,
            MigrationStepKind::AddField
                | MigrationStepKind::RemoveField
                | MigrationStepKind::ModifyField
        )
    }
}

impl fmt::Display for MigrationStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStep {
    pub step_type: MigrationStepKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_type: Option<DataType>,
    pub required: bool,
    pub reversible: bool,
}

impl MigrationStep {
    /// Adding a field loses nothing; it is mandatory only when the new field
    /// cannot be left null.
    pub fn add_field(field: &Field) -> Self {
        Self {
            step_type: MigrationStepKind::AddField,
            description: format!("Add field '{}' of type {}", field.name, field.data_type),
            field_name: Some(field.name.clone()),
            old_type: None,
            new_type: Some(field.data_type),
            required: !field.nullable,
            reversible: true,
        }
    }

    pub fn remove_field(field: &Field) -> Self {
        Self {
            step_type: MigrationStepKind::RemoveField,
            description: format!("Remove field '{}'", field.name),
            field_name: Some(field.name.clone()),
            old_type: Some(field.data_type),
            new_type: None,
            required: true,
            reversible: false,
        }
    }

    pub fn modify_field(old: &Field, new: &Field, compatible: bool) -> Self {
        Self {
            step_type: MigrationStepKind::ModifyField,
            description: format!(
                "Modify field '{}' from {} to {}",
                new.name, old.data_type, new.data_type
            ),
            field_name: Some(new.name.clone()),
            old_type: Some(old.data_type),
            new_type: Some(new.data_type),
            required: true,
            reversible: compatible,
        }
    }

    pub fn backup() -> Self {
        Self {
            step_type: MigrationStepKind::BackupData,
            description: "Back up existing data before migration".into(),
            field_name: None,
            old_type: None,
            new_type: None,
            required: true,
            reversible: true,
        }
    }

    pub fn validate() -> Self {
        Self {
            step_type: MigrationStepKind::ValidateData,
            description: "Validate migrated data against the target schema".into(),
            field_name: None,
            old_type: None,
            new_type: None,
            required: true,
            reversible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub from_version: u32,
    pub to_version: u32,
    pub steps: Vec<MigrationStep>,
    /// True iff the underlying evolution is backward compatible.
    pub reversible: bool,
    pub estimated_duration: Duration,
    pub created_at: DateTime<Utc>,
}

impl MigrationPlan {
    /// Wrap field-level steps in the whole-dataset backup/validate bracket.
    ///
    /// The duration estimate counts field-level steps only.
    pub(crate) fn bracketed(
        from_version: u32,
        to_version: u32,
        field_steps: Vec<MigrationStep>,
        reversible: bool,
        step_cost: Duration,
    ) -> Self {
        let field_count = u32::try_from(field_steps.len()).unwrap_or(u32::MAX);
        let estimated_duration = step_cost.saturating_mul(field_count);

        let steps = if field_steps.is_empty() {
            field_steps
        } else {
            let mut steps = Vec::with_capacity(field_steps.len() + 2);
            steps.push(MigrationStep::backup());
            steps.extend(field_steps);
            steps.push(MigrationStep::validate());
            steps
        };

        Self {
            from_version,
            to_version,
            steps,
            reversible,
            estimated_duration,
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn kinds(&self) -> Vec<MigrationStepKind> {
        self.steps.iter().map(|s| s.step_type).collect()
    }

    pub fn field_step_count(&self) -> usize {
        self.steps.iter().filter(|s| s.step_type.is_field_step()).count()
    }
}
