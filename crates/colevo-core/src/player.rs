//! The player-profile record type: the domain's primary schema.
//!
//! Goalkeeper ratings (`gk` .. `pos`) are nullable because outfield players
//! carry zero there; nested attribute maps and position lists have no native
//! columnar form and are stored as JSON text.

use crate::schema::{DataType, Field, Schema};

/// Primary key of a player record.
pub const KEY_FIELD: &str = "uid";

/// Minimal stable shape that search and statistics consumers rely on.
pub const REQUIRED_FIELDS: &[&str] = &[
    "uid",
    "name",
    "position",
    "age",
    "club",
    "division",
    "nationality",
    "nationality_iso",
    "transfer_value_amount",
    "wage_amount",
    "pac",
    "sho",
    "pas",
    "dri",
    "def",
    "phy",
    "overall",
];

/// Version the player schema is bootstrapped as in a fresh registry.
pub const PLAYER_SCHEMA_VERSION: u32 = 1;

pub fn player_schema() -> Schema {
    use DataType::*;

    let columns: &[(&str, DataType, bool)] = &[
        ("uid", Int64, false),
        ("name", String, false),
        ("position", String, false),
        ("age", String, false),
        ("club", String, false),
        ("division", String, false),
        ("nationality", String, false),
        ("nationality_iso", String, false),
        ("nationality_fifa_code", String, false),
        ("transfer_value", String, false),
        ("wage", String, false),
        ("transfer_value_amount", Int64, false),
        ("wage_amount", Int64, false),
        ("personality", String, true),
        ("media_handling", String, true),
        ("attribute_masked", Boolean, true),
        ("pac", Int32, false),
        ("sho", Int32, false),
        ("pas", Int32, false),
        ("dri", Int32, false),
        ("def", Int32, false),
        ("phy", Int32, false),
        ("overall", Int32, false),
        ("gk", Int32, true),
        ("div", Int32, true),
        ("han", Int32, true),
        ("ref", Int32, true),
        ("kic", Int32, true),
        ("spd", Int32, true),
        ("pos", Int32, true),
        ("best_role_overall", String, false),
        ("attributes", SerializedJson, false),
        ("numeric_attributes", SerializedJson, false),
        ("performance_stats_numeric", SerializedJson, false),
        ("performance_percentiles", SerializedJson, false),
        ("parsed_positions", SerializedJson, false),
        ("short_positions", SerializedJson, false),
        ("position_groups", SerializedJson, false),
        ("role_specific_overalls", SerializedJson, false),
    ];

    Schema::from_unique_fields(
        columns.iter()
            .map(|(name, dt, nullable)| Field::new(*name, *dt, *nullable))
            .collect(),
    )
}
