//! Serializable mutation commands. Each command is applied atomically: by one Lua
//! script on Redis, or under the state lock of the in-memory store.

use serde::Serialize;

use crate::{
    keys::KeyContext,
    registry::{self, VisibilityHop},
    types::{CounterCacheDescriptor, TableDescriptor, UniqueConstraintDescriptor},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationCommand {
    InsertRow(RowInsert),
    PatchRow(RowPatch),
    SoftDeleteRow(RowSoftDelete),
    ReconcileCounter(CounterReconcile),
}

impl MutationCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MutationCommand::InsertRow(_) => "insert_row",
            MutationCommand::PatchRow(_) => "patch_row",
            MutationCommand::SoftDeleteRow(_) => "soft_delete_row",
            MutationCommand::ReconcileCounter(_) => "reconcile_counter",
        }
    }
}

/// One hop of a visibility chain, resolved to its key prefix.
#[derive(Debug, Clone, Serialize)]
pub struct VisibilityStep {
    /// Column read from the current row to find the parent id.
    pub column: String,
    pub table: String,
    pub key_prefix: String,
}

/// Referenced parent that must be live, with its own aggregate ancestry.
#[derive(Debug, Clone, Serialize)]
pub struct ParentCheck {
    pub field: String,
    pub table: String,
    pub key_prefix: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<VisibilityStep>,
}

/// Unique slot computed from the row's stored values.
#[derive(Debug, Clone, Serialize)]
pub struct UniqueConstraintCheck {
    pub fields: Vec<String>,
    pub case_insensitive: bool,
    pub key_prefix: String,
}

/// Reverse foreign-key index maintained for `column`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexUpdate {
    pub column: String,
    pub key_prefix: String,
}

/// Counter adjustment on the parent row(s) named by `source_column`.
///
/// Without `index_key_prefix` the source value is the parent id. With it, the parents are the
/// members of `{index_key_prefix}{source value}` (blogs owned by a user).
#[derive(Debug, Clone, Serialize)]
pub struct CounterUpdate {
    pub source_column: String,
    pub table: String,
    pub key_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_key_prefix: Option<String>,
    pub column: String,
    pub delta: i64,
}

/// Live children feeding one counter column.
#[derive(Debug, Clone, Serialize)]
pub struct CounterSourceSpec {
    /// Parent column whose value keys the child index (`id` or `user_id`).
    pub match_column: String,
    pub index_key_prefix: String,
    pub child_key_prefix: String,
}

/// Counter initialised from children that already exist when the parent is created.
#[derive(Debug, Clone, Serialize)]
pub struct CounterSeed {
    pub column: String,
    pub source: CounterSourceSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowInsert {
    pub table: String,
    pub key_prefix: String,
    pub sequence_key: String,
    pub ids_key: String,
    /// `[column, json]` pairs; the id is assigned by the store.
    pub fields: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parent_checks: Vec<ParentCheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraintCheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexUpdate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub counters: Vec<CounterUpdate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seeds: Vec<CounterSeed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowPatch {
    pub table: String,
    pub key_prefix: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<VisibilityStep>,
    pub changes: Vec<(String, String)>,
    /// Applied only when at least one change differs from the stored value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parent_checks: Vec<ParentCheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraintCheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowSoftDelete {
    pub table: String,
    pub key_prefix: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<VisibilityStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unique_constraints: Vec<UniqueConstraintCheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub counters: Vec<CounterUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterReconcile {
    pub table: String,
    pub key_prefix: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<VisibilityStep>,
    pub column: String,
    pub sources: Vec<CounterSourceSpec>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct MutationPlan {
    pub commands: Vec<MutationCommand>,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: MutationCommand) {
        self.commands.push(command);
    }
}

pub fn visibility_steps(keys: &KeyContext<'_>, hops: &[VisibilityHop]) -> Vec<VisibilityStep> {
    hops.iter()
        .map(|hop| VisibilityStep {
            column: hop.column.to_string(),
            table: hop.table.to_string(),
            key_prefix: keys.row_prefix(hop.table),
        })
        .collect()
}

pub fn build_parent_check(keys: &KeyContext<'_>, field: &str, parent: &TableDescriptor, id: i64) -> ParentCheck {
    ParentCheck {
        field: field.to_string(),
        table: parent.name.to_string(),
        key_prefix: keys.row_prefix(parent.name),
        id,
        chain: visibility_steps(keys, &registry::visibility_chain(parent)),
    }
}

pub fn build_unique_constraint_checks(
    keys: &KeyContext<'_>,
    table: &TableDescriptor,
    constraints: &[UniqueConstraintDescriptor],
) -> Vec<UniqueConstraintCheck> {
    constraints
        .iter()
        .map(|constraint| UniqueConstraintCheck {
            fields: constraint.fields.iter().map(|field| field.to_string()).collect(),
            case_insensitive: constraint.case_insensitive,
            key_prefix: keys.unique_prefix(table.name),
        })
        .collect()
}

pub fn build_index_updates(keys: &KeyContext<'_>, table: &TableDescriptor) -> Vec<IndexUpdate> {
    table
        .relations
        .iter()
        .map(|relation| IndexUpdate {
            column: relation.column.to_string(),
            key_prefix: keys.reverse_index_prefix(table.name, relation.column),
        })
        .collect()
}

fn counter_index_prefix(keys: &KeyContext<'_>, cache: &CounterCacheDescriptor) -> Option<String> {
    (cache.match_column != "id").then(|| keys.reverse_index_prefix(cache.target_table, cache.match_column))
}

pub fn build_counter_updates(keys: &KeyContext<'_>, table: &TableDescriptor, delta: i64) -> Vec<CounterUpdate> {
    table
        .counters
        .iter()
        .map(|cache| CounterUpdate {
            source_column: cache.source_column.to_string(),
            table: cache.target_table.to_string(),
            key_prefix: keys.row_prefix(cache.target_table),
            index_key_prefix: counter_index_prefix(keys, cache),
            column: cache.counter_column.to_string(),
            delta,
        })
        .collect()
}

pub fn build_counter_source(
    keys: &KeyContext<'_>,
    child_table: &str,
    cache: &CounterCacheDescriptor,
) -> CounterSourceSpec {
    CounterSourceSpec {
        match_column: cache.match_column.to_string(),
        index_key_prefix: keys.reverse_index_prefix(child_table, cache.source_column),
        child_key_prefix: keys.row_prefix(child_table),
    }
}

/// Seeds for counters whose children can predate the parent row.
pub fn build_counter_seeds(keys: &KeyContext<'_>, table: &TableDescriptor) -> Vec<CounterSeed> {
    registry::find_counter_sources(table.name)
        .into_iter()
        .filter(|source| source.cache.match_column != "id")
        .map(|source| CounterSeed {
            column: source.cache.counter_column.to_string(),
            source: build_counter_source(keys, source.child_table, source.cache),
        })
        .collect()
}
