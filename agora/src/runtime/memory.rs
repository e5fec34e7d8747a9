use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use log::debug;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use crate::{
    errors::RepoError,
    keys::KeyContext,
    runtime::{
        MutationExecutor, Row, RowReader,
        commands::{
            CounterReconcile, CounterUpdate, MutationCommand, MutationPlan, ParentCheck, RowInsert, RowPatch,
            RowSoftDelete, UniqueConstraintCheck, VisibilityStep,
        },
        decode_row, display_encoded,
    },
};

type Hash = BTreeMap<String, String>;

/// Key-value state shaped like the Redis keyspace the Lua scripts operate on.
#[derive(Debug, Default)]
struct MemoryState {
    hashes: HashMap<String, Hash>,
    sets: HashMap<String, BTreeSet<i64>>,
    strings: HashMap<String, String>,
    sequences: HashMap<String, i64>,
}

fn parse_id(raw: Option<&String>) -> Option<i64> {
    raw.and_then(|value| value.parse().ok())
}

fn unique_key(constraint: &UniqueConstraintCheck, values: &Hash) -> Option<String> {
    let mut parts = Vec::with_capacity(constraint.fields.len());
    for field in &constraint.fields {
        let value = values.get(field)?;
        if value == "null" {
            return None;
        }
        parts.push(if constraint.case_insensitive {
            value.to_ascii_lowercase()
        } else {
            value.clone()
        });
    }
    Some(format!(
        "{}{}:{}",
        constraint.key_prefix,
        constraint.fields.join(","),
        parts.join("|")
    ))
}

fn unique_violation(table: &str, constraint: &UniqueConstraintCheck, values: &Hash, existing: &str) -> RepoError {
    RepoError::UniqueConstraintViolation {
        table: table.to_string(),
        fields: constraint.fields.clone(),
        values: constraint
            .fields
            .iter()
            .map(|field| values.get(field).map(|raw| display_encoded(raw)).unwrap_or_default())
            .collect(),
        existing_id: existing.parse().unwrap_or_default(),
    }
}

fn parent_not_found(check: &ParentCheck) -> RepoError {
    RepoError::ParentNotFound {
        field: check.field.clone(),
        table: check.table.clone(),
        id: check.id,
    }
}

impl MemoryState {
    fn is_live(&self, key: &str) -> bool {
        self.hashes
            .get(key)
            .and_then(|hash| hash.get("is_deleted"))
            .is_some_and(|flag| flag == "false")
    }

    fn is_visible(&self, key: &str, chain: &[VisibilityStep]) -> bool {
        if !self.is_live(key) {
            return false;
        }
        let mut current = key.to_string();
        for step in chain {
            let Some(parent_id) = parse_id(self.hashes.get(&current).and_then(|hash| hash.get(&step.column))) else {
                return false;
            };
            current = format!("{}{}", step.key_prefix, parent_id);
            if !self.is_live(&current) {
                return false;
            }
        }
        true
    }

    fn members(&self, key: &str) -> Vec<i64> {
        self.sets
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn count_live(&self, index_key: &str, child_prefix: &str) -> i64 {
        self.members(index_key)
            .into_iter()
            .filter(|member| self.is_live(&format!("{child_prefix}{member}")))
            .count() as i64
    }

    fn adjust_counter(&mut self, key: &str, column: &str, delta: i64) {
        if !self.is_live(key) {
            return;
        }
        if let Some(hash) = self.hashes.get_mut(key) {
            let current = parse_id(hash.get(column)).unwrap_or(0);
            hash.insert(column.to_string(), (current + delta).max(0).to_string());
        }
    }

    fn counter_targets(&self, update: &CounterUpdate, values: &Hash) -> Vec<String> {
        let Some(source) = parse_id(values.get(&update.source_column)) else {
            return Vec::new();
        };
        match &update.index_key_prefix {
            Some(index_prefix) => self
                .members(&format!("{index_prefix}{source}"))
                .into_iter()
                .map(|member| format!("{}{}", update.key_prefix, member))
                .collect(),
            None => vec![format!("{}{}", update.key_prefix, source)],
        }
    }

    fn apply_counters(&mut self, counters: &[CounterUpdate], values: &Hash) {
        for update in counters {
            for target in self.counter_targets(update, values) {
                self.adjust_counter(&target, &update.column, update.delta);
            }
        }
    }

    fn flat_row(&self, key: &str) -> Value {
        let flat: Vec<Value> = self
            .hashes
            .get(key)
            .map(|hash| {
                hash.iter()
                    .flat_map(|(column, value)| [Value::String(column.clone()), Value::String(value.clone())])
                    .collect()
            })
            .unwrap_or_default();
        Value::Array(flat)
    }

    fn insert(&mut self, cmd: RowInsert) -> Result<Value, RepoError> {
        let mut values: Hash = cmd.fields.into_iter().collect();

        for check in &cmd.parent_checks {
            if !self.is_visible(&format!("{}{}", check.key_prefix, check.id), &check.chain) {
                return Err(parent_not_found(check));
            }
        }

        let mut slots = Vec::new();
        for constraint in &cmd.unique_constraints {
            if let Some(slot) = unique_key(constraint, &values) {
                if let Some(existing) = self.strings.get(&slot) {
                    return Err(unique_violation(&cmd.table, constraint, &values, existing));
                }
                slots.push(slot);
            }
        }

        let sequence = self.sequences.entry(cmd.sequence_key).or_insert(0);
        *sequence += 1;
        let id = *sequence;
        let id_text = id.to_string();
        values.insert("id".to_string(), id_text.clone());

        let mut seeded = Map::new();
        for seed in &cmd.seeds {
            let total = parse_id(values.get(&seed.source.match_column))
                .map(|parent| {
                    self.count_live(
                        &format!("{}{}", seed.source.index_key_prefix, parent),
                        &seed.source.child_key_prefix,
                    )
                })
                .unwrap_or(0);
            values.insert(seed.column.clone(), total.to_string());
            seeded.insert(seed.column.clone(), json!(total));
        }

        for index in &cmd.indexes {
            if let Some(parent_id) = parse_id(values.get(&index.column)) {
                self.sets
                    .entry(format!("{}{}", index.key_prefix, parent_id))
                    .or_default()
                    .insert(id);
            }
        }
        self.sets.entry(cmd.ids_key).or_default().insert(id);
        for slot in slots {
            self.strings.insert(slot, id_text.clone());
        }

        self.hashes.insert(format!("{}{}", cmd.key_prefix, id), values.clone());
        self.apply_counters(&cmd.counters, &values);

        Ok(json!({ "id": id, "seeded": seeded }))
    }

    fn patch(&mut self, cmd: RowPatch) -> Result<Value, RepoError> {
        let id_text = cmd.id.to_string();
        let key = format!("{}{}", cmd.key_prefix, id_text);
        if !self.is_visible(&key, &cmd.chain) {
            return Err(RepoError::not_found(&cmd.table, cmd.id));
        }

        let old = self.hashes.get(&key).cloned().unwrap_or_default();
        let changed: Hash = cmd
            .changes
            .into_iter()
            .filter(|(column, value)| old.get(column) != Some(value))
            .collect();
        if changed.is_empty() {
            return Ok(json!({ "changed": false, "fields": self.flat_row(&key) }));
        }

        for check in &cmd.parent_checks {
            if changed.contains_key(&check.field)
                && !self.is_visible(&format!("{}{}", check.key_prefix, check.id), &check.chain)
            {
                return Err(parent_not_found(check));
            }
        }

        let mut new = old.clone();
        new.extend(changed.iter().map(|(column, value)| (column.clone(), value.clone())));

        let mut releases = Vec::new();
        let mut claims = Vec::new();
        for constraint in &cmd.unique_constraints {
            let old_slot = unique_key(constraint, &old);
            let new_slot = unique_key(constraint, &new);
            if old_slot == new_slot {
                continue;
            }
            if let Some(slot) = new_slot {
                if let Some(existing) = self.strings.get(&slot)
                    && *existing != id_text
                {
                    return Err(unique_violation(&cmd.table, constraint, &new, existing));
                }
                claims.push(slot);
            }
            if let Some(slot) = old_slot
                && self.strings.get(&slot) == Some(&id_text)
            {
                releases.push(slot);
            }
        }

        for index in &cmd.indexes {
            if !changed.contains_key(&index.column) {
                continue;
            }
            if let Some(before) = parse_id(old.get(&index.column))
                && let Some(set) = self.sets.get_mut(&format!("{}{}", index.key_prefix, before))
            {
                set.remove(&cmd.id);
            }
            if let Some(after) = parse_id(changed.get(&index.column)) {
                self.sets
                    .entry(format!("{}{}", index.key_prefix, after))
                    .or_default()
                    .insert(cmd.id);
            }
        }
        for slot in releases {
            self.strings.remove(&slot);
        }
        for slot in claims {
            self.strings.insert(slot, id_text.clone());
        }

        if let Some(hash) = self.hashes.get_mut(&key) {
            hash.extend(changed);
            if let Some(updated_at) = cmd.updated_at {
                hash.insert("updated_at".to_string(), updated_at);
            }
        }

        Ok(json!({ "changed": true, "fields": self.flat_row(&key) }))
    }

    fn soft_delete(&mut self, cmd: RowSoftDelete) -> Result<Value, RepoError> {
        let id_text = cmd.id.to_string();
        let key = format!("{}{}", cmd.key_prefix, id_text);
        if !self.is_visible(&key, &cmd.chain) {
            return Err(RepoError::not_found(&cmd.table, cmd.id));
        }

        let values = self.hashes.get(&key).cloned().unwrap_or_default();
        if let Some(hash) = self.hashes.get_mut(&key) {
            hash.insert("is_deleted".to_string(), "true".to_string());
            if let Some(updated_at) = cmd.updated_at {
                hash.insert("updated_at".to_string(), updated_at);
            }
        }

        for constraint in &cmd.unique_constraints {
            if let Some(slot) = unique_key(constraint, &values)
                && self.strings.get(&slot) == Some(&id_text)
            {
                self.strings.remove(&slot);
            }
        }

        self.apply_counters(&cmd.counters, &values);

        Ok(json!({ "id": cmd.id }))
    }

    fn reconcile(&mut self, cmd: CounterReconcile) -> Result<Value, RepoError> {
        let key = format!("{}{}", cmd.key_prefix, cmd.id);
        if !self.is_visible(&key, &cmd.chain) {
            return Err(RepoError::not_found(&cmd.table, cmd.id));
        }

        let row = self.hashes.get(&key).cloned().unwrap_or_default();
        let previous = parse_id(row.get(&cmd.column));
        let current: i64 = cmd
            .sources
            .iter()
            .filter_map(|source| {
                parse_id(row.get(&source.match_column)).map(|parent| {
                    self.count_live(
                        &format!("{}{}", source.index_key_prefix, parent),
                        &source.child_key_prefix,
                    )
                })
            })
            .sum();
        if let Some(hash) = self.hashes.get_mut(&key) {
            hash.insert(cmd.column.clone(), current.to_string());
        }

        Ok(json!({ "previous": previous, "current": current }))
    }

    fn apply(&mut self, command: MutationCommand) -> Result<Value, RepoError> {
        match command {
            MutationCommand::InsertRow(cmd) => self.insert(cmd),
            MutationCommand::PatchRow(cmd) => self.patch(cmd),
            MutationCommand::SoftDeleteRow(cmd) => self.soft_delete(cmd),
            MutationCommand::ReconcileCounter(cmd) => self.reconcile(cmd),
        }
    }
}

/// In-process backend with the same key layout and command semantics as the Redis store.
///
/// Clones share state, so concurrent tasks can each hold their own handle.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    prefix: Arc<str>,
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("agora")
    }
}

impl MemoryStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: Arc::from(prefix),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }
}

impl MutationExecutor for MemoryStore {
    async fn execute(&mut self, plan: MutationPlan) -> Result<Vec<Value>, RepoError> {
        let mut state = self.state.lock().await;
        let mut responses = Vec::with_capacity(plan.commands.len());
        for command in plan.commands {
            debug!("applying {} in memory", command.name());
            responses.push(state.apply(command)?);
        }
        Ok(responses)
    }
}

impl RowReader for MemoryStore {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn fetch_row(&mut self, table: &str, id: i64) -> Result<Option<Row>, RepoError> {
        let key = KeyContext::new(&self.prefix).row(table, id);
        let state = self.state.lock().await;
        match state.hashes.get(&key) {
            Some(hash) => decode_row(hash.clone()).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_ids(&mut self, table: &str) -> Result<Vec<i64>, RepoError> {
        let key = KeyContext::new(&self.prefix).ids(table);
        Ok(self.state.lock().await.members(&key))
    }

    async fn fetch_children(&mut self, table: &str, column: &str, parent_id: i64) -> Result<Vec<i64>, RepoError> {
        let key = KeyContext::new(&self.prefix).reverse_index(table, column, parent_id);
        Ok(self.state.lock().await.members(&key))
    }
}
