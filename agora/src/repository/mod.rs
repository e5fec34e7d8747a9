mod counters;
mod list;

use std::marker::PhantomData;

use chrono::{SecondsFormat, Utc};
use log::debug;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    auth::{self, Principal},
    credentials,
    errors::{Action, RepoError, ValidationError, ValidationIssue, ValidationResult},
    keys::KeyContext,
    registry,
    runtime::{
        MutationExecutor, Row, RowReader, Store,
        commands::{
            MutationCommand, MutationPlan, ParentCheck, RowInsert, RowPatch, RowSoftDelete, build_counter_seeds,
            build_counter_updates, build_index_updates, build_parent_check, build_unique_constraint_checks,
            visibility_steps,
        },
        decode_flat_row,
    },
    types::{ColumnDescriptor, ColumnRole, ColumnType, Entity, Mutability, TableDescriptor},
    validators::validate_column_value,
    visibility,
};

pub use counters::{CounterReport, check_table_counters, reconcile_table_counters};

pub trait MutationPayloadBuilder {
    type Entity: Entity;

    fn into_payload(self) -> ValidationResult<MutationPayload>;
}

pub trait UpdatePatchBuilder {
    type Entity: Entity;

    fn into_patch(self) -> ValidationResult<MutationPatch>;
}

fn object_fields(value: Value) -> ValidationResult<Row> {
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(ValidationError::single(
            "payload",
            "payload.not_object",
            "payload must be a JSON object",
        )),
    }
}

fn serialize_fields<S: Serialize>(input: &S) -> ValidationResult<Row> {
    let value = serde_json::to_value(input)
        .map_err(|err| ValidationError::single("payload", "payload.serialize", err.to_string()))?;
    object_fields(value)
}

/// Column values supplied for a new row.
#[derive(Debug, Clone, Default)]
pub struct MutationPayload {
    pub fields: Row,
}

impl MutationPayload {
    pub fn from_serialize<S: Serialize>(input: &S) -> ValidationResult<Self> {
        serialize_fields(input).map(|fields| Self { fields })
    }

    pub fn from_json(value: Value) -> ValidationResult<Self> {
        object_fields(value).map(|fields| Self { fields })
    }
}

/// Column assignments for an existing row. Absent columns are left alone.
#[derive(Debug, Clone, Default)]
pub struct MutationPatch {
    pub fields: Row,
}

impl MutationPatch {
    pub fn from_serialize<S: Serialize>(input: &S) -> ValidationResult<Self> {
        serialize_fields(input).map(|fields| Self { fields })
    }

    pub fn from_json(value: Value) -> ValidationResult<Self> {
        object_fields(value).map(|fields| Self { fields })
    }
}

pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_entity<T: DeserializeOwned>(row: Row) -> Result<T, RepoError> {
    serde_json::from_value(Value::Object(row)).map_err(|err| RepoError::Other {
        message: format!("failed to deserialize row: {err}").into(),
    })
}

fn encode_fields<'a>(fields: impl IntoIterator<Item = (&'a String, &'a Value)>) -> Vec<(String, String)> {
    fields
        .into_iter()
        .map(|(column, value)| (column.clone(), value.to_string()))
        .collect()
}

fn default_value(column: &ColumnDescriptor) -> Value {
    match column.column_type {
        ColumnType::Roles => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn hash_passwords(table: &TableDescriptor, row: &mut Row) -> Result<(), RepoError> {
    for column in table.columns {
        if column.column_type != ColumnType::Password {
            continue;
        }
        if let Some(Value::String(plain)) = row.get(column.name) {
            let hashed = credentials::hash_password(plain)?;
            row.insert(column.name.to_string(), Value::String(hashed));
        }
    }
    Ok(())
}

/// Parent checks for every relation column of `fields` holding an id.
fn parent_checks(keys: &KeyContext<'_>, table: &TableDescriptor, fields: &Row) -> Result<Vec<ParentCheck>, RepoError> {
    let mut checks = Vec::new();
    for relation in table.relations {
        let Some(parent_id) = fields.get(relation.column).and_then(Value::as_i64) else {
            continue;
        };
        let parent = registry::get_descriptor(relation.target).ok_or_else(|| RepoError::Other {
            message: format!("unknown table {}", relation.target).into(),
        })?;
        checks.push(build_parent_check(keys, relation.column, parent, parent_id));
    }
    Ok(checks)
}

fn first_response(responses: Vec<Value>) -> Result<Value, RepoError> {
    responses.into_iter().next().ok_or_else(|| RepoError::Other {
        message: "store returned no response".into(),
    })
}

/// Typed access to one table. Every write runs as a single atomic command.
pub struct Repo<T>
where
    T: Entity,
{
    _marker: PhantomData<T>,
}

impl<T> Default for Repo<T>
where
    T: Entity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Repo<T>
where
    T: Entity,
{
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }

    pub fn descriptor(&self) -> &'static TableDescriptor {
        T::descriptor()
    }

    pub async fn execute<E>(&self, executor: &mut E, plan: MutationPlan) -> Result<Vec<Value>, RepoError>
    where
        E: MutationExecutor + ?Sized,
    {
        executor.execute(plan).await
    }

    async fn load_visible<S>(&self, store: &mut S, id: i64) -> Result<Row, RepoError>
    where
        S: RowReader + ?Sized,
    {
        let table = self.descriptor();
        visibility::fetch_visible(store, table, id)
            .await?
            .ok_or_else(|| RepoError::not_found(table.name, id))
    }

    pub async fn create<S, B>(&self, store: &mut S, principal: &Principal, builder: B) -> Result<T, RepoError>
    where
        S: Store + ?Sized,
        B: MutationPayloadBuilder<Entity = T>,
    {
        let payload = builder.into_payload()?;
        self.create_row(store, principal, payload.fields).await
    }

    /// Creates a row from an untyped JSON object.
    pub async fn create_json<S>(&self, store: &mut S, principal: &Principal, payload: Value) -> Result<T, RepoError>
    where
        S: Store + ?Sized,
    {
        let payload = MutationPayload::from_json(payload)?;
        self.create_row(store, principal, payload.fields).await
    }

    async fn create_row<S>(&self, store: &mut S, principal: &Principal, input: Row) -> Result<T, RepoError>
    where
        S: Store + ?Sized,
    {
        let table = self.descriptor();

        let mut issues = Vec::new();
        for (name, value) in &input {
            match table.column(name) {
                None => issues.push(ValidationIssue::new(
                    name,
                    "payload.unknown_field",
                    format!("field `{name}` is not defined on {}", table.name),
                )),
                Some(column) if column.role != ColumnRole::Data || Some(column.name) == table.actor_column => {
                    issues.push(ValidationIssue::new(
                        name,
                        "payload.managed_field",
                        "field is maintained by the store",
                    ));
                }
                Some(column)
                    if column.mutability == Mutability::AdminOnly
                        && !principal.is_admin()
                        && !is_empty_value(value) =>
                {
                    return Err(RepoError::forbidden(Action::Create, table.name));
                }
                Some(_) => {}
            }
        }
        if !issues.is_empty() {
            return Err(ValidationError::new(issues).into());
        }

        let now = timestamp_now();
        let mut row = Row::new();
        for column in table.columns {
            let value = match column.role {
                ColumnRole::Id => continue,
                ColumnRole::CreatedAt => Value::String(now.clone()),
                ColumnRole::UpdatedAt => Value::Null,
                ColumnRole::SoftDelete => Value::Bool(false),
                ColumnRole::Counter => Value::from(0),
                ColumnRole::Data if Some(column.name) == table.actor_column => match principal.user_id() {
                    Some(user_id) => Value::from(user_id),
                    None => return Err(RepoError::forbidden(Action::Create, table.name)),
                },
                ColumnRole::Data => input
                    .get(column.name)
                    .cloned()
                    .unwrap_or_else(|| default_value(column)),
            };
            row.insert(column.name.to_string(), value);
        }

        let issues: Vec<ValidationIssue> = table
            .writable_columns()
            .flat_map(|column| validate_column_value(column, row.get(column.name).unwrap_or(&Value::Null)))
            .collect();
        if !issues.is_empty() {
            return Err(ValidationError::new(issues).into());
        }

        auth::authorize_create(store, principal, table, &row).await?;
        hash_passwords(table, &mut row)?;

        let prefix = store.prefix().to_string();
        let keys = KeyContext::new(&prefix);
        let insert = RowInsert {
            table: table.name.to_string(),
            key_prefix: keys.row_prefix(table.name),
            sequence_key: keys.sequence(table.name),
            ids_key: keys.ids(table.name),
            fields: encode_fields(&row),
            parent_checks: parent_checks(&keys, table, &row)?,
            unique_constraints: build_unique_constraint_checks(&keys, table, table.unique_constraints),
            indexes: build_index_updates(&keys, table),
            counters: build_counter_updates(&keys, table, 1),
            seeds: build_counter_seeds(&keys, table),
        };
        let mut plan = MutationPlan::new();
        plan.push(MutationCommand::InsertRow(insert));
        let response = first_response(self.execute(store, plan).await?)?;

        let id = response.get("id").and_then(Value::as_i64).ok_or_else(|| RepoError::Other {
            message: "insert response carried no id".into(),
        })?;
        if let Some(seeded) = response.get("seeded").and_then(Value::as_object) {
            for (column, total) in seeded {
                row.insert(column.clone(), total.clone());
            }
        }
        row.insert("id".to_string(), Value::from(id));
        debug!("created {} {}", table.name, id);
        decode_entity(row)
    }

    /// Reads a visible row. Deleted rows and rows under a deleted parent are `NotFound`.
    pub async fn get<S>(&self, store: &mut S, principal: &Principal, id: i64) -> Result<T, RepoError>
    where
        S: RowReader + ?Sized,
    {
        let table = self.descriptor();
        let row = self.load_visible(store, id).await?;
        if !auth::can_read(store, principal, table, &row).await? {
            return Err(RepoError::forbidden(Action::Read, table.name));
        }
        decode_entity(row)
    }

    pub async fn update<S, B>(&self, store: &mut S, principal: &Principal, id: i64, builder: B) -> Result<T, RepoError>
    where
        S: Store + ?Sized,
        B: UpdatePatchBuilder<Entity = T>,
    {
        let patch = builder.into_patch()?;
        self.update_row(store, principal, id, patch.fields).await
    }

    /// Applies an untyped JSON patch.
    pub async fn update_json<S>(&self, store: &mut S, principal: &Principal, id: i64, patch: Value) -> Result<T, RepoError>
    where
        S: Store + ?Sized,
    {
        let patch = MutationPatch::from_json(patch)?;
        self.update_row(store, principal, id, patch.fields).await
    }

    async fn update_row<S>(&self, store: &mut S, principal: &Principal, id: i64, mut changes: Row) -> Result<T, RepoError>
    where
        S: Store + ?Sized,
    {
        let table = self.descriptor();
        let current = self.load_visible(store, id).await?;
        auth::authorize_write(store, principal, table, &current, Action::Update).await?;

        let mut issues = Vec::new();
        for (name, value) in &changes {
            let Some(column) = table.column(name) else {
                issues.push(ValidationIssue::new(
                    name,
                    "patch.unknown_field",
                    format!("field `{name}` is not defined on {}", table.name),
                ));
                continue;
            };
            if column.role != ColumnRole::Data
                || column.mutability == Mutability::Immutable
                || Some(column.name) == table.actor_column
            {
                issues.push(ValidationIssue::new(name, "patch.immutable_field", "field cannot be changed"));
                continue;
            }
            if column.mutability == Mutability::AdminOnly && !principal.is_admin() {
                return Err(RepoError::forbidden(Action::Update, table.name));
            }
            issues.extend(validate_column_value(column, value));
        }
        if !issues.is_empty() {
            return Err(ValidationError::new(issues).into());
        }
        if changes.is_empty() {
            return decode_entity(current);
        }
        hash_passwords(table, &mut changes)?;

        let prefix = store.prefix().to_string();
        let keys = KeyContext::new(&prefix);
        let patch = RowPatch {
            table: table.name.to_string(),
            key_prefix: keys.row_prefix(table.name),
            id,
            chain: visibility_steps(&keys, &registry::visibility_chain(table)),
            changes: encode_fields(&changes),
            updated_at: table.has_timestamps().then(timestamp_now),
            parent_checks: parent_checks(&keys, table, &changes)?,
            unique_constraints: build_unique_constraint_checks(&keys, table, table.unique_constraints),
            indexes: build_index_updates(&keys, table),
        };
        let mut plan = MutationPlan::new();
        plan.push(MutationCommand::PatchRow(patch));
        let response = first_response(self.execute(store, plan).await?)?;

        let changed = response.get("changed").and_then(Value::as_bool).unwrap_or(false);
        debug!("patched {} {} (changed: {changed})", table.name, id);
        let fields = response.get("fields").and_then(Value::as_array).ok_or_else(|| RepoError::Other {
            message: "patch response carried no row".into(),
        })?;
        decode_entity(decode_flat_row(fields)?)
    }

    /// Soft-deletes a row: it stays stored but disappears from reads, lists and counters.
    pub async fn delete<S>(&self, store: &mut S, principal: &Principal, id: i64) -> Result<(), RepoError>
    where
        S: Store + ?Sized,
    {
        let table = self.descriptor();
        let current = self.load_visible(store, id).await?;
        auth::authorize_write(store, principal, table, &current, Action::Delete).await?;

        let prefix = store.prefix().to_string();
        let keys = KeyContext::new(&prefix);
        let delete = RowSoftDelete {
            table: table.name.to_string(),
            key_prefix: keys.row_prefix(table.name),
            id,
            chain: visibility_steps(&keys, &registry::visibility_chain(table)),
            updated_at: table.has_timestamps().then(timestamp_now),
            unique_constraints: build_unique_constraint_checks(&keys, table, table.unique_constraints),
            counters: build_counter_updates(&keys, table, -1),
        };
        let mut plan = MutationPlan::new();
        plan.push(MutationCommand::SoftDeleteRow(delete));
        self.execute(store, plan).await?;
        debug!("soft-deleted {} {}", table.name, id);
        Ok(())
    }
}
