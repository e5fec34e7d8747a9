use std::{borrow::Cow, collections::HashMap};

use log::debug;
use redis::{aio::ConnectionLike, cmd};
use serde_json::Value;

use crate::{
    errors::RepoError,
    keys::KeyContext,
    runtime::{
        MutationExecutor, Row, RowReader,
        commands::{MutationCommand, MutationPlan},
        decode_row, display_encoded,
        scripts::{COUNTER_RECONCILE_SCRIPT, ROW_INSERT_SCRIPT, ROW_PATCH_SCRIPT, ROW_SOFT_DELETE_SCRIPT},
    },
};

fn string_field(value: &Value, name: &str) -> String {
    value.get(name).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn id_field(value: &Value, name: &str) -> i64 {
    value.get(name).and_then(Value::as_i64).unwrap_or_default()
}

/// Maps an `{"error": ...}` script reply onto a `RepoError`.
fn script_error(value: &Value) -> Option<RepoError> {
    let error = value.get("error")?;
    let Some(code) = error.as_str() else {
        return Some(RepoError::Other {
            message: Cow::Borrowed("lua_error"),
        });
    };
    let err = match code {
        "row_not_found" => RepoError::NotFound {
            table: string_field(value, "table"),
            id: id_field(value, "id"),
        },
        "parent_not_found" => RepoError::ParentNotFound {
            field: string_field(value, "field"),
            table: string_field(value, "table"),
            id: id_field(value, "id"),
        },
        "unique_constraint_violation" => {
            let fields = value
                .get("fields")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            let values = value
                .get("values")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(Value::as_str).map(display_encoded).collect())
                .unwrap_or_default();
            RepoError::UniqueConstraintViolation {
                table: string_field(value, "table"),
                fields,
                values,
                existing_id: id_field(value, "existing_id"),
            }
        }
        other => RepoError::Other {
            message: Cow::Owned(other.to_string()),
        },
    };
    Some(err)
}

pub async fn execute_plan<C>(conn: &mut C, plan: &MutationPlan) -> Result<Vec<Value>, RepoError>
where
    C: ConnectionLike + Send,
{
    let mut responses = Vec::with_capacity(plan.commands.len());

    for command in &plan.commands {
        let script = match command {
            MutationCommand::InsertRow(_) => &*ROW_INSERT_SCRIPT,
            MutationCommand::PatchRow(_) => &*ROW_PATCH_SCRIPT,
            MutationCommand::SoftDeleteRow(_) => &*ROW_SOFT_DELETE_SCRIPT,
            MutationCommand::ReconcileCounter(_) => &*COUNTER_RECONCILE_SCRIPT,
        };

        let payload = serde_json::to_string(command).map_err(|err| RepoError::Other {
            message: Cow::Owned(format!("failed to serialize command: {err}")),
        })?;
        debug!("executing {} script ({} bytes)", command.name(), payload.len());

        let mut invocation = script.prepare_invoke();
        invocation.arg(payload);
        let raw: String = invocation.invoke_async(conn).await.map_err(RepoError::from)?;

        let value: Value = serde_json::from_str(&raw).map_err(|err| RepoError::Other {
            message: Cow::Owned(format!("failed to parse lua response: {err}")),
        })?;

        if let Some(err) = script_error(&value) {
            return Err(err);
        }

        responses.push(value);
    }

    Ok(responses)
}

/// Redis backend. Rows live in hashes; every mutation runs as one Lua script.
#[derive(Clone)]
pub struct RedisStore<C>
where
    C: ConnectionLike + Send,
{
    connection: C,
    prefix: String,
}

impl<C> RedisStore<C>
where
    C: ConnectionLike + Send,
{
    pub fn new(connection: C, prefix: impl Into<String>) -> Self {
        Self {
            connection,
            prefix: prefix.into(),
        }
    }

    pub fn connection(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Deletes every key under this store's prefix. Used to reset test namespaces.
    pub async fn clear(&mut self) -> Result<u64, RepoError> {
        const SCAN_COUNT: usize = 1000;
        let pattern = KeyContext::new(&self.prefix).pattern();
        let mut cursor: u64 = 0;
        let mut total_deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut self.connection)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = cmd("DEL").arg(&keys).query_async(&mut self.connection).await?;
                total_deleted += deleted;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(total_deleted)
    }
}

impl<C> MutationExecutor for RedisStore<C>
where
    C: ConnectionLike + Send,
{
    async fn execute(&mut self, plan: MutationPlan) -> Result<Vec<Value>, RepoError> {
        execute_plan(&mut self.connection, &plan).await
    }
}

fn parse_ids(members: Vec<String>) -> Vec<i64> {
    let mut ids: Vec<i64> = members.iter().filter_map(|member| member.parse().ok()).collect();
    ids.sort_unstable();
    ids
}

impl<C> RowReader for RedisStore<C>
where
    C: ConnectionLike + Send,
{
    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn fetch_row(&mut self, table: &str, id: i64) -> Result<Option<Row>, RepoError> {
        let key = KeyContext::new(&self.prefix).row(table, id);
        let fields: HashMap<String, String> = cmd("HGETALL").arg(&key).query_async(&mut self.connection).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        decode_row(fields).map(Some)
    }

    async fn fetch_ids(&mut self, table: &str) -> Result<Vec<i64>, RepoError> {
        let key = KeyContext::new(&self.prefix).ids(table);
        let members: Vec<String> = cmd("ZRANGE")
            .arg(&key)
            .arg(0)
            .arg(-1)
            .query_async(&mut self.connection)
            .await?;
        Ok(parse_ids(members))
    }

    async fn fetch_children(&mut self, table: &str, column: &str, parent_id: i64) -> Result<Vec<i64>, RepoError> {
        let key = KeyContext::new(&self.prefix).reverse_index(table, column, parent_id);
        let members: Vec<String> = cmd("SMEMBERS").arg(&key).query_async(&mut self.connection).await?;
        Ok(parse_ids(members))
    }
}
