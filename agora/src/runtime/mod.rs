pub mod commands;
pub mod executor;
pub mod memory;
pub mod scripts;

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::errors::RepoError;

pub use commands::{MutationCommand, MutationPlan};
pub use executor::{RedisStore, execute_plan};
pub use memory::MemoryStore;

/// A stored row: column name to decoded value.
pub type Row = Map<String, Value>;

/// Applies mutation plans atomically, one command at a time.
#[allow(async_fn_in_trait)]
pub trait MutationExecutor {
    async fn execute(&mut self, plan: MutationPlan) -> Result<Vec<Value>, RepoError>;
}

/// Raw row access, including soft-deleted rows.
#[allow(async_fn_in_trait)]
pub trait RowReader {
    /// Key prefix this store's rows live under.
    fn prefix(&self) -> &str;

    async fn fetch_row(&mut self, table: &str, id: i64) -> Result<Option<Row>, RepoError>;

    /// Every id ever assigned in `table`, ascending.
    async fn fetch_ids(&mut self, table: &str) -> Result<Vec<i64>, RepoError>;

    /// Ids of `table` rows whose `column` references `parent_id`, ascending.
    async fn fetch_children(&mut self, table: &str, column: &str, parent_id: i64) -> Result<Vec<i64>, RepoError>;
}

/// A complete storage backend.
pub trait Store: MutationExecutor + RowReader {}

impl<T> Store for T where T: MutationExecutor + RowReader {}

/// Decodes a row hash whose values are JSON-encoded column values.
pub(crate) fn decode_row<I>(fields: I) -> Result<Row, RepoError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut row = Map::new();
    for (column, raw) in fields {
        let value = serde_json::from_str(&raw).map_err(|err| RepoError::Other {
            message: format!("failed to decode column {column}: {err}").into(),
        })?;
        row.insert(column, value);
    }
    Ok(row)
}

/// Decodes the flat `[column, json, column, json, ...]` list returned by the patch command.
pub(crate) fn decode_flat_row(flat: &[Value]) -> Result<Row, RepoError> {
    let mut pairs = HashMap::with_capacity(flat.len() / 2);
    for chunk in flat.chunks(2) {
        if let [Value::String(column), Value::String(raw)] = chunk {
            pairs.insert(column.clone(), raw.clone());
        } else {
            return Err(RepoError::Other {
                message: "malformed row in store response".into(),
            });
        }
    }
    decode_row(pairs)
}

/// Human-readable form of a stored value for error messages.
pub(crate) fn display_encoded(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(text)) => text,
        Ok(other) => other.to_string(),
        Err(_) => raw.to_string(),
    }
}
