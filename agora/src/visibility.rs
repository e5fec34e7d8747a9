//! A row is visible when it is live and every aggregate parent above it is visible.

use serde_json::Value;

use crate::{
    errors::RepoError,
    registry,
    runtime::{Row, RowReader},
    types::TableDescriptor,
};

pub fn is_live(row: &Row) -> bool {
    row.get("is_deleted").and_then(Value::as_bool) == Some(false)
}

pub async fn is_visible<S>(store: &mut S, table: &TableDescriptor, row: &Row) -> Result<bool, RepoError>
where
    S: RowReader + ?Sized,
{
    if !is_live(row) {
        return Ok(false);
    }
    let mut current = row.clone();
    for hop in registry::visibility_chain(table) {
        let Some(parent_id) = current.get(hop.column).and_then(Value::as_i64) else {
            return Ok(false);
        };
        match store.fetch_row(hop.table, parent_id).await? {
            Some(parent) if is_live(&parent) => current = parent,
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Fetches a row only if it is visible.
pub async fn fetch_visible<S>(store: &mut S, table: &TableDescriptor, id: i64) -> Result<Option<Row>, RepoError>
where
    S: RowReader + ?Sized,
{
    let Some(row) = store.fetch_row(table.name, id).await? else {
        return Ok(None);
    };
    if is_visible(store, table, &row).await? {
        Ok(Some(row))
    } else {
        Ok(None)
    }
}
