use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::{
    auth::Principal,
    errors::{Action, RepoError},
    keys::KeyContext,
    registry::{self, CounterSource},
    runtime::{
        MutationExecutor, RowReader, Store,
        commands::{CounterReconcile, MutationCommand, MutationPlan, build_counter_source, visibility_steps},
    },
    types::{Entity, TableDescriptor},
    visibility,
};

use super::Repo;

/// Stored versus recomputed value of one counter column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterReport {
    pub table: &'static str,
    pub id: i64,
    pub column: &'static str,
    /// Stored value before reconciliation. `None` for a NULL counter.
    pub previous: Option<i64>,
    /// Number of live child rows.
    pub current: i64,
}

impl CounterReport {
    /// A NULL counter with no children is not drift.
    pub fn drifted(&self) -> bool {
        self.previous.unwrap_or(0) != self.current
    }
}

/// Counter columns of `table`, each with the child tables feeding it.
fn counter_columns(table: &TableDescriptor) -> Vec<(&'static str, Vec<CounterSource>)> {
    let mut columns: Vec<(&'static str, Vec<CounterSource>)> = Vec::new();
    for source in registry::find_counter_sources(table.name) {
        match columns
            .iter_mut()
            .find(|(column, _)| *column == source.cache.counter_column)
        {
            Some((_, sources)) => sources.push(source),
            None => columns.push((source.cache.counter_column, vec![source])),
        }
    }
    columns
}

fn require_admin(principal: &Principal, action: Action, table: &TableDescriptor) -> Result<(), RepoError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(RepoError::forbidden(action, table.name))
    }
}

fn log_drift(reports: &[CounterReport]) {
    for report in reports.iter().filter(|report| report.drifted()) {
        warn!(
            "{}.{} on row {} drifted: stored {:?}, live children {}",
            report.table, report.column, report.id, report.previous, report.current
        );
    }
}

async fn count_live_children<S>(store: &mut S, source: &CounterSource, parent_key: i64) -> Result<i64, RepoError>
where
    S: RowReader + ?Sized,
{
    let mut total = 0;
    for child_id in store
        .fetch_children(source.child_table, source.cache.source_column, parent_key)
        .await?
    {
        if let Some(child) = store.fetch_row(source.child_table, child_id).await?
            && visibility::is_live(&child)
        {
            total += 1;
        }
    }
    Ok(total)
}

/// Read-only drift check for one row.
async fn check_row<S>(store: &mut S, table: &'static TableDescriptor, id: i64) -> Result<Vec<CounterReport>, RepoError>
where
    S: RowReader + ?Sized,
{
    let row = visibility::fetch_visible(store, table, id)
        .await?
        .ok_or_else(|| RepoError::not_found(table.name, id))?;
    let mut reports = Vec::new();
    for (column, sources) in counter_columns(table) {
        let mut current = 0;
        for source in &sources {
            if let Some(parent_key) = row.get(source.cache.match_column).and_then(Value::as_i64) {
                current += count_live_children(store, source, parent_key).await?;
            }
        }
        reports.push(CounterReport {
            table: table.name,
            id,
            column,
            previous: row.get(column).and_then(Value::as_i64),
            current,
        });
    }
    Ok(reports)
}

/// Recomputes every counter of one row, one atomic command per column.
async fn reconcile_row<S>(store: &mut S, table: &'static TableDescriptor, id: i64) -> Result<Vec<CounterReport>, RepoError>
where
    S: Store + ?Sized,
{
    let columns = counter_columns(table);
    if columns.is_empty() {
        return Ok(Vec::new());
    }
    let prefix = store.prefix().to_string();
    let keys = KeyContext::new(&prefix);
    let chain = visibility_steps(&keys, &registry::visibility_chain(table));

    let mut plan = MutationPlan::new();
    for (column, sources) in &columns {
        plan.push(MutationCommand::ReconcileCounter(CounterReconcile {
            table: table.name.to_string(),
            key_prefix: keys.row_prefix(table.name),
            id,
            chain: chain.clone(),
            column: column.to_string(),
            sources: sources
                .iter()
                .map(|source| build_counter_source(&keys, source.child_table, source.cache))
                .collect(),
        }));
    }
    let responses = store.execute(plan).await?;

    let reports: Vec<CounterReport> = columns
        .iter()
        .zip(responses)
        .map(|((column, _), response)| CounterReport {
            table: table.name,
            id,
            column: *column,
            previous: response.get("previous").and_then(Value::as_i64),
            current: response.get("current").and_then(Value::as_i64).unwrap_or_default(),
        })
        .collect();
    log_drift(&reports);
    Ok(reports)
}

/// Checks every live row of `table`. Administrators only.
pub async fn check_table_counters<S>(
    store: &mut S,
    principal: &Principal,
    table: &'static TableDescriptor,
) -> Result<Vec<CounterReport>, RepoError>
where
    S: RowReader + ?Sized,
{
    require_admin(principal, Action::Read, table)?;
    if counter_columns(table).is_empty() {
        return Ok(Vec::new());
    }
    let mut reports = Vec::new();
    for id in store.fetch_ids(table.name).await? {
        match check_row(store, table, id).await {
            Ok(row_reports) => reports.extend(row_reports),
            Err(RepoError::NotFound { .. }) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(reports)
}

/// Reconciles every live row of `table`. Administrators only.
pub async fn reconcile_table_counters<S>(
    store: &mut S,
    principal: &Principal,
    table: &'static TableDescriptor,
) -> Result<Vec<CounterReport>, RepoError>
where
    S: Store + ?Sized,
{
    require_admin(principal, Action::Update, table)?;
    if counter_columns(table).is_empty() {
        return Ok(Vec::new());
    }
    let mut reports = Vec::new();
    for id in store.fetch_ids(table.name).await? {
        match reconcile_row(store, table, id).await {
            Ok(row_reports) => reports.extend(row_reports),
            Err(RepoError::NotFound { .. }) => continue,
            Err(err) => return Err(err),
        }
    }
    let drifted = reports.iter().filter(|report| report.drifted()).count();
    info!("reconciled {} counters on {} ({drifted} drifted)", reports.len(), table.name);
    Ok(reports)
}

impl<T> Repo<T>
where
    T: Entity,
{
    /// Compares the stored counters of one row against its live children without writing.
    pub async fn counter_drift<S>(&self, store: &mut S, principal: &Principal, id: i64) -> Result<Vec<CounterReport>, RepoError>
    where
        S: RowReader + ?Sized,
    {
        let table = self.descriptor();
        require_admin(principal, Action::Read, table)?;
        check_row(store, table, id).await
    }

    pub async fn reconcile_counters<S>(
        &self,
        store: &mut S,
        principal: &Principal,
        id: i64,
    ) -> Result<Vec<CounterReport>, RepoError>
    where
        S: Store + ?Sized,
    {
        let table = self.descriptor();
        require_admin(principal, Action::Update, table)?;
        reconcile_row(store, table, id).await
    }

    pub async fn reconcile_all<S>(&self, store: &mut S, principal: &Principal) -> Result<Vec<CounterReport>, RepoError>
    where
        S: Store + ?Sized,
    {
        reconcile_table_counters(store, principal, self.descriptor()).await
    }
}
