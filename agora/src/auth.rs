//! Acting principals and the per-table authorization rules.

use serde_json::Value;

use crate::{
    errors::{Action, RepoError},
    registry,
    runtime::{Row, RowReader},
    schema::{ROLE_ADMIN, ROLE_USER},
    types::{CreateRule, OwnerRule, ParticipantRule, ReadRule, TableDescriptor, WriteRule},
    visibility,
};

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: Option<i64>,
    roles: Vec<String>,
}

impl Principal {
    pub fn new(user_id: Option<i64>, roles: Vec<String>) -> Self {
        Self { user_id, roles }
    }

    /// Unauthenticated caller. May only register users and read public rows.
    pub fn anonymous() -> Self {
        Self::new(None, Vec::new())
    }

    pub fn user(user_id: i64) -> Self {
        Self::new(Some(user_id), vec![ROLE_USER.to_string()])
    }

    pub fn admin(user_id: i64) -> Self {
        Self::new(Some(user_id), vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()])
    }

    /// Maintenance administrator with no backing user row (CLI, fixtures).
    ///
    /// It passes every admin check but cannot author rows: creating into a table with an
    /// actor column (including admin-managed ones such as `country`) is `Forbidden`, since
    /// there is no user to record. Use [`Principal::admin`] for that.
    pub fn system() -> Self {
        Self::new(None, vec![ROLE_ADMIN.to_string()])
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ROLE_ADMIN)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some() || self.is_admin()
    }

    fn is_user(&self, user_id: Option<i64>) -> bool {
        self.user_id.is_some() && self.user_id == user_id
    }
}

pub(crate) fn column_id(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}

/// Id of the user who owns `row`.
pub async fn resolve_owner<S>(store: &mut S, table: &TableDescriptor, row: &Row) -> Result<Option<i64>, RepoError>
where
    S: RowReader + ?Sized,
{
    match table.access.owner {
        OwnerRule::SelfRow => Ok(column_id(row, "id")),
        OwnerRule::Column(column) => Ok(column_id(row, column)),
        OwnerRule::Via {
            column,
            table: parent_table,
            owner_column,
        } => {
            let Some(parent_id) = column_id(row, column) else {
                return Ok(None);
            };
            let parent = store.fetch_row(parent_table, parent_id).await?;
            Ok(parent.and_then(|parent| column_id(&parent, owner_column)))
        }
    }
}

/// Loads the visible parent referenced by `column` of `row`, or fails with `ParentNotFound`.
async fn visible_parent<S>(store: &mut S, table: &TableDescriptor, column: &str, row: &Row) -> Result<Row, RepoError>
where
    S: RowReader + ?Sized,
{
    let relation = table.relation(column).ok_or_else(|| RepoError::Other {
        message: format!("{}.{column} is not a relation", table.name).into(),
    })?;
    let parent_table = registry::get_descriptor(relation.target).ok_or_else(|| RepoError::Other {
        message: format!("unknown table {}", relation.target).into(),
    })?;
    let parent_id = column_id(row, column).unwrap_or_default();
    visibility::fetch_visible(store, parent_table, parent_id)
        .await?
        .ok_or_else(|| RepoError::ParentNotFound {
            field: column.to_string(),
            table: parent_table.name.to_string(),
            id: parent_id,
        })
}

async fn is_participant<S>(
    store: &mut S,
    principal: &Principal,
    table: &TableDescriptor,
    rule: &ParticipantRule,
    row: &Row,
) -> Result<bool, RepoError>
where
    S: RowReader + ?Sized,
{
    let parent = visible_parent(store, table, rule.via, row).await?;
    Ok(rule
        .columns
        .iter()
        .any(|column| principal.is_user(column_id(&parent, column))))
}

/// Whether `principal` may see `row`. Visibility is checked separately.
pub async fn can_read<S>(store: &mut S, principal: &Principal, table: &TableDescriptor, row: &Row) -> Result<bool, RepoError>
where
    S: RowReader + ?Sized,
{
    if principal.is_admin() {
        return Ok(true);
    }
    match table.access.read {
        ReadRule::Public => Ok(true),
        ReadRule::OwnerOrAdmin => Ok(principal.is_user(resolve_owner(store, table, row).await?)),
        ReadRule::Participant(rule) => is_participant(store, principal, table, &rule, row).await,
        ReadRule::RecipientOrBroadcast { column } => match row.get(column) {
            None | Some(Value::Null) => Ok(true),
            Some(recipient) => Ok(principal.is_user(recipient.as_i64())),
        },
    }
}

pub fn authorize_list(principal: &Principal, table: &TableDescriptor) -> Result<(), RepoError> {
    if table.access.list_admin_only && !principal.is_admin() {
        return Err(RepoError::forbidden(Action::List, table.name));
    }
    Ok(())
}

/// Checks the create rule against the fields about to be inserted.
pub async fn authorize_create<S>(
    store: &mut S,
    principal: &Principal,
    table: &TableDescriptor,
    fields: &Row,
) -> Result<(), RepoError>
where
    S: RowReader + ?Sized,
{
    let allowed = match table.access.create {
        CreateRule::Open => true,
        CreateRule::Authenticated => principal.is_authenticated(),
        CreateRule::AdminOnly => principal.is_admin(),
        CreateRule::ParentOwner { column } => {
            let parent = visible_parent(store, table, column, fields).await?;
            if principal.is_admin() {
                true
            } else {
                let parent_table = table
                    .relation(column)
                    .and_then(|relation| registry::get_descriptor(relation.target));
                match parent_table {
                    Some(parent_table) => principal.is_user(resolve_owner(store, parent_table, &parent).await?),
                    None => false,
                }
            }
        }
        CreateRule::Participant(rule) => {
            let participant = is_participant(store, principal, table, &rule, fields).await?;
            principal.is_admin() || participant
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(RepoError::forbidden(Action::Create, table.name))
    }
}

/// Checks update/delete rights on an existing row.
pub async fn authorize_write<S>(
    store: &mut S,
    principal: &Principal,
    table: &TableDescriptor,
    row: &Row,
    action: Action,
) -> Result<(), RepoError>
where
    S: RowReader + ?Sized,
{
    if principal.is_admin() {
        return Ok(());
    }
    let allowed = match table.access.write {
        WriteRule::AdminOnly => false,
        WriteRule::OwnerOrAdmin => principal.is_user(resolve_owner(store, table, row).await?),
    };
    if allowed {
        Ok(())
    } else {
        Err(RepoError::forbidden(action, table.name))
    }
}
