use crate::{
    auth::{self, Principal},
    errors::RepoError,
    query::{ListParams, ListQuery, ListResult},
    runtime::RowReader,
    types::Entity,
    visibility,
};

use super::{Repo, decode_entity};

impl<T> Repo<T>
where
    T: Entity,
{
    /// Lists visible rows the principal may read, filtered, sorted and paged.
    ///
    /// An equality filter on a single foreign-key id is answered from the reverse index
    /// instead of scanning the whole table.
    pub async fn list<S>(&self, store: &mut S, principal: &Principal, params: &ListParams) -> Result<ListResult<T>, RepoError>
    where
        S: RowReader + ?Sized,
    {
        let table = self.descriptor();
        auth::authorize_list(principal, table)?;
        if table.column(&params.sort.column).is_none() {
            return Err(RepoError::InvalidRequest {
                message: format!("Unsupported sort field: {}", params.sort.column),
            });
        }

        let indexed = params
            .conditions
            .iter()
            .filter(|condition| table.relation(condition.column()).is_some())
            .find_map(|condition| condition.single_id().map(|id| (condition.column().to_string(), id)));
        let candidates = match indexed {
            Some((column, parent_id)) => store.fetch_children(table.name, &column, parent_id).await?,
            None => store.fetch_ids(table.name).await?,
        };

        let mut rows = Vec::new();
        for id in candidates {
            let Some(row) = store.fetch_row(table.name, id).await? else {
                continue;
            };
            if !params.matches(&row) || !visibility::is_visible(store, table, &row).await? {
                continue;
            }
            if !auth::can_read(store, principal, table, &row).await? {
                continue;
            }
            rows.push(row);
        }
        rows.sort_by(|left, right| params.compare(left, right));

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(usize::try_from(params.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(params.page_size).unwrap_or(usize::MAX))
            .map(decode_entity)
            .collect::<Result<Vec<T>, _>>()?;

        Ok(ListResult {
            items,
            total,
            page: params.page,
            page_size: params.page_size,
        })
    }

    /// Parses and validates a raw list request, then runs it.
    pub async fn list_with_query<S>(
        &self,
        store: &mut S,
        principal: &Principal,
        query: ListQuery,
    ) -> Result<ListResult<T>, RepoError>
    where
        S: RowReader + ?Sized,
    {
        let params = query.into_params(self.descriptor())?;
        self.list(store, principal, &params).await
    }
}
