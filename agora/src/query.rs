//! List parameters: paging, sorting and `field:op:value` filters.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::RepoError,
    runtime::Row,
    types::{ColumnType, FilterMode, TableDescriptor},
};

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PAGE_SIZE: u64 = 25;
const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_SORT: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Contains,
}

/// A parsed filter, checked against a row.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Column equals any of `values`.
    Eq { column: String, values: Vec<Value> },
    /// Case-insensitive substring match.
    Contains { column: String, needle: String },
}

impl FilterCondition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterCondition::Eq {
            column: column.into(),
            values: vec![value.into()],
        }
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        FilterCondition::Contains {
            column: column.into(),
            needle: needle.into().to_lowercase(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            FilterCondition::Eq { column, .. } | FilterCondition::Contains { column, .. } => column,
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            FilterCondition::Eq { values, .. } => values.contains(value),
            FilterCondition::Contains { needle, .. } => value
                .as_str()
                .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
        }
    }

    /// The single id an equality filter pins, if any.
    pub(crate) fn single_id(&self) -> Option<i64> {
        match self {
            FilterCondition::Eq { values, .. } if values.len() == 1 => values[0].as_i64(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSort {
    pub column: String,
    pub order: SortOrder,
}

impl Default for ListSort {
    fn default() -> Self {
        Self {
            column: DEFAULT_SORT.to_string(),
            order: SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListParams {
    pub page: u64,
    pub page_size: u64,
    pub sort: ListSort,
    /// All conditions must match.
    pub conditions: Vec<FilterCondition>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: ListSort::default(),
            conditions: Vec::new(),
        }
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    #[inline]
    pub fn with_page(mut self, page: u64, page_size: u64) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    #[inline]
    pub fn with_sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.sort = ListSort {
            column: column.into(),
            order,
        };
        self
    }

    #[inline]
    pub fn with_condition(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| condition.matches(row))
    }

    /// Orders rows by the sort column, then by id.
    pub fn compare(&self, left: &Row, right: &Row) -> Ordering {
        let primary = compare_values(
            left.get(&self.sort.column).unwrap_or(&Value::Null),
            right.get(&self.sort.column).unwrap_or(&Value::Null),
        );
        let primary = match self.sort.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| {
            compare_values(
                left.get("id").unwrap_or(&Value::Null),
                right.get("id").unwrap_or(&Value::Null),
            )
        })
    }
}

/// Nulls first, then numbers, then strings.
fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&b.as_f64().unwrap_or_default())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Value::Number(_), _) => Ordering::Less,
        (_, Value::Number(_)) => Ordering::Greater,
        _ => left.to_string().cmp(&right.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> ListResult<T> {
    #[inline]
    pub fn has_more(&self) -> bool {
        self.page.saturating_mul(self.page_size) < self.total
    }
}

/// Raw list request, as received from a caller.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub filter: Vec<String>,
}

fn invalid(message: String) -> RepoError {
    RepoError::InvalidRequest { message }
}

fn parse_filter_value(column_type: ColumnType, raw: &str) -> Result<Value, RepoError> {
    let raw = raw.trim();
    match column_type {
        ColumnType::Id | ColumnType::Reference | ColumnType::Integer | ColumnType::SmallInt => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid(format!("Expected an integer, got: {raw}"))),
        ColumnType::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid(format!("Expected a boolean, got: {raw}"))),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

impl ListQuery {
    /// Validates the request against the table's filterable and sortable columns.
    pub fn into_params(self, table: &TableDescriptor) -> Result<ListParams, RepoError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        let sort_column = match self.sort_by.as_deref() {
            Some(name) => table
                .listing
                .sorts
                .iter()
                .find(|sort| sort.eq_ignore_ascii_case(name))
                .copied()
                .ok_or_else(|| invalid(format!("Unsupported sort field: {name}")))?,
            None => DEFAULT_SORT,
        };

        let mut params = ListParams::new()
            .with_page(page, page_size)
            .with_sort(sort_column, self.sort_order.unwrap_or_default());

        for raw in self.filter {
            let parts: Vec<&str> = raw.splitn(3, ':').collect();
            if parts.len() != 3 {
                return Err(invalid(format!("Invalid filter syntax: {raw}")));
            }
            let field_name = parts[0].trim();
            let field = table
                .listing
                .filters
                .iter()
                .find(|field| field.column == field_name)
                .ok_or_else(|| invalid(format!("Unsupported filter field: {field_name}")))?;
            let operator = match parts[1].to_ascii_lowercase().as_str() {
                "eq" => FilterOperator::Eq,
                "contains" => FilterOperator::Contains,
                other => return Err(invalid(format!("Unsupported filter operator: {other}"))),
            };
            let column = table
                .column(field.column)
                .ok_or_else(|| invalid(format!("Unknown column: {field_name}")))?;

            let condition = match (operator, field.mode) {
                (FilterOperator::Eq, _) => {
                    let values = parts[2]
                        .split(['|', ','])
                        .filter(|segment| !segment.trim().is_empty())
                        .map(|segment| parse_filter_value(column.column_type, segment))
                        .collect::<Result<Vec<_>, _>>()?;
                    if values.is_empty() {
                        return Err(invalid(format!("Filter {field_name} needs a value")));
                    }
                    FilterCondition::Eq {
                        column: field.column.to_string(),
                        values,
                    }
                }
                (FilterOperator::Contains, FilterMode::Partial) => FilterCondition::contains(field.column, parts[2]),
                (FilterOperator::Contains, FilterMode::Exact) => {
                    return Err(invalid(format!("Filter {field_name} only supports eq")));
                }
            };
            params = params.with_condition(condition);
        }

        Ok(params)
    }
}
