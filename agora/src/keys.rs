/// Common key-construction helpers shared by the Redis backend, the in-memory
/// backend and the Lua scripts.
///
/// Layout:
/// - `{prefix}:{table}:{id}` row hash (one JSON-encoded value per column)
/// - `{prefix}:{table}:seq` id sequence
/// - `{prefix}:{table}:ids` sorted set of every row id
/// - `{prefix}:{table}:rev:{column}:{parent_id}` reverse foreign-key index
/// - `{prefix}:{table}:unique:{f1,f2}:{v1|v2}` unique slot holding the owning row id
#[derive(Debug, Clone)]
pub struct KeyContext<'a> {
    pub prefix: &'a str,
}

impl<'a> KeyContext<'a> {
    pub fn new(prefix: &'a str) -> Self {
        Self { prefix }
    }

    pub fn row(&self, table: &str, id: i64) -> String {
        format!("{}{}", self.row_prefix(table), id)
    }

    /// Prefix the Lua scripts append a row id to.
    pub fn row_prefix(&self, table: &str) -> String {
        format!("{}:{}:", self.prefix, table)
    }

    pub fn sequence(&self, table: &str) -> String {
        format!("{}:{}:seq", self.prefix, table)
    }

    pub fn ids(&self, table: &str) -> String {
        format!("{}:{}:ids", self.prefix, table)
    }

    pub fn reverse_index(&self, table: &str, column: &str, parent_id: i64) -> String {
        format!("{}{}", self.reverse_index_prefix(table, column), parent_id)
    }

    pub fn reverse_index_prefix(&self, table: &str, column: &str) -> String {
        format!("{}:{}:rev:{}:", self.prefix, table, column)
    }

    pub fn unique_prefix(&self, table: &str) -> String {
        format!("{}:{}:unique:", self.prefix, table)
    }

    /// Full unique-slot key. `encoded_values` are the stored (JSON-encoded) column values,
    /// already lower-cased for case-insensitive constraints.
    pub fn unique(&self, table: &str, fields: &[&str], encoded_values: &[String]) -> String {
        format!(
            "{}{}:{}",
            self.unique_prefix(table),
            fields.join(","),
            encoded_values.join("|")
        )
    }

    /// Glob pattern matching every key owned by this prefix.
    pub fn pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }
}
