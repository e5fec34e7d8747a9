use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};
use serde::Serialize;

use agora::{
    registry::{self, find_counter_sources, find_incoming_relations},
    schema::{TABLES, render_ddl, render_table_ddl},
    types::{ColumnDescriptor, ColumnRole, ColumnType, Mutability, RelationKind, TableDescriptor},
};

use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse the Schema",
        commands: &[
            "agora schema tables               # One line per table",
            "agora schema show post            # Columns, relations and counters of post",
            "agora --output json schema show comment",
        ],
    },
    ExampleGroup {
        title: "Relational Contract",
        commands: &[
            "agora schema ddl                  # CREATE TABLE statements for every table",
            "agora schema ddl post_like        # A single table",
        ],
    },
];

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// List every table with its relations and counters
    #[command(name = "tables")]
    Tables,

    /// Show the columns and relations of one table
    #[command(name = "show")]
    Show {
        /// Table name (e.g., post, comment_like)
        table: String,
    },

    /// Print the schema as SQL DDL
    #[command(name = "ddl")]
    Ddl {
        /// Table to render (optional, renders all if omitted)
        table: Option<String>,
    },
}

pub async fn handle_schema_commands(command: SchemaCommands, output: &OutputManager) -> Result<()> {
    match command {
        SchemaCommands::Tables => output.display(&SchemaOverview::build()),
        SchemaCommands::Show { table } => {
            let descriptor = lookup(&table)?;
            output.display(&TableDetail::build(descriptor))
        }
        SchemaCommands::Ddl { table } => {
            let sql = match table {
                Some(name) => render_table_ddl(lookup(&name)?),
                None => render_ddl(),
            };
            print!("{sql}");
            Ok(())
        }
    }
}

pub fn lookup(table: &str) -> Result<&'static TableDescriptor> {
    registry::get_descriptor(table).ok_or_else(|| {
        let known: Vec<&str> = registry::table_names().collect();
        anyhow::anyhow!("Unknown table '{table}'. Known tables: {}", known.join(", "))
    })
}

fn type_label(column: &ColumnDescriptor) -> String {
    match column.column_type {
        ColumnType::Id => "id".to_string(),
        ColumnType::Reference => "ref".to_string(),
        ColumnType::Varchar(len) => format!("varchar({len})"),
        ColumnType::Text => "text".to_string(),
        ColumnType::Integer => "int".to_string(),
        ColumnType::SmallInt => "smallint".to_string(),
        ColumnType::Boolean => "bool".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::DateTime => "datetime".to_string(),
        ColumnType::Roles => "roles".to_string(),
        ColumnType::Password => "password".to_string(),
    }
}

fn role_label(role: ColumnRole) -> &'static str {
    match role {
        ColumnRole::Data => "data",
        ColumnRole::Id => "id",
        ColumnRole::CreatedAt => "created_at",
        ColumnRole::UpdatedAt => "updated_at",
        ColumnRole::SoftDelete => "soft_delete",
        ColumnRole::Counter => "counter",
    }
}

fn mutability_label(mutability: Mutability) -> &'static str {
    match mutability {
        Mutability::Mutable => "mutable",
        Mutability::Immutable => "immutable",
        Mutability::AdminOnly => "admin only",
    }
}

fn relation_label(column: &str, target: &str, kind: RelationKind) -> String {
    match kind {
        RelationKind::Reference => format!("{column} → {target}"),
        RelationKind::Aggregate => format!("{column} ⇒ {target}"),
    }
}

#[derive(Debug, Serialize)]
struct TableSummary {
    name: &'static str,
    columns: usize,
    relations: Vec<String>,
    counters: Vec<String>,
    unique: Vec<String>,
    timestamps: bool,
}

#[derive(Debug, Serialize)]
struct SchemaOverview {
    tables: Vec<TableSummary>,
}

impl SchemaOverview {
    fn build() -> Self {
        let tables = TABLES
            .iter()
            .map(|table| TableSummary {
                name: table.name,
                columns: table.columns.len(),
                relations: table
                    .relations
                    .iter()
                    .map(|relation| relation_label(relation.column, relation.target, relation.kind))
                    .collect(),
                counters: find_counter_sources(table.name)
                    .into_iter()
                    .map(|source| {
                        format!(
                            "{} ← {}.{}",
                            source.cache.counter_column, source.child_table, source.cache.source_column
                        )
                    })
                    .collect(),
                unique: table
                    .unique_constraints
                    .iter()
                    .map(|constraint| constraint.fields.join(", "))
                    .collect(),
                timestamps: table.has_timestamps(),
            })
            .collect();
        Self { tables }
    }
}

impl TableDisplay for SchemaOverview {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Table", "Columns", "Relations", "Counters", "Unique", "Timestamps"]);
        for summary in &self.tables {
            table.add_row(vec![
                Cell::new(summary.name),
                Cell::new(summary.columns),
                Cell::new(summary.relations.join("\n")),
                Cell::new(summary.counters.join("\n")),
                Cell::new(summary.unique.join("\n")),
                Cell::new(if summary.timestamps { "yes" } else { "no" }),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let names: Vec<&str> = self.tables.iter().map(|summary| summary.name).collect();
        format!("{} tables: {}", names.len(), names.join(" "))
    }
}

#[derive(Debug, Serialize)]
struct ColumnSummary {
    name: &'static str,
    #[serde(rename = "type")]
    column_type: String,
    nullable: bool,
    role: &'static str,
    mutability: &'static str,
}

#[derive(Debug, Serialize)]
struct TableDetail {
    name: &'static str,
    columns: Vec<ColumnSummary>,
    /// Foreign keys in other tables pointing here.
    referenced_by: Vec<String>,
}

impl TableDetail {
    fn build(table: &'static TableDescriptor) -> Self {
        let columns = table
            .columns
            .iter()
            .map(|column| ColumnSummary {
                name: column.name,
                column_type: type_label(column),
                nullable: column.nullable,
                role: role_label(column.role),
                mutability: mutability_label(column.mutability),
            })
            .collect();
        let referenced_by = find_incoming_relations(table.name)
            .into_iter()
            .map(|incoming| {
                relation_label(
                    &format!("{}.{}", incoming.source_table, incoming.column),
                    table.name,
                    incoming.kind,
                )
            })
            .collect();
        Self {
            name: table.name,
            columns,
            referenced_by,
        }
    }
}

impl TableDisplay for TableDetail {
    fn to_table(&self, output: &OutputManager) -> Table {
        output.heading(&format!("Table: {}", self.name));
        for incoming in &self.referenced_by {
            output.bullet(incoming);
        }

        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Column", "Type", "Null", "Role", "Mutability"]);
        for column in &self.columns {
            table.add_row(vec![
                Cell::new(column.name),
                Cell::new(&column.column_type),
                Cell::new(if column.nullable { "yes" } else { "no" }),
                Cell::new(column.role),
                Cell::new(column.mutability),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        let columns: Vec<&str> = self.columns.iter().map(|column| column.name).collect();
        format!("{}({})", self.name, columns.join(", "))
    }
}
