use crate::{
    schema::TABLES,
    types::{CounterCacheDescriptor, RelationKind, TableDescriptor},
};

/// Upper bound on aggregate-parent hops followed when resolving visibility.
pub const MAX_VISIBILITY_DEPTH: usize = 8;

pub fn get_descriptor(table: &str) -> Option<&'static TableDescriptor> {
    TABLES.iter().copied().find(|descriptor| descriptor.name == table)
}

pub fn table_names() -> impl Iterator<Item = &'static str> {
    TABLES.iter().map(|descriptor| descriptor.name)
}

/// Information about a relation pointing TO a table from another table.
#[derive(Debug, Clone, Copy)]
pub struct IncomingRelation {
    pub source_table: &'static str,
    pub column: &'static str,
    pub kind: RelationKind,
}

/// Find every foreign key in the schema that targets `target_table`.
pub fn find_incoming_relations(target_table: &str) -> Vec<IncomingRelation> {
    let mut incoming = Vec::new();
    for descriptor in TABLES {
        for relation in descriptor.relations {
            if relation.target == target_table {
                incoming.push(IncomingRelation {
                    source_table: descriptor.name,
                    column: relation.column,
                    kind: relation.kind,
                });
            }
        }
    }
    incoming
}

/// A child table feeding a counter column of `target_table`.
#[derive(Debug, Clone, Copy)]
pub struct CounterSource {
    pub child_table: &'static str,
    pub cache: &'static CounterCacheDescriptor,
}

/// Counter caches maintained on `target_table`, grouped by the child table that feeds them.
pub fn find_counter_sources(target_table: &str) -> Vec<CounterSource> {
    let mut sources = Vec::new();
    for descriptor in TABLES {
        for cache in descriptor.counters {
            if cache.target_table == target_table {
                sources.push(CounterSource {
                    child_table: descriptor.name,
                    cache,
                });
            }
        }
    }
    sources
}

/// One hop from a row to its aggregate parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityHop {
    pub column: &'static str,
    pub table: &'static str,
}

/// Aggregate parents a row of `table` inherits visibility from, nearest first.
pub fn visibility_chain(table: &TableDescriptor) -> Vec<VisibilityHop> {
    let mut chain = Vec::new();
    let mut current = table;
    while chain.len() < MAX_VISIBILITY_DEPTH {
        let Some(relation) = current.aggregate_parent() else {
            break;
        };
        chain.push(VisibilityHop {
            column: relation.column,
            table: relation.target,
        });
        match get_descriptor(relation.target) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    chain
}
