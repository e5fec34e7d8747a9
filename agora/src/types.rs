use serde::de::DeserializeOwned;

/// Static description of one table of the social schema.
#[derive(Debug)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub columns: &'static [ColumnDescriptor],
    pub relations: &'static [RelationDescriptor],
    /// Counter caches on parent rows that this table's rows feed.
    pub counters: &'static [CounterCacheDescriptor],
    pub unique_constraints: &'static [UniqueConstraintDescriptor],
    pub timestamps: Timestamps,
    /// Column that receives the acting user's id on create.
    pub actor_column: Option<&'static str>,
    pub access: AccessPolicy,
    pub listing: ListingDescriptor,
}

impl TableDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn relation(&self, column: &str) -> Option<&'static RelationDescriptor> {
        self.relations.iter().find(|relation| relation.column == column)
    }

    /// The relation whose parent this table's rows inherit visibility from.
    pub fn aggregate_parent(&self) -> Option<&'static RelationDescriptor> {
        self.relations.iter().find(|relation| relation.kind == RelationKind::Aggregate)
    }

    pub fn has_timestamps(&self) -> bool {
        self.timestamps == Timestamps::Tracked
    }

    /// Columns users may supply on create.
    pub fn writable_columns(&self) -> impl Iterator<Item = &'static ColumnDescriptor> + '_ {
        self.columns
            .iter()
            .filter(move |column| column.role == ColumnRole::Data && Some(column.name) != self.actor_column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub role: ColumnRole,
    pub mutability: Mutability,
    pub validations: &'static [ValidationRule],
}

impl ColumnDescriptor {
    pub const fn data(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            role: ColumnRole::Data,
            mutability: Mutability::Mutable,
            validations: &[],
        }
    }

    pub const fn managed(name: &'static str, column_type: ColumnType, nullable: bool, role: ColumnRole) -> Self {
        Self {
            name,
            column_type,
            nullable,
            role,
            mutability: Mutability::Immutable,
            validations: &[],
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn immutable(mut self) -> Self {
        self.mutability = Mutability::Immutable;
        self
    }

    pub const fn admin_only(mut self) -> Self {
        self.mutability = Mutability::AdminOnly;
        self
    }

    pub const fn validate(mut self, validations: &'static [ValidationRule]) -> Self {
        self.validations = validations;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Id,
    Reference,
    /// Bounded text. The limit counts Unicode scalar values, like SQL `VARCHAR(n)`.
    Varchar(usize),
    Text,
    Integer,
    SmallInt,
    Boolean,
    Date,
    DateTime,
    /// Array of role names.
    Roles,
    /// Plaintext on input, stored as an argon2 hash.
    Password,
}

/// Who writes the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Data,
    Id,
    CreatedAt,
    UpdatedAt,
    SoftDelete,
    Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    Immutable,
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamps {
    Tracked,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub column: &'static str,
    pub target: &'static str,
    pub kind: RelationKind,
}

impl RelationDescriptor {
    pub const fn reference(column: &'static str, target: &'static str) -> Self {
        Self {
            column,
            target,
            kind: RelationKind::Reference,
        }
    }

    pub const fn aggregate(column: &'static str, target: &'static str) -> Self {
        Self {
            column,
            target,
            kind: RelationKind::Aggregate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Plain foreign key: the parent must be live when referenced.
    Reference,
    /// Child is part of the parent's aggregate and disappears with it.
    Aggregate,
}

/// A counter column on a parent table kept equal to the number of live child rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterCacheDescriptor {
    /// Column on the child row that identifies the parent.
    pub source_column: &'static str,
    pub target_table: &'static str,
    /// Parent column compared against the child's `source_column` (`id`, or `user_id` for blogs).
    pub match_column: &'static str,
    pub counter_column: &'static str,
}

/// Describes a unique constraint on one or more columns, enforced among live rows only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueConstraintDescriptor {
    pub fields: &'static [&'static str],
    pub case_insensitive: bool,
}

impl UniqueConstraintDescriptor {
    pub fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    Length { min: Option<usize>, max: Option<usize> },
    Regex { pattern: &'static str },
    Enum { allowed: &'static [i64] },
    Email,
}

/// Filterable and sortable columns for list operations.
#[derive(Debug, Clone, Copy)]
pub struct ListingDescriptor {
    pub filters: &'static [FilterField],
    pub sorts: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub column: &'static str,
    pub mode: FilterMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Equality on ids, foreign keys and booleans.
    Exact,
    /// Case-insensitive substring match on text.
    Partial,
}

#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    pub owner: OwnerRule,
    pub read: ReadRule,
    pub list_admin_only: bool,
    pub create: CreateRule,
    pub write: WriteRule,
}

/// How the owning user of a row is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRule {
    /// The row is the user.
    SelfRow,
    Column(&'static str),
    /// Owner of the parent row referenced by `column`.
    Via {
        column: &'static str,
        table: &'static str,
        owner_column: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRule {
    Public,
    OwnerOrAdmin,
    /// Any user named in `columns` of the row referenced by `via`.
    Participant(ParticipantRule),
    /// Rows addressed to everyone (`column` NULL) or to the principal.
    RecipientOrBroadcast { column: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantRule {
    pub via: &'static str,
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateRule {
    /// Anyone, including anonymous principals.
    Open,
    Authenticated,
    AdminOnly,
    /// The principal must own the parent row referenced by `column`.
    ParentOwner { column: &'static str },
    Participant(ParticipantRule),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRule {
    OwnerOrAdmin,
    AdminOnly,
}

/// Typed read model of one table.
pub trait Entity: DeserializeOwned {
    fn descriptor() -> &'static TableDescriptor;

    fn id(&self) -> i64;
}
