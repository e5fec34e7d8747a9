//! The social-network schema: eighteen tables, their relations, counter caches
//! and access rules, plus rendering of the relational contract as SQL DDL.

use std::fmt::Write;

use crate::types::{
    AccessPolicy, ColumnDescriptor, ColumnRole, ColumnType, CounterCacheDescriptor, CreateRule, FilterField,
    FilterMode, ListingDescriptor, OwnerRule, ParticipantRule, ReadRule, RelationDescriptor, TableDescriptor,
    Timestamps, UniqueConstraintDescriptor, ValidationRule, WriteRule,
};

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

pub const MESSAGE_TYPE_TEXT: i64 = 1;
pub const MESSAGE_TYPE_MEDIA: i64 = 2;

const ID: ColumnDescriptor = ColumnDescriptor::managed("id", ColumnType::Id, false, ColumnRole::Id);
const CREATED_AT: ColumnDescriptor =
    ColumnDescriptor::managed("created_at", ColumnType::DateTime, false, ColumnRole::CreatedAt);
const UPDATED_AT: ColumnDescriptor =
    ColumnDescriptor::managed("updated_at", ColumnType::DateTime, true, ColumnRole::UpdatedAt);
const IS_DELETED: ColumnDescriptor =
    ColumnDescriptor::managed("is_deleted", ColumnType::Boolean, false, ColumnRole::SoftDelete);
const AUTHOR: ColumnDescriptor = ColumnDescriptor::data("user_id", ColumnType::Reference).immutable();

const fn counter(name: &'static str) -> ColumnDescriptor {
    ColumnDescriptor::managed(name, ColumnType::Integer, false, ColumnRole::Counter)
}

const fn parent(name: &'static str) -> ColumnDescriptor {
    ColumnDescriptor::data(name, ColumnType::Reference).immutable()
}

const fn optional_reference(name: &'static str) -> ColumnDescriptor {
    ColumnDescriptor::data(name, ColumnType::Reference).nullable()
}

const AUTHORED: AccessPolicy = AccessPolicy {
    owner: OwnerRule::Column("user_id"),
    read: ReadRule::Public,
    list_admin_only: false,
    create: CreateRule::Authenticated,
    write: WriteRule::OwnerOrAdmin,
};

const STANDARD_SORTS: &[&str] = &["id", "created_at", "updated_at"];

const CHAT_PARTICIPANTS: ParticipantRule = ParticipantRule {
    via: "chat_id",
    table: "chat",
    columns: &["user_id", "with_user_id"],
};

const EMAIL_RULES: &[ValidationRule] = &[ValidationRule::Email];
const PASSWORD_RULES: &[ValidationRule] = &[ValidationRule::Length {
    min: Some(6),
    max: None,
}];
const NICKNAME_RULES: &[ValidationRule] = &[ValidationRule::Length {
    min: Some(6),
    max: Some(255),
}];
const BG_COLOR_RULES: &[ValidationRule] = &[ValidationRule::Regex {
    pattern: "^[0-9A-Fa-f]{6}$",
}];
const MESSAGE_TYPE_RULES: &[ValidationRule] = &[ValidationRule::Enum {
    allowed: &[MESSAGE_TYPE_TEXT, MESSAGE_TYPE_MEDIA],
}];

pub static USER: TableDescriptor = TableDescriptor {
    name: "user",
    columns: &[
        ID,
        ColumnDescriptor::data("email", ColumnType::Varchar(255)).validate(EMAIL_RULES),
        ColumnDescriptor::data("password", ColumnType::Password).validate(PASSWORD_RULES),
        ColumnDescriptor::data("roles", ColumnType::Roles).admin_only(),
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[],
    counters: &[],
    unique_constraints: &[UniqueConstraintDescriptor {
        fields: &["email"],
        case_insensitive: true,
    }],
    timestamps: Timestamps::Tracked,
    actor_column: None,
    access: AccessPolicy {
        owner: OwnerRule::SelfRow,
        read: ReadRule::OwnerOrAdmin,
        list_admin_only: true,
        create: CreateRule::Open,
        write: WriteRule::OwnerOrAdmin,
    },
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "email",
                mode: FilterMode::Partial,
            },
        ],
        sorts: &["id", "created_at", "updated_at", "email"],
    },
};

pub static PERSON: TableDescriptor = TableDescriptor {
    name: "person",
    columns: &[
        ID,
        ColumnDescriptor::data("given_name", ColumnType::Varchar(255)),
        ColumnDescriptor::data("family_name", ColumnType::Varchar(255)),
        ColumnDescriptor::data("birthday", ColumnType::Date).nullable(),
        ColumnDescriptor::data("is_male", ColumnType::Boolean),
        ColumnDescriptor::data("phone", ColumnType::Varchar(255)).nullable(),
        ColumnDescriptor::data("city", ColumnType::Varchar(255)).nullable(),
        ColumnDescriptor::data("country_id", ColumnType::Reference),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[
        RelationDescriptor::reference("country_id", "country"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "country_id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static COUNTRY: TableDescriptor = TableDescriptor {
    name: "country",
    columns: &[
        ID,
        ColumnDescriptor::data("name", ColumnType::Varchar(255)),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[RelationDescriptor::reference("user_id", "user")],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AccessPolicy {
        owner: OwnerRule::Column("user_id"),
        read: ReadRule::Public,
        list_admin_only: false,
        create: CreateRule::AdminOnly,
        write: WriteRule::AdminOnly,
    },
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "name",
                mode: FilterMode::Partial,
            },
        ],
        sorts: &["id", "created_at", "updated_at", "name"],
    },
};

pub static MEDIA_OBJECT: TableDescriptor = TableDescriptor {
    name: "media_object",
    columns: &[
        ID,
        ColumnDescriptor::data("file_path", ColumnType::Varchar(255)).nullable(),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[RelationDescriptor::reference("user_id", "user")],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static POST: TableDescriptor = TableDescriptor {
    name: "post",
    columns: &[
        ID,
        ColumnDescriptor::data("text", ColumnType::Text).nullable(),
        ColumnDescriptor::managed("likes_count", ColumnType::Integer, true, ColumnRole::Counter),
        counter("comments_count"),
        optional_reference("media_id"),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[
        RelationDescriptor::reference("media_id", "media_object"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static COMMENT: TableDescriptor = TableDescriptor {
    name: "comment",
    columns: &[
        ID,
        ColumnDescriptor::data("text", ColumnType::Text),
        counter("likes_count"),
        parent("post_id"),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[
        RelationDescriptor::aggregate("post_id", "post"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[CounterCacheDescriptor {
        source_column: "post_id",
        target_table: "post",
        match_column: "id",
        counter_column: "comments_count",
    }],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "post_id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static POST_LIKE: TableDescriptor = TableDescriptor {
    name: "post_like",
    columns: &[ID, parent("post_id"), AUTHOR, CREATED_AT, UPDATED_AT, IS_DELETED],
    relations: &[
        RelationDescriptor::aggregate("post_id", "post"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[CounterCacheDescriptor {
        source_column: "post_id",
        target_table: "post",
        match_column: "id",
        counter_column: "likes_count",
    }],
    unique_constraints: &[UniqueConstraintDescriptor {
        fields: &["post_id", "user_id"],
        case_insensitive: false,
    }],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "post_id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static COMMENT_LIKE: TableDescriptor = TableDescriptor {
    name: "comment_like",
    columns: &[ID, parent("comment_id"), AUTHOR, CREATED_AT, UPDATED_AT, IS_DELETED],
    relations: &[
        RelationDescriptor::aggregate("comment_id", "comment"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[CounterCacheDescriptor {
        source_column: "comment_id",
        target_table: "comment",
        match_column: "id",
        counter_column: "likes_count",
    }],
    unique_constraints: &[UniqueConstraintDescriptor {
        fields: &["comment_id", "user_id"],
        case_insensitive: false,
    }],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "comment_id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static SAVED_POST: TableDescriptor = TableDescriptor {
    name: "saved_post",
    columns: &[ID, parent("post_id"), AUTHOR, CREATED_AT, UPDATED_AT, IS_DELETED],
    relations: &[
        RelationDescriptor::aggregate("post_id", "post"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AccessPolicy {
        owner: OwnerRule::Column("user_id"),
        read: ReadRule::OwnerOrAdmin,
        list_admin_only: false,
        create: CreateRule::Authenticated,
        write: WriteRule::OwnerOrAdmin,
    },
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "post_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static STORY: TableDescriptor = TableDescriptor {
    name: "story",
    columns: &[
        ID,
        ColumnDescriptor::data("bg_color", ColumnType::Varchar(6)).validate(BG_COLOR_RULES),
        optional_reference("media_id"),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[
        RelationDescriptor::reference("media_id", "media_object"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static STORY_TEXT: TableDescriptor = TableDescriptor {
    name: "story_text",
    columns: &[
        ID,
        ColumnDescriptor::data("text", ColumnType::Text),
        parent("story_id"),
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[RelationDescriptor::aggregate("story_id", "story")],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: None,
    access: AccessPolicy {
        owner: OwnerRule::Via {
            column: "story_id",
            table: "story",
            owner_column: "user_id",
        },
        read: ReadRule::Public,
        list_admin_only: false,
        create: CreateRule::ParentOwner { column: "story_id" },
        write: WriteRule::OwnerOrAdmin,
    },
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "story_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static CHAT: TableDescriptor = TableDescriptor {
    name: "chat",
    columns: &[
        ID,
        ColumnDescriptor::data("with_user_id", ColumnType::Reference).immutable(),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[
        RelationDescriptor::reference("with_user_id", "user"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AccessPolicy {
        owner: OwnerRule::Column("user_id"),
        read: ReadRule::OwnerOrAdmin,
        list_admin_only: false,
        create: CreateRule::Authenticated,
        write: WriteRule::OwnerOrAdmin,
    },
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "with_user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static MESSAGE: TableDescriptor = TableDescriptor {
    name: "message",
    columns: &[
        ID,
        ColumnDescriptor::data("type", ColumnType::SmallInt).validate(MESSAGE_TYPE_RULES),
        parent("chat_id"),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[
        RelationDescriptor::aggregate("chat_id", "chat"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AccessPolicy {
        owner: OwnerRule::Column("user_id"),
        read: ReadRule::Participant(CHAT_PARTICIPANTS),
        list_admin_only: false,
        create: CreateRule::Participant(CHAT_PARTICIPANTS),
        write: WriteRule::OwnerOrAdmin,
    },
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "chat_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

const MESSAGE_SENDER: AccessPolicy = AccessPolicy {
    owner: OwnerRule::Via {
        column: "message_id",
        table: "message",
        owner_column: "user_id",
    },
    read: ReadRule::OwnerOrAdmin,
    list_admin_only: false,
    create: CreateRule::ParentOwner { column: "message_id" },
    write: WriteRule::OwnerOrAdmin,
};

const MESSAGE_PART_FILTERS: &[FilterField] = &[
    FilterField {
        column: "id",
        mode: FilterMode::Exact,
    },
    FilterField {
        column: "message_id",
        mode: FilterMode::Exact,
    },
];

pub static MEDIA_MESSAGE: TableDescriptor = TableDescriptor {
    name: "media_message",
    columns: &[ID, ColumnDescriptor::data("media_id", ColumnType::Reference), parent("message_id"), IS_DELETED],
    relations: &[
        RelationDescriptor::reference("media_id", "media_object"),
        RelationDescriptor::aggregate("message_id", "message"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::None,
    actor_column: None,
    access: MESSAGE_SENDER,
    listing: ListingDescriptor {
        filters: MESSAGE_PART_FILTERS,
        sorts: &["id"],
    },
};

pub static TEXT_MESSAGE: TableDescriptor = TableDescriptor {
    name: "text_message",
    columns: &[ID, ColumnDescriptor::data("text", ColumnType::Text), parent("message_id"), IS_DELETED],
    relations: &[RelationDescriptor::aggregate("message_id", "message")],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::None,
    actor_column: None,
    access: MESSAGE_SENDER,
    listing: ListingDescriptor {
        filters: MESSAGE_PART_FILTERS,
        sorts: &["id"],
    },
};

pub static NOTIFICATION: TableDescriptor = TableDescriptor {
    name: "notification",
    columns: &[
        ID,
        ColumnDescriptor::data("text", ColumnType::Text),
        ColumnDescriptor::data("read_at", ColumnType::DateTime).nullable(),
        ColumnDescriptor::data("for_user_id", ColumnType::Reference).nullable().immutable(),
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[RelationDescriptor::reference("for_user_id", "user")],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: None,
    access: AccessPolicy {
        owner: OwnerRule::Column("for_user_id"),
        read: ReadRule::RecipientOrBroadcast { column: "for_user_id" },
        list_admin_only: false,
        create: CreateRule::AdminOnly,
        write: WriteRule::AdminOnly,
    },
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "for_user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static SUBSCRIPTION: TableDescriptor = TableDescriptor {
    name: "subscription",
    columns: &[ID, parent("follow_id"), AUTHOR, CREATED_AT, UPDATED_AT, IS_DELETED],
    relations: &[
        RelationDescriptor::reference("follow_id", "user"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[
        CounterCacheDescriptor {
            source_column: "follow_id",
            target_table: "blog",
            match_column: "user_id",
            counter_column: "followers_count",
        },
        CounterCacheDescriptor {
            source_column: "user_id",
            target_table: "blog",
            match_column: "user_id",
            counter_column: "following_count",
        },
    ],
    unique_constraints: &[UniqueConstraintDescriptor {
        fields: &["follow_id", "user_id"],
        case_insensitive: false,
    }],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "follow_id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

pub static BLOG: TableDescriptor = TableDescriptor {
    name: "blog",
    columns: &[
        ID,
        counter("followers_count"),
        counter("following_count"),
        ColumnDescriptor::data("nickname", ColumnType::Varchar(255)).validate(NICKNAME_RULES),
        optional_reference("picture_id"),
        AUTHOR,
        CREATED_AT,
        UPDATED_AT,
        IS_DELETED,
    ],
    relations: &[
        RelationDescriptor::reference("picture_id", "media_object"),
        RelationDescriptor::reference("user_id", "user"),
    ],
    counters: &[],
    unique_constraints: &[],
    timestamps: Timestamps::Tracked,
    actor_column: Some("user_id"),
    access: AUTHORED,
    listing: ListingDescriptor {
        filters: &[
            FilterField {
                column: "id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "user_id",
                mode: FilterMode::Exact,
            },
            FilterField {
                column: "nickname",
                mode: FilterMode::Partial,
            },
        ],
        sorts: STANDARD_SORTS,
    },
};

/// Every table, parents before children.
pub static TABLES: &[&TableDescriptor] = &[
    &USER,
    &COUNTRY,
    &PERSON,
    &MEDIA_OBJECT,
    &POST,
    &COMMENT,
    &POST_LIKE,
    &COMMENT_LIKE,
    &SAVED_POST,
    &STORY,
    &STORY_TEXT,
    &CHAT,
    &MESSAGE,
    &MEDIA_MESSAGE,
    &TEXT_MESSAGE,
    &NOTIFICATION,
    &SUBSCRIPTION,
    &BLOG,
];

fn sql_type(column: &ColumnDescriptor) -> String {
    match column.column_type {
        ColumnType::Id | ColumnType::Reference | ColumnType::Integer => "INT".to_string(),
        ColumnType::Varchar(len) => format!("VARCHAR({len})"),
        ColumnType::Password => "VARCHAR(255)".to_string(),
        ColumnType::Text => "TEXT".to_string(),
        ColumnType::SmallInt => "SMALLINT".to_string(),
        ColumnType::Boolean => "BOOLEAN".to_string(),
        ColumnType::Date => "DATE".to_string(),
        ColumnType::DateTime => "TIMESTAMP(0) WITHOUT TIME ZONE".to_string(),
        ColumnType::Roles => "JSON".to_string(),
    }
}

fn column_default(column: &ColumnDescriptor) -> Option<&'static str> {
    match column.role {
        ColumnRole::SoftDelete => Some("false"),
        ColumnRole::Counter if !column.nullable => Some("0"),
        _ => None,
    }
}

/// Renders one table as `CREATE TABLE` plus its indexes and foreign keys.
pub fn render_table_ddl(table: &TableDescriptor) -> String {
    let mut sql = String::new();
    let _ = writeln!(sql, "CREATE TABLE \"{}\" (", table.name);
    for column in table.columns {
        let mut line = format!("    {} {}", column.name, sql_type(column));
        if let Some(default) = column_default(column) {
            let _ = write!(line, " DEFAULT {default}");
        }
        line.push_str(if column.nullable { " DEFAULT NULL" } else { " NOT NULL" });
        let _ = writeln!(sql, "{line},");
    }
    let _ = writeln!(sql, "    PRIMARY KEY(id)");
    let _ = writeln!(sql, ");");

    for relation in table.relations {
        let _ = writeln!(
            sql,
            "CREATE INDEX idx_{table}_{column} ON \"{table}\" ({column});",
            table = table.name,
            column = relation.column
        );
    }
    for constraint in table.unique_constraints {
        let columns: Vec<String> = constraint
            .fields
            .iter()
            .map(|field| {
                if constraint.case_insensitive {
                    format!("LOWER({field})")
                } else {
                    (*field).to_string()
                }
            })
            .collect();
        let _ = writeln!(
            sql,
            "CREATE UNIQUE INDEX uniq_{table}_{name} ON \"{table}\" ({columns}) WHERE is_deleted = false;",
            table = table.name,
            name = constraint.fields.join("_"),
            columns = columns.join(", ")
        );
    }
    for relation in table.relations {
        let _ = writeln!(
            sql,
            "ALTER TABLE \"{table}\" ADD CONSTRAINT fk_{table}_{column} FOREIGN KEY ({column}) REFERENCES \"{target}\" (id);",
            table = table.name,
            column = relation.column,
            target = relation.target
        );
    }
    sql
}

/// Renders the whole schema. Tables are emitted before any foreign key that targets them.
pub fn render_ddl() -> String {
    let mut sql = String::new();
    for (index, table) in TABLES.iter().enumerate() {
        if index > 0 {
            sql.push('\n');
        }
        sql.push_str(&render_table_ddl(table));
    }
    sql
}
