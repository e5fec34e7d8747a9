pub(crate) use agora::{
    ErrorKind, FilterCondition, ListParams, ListQuery, MemoryStore, Principal, Repo, RepoError, RowReader, SortOrder,
    credentials::authenticate,
    keys::KeyContext,
    models::*,
    runtime::{
        MutationExecutor, MutationPlan,
        commands::{MutationCommand, RowPatch},
    },
    schema::{MESSAGE_TYPE_MEDIA, MESSAGE_TYPE_TEXT, ROLE_ADMIN},
};
pub(crate) use serde_json::{Value, json};
pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) static TEST_NAMESPACE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh in-memory store under its own prefix.
pub(crate) fn store() -> MemoryStore {
    let idx = TEST_NAMESPACE_COUNTER.fetch_add(1, Ordering::SeqCst);
    MemoryStore::new(format!("agora_test_{idx}"))
}

/// Registers a user and returns it with its principal.
pub(crate) async fn register(store: &mut MemoryStore, email: &str) -> (User, Principal) {
    let user = Repo::<User>::new()
        .create(
            store,
            &Principal::anonymous(),
            NewUser {
                email: email.to_string(),
                password: "secret-pass".to_string(),
                roles: Vec::new(),
            },
        )
        .await
        .expect("register user");
    let principal = Principal::from(&user);
    (user, principal)
}

/// Creates an administrator through the maintenance principal.
pub(crate) async fn register_admin(store: &mut MemoryStore, email: &str) -> (User, Principal) {
    let user = Repo::<User>::new()
        .create(
            store,
            &Principal::system(),
            NewUser {
                email: email.to_string(),
                password: "secret-pass".to_string(),
                roles: vec![ROLE_ADMIN.to_string()],
            },
        )
        .await
        .expect("register admin");
    let principal = Principal::from(&user);
    (user, principal)
}

pub(crate) async fn post(store: &mut MemoryStore, author: &Principal, text: &str) -> Post {
    Repo::<Post>::new()
        .create(
            store,
            author,
            NewPost {
                text: Some(text.to_string()),
                media_id: None,
            },
        )
        .await
        .expect("create post")
}

pub(crate) async fn comment(store: &mut MemoryStore, author: &Principal, post_id: i64, text: &str) -> Comment {
    Repo::<Comment>::new()
        .create(
            store,
            author,
            NewComment {
                post_id,
                text: text.to_string(),
            },
        )
        .await
        .expect("create comment")
}

pub(crate) async fn post_counts(store: &mut MemoryStore, post_id: i64) -> (i64, i64) {
    let post = Repo::<Post>::new()
        .get(store, &Principal::system(), post_id)
        .await
        .expect("read post");
    (post.likes(), post.comments_count)
}

/// Overwrites a stored column directly, bypassing validation.
pub(crate) async fn force_column(store: &mut MemoryStore, table: &str, id: i64, column: &str, value: Value) {
    let key_prefix = KeyContext::new(store.prefix()).row_prefix(table);
    let mut plan = MutationPlan::new();
    plan.push(MutationCommand::PatchRow(RowPatch {
        table: table.to_string(),
        key_prefix,
        id,
        chain: Vec::new(),
        changes: vec![(column.to_string(), value.to_string())],
        updated_at: None,
        parent_checks: Vec::new(),
        unique_constraints: Vec::new(),
        indexes: Vec::new(),
    }));
    store.execute(plan).await.expect("force column");
}
