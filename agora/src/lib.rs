//! Agora core library.
//!
//! The social network's relational model (users, posts, comments, likes, chats and the rest)
//! with its integrity rules enforced at the storage boundary: parents must exist and be visible,
//! unique pairs hold among live rows, counters follow their live children, and rows are only
//! ever soft-deleted. Every write is one atomic command on the backing store.
//!
//! ```no_run
//! use agora::{MemoryStore, Principal, Repo, models::{NewPost, NewUser, Post, User}};
//!
//! # async fn demo() -> Result<(), agora::RepoError> {
//! let mut store = MemoryStore::new("agora");
//! let user = Repo::<User>::new()
//!     .create(&mut store, &Principal::anonymous(), NewUser {
//!         email: "ann@example.com".into(),
//!         password: "secret-pass".into(),
//!         roles: Vec::new(),
//!     })
//!     .await?;
//! let author = Principal::from(&user);
//! let repo = Repo::<Post>::new();
//! let post = repo.create(&mut store, &author, NewPost { text: Some("hello".into()), media_id: None }).await?;
//! assert_eq!(post.comments_count, 0);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod keys;
pub mod models;
pub mod query;
pub mod registry;
pub mod repository;
pub mod runtime;
pub mod schema;
pub mod types;
pub mod validators;
pub mod visibility;

pub use auth::Principal;
pub use config::{AgoraConfig, StoreBackend, StoreConfig};
pub use errors::{Action, ErrorKind, RepoError, ValidationError, ValidationIssue, ValidationResult};
pub use query::{FilterCondition, ListParams, ListQuery, ListResult, SortOrder};
pub use repository::{CounterReport, MutationPayloadBuilder, Repo, UpdatePatchBuilder};
pub use runtime::{MemoryStore, RedisStore, Row, RowReader, Store};
pub use types::{Entity, TableDescriptor};

pub use redis;
