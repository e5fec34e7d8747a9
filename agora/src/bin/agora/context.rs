use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use serde_json::Value;
use std::path::{Path, PathBuf};

use agora::{
    AgoraConfig, MemoryStore, RedisStore, RepoError, Row, RowReader, StoreBackend,
    config::{self, CONFIG_FILE_NAME},
    runtime::{MutationExecutor, MutationPlan},
};

use crate::output::OutputManager;

/// Project context for agora operations
pub struct ProjectContext {
    /// Directory holding `agora.toml` (or the start directory when none exists)
    pub root: PathBuf,
    pub config_path: PathBuf,
    /// Loaded configuration, or defaults when uninitialized
    pub config: AgoraConfig,
    initialized: bool,
}

impl ProjectContext {
    /// Find and load project context from current directory or ancestors
    pub fn find() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::find_from(&current_dir)
    }

    pub fn find_from(start: &Path) -> Result<Self> {
        match config::discover(start) {
            Some(config_path) => {
                let config = AgoraConfig::load(&config_path)
                    .with_context(|| format!("Failed to load {}", config_path.display()))?;
                let root = config_path.parent().unwrap_or(start).to_path_buf();
                Ok(Self {
                    root,
                    config_path,
                    config,
                    initialized: true,
                })
            }
            None => Ok(Self {
                root: start.to_path_buf(),
                config_path: start.join(CONFIG_FILE_NAME),
                config: AgoraConfig::default(),
                initialized: false,
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Opens the configured backend.
    pub async fn open_store(&self, output: &OutputManager) -> Result<ConfiguredStore> {
        let prefix = self.config.store.prefix.clone();
        match self.config.store.backend {
            StoreBackend::Memory => {
                output.warning("Using the in-memory store; it starts empty and is discarded on exit.");
                Ok(ConfiguredStore::Memory(MemoryStore::new(prefix)))
            }
            StoreBackend::Redis => {
                let redis_url = self
                    .config
                    .redis_url()
                    .context("Redis URL is not configured. Set AGORA_REDIS_URL or store.url.")?;

                output.progress("Connecting to Redis");
                let client = redis::Client::open(redis_url.as_str()).context("Failed to create Redis client")?;
                let manager = ConnectionManager::new(client)
                    .await
                    .context("Failed to connect to Redis")?;
                output.clear_line();
                output.verbose(&format!("Connected to Redis (prefix '{prefix}')"));
                Ok(ConfiguredStore::Redis(RedisStore::new(manager, prefix)))
            }
        }
    }
}

/// Store selected by `agora.toml`.
pub enum ConfiguredStore {
    Memory(MemoryStore),
    Redis(RedisStore<ConnectionManager>),
}

impl MutationExecutor for ConfiguredStore {
    async fn execute(&mut self, plan: MutationPlan) -> Result<Vec<Value>, RepoError> {
        match self {
            Self::Memory(store) => store.execute(plan).await,
            Self::Redis(store) => store.execute(plan).await,
        }
    }
}

impl RowReader for ConfiguredStore {
    fn prefix(&self) -> &str {
        match self {
            Self::Memory(store) => store.prefix(),
            Self::Redis(store) => store.prefix(),
        }
    }

    async fn fetch_row(&mut self, table: &str, id: i64) -> Result<Option<Row>, RepoError> {
        match self {
            Self::Memory(store) => store.fetch_row(table, id).await,
            Self::Redis(store) => store.fetch_row(table, id).await,
        }
    }

    async fn fetch_ids(&mut self, table: &str) -> Result<Vec<i64>, RepoError> {
        match self {
            Self::Memory(store) => store.fetch_ids(table).await,
            Self::Redis(store) => store.fetch_ids(table).await,
        }
    }

    async fn fetch_children(&mut self, table: &str, column: &str, parent_id: i64) -> Result<Vec<i64>, RepoError> {
        match self {
            Self::Memory(store) => store.fetch_children(table, column, parent_id).await,
            Self::Redis(store) => store.fetch_children(table, column, parent_id).await,
        }
    }
}
