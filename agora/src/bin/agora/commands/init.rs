use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::Path;

use agora::{AgoraConfig, StoreBackend, config::CONFIG_FILE_NAME};

use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Initialize",
    commands: &[
        "agora init                              # In-memory store, prefix 'agora'",
        "agora init --backend redis              # Redis at ${AGORA_REDIS_URL}",
        "agora init --backend redis --prefix staging --force",
    ],
}];

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendArg {
    Memory,
    Redis,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => StoreBackend::Memory,
            BackendArg::Redis => StoreBackend::Redis,
        }
    }
}

#[derive(Args)]
pub struct InitArgs {
    /// Store backend to configure
    #[arg(long, value_enum, default_value = "memory")]
    backend: BackendArg,

    /// Key prefix for every row and index
    #[arg(long)]
    prefix: Option<String>,

    /// Overwrite an existing agora.toml
    #[arg(long)]
    force: bool,
}

pub async fn handle_init(args: InitArgs, output: &OutputManager) -> Result<()> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let path = write_config(&current_dir, &args)?;

    output.success(&format!("Wrote {}", path.display()));
    output.key_value("backend", &format!("{:?}", args.backend).to_lowercase());
    if matches!(args.backend, BackendArg::Redis) {
        output.info("Set AGORA_REDIS_URL or edit store.url before running counter commands.");
    }
    Ok(())
}

fn write_config(dir: &Path, args: &InitArgs) -> Result<std::path::PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists. Use --force to overwrite it.", path.display());
    }

    let mut config = AgoraConfig::default();
    config.store.backend = args.backend.into();
    if let Some(prefix) = &args.prefix {
        if prefix.is_empty() || prefix.contains(':') {
            anyhow::bail!("Prefix must be non-empty and must not contain ':'");
        }
        config.store.prefix = prefix.clone();
    }

    let content = config.to_toml().context("Failed to render agora.toml")?;
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
