use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

use crate::activate::{CONFIG_FILE, CREDENTIALS_FILE};

/// Default store directory name under the home directory
pub const DEFAULT_STORE_DIR: &str = ".git-accounts";

/// All resolved locations used by gitprof
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.git-accounts unless overridden
    pub store_dir: PathBuf,
    /// Directory whose .git-credentials/.gitconfig get switched; ~ unless overridden
    pub target_dir: PathBuf,
}

impl Paths {
    /// Resolve paths, falling back to the home directory for anything not given.
    pub fn new(target_dir: Option<PathBuf>, store_dir: Option<PathBuf>) -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        Ok(Self::with_home(base_dirs.home_dir(), target_dir, store_dir))
    }

    /// Resolve paths relative to an explicit home directory.
    pub fn with_home(
        home: &Path,
        target_dir: Option<PathBuf>,
        store_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            store_dir: store_dir.unwrap_or_else(|| home.join(DEFAULT_STORE_DIR)),
            target_dir: target_dir.unwrap_or_else(|| home.to_path_buf()),
        }
    }

    /// ~/.git-credentials (or the overridden target's)
    pub fn target_credentials(&self) -> PathBuf {
        self.target_dir.join(CREDENTIALS_FILE)
    }

    /// ~/.gitconfig (or the overridden target's)
    pub fn target_config(&self) -> PathBuf {
        self.target_dir.join(CONFIG_FILE)
    }

    /// Ensure the store and target directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.store_dir).with_context(|| {
            format!("Failed to create store directory: {}", self.store_dir.display())
        })?;
        std::fs::create_dir_all(&self.target_dir).with_context(|| {
            format!("Failed to create target directory: {}", self.target_dir.display())
        })?;
        Ok(())
    }
}
