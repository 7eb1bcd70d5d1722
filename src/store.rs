//! On-disk profile store.
//!
//! Each profile lives in its own `<nickname>.json` file inside the store
//! directory (`~/.git-accounts` by default). The file is a small versioned
//! envelope around the [`Profile`] fields:
//!
//! ```json
//! { "version": 1, "saved_at": "...", "profile": { "nickname": "work", ... } }
//! ```
//!
//! Loading is strict. A single unreadable entry fails the whole enumeration
//! so a broken store never silently hides a profile from `list` or `switch`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fs_utils::write_atomic;
use crate::profile::{Profile, validate_nickname};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// Extension of profile files in the store
pub const PROFILE_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredProfile {
    version: u32,
    saved_at: DateTime<Utc>,
    profile: Profile,
}

/// A profile together with where and when it was stored
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub profile: Profile,
    pub path: PathBuf,
    pub saved_at: DateTime<Utc>,
}

/// Directory of persisted profiles
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Open the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds (or would hold) the profile named `nickname`
    pub fn path_for(&self, nickname: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", nickname, PROFILE_EXTENSION))
    }

    /// Persist `profile`, replacing any existing file with the same nickname.
    ///
    /// No overwrite check happens here; confirming a collision is up to the
    /// caller.
    pub fn save(&self, profile: &Profile) -> Result<PathBuf> {
        validate_nickname(&profile.nickname)?;
        let path = self.path_for(&profile.nickname);

        let stored = StoredProfile {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            profile: profile.clone(),
        };
        let mut content = serde_json::to_string_pretty(&stored)
            .map_err(|e| Error::io(&path, std::io::Error::other(e)))?;
        content.push('\n');

        write_atomic(&path, content.as_bytes(), true).map_err(|e| Error::io(&path, e))?;
        debug!(nickname = %profile.nickname, path = %path.display(), "saved profile");
        Ok(path)
    }

    /// Load a single profile file.
    pub fn load(path: &Path) -> Result<Profile> {
        Self::load_entry(path).map(|entry| entry.profile)
    }

    /// Load a single profile file along with its metadata.
    pub fn load_entry(path: &Path) -> Result<StoredEntry> {
        let corrupt = |reason: String| Error::CorruptProfile {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let stored: StoredProfile =
            serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;

        if stored.version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {} (expected {})",
                stored.version, FORMAT_VERSION
            )));
        }
        validate_nickname(&stored.profile.nickname).map_err(|e| corrupt(e.to_string()))?;
        let stem = path.file_stem().and_then(|stem| stem.to_str());
        if stem != Some(stored.profile.nickname.as_str()) {
            return Err(corrupt(format!(
                "nickname '{}' does not match file name",
                stored.profile.nickname
            )));
        }

        Ok(StoredEntry {
            profile: stored.profile,
            path: path.to_path_buf(),
            saved_at: stored.saved_at,
        })
    }

    /// Load every profile in the store, in directory listing order.
    pub fn load_all(&self) -> Result<Vec<Profile>> {
        Ok(self
            .load_all_entries()?
            .into_iter()
            .map(|entry| entry.profile)
            .collect())
    }

    /// Like [`ProfileStore::load_all`], keeping path and save time.
    pub fn load_all_entries(&self) -> Result<Vec<StoredEntry>> {
        let mut entries = Vec::new();
        for path in self.profile_files()? {
            entries.push(Self::load_entry(&path)?);
        }
        debug!(count = entries.len(), dir = %self.dir.display(), "loaded profiles");
        Ok(entries)
    }

    /// First profile whose nickname matches, if any.
    pub fn find(&self, nickname: &str) -> Result<Option<Profile>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|profile| profile.nickname == nickname))
    }

    /// Like [`ProfileStore::find`], but a miss is [`Error::ProfileNotFound`].
    pub fn get(&self, nickname: &str) -> Result<Profile> {
        self.find(nickname)?
            .ok_or_else(|| Error::ProfileNotFound(nickname.to_string()))
    }

    pub fn contains(&self, nickname: &str) -> Result<bool> {
        Ok(self.find(nickname)?.is_some())
    }

    fn profile_files(&self) -> Result<Vec<PathBuf>> {
        let read_dir = fs::read_dir(&self.dir).map_err(|e| Error::io(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| Error::io(&self.dir, e))?;
            let path = entry.path();
            let is_profile = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == PROFILE_EXTENSION);
            if is_profile {
                files.push(path);
            }
        }
        Ok(files)
    }
}
