//! Test utilities shared across test modules

use crate::paths::Paths;
use crate::profile::Profile;
use tempfile::TempDir;

/// Paths rooted in a temp dir: store at `<tmp>/.git-accounts`, target `<tmp>/home`.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths {
        store_dir: temp_dir.path().join(".git-accounts"),
        target_dir: temp_dir.path().join("home"),
    }
}

/// A profile with fixed email `a@x.com` and display name `Alice`.
pub fn sample_profile(nickname: &str, username: &str, token: &str) -> Profile {
    Profile {
        nickname: nickname.to_string(),
        username: username.to_string(),
        token: token.to_string(),
        email: "a@x.com".to_string(),
        name: "Alice".to_string(),
    }
}
