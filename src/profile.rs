//! The credential record behind every profile.
//!
//! A [`Profile`] knows how to render itself into the two files git reads:
//! the one-line `.git-credentials` entry used by the `store` credential
//! helper, and the `.gitconfig` block that sets the identity and turns that
//! helper on. Identity is the nickname alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

/// Host the credential line is written for.
pub const CREDENTIAL_HOST: &str = "github.com";

/// One named set of git credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub nickname: String,
    pub username: String,
    /// Personal access token. Kept out of `Debug` and [`Profile::describe`].
    pub token: String,
    pub email: String,
    /// Display name written to `user.name`
    pub name: String,
}

impl Profile {
    /// Build a profile, defaulting the nickname to the username.
    pub fn new(
        username: impl Into<String>,
        token: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        nickname: Option<String>,
    ) -> Result<Self> {
        let username = username.into();
        let nickname = nickname
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone());
        validate_nickname(&nickname)?;

        Ok(Self {
            nickname,
            username,
            token: token.into(),
            email: email.into(),
            name: name.into(),
        })
    }

    /// The `.git-credentials` line, without a line terminator.
    ///
    /// Values are embedded verbatim; nothing is percent-encoded.
    pub fn credential_string(&self) -> String {
        format!(
            "https://{}:{}@{}",
            self.username, self.token, CREDENTIAL_HOST
        )
    }

    /// The `.gitconfig` contents. Keys are tab-indented under their section.
    pub fn config_string(&self) -> String {
        format!(
            "[user]\n\tname = {}\n\temail = {}\n[credential]\n\thelper = store\n",
            self.name, self.email
        )
    }

    /// Human-readable summary; never includes the token.
    pub fn describe(&self) -> String {
        format!(
            "Account Name: {}\nUsername: {}\nEmail: {}\nName: {}",
            self.nickname, self.username, self.email, self.name
        )
    }

    /// True when `other` is the same profile, i.e. has the same nickname.
    pub fn is_same_profile(&self, other: &Profile) -> bool {
        self.nickname == other.nickname
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_profile(other)
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nickname.hash(state);
    }
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("nickname", &self.nickname)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish()
    }
}

/// Validate a nickname.
///
/// Nicknames become file names in the store, so only ASCII letters, digits,
/// `-`, `_` and `.` are allowed, and a leading `.` is rejected.
pub fn validate_nickname(nickname: &str) -> Result<()> {
    let valid = !nickname.is_empty()
        && nickname.chars().count() <= 64
        && !nickname.starts_with('.')
        && nickname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidNickname(nickname.to_string()))
    }
}
