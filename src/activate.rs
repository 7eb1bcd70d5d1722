//! Profile activation.
//!
//! Activating a profile means making git see its identity. That is done by
//! rewriting two files:
//! - `.git-credentials`, read by the `store` credential helper
//! - `.gitconfig`, which sets `user.name`/`user.email` and enables the helper
//!
//! The target is either a local directory (normally `~`) or the home
//! directory of an account on another machine reached over ssh. Nothing
//! records which profile is active; the contents of those two files are the
//! only source of truth.
//!
//! Remote activation never splices credential data into a command line. A
//! single ssh session runs a fixed script and the payload travels on stdin.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fs_utils::write_private;
use crate::profile::Profile;

pub const CREDENTIALS_FILE: &str = ".git-credentials";
pub const CONFIG_FILE: &str = ".gitconfig";

/// Runs on the remote host. Reads the credential line, then the config block.
const REMOTE_SCRIPT: &str = "umask 077 && IFS= read -r line && \
printf '%s\\n' \"$line\" > ~/.git-credentials && cat > ~/.gitconfig";

/// Where a profile gets activated
#[derive(Debug, Clone)]
pub enum Target {
    Local(PathBuf),
    Remote(RemoteHost),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(dir) => write!(f, "{}", dir.display()),
            Self::Remote(remote) => write!(f, "{}", remote.destination()),
        }
    }
}

/// How the ssh session authenticates
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Password collected from the operator, handed to `sshpass`
    Password(String),
    /// Keys or an ssh agent; ssh is run as-is
    Passwordless,
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::Passwordless => f.write_str("Passwordless"),
        }
    }
}

/// An account on a remote machine
#[derive(Debug, Clone)]
pub struct RemoteHost {
    pub host: String,
    pub user: String,
    pub auth: AuthMode,
}

impl RemoteHost {
    /// Build a remote target, rejecting values ssh would read as options.
    pub fn new(host: impl Into<String>, user: impl Into<String>, auth: AuthMode) -> Result<Self> {
        let host = host.into();
        let user = user.into();
        for (what, value) in [("host", &host), ("user", &user)] {
            if value.is_empty()
                || value.starts_with('-')
                || value.contains('@')
                || value.chars().any(|c| c.is_whitespace() || c.is_control())
            {
                return Err(Error::InvalidRemote(format!("bad {} '{}'", what, value)));
            }
        }
        Ok(Self { host, user, auth })
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// What a completed activation touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub nickname: String,
    pub credentials: PathBuf,
    pub config: PathBuf,
}

/// Activate `profile` at `target`. The transport is only used for remotes.
pub fn activate(profile: &Profile, target: &Target, transport: &dyn RemoteTransport) -> Result<()> {
    debug!(nickname = %profile.nickname, %target, "activating profile");
    match target {
        Target::Local(dir) => activate_local(profile, dir).map(|_| ()),
        Target::Remote(remote) => activate_remote(profile, remote, transport),
    }
}

/// Write a profile's credential and config files into `target_dir`.
///
/// Both files are replaced outright. If `.git-credentials` is written but
/// `.gitconfig` is not, the result is [`Error::PartialActivation`] and the
/// first file is left in place.
pub fn activate_local(profile: &Profile, target_dir: &Path) -> Result<Activation> {
    let credentials = target_dir.join(CREDENTIALS_FILE);
    let config = target_dir.join(CONFIG_FILE);

    let mut credential_line = profile.credential_string();
    credential_line.push('\n');
    write_private(&credentials, credential_line.as_bytes())
        .map_err(|e| Error::io(&credentials, e))?;

    if let Err(source) = std::fs::write(&config, profile.config_string()) {
        return Err(Error::PartialActivation {
            written: credentials,
            failed: config,
            source,
        });
    }

    info!(nickname = %profile.nickname, dir = %target_dir.display(), "activated profile locally");
    Ok(Activation {
        nickname: profile.nickname.clone(),
        credentials,
        config,
    })
}

/// The profile whose rendered files match what is currently in `target_dir`.
///
/// Missing or unreadable files mean nothing is active.
pub fn detect_active<'a>(profiles: &'a [Profile], target_dir: &Path) -> Option<&'a Profile> {
    let credentials = std::fs::read_to_string(target_dir.join(CREDENTIALS_FILE)).ok()?;
    let config = std::fs::read_to_string(target_dir.join(CONFIG_FILE)).ok()?;
    let credential_line = credentials.lines().next()?.trim_end();

    profiles.iter().find(|profile| {
        profile.credential_string() == credential_line && profile.config_string() == config
    })
}

/// Payload shipped to the remote script: credential line, then config.
pub fn remote_payload(profile: &Profile) -> String {
    format!("{}\n{}", profile.credential_string(), profile.config_string())
}

/// Moves a rendered payload to a remote account
pub trait RemoteTransport {
    fn deliver(&self, remote: &RemoteHost, payload: &[u8]) -> Result<()>;
}

/// [`RemoteTransport`] over the system `ssh` client
#[derive(Debug, Clone)]
pub struct SshTransport {
    ssh_program: String,
    sshpass_program: String,
}

impl Default for SshTransport {
    fn default() -> Self {
        Self {
            ssh_program: "ssh".to_string(),
            sshpass_program: "sshpass".to_string(),
        }
    }
}

impl SshTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The command that will be spawned for `remote`. Holds no credential data.
    pub fn command(&self, remote: &RemoteHost) -> Command {
        let mut cmd = match &remote.auth {
            AuthMode::Passwordless => Command::new(&self.ssh_program),
            AuthMode::Password(password) => {
                let mut cmd = Command::new(&self.sshpass_program);
                cmd.env("SSHPASS", password).arg("-e").arg(&self.ssh_program);
                cmd
            }
        };
        cmd.arg("--").arg(remote.destination()).arg(REMOTE_SCRIPT);
        cmd
    }
}

impl RemoteTransport for SshTransport {
    fn deliver(&self, remote: &RemoteHost, payload: &[u8]) -> Result<()> {
        let destination = remote.destination();
        let failure = |reason: String| Error::RemoteTransportFailure {
            destination: destination.clone(),
            reason,
        };

        let mut cmd = self.command(remote);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let program = cmd.get_program().to_string_lossy().into_owned();
        debug!(%destination, %program, "starting remote session");
        let mut child = cmd
            .spawn()
            .map_err(|e| failure(format!("failed to start {}: {}", program, e)))?;

        // Keep going on a write error so the child is reaped and its stderr kept.
        let send_error = child
            .stdin
            .take()
            .and_then(|mut stdin| stdin.write_all(payload).err());

        let output = child
            .wait_with_output()
            .map_err(|e| failure(format!("{} did not finish: {}", program, e)))?;

        if let Some(reason) = session_failure(&program, &output, send_error) {
            return Err(failure(reason));
        }
        Ok(())
    }
}

/// Why a finished session counts as failed, if it does.
///
/// A non-zero exit wins, with ssh's stderr attached; otherwise a failed
/// stdin write is reported on its own.
fn session_failure(
    program: &str,
    output: &Output,
    send_error: Option<std::io::Error>,
) -> Option<String> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if !output.status.success() {
        let mut reason = format!("{} exited with {}", program, output.status);
        if !stderr.is_empty() {
            reason.push_str(": ");
            reason.push_str(stderr);
        }
        if let Some(e) = send_error {
            reason.push_str(&format!(" (failed to send profile: {})", e));
        }
        return Some(reason);
    }
    send_error.map(|e| format!("failed to send profile: {}", e))
}

/// Overwrite `~/.git-credentials` and `~/.gitconfig` on a remote account.
pub fn activate_remote(
    profile: &Profile,
    remote: &RemoteHost,
    transport: &dyn RemoteTransport,
) -> Result<()> {
    transport.deliver(remote, remote_payload(profile).as_bytes())?;
    info!(
        nickname = %profile.nickname,
        destination = %remote.destination(),
        "activated profile on remote host"
    );
    Ok(())
}

/// Activate a profile for one repository only.
///
/// Writes both files into `repo_dir` as [`activate_local`] does, then sets
/// `user.name`, `user.email` and `credential.helper` in the repository's own
/// config so the global identity is left alone.
pub fn activate_local_into_repo(profile: &Profile, repo_dir: &Path) -> Result<Activation> {
    let activation = activate_local(profile, repo_dir)?;

    // git hands helper strings to the shell.
    let helper = format!(
        "store --file {}",
        shell_quote(&activation.credentials.display().to_string())
    );
    let settings = [
        ("user.name", profile.name.as_str()),
        ("user.email", profile.email.as_str()),
        ("credential.helper", helper.as_str()),
    ];
    for (key, value) in settings {
        git_config_local(repo_dir, key, value)?;
    }

    info!(nickname = %profile.nickname, repo = %repo_dir.display(), "copied profile into repository");
    Ok(activation)
}

/// Single-quote `value` for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn git_config_local(repo_dir: &Path, key: &str, value: &str) -> Result<()> {
    let failure = |reason: String| Error::GitConfig {
        key: key.to_string(),
        reason,
    };

    let output = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(["config", "--local", key, value])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| failure(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(failure(stderr.trim().to_string()));
    }
    debug!(key, repo = %repo_dir.display(), "set repository config");
    Ok(())
}
