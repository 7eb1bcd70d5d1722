//! Command handlers for the CLI.
//!
//! Each function here backs one subcommand in `main.rs` and coordinates:
//! - `crate::store` to read and write profiles
//! - `crate::activate` to switch the active credential files
//! - `crate::prompt` and `crate::ui` to talk to the operator

use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::{debug, info};

use crate::activate::{
    AuthMode, RemoteHost, RemoteTransport, Target, activate, activate_local,
    activate_local_into_repo, detect_active,
};
use crate::paths::Paths;
use crate::profile::{Profile, validate_nickname};
use crate::prompt::Prompter;
use crate::store::ProfileStore;
use crate::ui::Ui;

/// How many nicknames `add` will ask for before giving up
pub const MAX_NICKNAME_ATTEMPTS: usize = 3;

/// Values for `add` that were supplied up front; the rest are prompted for.
#[derive(Debug, Default, Clone)]
pub struct AddOptions {
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub token: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Overwrite an existing profile without asking
    pub force: bool,
}

fn open_store(paths: &Paths) -> Result<ProfileStore> {
    ProfileStore::open(&paths.store_dir)
        .with_context(|| format!("Failed to open profile store {}", paths.store_dir.display()))
}

/// List all saved profiles
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    let store = open_store(paths)?;
    let mut entries = store.load_all_entries()?;

    if entries.is_empty() {
        ui.warn("No profiles found.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {} add", ui.bold("gitprof")));
        return Ok(());
    }

    entries.sort_by(|a, b| a.profile.nickname.cmp(&b.profile.nickname));
    let profiles: Vec<Profile> = entries.iter().map(|e| e.profile.clone()).collect();
    let active = detect_active(&profiles, &paths.target_dir).map(|p| p.nickname.clone());

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Profile"),
        ui.header_cell("Username"),
        ui.header_cell("Email"),
        ui.header_cell("Name"),
        ui.header_cell("Saved"),
    ]);

    for entry in &entries {
        let profile = &entry.profile;
        let is_active = active.as_deref() == Some(profile.nickname.as_str());
        let nickname_cell = if is_active {
            ui.active_cell(&profile.nickname)
        } else {
            ui.cell(&profile.nickname)
        };

        table.add_row(vec![
            ui.cell(if is_active { ui.icon_ok() } else { " " }),
            nickname_cell,
            ui.cell(&profile.username),
            ui.cell(&profile.email),
            ui.cell(&profile.name),
            ui.cell(entry.saved_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    ui.section("Profiles");
    ui.println(table.to_string());
    Ok(())
}

/// Print one profile's details (never the token)
pub fn show(paths: &Paths, nickname: &str, ui: &Ui) -> Result<()> {
    let profile = open_store(paths)?.get(nickname)?;
    ui.println(profile.describe());
    Ok(())
}

/// Report which saved profile the target directory currently matches
pub fn current(paths: &Paths, ui: &Ui) -> Result<()> {
    let profiles = open_store(paths)?.load_all()?;

    match detect_active(&profiles, &paths.target_dir) {
        Some(profile) => {
            ui.ok(format!(
                "Active profile in {}: {}",
                paths.target_dir.display(),
                ui.bold(&profile.nickname)
            ));
            ui.println(ui.dim(format!("username {}, email {}", profile.username, profile.email)));
        }
        None if paths.target_credentials().exists() => {
            ui.warn(format!(
                "{} does not match any saved profile",
                paths.target_credentials().display()
            ));
        }
        None => ui.info(format!(
            "No credentials file in {}",
            paths.target_dir.display()
        )),
    }
    Ok(())
}

/// Capture a new profile and save it, confirming before overwriting.
pub fn add(paths: &Paths, ui: &Ui, prompter: &dyn Prompter, opts: AddOptions) -> Result<()> {
    let store = open_store(paths)?;

    let username = required(opts.username, prompter, "GitHub username:")?;
    let nickname = choose_nickname(&store, ui, prompter, opts.nickname, &username, opts.force)?;

    let token = match opts.token {
        Some(token) => token,
        None => prompter.secret("Personal access token:")?,
    };
    if token.trim().is_empty() {
        bail!("Personal access token cannot be empty");
    }
    let email = required(opts.email, prompter, "Email:")?;
    let name = required(opts.name, prompter, "Your name:")?;

    let profile = Profile::new(username, token.trim(), email, name, Some(nickname))?;
    let path = store.save(&profile)?;

    info!(nickname = %profile.nickname, "added profile");
    ui.ok(format!("Saved profile '{}'", profile.nickname));
    ui.println(ui.dim(format!("  {}", path.display())));
    ui.newline();
    ui.println("To activate it:");
    ui.println(format!("  gitprof switch {}", profile.nickname));
    Ok(())
}

fn required(value: Option<String>, prompter: &dyn Prompter, message: &str) -> Result<String> {
    let value = match value {
        Some(value) => value,
        None => prompter.text(message)?,
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        bail!("{} cannot be empty", message.trim_end_matches(':'));
    }
    Ok(value)
}

/// Settle on a nickname, asking again (up to a limit) when the operator
/// declines to overwrite an existing profile.
fn choose_nickname(
    store: &ProfileStore,
    ui: &Ui,
    prompter: &dyn Prompter,
    given: Option<String>,
    username: &str,
    force: bool,
) -> Result<String> {
    let interactive = given.is_none();
    let mut given = given;

    for _ in 0..MAX_NICKNAME_ATTEMPTS {
        let answer = match given.take() {
            Some(nickname) => nickname,
            None => prompter.text(&format!(
                "What do you want to name the account? (blank for '{}')",
                username
            ))?,
        };
        let nickname = match answer.trim() {
            "" => username.to_string(),
            trimmed => trimmed.to_string(),
        };

        if let Err(e) = validate_nickname(&nickname) {
            if !interactive {
                return Err(e.into());
            }
            ui.warn(e.to_string());
            continue;
        }

        if force || !store.contains(&nickname)? {
            return Ok(nickname);
        }

        ui.warn(format!("Profile '{}' already exists.", nickname));
        if prompter.confirm("Would you like to overwrite it?", false)? {
            debug!(%nickname, "overwrite confirmed");
            return Ok(nickname);
        }
        if !interactive {
            bail!("Cancelled: profile '{}' was left unchanged", nickname);
        }
    }

    bail!(
        "Cancelled after {} attempts without choosing a nickname",
        MAX_NICKNAME_ATTEMPTS
    )
}

/// Activate a profile in the target directory
pub fn switch(paths: &Paths, nickname: &str, ui: &Ui) -> Result<()> {
    let profile = open_store(paths)?.get(nickname)?;
    paths.ensure_dirs()?;

    activate_local(&profile, &paths.target_dir)?;
    ui.ok(format!(
        "Switched to {} with username {}",
        profile.nickname, profile.username
    ));
    Ok(())
}

/// Build the remote target, asking for the ssh password unless told not to.
pub fn remote_host(
    host: &str,
    user: &str,
    no_password: bool,
    prompter: &dyn Prompter,
) -> Result<RemoteHost> {
    // Validate before prompting so a typo doesn't cost a password entry.
    RemoteHost::new(host, user, AuthMode::Passwordless)?;
    let auth = if no_password {
        AuthMode::Passwordless
    } else {
        AuthMode::Password(prompter.secret(&format!("Enter password for {}@{}:", user, host))?)
    };
    Ok(RemoteHost::new(host, user, auth)?)
}

/// Activate a profile on a remote account
pub fn switch_remote(
    paths: &Paths,
    nickname: &str,
    remote: &RemoteHost,
    transport: &dyn RemoteTransport,
    ui: &Ui,
) -> Result<()> {
    let profile = open_store(paths)?.get(nickname)?;

    let spinner = ui.spinner(format!("Switching {} to '{}'...", remote.destination(), nickname));
    match activate(&profile, &Target::Remote(remote.clone()), transport) {
        Ok(()) => {
            ui.spinner_finish_ok(
                &spinner,
                format!(
                    "Switched {} to {} with username {}",
                    remote.destination(),
                    profile.nickname,
                    profile.username
                ),
            );
            Ok(())
        }
        Err(e) => {
            ui.spinner_finish_err(&spinner, format!("Failed to switch {}", remote.destination()));
            Err(e.into())
        }
    }
}

/// Use a profile for the repository in `repo_dir` only
pub fn copy_to_local(paths: &Paths, nickname: &str, repo_dir: &Path, ui: &Ui) -> Result<()> {
    let profile = open_store(paths)?.get(nickname)?;

    let activation = activate_local_into_repo(&profile, repo_dir)?;
    ui.ok(format!(
        "Repository {} now uses {} ({})",
        repo_dir.display(),
        profile.nickname,
        profile.email
    ));
    ui.warn(format!(
        "{} holds your token; keep it out of commits",
        activation.credentials.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::prompt::scripted::ScriptedPrompter;
    use crate::test_utils::{sample_profile, setup_test_paths};
    use crate::ui::ColorMode;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    fn test_ui() -> Ui {
        Ui::new(ColorMode::Never, false)
    }

    fn stored(paths: &Paths, nickname: &str) -> Profile {
        ProfileStore::open(&paths.store_dir)
            .unwrap()
            .get(nickname)
            .unwrap()
    }

    struct CapturingTransport(RefCell<Vec<String>>);

    impl RemoteTransport for CapturingTransport {
        fn deliver(&self, remote: &RemoteHost, payload: &[u8]) -> crate::error::Result<()> {
            self.0.borrow_mut().push(format!(
                "{} {}",
                remote.destination(),
                String::from_utf8_lossy(payload)
            ));
            Ok(())
        }
    }

    #[test]
    fn test_list_empty() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        assert!(list(&paths, &test_ui()).is_ok());
    }

    #[test]
    fn test_list_fails_on_corrupt_store() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        fs::create_dir_all(&paths.store_dir).unwrap();
        fs::write(paths.store_dir.join("bad.json"), "{").unwrap();

        let err = list(&paths, &test_ui()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::CorruptProfile { .. })
        ));
    }

    #[test]
    fn test_add_interactive() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let prompter = ScriptedPrompter::new(&["alice", "work", "T1", "a@x.com", "Alice"]);

        add(&paths, &test_ui(), &prompter, AddOptions::default()).unwrap();

        let profile = stored(&paths, "work");
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.token, "T1");
        assert_eq!(profile.email, "a@x.com");
        assert_eq!(profile.name, "Alice");
    }

    #[test]
    fn test_add_blank_nickname_uses_username() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let prompter = ScriptedPrompter::new(&["alice", "", "T1", "a@x.com", "Alice"]);

        add(&paths, &test_ui(), &prompter, AddOptions::default()).unwrap();
        assert_eq!(stored(&paths, "alice").username, "alice");
    }

    #[test]
    fn test_add_decline_overwrite_then_pick_new_name() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();

        let prompter =
            ScriptedPrompter::new(&["carol", "work", "n", "work2", "T3", "c@x.com", "Carol"]);
        add(&paths, &test_ui(), &prompter, AddOptions::default()).unwrap();

        assert_eq!(stored(&paths, "work").token, "T1");
        assert_eq!(stored(&paths, "work2").token, "T3");
    }

    #[test]
    fn test_add_confirm_overwrite() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();

        let prompter = ScriptedPrompter::new(&["carol", "work", "y", "T3", "c@x.com", "Carol"]);
        add(&paths, &test_ui(), &prompter, AddOptions::default()).unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].username, "carol");
    }

    #[test]
    fn test_add_gives_up_after_repeated_declines() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();

        let prompter =
            ScriptedPrompter::new(&["carol", "work", "n", "work", "n", "work", "n", "extra"]);
        let err = add(&paths, &test_ui(), &prompter, AddOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Cancelled"));
        assert_eq!(stored(&paths, "work").token, "T1");
    }

    #[test]
    fn test_add_non_interactive_with_force() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();

        let opts = AddOptions {
            nickname: Some("work".into()),
            username: Some("carol".into()),
            token: Some("T3".into()),
            email: Some("c@x.com".into()),
            name: Some("Carol".into()),
            force: true,
        };
        let prompter = ScriptedPrompter::new(&[]);
        add(&paths, &test_ui(), &prompter, opts).unwrap();

        assert!(prompter.asked.borrow().is_empty());
        assert_eq!(stored(&paths, "work").username, "carol");
    }

    #[test]
    fn test_add_given_nickname_declined_cancels() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();

        let opts = AddOptions {
            nickname: Some("work".into()),
            username: Some("carol".into()),
            ..Default::default()
        };
        let prompter = ScriptedPrompter::new(&["n"]);
        assert!(add(&paths, &test_ui(), &prompter, opts).is_err());
        assert_eq!(stored(&paths, "work").username, "alice");
    }

    #[test]
    fn test_add_rejects_empty_token() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let prompter = ScriptedPrompter::new(&["alice", "work", "  "]);
        assert!(add(&paths, &test_ui(), &prompter, AddOptions::default()).is_err());
        assert!(!ProfileStore::open(&paths.store_dir).unwrap().contains("work").unwrap());
    }

    #[test]
    fn test_switch_writes_target_files() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();
        store.save(&sample_profile("personal", "bob", "T2")).unwrap();

        switch(&paths, "work", &test_ui()).unwrap();

        let credentials = fs::read_to_string(paths.target_credentials()).unwrap();
        assert_eq!(credentials.trim_end(), "https://alice:T1@github.com");
        let config = fs::read_to_string(paths.target_config()).unwrap();
        assert!(config.contains("name = Alice"));
        assert!(config.contains("email = a@x.com"));
        assert!(config.contains("helper = store"));
        assert!(current(&paths, &test_ui()).is_ok());
    }

    #[test]
    fn test_switch_unknown_profile_leaves_files() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();
        paths.ensure_dirs().unwrap();
        fs::write(paths.target_credentials(), "https://old:X@github.com\n").unwrap();

        let err = switch(&paths, "nobody", &test_ui()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ProfileNotFound(n)) if n == "nobody"
        ));
        assert_eq!(
            fs::read_to_string(paths.target_credentials()).unwrap(),
            "https://old:X@github.com\n"
        );
        assert!(!paths.target_config().exists());
    }

    #[test]
    fn test_switch_remote_ships_payload() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let store = ProfileStore::open(&paths.store_dir).unwrap();
        store.save(&sample_profile("work", "alice", "T1")).unwrap();

        let transport = CapturingTransport(RefCell::default());
        let remote = RemoteHost::new("box", "ci", AuthMode::Passwordless).unwrap();
        switch_remote(&paths, "work", &remote, &transport, &test_ui()).unwrap();

        let sent = transport.0.borrow();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("ci@box https://alice:T1@github.com\n[user]"));
    }

    #[test]
    fn test_switch_remote_unknown_profile() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let transport = CapturingTransport(RefCell::default());
        let remote = RemoteHost::new("box", "ci", AuthMode::Passwordless).unwrap();

        assert!(switch_remote(&paths, "work", &remote, &transport, &test_ui()).is_err());
        assert!(transport.0.borrow().is_empty());
    }

    #[test]
    fn test_remote_host_prompts_for_password() {
        let prompter = ScriptedPrompter::new(&["hunter2"]);
        let remote = remote_host("box", "ci", false, &prompter).unwrap();
        assert_eq!(remote.auth, AuthMode::Password("hunter2".into()));
        assert_eq!(prompter.asked.borrow()[0], "Enter password for ci@box:");

        let prompter = ScriptedPrompter::new(&[]);
        let remote = remote_host("box", "ci", true, &prompter).unwrap();
        assert_eq!(remote.auth, AuthMode::Passwordless);
    }

    #[test]
    fn test_remote_host_rejects_option_like_host_before_prompting() {
        let prompter = ScriptedPrompter::new(&["hunter2"]);
        assert!(remote_host("-oProxyCommand=sh", "ci", false, &prompter).is_err());
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test]
    fn test_show_unknown_profile() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        assert!(show(&paths, "nobody", &test_ui()).is_err());
    }

    #[test]
    fn test_copy_to_local_unknown_profile() {
        let temp = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp);
        let repo = temp.path().join("repo");
        fs::create_dir_all(&repo).unwrap();

        assert!(copy_to_local(&paths, "nobody", &repo, &test_ui()).is_err());
        assert!(!repo.join(".git-credentials").exists());
    }
}
