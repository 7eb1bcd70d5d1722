use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::BufRead;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use gitprof::{
    activate::SshTransport,
    commands::{self, AddOptions},
    paths::Paths,
    prompt::InquirePrompter,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "gitprof")]
#[command(about = "Git account profile switcher - keep several GitHub identities and swap them")]
#[command(version)]
struct Cli {
    /// Directory whose .git-credentials and .gitconfig get switched [default: ~]
    #[arg(long, global = true, env = "GITPROF_PATH", value_name = "DIR")]
    path: Option<PathBuf>,

    /// Directory where profiles are saved [default: ~/.git-accounts]
    #[arg(long, global = true, env = "GITPROF_STORE", value_name = "DIR")]
    save_path: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved profiles
    #[command(visible_alias = "ls")]
    List,

    /// Save a new profile (prompts for anything not given)
    Add {
        /// Name to save the profile under [default: the username]
        #[arg(long)]
        nickname: Option<String>,

        /// GitHub username
        #[arg(long)]
        username: Option<String>,

        /// Email for user.email
        #[arg(long)]
        email: Option<String>,

        /// Display name for user.name
        #[arg(long)]
        name: Option<String>,

        /// Read the access token from the first line of stdin
        #[arg(long)]
        token_stdin: bool,

        /// Overwrite an existing profile without asking
        #[arg(long)]
        force: bool,
    },

    /// Activate a profile locally, or on another machine with --remote
    Switch {
        /// Nickname of the profile
        nickname: String,

        /// Switch the account USER on HOST over ssh instead
        #[arg(short, long, num_args = 2, value_names = ["HOST", "USER"])]
        remote: Option<Vec<String>>,

        /// Don't prompt for the ssh password (use keys or an agent)
        #[arg(long, requires = "remote")]
        no_password: bool,
    },

    /// Use a profile for the repository in the current directory only
    CopyToLocal {
        /// Nickname of the profile
        nickname: String,
    },

    /// Show one profile's details
    Show {
        /// Nickname of the profile
        nickname: String,
    },

    /// Show which profile is active in the target directory
    Current,

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("GITPROF_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("gitprof=debug")
        } else {
            EnvFilter::new("gitprof=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn read_token_from_stdin() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read token from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn run(cli: Cli, ui: &Ui) -> Result<()> {
    let paths = Paths::new(cli.path, cli.save_path)?;
    let prompter = InquirePrompter;

    match cli.command {
        Commands::List => commands::list(&paths, ui),
        Commands::Add {
            nickname,
            username,
            email,
            name,
            token_stdin,
            force,
        } => {
            let token = if token_stdin {
                Some(read_token_from_stdin()?)
            } else {
                None
            };
            let opts = AddOptions {
                nickname,
                username,
                token,
                email,
                name,
                force,
            };
            commands::add(&paths, ui, &prompter, opts)
        }
        Commands::Switch {
            nickname,
            remote: Some(remote),
            no_password,
        } => {
            let remote = commands::remote_host(&remote[0], &remote[1], no_password, &prompter)?;
            commands::switch_remote(&paths, &nickname, &remote, &SshTransport::new(), ui)
        }
        Commands::Switch { nickname, .. } => commands::switch(&paths, &nickname, ui),
        Commands::CopyToLocal { nickname } => {
            let repo_dir = std::env::current_dir().context("Failed to read current directory")?;
            commands::copy_to_local(&paths, &nickname, &repo_dir, ui)
        }
        Commands::Show { nickname } => commands::show(&paths, &nickname, ui),
        Commands::Current => commands::current(&paths, ui),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "gitprof", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ui = Ui::new(cli.color, cli.no_color);

    if let Err(e) = run(cli, &ui) {
        ui.err(format!("{:#}", e));
        if let Some(hint) = e
            .downcast_ref::<gitprof::error::Error>()
            .and_then(|err| err.hint())
        {
            ui.hint(hint);
        }
        std::process::exit(1);
    }
}
