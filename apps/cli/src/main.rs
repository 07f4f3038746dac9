use std::{io, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config, AlwaysConfirm, Confirmation, DeleteOutcome, FilterCriteria, GenderFilter,
    HttpUserGateway, Settings, StoreError, UserCollectionStore,
};
use shared::domain::{Gender, UserId, UserStatus};
use tracing_subscriber::EnvFilter;

mod notice;
mod prompt;
mod render;
mod shell;

use notice::Notice;
use prompt::StdinConfirmation;
use shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "users", about = "List, filter and edit the remote users collection")]
struct Cli {
    /// Settings file (defaults to ./users.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Bearer token for create, update and delete.
    #[arg(long, global = true)]
    token: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long, default_value = "all")]
        gender: GenderFilter,
        #[arg(long, default_value = "")]
        name: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "male")]
        gender: Gender,
        #[arg(long, default_value = "active")]
        status: UserStatus,
    },
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long)]
        status: Option<UserStatus>,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Interactive session.
    Shell,
}

impl Command {
    /// Create works without the list; the others look records up in it.
    fn needs_mirror(&self) -> bool {
        matches!(
            self,
            Command::List { .. } | Command::Edit { .. } | Command::Delete { .. }
        )
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(url) = &cli.base_url {
        settings.api_base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        settings.api_token = Some(token.clone());
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = secs;
    }
    config::finalize(settings)
}

fn fail(err: StoreError) -> anyhow::Error {
    anyhow::anyhow!("{}", Notice::from(&err))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = resolve_settings(&cli)?;
    tracing::debug!(?settings, "settings resolved");
    let gateway = HttpUserGateway::new(&settings).context("failed to build http client")?;

    let confirmation: Arc<dyn Confirmation> = match cli.command {
        Command::Delete { yes: true, .. } => Arc::new(AlwaysConfirm),
        _ => Arc::new(StdinConfirmation),
    };
    let mut store = UserCollectionStore::new(Arc::new(gateway), confirmation);

    match cli.command {
        Command::Shell => Shell::new(store).run(&mut io::stdout()).await,
        command => run_once(&mut store, command).await,
    }
}

async fn run_once(store: &mut UserCollectionStore, command: Command) -> Result<()> {
    if command.needs_mirror() {
        store.initialize().await.map_err(fail)?;
    }

    match command {
        Command::List { gender, name } => {
            let criteria = FilterCriteria::default().with_gender(gender).with_name(name);
            print!("{}", render::table(&store.visible_records(&criteria)));
        }
        Command::Create {
            name,
            email,
            gender,
            status,
        } => {
            store.begin_create().map_err(fail)?;
            if let Some(draft) = store.draft_mut() {
                draft.name = name;
                draft.email = email;
                draft.gender = gender;
                draft.status = status;
            }
            let outcome = store.submit().await.map_err(fail)?;
            print!("{}", render::table(&[outcome.record()]));
        }
        Command::Edit {
            id,
            name,
            email,
            gender,
            status,
        } => {
            store.begin_edit(UserId(id)).map_err(fail)?;
            if let Some(draft) = store.draft_mut() {
                if let Some(name) = name {
                    draft.name = name;
                }
                if let Some(email) = email {
                    draft.email = email;
                }
                if let Some(gender) = gender {
                    draft.gender = gender;
                }
                if let Some(status) = status {
                    draft.status = status;
                }
            }
            let outcome = store.submit().await.map_err(fail)?;
            print!("{}", render::table(&[outcome.record()]));
        }
        Command::Delete { id, .. } => match store.request_delete(UserId(id)).await.map_err(fail)? {
            DeleteOutcome::Deleted(id) => println!("deleted user {id}"),
            DeleteOutcome::Declined => println!("kept user {id}"),
        },
        Command::Shell => bail!("the shell cannot run as a one-shot command"),
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
