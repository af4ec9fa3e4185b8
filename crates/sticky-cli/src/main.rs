//! Sticky CLI - command-line client for the sticky notes service
//!
//! List, write and share notes from the terminal.

mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::Settings;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, NoteEdits};
use crate::commands::history::run_history;
use crate::commands::list::run_list;
use crate::commands::share::run_share;
use crate::commands::users::run_users;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sticky=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = &cli.global;

    match cli.command {
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
        Commands::Config { command } => run_config(command, options)?,
        Commands::Auth { command } => run_auth(command, &Settings::resolve(options)?).await?,
        Commands::List {
            view,
            search,
            pin,
            json,
        } => {
            let settings = Settings::resolve(options)?;
            run_list(&settings, view.into(), search.as_deref(), pin.as_deref(), json).await?;
        }
        Commands::Add {
            title,
            private,
            content,
        } => run_add(&Settings::resolve(options)?, title.as_deref(), private, &content).await?,
        Commands::Edit {
            id,
            title,
            content,
            private,
            public,
            pin,
        } => {
            let edits = NoteEdits {
                title,
                content,
                private: privacy_flag(private, public),
            };
            run_edit(&Settings::resolve(options)?, id, edits, pin.as_deref()).await?;
        }
        Commands::Delete { id } => run_delete(&Settings::resolve(options)?, id).await?,
        Commands::History { id, pin, json } => {
            run_history(&Settings::resolve(options)?, id, pin.as_deref(), json).await?;
        }
        Commands::Users { json } => run_users(&Settings::resolve(options)?, json).await?,
        Commands::Share { id, username } => {
            run_share(&Settings::resolve(options)?, id, &username).await?;
        }
    }

    Ok(())
}

/// `--private` / `--public` as a tri-state; clap rejects both together.
const fn privacy_flag(private: bool, public: bool) -> Option<bool> {
    if private {
        Some(true)
    } else if public {
        Some(false)
    } else {
        None
    }
}
