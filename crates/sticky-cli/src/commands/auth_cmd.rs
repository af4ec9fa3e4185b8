use sticky_core::{HttpNotesClient, NotesApi, Session, SessionStore};

use crate::cli::AuthCommands;
use crate::commands::common::Settings;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, settings: &Settings) -> Result<(), CliError> {
    let sessions = SessionStore::new(settings.storage());
    let profile_name = &settings.profile_name;

    match command {
        AuthCommands::Login { username, token } => {
            let session = Session::new(token, username)?;
            let api = HttpNotesClient::with_timeout(settings.require_api_url()?, settings.timeout)
                .map_err(sticky_core::Error::from)?;
            let user = api
                .current_user(&session.token)
                .await
                .map_err(sticky_core::Error::from)?;
            if user.username != session.username {
                return Err(sticky_core::Error::Auth(format!(
                    "token belongs to '{}', not '{}'",
                    user.username, session.username
                ))
                .into());
            }

            sessions.save(&session)?;
            tracing::debug!(path = %settings.storage_path.display(), "Session stored");
            println!("Signed in profile '{profile_name}' as {}", session.username);
            Ok(())
        }
        AuthCommands::Status => {
            if let Some(session) = sessions.load()? {
                println!(
                    "Profile '{profile_name}' is signed in as {}",
                    session.username
                );
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout => {
            sessions.clear()?;
            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
