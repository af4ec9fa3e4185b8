use sticky_core::NoteId;

use crate::commands::common::{open_app, Settings};
use crate::error::CliError;

pub async fn run_share(settings: &Settings, id: NoteId, username: &str) -> Result<(), CliError> {
    let mut app = open_app(settings)?;
    app.share_note(id, username).await?;
    println!("Shared note {id} with {}", username.trim());
    Ok(())
}
