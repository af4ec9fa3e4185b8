use sticky_core::NoteId;

use crate::commands::common::{open_app, Settings};
use crate::error::CliError;

pub async fn run_delete(settings: &Settings, id: NoteId) -> Result<(), CliError> {
    let mut app = open_app(settings)?;
    app.delete_note(id).await?;
    println!("{id}");
    Ok(())
}
