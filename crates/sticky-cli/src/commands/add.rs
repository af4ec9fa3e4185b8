use sticky_core::NoteDraft;

use crate::commands::common::{normalize_content, note_preview, open_app, resolve_note_content, Settings};
use crate::error::CliError;

pub async fn run_add(
    settings: &Settings,
    title: Option<&str>,
    private: bool,
    content_parts: &[String],
) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;
    let title = resolve_title(title, &content);
    let draft = NoteDraft::new(title, content, private)?;

    let mut app = open_app(settings)?;
    let note = app.save_note(None, &draft).await?;

    println!("{}", note.id);
    Ok(())
}

/// Explicit title, or the first line of the content.
pub fn resolve_title(title: Option<&str>, content: &str) -> String {
    title
        .and_then(normalize_content)
        .unwrap_or_else(|| note_preview(content, 60))
}
