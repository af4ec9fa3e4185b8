use sticky_core::{NoteDraft, NoteId};

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_content, open_app, require_fresh,
    unlock_if_private, Settings,
};
use crate::error::CliError;

/// Field changes requested on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteEdits {
    pub title: Option<String>,
    pub content: Option<String>,
    pub private: Option<bool>,
}

impl NoteEdits {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.private.is_none()
    }

    pub fn apply(self, draft: &mut NoteDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(content) = self.content {
            draft.content = content;
        }
        if let Some(private) = self.private {
            draft.private = private;
        }
    }
}

/// Private notes need the PIN before they can be opened or changed.
pub async fn run_edit(
    settings: &Settings,
    id: NoteId,
    edits: NoteEdits,
    pin: Option<&str>,
) -> Result<(), CliError> {
    let mut app = open_app(settings)?;
    require_fresh(app.refresh_notes().await?)?;
    unlock_if_private(&mut app, id, pin).await?;
    let note = app.note(id).cloned().ok_or(CliError::NoteNotFound(id))?;

    let mut draft = NoteDraft::from_note(&note);
    if edits.is_empty() {
        let Some(edited_content) = capture_editor_input_with_initial(&note.content)? else {
            return Err(CliError::EmptyEditedContent);
        };
        draft.content = edited_content;
    } else {
        edits.apply(&mut draft);
        draft.title = normalize_content(&draft.title).unwrap_or_default();
        draft.content = normalize_content(&draft.content).unwrap_or_default();
    }

    if draft == NoteDraft::from_note(&note) {
        println!("{}", note.id);
        return Ok(());
    }

    let updated = app.save_note(Some(id), &draft).await?;
    println!("{}", updated.id);
    Ok(())
}
