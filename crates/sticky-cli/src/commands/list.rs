use sticky_core::{Fetch, View};

use crate::commands::common::{
    format_note_lines, note_to_list_item, open_app, require_fresh, unlock_private, NoteListItem,
    Settings,
};
use crate::error::CliError;

pub async fn run_list(
    settings: &Settings,
    view: View,
    search: Option<&str>,
    pin: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let mut app = open_app(settings)?;
    let loaded = app.load().await?;
    require_fresh(loaded.notes)?;

    if let Some(term) = search {
        app.set_search(term);
    }

    if view == View::Private {
        unlock_private(&mut app, pin).await?;
    } else {
        if loaded.has_pin == Fetch::Unavailable {
            eprintln!("Could not fetch PIN status; private notes stay locked.");
        }
        app.switch_view(view)?;
    }

    let notes = app.visible_notes();
    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        let username = app
            .session()
            .map(|session| session.username.clone())
            .unwrap_or_default();
        if notes.is_empty() {
            match app.search_term() {
                "" => println!("No notes in the {} view", app.view()),
                term => println!("No notes matching '{term}' in the {} view", app.view()),
            }
        }
        for line in format_note_lines(&notes, &username) {
            println!("{line}");
        }
    }

    if app.has_unseen_shared() {
        eprintln!("New activity in shared notes. Run `sticky list --view shared` to see it.");
    }

    Ok(())
}
