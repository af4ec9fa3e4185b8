use sticky_core::NoteId;

use crate::commands::common::{
    format_history_lines, history_to_item, open_app, require_fresh, unlock_if_private,
    HistoryItem, Settings,
};
use crate::error::CliError;

pub async fn run_history(
    settings: &Settings,
    id: NoteId,
    pin: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let mut app = open_app(settings)?;
    require_fresh(app.refresh_notes().await?)?;
    unlock_if_private(&mut app, id, pin).await?;
    let entries = require_fresh(app.history(id).await?)?;

    if as_json {
        let json_items = entries
            .iter()
            .map(history_to_item)
            .collect::<Vec<HistoryItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if entries.is_empty() {
        println!("No history for note {id}");
    } else {
        for line in format_history_lines(&entries) {
            println!("{line}");
        }
    }

    Ok(())
}
