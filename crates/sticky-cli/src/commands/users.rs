use crate::commands::common::{format_user_lines, open_app, require_fresh, Settings};
use crate::error::CliError;

pub async fn run_users(settings: &Settings, as_json: bool) -> Result<(), CliError> {
    let mut app = open_app(settings)?;
    let users = require_fresh(app.share_candidates().await?)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else {
        for line in format_user_lines(&users) {
            println!("{line}");
        }
    }

    Ok(())
}
