use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::Serialize;
use sticky_core::util::normalize_text_option;
use sticky_core::{
    Change, Fetch, HistoryEntry, HttpNotesClient, JsonFileStorage, LocalStorage, Note, NoteId,
    NotesApi, NotesApp, PinOutcome, PinPrompt, User, View, ViewChange,
};

use crate::cli::GlobalOptions;
use crate::config_profiles::{CliProfilesConfig, APP_DIR_NAME};
use crate::error::CliError;

pub type CliApp = NotesApp<HttpNotesClient, JsonFileStorage>;

/// Profile, service URL and storage location for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub profile_name: String,
    pub api_base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub storage_path: PathBuf,
}

impl Settings {
    pub fn resolve(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load().map_err(CliError::Config)?;
        resolve_settings(
            &config,
            options,
            env::var("STICKY_API_URL").ok(),
            env::var_os("STICKY_STORAGE_PATH").map(PathBuf::from),
        )
    }

    pub fn require_api_url(&self) -> Result<&str, CliError> {
        self.api_base_url.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "No API URL configured for profile '{}'. Run `sticky config init --api-url <URL>` or set STICKY_API_URL.",
                self.profile_name
            ))
        })
    }

    pub fn storage(&self) -> JsonFileStorage {
        JsonFileStorage::new(&self.storage_path)
    }
}

/// Flags win over environment, environment over the profile file.
pub fn resolve_settings(
    config: &CliProfilesConfig,
    options: &GlobalOptions,
    env_api_url: Option<String>,
    env_storage_path: Option<PathBuf>,
) -> Result<Settings, CliError> {
    let profile_name = config.resolve_profile_name(options.profile.as_deref());
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let api_base_url = normalize_text_option(options.api_url.clone())
        .or_else(|| normalize_text_option(env_api_url))
        .or_else(|| profile.api_base_url());
    let storage_path = match options.storage_path.clone().or(env_storage_path) {
        Some(path) => path,
        None => default_storage_path(&profile_name)?,
    };

    Ok(Settings {
        profile_name,
        api_base_url,
        timeout: profile.request_timeout(),
        storage_path,
    })
}

pub fn default_storage_path(profile_name: &str) -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(profile_name).join("storage.json"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn open_app(settings: &Settings) -> Result<CliApp, CliError> {
    let api = HttpNotesClient::with_timeout(settings.require_api_url()?, settings.timeout)
        .map_err(sticky_core::Error::from)?;
    Ok(NotesApp::start(api, settings.storage())?)
}

/// Unwrap a read the CLI cannot continue without.
pub fn require_fresh<T>(fetch: Fetch<T>) -> Result<T, CliError> {
    fetch.fresh().ok_or(CliError::ServiceUnavailable)
}

/// Open the private view, submitting `pin` to whichever PIN form the gate opens.
///
/// Refetches the PIN status first when it is not known, so an unreachable
/// service never turns into a PIN setup.
pub async fn unlock_private<A: NotesApi, S: LocalStorage>(
    app: &mut NotesApp<A, S>,
    pin: Option<&str>,
) -> Result<(), CliError> {
    if app.gate().has_pin().is_none() {
        require_fresh(app.refresh_user_status().await?)?;
    }

    let ViewChange::PinRequired(prompt) = app.switch_view(View::Private)? else {
        return Ok(());
    };
    let Some(pin) = pin else {
        app.cancel_pin();
        return Err(match prompt {
            PinPrompt::Setup => CliError::PinSetupRequired,
            PinPrompt::Entry => CliError::PinRequired,
        });
    };
    match app.submit_pin(pin).await? {
        PinOutcome::Unlocked if prompt == PinPrompt::Setup => eprintln!("Private PIN set"),
        PinOutcome::Unlocked => {}
        PinOutcome::Rejected => return Err(CliError::IncorrectPin),
    }
    Ok(())
}

/// Unlock first when the cached note `id` is private.
pub async fn unlock_if_private<A: NotesApi, S: LocalStorage>(
    app: &mut NotesApp<A, S>,
    id: NoteId,
    pin: Option<&str>,
) -> Result<(), CliError> {
    if app.note(id).is_some_and(|note| note.private) {
        unlock_private(app, pin).await?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub owner: String,
    pub private: bool,
    pub shared_with: Vec<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub relative_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: i64,
    pub note_id: i64,
    pub change_type: String,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
    pub timestamp: i64,
    pub timestamp_iso: String,
}

pub fn format_note_lines(notes: &[Note], username: &str) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let title = note_preview(&note.title, 24);
            let preview = note_preview(&note.content, 40);
            let relative_time = note
                .last_activity()
                .map(|timestamp| format_relative_time(timestamp, now_ms))
                .unwrap_or_default();
            let tags = render_note_tags(note, username);

            if tags.is_empty() {
                format!("{:>6}  {title:<24}  {preview:<40}  {relative_time}", note.id.get())
            } else {
                format!(
                    "{:>6}  {title:<24}  {preview:<40}  {relative_time:<10}  {tags}",
                    note.id.get()
                )
            }
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();

    NoteListItem {
        id: note.id.get(),
        title: note.title.clone(),
        content: note.content.clone(),
        owner: note.owner.username.clone(),
        private: note.private,
        shared_with: note
            .shared_with
            .iter()
            .map(|user| user.username.clone())
            .collect(),
        created_at: note.created_at,
        updated_at: note.updated_at,
        relative_time: note
            .last_activity()
            .map(|timestamp| format_relative_time(timestamp, now_ms)),
    }
}

/// Ownership and sharing markers shown after a note line.
pub fn render_note_tags(note: &Note, username: &str) -> String {
    let mut tags = Vec::new();
    if note.private {
        tags.push("[private]".to_string());
    }
    if !note.is_owned_by(username) {
        tags.push(format!("from @{}", note.owner.username));
    }
    if !note.shared_with.is_empty() {
        let names = note
            .shared_with
            .iter()
            .map(|user| format!("@{}", user.username))
            .collect::<Vec<_>>()
            .join(" ");
        tags.push(format!("shared with {names}"));
    }
    tags.join("  ")
}

pub fn history_to_item(entry: &HistoryEntry) -> HistoryItem {
    let (old_content, new_content) = match &entry.change {
        Change::Created { new_content } => (None, Some(new_content.clone())),
        Change::Updated {
            old_content,
            new_content,
        } => (Some(old_content.clone()), Some(new_content.clone())),
        Change::Deleted { old_content } => (Some(old_content.clone()), None),
    };

    HistoryItem {
        id: entry.id,
        note_id: entry.note_id.get(),
        change_type: entry.change.change_type().to_string(),
        old_content,
        new_content,
        timestamp: entry.timestamp,
        timestamp_iso: format_timestamp(entry.timestamp),
    }
}

pub fn format_history_lines(entries: &[HistoryEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let summary = match &entry.change {
                Change::Created { new_content } => note_preview(new_content, 60),
                Change::Updated {
                    old_content,
                    new_content,
                } => format!(
                    "{} -> {}",
                    note_preview(old_content, 28),
                    note_preview(new_content, 28)
                ),
                Change::Deleted { old_content } => note_preview(old_content, 60),
            };
            format!(
                "{}  {:<7}  {summary}",
                format_timestamp(entry.timestamp),
                entry.change.change_type().to_string()
            )
        })
        .collect()
}

pub fn format_user_lines(users: &[User]) -> Vec<String> {
    users
        .iter()
        .map(|user| match user.email.as_deref() {
            Some(email) => format!("{:<20}  {email}", user.username),
            None => user.username.clone(),
        })
        .collect()
}

pub fn note_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("sticky-note-{}-{now}.md", std::process::id()))
}
