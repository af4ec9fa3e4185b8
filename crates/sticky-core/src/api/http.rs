//! `reqwest` implementation of [`NotesApi`].

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;

use super::wire::{self, WireHistoryEntry, WireNote, WireUser};
use super::{ApiError, ApiResult, NotesApi};
use crate::models::{HistoryEntry, Note, NoteDraft, NoteId, User};
use crate::unlock::Pin;
use crate::util::{compact_text, is_http_url, normalize_text_option};

const NOTES_PATH: &str = "/api/notes";

/// HTTP client for the notes service
#[derive(Debug, Clone)]
pub struct HttpNotesClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpNotesClient {
    /// Builds a client without a request timeout.
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> ApiResult<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|error| {
            ApiError::InvalidConfiguration(format!("failed to construct HTTP client: {error}"))
        })?;
        Ok(Self { base_url, client })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{NOTES_PATH}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
    }

    /// Send and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "notes API response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }
        Ok(body)
    }
}

impl NotesApi for HttpNotesClient {
    async fn list_notes(&self, token: &str) -> ApiResult<Vec<Note>> {
        let body = self.send(self.request(Method::GET, "", token)).await?;
        wire::parse_list::<WireNote, Note>(&body)
    }

    async fn current_user(&self, token: &str) -> ApiResult<User> {
        let body = self.send(self.request(Method::GET, "/me", token)).await?;
        wire::parse::<WireUser, User>(&body)
    }

    async fn create_note(&self, token: &str, draft: &NoteDraft) -> ApiResult<Note> {
        let request = self.request(Method::POST, "", token).json(draft);
        let body = self.send(request).await?;
        wire::parse::<WireNote, Note>(&body)
    }

    async fn update_note(&self, token: &str, id: NoteId, draft: &NoteDraft) -> ApiResult<Note> {
        let request = self
            .request(Method::PUT, &format!("/{id}"), token)
            .json(draft);
        let body = self.send(request).await?;
        wire::parse::<WireNote, Note>(&body)
    }

    async fn delete_note(&self, token: &str, id: NoteId) -> ApiResult<()> {
        self.send(self.request(Method::DELETE, &format!("/{id}"), token))
            .await?;
        Ok(())
    }

    async fn note_history(&self, token: &str, id: NoteId) -> ApiResult<Vec<HistoryEntry>> {
        let request = self.request(Method::GET, &format!("/history/{id}"), token);
        let body = self.send(request).await?;
        wire::parse_list::<WireHistoryEntry, HistoryEntry>(&body)
    }

    async fn share_candidates(&self, token: &str) -> ApiResult<Vec<User>> {
        let body = self.send(self.request(Method::GET, "/users", token)).await?;
        wire::parse_list::<WireUser, User>(&body)
    }

    async fn share_note(&self, token: &str, id: NoteId, username: &str) -> ApiResult<()> {
        let request = self
            .request(Method::POST, &format!("/{id}/share"), token)
            .query(&[("username", username)]);
        self.send(request).await?;
        Ok(())
    }

    async fn set_pin(&self, token: &str, pin: &Pin) -> ApiResult<()> {
        let request = self
            .request(Method::POST, "/pin/set", token)
            .json(&serde_json::json!({ "pin": pin.as_str() }));
        self.send(request).await?;
        Ok(())
    }

    async fn verify_pin(&self, token: &str, pin: &Pin) -> ApiResult<bool> {
        let request = self
            .request(Method::POST, "/pin/verify", token)
            .json(&serde_json::json!({ "pin": pin.as_str() }));
        let body = self.send(request).await?;
        Ok(serde_json::from_str::<bool>(body.trim())?)
    }
}

/// Normalize a service URL: require a scheme, drop trailing slashes and a
/// trailing `/api/notes` if one was included.
pub fn normalize_base_url(raw: &str) -> ApiResult<String> {
    let base_url = normalize_text_option(Some(raw.to_string())).ok_or_else(|| {
        ApiError::InvalidConfiguration("API base URL must not be empty".to_string())
    })?;
    if !is_http_url(&base_url) {
        return Err(ApiError::InvalidConfiguration(
            "API base URL must include http:// or https://".to_string(),
        ));
    }

    let trimmed = base_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(NOTES_PATH).unwrap_or(trimmed);
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    let non_empty = |value: Option<String>| {
        value
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    };

    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = non_empty(payload.message).or_else(|| non_empty(payload.error)) {
            return message;
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string)
    } else {
        trimmed
    }
}
