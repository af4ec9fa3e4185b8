//! JSON shapes returned by the notes service and their checked conversion
//! into domain models.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ApiError, ApiResult};
use crate::models::{Change, ChangeType, HistoryEntry, Note, NoteId, User, UserRef};
use crate::util::parse_timestamp_millis;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireUser {
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    has_private_pin: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireNote {
    id: Option<i64>,
    title: Option<String>,
    content: Option<String>,
    #[serde(default, alias = "owner")]
    user: Option<WireUser>,
    #[serde(default)]
    shared_with: Option<Vec<WireUser>>,
    #[serde(default, alias = "isPrivate")]
    private: Option<bool>,
    #[serde(default)]
    created_at: Option<WireTimestamp>,
    #[serde(default)]
    updated_at: Option<WireTimestamp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireHistoryEntry {
    id: Option<i64>,
    note_id: Option<i64>,
    change_type: Option<ChangeType>,
    #[serde(default)]
    old_content: Option<String>,
    #[serde(default)]
    new_content: Option<String>,
    timestamp: Option<WireTimestamp>,
}

/// Either epoch milliseconds or an ISO date-time string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Text(String),
}

impl WireTimestamp {
    fn into_millis(self, field: &str) -> ApiResult<i64> {
        match self {
            Self::Millis(value) => Ok(value),
            Self::Text(raw) => parse_timestamp_millis(&raw)
                .ok_or_else(|| invalid(format!("{field} is not a timestamp: '{raw}'"))),
        }
    }
}

fn invalid(message: impl Into<String>) -> ApiError {
    ApiError::InvalidPayload(message.into())
}

fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| invalid(format!("missing field '{field}'")))
}

fn optional_timestamp(value: Option<WireTimestamp>, field: &str) -> ApiResult<Option<i64>> {
    value.map(|timestamp| timestamp.into_millis(field)).transpose()
}

impl TryFrom<WireUser> for UserRef {
    type Error = ApiError;

    fn try_from(value: WireUser) -> ApiResult<Self> {
        let username = required(value.username, "username")?;
        Ok(Self::new(username))
    }
}

impl TryFrom<WireUser> for User {
    type Error = ApiError;

    fn try_from(value: WireUser) -> ApiResult<Self> {
        Ok(Self {
            username: required(value.username, "username")?,
            email: value.email,
            has_private_pin: value.has_private_pin.unwrap_or(false),
        })
    }
}

impl TryFrom<WireNote> for Note {
    type Error = ApiError;

    fn try_from(value: WireNote) -> ApiResult<Self> {
        let id = required(value.id, "id")?;
        let owner = UserRef::try_from(required(value.user, "user")?)?;
        let shared_with = value
            .shared_with
            .unwrap_or_default()
            .into_iter()
            .map(UserRef::try_from)
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(Self {
            id: NoteId::new(id),
            title: required(value.title, "title")?,
            content: required(value.content, "content")?,
            owner,
            private: value.private.unwrap_or(false),
            shared_with,
            created_at: optional_timestamp(value.created_at, "createdAt")?,
            updated_at: optional_timestamp(value.updated_at, "updatedAt")?,
        })
    }
}

impl TryFrom<WireHistoryEntry> for HistoryEntry {
    type Error = ApiError;

    fn try_from(value: WireHistoryEntry) -> ApiResult<Self> {
        let change_type = required(value.change_type, "changeType")?;
        let change = Change::from_parts(change_type, value.old_content, value.new_content)
            .ok_or_else(|| invalid(format!("{change_type} entry is missing its content")))?;
        let timestamp = required(value.timestamp, "timestamp")?.into_millis("timestamp")?;

        Ok(Self {
            id: required(value.id, "id")?,
            note_id: NoteId::new(required(value.note_id, "noteId")?),
            change,
            timestamp,
        })
    }
}

/// Deserialize `body` as `W` and convert it into the domain type.
pub(super) fn parse<W, T>(body: &str) -> ApiResult<T>
where
    W: DeserializeOwned,
    T: TryFrom<W, Error = ApiError>,
{
    let wire = serde_json::from_str::<W>(body)?;
    T::try_from(wire)
}

/// Deserialize a JSON array of `W`, failing on the first invalid element.
pub(super) fn parse_list<W, T>(body: &str) -> ApiResult<Vec<T>>
where
    W: DeserializeOwned,
    T: TryFrom<W, Error = ApiError>,
{
    serde_json::from_str::<Vec<W>>(body)?
        .into_iter()
        .map(T::try_from)
        .collect()
}
