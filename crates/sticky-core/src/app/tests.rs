use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use pretty_assertions::assert_eq;

use super::*;
use crate::models::{test_note, Change, UserRef};
use crate::storage::{MemoryStorage, LAST_VIEWED_SHARED_KEY, TOKEN_KEY};
use crate::unlock::Pin;

const NOW: i64 = 10_000;

/// In-memory stand-in for the notes service.
#[derive(Default)]
struct FakeApi {
    notes: RefCell<Vec<Note>>,
    has_pin: Cell<bool>,
    pin: RefCell<Option<String>>,
    history: RefCell<Vec<HistoryEntry>>,
    users: RefCell<Vec<User>>,
    failures: RefCell<VecDeque<ApiError>>,
    call_failures: RefCell<Vec<(&'static str, ApiError)>>,
    calls: RefCell<Vec<&'static str>>,
}

impl FakeApi {
    fn with_notes(notes: Vec<Note>) -> Self {
        Self {
            notes: RefCell::new(notes),
            ..Self::default()
        }
    }

    fn with_pin(self, pin: &str) -> Self {
        self.has_pin.set(true);
        *self.pin.borrow_mut() = Some(pin.to_string());
        self
    }

    fn fail_next(&self, error: ApiError) {
        self.failures.borrow_mut().push_back(error);
    }

    /// Fail the next call to `call` only.
    fn fail_on(&self, call: &'static str, error: ApiError) {
        self.call_failures.borrow_mut().push((call, error));
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: &'static str) -> ApiResult<()> {
        self.calls.borrow_mut().push(call);
        let mut call_failures = self.call_failures.borrow_mut();
        if let Some(index) = call_failures.iter().position(|(name, _)| *name == call) {
            return Err(call_failures.remove(index).1);
        }
        drop(call_failures);
        self.failures.borrow_mut().pop_front().map_or(Ok(()), Err)
    }

    fn not_found() -> ApiError {
        ApiError::Status {
            status: 404,
            message: "Note not found".to_string(),
        }
    }
}

impl NotesApi for FakeApi {
    async fn list_notes(&self, _token: &str) -> ApiResult<Vec<Note>> {
        self.record("list_notes")?;
        Ok(self.notes.borrow().clone())
    }

    async fn current_user(&self, _token: &str) -> ApiResult<User> {
        self.record("current_user")?;
        Ok(User {
            username: "alice".to_string(),
            email: None,
            has_private_pin: self.has_pin.get(),
        })
    }

    async fn create_note(&self, _token: &str, draft: &NoteDraft) -> ApiResult<Note> {
        self.record("create_note")?;
        let mut notes = self.notes.borrow_mut();
        let id = 100 + i64::try_from(notes.len()).unwrap_or_default();
        let note = Note {
            title: draft.title.clone(),
            content: draft.content.clone(),
            private: draft.private,
            ..test_note(id, "alice", &[], draft.private)
        };
        notes.push(note.clone());
        Ok(note)
    }

    async fn update_note(&self, _token: &str, id: NoteId, draft: &NoteDraft) -> ApiResult<Note> {
        self.record("update_note")?;
        let mut notes = self.notes.borrow_mut();
        let note = notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(Self::not_found)?;
        note.title.clone_from(&draft.title);
        note.content.clone_from(&draft.content);
        note.private = draft.private;
        note.updated_at = Some(NOW);
        Ok(note.clone())
    }

    async fn delete_note(&self, _token: &str, id: NoteId) -> ApiResult<()> {
        self.record("delete_note")?;
        let mut notes = self.notes.borrow_mut();
        let before = notes.len();
        notes.retain(|note| note.id != id);
        if notes.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }

    async fn note_history(&self, _token: &str, id: NoteId) -> ApiResult<Vec<HistoryEntry>> {
        self.record("note_history")?;
        Ok(self
            .history
            .borrow()
            .iter()
            .filter(|entry| entry.note_id == id)
            .cloned()
            .collect())
    }

    async fn share_candidates(&self, _token: &str) -> ApiResult<Vec<User>> {
        self.record("share_candidates")?;
        Ok(self.users.borrow().clone())
    }

    async fn share_note(&self, _token: &str, id: NoteId, username: &str) -> ApiResult<()> {
        self.record("share_note")?;
        let mut notes = self.notes.borrow_mut();
        let note = notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(Self::not_found)?;
        if note.shared_with.iter().any(|user| user.username == username) {
            return Err(ApiError::Status {
                status: 400,
                message: "Note is already shared with this user".to_string(),
            });
        }
        note.shared_with.push(UserRef::new(username));
        Ok(())
    }

    async fn set_pin(&self, _token: &str, pin: &Pin) -> ApiResult<()> {
        self.record("set_pin")?;
        *self.pin.borrow_mut() = Some(pin.as_str().to_string());
        self.has_pin.set(true);
        Ok(())
    }

    async fn verify_pin(&self, _token: &str, pin: &Pin) -> ApiResult<bool> {
        self.record("verify_pin")?;
        Ok(self.pin.borrow().as_deref() == Some(pin.as_str()))
    }
}

fn signed_in_storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    SessionStore::new(storage.clone())
        .save(&Session::new("token-1", "alice").unwrap())
        .unwrap();
    storage
}

fn start(api: FakeApi) -> (NotesApp<FakeApi, MemoryStorage>, MemoryStorage) {
    let storage = signed_in_storage();
    let app = NotesApp::start(api, storage.clone())
        .unwrap()
        .with_clock(|| NOW);
    (app, storage)
}

fn titles(notes: &[Note]) -> Vec<String> {
    notes.iter().map(|note| note.title.clone()).collect()
}

fn sample_notes() -> Vec<Note> {
    vec![
        Note {
            title: "Groceries".to_string(),
            content: "milk".to_string(),
            ..test_note(1, "alice", &[], false)
        },
        Note {
            title: "Trip plan".to_string(),
            content: "buy groceries".to_string(),
            ..test_note(2, "bob", &[], false)
        },
        Note {
            title: "Diary".to_string(),
            ..test_note(3, "alice", &[], true)
        },
    ]
}

#[test]
fn start_requires_stored_session() {
    let result = NotesApp::start(FakeApi::default(), MemoryStorage::new());
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test(flavor = "current_thread")]
async fn load_fetches_notes_then_pin_status() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()).with_pin("1234"));

    let loaded = app.load().await.unwrap();

    assert_eq!(loaded.has_pin, Fetch::Fresh(true));
    assert!(matches!(loaded.notes, Fetch::Fresh(_)));
    assert_eq!(app.api().calls(), vec!["list_notes", "current_user"]);
    assert_eq!(app.cache().notes().len(), 3);
    assert_eq!(app.cache().fetched_at(), Some(NOW));
    assert_eq!(app.gate().has_pin(), Some(true));
    assert!(!app.gate().is_unlocked());
}

#[tokio::test(flavor = "current_thread")]
async fn visible_notes_follow_view_and_search() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()));
    app.load().await.unwrap();

    app.set_search("GROC");
    assert_eq!(app.search_term(), "GROC");
    assert_eq!(titles(&app.visible_notes()), vec!["Groceries"]);

    app.switch_view(View::Shared).unwrap();
    assert_eq!(titles(&app.visible_notes()), vec!["Trip plan"]);

    app.set_search("");
    assert_eq!(titles(&app.visible_notes()), vec!["Trip plan"]);
}

#[tokio::test(flavor = "current_thread")]
async fn short_setup_pin_is_rejected_before_any_request() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()));
    app.load().await.unwrap();

    let change = app.switch_view(View::Private).unwrap();
    assert_eq!(change, ViewChange::PinRequired(PinPrompt::Setup));

    let error = app.submit_pin("12").await.unwrap_err();
    assert!(matches!(
        error,
        Error::Validation(ValidationError::InvalidPin)
    ));
    assert_eq!(app.api().calls(), vec!["list_notes", "current_user"]);
    assert!(!app.gate().is_unlocked());
    assert_eq!(app.view(), View::All);

    let outcome = app.submit_pin("1234").await.unwrap();
    assert_eq!(outcome, PinOutcome::Unlocked);
    assert_eq!(
        app.api().calls(),
        vec!["list_notes", "current_user", "set_pin"]
    );
    assert_eq!(app.gate().has_pin(), Some(true));
    assert_eq!(app.view(), View::Private);
    assert_eq!(titles(&app.visible_notes()), vec!["Diary"]);
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_pin_status_refuses_private_view() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()).with_pin("4321"));
    app.refresh_notes().await.unwrap();
    app.api()
        .fail_next(ApiError::Network("connection reset".to_string()));

    let loaded_status = app.refresh_user_status().await.unwrap();
    assert_eq!(loaded_status, Fetch::Unavailable);
    assert_eq!(app.gate().has_pin(), None);

    let error = app.switch_view(View::Private).unwrap_err();
    assert!(matches!(
        error,
        Error::Validation(ValidationError::PinStatusUnknown)
    ));
    assert_eq!(app.gate().prompt(), None);
    assert!(matches!(
        app.submit_pin("0000").await,
        Err(Error::Validation(ValidationError::NoPinPrompt))
    ));
    assert_eq!(app.api().calls(), vec!["list_notes", "current_user"]);
    assert_eq!(app.api().pin.borrow().as_deref(), Some("4321"));
    assert_eq!(app.view(), View::All);

    assert_eq!(app.refresh_user_status().await.unwrap(), Fetch::Fresh(true));
    assert_eq!(
        app.switch_view(View::Private).unwrap(),
        ViewChange::PinRequired(PinPrompt::Entry)
    );
}

#[tokio::test(flavor = "current_thread")]
async fn load_reports_unavailable_pin_status() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()).with_pin("4321"));
    app.api()
        .fail_on("current_user", ApiError::Network("timed out".to_string()));

    let loaded = app.load().await.unwrap();
    assert!(matches!(loaded.notes, Fetch::Fresh(_)));
    assert_eq!(loaded.has_pin, Fetch::Unavailable);
    assert_eq!(app.cache().notes().len(), 3);
    assert_eq!(app.gate().has_pin(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_entry_pin_is_rejected_before_any_request() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()).with_pin("4321"));
    app.load().await.unwrap();
    app.switch_view(View::Private).unwrap();

    let error = app.submit_pin("43").await.unwrap_err();
    assert!(matches!(
        error,
        Error::Validation(ValidationError::InvalidPin)
    ));
    assert_eq!(app.api().calls(), vec!["list_notes", "current_user"]);
    assert_eq!(app.gate().prompt(), Some(PinPrompt::Entry));
}

#[tokio::test(flavor = "current_thread")]
async fn network_failure_on_pin_submit_keeps_gate_locked() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()).with_pin("4321"));
    app.load().await.unwrap();
    app.switch_view(View::Private).unwrap();
    app.api()
        .fail_next(ApiError::Network("connection refused".to_string()));

    let error = app.submit_pin("4321").await.unwrap_err();
    assert!(error.is_network());
    assert!(!app.gate().is_unlocked());
    assert_eq!(app.gate().prompt(), Some(PinPrompt::Entry));
    assert_eq!(app.view(), View::All);

    let (mut app, _) = start(FakeApi::with_notes(sample_notes()));
    app.load().await.unwrap();
    app.switch_view(View::Private).unwrap();
    app.api()
        .fail_next(ApiError::Network("connection refused".to_string()));

    let error = app.submit_pin("1234").await.unwrap_err();
    assert!(error.is_network());
    assert!(!app.gate().is_unlocked());
    assert_eq!(app.gate().prompt(), Some(PinPrompt::Setup));
    assert_eq!(app.gate().has_pin(), Some(false));
    assert_eq!(app.api().pin.borrow().as_deref(), None);
    assert!(app.session().is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn wrong_pin_keeps_entry_open_for_retry() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()).with_pin("4321"));
    app.load().await.unwrap();

    assert_eq!(
        app.switch_view(View::Private).unwrap(),
        ViewChange::PinRequired(PinPrompt::Entry)
    );
    assert_eq!(app.submit_pin("0000").await.unwrap(), PinOutcome::Rejected);
    assert_eq!(app.gate().prompt(), Some(PinPrompt::Entry));
    assert_eq!(app.view(), View::All);

    assert_eq!(app.submit_pin("4321").await.unwrap(), PinOutcome::Unlocked);
    assert_eq!(app.view(), View::Private);
}

#[tokio::test(flavor = "current_thread")]
async fn leaving_private_view_relocks() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()).with_pin("4321"));
    app.load().await.unwrap();
    app.switch_view(View::Private).unwrap();
    app.submit_pin("4321").await.unwrap();
    assert!(app.gate().is_unlocked());

    assert_eq!(
        app.switch_view(View::All).unwrap(),
        ViewChange::Switched(View::All)
    );
    assert!(!app.gate().is_unlocked());
    assert_eq!(
        app.switch_view(View::Private).unwrap(),
        ViewChange::PinRequired(PinPrompt::Entry)
    );

    app.cancel_pin();
    assert_eq!(app.gate().prompt(), None);
    assert_eq!(app.view(), View::All);
}

#[tokio::test(flavor = "current_thread")]
async fn submit_without_open_prompt_is_rejected() {
    let (mut app, _) = start(FakeApi::default());
    let error = app.submit_pin("1234").await.unwrap_err();
    assert!(matches!(
        error,
        Error::Validation(ValidationError::NoPinPrompt)
    ));
    assert!(app.api().calls().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn new_shared_activity_is_flagged_until_shared_view_opens() {
    let shared = Note {
        updated_at: Some(5_000),
        ..test_note(7, "bob", &[], false)
    };
    let (mut app, storage) = start(FakeApi::with_notes(vec![shared]));

    let activity = app.refresh_notes().await.unwrap();
    assert_eq!(activity, Fetch::Fresh(SharedActivity::Flagged));
    assert!(app.has_unseen_shared());

    app.switch_view(View::Shared).unwrap();
    assert!(!app.has_unseen_shared());
    let stored: i64 = storage
        .get(LAST_VIEWED_SHARED_KEY)
        .unwrap()
        .unwrap()
        .parse()
        .unwrap();
    assert!(stored >= 5_000);

    app.switch_view(View::All).unwrap();
    let activity = app.refresh_notes().await.unwrap();
    assert_eq!(activity, Fetch::Fresh(SharedActivity::NoChange));
    assert!(!app.has_unseen_shared());
}

#[tokio::test(flavor = "current_thread")]
async fn refresh_while_in_shared_view_marks_activity_seen() {
    let storage = signed_in_storage();
    storage.set(LAST_VIEWED_SHARED_KEY, "2000").unwrap();
    let api = FakeApi::with_notes(vec![Note {
        updated_at: Some(50_000),
        ..test_note(7, "bob", &[], false)
    }]);
    let mut app = NotesApp::start(api, storage.clone())
        .unwrap()
        .with_clock(|| NOW);
    assert_eq!(app.last_viewed_shared(), 2_000);

    app.switch_view(View::Shared).unwrap();
    let activity = app.refresh_notes().await.unwrap();

    assert_eq!(
        activity,
        Fetch::Fresh(SharedActivity::Seen {
            last_viewed: 50_000
        })
    );
    assert!(!app.has_unseen_shared());
    assert_eq!(
        storage.get(LAST_VIEWED_SHARED_KEY).unwrap().as_deref(),
        Some("50000")
    );
}

#[tokio::test(flavor = "current_thread")]
async fn unauthorized_response_signs_out() {
    let (mut app, storage) = start(FakeApi::with_notes(sample_notes()));
    app.load().await.unwrap();
    app.api().fail_next(ApiError::Unauthorized);

    let error = app.refresh_notes().await.unwrap_err();
    assert!(matches!(error, Error::Auth(_)));
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert!(app.session().is_none());
    assert!(app.cache().notes().is_empty());
    assert!(app.visible_notes().is_empty());

    let calls_before = app.api().calls().len();
    assert!(matches!(app.refresh_notes().await, Err(Error::Auth(_))));
    assert_eq!(app.api().calls().len(), calls_before);
}

#[tokio::test(flavor = "current_thread")]
async fn unauthorized_write_signs_out() {
    let (mut app, storage) = start(FakeApi::with_notes(sample_notes()));
    app.api().fail_next(ApiError::Unauthorized);

    let error = app.delete_note(NoteId::new(1)).await.unwrap_err();
    assert!(matches!(error, Error::Auth(_)));
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

#[test]
fn stale_note_list_is_discarded() {
    let (mut app, _) = start(FakeApi::default());
    let first = app.begin_notes_refresh();
    let second = app.begin_notes_refresh();

    let newer = vec![test_note(2, "alice", &[], false)];
    let older = vec![test_note(1, "alice", &[], false)];

    assert!(matches!(
        app.apply_notes(second, Ok(newer.clone())).unwrap(),
        Fetch::Fresh(_)
    ));
    assert_eq!(app.apply_notes(first, Ok(older)).unwrap(), Fetch::Stale);
    assert_eq!(app.cache().notes(), newer.as_slice());
}

#[test]
fn stale_unauthorized_still_signs_out() {
    let (mut app, _) = start(FakeApi::default());
    let first = app.begin_notes_refresh();
    let _second = app.begin_notes_refresh();

    let result = app.apply_notes(first, Err(ApiError::Unauthorized));
    assert!(matches!(result, Err(Error::Auth(_))));
    assert!(app.session().is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn network_failure_on_read_is_swallowed() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()));
    app.refresh_notes().await.unwrap();
    app.api()
        .fail_next(ApiError::Network("connection refused".to_string()));

    assert_eq!(app.refresh_notes().await.unwrap(), Fetch::Unavailable);
    assert_eq!(app.cache().notes().len(), 3);
    assert!(app.session().is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn network_failure_on_write_is_reported() {
    let (mut app, _) = start(FakeApi::default());
    app.api()
        .fail_next(ApiError::Network("connection refused".to_string()));

    let draft = NoteDraft::new("Title", "Body", false).unwrap();
    let error = app.save_note(None, &draft).await.unwrap_err();
    assert!(error.is_network());
}

#[tokio::test(flavor = "current_thread")]
async fn save_validates_before_sending() {
    let (mut app, _) = start(FakeApi::default());
    let draft = NoteDraft {
        title: "Title".to_string(),
        content: "   ".to_string(),
        private: false,
    };

    let error = app.save_note(None, &draft).await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Please fill in both title and content"
    );
    assert!(app.api().calls().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn create_and_update_refresh_the_list() {
    let (mut app, _) = start(FakeApi::default());

    let draft = NoteDraft::new("Groceries", "milk", false).unwrap();
    let created = app.save_note(None, &draft).await.unwrap();
    assert_eq!(app.api().calls(), vec!["create_note", "list_notes"]);
    assert_eq!(titles(app.cache().notes()), vec!["Groceries"]);

    let mut edit = NoteDraft::from_note(&created);
    edit.content = "milk, eggs".to_string();
    app.save_note(Some(created.id), &edit).await.unwrap();
    assert_eq!(
        app.note(created.id).map(|note| note.content.as_str()),
        Some("milk, eggs")
    );
}

#[tokio::test(flavor = "current_thread")]
async fn server_error_on_update_leaves_cache_untouched() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()));
    app.refresh_notes().await.unwrap();

    let draft = NoteDraft::new("T", "C", false).unwrap();
    let error = app.save_note(Some(NoteId::new(99)), &draft).await.unwrap_err();
    assert_eq!(error.to_string(), "Server error (404): Note not found");
    assert_eq!(app.cache().notes().len(), 3);
}

#[tokio::test(flavor = "current_thread")]
async fn delete_removes_note_after_refresh() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()));
    app.refresh_notes().await.unwrap();

    app.delete_note(NoteId::new(1)).await.unwrap();
    assert!(app.note(NoteId::new(1)).is_none());
    assert_eq!(app.cache().notes().len(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn share_requires_username_and_reports_duplicates() {
    let (mut app, _) = start(FakeApi::with_notes(sample_notes()));

    let error = app.share_note(NoteId::new(1), "  ").await.unwrap_err();
    assert!(matches!(
        error,
        Error::Validation(ValidationError::EmptyUsername)
    ));
    assert!(app.api().calls().is_empty());

    app.share_note(NoteId::new(1), " carol ").await.unwrap();
    let error = app.share_note(NoteId::new(1), "carol").await.unwrap_err();
    assert!(matches!(error, Error::Server { status: 400, .. }));
}

#[tokio::test(flavor = "current_thread")]
async fn history_and_candidates_are_fetched() {
    let api = FakeApi::default();
    api.history.borrow_mut().push(HistoryEntry {
        id: 1,
        note_id: NoteId::new(3),
        change: Change::Created {
            new_content: "hello".to_string(),
        },
        timestamp: 1_000,
    });
    api.users.borrow_mut().push(User {
        username: "bob".to_string(),
        email: Some("bob@example.com".to_string()),
        has_private_pin: false,
    });
    let (mut app, _) = start(api);

    let history = app.history(NoteId::new(3)).await.unwrap().fresh().unwrap();
    assert_eq!(history.len(), 1);
    let none = app.history(NoteId::new(4)).await.unwrap().fresh().unwrap();
    assert!(none.is_empty());

    let users = app.share_candidates().await.unwrap();
    assert!(matches!(users, Fetch::Fresh(ref users) if users.len() == 1));
}

#[tokio::test(flavor = "current_thread")]
async fn logout_clears_session_but_keeps_last_viewed() {
    let (mut app, storage) = start(FakeApi::with_notes(sample_notes()));
    app.switch_view(View::Shared).unwrap();

    app.logout().unwrap();
    assert!(app.session().is_none());
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert!(storage.get(LAST_VIEWED_SHARED_KEY).unwrap().is_some());
    assert!(matches!(app.refresh_notes().await, Err(Error::Auth(_))));
}
