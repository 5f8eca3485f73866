use std::cell::RefCell;
use std::collections::VecDeque;

use reqwest::StatusCode;

use crate::error::{NotesError, Operation};
use crate::remote::{Note, NoteDraft, NotesApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Fetch(String),
    Create(NoteDraft),
    Update(String, NoteDraft),
    Delete(String),
}

/// In-memory stand-in that records every request and replays queued replies.
/// Empty queues answer with success (an empty list for `list_notes`).
#[derive(Debug, Default)]
pub struct FakeApi {
    calls: RefCell<Vec<Call>>,
    lists: RefCell<VecDeque<Result<Vec<Note>, NotesError>>>,
    writes: RefCell<VecDeque<Result<(), NotesError>>>,
}

impl FakeApi {
    pub fn with_list(notes: Vec<Note>) -> Self {
        let api = Self::default();
        api.push_list(Ok(notes));
        api
    }

    pub fn push_list(&self, reply: Result<Vec<Note>, NotesError>) {
        self.lists.borrow_mut().push_back(reply);
    }

    pub fn push_write(&self, reply: Result<(), NotesError>) {
        self.writes.borrow_mut().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| pred(call)).count()
    }

    fn next_write(&self) -> Result<(), NotesError> {
        self.writes.borrow_mut().pop_front().unwrap_or(Ok(()))
    }
}

pub fn server_error(operation: Operation) -> NotesError {
    NotesError::Status {
        operation,
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: Some(r#"{"error":"boom"}"#.into()),
    }
}

pub fn note(id: &str, title: &str, detail: Option<&str>) -> Note {
    Note {
        id: id.into(),
        title: title.into(),
        detail: detail.map(Into::into),
        created_at: None,
        updated_at: None,
    }
}

impl NotesApi for FakeApi {
    fn list_notes(&self) -> Result<Vec<Note>, NotesError> {
        self.calls.borrow_mut().push(Call::List);
        self.lists.borrow_mut().pop_front().unwrap_or(Ok(Vec::new()))
    }

    fn fetch_note(&self, id: &str) -> Result<Note, NotesError> {
        self.calls.borrow_mut().push(Call::Fetch(id.into()));
        let found = self
            .lists
            .borrow()
            .front()
            .and_then(|reply| reply.as_ref().ok())
            .and_then(|notes| notes.iter().find(|note| note.id == id).cloned());
        found.ok_or(NotesError::Status {
            operation: Operation::Fetch,
            status: StatusCode::NOT_FOUND,
            body: None,
        })
    }

    fn create_note(&self, draft: &NoteDraft) -> Result<(), NotesError> {
        self.calls.borrow_mut().push(Call::Create(draft.clone()));
        self.next_write()
    }

    fn update_note(&self, id: &str, draft: &NoteDraft) -> Result<(), NotesError> {
        self.calls
            .borrow_mut()
            .push(Call::Update(id.into(), draft.clone()));
        self.next_write()
    }

    fn delete_note(&self, id: &str) -> Result<(), NotesError> {
        self.calls.borrow_mut().push(Call::Delete(id.into()));
        self.next_write()
    }
}
