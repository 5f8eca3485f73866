use crate::error::NotesError;
use crate::remote::{Note, NoteDraft, NotesApi};
use crate::render::{note_rows, NoteRow, TimestampFormat};

pub const DELETE_PROMPT: &str = "Delete this note?";

const MSG_TITLE_REQUIRED: &str = "Title is required";
const MSG_LOAD_FAILED: &str = "Error loading notes";
const MSG_FETCH_FAILED: &str = "Error loading the note";
const MSG_SAVE_FAILED: &str = "Error saving the note";
const MSG_DELETE_FAILED: &str = "Error deleting the note";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormMode {
    #[default]
    Create,
    Edit(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub mode: FormMode,
    pub title: String,
    pub detail: String,
}

impl FormState {
    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(id),
        }
    }

    pub fn heading(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Create note",
            FormMode::Edit(_) => "Edit note",
        }
    }
}

/// A failure the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub cause: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

/// Yes/no gate consulted before a destructive request is sent.
pub trait ConfirmGate {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// An answer obtained ahead of time, e.g. from a confirmation overlay or `--yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accept,
    Decline,
}

impl ConfirmGate for Confirmation {
    fn confirm(&mut self, _prompt: &str) -> bool {
        matches!(self, Confirmation::Accept)
    }
}

/// Local mirror of the remote collection plus the single edit form.
///
/// The note list only ever changes by wholesale replacement after a
/// successful fetch. Failed requests leave both the list and the form as
/// they were and raise an [`Alert`].
pub struct NotesViewModel<A> {
    api: A,
    notes: Vec<Note>,
    rows: Vec<NoteRow>,
    form: FormState,
    timestamps: TimestampFormat,
    alert: Option<Alert>,
    notice: Option<String>,
}

impl<A: NotesApi> NotesViewModel<A> {
    pub fn new(api: A, timestamps: TimestampFormat) -> Self {
        Self {
            api,
            notes: Vec::new(),
            rows: Vec::new(),
            form: FormState::default(),
            timestamps,
            alert: None,
            notice: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn timestamps(&self) -> &TimestampFormat {
        &self.timestamps
    }

    pub fn rows(&self) -> &[NoteRow] {
        &self.rows
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alert.take()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice<S: Into<String>>(&mut self, message: Option<S>) {
        self.notice = message.map(Into::into);
    }

    pub fn refresh(&mut self) -> Result<(), NotesError> {
        match self.api.list_notes() {
            Ok(notes) => {
                tracing::debug!(count = notes.len(), "note list refreshed");
                self.replace_notes(notes);
                Ok(())
            }
            Err(err) => {
                self.report(&err, MSG_LOAD_FAILED);
                Err(err)
            }
        }
    }

    /// Reads one note straight from the server; the mirrored list is left alone.
    pub fn fetch_note(&mut self, id: &str) -> Result<Note, NotesError> {
        self.api.fetch_note(id).map_err(|err| {
            self.report(&err, MSG_FETCH_FAILED);
            err
        })
    }

    pub fn begin_edit(&mut self, note: &Note) {
        self.form = FormState {
            mode: FormMode::Edit(note.id.clone()),
            title: note.title.clone(),
            detail: note.detail_or_empty().to_string(),
        };
    }

    pub fn begin_create(&mut self) {
        self.form = FormState::default();
    }

    /// Cancels whatever the form holds.
    pub fn reset(&mut self) {
        self.begin_create();
    }

    pub fn save(&mut self) -> Result<(), NotesError> {
        let draft = NoteDraft::trimmed(&self.form.title, &self.form.detail);
        if draft.title.is_empty() {
            let err = NotesError::Validation;
            self.report(&err, MSG_TITLE_REQUIRED);
            return Err(err);
        }

        let result = match &self.form.mode {
            FormMode::Create => self.api.create_note(&draft),
            FormMode::Edit(id) => self.api.update_note(id, &draft),
        };
        if let Err(err) = result {
            self.report(&err, MSG_SAVE_FAILED);
            return Err(err);
        }

        let notice = match &self.form.mode {
            FormMode::Create => {
                tracing::info!(title = %draft.title, "note created");
                "Note created"
            }
            FormMode::Edit(id) => {
                tracing::info!(id = %id, "note updated");
                "Note updated"
            }
        };
        self.reset();
        self.set_notice(Some(notice));
        // A failed reload is reported by refresh; the save itself stands.
        let _ = self.refresh();
        Ok(())
    }

    pub fn delete_note(
        &mut self,
        id: &str,
        gate: &mut dyn ConfirmGate,
    ) -> Result<DeleteOutcome, NotesError> {
        if !gate.confirm(DELETE_PROMPT) {
            tracing::debug!(id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }
        if let Err(err) = self.api.delete_note(id) {
            self.report(&err, MSG_DELETE_FAILED);
            return Err(err);
        }
        tracing::info!(id, "note deleted");
        self.set_notice(Some("Note deleted"));
        let _ = self.refresh();
        Ok(DeleteOutcome::Deleted)
    }

    fn replace_notes(&mut self, notes: Vec<Note>) {
        self.rows = note_rows(&notes, &self.timestamps);
        self.notes = notes;
    }

    fn report(&mut self, err: &NotesError, message: &str) {
        if err.is_validation() {
            tracing::warn!(error = %err, "{message}");
        } else {
            tracing::error!(error = %err, operation = ?err.operation(), "{message}");
        }
        self.alert = Some(Alert {
            message: message.to_string(),
            cause: err.to_string(),
        });
    }
}
