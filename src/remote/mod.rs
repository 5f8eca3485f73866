//! Access to the remote note collection.
//!
//! The collection is exposed over plain REST (`/notes`, `/notes/{id}`).
//! [`NotesApi`] is the seam the view-model talks to; [`HttpNotesApi`] is the
//! blocking HTTP implementation used by the binary.

use crate::error::NotesError;

#[cfg(test)]
pub mod fake;
mod http;
pub mod model;

pub use http::HttpNotesApi;
pub use model::{Note, NoteDraft};

pub trait NotesApi {
    /// Full collection, in the order the server returns it.
    fn list_notes(&self) -> Result<Vec<Note>, NotesError>;

    fn fetch_note(&self, id: &str) -> Result<Note, NotesError>;

    fn create_note(&self, draft: &NoteDraft) -> Result<(), NotesError>;

    fn update_note(&self, id: &str, draft: &NoteDraft) -> Result<(), NotesError>;

    fn delete_note(&self, id: &str) -> Result<(), NotesError>;
}
