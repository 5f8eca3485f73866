pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod remote;
pub mod render;
pub mod ui;

pub use app::NotesViewModel;
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use error::NotesError;
pub use remote::{HttpNotesApi, Note, NoteDraft, NotesApi};
