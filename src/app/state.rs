use strum::{EnumIter, IntoEnumIterator};
use unicode_segmentation::UnicodeSegmentation;

use crate::app::view_model::FormState;
use crate::remote::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    List,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum FormField {
    Title,
    Detail,
}

impl FormField {
    pub fn next(self) -> Self {
        let fields: Vec<_> = FormField::iter().collect();
        let idx = fields.iter().position(|f| *f == self).unwrap_or(0);
        fields[(idx + 1) % fields.len()]
    }

    pub fn value_mut(self, form: &mut FormState) -> &mut String {
        match self {
            FormField::Title => &mut form.title,
            FormField::Detail => &mut form.detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDeleteOverlay {
    pub note_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayState {
    ConfirmDelete(ConfirmDeleteOverlay),
}

/// Terminal-only state: which row is highlighted, which pane has focus.
#[derive(Debug, Clone)]
pub struct UiState {
    pub focus: FocusPane,
    pub field: FormField,
    pub selected: usize,
    pub overlay: Option<OverlayState>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: FocusPane::List,
            field: FormField::Title,
            selected: 0,
            overlay: None,
        }
    }
}

impl UiState {
    pub fn selected_note<'a>(&self, notes: &'a [Note]) -> Option<&'a Note> {
        notes.get(self.selected)
    }

    pub fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    /// Keeps the highlighted note across a reload when it still exists.
    pub fn restore_selection(&mut self, previous_id: Option<&str>, notes: &[Note]) {
        if let Some(id) = previous_id {
            if let Some(idx) = notes.iter().position(|note| note.id == id) {
                self.selected = idx;
                return;
            }
        }
        self.normalize_selection(notes.len());
    }

    fn normalize_selection(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn focus_form(&mut self, field: FormField) {
        self.focus = FocusPane::Form;
        self.field = field;
    }

    pub fn focus_list(&mut self) {
        self.focus = FocusPane::List;
        self.field = FormField::Title;
    }

    pub fn open_delete(&mut self, note: &Note) {
        self.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteOverlay {
            note_id: note.id.clone(),
            title: note.title.clone(),
        }));
    }

    pub fn close_overlay(&mut self) -> Option<OverlayState> {
        self.overlay.take()
    }
}

pub fn pop_grapheme(text: &mut String) {
    if let Some((idx, _)) = text.grapheme_indices(true).next_back() {
        text.truncate(idx);
    }
}
