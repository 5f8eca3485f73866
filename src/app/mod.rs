use std::io::Stdout;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use ratatui::Terminal;

use crate::remote::{Note, NotesApi};
use crate::ui::{self, ScreenView};

pub mod state;
pub mod view_model;

pub use state::{FocusPane, FormField, OverlayState, UiState};
pub use view_model::{
    Alert, ConfirmGate, Confirmation, DeleteOutcome, FormMode, FormState, NotesViewModel,
};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    Refresh,
    NewNote,
    EditSelected,
    DeleteSelected,
    FocusForm,
}

pub struct App<A: NotesApi> {
    view_model: NotesViewModel<A>,
    ui: UiState,
    table_state: TableState,
    should_quit: bool,
}

impl<A: NotesApi> App<A> {
    pub fn new(view_model: NotesViewModel<A>) -> Self {
        Self {
            view_model,
            ui: UiState::default(),
            table_state: TableState::default(),
            should_quit: false,
        }
    }

    pub fn view_model(&self) -> &NotesViewModel<A> {
        &self.view_model
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn run(&mut self) -> Result<()> {
        self.refresh_notes();
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal
                .draw(|frame| {
                    if self.view_model.notes().is_empty() {
                        self.table_state.select(None);
                    } else {
                        self.table_state.select(Some(self.ui.selected));
                    }
                    let view = ScreenView {
                        rows: self.view_model.rows(),
                        form: self.view_model.form(),
                        alert: self.view_model.alert(),
                        notice: self.view_model.notice(),
                    };
                    ui::draw_app(frame, &view, &self.ui, &mut self.table_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            match event::read().context("reading terminal event")? {
                Event::Key(key) => self.handle_key(key),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Alerts block everything until acknowledged.
        if self.view_model.alert().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.view_model.take_alert();
            }
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        match self.ui.focus {
            FocusPane::Form => self.handle_form_key(key),
            FocusPane::List => {
                if let Some(action) = list_action(key) {
                    self.handle_action(action);
                }
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self
                .ui
                .move_selection(1, self.view_model.notes().len()),
            Action::SelectPrevious => self
                .ui
                .move_selection(-1, self.view_model.notes().len()),
            Action::Refresh => {
                if self.refresh_notes() {
                    self.view_model.set_notice(Some("Notes refreshed"));
                }
            }
            Action::NewNote => {
                self.view_model.begin_create();
                self.ui.focus_form(FormField::Title);
                self.view_model.set_notice(Some(
                    "New note: Tab switch field • Ctrl-s save • Esc cancel",
                ));
            }
            Action::EditSelected => {
                let Some(note) = self.selected_note().cloned() else {
                    return;
                };
                self.view_model.begin_edit(&note);
                self.ui.focus_form(FormField::Title);
                self.view_model.set_notice(Some(
                    "Editing note: Tab switch field • Ctrl-s save • Esc cancel",
                ));
            }
            Action::DeleteSelected => {
                let Some(note) = self.selected_note().cloned() else {
                    return;
                };
                self.ui.open_delete(&note);
            }
            Action::FocusForm => self.ui.focus_form(FormField::Title),
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        let Some(OverlayState::ConfirmDelete(_)) = self.ui.overlay else {
            return false;
        };
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.resolve_delete(Confirmation::Accept);
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.resolve_delete(Confirmation::Decline);
            }
            _ => {}
        }
        true
    }

    fn resolve_delete(&mut self, mut answer: Confirmation) {
        let Some(OverlayState::ConfirmDelete(draft)) = self.ui.close_overlay() else {
            return;
        };
        let previous = self.selected_id();
        match self.view_model.delete_note(&draft.note_id, &mut answer) {
            Ok(DeleteOutcome::Deleted) => {
                self.ui
                    .restore_selection(previous.as_deref(), self.view_model.notes());
            }
            Ok(DeleteOutcome::Declined) => {
                self.view_model.set_notice(Some("Delete canceled"));
            }
            Err(_) => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        match key.code {
            KeyCode::Esc => {
                self.view_model.reset();
                self.ui.focus_list();
                self.view_model.set_notice(Some("Canceled"));
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.ui.field = self.ui.field.next();
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.submit_form();
            }
            KeyCode::Enter if self.ui.field == FormField::Title => self.submit_form(),
            KeyCode::Enter => self.ui.field.value_mut(self.view_model.form_mut()).push('\n'),
            KeyCode::Backspace => {
                state::pop_grapheme(self.ui.field.value_mut(self.view_model.form_mut()));
            }
            KeyCode::Char(ch) if plain => {
                self.ui.field.value_mut(self.view_model.form_mut()).push(ch);
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let previous = self.selected_id();
        if self.view_model.save().is_ok() {
            self.ui.focus_list();
            self.ui
                .restore_selection(previous.as_deref(), self.view_model.notes());
        }
    }

    /// Returns whether the reload succeeded; failures are already reported.
    fn refresh_notes(&mut self) -> bool {
        let previous = self.selected_id();
        let ok = self.view_model.refresh().is_ok();
        if ok {
            self.ui
                .restore_selection(previous.as_deref(), self.view_model.notes());
        }
        ok
    }

    fn selected_note(&self) -> Option<&Note> {
        self.ui.selected_note(self.view_model.notes())
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_note().map(|note| note.id.clone())
    }
}

fn list_action(key: KeyEvent) -> Option<Action> {
    let plain = !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
    match key.code {
        KeyCode::Char('q') if plain => Some(Action::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Refresh)
        }
        KeyCode::Char('a') if plain => Some(Action::NewNote),
        KeyCode::Char('e') | KeyCode::Enter if plain => Some(Action::EditSelected),
        KeyCode::Char('d') if plain => Some(Action::DeleteSelected),
        KeyCode::Tab => Some(Action::FocusForm),
        _ => None,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
