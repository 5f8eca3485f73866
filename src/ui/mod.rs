use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{FocusPane, FormField, OverlayState, UiState};
use crate::app::view_model::{Alert, FormMode, FormState, DELETE_PROMPT};
use crate::render::NoteRow;

/// Everything the draw pass reads from the view-model.
pub struct ScreenView<'a> {
    pub rows: &'a [NoteRow],
    pub form: &'a FormState,
    pub alert: Option<&'a Alert>,
    pub notice: Option<&'a str>,
}

pub fn draw_app(frame: &mut Frame, view: &ScreenView<'_>, ui: &UiState, table_state: &mut TableState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(vertical[0]);

    let list_column = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(7)])
        .split(columns[0]);

    draw_notes_table(frame, list_column[0], view, ui, table_state);
    draw_selected_detail(frame, list_column[1], view, ui);
    draw_form(frame, columns[1], view, ui);

    let status = build_status_line(view, ui);
    let status_paragraph = Paragraph::new(status).style(Style::default().fg(Color::Gray));
    frame.render_widget(status_paragraph, vertical[1]);

    render_overlay(frame, ui);
    if let Some(alert) = view.alert {
        render_alert(frame, alert);
    }
}

fn pane_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_notes_table(
    frame: &mut Frame,
    area: Rect,
    view: &ScreenView<'_>,
    ui: &UiState,
    table_state: &mut TableState,
) {
    let block = Block::default()
        .title("Notes")
        .borders(Borders::ALL)
        .border_style(pane_style(matches!(ui.focus, FocusPane::List)));

    if view.rows.is_empty() {
        let empty = Paragraph::new("No notes yet. Press `a` to create one.").block(block);
        frame.render_widget(empty, area);
        return;
    }

    let editing_id = view.form.editing_id();
    let rows = view.rows.iter().map(|row| {
        let mut title_spans = Vec::new();
        if editing_id == Some(row.id.as_str()) {
            title_spans.push(Span::styled(
                "✎ ",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        title_spans.push(Span::raw(row.title.clone()));
        Row::new(vec![
            Cell::from(Line::from(title_spans)),
            Cell::from(Span::styled(
                row.created.clone(),
                Style::default().fg(Color::Gray),
            )),
        ])
    });

    let header = Row::new(vec!["Title", "Created"])
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
    let table = Table::new(rows, [Constraint::Percentage(62), Constraint::Percentage(38)])
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, area, table_state);
}

fn draw_selected_detail(frame: &mut Frame, area: Rect, view: &ScreenView<'_>, ui: &UiState) {
    let block = Block::default().title("Detail").borders(Borders::ALL);
    let Some(row) = view.rows.get(ui.selected) else {
        frame.render_widget(block, area);
        return;
    };

    let muted = Style::default().fg(Color::Gray);
    let mut lines = Vec::new();
    if !row.created.is_empty() {
        lines.push(Line::from(Span::styled(format!("Created {}", row.created), muted)));
    }
    if !row.updated.is_empty() {
        lines.push(Line::from(Span::styled(format!("Updated {}", row.updated), muted)));
    }
    if row.detail.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            "(no detail)",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.extend(row.detail.lines().map(|line| Line::from(line.to_string())));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_form(frame: &mut Frame, area: Rect, view: &ScreenView<'_>, ui: &UiState) {
    let form_active = matches!(ui.focus, FocusPane::Form);
    let title = match &view.form.mode {
        FormMode::Create => view.form.heading().to_string(),
        FormMode::Edit(id) => format!("{} #{id}", view.form.heading()),
    };
    let outer = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(pane_style(form_active));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(inner);

    let title_active = form_active && ui.field == FormField::Title;
    let detail_active = form_active && ui.field == FormField::Detail;

    let title_field = Paragraph::new(view.form.title.as_str()).block(
        Block::default()
            .title("Title")
            .borders(Borders::ALL)
            .border_style(pane_style(title_active)),
    );
    frame.render_widget(title_field, sections[0]);

    let detail_field = Paragraph::new(view.form.detail.as_str())
        .block(
            Block::default()
                .title("Detail")
                .borders(Borders::ALL)
                .border_style(pane_style(detail_active)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(detail_field, sections[1]);

    if view.alert.is_none() && ui.overlay.is_none() {
        if title_active {
            let (x, y) = field_cursor(&view.form.title, sections[0]);
            frame.set_cursor(x, y);
        } else if detail_active {
            let (x, y) = field_cursor(&view.form.detail, sections[1]);
            frame.set_cursor(x, y);
        }
    }
}

/// Cursor at the end of the text inside a bordered field; wrapping is ignored.
fn field_cursor(text: &str, area: Rect) -> (u16, u16) {
    let last_line = text.split('\n').last().unwrap_or("");
    let line_index = text.matches('\n').count() as u16;
    let max_x = area.x + area.width.saturating_sub(2);
    let max_y = area.y + area.height.saturating_sub(2);
    let x = (area.x + 1).saturating_add(last_line.width() as u16).min(max_x);
    let y = (area.y + 1).saturating_add(line_index).min(max_y);
    (x, y)
}

fn build_status_line(view: &ScreenView<'_>, ui: &UiState) -> Text<'static> {
    let total = view.rows.len();
    let position = if total == 0 {
        "0/0".to_string()
    } else {
        format!("{}/{}", ui.selected + 1, total)
    };
    let mode = match &view.form.mode {
        FormMode::Create => "Create".to_string(),
        FormMode::Edit(id) => format!("Edit #{id}"),
    };

    let spans = vec![
        Span::raw(format!("Total: {total} ")),
        Span::raw(" | Selected: "),
        Span::styled(position, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" | Form: "),
        Span::styled(mode, Style::default().add_modifier(Modifier::BOLD)),
    ];

    let hint = match ui.focus {
        FocusPane::List => {
            "j/k move • e edit • a new • d delete • Ctrl-r refresh • Tab form • q quit"
        }
        FocusPane::Form => "Tab switch field • Enter/Ctrl-s save • Esc cancel",
    };
    let second = match view.notice {
        Some(notice) => Line::from(vec![
            Span::styled(notice.to_string(), Style::default().fg(Color::Green)),
            Span::raw("  "),
            Span::styled(hint, Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    };

    Text::from(vec![Line::from(spans), second])
}

fn render_overlay(frame: &mut Frame, ui: &UiState) {
    match &ui.overlay {
        Some(OverlayState::ConfirmDelete(draft)) => {
            let area = centered_rect(60, 40, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    DELETE_PROMPT,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::raw(format!("'{}'", draft.title))),
                Line::from(""),
                Line::from(Span::styled(
                    "y/Enter to delete • n/Esc to cancel",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .block(
                Block::default()
                    .title(format!("Confirm Delete (#{})", draft.note_id))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

fn render_alert(frame: &mut Frame, alert: &Alert) {
    let area = centered_rect(60, 40, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            alert.message.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            alert.cause.clone(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to dismiss",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(
        Block::default()
            .title("Error")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
