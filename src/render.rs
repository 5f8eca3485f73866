//! Pure projection of the note list into displayable rows.
//!
//! Nothing here touches the terminal; the TUI and the `list` subcommand both
//! consume [`NoteRow`]s.

use std::fmt::Write as _;

use time::format_description::well_known::Rfc3339;
use time::format_description::OwnedFormatItem;
use time::{OffsetDateTime, UtcOffset};

use crate::config::DisplayConfig;
use crate::remote::Note;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub created: String,
    pub updated: String,
}

#[derive(Debug, Clone)]
pub struct TimestampFormat {
    offset: UtcOffset,
    items: Option<OwnedFormatItem>,
}

impl TimestampFormat {
    pub fn new(offset: UtcOffset, items: Option<OwnedFormatItem>) -> Self {
        Self { offset, items }
    }

    pub fn from_display(display: &DisplayConfig) -> Self {
        let items = match display.format_items() {
            Ok(items) => Some(items),
            Err(err) => {
                tracing::warn!(?err, "using RFC 3339 for note timestamps");
                None
            }
        };
        Self::new(display.resolve_offset(), items)
    }

    pub fn utc() -> Self {
        Self::new(UtcOffset::UTC, DisplayConfig::default().format_items().ok())
    }

    /// Empty for a missing value; never fails.
    pub fn format(&self, value: Option<OffsetDateTime>) -> String {
        let Some(dt) = value else {
            return String::new();
        };
        let local = dt.to_offset(self.offset);
        let formatted = match &self.items {
            Some(items) => local.format(items),
            None => local.format(&Rfc3339),
        };
        formatted.unwrap_or_else(|_| dt.unix_timestamp().to_string())
    }
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self::utc()
    }
}

pub fn note_rows(notes: &[Note], timestamps: &TimestampFormat) -> Vec<NoteRow> {
    notes
        .iter()
        .map(|note| NoteRow {
            id: note.id.clone(),
            title: note.title.clone(),
            detail: note.detail_or_empty().to_string(),
            created: timestamps.format(note.created_at),
            updated: timestamps.format(note.updated_at),
        })
        .collect()
}

pub fn format_rows_plain(rows: &[NoteRow]) -> String {
    if rows.is_empty() {
        return "No notes yet.\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let mut line = format!("#{}  {}", row.id, row.title);
        if !row.created.is_empty() {
            line.push_str("  ");
            line.push_str(&row.created);
        }
        let _ = writeln!(&mut out, "{line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, format_description, offset};

    fn note(id: &str, title: &str, created_at: Option<OffsetDateTime>) -> Note {
        Note {
            id: id.into(),
            title: title.into(),
            detail: None,
            created_at,
            updated_at: None,
        }
    }

    #[test]
    fn missing_timestamp_renders_empty() {
        assert_eq!(TimestampFormat::utc().format(None), "");
    }

    #[test]
    fn timestamp_is_shifted_into_display_offset() {
        let format = TimestampFormat::new(
            offset!(-5),
            Some(OwnedFormatItem::from(format_description!(
                "[year]-[month]-[day] [hour]:[minute]"
            ))),
        );
        assert_eq!(
            format.format(Some(datetime!(2024-01-01 03:30 UTC))),
            "2023-12-31 22:30"
        );
    }

    #[test]
    fn rows_follow_note_order() {
        let notes = vec![
            note("2", "Later", None),
            note("1", "Groceries", Some(datetime!(2024-01-01 0:00 UTC))),
        ];
        let rows = note_rows(&notes, &TimestampFormat::utc());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Later");
        assert_eq!(rows[0].created, "");
        assert_eq!(rows[1].created, "2024-01-01 00:00");
    }

    #[test]
    fn plain_listing_skips_empty_dates() {
        let notes = vec![
            note("1", "Groceries", Some(datetime!(2024-01-01 0:00 UTC))),
            note("2", "Call mom", None),
        ];
        let output = format_rows_plain(&note_rows(&notes, &TimestampFormat::utc()));
        insta::assert_snapshot!(output, @r"
        #1  Groceries  2024-01-01 00:00
        #2  Call mom
        ");
    }

    #[test]
    fn plain_listing_of_empty_collection() {
        assert_eq!(format_rows_plain(&[]), "No notes yet.\n");
    }
}
