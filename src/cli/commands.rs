use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::app::{App, ConfirmGate, Confirmation, DeleteOutcome, NotesViewModel};
use crate::error::NotesError;
use crate::remote::{Note, NotesApi};
use crate::render::{format_rows_plain, TimestampFormat};

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Print the raw notes as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Note identifier
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Note detail text
    #[arg(long, default_value = "")]
    pub detail: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Note identifier
    pub id: String,
    /// Replacement title (kept when omitted)
    #[arg(long)]
    pub title: Option<String>,
    /// Replacement detail (kept when omitted)
    #[arg(long)]
    pub detail: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Note identifier
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Asks on the controlling terminal. Declines when stdin is not interactive.
pub struct TerminalPrompt;

impl ConfirmGate for TerminalPrompt {
    fn confirm(&mut self, prompt: &str) -> bool {
        if !atty::is(atty::Stream::Stdin) {
            tracing::warn!("stdin is not a terminal; refusing to confirm without --yes");
            return false;
        }
        match prompt_line(&format!("{prompt} [y/N]")) {
            Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                tracing::error!(?err, "failed to read confirmation");
                false
            }
        }
    }
}

pub fn run_tui<A: NotesApi>(app: &mut App<A>) -> Result<()> {
    app.run()
}

pub fn list_notes<A: NotesApi>(vm: &mut NotesViewModel<A>, args: ListArgs) -> Result<()> {
    let result = vm.refresh();
    surface(vm, result)?;
    if args.json {
        let json = serde_json::to_string_pretty(vm.notes()).context("serializing notes")?;
        println!("{json}");
    } else {
        print!("{}", format_rows_plain(vm.rows()));
    }
    Ok(())
}

pub fn show_note<A: NotesApi>(vm: &mut NotesViewModel<A>, args: ShowArgs) -> Result<()> {
    let result = vm.fetch_note(&args.id);
    let note = surface(vm, result)?;
    print!("{}", format_note(&note, vm.timestamps()));
    Ok(())
}

pub fn new_note<A: NotesApi>(vm: &mut NotesViewModel<A>, args: NewArgs) -> Result<()> {
    let title = match args.title {
        Some(title) => title,
        None => prompt_line("Title")?,
    };
    vm.begin_create();
    vm.form_mut().title = title;
    vm.form_mut().detail = args.detail;
    let result = vm.save();
    surface(vm, result)?;
    println!("{}", vm.notice().unwrap_or("Note created"));
    Ok(())
}

pub fn edit_note<A: NotesApi>(vm: &mut NotesViewModel<A>, args: EditArgs) -> Result<()> {
    if args.title.is_none() && args.detail.is_none() {
        bail!("nothing to change: pass --title and/or --detail");
    }
    let result = vm.fetch_note(&args.id);
    let current = surface(vm, result)?;
    vm.begin_edit(&current);
    if let Some(title) = args.title {
        vm.form_mut().title = title;
    }
    if let Some(detail) = args.detail {
        vm.form_mut().detail = detail;
    }
    let result = vm.save();
    surface(vm, result)?;
    println!("{} (#{})", vm.notice().unwrap_or("Note updated"), args.id);
    Ok(())
}

pub fn delete_note<A: NotesApi>(vm: &mut NotesViewModel<A>, args: DeleteArgs) -> Result<()> {
    let outcome = if args.yes {
        vm.delete_note(&args.id, &mut Confirmation::Accept)
    } else {
        vm.delete_note(&args.id, &mut TerminalPrompt)
    };
    match surface(vm, outcome)? {
        DeleteOutcome::Deleted => println!("Deleted note #{}", args.id),
        DeleteOutcome::Declined => println!("Delete canceled"),
    }
    Ok(())
}

/// Turns a reported failure into a CLI error carrying the user-facing message.
fn surface<A: NotesApi, T>(vm: &mut NotesViewModel<A>, result: Result<T, NotesError>) -> Result<T> {
    result.map_err(|err| {
        let message = vm
            .take_alert()
            .map(|alert| alert.message)
            .unwrap_or_else(|| "request failed".to_string());
        anyhow::Error::new(err).context(message)
    })
}

fn format_note(note: &Note, timestamps: &TimestampFormat) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "#{}  {}", note.id, note.title);
    let created = timestamps.format(note.created_at);
    if !created.is_empty() {
        let _ = writeln!(&mut out, "    created {created}");
    }
    let updated = timestamps.format(note.updated_at);
    if !updated.is_empty() {
        let _ = writeln!(&mut out, "    updated {updated}");
    }
    let detail = note.detail_or_empty().trim();
    if !detail.is_empty() {
        out.push('\n');
        for line in detail.lines() {
            let _ = writeln!(&mut out, "    {line}");
        }
    }
    out
}

fn prompt_line(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}
