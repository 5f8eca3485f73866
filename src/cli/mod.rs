use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::{App, NotesViewModel};
use crate::config::{ConfigLoader, API_URL_ENV, CONFIG_ENV};
use crate::remote::HttpNotesApi;
use crate::render::TimestampFormat;

pub mod commands;

use self::commands::{DeleteArgs, EditArgs, ListArgs, NewArgs, ShowArgs};

#[derive(Parser, Debug)]
#[command(
    name = "notes",
    version,
    about = "Terminal client for a remote notes service"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTES_CLIENT_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the API base url (takes precedence over NOTES_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Print every note in server order
    List(ListArgs),
    /// Print a single note
    Show(ShowArgs),
    /// Create a note
    New(NewArgs),
    /// Update an existing note
    Edit(EditArgs),
    /// Delete a note after confirmation
    Delete(DeleteArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(url) = &cli.api_url {
        env::set_var(API_URL_ENV, url);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);

    // The TUI owns the terminal, so its logs go to a file instead.
    let log_file = matches!(command, Commands::Tui).then(|| paths.log_file());
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;

    // Resolve the display offset before the HTTP client spawns its worker thread.
    let timestamps = TimestampFormat::from_display(&config.display);
    let api = HttpNotesApi::new(&config.api)?;
    tracing::debug!(base_url = %api.base_url(), "using notes API");
    let mut view_model = NotesViewModel::new(api, timestamps);

    match command {
        Commands::Tui => {
            let mut app = App::new(view_model);
            commands::run_tui(&mut app)
        }
        Commands::List(args) => commands::list_notes(&mut view_model, args),
        Commands::Show(args) => commands::show_note(&mut view_model, args),
        Commands::New(args) => commands::new_note(&mut view_model, args),
        Commands::Edit(args) => commands::edit_note(&mut view_model, args),
        Commands::Delete(args) => commands::delete_note(&mut view_model, args),
    }
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_tui_without_subcommand() {
        let cli = Cli::try_parse_from(["notes"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn parses_delete_with_yes_and_api_url() {
        let cli = Cli::try_parse_from([
            "notes",
            "--api-url",
            "https://notes.example.test",
            "delete",
            "abc",
            "--yes",
        ])
        .expect("parse");
        assert_eq!(cli.api_url.as_deref(), Some("https://notes.example.test"));
        match cli.command {
            Some(Commands::Delete(args)) => {
                assert_eq!(args.id, "abc");
                assert!(args.yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verify_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
