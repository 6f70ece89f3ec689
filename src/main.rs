use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use folio::bookmark::Bookmarks;
use folio::event_source::TerminalEventSource;
use folio::main_app::{App, run_app_with_event_source};
use folio::panic_handler;
use folio::settings::{self, SettingsStore};

#[derive(Parser, Debug)]
#[command(name = "folio", version)]
#[command(about = "Terminal EPUB reader with click-to-turn reading mode", long_about = None)]
struct Args {
    /// EPUB file to open
    book: Option<PathBuf>,

    /// Reopen the most recently read book
    #[arg(long, conflicts_with = "book")]
    last: bool,

    /// Where to write the log
    #[arg(long, default_value = "folio.log")]
    log_file: PathBuf,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Start with reading mode on
    #[arg(long)]
    reading_mode: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = args.log_level.parse().unwrap_or(LevelFilter::Info);
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("Failed to create log file {}", args.log_file.display()))?,
    )?;
    info!("Starting Folio");

    let settings = SettingsStore::load_or_ephemeral(settings::default_settings_path().as_deref());
    let bookmarks = Bookmarks::load_or_ephemeral(settings::default_bookmarks_path().as_deref());
    let mut app = App::new(settings, bookmarks);
    if args.reading_mode {
        app.set_reading_mode(true);
    }

    if let Some(path) = &args.book {
        app.open_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
    } else if args.last {
        app.reopen_last();
    }

    panic_handler::initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut TerminalEventSource);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        eprintln!("{err:?}");
    }

    info!("Shutting down Folio");
    Ok(())
}
