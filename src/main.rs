// steplab: scrubbable execution timelines for small guest-language programs

mod cache;
mod engine;
mod history;
mod isolate;
mod language;
mod lint;
mod parse;
mod sim;
mod step;
mod storage;
mod timeline;
mod ui;
mod vm;

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use engine::Engine;
use language::Language;
use sim::SimStrategy;
use storage::{FileStorage, MemoryStorage, Storage};
use ui::App;

#[derive(Parser)]
#[command(name = "steplab", version, about = "Scrubbable execution timelines")]
struct Args {
    /// Source file to load; the language is inferred from its extension
    /// unless --language is given.
    file: Option<PathBuf>,

    /// Guest language for the buffer.
    #[arg(short, long, value_enum)]
    language: Option<Language>,

    /// Heuristic strategy for non-dynamic languages.
    #[arg(short, long, value_enum)]
    strategy: Option<SimStrategy>,

    /// Initial playback speed multiplier.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Keep run history in memory only.
    #[arg(long)]
    no_persist: bool,

    /// Run once, print the steps as JSON, and exit without the TUI.
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr; the TUI owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let storage: Box<dyn Storage> = if args.no_persist {
        Box::new(MemoryStorage::new())
    } else {
        match FileStorage::new() {
            Ok(s) => Box::new(s),
            Err(e) => {
                tracing::warn!("falling back to in-memory history: {}", e);
                Box::new(MemoryStorage::new())
            }
        }
    };

    let mut app_engine = Engine::new(storage);

    if let Some(language) = args.language {
        app_engine.set_language(language);
    }

    if let Some(path) = &args.file {
        let source = fs::read_to_string(path)?;
        if args.language.is_none() {
            let inferred = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Language::from_extension);
            match inferred {
                Some(language) => app_engine.set_language(language),
                None => {
                    eprintln!(
                        "Error: cannot infer language for '{}'; pass --language",
                        path.display()
                    );
                    std::process::exit(1);
                }
            }
        }
        app_engine.set_code(source);
    }

    if let Some(strategy) = args.strategy {
        app_engine.set_strategy(strategy);
    }

    if args.dump {
        if let Err(e) = app_engine.run_current() {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        println!("{}", serde_json::to_string_pretty(app_engine.timeline().steps())?);
        return Ok(());
    }

    // Run up front when a file was given so the timeline is ready to scrub.
    if args.file.is_some() {
        if let Err(e) = app_engine.run_current() {
            eprintln!("Warning: {}", e);
            eprintln!("Entering TUI anyway; fix the source and press r.");
        }
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(app_engine);
    app.speed = args.speed;
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
