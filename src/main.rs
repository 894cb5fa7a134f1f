mod compose;
mod config;
mod error;
mod exchange;
mod models;
mod quote_gen;
mod store;
mod totals;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::config::Config;
use crate::quote_gen::QuoteGenerator;
use crate::store::DraftStore;
use crate::ui::{
    drafts::{DraftAction, DraftsState, handle_input as handle_drafts_input, render_drafts},
    preview::{PreviewAction, PreviewState, handle_input as handle_preview_input, render_preview},
    quote_wizard::{
        QuoteWizardAction, QuoteWizardState, handle_input as handle_wizard_input,
        render_quote_wizard,
    },
};

#[derive(Parser)]
#[command(name = "quote-manager", about = "Terminal quote generator")]
struct Cli {
    /// Override the draft storage directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List stored drafts
    List,
    /// Print the composed document for a stored draft
    Print { number: String },
    /// Export a stored draft as JSON
    Export {
        number: String,
        /// Target file; defaults to the output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate a quote JSON file and store it as a draft
    Import { path: PathBuf },
}

// Represents the current screen in the app
enum AppScreen {
    Drafts,
    Wizard,
    Preview,
}

// Main application state
struct AppState {
    config: Config,
    store: DraftStore,
    screen: AppScreen,
    drafts_state: Option<DraftsState>,
    wizard_state: Option<QuoteWizardState>,
    preview_state: Option<PreviewState>,
}

impl AppState {
    fn new(config: Config, store: DraftStore) -> Self {
        Self {
            config,
            store,
            screen: AppScreen::Drafts,
            drafts_state: None,
            wizard_state: None,
            preview_state: None,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quote_manager=info".parse()?),
        )
        .init();

    // Load configuration
    let config = config::init()?;
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().or_else(|| config.data_dir.clone());
    let store = DraftStore::open(data_dir)?;

    match cli.command {
        Some(command) => run_command(command, &config, &store),
        None => run_tui(config, store),
    }
}

fn run_command(command: Command, config: &Config, store: &DraftStore) -> Result<()> {
    match command {
        Command::List => {
            for summary in store.list()? {
                println!(
                    "{:<16} {:<12} {:<32} ${:.2}",
                    summary.number,
                    summary.date.format("%Y-%m-%d"),
                    summary.title,
                    summary.total
                );
            }
        }
        Command::Print { number } => {
            let quote = store.load(&number)?;
            print!("{}", quote_gen::render_text(&quote));
        }
        Command::Export { number, out } => {
            let quote = store.load(&number)?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(&config.output_dir).join(format!("{}.json", quote.file_stem()))
            });
            exchange::export_json(&quote, &path)?;
            println!("Exported quote {} to {}", quote.number, path.display());
        }
        Command::Import { path } => {
            let quote = exchange::import_json(&path)?;
            store.save(&quote)?;
            println!("Imported quote {}", quote.number);
        }
    }

    Ok(())
}

fn run_tui(config: Config, store: DraftStore) -> Result<()> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app_state = AppState::new(config, store);

    // Initialize the drafts screen
    load_drafts_screen(&mut app_state, None)?;

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state);

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = result {
        println!("Error: {}", err);
    }

    println!("Thanks for using Quote Manager!");

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app_state: &mut AppState) -> Result<()> {
    loop {
        // Render current screen
        terminal.draw(|f| {
            match app_state.screen {
                AppScreen::Drafts => {
                    if let Some(state) = &mut app_state.drafts_state {
                        render_drafts(f, state);
                    }
                }
                AppScreen::Wizard => {
                    if let Some(state) = &mut app_state.wizard_state {
                        render_quote_wizard(f, state);
                    }
                }
                AppScreen::Preview => {
                    if let Some(state) = &mut app_state.preview_state {
                        render_preview(f, state);
                    }
                }
            }
        })?;

        // Handle input for current screen
        let should_quit = match app_state.screen {
            AppScreen::Drafts => handle_drafts_screen(app_state)?,
            AppScreen::Wizard => handle_wizard_screen(app_state)?,
            AppScreen::Preview => handle_preview_screen(app_state)?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

fn load_drafts_screen(app_state: &mut AppState, status: Option<String>) -> Result<()> {
    // Load draft summaries from the store
    let drafts = app_state.store.list()?;

    app_state.drafts_state = Some(match status {
        Some(status) => DraftsState::with_status(drafts, status),
        None => DraftsState::new(drafts),
    });
    app_state.screen = AppScreen::Drafts;

    Ok(())
}

fn handle_drafts_screen(app_state: &mut AppState) -> Result<bool> {
    if let Some(state) = &mut app_state.drafts_state {
        match handle_drafts_input(state)? {
            Some(DraftAction::Exit) => {
                return Ok(true);
            }
            Some(DraftAction::NewQuote) => {
                app_state.wizard_state = Some(QuoteWizardState::new(&app_state.config));
                app_state.screen = AppScreen::Wizard;
            }
            Some(DraftAction::EditDraft(number)) => match app_state.store.load(&number) {
                Ok(quote) => {
                    app_state.wizard_state =
                        Some(QuoteWizardState::from_existing(&app_state.config, quote));
                    app_state.screen = AppScreen::Wizard;
                }
                Err(e) => state.set_status(format!("Could not open {}: {}", number, e)),
            },
            Some(DraftAction::PreviewDraft(number)) => match app_state.store.load(&number) {
                Ok(quote) => {
                    app_state.preview_state = Some(PreviewState::new(quote));
                    app_state.screen = AppScreen::Preview;
                }
                Err(e) => state.set_status(format!("Could not open {}: {}", number, e)),
            },
            Some(DraftAction::DeleteDraft(number)) => match app_state.store.delete(&number) {
                Ok(_) => {
                    load_drafts_screen(app_state, Some(format!("Deleted {}", number)))?;
                }
                Err(e) => state.set_status(format!("Could not delete {}: {}", number, e)),
            },
            Some(DraftAction::Import(path)) => match exchange::import_json(&path) {
                Ok(quote) => match app_state.store.save(&quote) {
                    Ok(()) => {
                        load_drafts_screen(
                            app_state,
                            Some(format!("Imported quote {}", quote.number)),
                        )?;
                    }
                    Err(e) => state.set_status(format!("Could not store import: {}", e)),
                },
                // Malformed file: surface the message, nothing applied
                Err(e) => state.set_status(e.to_string()),
            },
            None => {}
        }
    }

    Ok(false)
}

fn handle_wizard_screen(app_state: &mut AppState) -> Result<bool> {
    if let Some(state) = &mut app_state.wizard_state {
        match handle_wizard_input(state)? {
            Some(QuoteWizardAction::Cancel) => {
                load_drafts_screen(app_state, None)?;
            }
            Some(QuoteWizardAction::SaveDraft(quote)) => match app_state.store.save(&quote) {
                Ok(()) => {
                    load_drafts_screen(app_state, Some(format!("Draft {} saved", quote.number)))?;
                }
                Err(e) => state.set_error(format!("Could not save draft: {}", e)),
            },
            Some(QuoteWizardAction::Generate(quote)) => {
                app_state.preview_state = Some(PreviewState::new(quote));
                app_state.screen = AppScreen::Preview;
            }
            None => {}
        }
    }

    Ok(false)
}

fn handle_preview_screen(app_state: &mut AppState) -> Result<bool> {
    let action = match &mut app_state.preview_state {
        Some(state) => handle_preview_input(state)?,
        None => None,
    };

    match action {
        Some(PreviewAction::BackToEdit) => {
            if let Some(state) = app_state.preview_state.take() {
                app_state.wizard_state = Some(QuoteWizardState::from_existing(
                    &app_state.config,
                    state.into_quote(),
                ));
                app_state.screen = AppScreen::Wizard;
            }
        }
        Some(PreviewAction::BackToList) => {
            load_drafts_screen(app_state, None)?;
        }
        Some(PreviewAction::ExportPdf) => {
            if let Some(state) = &mut app_state.preview_state {
                let generated = QuoteGenerator::new(&app_state.config)
                    .and_then(|generator| generator.generate(state.quote()));
                match generated {
                    Ok((_, pdf_path)) => {
                        // Exporting a PDF also persists the draft
                        match app_state.store.save(state.quote()) {
                            Ok(()) => state.set_status(format!(
                                "PDF exported to {} (draft saved)",
                                pdf_path.display()
                            )),
                            Err(e) => state.set_status(format!(
                                "PDF exported to {}, but draft not saved: {}",
                                pdf_path.display(),
                                e
                            )),
                        }
                    }
                    Err(e) => state.set_status(e.to_string()),
                }
            }
        }
        Some(PreviewAction::ExportJson) => {
            if let Some(state) = &mut app_state.preview_state {
                let path = PathBuf::from(&app_state.config.output_dir)
                    .join(format!("{}.json", state.quote().file_stem()));
                match exchange::export_json(state.quote(), &path) {
                    Ok(()) => state.set_status(format!("JSON exported to {}", path.display())),
                    Err(e) => state.set_status(e.to_string()),
                }
            }
        }
        None => {}
    }

    Ok(false)
}
