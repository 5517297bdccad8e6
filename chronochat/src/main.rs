//! ChronoChat terminal client.
//!
//! Interactive ratatui interface by default; `--headless` runs the same
//! session as a stdin/stdout line protocol.

mod app;
mod events;
mod headless;
mod ui;

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use chronochat_core::auth::{self, AuthError};
use chronochat_core::storage::{self, KvStore};
use chronochat_core::{capsule, export, Catalog, ChatSession};

use app::{App, Screen, SelectAction};
use events::EventResult;
use ui::{Focus, Overlay};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if std::env::var("GEMINI_API_KEY").is_err() {
        eprintln!("GEMINI_API_KEY is not set.");
        eprintln!("Add it to your environment or to a .env file in the working directory.");
        std::process::exit(1);
    }

    let headless = args.iter().any(|a| a == "--headless");
    init_logging(headless)?;

    let mut store = KvStore::open_default().await?;
    let session = ChatSession::from_env(Catalog::builtin())?;

    if headless {
        return headless::run_headless(session, store).await;
    }

    let capsule_text = match capsule::todays_capsule(&mut store).await {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(error = %e, "could not load the daily capsule");
            None
        }
    };
    let logged_in = auth::is_logged_in(&store);

    let mut app = App::new(session, store, logged_in);
    app.capsule = capsule_text;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

/// Diagnostics go to a file in TUI mode so they never corrupt the screen;
/// headless mode logs to stderr, leaving stdout for the protocol.
fn init_logging(headless: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_ansi(false)
            .init();
    } else {
        let path = storage::log_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| ui::render::render(frame, app))?;

        drain_pending(terminal, app).await?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            let mut submitted: Option<String> = None;
            match events::handle_event(app, ev) {
                EventResult::Quit => return Ok(()),
                EventResult::ProcessInput(true) => {
                    submitted = app.submit_input();
                }
                _ => {}
            }
            if let Some(text) = submitted {
                send_chat_message(terminal, app, &text).await?;
            }
        }
    }
}

/// Execute work queued by the event layer. Each await is preceded by a
/// draw so the busy indicators are on screen while the request runs.
async fn drain_pending<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    if let Some((username, password)) = app.pending_login.take() {
        match auth::login(&mut app.store, &username, &password).await {
            Ok(()) => {
                app.screen = Screen::Chat;
                app.login.clear();
                app.focus = Focus::default();
            }
            Err(AuthError::InvalidCredentials) => {
                app.login.error = Some(auth::LOGIN_FAILED_MESSAGE.to_string());
                app.login.password.clear();
            }
            Err(e) => {
                app.login.error = Some(format!("Could not save your login: {e}"));
            }
        }
    }

    if app.pending_logout {
        app.pending_logout = false;
        match auth::logout(&mut app.store).await {
            Ok(()) => {
                app.session.go_back();
                app.login.clear();
                app.clear_input();
                app.clear_status();
                app.close_overlay();
                app.focus = Focus::default();
                app.screen = Screen::Login;
            }
            Err(e) => app.set_status(format!("Could not log out: {e}")),
        }
    }

    if let Some(action) = app.pending_select.take() {
        match action {
            SelectAction::Mode(mode) => app.session.choose_mode(mode),
            SelectAction::Era(era_id) => {
                let _ = app.session.choose_era(&era_id);
            }
            SelectAction::Role(role_id) => {
                let _ = app.session.choose_role(&role_id).await;
            }
            SelectAction::Target(kind, id) => {
                // A scripted character greeting goes through the model
                app.awaiting_reply = true;
                terminal.draw(|frame| ui::render::render(frame, app))?;
                let _ = app.session.choose_target(kind, &id).await;
                app.awaiting_reply = false;
            }
            SelectAction::ClearTarget => app.session.clear_target(),
            SelectAction::Back => app.session.go_back(),
        }
        app.clamp_cursors();
        app.advance_focus();
        app.clear_status();
        app.scroll_to_bottom();
    }

    if app.pending_snapshot {
        app.pending_snapshot = false;
        app.awaiting_snapshot = true;
        terminal.draw(|frame| ui::render::render(frame, app))?;
        match app.session.take_snapshot().await {
            Ok(snapshot) => app.set_overlay(Overlay::Snapshot(snapshot)),
            Err(_) => app.scroll_to_bottom(),
        }
        app.awaiting_snapshot = false;
    }

    if let Some(path) = app.pending_export.take() {
        match export::write_html(&path, &app.export_title(), app.session.lines()).await {
            Ok(()) => app.set_status(format!("Transcript exported to {}", path.display())),
            Err(e) => app.set_status(format!("Export failed: {e}")),
        }
    }

    Ok(())
}

async fn send_chat_message<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    text: &str,
) -> io::Result<()> {
    app.awaiting_reply = true;
    app.scroll_to_bottom();
    terminal.draw(|frame| ui::render::render(frame, app))?;
    let _ = app.session.send_message(text).await;
    app.awaiting_reply = false;
    app.scroll_to_bottom();
    Ok(())
}

fn print_help() {
    println!("ChronoChat - roleplay chat across eras, powered by Gemini");
    println!();
    println!("Usage: chronochat [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --headless    Run a stdin/stdout line protocol instead of the TUI");
    println!("  -h, --help    Print this help");
    println!();
    println!("Environment:");
    println!("  GEMINI_API_KEY          API key for chat and snapshots (required)");
    println!("  CHRONOCHAT_TEXT_MODEL   Override the chat model");
    println!("  CHRONOCHAT_IMAGE_MODEL  Override the image model");
    println!("  RUST_LOG                Log filter; TUI mode writes to a log file");
    println!();
    println!("Press '?' inside the app for the key reference.");
}
