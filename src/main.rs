//! musicstream-tui - A TUI music player for the MusicStream catalog API.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use tokio::sync::mpsc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod action;
mod app;
mod client;
mod config;
mod liked;
mod mpris;
mod player;
mod tui;
mod ui;

use action::{Action, View};
use app::{App, InputMode};
use config::Config;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "musicstream-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog API base URL (overrides config)
    #[arg(short, long)]
    api_url: Option<String>,

    /// Directory for liked songs (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let log_file = tui::log_path();
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(std::fs::File::create(&log_file)?))
        .with_ansi(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .ok();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install panic hooks
    tui::install_hooks()?;
    init_logging()?;

    let args = Args::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };

    // Apply command-line overrides
    if let Some(url) = args.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = Some(dir);
    }

    if !config.is_valid() {
        return Err(color_eyre::eyre::eyre!(
            "Invalid API URL {:?}: expected http:// or https://",
            config.api.base_url
        ));
    }

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(config, action_tx.clone())?;

    let mut terminal = tui::init()?;

    app.init();

    // Main event loop
    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let action = handle_key_event(key.code, key.modifiers, app.input_mode());
                    if action != Action::None {
                        action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    let action = handle_mouse_event(mouse);
                    if action != Action::None {
                        action_tx.send(action)?;
                    }
                }
                _ => {}
            }
        }

        action_tx.send(Action::Tick)?;

        // Process all pending actions
        while let Ok(action) = action_rx.try_recv() {
            app.handle_action(action)?;
        }

        if app.should_quit {
            break;
        }
    }

    tui::restore()?;

    Ok(())
}

/// Map key events to actions.
fn handle_key_event(code: KeyCode, modifiers: KeyModifiers, mode: InputMode) -> Action {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match mode {
        InputMode::SearchInput => return handle_search_key(code),
        InputMode::Help => {
            return match code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => Action::HideHelp,
                _ => Action::None,
            };
        }
        InputMode::TrackInfo => {
            return match code {
                KeyCode::Esc | KeyCode::Char('i') | KeyCode::Char('q') => Action::HideTrackInfo,
                _ => Action::None,
            };
        }
        InputMode::Normal => {}
    }

    match code {
        KeyCode::Char('q') => Action::Quit,

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => Action::NavigateUp,
        KeyCode::Down | KeyCode::Char('j') => Action::NavigateDown,
        KeyCode::Left | KeyCode::Char('h') => Action::NavigateLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::NavigateRight,
        KeyCode::Enter => Action::Select,
        KeyCode::Esc | KeyCode::Backspace => Action::Back,

        // Views
        KeyCode::Char('1') => Action::SwitchView(View::Home),
        KeyCode::Char('2') => Action::SwitchView(View::Trending),
        KeyCode::Char('3') => Action::SwitchView(View::Search),
        KeyCode::Char('4') => Action::SwitchView(View::Library),
        KeyCode::Tab => Action::NextView,
        KeyCode::BackTab => Action::PrevView,

        // Search
        KeyCode::Char('/') => Action::OpenSearch,
        KeyCode::Char('f') => Action::CycleSearchFilter,

        // Playback
        KeyCode::Char(' ') => Action::PlayPause,
        KeyCode::Char('n') => Action::NextTrack,
        KeyCode::Char('p') => Action::PreviousTrack,
        KeyCode::Char('s') => Action::ToggleShuffle,
        KeyCode::Char('r') => Action::CycleRepeat,
        KeyCode::Char('.') | KeyCode::Char('>') => Action::SeekForward,
        KeyCode::Char(',') | KeyCode::Char('<') => Action::SeekBackward,
        KeyCode::Char('0') | KeyCode::Home => Action::SeekToStart,
        KeyCode::Char('*') => Action::ToggleLike,

        // Volume
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,
        KeyCode::Char('m') => Action::ToggleMute,

        // Queue
        KeyCode::Char('a') => Action::AppendToQueue,
        KeyCode::Char('c') => Action::ClearQueue,
        KeyCode::Char('d') | KeyCode::Delete => Action::RemoveSelectedFromQueue,
        KeyCode::Char('P') => Action::PlayOpenList,

        KeyCode::Char('R') => Action::Refresh,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Char('i') => Action::ShowTrackInfo,
        KeyCode::Char('x') => Action::ClearError,

        _ => Action::None,
    }
}

/// Handle key events while typing a search.
fn handle_search_key(code: KeyCode) -> Action {
    match code {
        KeyCode::Esc => Action::CloseSearch,
        KeyCode::Enter => Action::Select,
        KeyCode::Backspace => Action::SearchBackspace,
        KeyCode::Up => Action::NavigateUp,
        KeyCode::Down => Action::NavigateDown,
        KeyCode::Tab => Action::CycleSearchFilter,
        KeyCode::Char(c) => Action::SearchInput(c),
        _ => Action::None,
    }
}

/// Handle mouse events.
fn handle_mouse_event(mouse: crossterm::event::MouseEvent) -> Action {
    match mouse.kind {
        MouseEventKind::Down(crossterm::event::MouseButton::Left) => {
            Action::MouseClick(mouse.column, mouse.row)
        }
        MouseEventKind::ScrollUp => Action::MouseScroll(-1),
        MouseEventKind::ScrollDown => Action::MouseScroll(1),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char, mode: InputMode) -> Action {
        handle_key_event(KeyCode::Char(c), KeyModifiers::NONE, mode)
    }

    #[test]
    fn test_playback_keys() {
        assert_eq!(key(' ', InputMode::Normal), Action::PlayPause);
        assert_eq!(key('.', InputMode::Normal), Action::SeekForward);
        assert_eq!(key(',', InputMode::Normal), Action::SeekBackward);
        assert_eq!(key('0', InputMode::Normal), Action::SeekToStart);
        assert_eq!(key('m', InputMode::Normal), Action::ToggleMute);
        assert_eq!(key('*', InputMode::Normal), Action::ToggleLike);
        assert_eq!(key('P', InputMode::Normal), Action::PlayOpenList);
        assert_eq!(key('3', InputMode::Normal), Action::SwitchView(View::Search));
    }

    #[test]
    fn test_search_input_captures_characters() {
        assert_eq!(key('q', InputMode::SearchInput), Action::SearchInput('q'));
        assert_eq!(key(' ', InputMode::SearchInput), Action::SearchInput(' '));
        assert_eq!(
            handle_key_event(KeyCode::Esc, KeyModifiers::NONE, InputMode::SearchInput),
            Action::CloseSearch
        );
        // Ctrl+C always quits
        assert_eq!(
            handle_key_event(KeyCode::Char('c'), KeyModifiers::CONTROL, InputMode::SearchInput),
            Action::Quit
        );
    }

    #[test]
    fn test_overlays_swallow_keys() {
        assert_eq!(key(' ', InputMode::Help), Action::None);
        assert_eq!(key('?', InputMode::Help), Action::HideHelp);
        assert_eq!(key('i', InputMode::TrackInfo), Action::HideTrackInfo);
    }

    #[test]
    fn test_cli_overrides() {
        let args = Args::parse_from([
            "musicstream-tui",
            "--api-url",
            "http://localhost:8000/",
            "--data-dir",
            "/tmp/liked",
        ]);
        assert_eq!(args.api_url.as_deref(), Some("http://localhost:8000/"));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/liked")));
        assert!(args.config.is_none());
    }
}
