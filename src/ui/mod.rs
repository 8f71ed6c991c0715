//! Main UI layout and rendering.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::action::View;
use crate::app::{App, Focus};
use crate::client::models::Track;

pub mod components;
pub mod view_model;

pub use components::*;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Main layout: [tabs] [content + queue] [now playing]
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Content
            Constraint::Length(5), // Now playing
        ])
        .split(area);

    app.layout.tabs = main_chunks[0];
    render_tabs(frame, main_chunks[0], app.view);

    // Content area: [page] [queue]
    let content_chunks = if app.queue.visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(main_chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(main_chunks[1])
    };

    app.layout.content = content_chunks[0];
    app.layout.queue = (content_chunks.len() > 1).then(|| content_chunks[1]);

    let current_id = app.player.current_track().map(|t| t.id.clone());
    let content_focused = app.focus == Focus::Content;

    if let Some(detail) = &mut app.detail {
        render_track_list(
            frame,
            content_chunks[0],
            detail,
            current_id.as_deref(),
            content_focused,
            "No songs",
        );
    } else {
        match app.view {
            View::Home => render_browse(
                frame,
                content_chunks[0],
                &mut app.home,
                "Home",
                content_focused,
                "Nothing to show",
            ),
            View::Trending => render_browse(
                frame,
                content_chunks[0],
                &mut app.trending,
                "Trending",
                content_focused,
                "Nothing to show",
            ),
            View::Search => render_search(frame, content_chunks[0], &mut app.search, content_focused),
            View::Library => render_track_list(
                frame,
                content_chunks[0],
                &mut app.library,
                current_id.as_deref(),
                content_focused,
                "No Liked Songs",
            ),
        }
    }

    if let Some(queue_area) = app.layout.queue {
        render_queue(
            frame,
            queue_area,
            &mut app.queue,
            app.player.queue(),
            current_id.as_deref(),
            app.focus == Focus::Queue,
        );
    }

    let view = view_model::now_playing(&app.player);
    app.layout.now_playing =
        render_now_playing(frame, main_chunks[2], &mut app.now_playing, &view);

    if app.show_help {
        render_help(frame, area);
    }

    if app.show_track_info {
        render_track_info(frame, area, app.player.current_track(), view.liked);
    }

    if let Some(error) = &app.error_message {
        render_error(frame, area, error);
    }
}

/// Tab label padding on each side, and the divider between tabs.
const TAB_PADDING: u16 = 1;
const TAB_DIVIDER: u16 = 1;

fn tab_label(view: View) -> String {
    format!("{} {}", view.index() + 1, view.title())
}

/// Render the tab bar.
fn render_tabs(frame: &mut Frame, area: Rect, current: View) {
    let titles: Vec<Line> = View::all()
        .iter()
        .map(|v| {
            let style = if *v == current {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(tab_label(*v), style))
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("musicstream-tui")
                .border_style(Style::default().fg(Color::Blue)),
        )
        .select(current.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

/// The tab under a click on the title row of the tab bar.
pub fn tab_at(tabs: Rect, x: u16, y: u16) -> Option<View> {
    if y != tabs.y + 1 {
        return None;
    }
    let click_x = x.checked_sub(tabs.x + 1)?; // left border
    let mut pos: u16 = 0;
    for &view in View::all() {
        let width = tab_label(view).len() as u16 + 2 * TAB_PADDING;
        if click_x >= pos && click_x < pos + width {
            return Some(view);
        }
        pos += width + TAB_DIVIDER;
    }
    None
}

fn heading(text: &str) -> Line<'_> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Render the help overlay.
fn render_help(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Navigation"),
        Line::from("  j/k or ↑/↓    Move up/down"),
        Line::from("  h/l or ←/→    Switch focus between page and queue"),
        Line::from("  Enter         Open or play selection"),
        Line::from("  Esc/Backspace Close album/playlist"),
        Line::from("  1-4           Home/Trending/Search/Library"),
        Line::from("  Tab/Shift+Tab Cycle through views"),
        Line::from(""),
        heading("Playback"),
        Line::from("  Space         Play/Pause"),
        Line::from("  n/p           Next/Previous track"),
        Line::from("  ,/.           Seek backward/forward (5s)"),
        Line::from("  0/Home        Back to start of track"),
        Line::from("  +/-           Volume up/down"),
        Line::from("  m             Mute/unmute"),
        Line::from("  s             Toggle shuffle"),
        Line::from("  r             Cycle repeat mode"),
        Line::from("  *             Like/unlike current song"),
        Line::from(""),
        heading("Queue"),
        Line::from("  a             Add selection to queue"),
        Line::from("  P             Play open album/playlist"),
        Line::from("  c             Clear queue"),
        Line::from("  d/Delete      Remove selected from queue"),
        Line::from(""),
        heading("Search"),
        Line::from("  /             Type a query (Enter searches now, Esc stops typing)"),
        Line::from("  f             Cycle search filter"),
        Line::from(""),
        heading("Other"),
        Line::from("  R             Retry/refresh current page"),
        Line::from("  i             Show track info"),
        Line::from("  ?             Show this help"),
        Line::from("  x             Dismiss error"),
        Line::from("  q             Quit"),
        Line::from(""),
        heading("Mouse"),
        Line::from("  Click         Select item / switch tab"),
        Line::from("  Click prog    Seek in track"),
        Line::from("  Click vol     Set volume"),
        Line::from("  Scroll        Navigate list"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Cyan)),
        Span::raw(value),
    ])
}

/// Render the track info popup.
fn render_track_info(frame: &mut Frame, area: Rect, track: Option<&Track>, liked: bool) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let close_hint = Line::from(Span::styled(
        "Press Esc or i to close",
        Style::default().fg(Color::DarkGray),
    ));

    let info_lines = if let Some(track) = track {
        let qualities: Vec<&str> = track.streams.iter().map(|s| s.quality.as_str()).collect();
        vec![
            Line::from(Span::styled(
                "Track Information",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            field("Title: ", track.title.clone()),
            field("Artists: ", track.display_artists()),
            field(
                "Album: ",
                track.album.clone().unwrap_or_else(|| String::from("Unknown")),
            ),
            field("Duration: ", track.duration_string()),
            field("Streams: ", qualities.join(", ")),
            field("Liked: ", String::from(if liked { "yes" } else { "no" })),
            field("ID: ", track.id.clone()),
            Line::from(""),
            close_hint,
        ]
    } else {
        vec![
            Line::from(Span::styled(
                "No track playing",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            close_hint,
        ]
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Track Info")
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(info_lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

/// Render an error message overlay.
fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect(60, 20, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Error (x to dismiss)")
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, popup_area);
}

/// Create a centered rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
