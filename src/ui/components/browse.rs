//! Browse pages: sections of cards (home, trending, search results) and
//! track lists (album/playlist detail, liked songs).

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::client::models::{CatalogItem, Track};
use crate::ui::view_model::{card, track_rows, truncate, Section};

/// Remote content of a page.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContentState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> ContentState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Move a selection within `len` entries, wrapping at both ends.
fn step(selected: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match selected {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    })
}

// ============================================================================
// Sections of cards
// ============================================================================

/// A page of card sections. Selection runs across all sections.
#[derive(Debug, Default)]
pub struct BrowsePage {
    pub content: ContentState<Vec<Section>>,
    selected: Option<usize>,
    list_state: ListState,
}

impl BrowsePage {
    pub fn set_loading(&mut self) {
        self.content = ContentState::Loading;
        self.selected = None;
    }

    pub fn set_failed(&mut self, message: impl Into<String>) {
        self.content = ContentState::Failed(message.into());
        self.selected = None;
    }

    pub fn set_sections(&mut self, sections: Vec<Section>) {
        self.selected = sections.iter().any(|s| !s.items.is_empty()).then_some(0);
        self.content = ContentState::Loaded(sections);
        *self.list_state.offset_mut() = 0;
    }

    pub fn reset(&mut self) {
        self.content = ContentState::Idle;
        self.selected = None;
    }

    fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.content
            .loaded()
            .into_iter()
            .flat_map(|sections| sections.iter().flat_map(|s| s.items.iter()))
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.items().nth(self.selected?)
    }

    pub fn select_next(&mut self) {
        self.selected = step(self.selected, self.item_count(), true);
    }

    pub fn select_previous(&mut self) {
        self.selected = step(self.selected, self.item_count(), false);
    }

    /// Select the item drawn on `row` (relative to the list's first visible row).
    pub fn select_row(&mut self, row: usize) {
        let Some(sections) = self.content.loaded() else {
            return;
        };
        let target = row + self.list_state.offset();
        let mut line = 0;
        let mut index = 0;
        for section in sections {
            line += 1; // header
            if target < line + section.items.len() {
                if target >= line {
                    self.selected = Some(index + target - line);
                }
                return;
            }
            line += section.items.len();
            index += section.items.len();
        }
    }

    /// List row of the selected item, counting section headers.
    fn selected_row(&self) -> Option<usize> {
        let mut remaining = self.selected?;
        let mut row = 0;
        for section in self.content.loaded()? {
            row += 1;
            if remaining < section.items.len() {
                return Some(row + remaining);
            }
            remaining -= section.items.len();
            row += section.items.len();
        }
        None
    }
}

/// Render a page of card sections.
pub fn render_browse(
    frame: &mut Frame,
    area: Rect,
    page: &mut BrowsePage,
    title: &str,
    focused: bool,
    empty_message: &str,
) {
    let block = panel(title, focused);

    let sections = match &page.content {
        ContentState::Loaded(sections) if !sections.is_empty() => sections,
        other => {
            render_status(frame, area, block, other, empty_message);
            return;
        }
    };

    // Leave room for borders, the symbol and the highlight marker
    let width = area.width.saturating_sub(8) as usize;
    let mut items: Vec<ListItem> = Vec::new();
    for section in sections {
        items.push(ListItem::new(Line::from(Span::styled(
            section.title.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))));
        for item in &section.items {
            let card = card(item);
            let title = truncate(&card.title, width);
            let subtitle_width = width.saturating_sub(title.chars().count() + 3);
            items.push(ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", card.kind.symbol()),
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(title, Style::default().fg(Color::White)),
                Span::styled(" · ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    truncate(&card.subtitle, subtitle_width),
                    Style::default().fg(Color::Cyan),
                ),
            ])));
        }
    }

    let selected_row = page.selected_row();
    page.list_state.select(selected_row);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut page.list_state);
}

// ============================================================================
// Track lists
// ============================================================================

/// Where a track list came from, so it can be reloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    Album(String),
    Playlist(String),
    /// Songs of an artist, found by name
    Artist(String),
    Liked,
}

/// A titled, numbered list of tracks.
#[derive(Debug)]
pub struct TrackListPage {
    pub title: String,
    pub subtitle: Option<String>,
    pub source: TrackSource,
    pub content: ContentState<Vec<Track>>,
    list_state: ListState,
}

impl TrackListPage {
    pub fn new(title: impl Into<String>, source: TrackSource) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            source,
            content: ContentState::Loading,
            list_state: ListState::default(),
        }
    }

    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.list_state
            .select(if tracks.is_empty() { None } else { Some(0) });
        *self.list_state.offset_mut() = 0;
        self.content = ContentState::Loaded(tracks);
    }

    pub fn tracks(&self) -> &[Track] {
        self.content.loaded().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.list_state
            .selected()
            .filter(|i| *i < self.tracks().len())
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks().get(self.selected_index()?)
    }

    pub fn select_next(&mut self) {
        let next = step(self.list_state.selected(), self.tracks().len(), true);
        self.list_state.select(next);
    }

    pub fn select_previous(&mut self) {
        let prev = step(self.list_state.selected(), self.tracks().len(), false);
        self.list_state.select(prev);
    }

    pub fn select_row(&mut self, row: usize) {
        let index = row + self.list_state.offset();
        if index < self.tracks().len() {
            self.list_state.select(Some(index));
        }
    }
}

/// Render a numbered track list.
pub fn render_track_list(
    frame: &mut Frame,
    area: Rect,
    page: &mut TrackListPage,
    current_id: Option<&str>,
    focused: bool,
    empty_message: &str,
) {
    let title = match &page.subtitle {
        Some(subtitle) => format!("{} · {}", page.title, subtitle),
        None => page.title.clone(),
    };
    let block = panel(&title, focused);

    let tracks = match &page.content {
        ContentState::Loaded(tracks) if !tracks.is_empty() => tracks,
        other => {
            render_status(frame, area, block, other, empty_message);
            return;
        }
    };

    let width = area.width.saturating_sub(18) as usize;
    let items: Vec<ListItem> = track_rows(tracks, current_id)
        .into_iter()
        .map(|row| {
            let style = if row.is_current {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let title = truncate(&row.title, width * 3 / 5);
            let artists = truncate(&row.artists, width.saturating_sub(title.chars().count()));

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>3} ", row.number),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(title, style),
                Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                Span::styled(artists, Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("  {}", row.duration),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut page.list_state);
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border_color = if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color))
}

/// Loading, failure and empty placeholders.
fn render_status<T>(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    content: &ContentState<T>,
    empty_message: &str,
) {
    let lines = match content {
        ContentState::Loading => vec![Line::from(Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        ))],
        ContentState::Failed(message) => vec![
            Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press R to retry",
                Style::default().fg(Color::DarkGray),
            )),
        ],
        ContentState::Idle | ContentState::Loaded(_) => vec![Line::from(Span::styled(
            empty_message.to_string(),
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
