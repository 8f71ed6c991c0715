//! Play queue component.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::player::queue::Queue;
use crate::ui::view_model::{track_rows, truncate};

/// Queue panel state. The tracks themselves live in the player.
#[derive(Debug, Default)]
pub struct QueueState {
    /// Selection state for UI
    pub list_state: ListState,

    /// Whether the queue is visible
    pub visible: bool,
}

impl QueueState {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            ..Default::default()
        }
    }

    /// Get selected index.
    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Move selection up.
    pub fn select_previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => (i - 1).min(len - 1),
        };
        self.list_state.select(Some(i));
    }

    /// Move selection down.
    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_row(&mut self, row: usize, len: usize) {
        let index = row + self.list_state.offset();
        if index < len {
            self.list_state.select(Some(index));
        }
    }

    /// Keep the selection inside a queue of `len` tracks.
    pub fn clamp(&mut self, len: usize) {
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            _ => {}
        }
    }
}

/// Render the queue panel.
pub fn render_queue(
    frame: &mut Frame,
    area: Rect,
    state: &mut QueueState,
    queue: &Queue,
    current_id: Option<&str>,
    focused: bool,
) {
    let title = format!("Queue ({})", queue.len());

    let border_color = if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color));

    state.clamp(queue.len());

    // Room for borders, prefix, highlight symbol and duration
    let width = area.width.saturating_sub(14) as usize;
    let items: Vec<ListItem> = track_rows(queue.tracks(), current_id)
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let is_cursor = !queue.is_empty() && queue.current_index() == i;
            let prefix = if row.is_current {
                " "
            } else if is_cursor {
                "• "
            } else {
                "  "
            };
            let style = if row.is_current {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            ListItem::new(Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(truncate(&row.title, width), style),
                Span::styled(
                    format!(" {}", row.duration),
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

    frame.render_stateful_widget(list, area, &mut state.list_state);
}
