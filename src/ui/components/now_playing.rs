//! Now playing bar component.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol, StatefulImage};

use crate::ui::view_model::NowPlayingView;

/// Cells in the volume bar.
const VOLUME_CELLS: u16 = 10;

/// Album art for the now playing bar.
pub struct NowPlayingState {
    /// Album art image protocol (for Sixel/Kitty/etc.)
    pub album_art: Option<StatefulProtocol>,

    /// URL of the artwork currently shown or being fetched
    pub album_art_url: Option<String>,

    /// Image picker for terminal graphics
    pub picker: Option<Picker>,
}

impl NowPlayingState {
    pub fn new(show_album_art: bool) -> Self {
        // Try to create a picker for terminal graphics
        let picker = if show_album_art {
            Picker::from_query_stdio().ok()
        } else {
            None
        };

        Self {
            album_art: None,
            album_art_url: None,
            picker,
        }
    }

    /// Note the artwork of the current track. Returns the URL to fetch when it
    /// changed and can be drawn.
    pub fn track_changed(&mut self, artwork: Option<&str>) -> Option<String> {
        if self.album_art_url.as_deref() == artwork {
            return None;
        }
        self.album_art = None;
        self.album_art_url = artwork.map(String::from);
        self.picker.as_ref()?;
        self.album_art_url.clone()
    }

    /// Set the album art image data, unless the track moved on meanwhile.
    pub fn set_album_art(&mut self, url: &str, image_data: &[u8]) {
        if self.album_art_url.as_deref() != Some(url) {
            return;
        }
        if let Some(picker) = &self.picker {
            match image::load_from_memory(image_data) {
                Ok(dyn_image) => self.album_art = Some(picker.new_resize_protocol(dyn_image)),
                Err(e) => tracing::debug!("Undecodable album art {}: {}", url, e),
            }
        }
    }
}

/// Clickable parts of the bar, as drawn last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NowPlayingLayout {
    pub progress: Rect,
    pub volume: Rect,
}

/// Render the now playing bar.
pub fn render_now_playing(
    frame: &mut Frame,
    area: Rect,
    state: &mut NowPlayingState,
    view: &NowPlayingView,
) -> NowPlayingLayout {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if area.height < 4 {
        return NowPlayingLayout::default();
    }

    // Layout: [album art] [info + progress]
    let has_album_art = state.album_art.is_some() && state.picker.is_some();
    let art_width = if has_album_art { inner.height * 2 } else { 0 }; // Approximate square

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(if has_album_art {
            vec![Constraint::Length(art_width.min(8)), Constraint::Min(20)]
        } else {
            vec![Constraint::Min(20)]
        })
        .split(inner);

    let info_area = if has_album_art {
        main_chunks[1]
    } else {
        main_chunks[0]
    };

    if has_album_art {
        if let Some(ref mut protocol) = state.album_art {
            let image = StatefulImage::default();
            frame.render_stateful_widget(image, main_chunks[0], protocol);
        }
    }

    // Layout for info area: [info] [spacer] [progress bar]
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Song info
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Progress bar
        ])
        .split(info_area);

    let info_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(3),                // Play state
            Constraint::Min(20),                  // Song info
            Constraint::Length(22),               // Time + modes
            Constraint::Length(VOLUME_CELLS + 4), // Volume
        ])
        .split(chunks[0]);

    let state_symbol =
        Paragraph::new(view.state_symbol()).style(Style::default().fg(Color::Green));
    frame.render_widget(state_symbol, info_chunks[0]);

    if view.track_id.is_some() {
        let mut spans = vec![
            Span::styled(
                format!("{} ", view.liked_symbol()),
                Style::default().fg(Color::Red),
            ),
            Span::styled(
                view.title.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" - ", Style::default().fg(Color::DarkGray)),
            Span::styled(view.artists.clone(), Style::default().fg(Color::Cyan)),
        ];
        if let Some(album) = &view.album {
            spans.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(album.clone(), Style::default().fg(Color::Yellow)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), info_chunks[1]);
    } else {
        let no_song =
            Paragraph::new(view.title.clone()).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(no_song, info_chunks[1]);
    }

    let time_str = format!(
        "{} / {}  {} {}",
        view.elapsed,
        view.total,
        view.shuffle_symbol(),
        view.repeat.symbol(),
    );
    let time = Paragraph::new(time_str).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(time, info_chunks[2]);

    // Volume: symbol, space, then the clickable bar
    let volume_area = info_chunks[3];
    let volume = Paragraph::new(format!(
        "{}{}",
        view.volume_level.symbol(),
        volume_bar(view.volume)
    ))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(volume, volume_area);

    let progress = (view.progress.clamp(0.0, 1.0) * 100.0) as u16;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::DarkGray))
        .percent(progress)
        .label("");
    frame.render_widget(gauge, chunks[2]);

    NowPlayingLayout {
        progress: chunks[2],
        volume: Rect {
            x: volume_area.x + 2,
            width: volume_area.width.saturating_sub(2).min(VOLUME_CELLS + 2),
            ..volume_area
        },
    }
}

/// Render a small volume bar.
fn volume_bar(volume: f32) -> String {
    let filled = ((volume.clamp(0.0, 1.0) * f32::from(VOLUME_CELLS)).round() as usize)
        .min(usize::from(VOLUME_CELLS));
    let empty = usize::from(VOLUME_CELLS) - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Fraction of the progress bar left of `column`.
pub fn progress_at(bar: Rect, column: u16) -> Option<f64> {
    if bar.width == 0 || column < bar.x || column >= bar.x + bar.width {
        return None;
    }
    Some(f64::from(column - bar.x) / f64::from(bar.width))
}

/// Volume for a click on the volume bar; each cell is a tenth, brackets
/// clamp to the ends.
pub fn volume_at(bar: Rect, column: u16) -> Option<f32> {
    if column < bar.x || column >= bar.x + bar.width {
        return None;
    }
    let cell = (column - bar.x).min(VOLUME_CELLS + 1);
    Some(f32::from(cell.min(VOLUME_CELLS)) / f32::from(VOLUME_CELLS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_bar() {
        assert_eq!(volume_bar(0.0), "[░░░░░░░░░░]");
        assert_eq!(volume_bar(0.42), "[████░░░░░░]");
        assert_eq!(volume_bar(1.5), "[██████████]");
    }

    #[test]
    fn test_progress_at() {
        let bar = Rect::new(10, 5, 100, 1);
        assert_eq!(progress_at(bar, 10), Some(0.0));
        assert_eq!(progress_at(bar, 60), Some(0.5));
        assert_eq!(progress_at(bar, 9), None);
        assert_eq!(progress_at(bar, 110), None);
    }

    #[test]
    fn test_volume_at() {
        let bar = Rect::new(50, 2, VOLUME_CELLS + 2, 1);
        // Opening bracket mutes
        assert_eq!(volume_at(bar, 50), Some(0.0));
        assert_eq!(volume_at(bar, 55), Some(0.5));
        assert_eq!(volume_at(bar, 60), Some(1.0));
        assert_eq!(volume_at(bar, 61), Some(1.0));
        assert_eq!(volume_at(bar, 62), None);
    }

    #[test]
    fn test_track_changed_without_picker() {
        let mut state = NowPlayingState {
            album_art: None,
            album_art_url: None,
            picker: None,
        };
        // Nothing to draw it with, so nothing to fetch
        assert_eq!(state.track_changed(Some("http://img/1.jpg")), None);
        assert_eq!(state.album_art_url.as_deref(), Some("http://img/1.jpg"));
        assert_eq!(state.track_changed(Some("http://img/1.jpg")), None);
        assert_eq!(state.track_changed(None), None);
        assert_eq!(state.album_art_url, None);
    }
}
