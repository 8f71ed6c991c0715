//! Search component.

use std::time::{Duration, Instant};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::browse::{render_browse, BrowsePage};
use crate::action::SearchFilter;
use crate::client::models::SearchResults;
use crate::client::CatalogError;
use crate::ui::view_model::{search_sections, BROWSE_CATEGORIES};

/// A search as sent to the catalog. Results carry it back so stale ones can
/// be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub filter: SearchFilter,
}

/// Search state.
#[derive(Debug)]
pub struct SearchState {
    /// Raw input text
    pub input: String,

    pub filter: SearchFilter,

    /// Keystrokes go to the input
    pub editing: bool,

    debounce: Duration,

    /// When the pending search fires
    deadline: Option<Instant>,

    /// Query of the last issued search; re-used when the filter changes
    last_query: Option<String>,

    /// Only results for this request are shown
    latest: Option<SearchRequest>,

    pub results: BrowsePage,

    categories: ListState,
}

impl SearchState {
    pub fn new(debounce: Duration) -> Self {
        let mut categories = ListState::default();
        categories.select(Some(0));
        Self {
            input: String::new(),
            filter: SearchFilter::default(),
            editing: false,
            debounce,
            deadline: None,
            last_query: None,
            latest: None,
            results: BrowsePage::default(),
            categories,
        }
    }

    /// Add character to the input and restart the debounce timer.
    pub fn on_input(&mut self, c: char, now: Instant) {
        self.input.push(c);
        self.input_changed(now);
    }

    /// Remove the last character and restart the debounce timer.
    pub fn backspace(&mut self, now: Instant) {
        if self.input.pop().is_some() {
            self.input_changed(now);
        }
    }

    pub fn input_changed(&mut self, now: Instant) {
        if self.input.trim().is_empty() {
            // Back to browsing
            self.deadline = None;
            self.last_query = None;
            self.latest = None;
            self.results.reset();
        } else {
            self.deadline = Some(now + self.debounce);
        }
    }

    /// The search to send once the input has been quiet for the debounce
    /// period.
    pub fn poll(&mut self, now: Instant) -> Option<SearchRequest> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.submit(),
            _ => None,
        }
    }

    /// Search for the current input right away.
    pub fn submit(&mut self) -> Option<SearchRequest> {
        self.deadline = None;
        let query = self.input.trim().to_string();
        if query.is_empty() {
            return None;
        }
        Some(self.issue(query))
    }

    fn issue(&mut self, query: String) -> SearchRequest {
        let request = SearchRequest {
            query: query.clone(),
            filter: self.filter,
        };
        tracing::debug!(query = %query, filter = self.filter.path_segment(), "Searching");
        self.last_query = Some(query);
        self.latest = Some(request.clone());
        self.results.set_loading();
        request
    }

    /// Change the filter, re-running the last search if there was one.
    pub fn set_filter(&mut self, filter: SearchFilter) -> Option<SearchRequest> {
        self.filter = filter;
        let query = self.last_query.clone()?;
        Some(self.issue(query))
    }

    pub fn cycle_filter(&mut self) -> Option<SearchRequest> {
        self.set_filter(self.filter.next())
    }

    /// Search a browse category immediately.
    pub fn search_category(&mut self, name: &str) -> SearchRequest {
        self.input = name.to_string();
        self.deadline = None;
        self.issue(name.to_string())
    }

    /// Store results if they answer the latest request. Returns false for
    /// stale ones.
    pub fn accept_results(
        &mut self,
        request: &SearchRequest,
        result: Result<SearchResults, CatalogError>,
    ) -> bool {
        if self.latest.as_ref() != Some(request) {
            tracing::debug!(query = %request.query, "Dropping stale search results");
            return false;
        }
        match result {
            Ok(results) => {
                if results.is_empty() {
                    tracing::debug!(query = %request.query, "No search results");
                }
                self.results
                    .set_sections(search_sections(request.filter, &results));
            }
            Err(e) => {
                tracing::warn!("Search failed: {}", e);
                self.results.set_failed(e.to_string());
            }
        }
        true
    }

    /// Re-send the latest search.
    pub fn retry(&mut self) -> Option<SearchRequest> {
        let request = self.latest.clone()?;
        self.results.set_loading();
        Some(request)
    }

    /// No search issued since the input was last cleared.
    pub fn is_browsing(&self) -> bool {
        self.latest.is_none()
    }

    pub fn selected_category(&self) -> Option<&'static str> {
        self.categories
            .selected()
            .and_then(|i| BROWSE_CATEGORIES.get(i).copied())
    }

    pub fn select_next(&mut self) {
        if self.is_browsing() {
            let i = self.categories.selected().map_or(0, |i| i + 1);
            self.categories.select(Some(i % BROWSE_CATEGORIES.len()));
        } else {
            self.results.select_next();
        }
    }

    pub fn select_previous(&mut self) {
        if self.is_browsing() {
            let len = BROWSE_CATEGORIES.len();
            let i = self.categories.selected().map_or(0, |i| i + len - 1);
            self.categories.select(Some(i % len));
        } else {
            self.results.select_previous();
        }
    }

    /// Select the entry drawn on `row` of the results area.
    pub fn select_row(&mut self, row: usize) {
        if self.is_browsing() {
            let index = row + self.categories.offset();
            if index < BROWSE_CATEGORIES.len() {
                self.categories.select(Some(index));
            }
        } else {
            self.results.select_row(row);
        }
    }
}

/// Render the search page: input line with filters, then categories or
/// results.
pub fn render_search(frame: &mut Frame, area: Rect, state: &mut SearchState, focused: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input + filters
            Constraint::Min(3),    // Results
        ])
        .split(area);

    let input_color = if state.editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .title("Search")
        .border_style(Style::default().fg(input_color));

    let mut spans = vec![
        Span::styled(state.input.clone(), Style::default().fg(Color::White)),
        Span::styled(
            if state.editing { "_" } else { "" },
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("   "),
    ];
    for filter in SearchFilter::all() {
        let style = if *filter == state.filter {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", filter.title()), style));
    }
    if state.results.content.is_loading() {
        spans.push(Span::styled(" ...", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).block(input_block), chunks[0]);

    if state.is_browsing() {
        render_categories(frame, chunks[1], &mut state.categories, focused);
    } else {
        render_browse(
            frame,
            chunks[1],
            &mut state.results,
            "Results",
            focused,
            "No results found",
        );
    }
}

fn render_categories(frame: &mut Frame, area: Rect, list_state: &mut ListState, focused: bool) {
    let border_color = if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Browse All")
        .border_style(Style::default().fg(border_color));

    let items: Vec<ListItem> = BROWSE_CATEGORIES
        .iter()
        .map(|name| ListItem::new(*name))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::Track;
    use crate::ui::components::browse::ContentState;

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    fn type_str(state: &mut SearchState, text: &str, at: Instant) {
        for c in text.chars() {
            state.on_input(c, at);
        }
    }

    fn song(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_string(),
            artists: Vec::new(),
            album: None,
            duration: None,
            artwork: Vec::new(),
            streams: Vec::new(),
        }
    }

    #[test]
    fn test_debounce_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));

        state.on_input('a', ms(start, 0));
        state.on_input('r', ms(start, 100));
        state.on_input('i', ms(start, 200));
        assert_eq!(state.poll(ms(start, 300)), None);
        assert_eq!(state.poll(ms(start, 699)), None);

        let first = state.poll(ms(start, 700)).unwrap();
        assert_eq!(first.query, "ari");
        assert_eq!(first.filter, SearchFilter::All);
        // Fires only once
        assert_eq!(state.poll(ms(start, 800)), None);

        state.on_input('j', ms(start, 1200));
        state.on_input('i', ms(start, 1250));
        state.on_input('t', ms(start, 1300));
        assert_eq!(state.poll(ms(start, 1700)), None);
        assert_eq!(state.poll(ms(start, 1800)).unwrap().query, "arijit");
    }

    #[test]
    fn test_whitespace_only_input_never_searches() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));
        type_str(&mut state, "   ", start);
        assert_eq!(state.poll(ms(start, 1000)), None);
        assert!(state.is_browsing());
    }

    #[test]
    fn test_query_is_trimmed() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));
        type_str(&mut state, " rock ", start);
        assert_eq!(state.poll(ms(start, 500)).unwrap().query, "rock");
    }

    #[test]
    fn test_clearing_input_cancels_and_forgets() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));
        type_str(&mut state, "ab", start);
        let request = state.poll(ms(start, 500)).unwrap();
        assert!(!state.is_browsing());

        state.on_input('c', ms(start, 600));
        state.backspace(ms(start, 610));
        state.backspace(ms(start, 620));
        state.backspace(ms(start, 630));
        assert!(state.input.is_empty());
        assert!(state.is_browsing());
        assert_eq!(state.poll(ms(start, 5000)), None);

        // Nothing to re-run on a filter change
        assert_eq!(state.set_filter(SearchFilter::Songs), None);
        // Late results for the cleared query are dropped
        assert!(!state.accept_results(&request, Ok(SearchResults::default())));
        assert_eq!(state.results.content, ContentState::Idle);
    }

    #[test]
    fn test_filter_change_reissues_last_query() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));
        type_str(&mut state, "arijit", start);
        state.poll(ms(start, 500)).unwrap();

        let request = state.cycle_filter().unwrap();
        assert_eq!(
            request,
            SearchRequest {
                query: String::from("arijit"),
                filter: SearchFilter::Songs,
            }
        );
        assert!(state.results.content.is_loading());
    }

    #[test]
    fn test_stale_results_are_dropped() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));
        type_str(&mut state, "ari", start);
        let old = state.poll(ms(start, 500)).unwrap();
        type_str(&mut state, "jit", ms(start, 600));
        let new = state.poll(ms(start, 1100)).unwrap();

        let results = SearchResults {
            songs: vec![song("new")],
            ..SearchResults::default()
        };
        assert!(state.accept_results(&new, Ok(results)));

        let stale = SearchResults {
            songs: vec![song("old")],
            ..SearchResults::default()
        };
        assert!(!state.accept_results(&old, Ok(stale)));
        assert_eq!(
            state.results.selected_item().map(|item| item.id().to_string()),
            Some(String::from("new"))
        );
    }

    #[test]
    fn test_failed_search_can_be_retried() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));
        type_str(&mut state, "rock", start);
        let request = state.poll(ms(start, 500)).unwrap();

        assert!(state.accept_results(
            &request,
            Err(CatalogError::Network(String::from("connection refused")))
        ));
        assert!(matches!(state.results.content, ContentState::Failed(_)));
        assert_eq!(state.retry(), Some(request));
        assert!(state.results.content.is_loading());
    }

    #[test]
    fn test_empty_results_load_no_sections() {
        let start = Instant::now();
        let mut state = SearchState::new(Duration::from_millis(500));
        type_str(&mut state, "zzz", start);
        let request = state.poll(ms(start, 500)).unwrap();
        assert!(state.accept_results(&request, Ok(SearchResults::default())));
        assert_eq!(state.results.content, ContentState::Loaded(Vec::new()));
        assert_eq!(state.results.item_count(), 0);
    }

    #[test]
    fn test_category_searches_immediately() {
        let mut state = SearchState::new(Duration::from_millis(500));
        state.select_previous();
        assert_eq!(state.selected_category(), Some("Romance"));
        state.select_next();
        assert_eq!(state.selected_category(), Some("Bollywood"));

        let request = state.search_category("Bollywood");
        assert_eq!(request.query, "Bollywood");
        assert_eq!(state.input, "Bollywood");
        assert!(!state.is_browsing());
    }
}
