//! Main application state and logic.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use color_eyre::Result;
use ratatui::layout::{Position, Rect};
use tokio::sync::mpsc;

use crate::action::{Action, SearchFilter, View};
use crate::client::models::{join_names, CatalogItem, Track};
use crate::client::{CatalogClient, CatalogError};
use crate::config::Config;
use crate::liked::{FileStore, LikedSongs, MemoryStore};
use crate::mpris::MediaSession;
use crate::player::{
    LoadOutcome, LoadRequest, MediaEvent, PlaybackController, RodioMedia, SeekTarget, SourceId,
};
use crate::ui::components::now_playing::{progress_at, volume_at};
use crate::ui::view_model::{home_sections, trending_sections};
use crate::ui::{
    tab_at, BrowsePage, ContentState, NowPlayingLayout, NowPlayingState, QueueState, SearchRequest,
    SearchState, TrackListPage, TrackSource,
};

/// Keyboard seek step.
const SEEK_STEP: Duration = Duration::from_secs(5);

/// Volume change per key press.
const VOLUME_STEP: f32 = 0.05;

/// Which panel receives navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Content,
    Queue,
}

/// UI layout areas for mouse click detection.
#[derive(Debug, Default, Clone)]
pub struct UiLayout {
    /// Tab bar area
    pub tabs: Rect,
    /// Page area
    pub content: Rect,
    /// Queue panel area (if visible)
    pub queue: Option<Rect>,
    /// Progress and volume bars
    pub now_playing: NowPlayingLayout,
}

/// How keys should be read right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    SearchInput,
    Help,
    TrackInfo,
}

/// Main application state.
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,

    client: CatalogClient,

    /// Queue, transport and liked songs
    pub player: PlaybackController<RodioMedia>,

    pub view: View,
    pub home: BrowsePage,
    pub trending: BrowsePage,
    pub search: SearchState,
    pub library: TrackListPage,

    /// Open album, playlist or artist page, drawn over the current view
    pub detail: Option<TrackListPage>,

    pub queue: QueueState,
    pub now_playing: NowPlayingState,
    pub focus: Focus,

    /// Help overlay visible
    pub show_help: bool,

    /// Track info popup visible
    pub show_track_info: bool,

    /// Error message to display
    pub error_message: Option<String>,

    /// Action sender for async operations
    pub action_tx: mpsc::UnboundedSender<Action>,

    /// UI layout areas for mouse detection
    pub layout: UiLayout,

    mpris: Option<MediaSession>,
}

impl App {
    /// Create the application. Must run inside the tokio runtime.
    pub fn new(config: Config, action_tx: mpsc::UnboundedSender<Action>) -> Result<Self> {
        let client = CatalogClient::new(config.api.base_url.clone(), config.timeout())?;

        let liked = match config.data_dir() {
            Ok(data_dir) => {
                tracing::info!("Liked songs stored in {}", data_dir.display());
                LikedSongs::load(Box::new(FileStore::new(data_dir)))
            }
            Err(e) => {
                tracing::warn!("Liked songs will not be saved: {}", e);
                LikedSongs::load(Box::new(MemoryStore::default()))
            }
        };
        tracing::info!("{} liked songs", liked.len());

        let (media, mut media_events) = RodioMedia::spawn();
        let player = PlaybackController::new(
            media,
            liked,
            config.volume(),
            config.player.stream_quality.clone(),
        );

        // Media events become actions
        let tx = action_tx.clone();
        tokio::spawn(async move {
            while let Some((source, event)) = media_events.recv().await {
                if tx.send(Action::Media(source, event)).is_err() {
                    break;
                }
            }
        });

        let mpris = if config.ui.media_keys {
            match MediaSession::start() {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Media keys unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            should_quit: false,
            client,
            player,
            view: View::default(),
            home: BrowsePage::default(),
            trending: BrowsePage::default(),
            search: SearchState::new(config.debounce()),
            library: TrackListPage::new("Liked Songs", TrackSource::Liked),
            detail: None,
            queue: QueueState::new(config.ui.show_queue),
            now_playing: NowPlayingState::new(config.ui.show_album_art),
            focus: Focus::default(),
            show_help: false,
            show_track_info: false,
            error_message: None,
            action_tx,
            layout: UiLayout::default(),
            mpris,
        })
    }

    /// Start loading the first pages.
    pub fn init(&mut self) {
        tracing::info!("Using catalog at {}", self.client.base_url());
        self.load_home();
        self.load_trending();
        self.load_library();
    }

    pub fn input_mode(&self) -> InputMode {
        if self.show_help {
            InputMode::Help
        } else if self.show_track_info {
            InputMode::TrackInfo
        } else if self.search.editing && self.view == View::Search {
            InputMode::SearchInput
        } else {
            InputMode::Normal
        }
    }

    /// Handle an action and update state.
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }

            Action::Tick => self.tick()?,

            // Navigation
            Action::NavigateUp => self.navigate(false),
            Action::NavigateDown => self.navigate(true),
            Action::NavigateLeft => {
                self.focus = Focus::Content;
            }
            Action::NavigateRight => {
                if self.queue.visible {
                    self.focus = Focus::Queue;
                }
            }
            Action::Select => self.select(),
            Action::Back => {
                if self.search.editing {
                    self.search.editing = false;
                } else if self.focus == Focus::Queue {
                    self.focus = Focus::Content;
                } else {
                    self.detail = None;
                }
            }
            Action::SwitchView(view) => self.switch_view(view),
            Action::NextView => self.switch_view(self.view.next()),
            Action::PrevView => self.switch_view(self.view.prev()),

            // Mouse
            Action::MouseClick(x, y) => self.click(x, y),
            Action::MouseScroll(delta) => {
                if !self.show_help && !self.show_track_info {
                    self.navigate(delta > 0);
                }
            }

            // Search
            Action::OpenSearch => {
                self.switch_view(View::Search);
                self.search.editing = true;
            }
            Action::CloseSearch => {
                self.search.editing = false;
            }
            Action::SearchInput(c) => self.search.on_input(c, Instant::now()),
            Action::SearchBackspace => self.search.backspace(Instant::now()),
            Action::CycleSearchFilter => {
                if let Some(request) = self.search.cycle_filter() {
                    self.run_search(request);
                }
            }

            // Playback
            Action::PlayPause => {
                match self.player.toggle_play_pause() {
                    Ok(request) => self.start_load(request),
                    Err(e) => self.show_error(e),
                }
            }
            Action::NextTrack => {
                let request = self.player.next();
                self.start_load(request);
            }
            Action::PreviousTrack => {
                let request = self.player.previous();
                self.start_load(request);
            }
            Action::SeekForward => self.seek(SeekTarget::Forward(SEEK_STEP)),
            Action::SeekBackward => self.seek(SeekTarget::Backward(SEEK_STEP)),
            Action::SeekToStart => self.seek(SeekTarget::Absolute(Duration::ZERO)),
            Action::VolumeUp => self.set_volume(self.player.volume() + VOLUME_STEP),
            Action::VolumeDown => self.set_volume(self.player.volume() - VOLUME_STEP),
            Action::ToggleMute => {
                if let Err(e) = self.player.toggle_mute() {
                    self.show_error(e);
                }
            }
            Action::ToggleShuffle => {
                let on = self.player.toggle_shuffle();
                tracing::debug!("Shuffle {}", if on { "on" } else { "off" });
            }
            Action::CycleRepeat => {
                let mode = self.player.cycle_repeat();
                tracing::debug!("Repeat {}", mode.label());
            }
            Action::ToggleLike => match self.player.toggle_like() {
                Ok(_) => self.load_library(),
                Err(e) => self.show_error(e),
            },

            // Queue
            Action::AppendToQueue => {
                if let Some(track) = self.selected_track() {
                    tracing::debug!("Queued {}", track.title);
                    self.player.enqueue(track);
                }
            }
            Action::ClearQueue => {
                self.player.clear_queue();
                self.queue.clamp(0);
            }
            Action::RemoveSelectedFromQueue => {
                if self.focus == Focus::Queue {
                    if let Some(index) = self.queue.selected() {
                        self.player.remove_from_queue(index);
                        self.queue.clamp(self.player.queue().len());
                    }
                }
            }
            Action::PlayOpenList => {
                let tracks = self.open_list().map(|page| page.tracks().to_vec());
                if let Some(tracks) = tracks {
                    let request = self.player.play_queue(tracks, 0);
                    self.start_load(request);
                }
            }

            Action::Refresh => self.refresh(),

            // Catalog responses
            Action::HomeLoaded(result) => match result {
                Ok(feed) => self.home.set_sections(home_sections(&feed)),
                Err(e) => {
                    tracing::warn!("Failed to load home: {}", e);
                    self.home.set_failed(e.to_string());
                }
            },
            Action::TrendingLoaded(result) => match result {
                Ok(tracks) => self.trending.set_sections(trending_sections(&tracks)),
                Err(e) => {
                    tracing::warn!("Failed to load trending: {}", e);
                    self.trending.set_failed(e.to_string());
                }
            },
            Action::SearchCompleted(request, result) => {
                self.search.accept_results(&request, result);
            }
            Action::AlbumLoaded(id, result) => {
                if let Some(page) = self.detail_for(&TrackSource::Album(id)) {
                    match result {
                        Ok(album) => {
                            page.title = album.title;
                            page.subtitle = join_names(&album.artists)
                                .or_else(|| album.year.map(|y| y.to_string()));
                            page.set_tracks(album.tracks);
                        }
                        Err(e) => page.content = ContentState::Failed(e.to_string()),
                    }
                }
            }
            Action::PlaylistLoaded(id, result) => {
                if let Some(page) = self.detail_for(&TrackSource::Playlist(id)) {
                    match result {
                        Ok(playlist) => {
                            page.title = playlist.title;
                            page.subtitle = playlist.description;
                            page.set_tracks(playlist.tracks);
                        }
                        Err(e) => page.content = ContentState::Failed(e.to_string()),
                    }
                }
            }
            Action::ArtistSongsLoaded(name, result) => {
                if let Some(page) = self.detail_for(&TrackSource::Artist(name)) {
                    match result {
                        Ok(results) => page.set_tracks(results.songs),
                        Err(e) => page.content = ContentState::Failed(e.to_string()),
                    }
                }
            }
            Action::LikedResolved(results) => self.liked_resolved(results),
            Action::TrackResolved(request, result) => {
                match self.player.finish_load(request, result) {
                    Ok(LoadOutcome::Started) => self.track_changed(),
                    Ok(LoadOutcome::Stale) => {}
                    Err(e) => self.show_error(e),
                }
            }
            Action::AlbumArtLoaded(url, data) => {
                self.now_playing.set_album_art(&url, &data);
            }

            Action::Media(source, event) => self.media_event(source, event),

            // Overlays
            Action::ShowHelp => self.show_help = true,
            Action::HideHelp => self.show_help = false,
            Action::ShowTrackInfo => self.show_track_info = true,
            Action::HideTrackInfo => self.show_track_info = false,

            Action::ClearError => self.error_message = None,

            Action::None => {}
        }

        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        if let Some(request) = self.search.poll(Instant::now()) {
            self.run_search(request);
        }

        if let Some(session) = &mut self.mpris {
            while let Some(event) = session.try_recv() {
                let action = event.into_action(self.player.state());
                if action != Action::None {
                    self.action_tx.send(action)?;
                }
            }
            session.sync(&self.player);
        }

        Ok(())
    }

    fn show_error(&mut self, error: impl Display) {
        tracing::error!("{}", error);
        self.error_message = Some(error.to_string());
    }

    /// Run `future` on the runtime and dispatch the action it yields.
    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = Action> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let action = future.await;
            if tx.send(action).is_err() {
                tracing::debug!("Action channel closed");
            }
        });
    }

    // =========================================================================
    // Loading
    // =========================================================================

    fn load_home(&mut self) {
        self.home.set_loading();
        let client = self.client.clone();
        self.spawn(async move { Action::HomeLoaded(client.home().await) });
    }

    fn load_trending(&mut self) {
        self.trending.set_loading();
        let client = self.client.clone();
        self.spawn(async move { Action::TrendingLoaded(client.trending().await) });
    }

    /// Resolve every liked id concurrently.
    fn load_library(&mut self) {
        let ids = self.player.liked().ids().to_vec();
        if ids.is_empty() {
            self.library.set_tracks(Vec::new());
            return;
        }
        if self.library.content.loaded().is_none() {
            self.library.content = ContentState::Loading;
        }

        let client = self.client.clone();
        self.spawn(async move {
            let lookups = ids.iter().map(|id| client.song(id));
            Action::LikedResolved(futures::future::join_all(lookups).await)
        });
    }

    fn liked_resolved(&mut self, results: Vec<Result<Track, CatalogError>>) {
        let mut tracks = Vec::new();
        let mut failure = None;
        for result in results {
            match result {
                // Unliked while the lookup was in flight
                Ok(track) if !self.player.liked().contains(&track.id) => {}
                Ok(track) => tracks.push(track),
                Err(e) => {
                    tracing::warn!("Could not resolve liked song: {}", e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(e) if tracks.is_empty() => {
                self.library.content = ContentState::Failed(e.to_string());
            }
            _ => self.library.set_tracks(tracks),
        }
    }

    fn run_search(&mut self, request: SearchRequest) {
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.search(request.filter, &request.query).await;
            Action::SearchCompleted(request, result)
        });
    }

    fn open_album(&mut self, id: String, title: String) {
        self.detail = Some(TrackListPage::new(title, TrackSource::Album(id.clone())));
        self.focus = Focus::Content;
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.album(&id).await;
            Action::AlbumLoaded(id, result)
        });
    }

    fn open_playlist(&mut self, id: String, title: String) {
        self.detail = Some(TrackListPage::new(
            title,
            TrackSource::Playlist(id.clone()),
        ));
        self.focus = Focus::Content;
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.playlist(&id).await;
            Action::PlaylistLoaded(id, result)
        });
    }

    /// An artist page lists the songs a song search for their name finds.
    fn open_artist(&mut self, name: String) {
        let mut page = TrackListPage::new(name.clone(), TrackSource::Artist(name.clone()));
        page.subtitle = Some(String::from("Songs"));
        self.detail = Some(page);
        self.focus = Focus::Content;
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.search(SearchFilter::Songs, &name).await;
            Action::ArtistSongsLoaded(name, result)
        });
    }

    /// The open detail page, if it still shows `source`.
    fn detail_for(&mut self, source: &TrackSource) -> Option<&mut TrackListPage> {
        self.detail.as_mut().filter(|page| page.source == *source)
    }

    /// Reload whatever the content area shows.
    fn refresh(&mut self) {
        if let Some(page) = &self.detail {
            let title = page.title.clone();
            match page.source.clone() {
                TrackSource::Album(id) => self.open_album(id, title),
                TrackSource::Playlist(id) => self.open_playlist(id, title),
                TrackSource::Artist(name) => self.open_artist(name),
                TrackSource::Liked => self.load_library(),
            }
            return;
        }

        match self.view {
            View::Home => self.load_home(),
            View::Trending => self.load_trending(),
            View::Search => {
                if let Some(request) = self.search.retry() {
                    self.run_search(request);
                }
            }
            View::Library => self.load_library(),
        }
    }

    // =========================================================================
    // Playback
    // =========================================================================

    fn start_load(&mut self, request: Option<LoadRequest>) {
        let Some(request) = request else {
            return;
        };
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.song(&request.track_id).await;
            Action::TrackResolved(request, result)
        });
    }

    /// A new track started: fetch its artwork.
    fn track_changed(&mut self) {
        let artwork = self
            .player
            .current_track()
            .and_then(|t| t.best_artwork().map(String::from));
        let Some(url) = self.now_playing.track_changed(artwork.as_deref()) else {
            return;
        };

        let client = self.client.clone();
        self.spawn(async move {
            match client.artwork_bytes(&url).await {
                Ok(data) => Action::AlbumArtLoaded(url, data),
                Err(e) => {
                    tracing::debug!("Failed to load album art: {}", e);
                    Action::None
                }
            }
        });
    }

    fn media_event(&mut self, source: SourceId, event: MediaEvent) {
        match self.player.handle_media_event(source, event) {
            Ok(request) => self.start_load(request),
            Err(e) => self.show_error(e),
        }
    }

    fn seek(&mut self, target: SeekTarget) {
        match self.player.seek(target) {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Seek ignored, duration unknown"),
            Err(e) => self.show_error(e),
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if let Err(e) = self.player.set_volume(volume) {
            self.show_error(e);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn switch_view(&mut self, view: View) {
        self.view = view;
        self.detail = None;
        self.focus = Focus::Content;
        if view != View::Search {
            self.search.editing = false;
        }
        if view == View::Library {
            self.load_library();
        }
    }

    fn navigate(&mut self, down: bool) {
        if self.focus == Focus::Queue {
            let len = self.player.queue().len();
            if down {
                self.queue.select_next(len);
            } else {
                self.queue.select_previous(len);
            }
            return;
        }

        if let Some(page) = &mut self.detail {
            if down {
                page.select_next();
            } else {
                page.select_previous();
            }
            return;
        }

        match self.view {
            View::Home | View::Trending => {
                let page = if self.view == View::Home {
                    &mut self.home
                } else {
                    &mut self.trending
                };
                if down {
                    page.select_next();
                } else {
                    page.select_previous();
                }
            }
            View::Search => {
                if down {
                    self.search.select_next();
                } else {
                    self.search.select_previous();
                }
            }
            View::Library => {
                if down {
                    self.library.select_next();
                } else {
                    self.library.select_previous();
                }
            }
        }
    }

    /// Track list shown in the content area, if any.
    fn open_list(&self) -> Option<&TrackListPage> {
        match &self.detail {
            Some(page) => Some(page),
            None if self.view == View::Library => Some(&self.library),
            None => None,
        }
    }

    /// Browse page shown in the content area, if any.
    fn open_browse(&self) -> Option<&BrowsePage> {
        if self.detail.is_some() {
            return None;
        }
        match self.view {
            View::Home => Some(&self.home),
            View::Trending => Some(&self.trending),
            View::Search if !self.search.is_browsing() => Some(&self.search.results),
            _ => None,
        }
    }

    /// The track under the selection, in whichever panel has focus.
    fn selected_track(&self) -> Option<Track> {
        if self.focus == Focus::Queue {
            return self
                .queue
                .selected()
                .and_then(|i| self.player.queue().get(i))
                .cloned();
        }
        if let Some(page) = self.open_list() {
            return page.selected_track().cloned();
        }
        match self.open_browse()?.selected_item()? {
            CatalogItem::Song(track) => Some(track.clone()),
            _ => None,
        }
    }

    fn select(&mut self) {
        if self.search.editing && self.view == View::Search {
            self.search.editing = false;
            if let Some(request) = self.search.submit() {
                self.run_search(request);
            }
            return;
        }

        if self.focus == Focus::Queue {
            if let Some(index) = self.queue.selected() {
                let request = self.player.play_index(index);
                self.start_load(request);
            }
            return;
        }

        // Track lists play from the selection onwards
        let list = self
            .open_list()
            .and_then(|page| Some((page.tracks().to_vec(), page.selected_index()?)));
        if let Some((tracks, start)) = list {
            let request = self.player.play_queue(tracks, start);
            self.start_load(request);
            return;
        }

        if self.view == View::Search && self.search.is_browsing() && self.detail.is_none() {
            if let Some(category) = self.search.selected_category() {
                let request = self.search.search_category(category);
                self.run_search(request);
            }
            return;
        }

        let item = self
            .open_browse()
            .and_then(BrowsePage::selected_item)
            .cloned();
        if let Some(item) = &item {
            tracing::debug!(id = item.id(), "Selected catalog item");
        }
        match item {
            Some(CatalogItem::Song(track)) => {
                let request = self.player.load_and_play(track.id);
                self.start_load(Some(request));
            }
            Some(CatalogItem::Album(album)) => self.open_album(album.id, album.title),
            Some(CatalogItem::Playlist(playlist)) => {
                self.open_playlist(playlist.id, playlist.title)
            }
            Some(CatalogItem::Artist(artist)) => self.open_artist(artist.name),
            None => {}
        }
    }

    fn click(&mut self, x: u16, y: u16) {
        // Don't handle mouse clicks when overlays are active
        if self.show_help || self.show_track_info {
            return;
        }
        let position = Position::new(x, y);
        let bars = self.layout.now_playing;

        if let Some(view) = tab_at(self.layout.tabs, x, y) {
            self.switch_view(view);
        } else if bars.progress.contains(position) {
            if let Some(fraction) = progress_at(bars.progress, x) {
                self.seek(SeekTarget::Fraction(fraction));
            }
        } else if bars.volume.contains(position) {
            if let Some(volume) = volume_at(bars.volume, x) {
                self.set_volume(volume);
            }
        } else if self.layout.content.contains(position) {
            self.focus = Focus::Content;
            self.click_content(y);
        } else if let Some(queue_area) = self.layout.queue {
            if queue_area.contains(position) {
                self.focus = Focus::Queue;
                if let Some(row) = y.checked_sub(queue_area.y + 1) {
                    let len = self.player.queue().len();
                    self.queue.select_row(usize::from(row), len);
                }
            }
        }
    }

    fn click_content(&mut self, y: u16) {
        let area = self.layout.content;
        // Search draws its input box above the list
        let top = if self.detail.is_none() && self.view == View::Search {
            area.y + 3 + 1
        } else {
            area.y + 1
        };
        let Some(row) = y.checked_sub(top).map(usize::from) else {
            return;
        };

        if let Some(page) = &mut self.detail {
            page.select_row(row);
            return;
        }
        match self.view {
            View::Home => self.home.select_row(row),
            View::Trending => self.trending.select_row(row),
            View::Search => self.search.select_row(row),
            View::Library => self.library.select_row(row),
        }
    }
}
