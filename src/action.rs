//! Application actions/events that drive state changes.

use crate::client::models::{AlbumSummary, HomeFeed, PlaylistSummary, SearchResults, Track};
use crate::client::CatalogError;
use crate::player::{LoadRequest, MediaEvent, SourceId};
use crate::ui::SearchRequest;

/// Actions that can be dispatched to update application state.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum Action {
    // Application lifecycle
    Quit,
    Tick,

    // Navigation
    NavigateUp,
    NavigateDown,
    NavigateLeft,
    NavigateRight,
    Select,
    Back,
    SwitchView(View),
    NextView,
    PrevView,

    // Mouse
    MouseClick(u16, u16),
    MouseScroll(i16), // positive = down, negative = up

    // Search
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    CycleSearchFilter,

    // Playback controls
    PlayPause,
    NextTrack,
    PreviousTrack,
    SeekForward,
    SeekBackward,
    SeekToStart,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    ToggleShuffle,
    CycleRepeat,
    ToggleLike,

    // Queue management
    AppendToQueue,
    ClearQueue,
    RemoveSelectedFromQueue,
    PlayOpenList,

    // Catalog loading
    Refresh,

    // Catalog responses (sent from spawned tasks)
    HomeLoaded(Result<HomeFeed, CatalogError>),
    TrendingLoaded(Result<Vec<Track>, CatalogError>),
    SearchCompleted(SearchRequest, Result<SearchResults, CatalogError>),
    AlbumLoaded(String, Result<AlbumSummary, CatalogError>),
    PlaylistLoaded(String, Result<PlaylistSummary, CatalogError>),
    ArtistSongsLoaded(String, Result<SearchResults, CatalogError>),
    LikedResolved(Vec<Result<Track, CatalogError>>),
    TrackResolved(LoadRequest, Result<Track, CatalogError>),
    AlbumArtLoaded(String, Vec<u8>),

    // Player events
    Media(SourceId, MediaEvent),

    // Overlays
    ShowHelp,
    HideHelp,
    ShowTrackInfo,
    HideTrackInfo,

    // Errors
    ClearError,

    // No-op
    None,
}

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Nothing loaded
    #[default]
    Idle,
    Paused,
    Playing,
}

/// Repeat mode for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Off => "  ",
            Self::All => "󰑖 ",
            Self::One => "󰑘 ",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

/// Search filters, one per search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFilter {
    #[default]
    All,
    Songs,
    Albums,
    Artists,
    Playlists,
}

impl SearchFilter {
    pub fn all() -> &'static [SearchFilter] {
        &[
            SearchFilter::All,
            SearchFilter::Songs,
            SearchFilter::Albums,
            SearchFilter::Artists,
            SearchFilter::Playlists,
        ]
    }

    /// Segment of `/api/search/{segment}`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Songs => "songs",
            Self::Albums => "albums",
            Self::Artists => "artists",
            Self::Playlists => "playlists",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Songs => "Songs",
            Self::Albums => "Albums",
            Self::Artists => "Artists",
            Self::Playlists => "Playlists",
        }
    }

    /// Get the next filter (wraps around).
    pub fn next(&self) -> SearchFilter {
        match self {
            Self::All => Self::Songs,
            Self::Songs => Self::Albums,
            Self::Albums => Self::Artists,
            Self::Artists => Self::Playlists,
            Self::Playlists => Self::All,
        }
    }
}

/// Top-level views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Trending,
    Search,
    Library,
}

impl View {
    pub fn all() -> &'static [View] {
        &[View::Home, View::Trending, View::Search, View::Library]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Trending => "Trending",
            Self::Search => "Search",
            Self::Library => "Library",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Home => 0,
            Self::Trending => 1,
            Self::Search => 2,
            Self::Library => 3,
        }
    }

    /// Get the next view (wraps around).
    pub fn next(&self) -> View {
        match self {
            Self::Home => Self::Trending,
            Self::Trending => Self::Search,
            Self::Search => Self::Library,
            Self::Library => Self::Home,
        }
    }

    /// Get the previous view (wraps around).
    pub fn prev(&self) -> View {
        match self {
            Self::Home => Self::Library,
            Self::Trending => Self::Home,
            Self::Search => Self::Trending,
            Self::Library => Self::Search,
        }
    }
}
