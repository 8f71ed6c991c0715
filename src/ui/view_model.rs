//! Pure mapping from catalog data and player state to what the widgets draw.

use std::time::Duration;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::action::{PlayerState, RepeatMode, SearchFilter};
use crate::client::models::{join_names, CatalogItem, HomeFeed, SearchResults, Track};
use crate::player::{MediaElement, PlaybackController};

/// Items per home section.
pub const HOME_SECTION_LIMIT: usize = 6;

/// Items per search section.
pub const SEARCH_SECTION_LIMIT: usize = 12;

/// Quick searches offered while the search input is empty.
pub const BROWSE_CATEGORIES: &[&str] = &[
    "Bollywood",
    "Punjabi",
    "Arijit Singh",
    "Rock",
    "Hip Hop",
    "Romance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Song,
    Album,
    Playlist,
    Artist,
}

impl CardKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Song => "♪",
            Self::Album => "◉",
            Self::Playlist => "≡",
            Self::Artist => "☺",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub kind: CardKind,
    pub title: String,
    pub subtitle: String,
}

/// A titled group of cards.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub items: Vec<CatalogItem>,
}

impl Section {
    fn new(title: &str, items: Vec<CatalogItem>) -> Self {
        Self {
            title: title.to_string(),
            items,
        }
    }
}

pub fn card(item: &CatalogItem) -> Card {
    match item {
        CatalogItem::Song(track) => Card {
            kind: CardKind::Song,
            title: track.title.clone(),
            subtitle: track.display_artists(),
        },
        CatalogItem::Album(album) => Card {
            kind: CardKind::Album,
            title: album.title.clone(),
            subtitle: album
                .description
                .clone()
                .or_else(|| join_names(&album.artists))
                .unwrap_or_else(|| String::from("Album")),
        },
        CatalogItem::Playlist(playlist) => Card {
            kind: CardKind::Playlist,
            title: playlist.title.clone(),
            subtitle: playlist
                .description
                .clone()
                .or_else(|| playlist.song_count.map(|n| format!("{} songs", n)))
                .unwrap_or_else(|| String::from("Playlist")),
        },
        CatalogItem::Artist(artist) => Card {
            kind: CardKind::Artist,
            title: artist.name.clone(),
            subtitle: artist
                .role
                .clone()
                .unwrap_or_else(|| String::from("Artist")),
        },
    }
}

fn push_section(sections: &mut Vec<Section>, title: &str, items: Vec<CatalogItem>) {
    if !items.is_empty() {
        sections.push(Section::new(title, items));
    }
}

/// Home page: trending songs, popular albums and featured playlists.
pub fn home_sections(feed: &HomeFeed) -> Vec<Section> {
    let mut sections = Vec::new();
    push_section(
        &mut sections,
        "Trending Now",
        feed.trending
            .iter()
            .take(HOME_SECTION_LIMIT)
            .cloned()
            .map(CatalogItem::Song)
            .collect(),
    );
    push_section(
        &mut sections,
        "Popular Albums",
        feed.albums
            .iter()
            .take(HOME_SECTION_LIMIT)
            .cloned()
            .map(CatalogItem::Album)
            .collect(),
    );
    push_section(
        &mut sections,
        "Featured Playlists",
        feed.playlists
            .iter()
            .take(HOME_SECTION_LIMIT)
            .cloned()
            .map(CatalogItem::Playlist)
            .collect(),
    );
    sections
}

pub fn trending_sections(tracks: &[Track]) -> Vec<Section> {
    let mut sections = Vec::new();
    push_section(
        &mut sections,
        "Trending Songs",
        tracks.iter().cloned().map(CatalogItem::Song).collect(),
    );
    sections
}

/// Group search results. `All` yields one section per non-empty group, any
/// other filter a single "Results" section.
pub fn search_sections(filter: SearchFilter, results: &SearchResults) -> Vec<Section> {
    let songs = || {
        results
            .songs
            .iter()
            .take(SEARCH_SECTION_LIMIT)
            .cloned()
            .map(CatalogItem::Song)
    };
    let albums = || {
        results
            .albums
            .iter()
            .take(SEARCH_SECTION_LIMIT)
            .cloned()
            .map(CatalogItem::Album)
    };
    let artists = || {
        results
            .artists
            .iter()
            .take(SEARCH_SECTION_LIMIT)
            .cloned()
            .map(CatalogItem::Artist)
    };
    let playlists = || {
        results
            .playlists
            .iter()
            .take(SEARCH_SECTION_LIMIT)
            .cloned()
            .map(CatalogItem::Playlist)
    };

    let mut sections = Vec::new();
    match filter {
        SearchFilter::All => {
            push_section(&mut sections, "Songs", songs().collect());
            push_section(&mut sections, "Albums", albums().collect());
            push_section(&mut sections, "Artists", artists().collect());
            push_section(&mut sections, "Playlists", playlists().collect());
        }
        SearchFilter::Songs => push_section(&mut sections, "Results", songs().collect()),
        SearchFilter::Albums => push_section(&mut sections, "Results", albums().collect()),
        SearchFilter::Artists => push_section(&mut sections, "Results", artists().collect()),
        SearchFilter::Playlists => push_section(&mut sections, "Results", playlists().collect()),
    }
    sections
}

/// One line of a track list.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub number: usize,
    pub title: String,
    pub artists: String,
    pub duration: String,
    pub is_current: bool,
}

pub fn track_rows(tracks: &[Track], current_id: Option<&str>) -> Vec<TrackRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, track)| TrackRow {
            number: i + 1,
            title: track.title.clone(),
            artists: track.display_artists(),
            duration: format_time(track.duration.map(|d| Duration::from_secs(u64::from(d)))),
            is_current: current_id == Some(track.id.as_str()),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeLevel {
    Muted,
    Low,
    High,
}

impl VolumeLevel {
    pub fn from_volume(volume: f32) -> Self {
        if volume <= 0.0 {
            Self::Muted
        } else if volume < 0.5 {
            Self::Low
        } else {
            Self::High
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Muted => "󰝟 ",
            Self::Low => "󰖀 ",
            Self::High => "󰕾 ",
        }
    }
}

/// Everything the now-playing bar shows.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingView {
    pub track_id: Option<String>,
    pub title: String,
    pub artists: String,
    pub album: Option<String>,
    pub elapsed: String,
    pub total: String,
    pub progress: f64,
    pub state: PlayerState,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f32,
    pub volume_level: VolumeLevel,
    pub liked: bool,
}

impl NowPlayingView {
    pub fn state_symbol(&self) -> &'static str {
        match self.state {
            PlayerState::Playing => " ",
            PlayerState::Paused => " ",
            PlayerState::Idle => " ",
        }
    }

    pub fn shuffle_symbol(&self) -> &'static str {
        if self.shuffle {
            "󰒟 "
        } else {
            "  "
        }
    }

    pub fn liked_symbol(&self) -> &'static str {
        if self.liked {
            "♥"
        } else {
            "♡"
        }
    }
}

pub fn now_playing<M: MediaElement>(controller: &PlaybackController<M>) -> NowPlayingView {
    let track = controller.current_track();
    let volume = controller.media_volume();

    NowPlayingView {
        track_id: track.map(|t| t.id.clone()),
        title: track
            .map(|t| t.title.clone())
            .unwrap_or_else(|| String::from("No song playing")),
        artists: track.map(Track::display_artists).unwrap_or_default(),
        album: track.and_then(|t| t.album.clone()),
        elapsed: format_time(Some(controller.elapsed())),
        total: format_time(controller.duration()),
        progress: controller.progress(),
        state: controller.state(),
        shuffle: controller.shuffle(),
        repeat: controller.repeat(),
        volume,
        volume_level: VolumeLevel::from_volume(volume),
        liked: controller.is_current_liked(),
    }
}

/// `m:ss`, or `0:00` when unknown.
pub fn format_time(time: Option<Duration>) -> String {
    let secs = time.map(|t| t.as_secs()).unwrap_or(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Cut `text` to at most `width` terminal columns, marking the cut with "…".
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::{AlbumSummary, ArtistSummary, PlaylistSummary};

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Song {}", id),
            artists: vec![String::from("Arijit Singh"), String::from("Pritam")],
            album: None,
            duration: Some(185),
            artwork: vec![String::from("small.jpg"), String::from("large.jpg")],
            streams: Vec::new(),
        }
    }

    fn album(id: &str) -> AlbumSummary {
        AlbumSummary {
            id: id.to_string(),
            title: format!("Album {}", id),
            description: None,
            artists: Vec::new(),
            year: None,
            song_count: None,
            artwork: Vec::new(),
            tracks: Vec::new(),
        }
    }

    fn playlist(id: &str) -> PlaylistSummary {
        PlaylistSummary {
            id: id.to_string(),
            title: format!("Playlist {}", id),
            description: None,
            song_count: None,
            artwork: Vec::new(),
            tracks: Vec::new(),
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(None), "0:00");
        assert_eq!(format_time(Some(Duration::from_secs(0))), "0:00");
        assert_eq!(format_time(Some(Duration::from_millis(65_900))), "1:05");
        assert_eq!(format_time(Some(Duration::from_secs(3600))), "60:00");
    }

    #[test]
    fn test_card_subtitles() {
        let song = card(&CatalogItem::Song(track("1")));
        assert_eq!(song.subtitle, "Arijit Singh, Pritam");

        let mut no_artist = track("2");
        no_artist.artists.clear();
        assert_eq!(card(&CatalogItem::Song(no_artist)).subtitle, "Unknown Artist");

        let mut a = album("a");
        assert_eq!(card(&CatalogItem::Album(a.clone())).subtitle, "Album");
        a.artists = vec![String::from("Pritam")];
        assert_eq!(card(&CatalogItem::Album(a.clone())).subtitle, "Pritam");
        a.description = Some(String::from("2022 soundtrack"));
        assert_eq!(card(&CatalogItem::Album(a)).subtitle, "2022 soundtrack");

        let mut p = playlist("p");
        assert_eq!(card(&CatalogItem::Playlist(p.clone())).subtitle, "Playlist");
        p.song_count = Some(50);
        assert_eq!(card(&CatalogItem::Playlist(p)).subtitle, "50 songs");

        let artist = ArtistSummary {
            id: String::from("ar"),
            name: String::from("Shreya Ghoshal"),
            role: None,
            artwork: Vec::new(),
        };
        assert_eq!(card(&CatalogItem::Artist(artist)).kind, CardKind::Artist);
    }

    #[test]
    fn test_home_sections_cap_and_skip_empty() {
        let feed = HomeFeed {
            trending: (0..10).map(|i| track(&i.to_string())).collect(),
            albums: Vec::new(),
            playlists: vec![playlist("p1")],
        };

        let sections = home_sections(&feed);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Trending Now", "Featured Playlists"]);
        assert_eq!(sections[0].items.len(), HOME_SECTION_LIMIT);
    }

    #[test]
    fn test_search_sections_for_all() {
        let results = SearchResults {
            songs: (0..20).map(|i| track(&i.to_string())).collect(),
            albums: vec![album("a")],
            artists: Vec::new(),
            playlists: vec![playlist("p")],
        };

        let sections = search_sections(SearchFilter::All, &results);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Songs", "Albums", "Playlists"]);
        assert_eq!(sections[0].items.len(), SEARCH_SECTION_LIMIT);
    }

    #[test]
    fn test_search_sections_for_single_filter() {
        let results = SearchResults {
            albums: (0..15).map(|i| album(&i.to_string())).collect(),
            ..Default::default()
        };

        let sections = search_sections(SearchFilter::Albums, &results);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Results");
        assert_eq!(sections[0].items.len(), SEARCH_SECTION_LIMIT);

        assert!(search_sections(SearchFilter::Songs, &results).is_empty());
        assert!(search_sections(SearchFilter::All, &SearchResults::default()).is_empty());
    }

    #[test]
    fn test_track_rows_mark_current() {
        let tracks = vec![track("a"), track("b")];
        let rows = track_rows(&tracks, Some("b"));
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].duration, "3:05");
        assert!(!rows[0].is_current);
        assert!(rows[1].is_current);
        assert!(track_rows(&tracks, None).iter().all(|r| !r.is_current));
    }

    #[test]
    fn test_volume_level() {
        assert_eq!(VolumeLevel::from_volume(0.0), VolumeLevel::Muted);
        assert_eq!(VolumeLevel::from_volume(0.42), VolumeLevel::Low);
        assert_eq!(VolumeLevel::from_volume(0.5), VolumeLevel::High);
    }

    #[test]
    fn test_truncate_respects_display_width() {
        assert_eq!(truncate("Kesariya", 20), "Kesariya");
        assert_eq!(truncate("Kesariya", 5), "Kesa…");
        assert_eq!(truncate("तुम ही हो", 0), "");
        // Wide characters take two columns each
        assert_eq!(truncate("音楽音楽", 5), "音楽…");
    }
}
