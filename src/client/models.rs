//! MusicStream API payloads and the catalog entities normalized from them.

use serde::{Deserialize, Serialize};

/// Root envelope wrapping every API response.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Raw payloads
// ============================================================================

/// An image or stream link. Newer responses use `url`, older ones `link`.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkPayload {
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl LinkPayload {
    fn href(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or(self.link.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Either an ordered list of links or a single plain URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LinksPayload {
    List(Vec<LinkPayload>),
    Single(String),
}

impl LinksPayload {
    /// Flatten into `(quality, url)` pairs, keeping the API order.
    fn into_pairs(self) -> Vec<(Option<String>, String)> {
        match self {
            Self::List(links) => links
                .into_iter()
                .filter_map(|l| {
                    let href = l.href()?.to_string();
                    Some((l.quality, href))
                })
                .collect(),
            Self::Single(url) if !url.is_empty() => vec![(None, url)],
            Self::Single(_) => Vec::new(),
        }
    }
}

/// Numbers arrive as JSON numbers or numeric strings depending on the endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) if *n >= 0.0 => Some(*n as u32),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| *n >= 0.0).map(|n| n as u32),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedPayload {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistsPayload {
    #[serde(default)]
    pub primary: Vec<NamedPayload>,
}

/// `primaryArtists` is a comma separated string in most responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NamesPayload {
    Text(String),
    List(Vec<NamedPayload>),
}

/// Album reference on a song: an object in detail responses, a bare name in search.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AlbumRefPayload {
    Object {
        #[serde(default)]
        name: Option<String>,
    },
    Name(String),
}

/// Song as returned by `/api/songs/{id}`, search and album/playlist detail.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPayload {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub album: Option<AlbumRefPayload>,
    #[serde(default)]
    pub artists: Option<ArtistsPayload>,
    #[serde(default)]
    pub primary_artists: Option<NamesPayload>,
    #[serde(default)]
    pub duration: Option<NumberOrText>,
    #[serde(default)]
    pub image: Option<LinksPayload>,
    #[serde(default)]
    pub download_url: Option<LinksPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumPayload {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year: Option<NumberOrText>,
    #[serde(default)]
    pub song_count: Option<NumberOrText>,
    #[serde(default)]
    pub artists: Option<ArtistsPayload>,
    #[serde(default)]
    pub primary_artists: Option<NamesPayload>,
    #[serde(default)]
    pub image: Option<LinksPayload>,
    #[serde(default)]
    pub songs: Vec<SongPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPayload {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub song_count: Option<NumberOrText>,
    #[serde(default)]
    pub image: Option<LinksPayload>,
    #[serde(default)]
    pub songs: Vec<SongPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPayload {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<LinksPayload>,
}

/// A page of search results (`/api/search/{filter}` and each group of `/api/search/all`).
#[derive(Debug, Clone, Deserialize)]
pub struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Default for ResultsPage<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

/// Payload of `/api/search/all`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchAllPayload {
    pub songs: ResultsPage<SongPayload>,
    pub albums: ResultsPage<AlbumPayload>,
    pub artists: ResultsPage<ArtistPayload>,
    pub playlists: ResultsPage<PlaylistPayload>,
}

/// Payload of `/api/home`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HomePayload {
    pub trending_songs: Vec<SongPayload>,
    pub popular_albums: Vec<AlbumPayload>,
    pub featured_playlists: Vec<PlaylistPayload>,
}

/// `/api/songs/{id}` answers with a one-element array; tolerate a bare object too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SongLookupPayload {
    Many(Vec<SongPayload>),
    One(SongPayload),
}

impl SongLookupPayload {
    pub fn into_first(self) -> Option<SongPayload> {
        match self {
            Self::Many(songs) => songs.into_iter().next(),
            Self::One(song) => Some(song),
        }
    }
}

// ============================================================================
// Catalog entities
// ============================================================================

/// A playable stream of a track at one quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamVariant {
    pub quality: String,
    pub url: String,
}

/// A track. `id` is the only key used for playback and queueing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    /// Duration in seconds
    pub duration: Option<u32>,
    /// Artwork URLs, lowest resolution first
    pub artwork: Vec<String>,
    /// Stream variants, lowest quality first
    pub streams: Vec<StreamVariant>,
}

impl Track {
    /// Artist names joined for display, falling back to "Unknown Artist".
    pub fn display_artists(&self) -> String {
        join_names(&self.artists).unwrap_or_else(|| String::from("Unknown Artist"))
    }

    /// Display-friendly duration (e.g. "3:45").
    pub fn duration_string(&self) -> String {
        match self.duration {
            Some(secs) => format!("{}:{:02}", secs / 60, secs % 60),
            None => String::from("--:--"),
        }
    }

    /// Highest resolution artwork.
    pub fn best_artwork(&self) -> Option<&str> {
        self.artwork.last().map(String::as_str)
    }

    /// Pick the stream to play: the preferred quality if offered, else the best one.
    pub fn stream_url(&self, preferred_quality: Option<&str>) -> Option<&str> {
        preferred_quality
            .and_then(|q| self.streams.iter().find(|s| s.quality == q))
            .or_else(|| self.streams.last())
            .map(|s| s.url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub artists: Vec<String>,
    pub year: Option<u32>,
    pub song_count: Option<u32>,
    pub artwork: Vec<String>,
    /// Only filled by detail responses
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub song_count: Option<u32>,
    pub artwork: Vec<String>,
    /// Only filled by detail responses
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub artwork: Vec<String>,
}

/// Landing page content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HomeFeed {
    pub trending: Vec<Track>,
    pub albums: Vec<AlbumSummary>,
    pub playlists: Vec<PlaylistSummary>,
}

/// Search results; single-filter searches only fill one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub songs: Vec<Track>,
    pub albums: Vec<AlbumSummary>,
    pub artists: Vec<ArtistSummary>,
    pub playlists: Vec<PlaylistSummary>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
            && self.albums.is_empty()
            && self.artists.is_empty()
            && self.playlists.is_empty()
    }
}

/// Anything that can be shown as a card.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    Song(Track),
    Album(AlbumSummary),
    Playlist(PlaylistSummary),
    Artist(ArtistSummary),
}

impl CatalogItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Song(t) => &t.id,
            Self::Album(a) => &a.id,
            Self::Playlist(p) => &p.id,
            Self::Artist(a) => &a.id,
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

impl From<SongPayload> for Track {
    fn from(p: SongPayload) -> Self {
        let artists = artist_names(p.artists, p.primary_artists);
        let album = p.album.and_then(|a| match a {
            AlbumRefPayload::Object { name } => name,
            AlbumRefPayload::Name(name) => Some(name),
        });

        let streams = p
            .download_url
            .map(LinksPayload::into_pairs)
            .unwrap_or_default()
            .into_iter()
            .map(|(quality, url)| StreamVariant {
                quality: quality.unwrap_or_default(),
                url,
            })
            .collect();

        Self {
            id: p.id,
            title: pick_title(p.name, p.title),
            artists,
            album: album.filter(|a| !a.is_empty()).map(|a| decode_entities(&a)),
            duration: p.duration.as_ref().and_then(NumberOrText::as_u32),
            artwork: artwork_urls(p.image),
            streams,
        }
    }
}

impl From<AlbumPayload> for AlbumSummary {
    fn from(p: AlbumPayload) -> Self {
        let tracks: Vec<Track> = p.songs.into_iter().map(Track::from).collect();
        let song_count = p
            .song_count
            .as_ref()
            .and_then(NumberOrText::as_u32)
            .or_else(|| (!tracks.is_empty()).then_some(tracks.len() as u32));

        Self {
            id: p.id,
            title: pick_title(p.name, p.title),
            description: non_empty(p.description),
            artists: artist_names(p.artists, p.primary_artists),
            year: p.year.as_ref().and_then(NumberOrText::as_u32),
            song_count,
            artwork: artwork_urls(p.image),
            tracks,
        }
    }
}

impl From<PlaylistPayload> for PlaylistSummary {
    fn from(p: PlaylistPayload) -> Self {
        let tracks: Vec<Track> = p.songs.into_iter().map(Track::from).collect();
        let song_count = p
            .song_count
            .as_ref()
            .and_then(NumberOrText::as_u32)
            .or_else(|| (!tracks.is_empty()).then_some(tracks.len() as u32));

        Self {
            id: p.id,
            title: pick_title(p.name, p.title),
            description: non_empty(p.description).or_else(|| non_empty(p.subtitle)),
            song_count,
            artwork: artwork_urls(p.image),
            tracks,
        }
    }
}

impl From<ArtistPayload> for ArtistSummary {
    fn from(p: ArtistPayload) -> Self {
        Self {
            id: p.id,
            name: pick_title(p.name, p.title),
            role: non_empty(p.role).or_else(|| non_empty(p.description)),
            artwork: artwork_urls(p.image),
        }
    }
}

impl From<HomePayload> for HomeFeed {
    fn from(p: HomePayload) -> Self {
        Self {
            trending: p.trending_songs.into_iter().map(Track::from).collect(),
            albums: p.popular_albums.into_iter().map(AlbumSummary::from).collect(),
            playlists: p
                .featured_playlists
                .into_iter()
                .map(PlaylistSummary::from)
                .collect(),
        }
    }
}

impl From<SearchAllPayload> for SearchResults {
    fn from(p: SearchAllPayload) -> Self {
        Self {
            songs: p.songs.results.into_iter().map(Track::from).collect(),
            albums: p.albums.results.into_iter().map(AlbumSummary::from).collect(),
            artists: p.artists.results.into_iter().map(ArtistSummary::from).collect(),
            playlists: p
                .playlists
                .results
                .into_iter()
                .map(PlaylistSummary::from)
                .collect(),
        }
    }
}

/// Join names with ", ", or `None` if there are none.
pub fn join_names(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

fn pick_title(name: Option<String>, title: Option<String>) -> String {
    non_empty(name)
        .or_else(|| non_empty(title))
        .map(|t| decode_entities(&t))
        .unwrap_or_else(|| String::from("Unknown"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn artwork_urls(image: Option<LinksPayload>) -> Vec<String> {
    image
        .map(LinksPayload::into_pairs)
        .unwrap_or_default()
        .into_iter()
        .map(|(_, url)| url)
        .collect()
}

fn artist_names(artists: Option<ArtistsPayload>, primary: Option<NamesPayload>) -> Vec<String> {
    let structured: Vec<String> = artists
        .map(|a| a.primary.into_iter().filter_map(|n| n.name).collect())
        .unwrap_or_default();
    if !structured.is_empty() {
        return structured.iter().map(|n| decode_entities(n)).collect();
    }

    match primary {
        Some(NamesPayload::Text(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(decode_entities)
            .collect(),
        Some(NamesPayload::List(list)) => list
            .into_iter()
            .filter_map(|n| n.name)
            .map(|n| decode_entities(&n))
            .collect(),
        None => Vec::new(),
    }
}

/// The catalog HTML-escapes names ("Tum Hi Ho &quot;Live&quot;").
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_song_with_structured_artists() {
        let payload: SongPayload = serde_json::from_value(json!({
            "id": "abc123",
            "name": "Kesariya",
            "duration": 268,
            "album": { "id": "a1", "name": "Brahmastra" },
            "artists": { "primary": [{ "name": "Pritam" }, { "name": "Arijit Singh" }] },
            "image": [
                { "quality": "50x50", "url": "https://img/50.jpg" },
                { "quality": "150x150", "url": "https://img/150.jpg" },
                { "quality": "500x500", "url": "https://img/500.jpg" }
            ],
            "downloadUrl": [
                { "quality": "96kbps", "url": "https://aac/96.mp4" },
                { "quality": "160kbps", "url": "https://aac/160.mp4" },
                { "quality": "320kbps", "url": "https://aac/320.mp4" }
            ]
        }))
        .unwrap();

        let track = Track::from(payload);
        assert_eq!(track.title, "Kesariya");
        assert_eq!(track.display_artists(), "Pritam, Arijit Singh");
        assert_eq!(track.album.as_deref(), Some("Brahmastra"));
        assert_eq!(track.duration, Some(268));
        assert_eq!(track.duration_string(), "4:28");
        assert_eq!(track.best_artwork(), Some("https://img/500.jpg"));
        assert_eq!(track.stream_url(None), Some("https://aac/320.mp4"));
        assert_eq!(track.stream_url(Some("160kbps")), Some("https://aac/160.mp4"));
        assert_eq!(track.stream_url(Some("12kbps")), Some("https://aac/320.mp4"));
    }

    #[test]
    fn test_song_with_legacy_fields() {
        let payload: SongPayload = serde_json::from_value(json!({
            "id": "x9",
            "title": "Tum Hi Ho &quot;Live&quot;",
            "album": "Aashiqui 2",
            "primaryArtists": "Mithoon, Arijit Singh",
            "duration": "262",
            "image": [{ "quality": "500x500", "link": "https://img/500.jpg" }],
            "downloadUrl": "https://aac/plain.mp4"
        }))
        .unwrap();

        let track = Track::from(payload);
        assert_eq!(track.title, "Tum Hi Ho \"Live\"");
        assert_eq!(track.artists, vec!["Mithoon", "Arijit Singh"]);
        assert_eq!(track.album.as_deref(), Some("Aashiqui 2"));
        assert_eq!(track.duration, Some(262));
        assert_eq!(track.artwork, vec!["https://img/500.jpg"]);
        assert_eq!(track.stream_url(None), Some("https://aac/plain.mp4"));
    }

    #[test]
    fn test_song_without_streams_is_not_playable() {
        let payload: SongPayload = serde_json::from_value(json!({ "id": "s1", "name": "Demo" }))
            .unwrap();
        let track = Track::from(payload);
        assert!(track.stream_url(None).is_none());
        assert_eq!(track.display_artists(), "Unknown Artist");
        assert_eq!(track.duration_string(), "--:--");
    }

    #[test]
    fn test_song_lookup_accepts_array_or_object() {
        let many: SongLookupPayload =
            serde_json::from_value(json!([{ "id": "a", "name": "A" }, { "id": "b" }])).unwrap();
        assert_eq!(many.into_first().map(|s| s.id), Some(String::from("a")));

        let one: SongLookupPayload = serde_json::from_value(json!({ "id": "c" })).unwrap();
        assert_eq!(one.into_first().map(|s| s.id), Some(String::from("c")));
    }

    #[test]
    fn test_album_song_count_falls_back_to_tracks() {
        let payload: AlbumPayload = serde_json::from_value(json!({
            "id": "al1",
            "name": "Rockstar",
            "year": "2011",
            "primaryArtists": "A.R. Rahman",
            "songs": [{ "id": "1", "name": "Sadda Haq" }, { "id": "2", "name": "Kun Faya Kun" }]
        }))
        .unwrap();

        let album = AlbumSummary::from(payload);
        assert_eq!(album.song_count, Some(2));
        assert_eq!(album.year, Some(2011));
        assert_eq!(album.artists, vec!["A.R. Rahman"]);
        assert_eq!(album.tracks.len(), 2);
    }

    #[test]
    fn test_search_all_tolerates_missing_groups() {
        let payload: SearchAllPayload = serde_json::from_value(json!({
            "songs": { "results": [{ "id": "1", "title": "Song" }] },
            "artists": { "results": [{ "id": "ar1", "title": "Arijit Singh", "role": "Singer" }] }
        }))
        .unwrap();

        let results = SearchResults::from(payload);
        assert_eq!(results.songs.len(), 1);
        assert!(results.albums.is_empty());
        assert_eq!(results.artists[0].name, "Arijit Singh");
        assert_eq!(results.artists[0].role.as_deref(), Some("Singer"));
        assert!(results.playlists.is_empty());
    }

    #[test]
    fn test_home_payload() {
        let payload: HomePayload = serde_json::from_value(json!({
            "trending_songs": [{ "id": "1", "name": "One" }],
            "popular_albums": [],
            "featured_playlists": [{ "id": "p1", "name": "Hindi Hits", "subtitle": "50 songs" }]
        }))
        .unwrap();

        let feed = HomeFeed::from(payload);
        assert_eq!(feed.trending.len(), 1);
        assert!(feed.albums.is_empty());
        assert_eq!(feed.playlists[0].description.as_deref(), Some("50 songs"));
    }
}
