//! MusicStream catalog API client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::*;
use crate::action::SearchFilter;

/// Catalog client errors.
///
/// Cloneable so a failure can travel inside an [`crate::action::Action`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// Transport failure or a non-2xx status
    #[error("Network error: {0}")]
    Network(String),

    /// Body that is not JSON, not a success envelope, or has no data
    #[error("Unexpected response: {0}")]
    Format(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// MusicStream API client.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    /// HTTP client
    client: Client,

    /// Base server URL, without trailing slash
    base_url: String,
}

impl CatalogClient {
    /// Create a new API client with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `base_url + path` and return the `data` payload of the envelope.
    pub async fn request(&self, path: &str) -> Result<serde_json::Value, CatalogError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("GET {} returned {}", path, status);
            return Err(CatalogError::Network(format!("{} returned {}", path, status)));
        }

        let text = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&text).map_err(|e| {
            CatalogError::Format(format!(
                "Failed to parse response: {}. Body: {}",
                e,
                truncate_body(&text)
            ))
        })?;

        if envelope.success != Some(true) {
            let reason = envelope
                .error
                .unwrap_or_else(|| String::from("request was not successful"));
            return Err(CatalogError::Format(reason));
        }

        match envelope.data {
            Some(serde_json::Value::Null) | None => Err(CatalogError::Format(String::from(
                "Missing response data",
            ))),
            Some(data) => Ok(data),
        }
    }

    /// GET `path` and deserialize its `data` payload.
    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let data = self.request(path).await?;
        serde_json::from_value(data)
            .map_err(|e| CatalogError::Format(format!("Failed to decode {}: {}", path, e)))
    }

    // =========================================================================
    // Browsing endpoints
    // =========================================================================

    /// Landing page feed.
    pub async fn home(&self) -> Result<HomeFeed, CatalogError> {
        let payload: HomePayload = self.fetch("/api/home").await?;
        Ok(payload.into())
    }

    /// Trending songs.
    pub async fn trending(&self) -> Result<Vec<Track>, CatalogError> {
        let page: ResultsPage<SongPayload> = self.fetch("/api/trending").await?;
        Ok(page.results.into_iter().map(Track::from).collect())
    }

    /// Album with its tracks.
    pub async fn album(&self, id: &str) -> Result<AlbumSummary, CatalogError> {
        let path = format!("/api/albums?id={}", urlencoding::encode(id));
        let payload: AlbumPayload = self.fetch(&path).await?;
        Ok(payload.into())
    }

    /// Playlist with its tracks.
    pub async fn playlist(&self, id: &str) -> Result<PlaylistSummary, CatalogError> {
        let path = format!("/api/playlists?id={}", urlencoding::encode(id));
        let payload: PlaylistPayload = self.fetch(&path).await?;
        Ok(payload.into())
    }

    // =========================================================================
    // Tracks
    // =========================================================================

    /// Resolve a track id to a full track, including its stream variants.
    pub async fn song(&self, id: &str) -> Result<Track, CatalogError> {
        let path = format!("/api/songs/{}", urlencoding::encode(id));
        let lookup: SongLookupPayload = self.fetch(&path).await?;
        lookup
            .into_first()
            .map(Track::from)
            .ok_or_else(|| CatalogError::Format(format!("No song with id {}", id)))
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Search the catalog. `All` fills every group, other filters fill one.
    pub async fn search(
        &self,
        filter: SearchFilter,
        query: &str,
    ) -> Result<SearchResults, CatalogError> {
        let path = format!(
            "/api/search/{}?query={}",
            filter.path_segment(),
            urlencoding::encode(query)
        );

        let results = match filter {
            SearchFilter::All => {
                let payload: SearchAllPayload = self.fetch(&path).await?;
                payload.into()
            }
            SearchFilter::Songs => {
                let page: ResultsPage<SongPayload> = self.fetch(&path).await?;
                SearchResults {
                    songs: page.results.into_iter().map(Track::from).collect(),
                    ..Default::default()
                }
            }
            SearchFilter::Albums => {
                let page: ResultsPage<AlbumPayload> = self.fetch(&path).await?;
                SearchResults {
                    albums: page.results.into_iter().map(AlbumSummary::from).collect(),
                    ..Default::default()
                }
            }
            SearchFilter::Artists => {
                let page: ResultsPage<ArtistPayload> = self.fetch(&path).await?;
                SearchResults {
                    artists: page.results.into_iter().map(ArtistSummary::from).collect(),
                    ..Default::default()
                }
            }
            SearchFilter::Playlists => {
                let page: ResultsPage<PlaylistPayload> = self.fetch(&path).await?;
                SearchResults {
                    playlists: page
                        .results
                        .into_iter()
                        .map(PlaylistSummary::from)
                        .collect(),
                    ..Default::default()
                }
            }
        };

        Ok(results)
    }

    // =========================================================================
    // Artwork
    // =========================================================================

    /// Download raw artwork bytes. Artwork URLs are absolute CDN links.
    pub async fn artwork_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Network(format!(
                "artwork returned {}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn truncate_body(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
