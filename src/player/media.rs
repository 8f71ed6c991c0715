//! The media element boundary between the playback controller and an audio output.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a media element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    #[error("audio output is not running")]
    Disconnected,

    #[error("{0}")]
    Backend(String),
}

/// Identifies one loaded source. Events carry the id of the source they
/// were produced for, so events from a replaced source can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// Events a media element reports back while playing.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position advanced
    TimeUpdate { position: Duration },
    /// Source decoded and its total duration is known
    MetadataLoaded { duration: Duration },
    /// Source played to the end
    Ended,
    /// Source could not be fetched or decoded
    Error(String),
}

/// Something that can play one audio source at a time.
///
/// Operations only enqueue work; results arrive later as [`MediaEvent`]s
/// tagged with the [`SourceId`] given to `load`.
pub trait MediaElement {
    /// Replace the current source. `duration_hint` is the catalog duration,
    /// used when the decoder cannot tell.
    fn load(
        &mut self,
        source: SourceId,
        url: &str,
        duration_hint: Option<Duration>,
    ) -> Result<(), MediaError>;

    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self) -> Result<(), MediaError>;

    fn seek(&mut self, position: Duration) -> Result<(), MediaError>;

    /// Output volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f32) -> Result<(), MediaError>;
}
