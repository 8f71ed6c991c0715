//! Playback state machine: queue navigation, transport, volume and likes.
//!
//! Track resolution is asynchronous. Operations that need a track fetched
//! return a [`LoadRequest`]; the caller resolves `track_id` through the
//! catalog and hands the result to [`PlaybackController::finish_load`].
//! Only the most recent request is honoured, older ones come back as
//! [`LoadOutcome::Stale`].
//!
//! Media events are tagged with the [`SourceId`] they belong to. Events for
//! anything but the current source are dropped, and so is `Ended` while a
//! request is still resolving.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::media::{MediaElement, MediaError, MediaEvent, SourceId};
use super::queue::Queue;
use crate::action::{PlayerState, RepeatMode};
use crate::client::models::Track;
use crate::client::CatalogError;
use crate::liked::{LikedSongs, StoreError};

/// Playback errors. None of them are fatal; prior state is kept.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Could not play track {id}: {reason}")]
    Resolution { id: String, reason: String },

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("Nothing is playing")]
    NoTrack,

    #[error("Could not save liked songs: {0}")]
    Storage(#[from] StoreError),
}

impl From<MediaError> for PlayerError {
    fn from(err: MediaError) -> Self {
        Self::Playback(err.to_string())
    }
}

/// A pending track resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the track must be resolved and passed to finish_load"]
pub struct LoadRequest {
    generation: u64,
    /// Queue cursor to restore if resolution fails
    revert_index: Option<usize>,
    pub track_id: String,
}

/// Result of handing a resolved track to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Started,
    /// A newer request superseded this one; nothing changed
    Stale,
}

/// Seek targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// Fraction of the duration, `[0, 1]`
    Fraction(f64),
    Absolute(Duration),
    Forward(Duration),
    Backward(Duration),
}

/// Owns the media element, the queue and everything the player bar shows.
pub struct PlaybackController<M: MediaElement> {
    media: M,
    queue: Queue,
    current: Option<Track>,
    state: PlayerState,
    shuffle: bool,
    repeat: RepeatMode,
    /// User volume, `[0, 1]`
    volume: f32,
    /// Volume currently applied to the media element
    media_volume: f32,
    /// Volume to restore on unmute
    muted_volume: Option<f32>,
    elapsed: Duration,
    duration: Option<Duration>,
    generation: u64,
    /// The latest request has not been resolved yet
    pending: bool,
    /// Source loaded on the media element, `None` once it failed
    source: Option<SourceId>,
    liked: LikedSongs,
    stream_quality: Option<String>,
    rng: StdRng,
}

impl<M: MediaElement> PlaybackController<M> {
    pub fn new(media: M, liked: LikedSongs, volume: f32, stream_quality: Option<String>) -> Self {
        Self::with_rng(media, liked, volume, stream_quality, StdRng::from_entropy())
    }

    fn with_rng(
        mut media: M,
        liked: LikedSongs,
        volume: f32,
        stream_quality: Option<String>,
        rng: StdRng,
    ) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        if let Err(e) = media.set_volume(volume) {
            warn!("Failed to set initial volume: {}", e);
        }

        Self {
            media,
            queue: Queue::default(),
            current: None,
            state: PlayerState::Idle,
            shuffle: false,
            repeat: RepeatMode::Off,
            volume,
            media_volume: volume,
            muted_volume: None,
            elapsed: Duration::ZERO,
            duration: None,
            generation: 0,
            pending: false,
            source: None,
            liked,
            stream_quality,
            rng,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn media_volume(&self) -> f32 {
        self.media_volume
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Playback progress in `[0, 1]`, 0 while the duration is unknown.
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(d) if !d.is_zero() => (self.elapsed.as_secs_f64() / d.as_secs_f64()).min(1.0),
            _ => 0.0,
        }
    }

    pub fn liked(&self) -> &LikedSongs {
        &self.liked
    }

    pub fn is_current_liked(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| self.liked.contains(&t.id))
    }

    #[cfg(test)]
    pub(crate) fn media(&self) -> &M {
        &self.media
    }

    // =========================================================================
    // Loading
    // =========================================================================

    fn request(&mut self, track_id: String, revert_index: Option<usize>) -> LoadRequest {
        self.generation += 1;
        self.pending = true;
        debug!("Load request #{} for {}", self.generation, track_id);
        LoadRequest {
            generation: self.generation,
            revert_index,
            track_id,
        }
    }

    /// Play a single track by id, leaving the queue alone.
    pub fn load_and_play(&mut self, track_id: impl Into<String>) -> LoadRequest {
        self.request(track_id.into(), None)
    }

    /// Replace the queue and start playing at `start`.
    pub fn play_queue(&mut self, tracks: Vec<Track>, start: usize) -> Option<LoadRequest> {
        if tracks.is_empty() {
            return None;
        }
        self.queue.replace(tracks, start);
        let id = self.queue.current()?.id.clone();
        Some(self.request(id, None))
    }

    /// Play the queue entry at `index`.
    pub fn play_index(&mut self, index: usize) -> Option<LoadRequest> {
        self.move_cursor(index)
    }

    fn move_cursor(&mut self, index: usize) -> Option<LoadRequest> {
        let previous = self.queue.current_index();
        if !self.queue.set_current(index) {
            return None;
        }
        let id = self.queue.current()?.id.clone();
        Some(self.request(id, Some(previous)))
    }

    /// Complete a load request with the catalog's answer.
    pub fn finish_load(
        &mut self,
        request: LoadRequest,
        result: Result<Track, CatalogError>,
    ) -> Result<LoadOutcome, PlayerError> {
        if request.generation != self.generation {
            debug!(
                "Dropping stale resolution #{} for {}",
                request.generation, request.track_id
            );
            return Ok(LoadOutcome::Stale);
        }
        self.pending = false;

        let track = match result {
            Ok(track) => track,
            Err(e) => {
                self.revert_cursor(&request);
                return Err(PlayerError::Resolution {
                    id: request.track_id,
                    reason: e.to_string(),
                });
            }
        };

        let Some(url) = track.stream_url(self.stream_quality.as_deref()) else {
            self.revert_cursor(&request);
            return Err(PlayerError::Resolution {
                id: request.track_id,
                reason: String::from("no playable stream"),
            });
        };

        let hint = track.duration.map(|d| Duration::from_secs(u64::from(d)));
        let source = SourceId(request.generation);
        if let Err(e) = self
            .media
            .load(source, url, hint)
            .and_then(|_| self.media.play())
        {
            self.revert_cursor(&request);
            return Err(e.into());
        }

        info!("Playing {} - {}", track.display_artists(), track.title);
        self.source = Some(source);
        self.current = Some(track);
        self.state = PlayerState::Playing;
        self.elapsed = Duration::ZERO;
        self.duration = None;
        Ok(LoadOutcome::Started)
    }

    fn revert_cursor(&mut self, request: &LoadRequest) {
        if let Some(index) = request.revert_index {
            self.queue.set_current(index);
        }
    }

    // =========================================================================
    // Queue management
    // =========================================================================

    pub fn enqueue(&mut self, track: Track) {
        self.queue.push(track);
    }

    pub fn remove_from_queue(&mut self, index: usize) -> bool {
        self.queue.remove(index).is_some()
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Pause or resume. Resuming a track whose source failed loads it again
    /// instead.
    pub fn toggle_play_pause(&mut self) -> Result<Option<LoadRequest>, PlayerError> {
        match self.state {
            PlayerState::Idle => {}
            PlayerState::Paused if self.source.is_none() => {
                if let Some(id) = self.current.as_ref().map(|t| t.id.clone()) {
                    info!("Reloading {} after a playback error", id);
                    return Ok(Some(self.request(id, None)));
                }
            }
            PlayerState::Paused => {
                self.media.play()?;
                self.state = PlayerState::Playing;
            }
            PlayerState::Playing => {
                self.media.pause()?;
                self.state = PlayerState::Paused;
            }
        }
        Ok(None)
    }

    /// Move to the next queue entry (random when shuffling).
    pub fn next(&mut self) -> Option<LoadRequest> {
        let index = self.queue.next_index(self.shuffle, &mut self.rng)?;
        self.move_cursor(index)
    }

    pub fn previous(&mut self) -> Option<LoadRequest> {
        let index = self.queue.previous_index()?;
        self.move_cursor(index)
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.repeat
    }

    /// Seek within the current track. Returns `false` while the duration is
    /// unknown.
    pub fn seek(&mut self, target: SeekTarget) -> Result<bool, PlayerError> {
        let Some(duration) = self.duration else {
            return Ok(false);
        };

        let position = match target {
            SeekTarget::Fraction(f) => duration.mul_f64(f.clamp(0.0, 1.0)),
            SeekTarget::Absolute(t) => t,
            SeekTarget::Forward(d) => self.elapsed.saturating_add(d),
            SeekTarget::Backward(d) => self.elapsed.saturating_sub(d),
        }
        .min(duration);

        self.media.seek(position)?;
        self.elapsed = position;
        Ok(true)
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError> {
        let volume = volume.clamp(0.0, 1.0);
        self.media.set_volume(volume)?;
        self.volume = volume;
        self.media_volume = volume;
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> Result<(), PlayerError> {
        if self.media_volume > 0.0 {
            self.media.set_volume(0.0)?;
            self.muted_volume = Some(self.media_volume);
            self.media_volume = 0.0;
        } else {
            let restored = self.muted_volume.unwrap_or(self.volume);
            self.media.set_volume(restored)?;
            self.muted_volume = None;
            self.media_volume = restored;
        }
        Ok(())
    }

    // =========================================================================
    // Media events
    // =========================================================================

    pub fn handle_media_event(
        &mut self,
        source: SourceId,
        event: MediaEvent,
    ) -> Result<Option<LoadRequest>, PlayerError> {
        if self.source != Some(source) {
            debug!("Ignoring {:?} from replaced source {:?}", event, source);
            return Ok(None);
        }

        match event {
            MediaEvent::TimeUpdate { position } => {
                if self.current.is_some() {
                    self.elapsed = position;
                }
                Ok(None)
            }
            MediaEvent::MetadataLoaded { duration } => {
                self.duration = Some(duration);
                Ok(None)
            }
            MediaEvent::Ended if self.pending => {
                debug!("Track ended while another one is loading");
                if self.state == PlayerState::Playing {
                    self.state = PlayerState::Paused;
                }
                Ok(None)
            }
            MediaEvent::Ended => self.on_ended(),
            MediaEvent::Error(message) => {
                warn!("Media error: {}", message);
                self.source = None;
                self.duration = None;
                if self.state == PlayerState::Playing {
                    self.state = PlayerState::Paused;
                }
                Err(PlayerError::Playback(message))
            }
        }
    }

    fn on_ended(&mut self) -> Result<Option<LoadRequest>, PlayerError> {
        if self.repeat == RepeatMode::One {
            self.media.seek(Duration::ZERO)?;
            self.media.play()?;
            self.elapsed = Duration::ZERO;
            self.state = PlayerState::Playing;
            return Ok(None);
        }

        let previous = self.queue.current_index();
        let Some(index) = self.queue.next_index(self.shuffle, &mut self.rng) else {
            self.state = PlayerState::Idle;
            return Ok(None);
        };

        self.queue.set_current(index);
        self.state = PlayerState::Paused;

        if self.repeat == RepeatMode::All || index != 0 {
            let id = match self.queue.current() {
                Some(track) => track.id.clone(),
                None => return Ok(None),
            };
            Ok(Some(self.request(id, Some(previous))))
        } else {
            debug!("Reached the end of the queue");
            Ok(None)
        }
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Flip the liked state of the current track. Returns the new state.
    pub fn toggle_like(&mut self) -> Result<bool, PlayerError> {
        let id = self.current.as_ref().ok_or(PlayerError::NoTrack)?.id.clone();
        Ok(self.liked.toggle(&id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::StreamVariant;
    use crate::liked::MemoryStore;
    use crate::player::media::fake::{FakeMedia, MediaCall};

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Song {}", id),
            artists: vec![String::from("Artist")],
            album: None,
            duration: Some(200),
            artwork: Vec::new(),
            streams: vec![
                StreamVariant {
                    quality: String::from("96kbps"),
                    url: format!("https://cdn/{}/96.mp4", id),
                },
                StreamVariant {
                    quality: String::from("320kbps"),
                    url: format!("https://cdn/{}/320.mp4", id),
                },
            ],
        }
    }

    fn controller() -> PlaybackController<FakeMedia> {
        PlaybackController::with_rng(
            FakeMedia::default(),
            LikedSongs::load(Box::new(MemoryStore::default())),
            0.7,
            None,
            StdRng::seed_from_u64(42),
        )
    }

    /// Controller playing `index` of a queue of `len` tracks ("0", "1", ...).
    fn playing_queue(len: usize, index: usize) -> PlaybackController<FakeMedia> {
        let mut c = controller();
        let tracks: Vec<Track> = (0..len).map(|i| track(&i.to_string())).collect();
        let req = c.play_queue(tracks, index).unwrap();
        let resolved = track(&req.track_id);
        assert_eq!(c.finish_load(req, Ok(resolved)).unwrap(), LoadOutcome::Started);
        c
    }

    fn resolve(c: &mut PlaybackController<FakeMedia>, req: LoadRequest) -> LoadOutcome {
        let resolved = track(&req.track_id);
        c.finish_load(req, Ok(resolved)).unwrap()
    }

    /// Deliver an event from the source the media element last loaded.
    fn send(
        c: &mut PlaybackController<FakeMedia>,
        event: MediaEvent,
    ) -> Result<Option<LoadRequest>, PlayerError> {
        let source = c.media().source_id.unwrap();
        c.handle_media_event(source, event)
    }

    #[test]
    fn test_initial_state() {
        let c = controller();
        assert_eq!(c.state(), PlayerState::Idle);
        assert_eq!(c.repeat(), RepeatMode::Off);
        assert!(!c.shuffle());
        assert_eq!(c.volume(), 0.7);
        assert_eq!(c.media().volume, Some(0.7));
    }

    #[test]
    fn test_load_and_play_uses_best_stream() {
        let mut c = controller();
        let req = c.load_and_play("abc");
        assert_eq!(resolve(&mut c, req), LoadOutcome::Started);

        assert_eq!(c.state(), PlayerState::Playing);
        assert_eq!(c.current_track().map(|t| t.id.as_str()), Some("abc"));
        assert_eq!(c.media().loads(), vec!["https://cdn/abc/320.mp4"]);
        assert!(c.queue().is_empty());
    }

    #[test]
    fn test_preferred_stream_quality() {
        let mut c = PlaybackController::with_rng(
            FakeMedia::default(),
            LikedSongs::load(Box::new(MemoryStore::default())),
            0.7,
            Some(String::from("96kbps")),
            StdRng::seed_from_u64(1),
        );
        let req = c.load_and_play("abc");
        resolve(&mut c, req);
        assert_eq!(c.media().loads(), vec!["https://cdn/abc/96.mp4"]);
    }

    #[test]
    fn test_failed_resolution_keeps_state() {
        let mut c = playing_queue(3, 1);
        let req = c.next().unwrap();
        assert_eq!(c.queue().current_index(), 2);

        let err = c
            .finish_load(req, Err(CatalogError::Network(String::from("timeout"))))
            .unwrap_err();
        assert!(matches!(err, PlayerError::Resolution { ref id, .. } if id == "2"));
        assert_eq!(c.queue().current_index(), 1);
        assert_eq!(c.current_track().map(|t| t.id.as_str()), Some("1"));
        assert_eq!(c.state(), PlayerState::Playing);
    }

    #[test]
    fn test_track_without_streams_is_rejected() {
        let mut c = controller();
        let req = c.load_and_play("silent");
        let mut silent = track("silent");
        silent.streams.clear();

        let err = c.finish_load(req, Ok(silent)).unwrap_err();
        assert!(matches!(err, PlayerError::Resolution { .. }));
        assert_eq!(c.state(), PlayerState::Idle);
        assert!(c.current_track().is_none());
        assert!(c.media().loads().is_empty());
    }

    #[test]
    fn test_stale_resolution_is_dropped() {
        let mut c = controller();
        let first = c.load_and_play("old");
        let second = c.load_and_play("new");

        assert_eq!(resolve(&mut c, second), LoadOutcome::Started);
        assert_eq!(resolve(&mut c, first), LoadOutcome::Stale);

        assert_eq!(c.current_track().map(|t| t.id.as_str()), Some("new"));
        assert_eq!(c.media().loads(), vec!["https://cdn/new/320.mp4"]);
    }

    #[test]
    fn test_toggle_play_pause() {
        let mut c = controller();
        assert!(c.toggle_play_pause().unwrap().is_none());
        assert_eq!(c.state(), PlayerState::Idle);
        assert!(c.media().calls.iter().all(|call| *call != MediaCall::Play));

        let req = c.load_and_play("a");
        resolve(&mut c, req);
        assert!(c.toggle_play_pause().unwrap().is_none());
        assert_eq!(c.state(), PlayerState::Paused);
        assert!(!c.media().playing);
        assert!(c.toggle_play_pause().unwrap().is_none());
        assert_eq!(c.state(), PlayerState::Playing);
        assert!(c.media().playing);
    }

    #[test]
    fn test_next_and_previous_on_empty_queue() {
        let mut c = controller();
        assert!(c.next().is_none());
        assert!(c.previous().is_none());
    }

    #[test]
    fn test_previous_then_next_returns_to_start() {
        let mut c = playing_queue(5, 0);
        let req = c.previous().unwrap();
        assert_eq!(c.queue().current_index(), 4);
        resolve(&mut c, req);
        let req = c.next().unwrap();
        resolve(&mut c, req);
        assert_eq!(c.queue().current_index(), 0);
    }

    #[test]
    fn test_shuffle_does_not_reorder_queue() {
        let mut c = playing_queue(6, 0);
        let before: Vec<String> = c.queue().tracks().iter().map(|t| t.id.clone()).collect();
        assert!(c.toggle_shuffle());
        for _ in 0..10 {
            let req = c.next().unwrap();
            assert!(c.queue().current_index() < 6);
            resolve(&mut c, req);
        }
        let after: Vec<String> = c.queue().tracks().iter().map(|t| t.id.clone()).collect();
        assert_eq!(before, after);
        assert!(!c.toggle_shuffle());
    }

    #[test]
    fn test_cycle_repeat() {
        let mut c = controller();
        assert_eq!(c.cycle_repeat(), RepeatMode::All);
        assert_eq!(c.cycle_repeat(), RepeatMode::One);
        assert_eq!(c.cycle_repeat(), RepeatMode::Off);
    }

    #[test]
    fn test_seek_requires_duration() {
        let mut c = playing_queue(1, 0);
        assert!(!c.seek(SeekTarget::Fraction(0.5)).unwrap());

        send(
            &mut c,
            MediaEvent::MetadataLoaded {
                duration: Duration::from_secs(200),
            },
        )
        .unwrap();
        assert!(c.seek(SeekTarget::Fraction(0.5)).unwrap());
        assert_eq!(c.elapsed(), Duration::from_secs(100));
        assert_eq!(
            c.media().calls.last(),
            Some(&MediaCall::Seek(Duration::from_secs(100)))
        );

        c.seek(SeekTarget::Forward(Duration::from_secs(500))).unwrap();
        assert_eq!(c.elapsed(), Duration::from_secs(200));
        c.seek(SeekTarget::Backward(Duration::from_secs(500))).unwrap();
        assert_eq!(c.elapsed(), Duration::ZERO);
        c.seek(SeekTarget::Fraction(1.5)).unwrap();
        assert_eq!(c.elapsed(), Duration::from_secs(200));
        c.seek(SeekTarget::Absolute(Duration::from_secs(30))).unwrap();
        assert_eq!(c.elapsed(), Duration::from_secs(30));
        c.seek(SeekTarget::Absolute(Duration::from_secs(900))).unwrap();
        assert_eq!(c.elapsed(), Duration::from_secs(200));
    }

    #[test]
    fn test_time_update_drives_progress() {
        let mut c = playing_queue(1, 0);
        assert_eq!(c.progress(), 0.0);
        send(
            &mut c,
            MediaEvent::MetadataLoaded {
                duration: Duration::from_secs(200),
            },
        )
        .unwrap();
        send(
            &mut c,
            MediaEvent::TimeUpdate {
                position: Duration::from_secs(50),
            },
        )
        .unwrap();
        assert_eq!(c.elapsed(), Duration::from_secs(50));
        assert!((c.progress() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut c = controller();
        c.set_volume(1.7).unwrap();
        assert_eq!(c.volume(), 1.0);
        c.set_volume(-0.3).unwrap();
        assert_eq!(c.volume(), 0.0);
        assert_eq!(c.media().volume, Some(0.0));
    }

    #[test]
    fn test_mute_restores_previous_volume() {
        let mut c = controller();
        c.set_volume(0.42).unwrap();
        c.toggle_mute().unwrap();
        assert_eq!(c.media_volume(), 0.0);
        assert_eq!(c.media().volume, Some(0.0));

        c.toggle_mute().unwrap();
        assert_eq!(c.media_volume(), 0.42);
        assert_eq!(c.media().volume, Some(0.42));
    }

    #[test]
    fn test_unmute_without_memory_uses_volume() {
        let mut c = controller();
        c.set_volume(0.0).unwrap();
        c.set_volume(0.5).unwrap();
        c.toggle_mute().unwrap();
        c.toggle_mute().unwrap();
        assert_eq!(c.media_volume(), 0.5);
    }

    #[test]
    fn test_ended_at_queue_end_with_repeat_off_stops() {
        let mut c = playing_queue(3, 2);
        let loads_before = c.media().loads().len();

        let req = send(&mut c, MediaEvent::Ended).unwrap();
        assert!(req.is_none());
        assert_eq!(c.queue().current_index(), 0);
        assert_eq!(c.state(), PlayerState::Paused);
        assert_eq!(c.media().loads().len(), loads_before);
    }

    #[test]
    fn test_ended_at_queue_end_with_repeat_all_wraps() {
        let mut c = playing_queue(3, 2);
        c.cycle_repeat();

        let req = send(&mut c, MediaEvent::Ended).unwrap().unwrap();
        assert_eq!(c.queue().current_index(), 0);
        assert_eq!(req.track_id, "0");
        assert_eq!(resolve(&mut c, req), LoadOutcome::Started);
        assert_eq!(c.state(), PlayerState::Playing);
        assert_eq!(c.current_track().map(|t| t.id.as_str()), Some("0"));
    }

    #[test]
    fn test_ended_mid_queue_advances() {
        let mut c = playing_queue(3, 0);
        let req = send(&mut c, MediaEvent::Ended).unwrap().unwrap();
        assert_eq!(req.track_id, "1");
    }

    #[test]
    fn test_ended_with_repeat_one_replays() {
        let mut c = playing_queue(3, 1);
        c.cycle_repeat();
        c.cycle_repeat();
        assert_eq!(c.repeat(), RepeatMode::One);

        let req = send(&mut c, MediaEvent::Ended).unwrap();
        assert!(req.is_none());
        assert_eq!(c.queue().current_index(), 1);
        assert_eq!(c.state(), PlayerState::Playing);
        let calls = &c.media().calls;
        assert_eq!(
            &calls[calls.len() - 2..],
            &[MediaCall::Seek(Duration::ZERO), MediaCall::Play]
        );
    }

    #[test]
    fn test_ended_with_empty_queue_goes_idle() {
        let mut c = controller();
        let req = c.load_and_play("solo");
        resolve(&mut c, req);

        assert!(send(&mut c, MediaEvent::Ended).unwrap().is_none());
        assert_eq!(c.state(), PlayerState::Idle);
    }

    #[test]
    fn test_media_error_pauses() {
        let mut c = playing_queue(1, 0);
        let err = send(&mut c, MediaEvent::Error(String::from("decode failed"))).unwrap_err();
        assert!(matches!(err, PlayerError::Playback(_)));
        assert_eq!(c.state(), PlayerState::Paused);
        assert!(!c.seek(SeekTarget::Fraction(0.5)).unwrap());
    }

    #[test]
    fn test_resume_after_media_error_reloads_track() {
        let mut c = playing_queue(2, 1);
        send(&mut c, MediaEvent::Error(String::from("stream failed"))).unwrap_err();
        let plays = c.media().calls.iter().filter(|call| **call == MediaCall::Play).count();

        let req = c.toggle_play_pause().unwrap().unwrap();
        assert_eq!(req.track_id, "1");
        assert_eq!(c.state(), PlayerState::Paused);
        assert_eq!(
            c.media().calls.iter().filter(|call| **call == MediaCall::Play).count(),
            plays
        );

        assert_eq!(resolve(&mut c, req), LoadOutcome::Started);
        assert_eq!(c.state(), PlayerState::Playing);
        assert_eq!(c.queue().current_index(), 1);
        assert_eq!(c.media().loads().len(), 2);

        // The reloaded source plays and pauses normally again
        assert!(c.toggle_play_pause().unwrap().is_none());
        assert_eq!(c.state(), PlayerState::Paused);
    }

    #[test]
    fn test_ended_while_next_track_resolves_is_ignored() {
        let mut c = playing_queue(3, 0);
        let ended_source = c.media().source_id.unwrap();
        let req = c.play_index(2).unwrap();

        // The old track runs out before "2" is resolved
        let auto = c.handle_media_event(ended_source, MediaEvent::Ended).unwrap();
        assert!(auto.is_none());
        assert_eq!(c.queue().current_index(), 2);

        assert_eq!(resolve(&mut c, req), LoadOutcome::Started);
        assert_eq!(c.current_track().map(|t| t.id.as_str()), Some("2"));
        assert_eq!(c.state(), PlayerState::Playing);
    }

    #[test]
    fn test_events_from_replaced_source_are_ignored() {
        let mut c = playing_queue(3, 0);
        let old = c.media().source_id.unwrap();
        let req = c.play_index(2).unwrap();
        assert_eq!(resolve(&mut c, req), LoadOutcome::Started);
        assert_ne!(c.media().source_id, Some(old));

        // Late events of track "0" arrive after "2" started
        assert!(c.handle_media_event(old, MediaEvent::Ended).unwrap().is_none());
        c.handle_media_event(
            old,
            MediaEvent::TimeUpdate {
                position: Duration::from_secs(180),
            },
        )
        .unwrap();
        c.handle_media_event(
            old,
            MediaEvent::MetadataLoaded {
                duration: Duration::from_secs(190),
            },
        )
        .unwrap();
        assert!(c
            .handle_media_event(old, MediaEvent::Error(String::from("gone")))
            .unwrap()
            .is_none());

        assert_eq!(c.queue().current_index(), 2);
        assert_eq!(c.state(), PlayerState::Playing);
        assert_eq!(c.elapsed(), Duration::ZERO);
        assert_eq!(c.duration(), None);

        // The new source is still heard
        assert!(send(&mut c, MediaEvent::Ended).unwrap().is_none());
        assert_eq!(c.queue().current_index(), 0);
        assert_eq!(c.state(), PlayerState::Paused);
    }

    #[test]
    fn test_progress_updates_while_next_track_resolves() {
        let mut c = playing_queue(2, 0);
        let _req = c.next().unwrap();
        send(
            &mut c,
            MediaEvent::TimeUpdate {
                position: Duration::from_secs(12),
            },
        )
        .unwrap();
        assert_eq!(c.elapsed(), Duration::from_secs(12));
    }

    #[test]
    fn test_failed_resolution_leaves_old_source_active() {
        let mut c = playing_queue(3, 0);
        let req = c.next().unwrap();
        c.finish_load(req, Err(CatalogError::Network(String::from("timeout"))))
            .unwrap_err();

        let req = send(&mut c, MediaEvent::Ended).unwrap().unwrap();
        assert_eq!(req.track_id, "1");
    }

    #[test]
    fn test_toggle_like() {
        let mut c = controller();
        assert!(matches!(c.toggle_like(), Err(PlayerError::NoTrack)));

        let req = c.load_and_play("abc123");
        resolve(&mut c, req);
        assert!(c.toggle_like().unwrap());
        assert!(c.is_current_liked());
        assert!(c.liked().contains("abc123"));
        assert!(!c.toggle_like().unwrap());
        assert!(!c.is_current_liked());
    }

    #[test]
    fn test_queue_management_keeps_cursor() {
        let mut c = playing_queue(3, 2);
        c.enqueue(track("3"));
        assert_eq!(c.queue().len(), 4);
        assert!(c.remove_from_queue(0));
        assert_eq!(c.queue().current_index(), 1);
        assert!(!c.remove_from_queue(10));
        c.clear_queue();
        assert!(c.queue().is_empty());
        assert_eq!(c.queue().current_index(), 0);
        assert!(c.play_index(0).is_none());
    }

    #[test]
    fn test_play_queue_ignores_empty_list() {
        let mut c = controller();
        assert!(c.play_queue(Vec::new(), 0).is_none());
    }
}
