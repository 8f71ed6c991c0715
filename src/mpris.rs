//! MPRIS D-Bus integration for system media controls.
//!
//! Publishes the current track and playback status, and forwards media keys
//! (play/pause, next, previous) back to the app.
//!
//! The MPRIS server runs on a dedicated thread with a single-threaded runtime
//! because mpris_server::Player is !Send + !Sync.

use std::thread;
use std::time::Duration;

use mpris_server::{LoopStatus, Metadata, PlaybackStatus, Player, Time, TrackId};
use tokio::sync::mpsc;

use crate::action::{Action, PlayerState, RepeatMode};
use crate::client::models::Track;
use crate::player::{MediaElement, PlaybackController};

/// Requests from the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    PlayPause,
    Play,
    Pause,
    Next,
    Previous,
    Quit,
}

impl SessionEvent {
    /// The app action for this request, given the current playback state.
    pub fn into_action(self, state: PlayerState) -> Action {
        match (self, state) {
            (Self::PlayPause, _) => Action::PlayPause,
            (Self::Play, PlayerState::Paused) | (Self::Pause, PlayerState::Playing) => {
                Action::PlayPause
            }
            (Self::Play | Self::Pause, _) => Action::None,
            (Self::Next, _) => Action::NextTrack,
            (Self::Previous, _) => Action::PreviousTrack,
            (Self::Quit, _) => Action::Quit,
        }
    }
}

/// What the desktop is shown about a track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMetadata {
    pub track_id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub art_url: Option<String>,
}

impl From<&Track> for TrackMetadata {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.id.clone(),
            title: track.title.clone(),
            artists: track.artists.clone(),
            album: track.album.clone(),
            duration: track.duration.map(|d| Duration::from_secs(u64::from(d))),
            art_url: track.best_artwork().map(String::from),
        }
    }
}

/// Commands sent from the app to the MPRIS server.
#[derive(Debug, Clone)]
enum SessionCommand {
    SetPlaybackStatus(PlaybackStatus),
    SetMetadata(TrackMetadata),
    SetLoopStatus(LoopStatus),
    SetShuffle(bool),
    Shutdown,
}

/// Last state published, so only changes go over D-Bus.
#[derive(Debug, Clone, Default, PartialEq)]
struct Published {
    status: Option<PlayerState>,
    track_id: Option<String>,
    repeat: Option<RepeatMode>,
    shuffle: Option<bool>,
}

/// Handle to the MPRIS server thread.
pub struct MediaSession {
    event_rx: mpsc::UnboundedReceiver<SessionEvent>,
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    published: Published,
    _thread_handle: thread::JoinHandle<()>,
}

impl MediaSession {
    /// Start the MPRIS server on a dedicated thread.
    pub fn start() -> Result<Self, String> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let thread_handle = thread::Builder::new()
            .name("mpris-server".to_string())
            .spawn(move || {
                run_mpris_thread(event_tx, command_rx);
            })
            .map_err(|e| format!("Failed to spawn MPRIS thread: {}", e))?;

        Ok(Self {
            event_rx,
            command_tx,
            published: Published::default(),
            _thread_handle: thread_handle,
        })
    }

    /// Next pending request from the desktop, if any.
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    fn send(&self, command: SessionCommand) {
        if self.command_tx.send(command).is_err() {
            tracing::debug!("MPRIS server is gone");
        }
    }

    /// Publish whatever changed in the player since the last call.
    pub fn sync<M: MediaElement>(&mut self, player: &PlaybackController<M>) {
        let state = player.state();
        if self.published.status != Some(state) {
            self.published.status = Some(state);
            self.send(SessionCommand::SetPlaybackStatus(playback_status(state)));
        }

        let track = player.current_track();
        let track_id = track.map(|t| t.id.clone());
        if self.published.track_id != track_id {
            self.published.track_id = track_id;
            if let Some(track) = track {
                self.send(SessionCommand::SetMetadata(TrackMetadata::from(track)));
            }
        }

        let repeat = player.repeat();
        if self.published.repeat != Some(repeat) {
            self.published.repeat = Some(repeat);
            self.send(SessionCommand::SetLoopStatus(repeat_to_loop_status(repeat)));
        }

        let shuffle = player.shuffle();
        if self.published.shuffle != Some(shuffle) {
            self.published.shuffle = Some(shuffle);
            self.send(SessionCommand::SetShuffle(shuffle));
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        let _ = self.command_tx.send(SessionCommand::Shutdown);
    }
}

/// Run the MPRIS server on a dedicated single-threaded runtime.
fn run_mpris_thread(
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create MPRIS runtime: {}", e);
            return;
        }
    };

    let local = tokio::task::LocalSet::new();

    local.block_on(&rt, async move {
        let player = match Player::builder("musicstream_tui")
            .identity("MusicStream TUI")
            .desktop_entry("musicstream-tui")
            .can_play(true)
            .can_pause(true)
            .can_go_next(true)
            .can_go_previous(true)
            .can_seek(false)
            .can_control(true)
            .can_quit(true)
            .can_raise(false)
            .build()
            .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("Failed to build MPRIS player: {}", e);
                return;
            }
        };

        let forward = |event: SessionEvent| {
            let tx = event_tx.clone();
            move |_: &Player| {
                let _ = tx.send(event);
            }
        };
        player.connect_play_pause(forward(SessionEvent::PlayPause));
        player.connect_play(forward(SessionEvent::Play));
        player.connect_pause(forward(SessionEvent::Pause));
        player.connect_next(forward(SessionEvent::Next));
        player.connect_previous(forward(SessionEvent::Previous));
        player.connect_quit(forward(SessionEvent::Quit));

        let player_run = player.run();
        tokio::task::spawn_local(async move {
            player_run.await;
        });

        tracing::info!("MPRIS server started");

        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    let result = match cmd {
                        Some(SessionCommand::SetPlaybackStatus(status)) => {
                            player.set_playback_status(status).await
                        }
                        Some(SessionCommand::SetMetadata(metadata)) => {
                            player.set_metadata(build_metadata(&metadata)).await
                        }
                        Some(SessionCommand::SetLoopStatus(status)) => {
                            player.set_loop_status(status).await
                        }
                        Some(SessionCommand::SetShuffle(shuffle)) => {
                            player.set_shuffle(shuffle).await
                        }
                        Some(SessionCommand::Shutdown) | None => {
                            tracing::info!("MPRIS server shutting down");
                            break;
                        }
                    };
                    if let Err(e) = result {
                        tracing::warn!("MPRIS update failed: {}", e);
                    }
                }
                // Yield to allow the player to process D-Bus messages
                _ = tokio::time::sleep(Duration::from_millis(10)) => {}
            }
        }
    });
}

fn build_metadata(track: &TrackMetadata) -> Metadata {
    let mut builder = Metadata::builder()
        .trackid(object_path(&track.track_id))
        .title(track.title.clone());

    if !track.artists.is_empty() {
        builder = builder.artist(track.artists.clone());
    }

    if let Some(album) = &track.album {
        builder = builder.album(album.clone());
    }

    if let Some(duration) = track.duration {
        builder = builder.length(Time::from_secs(duration.as_secs() as i64));
    }

    if let Some(url) = &track.art_url {
        builder = builder.art_url(url.clone());
    }

    builder.build()
}

/// D-Bus object path for a track; catalog ids may hold characters an object
/// path cannot.
fn object_path(track_id: &str) -> TrackId {
    TrackId::try_from(object_path_string(track_id)).unwrap_or(TrackId::NO_TRACK)
}

fn object_path_string(track_id: &str) -> String {
    let sanitized: String = track_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("/org/musicstream_tui/track/t{}", sanitized)
}

pub fn playback_status(state: PlayerState) -> PlaybackStatus {
    match state {
        PlayerState::Idle => PlaybackStatus::Stopped,
        PlayerState::Paused => PlaybackStatus::Paused,
        PlayerState::Playing => PlaybackStatus::Playing,
    }
}

/// Convert our RepeatMode to MPRIS LoopStatus.
pub fn repeat_to_loop_status(mode: RepeatMode) -> LoopStatus {
    match mode {
        RepeatMode::Off => LoopStatus::None,
        RepeatMode::One => LoopStatus::Track,
        RepeatMode::All => LoopStatus::Playlist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(playback_status(PlayerState::Idle), PlaybackStatus::Stopped);
        assert_eq!(playback_status(PlayerState::Paused), PlaybackStatus::Paused);
        assert_eq!(playback_status(PlayerState::Playing), PlaybackStatus::Playing);
        assert_eq!(repeat_to_loop_status(RepeatMode::All), LoopStatus::Playlist);
        assert_eq!(repeat_to_loop_status(RepeatMode::One), LoopStatus::Track);
    }

    #[test]
    fn test_play_and_pause_only_toggle_when_needed() {
        assert_eq!(
            SessionEvent::Play.into_action(PlayerState::Paused),
            Action::PlayPause
        );
        assert_eq!(SessionEvent::Play.into_action(PlayerState::Playing), Action::None);
        assert_eq!(SessionEvent::Pause.into_action(PlayerState::Idle), Action::None);
        assert_eq!(
            SessionEvent::Pause.into_action(PlayerState::Playing),
            Action::PlayPause
        );
        assert_eq!(
            SessionEvent::Next.into_action(PlayerState::Idle),
            Action::NextTrack
        );
    }

    #[test]
    fn test_object_path_is_sanitized() {
        assert_eq!(
            object_path_string("x-Y_9/z"),
            "/org/musicstream_tui/track/tx_Y_9_z"
        );
    }

    #[test]
    fn test_metadata_from_track() {
        let track = Track {
            id: String::from("abc123"),
            title: String::from("Kesariya"),
            artists: vec![String::from("Arijit Singh")],
            album: Some(String::from("Brahmastra")),
            duration: Some(268),
            artwork: vec![String::from("s.jpg"), String::from("l.jpg")],
            streams: Vec::new(),
        };
        let metadata = TrackMetadata::from(&track);
        assert_eq!(metadata.duration, Some(Duration::from_secs(268)));
        assert_eq!(metadata.art_url.as_deref(), Some("l.jpg"));
    }
}
