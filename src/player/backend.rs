//! Audio playback backend using rodio.

use std::io::{BufReader, Cursor};
use std::time::Duration;

use color_eyre::Result;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tokio::sync::mpsc;

use super::media::{MediaElement, MediaError, MediaEvent, SourceId};

/// How often the player thread polls for commands and reports progress.
const TICK: Duration = Duration::from_millis(100);

/// Events reported by the player thread, tagged with their source.
pub type SourceEvents = mpsc::UnboundedReceiver<(SourceId, MediaEvent)>;

/// Messages sent to the player thread.
#[derive(Debug)]
enum PlayerCommand {
    Load {
        source: SourceId,
        url: String,
        duration_hint: Option<Duration>,
    },
    Play,
    Pause,
    SetVolume(f32),
    Seek(Duration),
}

/// Media element backed by a rodio sink running in a separate thread.
pub struct RodioMedia {
    command_tx: mpsc::UnboundedSender<PlayerCommand>,
}

impl RodioMedia {
    /// Start the player thread. Media events arrive on the returned receiver.
    /// Once the thread is gone every operation fails with
    /// [`MediaError::Disconnected`].
    pub fn spawn() -> (Self, SourceEvents) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            if let Err(e) = run_player_thread(command_rx, event_tx) {
                tracing::error!("Player thread error: {}", e);
            }
        });

        (Self { command_tx }, event_rx)
    }

    fn send(&self, command: PlayerCommand) -> Result<(), MediaError> {
        self.command_tx
            .send(command)
            .map_err(|_| MediaError::Disconnected)
    }
}

impl MediaElement for RodioMedia {
    fn load(
        &mut self,
        source: SourceId,
        url: &str,
        duration_hint: Option<Duration>,
    ) -> Result<(), MediaError> {
        self.send(PlayerCommand::Load {
            source,
            url: url.to_string(),
            duration_hint,
        })
    }

    fn play(&mut self) -> Result<(), MediaError> {
        self.send(PlayerCommand::Play)
    }

    fn pause(&mut self) -> Result<(), MediaError> {
        self.send(PlayerCommand::Pause)
    }

    fn seek(&mut self, position: Duration) -> Result<(), MediaError> {
        self.send(PlayerCommand::Seek(position))
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), MediaError> {
        self.send(PlayerCommand::SetVolume(volume))
    }
}

/// State owned by the player thread.
struct PlayerThread {
    handle: OutputStreamHandle,
    sink: Sink,
    events: mpsc::UnboundedSender<(SourceId, MediaEvent)>,
    source: Option<SourceId>,
    audio: Option<Vec<u8>>,
    volume: f32,
    /// Where the sink's current source starts within the track
    offset: Duration,
    playing: bool,
}

impl PlayerThread {
    /// Drop whatever is queued on the sink and start over with an empty one.
    fn reset_sink(&mut self) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::try_new(&self.handle)?;
        Ok(())
    }

    /// Decode the cached audio from `skip` and start playing it.
    fn start_from(&mut self, skip: Duration) -> Result<Option<Duration>> {
        let Some(audio) = self.audio.clone() else {
            return Ok(None);
        };
        self.reset_sink()?;

        let source = Decoder::new(BufReader::new(Cursor::new(audio)))?;
        let total = source.total_duration();
        if skip > Duration::ZERO {
            self.sink.append(source.skip_duration(skip));
        } else {
            self.sink.append(source);
        }
        self.sink.set_volume(self.volume);
        self.sink.play();

        self.offset = skip;
        self.playing = true;
        Ok(total)
    }

    fn emit(&self, event: MediaEvent) {
        if let Some(source) = self.source {
            let _ = self.events.send((source, event));
        }
    }

    fn handle(&mut self, command: PlayerCommand) -> Result<()> {
        match command {
            PlayerCommand::Load {
                source,
                url,
                duration_hint,
            } => {
                self.reset_sink()?;
                self.source = Some(source);
                self.audio = None;
                self.playing = false;
                self.offset = Duration::ZERO;

                match fetch_audio_data(&url) {
                    Ok(data) => {
                        self.audio = Some(data);
                        // Loaded paused; the following Play starts it.
                        match self.start_from(Duration::ZERO) {
                            Ok(total) => {
                                self.sink.pause();
                                self.playing = false;
                                if let Some(duration) = total.or(duration_hint) {
                                    self.emit(MediaEvent::MetadataLoaded { duration });
                                }
                            }
                            Err(e) => {
                                self.audio = None;
                                self.emit(MediaEvent::Error(format!("Decode failed: {}", e)));
                            }
                        }
                    }
                    Err(e) => {
                        self.emit(MediaEvent::Error(format!("Stream failed: {}", e)));
                    }
                }
            }
            PlayerCommand::Play => {
                if self.audio.is_none() {
                    return Ok(());
                }
                if self.sink.empty() {
                    // Played to the end before; start over.
                    if let Err(e) = self.start_from(Duration::ZERO) {
                        self.emit(MediaEvent::Error(e.to_string()));
                    }
                } else {
                    self.sink.play();
                    self.playing = true;
                }
            }
            PlayerCommand::Pause => {
                self.sink.pause();
                self.playing = false;
            }
            PlayerCommand::SetVolume(volume) => {
                self.volume = volume;
                self.sink.set_volume(volume);
            }
            PlayerCommand::Seek(position) => {
                let was_playing = self.playing;
                match self.start_from(position) {
                    Ok(_) if !was_playing => {
                        self.sink.pause();
                        self.playing = false;
                    }
                    Ok(_) => {}
                    Err(e) => self.emit(MediaEvent::Error(format!("Seek failed: {}", e))),
                }
            }
        }
        Ok(())
    }

    fn tick(&mut self) {
        if !self.playing {
            return;
        }
        if self.sink.empty() {
            self.playing = false;
            self.emit(MediaEvent::Ended);
            return;
        }
        // get_pos counts from the start of what was appended, which is
        // `offset` into the track after a seek.
        self.emit(MediaEvent::TimeUpdate {
            position: self.offset + self.sink.get_pos(),
        });
    }
}

/// Run the player thread.
fn run_player_thread(
    mut command_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    events: mpsc::UnboundedSender<(SourceId, MediaEvent)>,
) -> Result<()> {
    // Initialize audio output
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;

    let mut player = PlayerThread {
        handle,
        sink,
        events,
        source: None,
        audio: None,
        volume: 0.7,
        offset: Duration::ZERO,
        playing: false,
    };

    loop {
        loop {
            match command_rx.try_recv() {
                Ok(command) => player.handle(command)?,
                Err(mpsc::error::TryRecvError::Empty) => break,
                // Controller dropped, exit thread
                Err(mpsc::error::TryRecvError::Disconnected) => return Ok(()),
            }
        }

        player.tick();

        // Sleep to avoid busy waiting
        std::thread::sleep(TICK);
    }
}

/// Fetch audio data from URL.
fn fetch_audio_data(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let bytes = response.bytes()?;
    Ok(bytes.to_vec())
}
