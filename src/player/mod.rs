//! Playback: the controller state machine, its queue and the audio backend.

pub mod backend;
pub mod controller;
pub mod media;
pub mod queue;

pub use backend::RodioMedia;
pub use controller::{LoadOutcome, LoadRequest, PlaybackController, PlayerError, SeekTarget};
pub use media::{MediaElement, MediaEvent, SourceId};
