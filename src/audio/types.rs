//! Audio-related small types and handles.
//!
//! This module defines the commands understood by the audio thread and the
//! playback snapshot it publishes for the event loop to poll.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::Decoder;

/// A decoder opened on the caller's thread and handed to the audio thread.
pub type FileSource = Decoder<BufReader<File>>;

pub enum AudioCmd {
    /// Replace the current sink with `source`, paused at position zero.
    Load {
        path: PathBuf,
        source: FileSource,
        generation: u64,
    },
    /// Start or resume the loaded track.
    Play,
    /// Pause the loaded track, keeping its position.
    Pause,
    /// Drop the loaded track.
    Stop,
    /// Set output volume in `0.0..=1.0`.
    SetVolume(f32),
    /// Jump to an absolute position in the loaded track.
    SeekTo(Duration),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Playback snapshot shared with the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackInfo {
    /// Whether a track is loaded in the sink.
    pub loaded: bool,
    /// Elapsed playback time for the loaded track.
    pub elapsed: Duration,
    /// True while the loaded track has run out during playback.
    pub finished: bool,
    /// Which `Load` the snapshot describes.
    pub generation: u64,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
