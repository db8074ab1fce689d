//! Utilities for opening audio files and creating `rodio` sinks from them.
//!
//! Opening and decoding happen here so that failures are reported with the
//! file name and a likely cause before anything reaches the audio thread.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use rodio::decoder::DecoderError;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::PlayerError;

use super::types::FileSource;

/// Open `path` and probe it with the decoder.
///
/// The decoder is built from the `File` itself so it knows the byte length
/// and may seek. MP4 containers with `moov` after `mdat` need that.
pub(crate) fn open_source(path: &Path) -> Result<FileSource, PlayerError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PlayerError::not_found(path),
        _ => PlayerError::load_failure(path, format!("cannot open file ({e})")),
    })?;

    Decoder::try_from(file).map_err(|e| PlayerError::load_failure(path, describe(&e)))
}

fn describe(err: &DecoderError) -> String {
    match err {
        DecoderError::UnrecognizedFormat => "unsupported codec or unrecognised format".to_string(),
        other => format!("file looks corrupt or truncated ({other})"),
    }
}

/// Create a paused `Sink` for `source` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    source: FileSource,
    start_at: Duration,
    volume: f32,
) -> Sink {
    let sink = Sink::connect_new(stream.mixer());
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    sink.append(source.skip_duration(start_at));
    sink.set_volume(volume);
    sink.pause();
    sink
}
