use std::path::Path;
use std::time::Duration;

use crate::error::PlayerError;

/// Commands and queries the controller issues to whatever decodes and
/// outputs audio.
///
/// Implementations must not block on audio output: `position` and
/// `is_finished` are polled from the event loop.
pub trait PlaybackEngine {
    /// Open `path` and make it the current track, paused at zero.
    fn load(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, level: f32);
    fn seek(&mut self, position: Duration);
    /// Elapsed time in the current track.
    fn position(&self) -> Duration;
    /// True once the current track has played to its end.
    fn is_finished(&self) -> bool;
}
