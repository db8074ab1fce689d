//! Transport state: current track pointer, play/pause/stop status, volume,
//! and the index arithmetic behind next/previous.

use crate::config::BoundaryPolicy;

/// The playback state of the application.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Current index plus status. `current` is `None` or a valid playlist index;
/// `Playing`/`Paused` imply `current` is set.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transport {
    pub current: Option<usize>,
    pub status: PlaybackState,
    pub volume: f32,
}

impl Transport {
    pub fn new(volume: f32) -> Self {
        Self {
            current: None,
            status: PlaybackState::Stopped,
            volume: clamp_volume(volume).unwrap_or(1.0),
        }
    }

    /// Check the invariants against a playlist of `len` entries.
    pub fn is_consistent(&self, len: usize) -> bool {
        let index_ok = self.current.is_none_or(|i| i < len);
        let status_ok = self.status == PlaybackState::Stopped || self.current.is_some();
        index_ok && status_ok && (0.0..=1.0).contains(&self.volume)
    }
}

/// What a transport operation did, so callers can react to exactly one change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Started(usize),
    Resumed,
    Paused,
    Stopped,
    Unchanged,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Index one step from `current` in a playlist of `len`, or `None` when the
/// boundary policy says to halt.
pub fn step(current: usize, len: usize, dir: Direction, policy: BoundaryPolicy) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = current.min(len - 1);
    match (dir, policy) {
        (Direction::Forward, _) if current + 1 < len => Some(current + 1),
        (Direction::Forward, BoundaryPolicy::Wrap) => Some(0),
        (Direction::Backward, _) if current > 0 => Some(current - 1),
        (Direction::Backward, BoundaryPolicy::Wrap) => Some(len - 1),
        (_, BoundaryPolicy::Stop) => None,
    }
}

/// Clamp to `0.0..=1.0`; NaN has no meaningful level and yields `None`.
pub fn clamp_volume(level: f32) -> Option<f32> {
    (!level.is_nan()).then(|| level.clamp(0.0, 1.0))
}
