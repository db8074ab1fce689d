//! Playback engine: the `PlaybackEngine` contract and its `rodio`
//! implementation running on a dedicated audio thread.

mod engine;
mod player;
mod sink;
mod thread;
mod types;

pub use engine::PlaybackEngine;
pub use player::AudioPlayer;

#[cfg(test)]
pub(crate) use engine::fake;
