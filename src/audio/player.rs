use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::PlayerError;

use super::engine::PlaybackEngine;
use super::sink::open_source;
use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, PlaybackHandle, PlaybackInfo};

/// `rodio`-backed engine. Output lives on a dedicated thread; this handle
/// only sends commands and reads the shared snapshot.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
    device_error: Option<String>,
    generation: u64,
}

impl AudioPlayer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let audio_handle = spawn_audio_thread(rx, playback_info.clone(), ready_tx);

        let device_error = match ready_rx.recv() {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some("audio thread exited during startup".to_string()),
        };

        Self {
            tx,
            playback: playback_info,
            join: Mutex::new(Some(audio_handle)),
            device_error,
            generation: 0,
        }
    }

    /// Why the output device could not be opened, if it could not.
    pub fn device_error(&self) -> Option<&str> {
        self.device_error.as_deref()
    }

    fn send(&self, cmd: AudioCmd) {
        if self.tx.send(cmd).is_err() {
            tracing::trace!("audio thread is gone, dropping command");
        }
    }

    fn snapshot(&self) -> Option<PlaybackInfo> {
        self.playback
            .lock()
            .ok()
            .map(|info| info.clone())
            .filter(|info| info.generation == self.generation)
    }

    /// Fade out, stop the audio thread and wait for it.
    pub fn quit_softly(&self, fade_out: Duration) {
        self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine for AudioPlayer {
    fn load(&mut self, path: &Path) -> Result<(), PlayerError> {
        if let Some(e) = &self.device_error {
            return Err(PlayerError::load_failure(
                path,
                format!("no audio output device ({e})"),
            ));
        }

        let source = open_source(path)?;
        self.generation += 1;
        if let Ok(mut info) = self.playback.lock() {
            info.finished = false;
            info.elapsed = Duration::ZERO;
        }
        self.send(AudioCmd::Load {
            path: path.to_path_buf(),
            source,
            generation: self.generation,
        });
        Ok(())
    }

    fn play(&mut self) {
        self.send(AudioCmd::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCmd::Pause);
    }

    fn stop(&mut self) {
        self.send(AudioCmd::Stop);
    }

    fn set_volume(&mut self, level: f32) {
        self.send(AudioCmd::SetVolume(level));
    }

    fn seek(&mut self, position: Duration) {
        self.send(AudioCmd::SeekTo(position));
    }

    fn position(&self) -> Duration {
        self.snapshot()
            .filter(|info| info.loaded)
            .map_or(Duration::ZERO, |info| info.elapsed)
    }

    fn is_finished(&self) -> bool {
        self.snapshot().is_some_and(|info| info.finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A player with no audio thread behind it, reading `info` as the shared
    /// snapshot.
    fn detached(info: PlaybackInfo, generation: u64) -> AudioPlayer {
        let (tx, _rx) = mpsc::channel();
        AudioPlayer {
            tx,
            playback: Arc::new(Mutex::new(info)),
            join: Mutex::new(None),
            device_error: None,
            generation,
        }
    }

    fn finished_at(generation: u64) -> PlaybackInfo {
        PlaybackInfo {
            loaded: true,
            elapsed: Duration::from_secs(42),
            finished: true,
            generation,
        }
    }

    #[test]
    fn snapshot_from_an_earlier_load_is_ignored() {
        let player = detached(finished_at(1), 2);
        assert!(!player.is_finished());
        assert_eq!(player.position(), Duration::ZERO);
    }

    #[test]
    fn snapshot_from_the_current_load_is_used() {
        let player = detached(finished_at(2), 2);
        assert!(player.is_finished());
        assert_eq!(player.position(), Duration::from_secs(42));
    }

    #[test]
    fn load_without_a_device_names_the_file() {
        let mut player = detached(PlaybackInfo::default(), 0);
        player.device_error = Some("no default output".to_string());

        let err = player.load(Path::new("/music/a.flac")).unwrap_err();
        assert!(err.is_load_failure());
        assert!(err.to_string().contains("/music/a.flac"));
        assert!(err.to_string().contains("no audio output device"));
        assert_eq!(player.generation, 0);
    }
}
