use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::sink::{create_sink_at, open_source};
use super::types::{AudioCmd, FileSource, PlaybackHandle};

/// How often the thread publishes elapsed time and checks for track end.
const TICK: Duration = Duration::from_millis(100);

/// Everything the audio thread knows about the loaded track.
struct Deck {
    path: Option<PathBuf>,
    sink: Option<Sink>,
    paused: bool,
    /// Start position of the current sink within the file (after a seek).
    offset: Duration,
    volume: f32,
    /// Load counter echoed back so stale "finished" flags can be told apart.
    generation: u64,
}

impl Deck {
    fn new() -> Self {
        Self {
            path: None,
            sink: None,
            paused: true,
            offset: Duration::ZERO,
            volume: 1.0,
            generation: 0,
        }
    }

    fn elapsed(&self) -> Duration {
        self.sink
            .as_ref()
            .map_or(Duration::ZERO, |s| self.offset + s.get_pos())
    }

    fn load(
        &mut self,
        stream: &OutputStream,
        path: PathBuf,
        source: FileSource,
        generation: u64,
    ) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.sink = Some(create_sink_at(stream, source, Duration::ZERO, self.volume));
        self.path = Some(path);
        self.paused = true;
        self.offset = Duration::ZERO;
        self.generation = generation;
    }

    fn play(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.play();
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
            self.paused = true;
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.path = None;
        self.paused = true;
        self.offset = Duration::ZERO;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(volume);
        }
    }

    /// Rebuild the sink from the file and skip into it.
    fn seek(&mut self, stream: &OutputStream, target: Duration) {
        let Some(path) = self.path.clone() else {
            return;
        };
        let source = match open_source(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(error = %e, "seek failed, keeping current position");
                return;
            }
        };

        if let Some(old) = self.sink.take() {
            old.stop();
        }
        let sink = create_sink_at(stream, source, target, self.volume);
        if !self.paused {
            sink.play();
        }
        self.sink = Some(sink);
        self.offset = target;
    }

    fn fade_out(&self, fade_out_ms: u64) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if fade_out_ms == 0 || self.paused {
            sink.set_volume(0.0);
            return;
        }
        let steps: u64 = 20;
        let step_ms = (fade_out_ms / steps).max(1);
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            sink.set_volume(self.volume * (1.0 - t));
            thread::sleep(Duration::from_millis(step_ms));
        }
        sink.set_volume(0.0);
    }

    fn publish(&self, playback_info: &PlaybackHandle) {
        let ran_out = !self.paused && self.sink.as_ref().is_some_and(Sink::empty);
        if let Ok(mut info) = playback_info.lock() {
            info.loaded = self.sink.is_some();
            info.elapsed = self.elapsed();
            info.finished = ran_out;
            info.generation = self.generation;
        }
    }
}

/// Spawn the thread that owns the output stream. `ready` receives the result
/// of opening the default output device.
pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
    ready: Sender<Result<(), String>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => {
                let _ = ready.send(Ok(()));
                stream
            }
            Err(e) => {
                tracing::error!(error = %e, "no audio output device");
                let _ = ready.send(Err(e.to_string()));
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let mut deck = Deck::new();

        loop {
            match rx.recv_timeout(TICK) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load {
                        path,
                        source,
                        generation,
                    } => {
                        tracing::debug!(path = %path.display(), generation, "loading track");
                        deck.load(&stream, path, source, generation);
                    }
                    AudioCmd::Play => deck.play(),
                    AudioCmd::Pause => deck.pause(),
                    AudioCmd::Stop => deck.stop(),
                    AudioCmd::SetVolume(v) => deck.set_volume(v),
                    AudioCmd::SeekTo(target) => deck.seek(&stream, target),
                    AudioCmd::Quit { fade_out_ms } => {
                        deck.fade_out(fade_out_ms);
                        deck.stop();
                        deck.publish(&playback_info);
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            deck.publish(&playback_info);
        }
        tracing::debug!("audio thread exiting");
    })
}
