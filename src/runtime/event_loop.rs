use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, InputMode, PlaybackState, Transport};
use crate::audio::PlaybackEngine;
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::sync_mpris;
use crate::ui;

const POLL: Duration = Duration::from_millis(50);

/// Whether the loop should keep going after handling an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Transport as last pushed to MPRIS.
    last_mpris: Option<Transport>,
}

/// Main terminal event loop: handles input, drawing, track-end detection and
/// MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run<E: PlaybackEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<E>,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if let Some(t) = app.poll_engine() {
            tracing::debug!(?t, "track ended");
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app) == Flow::Quit {
                return Ok(());
            }
        }

        // Covers media keys and auto-advance as well as local keys.
        sync_mpris(mpris, app, &mut state.last_mpris);

        terminal.draw(|f| ui::draw(f, app, settings))?;

        if event::poll(POLL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, control_tx, state) == Flow::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

pub fn handle_control_cmd<E: PlaybackEngine>(cmd: ControlCmd, app: &mut App<E>) -> Flow {
    tracing::trace!(?cmd, "control command");
    match cmd {
        ControlCmd::Quit => return Flow::Quit,
        ControlCmd::Play => {
            let result = app.play(None);
            app.settle(result);
        }
        ControlCmd::Pause => {
            app.pause();
        }
        ControlCmd::PlayPause => {
            let result = app.toggle_play_pause();
            app.settle(result);
        }
        ControlCmd::Stop => {
            app.stop();
        }
        ControlCmd::Next => {
            let result = app.next();
            app.settle(result);
        }
        ControlCmd::Prev => {
            let result = app.previous();
            app.settle(result);
        }
        ControlCmd::SetVolume(v) => app.set_volume(v as f32),
    }
    Flow::Continue
}

fn send(control_tx: &mpsc::Sender<ControlCmd>, cmd: ControlCmd) {
    if control_tx.send(cmd).is_err() {
        tracing::debug!("control channel closed");
    }
}

pub fn handle_key_event<E: PlaybackEngine>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App<E>,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> Flow {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Flow::Quit;
    }

    if app.input_mode != InputMode::Normal {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.cancel_input(),
            KeyCode::Backspace => app.pop_input_char(),
            KeyCode::Enter => app.submit_input(),
            KeyCode::Char(c) if !c.is_control() => app.push_input_char(c),
            _ => {}
        }
        return Flow::Continue;
    }

    if app.notice.is_some() && matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
        state.pending_gg = false;
        app.dismiss_notice();
        return Flow::Continue;
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Esc => app.metadata_window = false,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Enter => {
            if let Some(index) = app.selected_index() {
                let is_playing_selected = app.status() == PlaybackState::Playing
                    && app.transport.current == Some(index);
                if !is_playing_selected {
                    let result = app.play(Some(index));
                    app.settle(result);
                }
            }
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => send(control_tx, ControlCmd::PlayPause),
        KeyCode::Char('s') => send(control_tx, ControlCmd::Stop),
        KeyCode::Char('l') | KeyCode::Right => send(control_tx, ControlCmd::Next),
        KeyCode::Char('h') | KeyCode::Left => send(control_tx, ControlCmd::Prev),
        KeyCode::Char('L') => {
            app.seek_by(scrub_seconds(settings));
        }
        KeyCode::Char('H') => {
            app.seek_by(-scrub_seconds(settings));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => app.volume_up(),
        KeyCode::Char('-') => app.volume_down(),
        KeyCode::Char('a') => app.begin_input(InputMode::AddFile),
        KeyCode::Char('A') => app.begin_input(InputMode::AddFolder),
        KeyCode::Char('d') | KeyCode::Delete => {
            app.remove_selected();
        }
        KeyCode::Char('C') => app.clear(),
        KeyCode::Char('f') => {
            app.toggle_selected_favourite();
        }
        KeyCode::Tab => app.next_view(),
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('n') => app.begin_input(InputMode::NewPlaylist),
        KeyCode::Char('P') => {
            if app.selected_index().is_some() {
                app.begin_input(InputMode::AddToPlaylist);
            }
        }
        KeyCode::Char('X') => app.delete_current_playlist(),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    Flow::Continue
}

fn scrub_seconds(settings: &config::Settings) -> i64 {
    i64::try_from(settings.controls.scrub_seconds).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{NoticeLevel, View};
    use crate::audio::fake::FakeEngine;
    use crate::library::{TagReader, TrackTags};
    use crate::error::PlayerError;
    use std::path::Path;

    struct NoTags;

    impl TagReader for NoTags {
        fn read(&self, _path: &Path) -> Result<TrackTags, PlayerError> {
            Ok(TrackTags::default())
        }
    }

    struct Harness {
        settings: config::Settings,
        app: App<FakeEngine>,
        tx: mpsc::Sender<ControlCmd>,
        rx: mpsc::Receiver<ControlCmd>,
        state: EventLoopState,
    }

    impl Harness {
        fn new(tracks: &[&str]) -> Self {
            let settings = config::Settings::default();
            let mut app = App::new(FakeEngine::default(), Box::new(NoTags), &settings);
            for t in tracks {
                app.add_file(Path::new(t)).unwrap();
            }
            let (tx, rx) = mpsc::channel();
            Self {
                settings,
                app,
                tx,
                rx,
                state: EventLoopState::default(),
            }
        }

        fn press(&mut self, code: KeyCode) -> Flow {
            let key = KeyEvent::new(code, KeyModifiers::NONE);
            handle_key_event(key, &self.settings, &mut self.app, &self.tx, &mut self.state)
        }

        fn type_str(&mut self, s: &str) {
            for c in s.chars() {
                self.press(KeyCode::Char(c));
            }
        }

        /// Feed queued control commands back in, as the loop does.
        fn drain(&mut self) {
            while let Ok(cmd) = self.rx.try_recv() {
                handle_control_cmd(cmd, &mut self.app);
            }
        }
    }

    #[test]
    fn quit_keys() {
        let mut h = Harness::new(&[]);
        assert_eq!(h.press(KeyCode::Char('q')), Flow::Quit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(
            handle_key_event(ctrl_c, &h.settings, &mut h.app, &h.tx, &mut h.state),
            Flow::Quit
        );
        assert_eq!(handle_control_cmd(ControlCmd::Quit, &mut h.app), Flow::Quit);
    }

    #[test]
    fn navigation_and_gg() {
        let mut h = Harness::new(&["a.mp3", "b.mp3", "c.mp3"]);
        h.press(KeyCode::Char('G'));
        assert_eq!(h.app.selected, 2);
        h.press(KeyCode::Char('g'));
        assert_eq!(h.app.selected, 2);
        h.press(KeyCode::Char('g'));
        assert_eq!(h.app.selected, 0);

        h.press(KeyCode::Char('j'));
        h.press(KeyCode::Char('j'));
        h.press(KeyCode::Char('k'));
        assert_eq!(h.app.selected, 1);

        // A different key in between cancels the pending `g`.
        h.press(KeyCode::Char('g'));
        h.press(KeyCode::Char('j'));
        h.press(KeyCode::Char('g'));
        assert_eq!(h.app.selected, 2);
    }

    #[test]
    fn transport_keys_route_through_the_control_channel() {
        let mut h = Harness::new(&["a.mp3", "b.mp3"]);

        h.press(KeyCode::Char(' '));
        h.drain();
        assert_eq!(h.app.status(), PlaybackState::Playing);
        assert_eq!(h.app.transport.current, Some(0));

        h.press(KeyCode::Char('l'));
        h.drain();
        assert_eq!(h.app.transport.current, Some(1));

        h.press(KeyCode::Char('p'));
        h.drain();
        assert_eq!(h.app.status(), PlaybackState::Paused);

        h.press(KeyCode::Char('s'));
        h.drain();
        assert_eq!(h.app.status(), PlaybackState::Stopped);
        assert_eq!(h.app.transport.current, Some(1));
    }

    #[test]
    fn enter_plays_selected_unless_already_playing_it() {
        let mut h = Harness::new(&["a.mp3", "b.mp3"]);
        h.press(KeyCode::Char('j'));
        h.press(KeyCode::Enter);
        assert_eq!(h.app.transport.current, Some(1));
        let loads = h.app.engine().loads().len();

        h.press(KeyCode::Enter);
        assert_eq!(h.app.engine().loads().len(), loads);
    }

    #[test]
    fn volume_and_media_key_volume() {
        let mut h = Harness::new(&[]);
        h.press(KeyCode::Char('+'));
        assert!((h.app.transport.volume - 0.75).abs() < 1e-6);
        h.press(KeyCode::Char('-'));
        h.press(KeyCode::Char('-'));
        assert!((h.app.transport.volume - 0.65).abs() < 1e-6);

        handle_control_cmd(ControlCmd::SetVolume(0.2), &mut h.app);
        assert!((h.app.transport.volume - 0.2).abs() < 1e-6);
    }

    #[test]
    fn add_prompt_collects_a_path_and_esc_cancels() {
        let mut h = Harness::new(&[]);
        h.press(KeyCode::Char('a'));
        assert_eq!(h.app.input_mode, InputMode::AddFile);

        // `q` is text while the prompt is open.
        h.type_str("qx.mp3");
        assert_eq!(h.press(KeyCode::Enter), Flow::Continue);
        assert_eq!(h.app.playlist.len(), 1);
        assert_eq!(h.app.input_mode, InputMode::Normal);

        h.press(KeyCode::Char('A'));
        h.type_str("/music");
        h.press(KeyCode::Esc);
        assert_eq!(h.app.input_mode, InputMode::Normal);
        assert_eq!(h.app.playlist.len(), 1);
    }

    #[test]
    fn notice_is_dismissed_before_other_keys_act() {
        let mut h = Harness::new(&["a.mp3"]);
        h.press(KeyCode::Char('a'));
        h.type_str("notes.txt");
        h.press(KeyCode::Enter);
        assert!(h.app.notice.is_some());

        h.press(KeyCode::Enter);
        assert!(h.app.notice.is_none());
        assert_eq!(h.app.status(), PlaybackState::Stopped);
    }

    #[test]
    fn editing_keys_remove_clear_and_mark() {
        let mut h = Harness::new(&["a.mp3", "b.mp3", "c.mp3"]);
        h.press(KeyCode::Char('f'));
        assert!(h.app.is_favourite(h.app.playlist.get(0).unwrap()));

        h.press(KeyCode::Char('d'));
        assert_eq!(h.app.playlist.len(), 2);

        h.press(KeyCode::Char('K'));
        assert!(h.app.metadata_window);
        h.press(KeyCode::Esc);
        assert!(!h.app.metadata_window);

        h.press(KeyCode::Char('C'));
        assert!(h.app.playlist.is_empty());
    }

    #[test]
    fn playlist_keys_create_fill_switch_and_delete() {
        let mut h = Harness::new(&["a.mp3", "b.mp3"]);
        h.press(KeyCode::Char('n'));
        assert_eq!(h.app.input_mode, InputMode::NewPlaylist);
        h.type_str("gym");
        h.press(KeyCode::Enter);
        h.press(KeyCode::Esc);

        h.press(KeyCode::Char('j'));
        h.press(KeyCode::Char('P'));
        assert_eq!(h.app.input_mode, InputMode::AddToPlaylist);
        h.type_str("gym");
        h.press(KeyCode::Enter);
        h.press(KeyCode::Esc);

        // All -> Favourite -> gym
        h.press(KeyCode::Tab);
        h.press(KeyCode::Tab);
        assert_eq!(h.app.view(), &View::Named("gym".into()));
        assert_eq!(h.app.rows(), vec![1]);

        h.press(KeyCode::Enter);
        assert_eq!(h.app.transport.current, Some(1));

        h.press(KeyCode::Char('X'));
        assert_eq!(h.app.view(), &View::All);
        h.press(KeyCode::Esc);
        h.press(KeyCode::BackTab);
        assert_eq!(h.app.view(), &View::Favourite);
    }

    #[test]
    fn built_in_view_cannot_be_deleted_from_the_keyboard() {
        let mut h = Harness::new(&["a.mp3"]);
        h.press(KeyCode::Char('X'));
        assert_eq!(h.app.view(), &View::All);
        assert_eq!(
            h.app.notice.as_ref().map(|n| n.level),
            Some(NoticeLevel::Warning)
        );
    }

    #[test]
    fn scrub_keys_seek_the_current_track() {
        let mut h = Harness::new(&["a.mp3"]);
        h.press(KeyCode::Enter);
        h.app.engine_mut().position = Duration::from_secs(20);

        h.press(KeyCode::Char('H'));
        assert_eq!(h.app.engine().position, Duration::from_secs(15));
        h.press(KeyCode::Char('L'));
        assert_eq!(h.app.engine().position, Duration::from_secs(20));
    }
}
