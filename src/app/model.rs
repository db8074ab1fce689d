//! The playlist/transport controller.
//!
//! `App` owns the playlist, the transport state and the playback engine. The
//! UI and runtime call into it; it never reaches back out except through the
//! engine and the notice it leaves for the next redraw.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::PlaybackEngine;
use crate::config::{BoundaryPolicy, LibrarySettings, Settings};
use crate::error::PlayerError;
use crate::library::{Playlist, TagReader, Track, build_track, enumerate_folder, is_audio_file};

use super::notice::{InputMode, Notice};
use super::playlists::{Playlists, View};
use super::transport::{self, Direction, PlaybackState, Transition, Transport, clamp_volume};

/// Result of a successful `add_file`.
#[derive(Debug)]
pub struct AddedTrack {
    pub index: usize,
    /// Tags could not be read; the track was added with file-name fallbacks.
    pub warning: Option<PlayerError>,
}

/// Result of `add_folder`. Failures never abort the batch.
#[derive(Debug, Default)]
pub struct FolderReport {
    pub added: usize,
    pub failures: Vec<PlayerError>,
}

/// Elapsed and total time of the current track.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Progress {
    pub elapsed: Duration,
    pub total: Option<Duration>,
}

impl Progress {
    /// Fraction played in `0.0..=1.0`; zero when the length is unknown.
    pub fn ratio(&self) -> f64 {
        match self.total {
            Some(total) if !total.is_zero() => {
                (self.elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.total.map(|t| t.saturating_sub(self.elapsed))
    }
}

pub struct App<E: PlaybackEngine> {
    pub playlist: Playlist,
    pub transport: Transport,
    /// Cursor row in the active view.
    pub selected: usize,
    pub notice: Option<Notice>,
    pub input_mode: InputMode,
    pub input: String,
    pub metadata_window: bool,

    favourites: HashSet<PathBuf>,
    playlists: Playlists,
    view: View,
    engine: E,
    reader: Box<dyn TagReader>,
    library: LibrarySettings,
    boundary: BoundaryPolicy,
    volume_step: f32,
}

impl<E: PlaybackEngine> App<E> {
    pub fn new(engine: E, reader: Box<dyn TagReader>, settings: &Settings) -> Self {
        let mut app = Self {
            playlist: Playlist::new(),
            transport: Transport::new(settings.audio.initial_volume),
            selected: 0,
            notice: None,
            input_mode: InputMode::Normal,
            input: String::new(),
            metadata_window: false,

            favourites: HashSet::new(),
            playlists: Playlists::default(),
            view: View::All,
            engine,
            reader,
            library: settings.library.clone(),
            boundary: settings.playback.boundary,
            volume_step: settings.controls.volume_step,
        };
        app.engine.set_volume(app.transport.volume);
        app
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    pub fn status(&self) -> PlaybackState {
        self.transport.status
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.transport.current.and_then(|i| self.playlist.get(i))
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Library indices shown by the active view, in display order.
    pub fn rows(&self) -> Vec<usize> {
        match &self.view {
            View::All => (0..self.playlist.len()).collect(),
            View::Favourite => self
                .playlist
                .iter()
                .enumerate()
                .filter(|(_, t)| self.favourites.contains(&t.path))
                .map(|(i, _)| i)
                .collect(),
            View::Named(name) => self
                .playlists
                .get(name)
                .unwrap_or_default()
                .iter()
                .filter_map(|p| self.playlist.position_of(p))
                .collect(),
        }
    }

    /// Library index under the cursor.
    pub fn selected_index(&self) -> Option<usize> {
        self.rows().get(self.selected).copied()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.selected_index().and_then(|i| self.playlist.get(i))
    }

    fn row_of(&self, index: usize) -> Option<usize> {
        self.rows().iter().position(|&r| r == index)
    }

    /// Append one file. Only the extension is checked here; a missing or
    /// undecodable file is reported when it is played.
    pub fn add_file(&mut self, path: &Path) -> Result<AddedTrack, PlayerError> {
        if !is_audio_file(path, &self.library) {
            return Err(PlayerError::unsupported(path));
        }
        let (track, warning) = build_track(path, self.reader.as_ref(), &self.library);
        let index = self.playlist.push(track);
        tracing::debug!(index, path = %path.display(), "added track");
        Ok(AddedTrack { index, warning })
    }

    /// Append every supported file under `dir`.
    pub fn add_folder(&mut self, dir: &Path) -> Result<FolderReport, PlayerError> {
        let files = enumerate_folder(dir, &self.library)?;
        let mut report = FolderReport::default();
        for file in files {
            match self.add_file(&file) {
                Ok(added) => {
                    report.added += 1;
                    report.failures.extend(added.warning);
                }
                Err(e) => report.failures.push(e),
            }
        }
        tracing::info!(
            dir = %dir.display(),
            added = report.added,
            failures = report.failures.len(),
            "added folder"
        );
        Ok(report)
    }

    /// Add a file or a folder, leaving the outcome in `notice`.
    pub fn add_path(&mut self, path: &Path) {
        if path.is_dir() {
            self.add_folder_reported(path);
        } else {
            self.add_file_reported(path);
        }
    }

    fn add_file_reported(&mut self, path: &Path) {
        match self.add_file(path) {
            Ok(added) => {
                if let Some(row) = self.row_of(added.index) {
                    self.selected = row;
                }
                if let Some(w) = added.warning {
                    self.report(&w);
                }
            }
            Err(e) => self.report(&e),
        }
    }

    fn add_folder_reported(&mut self, dir: &Path) {
        let report = match self.add_folder(dir) {
            Ok(report) => report,
            Err(e) => return self.report(&e),
        };
        for failure in &report.failures {
            tracing::warn!(error = %failure, "while adding folder");
        }

        if report.added == 0 {
            self.notice = Some(Notice::warning(
                "Add folder",
                format!("No audio files found in {}", dir.display()),
            ));
            return;
        }

        let mut message = format!(
            "Added {} song{} from {}",
            report.added,
            if report.added == 1 { "" } else { "s" },
            dir.display()
        );
        if !report.failures.is_empty() {
            message.push_str(&format!(
                " ({} with unreadable tags)",
                report.failures.len()
            ));
        }
        self.notice = Some(Notice::info("Add folder", message));
    }

    /// Remove the entry at `index`. Removing the current track stops playback.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        let removed = self.playlist.remove(index)?;

        match self.transport.current {
            Some(cur) if cur == index => {
                self.engine.stop();
                self.transport.current = None;
                self.transport.status = PlaybackState::Stopped;
            }
            Some(cur) if cur > index => self.transport.current = Some(cur - 1),
            _ => {}
        }

        if !self.playlist.contains_path(&removed.path) {
            self.favourites.remove(&removed.path);
            self.playlists.forget(&removed.path);
        }
        self.clamp_selection();
        debug_assert!(self.transport.is_consistent(self.playlist.len()));
        tracing::debug!(index, path = %removed.path.display(), "removed track");
        Some(removed)
    }

    /// Take the selected row out of the active view. Under `All` the track
    /// leaves the library; under any other view it only leaves that view.
    pub fn remove_selected(&mut self) -> bool {
        let Some(index) = self.selected_index() else {
            return false;
        };
        match self.view.clone() {
            View::All => self.remove(index).is_some(),
            View::Favourite => self.toggle_favourite(index) == Some(false),
            View::Named(name) => match self.remove_from_playlist(index, &name) {
                Ok(removed) => removed,
                Err(e) => {
                    self.report(&e);
                    false
                }
            },
        }
    }

    /// Empty the library and stop. Volume and playlist names are kept.
    pub fn clear(&mut self) {
        self.engine.stop();
        self.playlist.clear();
        self.favourites.clear();
        self.playlists.empty_all();
        self.transport.current = None;
        self.transport.status = PlaybackState::Stopped;
        self.selected = 0;
        self.metadata_window = false;
    }

    /// Play the track at `index`, or resume/start when `index` is `None`.
    pub fn play(&mut self, index: Option<usize>) -> Result<Transition, PlayerError> {
        match index {
            Some(i) if i >= self.playlist.len() => Ok(Transition::Unchanged),
            Some(i) => self.start_track(i),
            None if self.playlist.is_empty() => Ok(Transition::Unchanged),
            None => match self.transport.status {
                PlaybackState::Playing => Ok(Transition::Unchanged),
                PlaybackState::Paused => {
                    self.engine.play();
                    self.transport.status = PlaybackState::Playing;
                    Ok(Transition::Resumed)
                }
                PlaybackState::Stopped => {
                    match self.transport.current.or_else(|| self.rows().first().copied()) {
                        Some(i) => self.start_track(i),
                        None => Ok(Transition::Unchanged),
                    }
                }
            },
        }
    }

    pub fn pause(&mut self) -> Transition {
        if self.transport.status != PlaybackState::Playing {
            return Transition::Unchanged;
        }
        self.engine.pause();
        self.transport.status = PlaybackState::Paused;
        Transition::Paused
    }

    pub fn toggle_play_pause(&mut self) -> Result<Transition, PlayerError> {
        match self.transport.status {
            PlaybackState::Playing => Ok(self.pause()),
            _ => self.play(None),
        }
    }

    /// Halt playback. `current` is kept so the next play restarts it.
    pub fn stop(&mut self) -> Transition {
        if self.transport.status == PlaybackState::Stopped {
            return Transition::Unchanged;
        }
        self.halt()
    }

    pub fn next(&mut self) -> Result<Transition, PlayerError> {
        self.step(Direction::Forward)
    }

    pub fn previous(&mut self) -> Result<Transition, PlayerError> {
        self.step(Direction::Backward)
    }

    /// The engine finished the current track. Always ends in exactly one of
    /// `Started` or `Stopped`.
    pub fn on_track_end(&mut self) -> Transition {
        if self.playlist.is_empty() {
            return self.halt();
        }
        let result = self.next();
        match self.settle(result) {
            t @ (Transition::Started(_) | Transition::Stopped) => t,
            _ => self.halt(),
        }
    }

    /// Advance when the engine reports the playing track has run out.
    pub fn poll_engine(&mut self) -> Option<Transition> {
        (self.transport.status == PlaybackState::Playing && self.engine.is_finished())
            .then(|| self.on_track_end())
    }

    /// Turn a transport error into a notice; the state is already `Stopped`.
    pub fn settle(&mut self, result: Result<Transition, PlayerError>) -> Transition {
        match result {
            Ok(t) => t,
            Err(e) => {
                self.report(&e);
                Transition::Stopped
            }
        }
    }

    /// Move through the active view. A current track outside the view
    /// restarts from the view's first row.
    fn step(&mut self, dir: Direction) -> Result<Transition, PlayerError> {
        let rows = self.rows();
        let Some(&first) = rows.first() else {
            return Ok(Transition::Unchanged);
        };
        let Some(pos) = self
            .transport
            .current
            .and_then(|c| rows.iter().position(|&r| r == c))
        else {
            return self.start_track(first);
        };
        match transport::step(pos, rows.len(), dir, self.boundary) {
            Some(i) => self.start_track(rows[i]),
            None => Ok(self.halt()),
        }
    }

    fn halt(&mut self) -> Transition {
        self.engine.stop();
        self.transport.status = PlaybackState::Stopped;
        Transition::Stopped
    }

    /// Load and play `index`. On failure `current` still points at the track
    /// and the status is `Stopped`.
    fn start_track(&mut self, index: usize) -> Result<Transition, PlayerError> {
        let Some(path) = self.playlist.get(index).map(|t| t.path.clone()) else {
            return Ok(Transition::Unchanged);
        };
        self.transport.current = Some(index);
        if let Some(row) = self.row_of(index) {
            self.selected = row;
        }

        if let Err(e) = self.engine.load(&path) {
            self.engine.stop();
            self.transport.status = PlaybackState::Stopped;
            return Err(e);
        }
        self.engine.play();
        self.transport.status = PlaybackState::Playing;
        debug_assert!(self.transport.is_consistent(self.playlist.len()));
        tracing::info!(index, path = %path.display(), "playing");
        Ok(Transition::Started(index))
    }

    /// Set the output level, clamped to `0.0..=1.0`. NaN is ignored.
    pub fn set_volume(&mut self, level: f32) {
        if let Some(v) = clamp_volume(level) {
            self.transport.volume = v;
            self.engine.set_volume(v);
        }
    }

    pub fn volume_up(&mut self) {
        self.set_volume(self.transport.volume + self.volume_step);
    }

    pub fn volume_down(&mut self) {
        self.set_volume(self.transport.volume - self.volume_step);
    }

    /// Jump within the current track, clamped to its known length. Returns
    /// false when nothing is loaded.
    pub fn seek(&mut self, position: Duration) -> bool {
        if self.transport.status == PlaybackState::Stopped {
            return false;
        }
        let Some(track) = self.current_track() else {
            return false;
        };
        let target = track.duration.map_or(position, |d| position.min(d));
        self.engine.seek(target);
        true
    }

    /// Scrub by `seconds` relative to the current position.
    pub fn seek_by(&mut self, seconds: i64) -> bool {
        let pos = self.engine.position();
        let delta = Duration::from_secs(seconds.unsigned_abs());
        let target = if seconds < 0 {
            pos.saturating_sub(delta)
        } else {
            pos.saturating_add(delta)
        };
        self.seek(target)
    }

    pub fn progress(&self) -> Progress {
        let total = self.current_track().and_then(|t| t.duration);
        let elapsed = match self.transport.status {
            PlaybackState::Stopped => Duration::ZERO,
            _ => self.engine.position(),
        };
        Progress {
            elapsed: total.map_or(elapsed, |t| elapsed.min(t)),
            total,
        }
    }

    /// Flip the favourite mark of the track at `index`; returns the new mark.
    pub fn toggle_favourite(&mut self, index: usize) -> Option<bool> {
        let path = self.playlist.get(index)?.path.clone();
        let marked = if self.favourites.remove(&path) {
            false
        } else {
            self.favourites.insert(path);
            true
        };
        self.clamp_selection();
        Some(marked)
    }

    pub fn toggle_selected_favourite(&mut self) -> Option<bool> {
        self.toggle_favourite(self.selected_index()?)
    }

    pub fn is_favourite(&self, track: &Track) -> bool {
        self.favourites.contains(&track.path)
    }

    /// Every view in tab order: the built-in ones, then named playlists by
    /// name.
    pub fn views(&self) -> Vec<View> {
        let mut views = vec![View::All, View::Favourite];
        views.extend(self.playlists.names().map(|n| View::Named(n.to_string())));
        views
    }

    /// Show `view`. The cursor lands on the current track when the view
    /// has it.
    pub fn select_view(&mut self, view: View) -> Result<(), PlayerError> {
        if let View::Named(name) = &view {
            if !self.playlists.contains(name) {
                return Err(PlayerError::NoSuchPlaylist(name.clone()));
            }
        }
        self.view = view;
        self.selected = self
            .transport
            .current
            .and_then(|i| self.row_of(i))
            .unwrap_or(0);
        tracing::debug!(view = self.view.name(), "switched view");
        Ok(())
    }

    pub fn next_view(&mut self) {
        self.cycle_view(Direction::Forward);
    }

    pub fn prev_view(&mut self) {
        self.cycle_view(Direction::Backward);
    }

    fn cycle_view(&mut self, dir: Direction) {
        let views = self.views();
        let len = views.len();
        let pos = views.iter().position(|v| *v == self.view).unwrap_or(0);
        let target = match dir {
            Direction::Forward => (pos + 1) % len,
            Direction::Backward => (pos + len - 1) % len,
        };
        if let Some(view) = views.into_iter().nth(target) {
            if let Err(e) = self.select_view(view) {
                self.report(&e);
            }
        }
    }

    /// Create an empty named playlist and return its trimmed name.
    pub fn create_playlist(&mut self, name: &str) -> Result<String, PlayerError> {
        let name = self.playlists.create(name)?;
        tracing::info!(playlist = %name, "created playlist");
        Ok(name)
    }

    /// Delete a named playlist. If the list was showing it, it falls back
    /// to `All`.
    pub fn delete_playlist(&mut self, name: &str) -> Result<(), PlayerError> {
        self.playlists.delete(name)?;
        if matches!(&self.view, View::Named(n) if !self.playlists.contains(n)) {
            self.select_view(View::All)?;
        }
        tracing::info!(playlist = name.trim(), "deleted playlist");
        Ok(())
    }

    /// Put the library track at `index` into a named playlist. Returns
    /// false when the index is out of range or the track is already there.
    pub fn add_to_playlist(&mut self, index: usize, name: &str) -> Result<bool, PlayerError> {
        let Some(path) = self.playlist.get(index).map(|t| t.path.clone()) else {
            return Ok(false);
        };
        self.playlists.add(name, &path)
    }

    pub fn remove_from_playlist(&mut self, index: usize, name: &str) -> Result<bool, PlayerError> {
        let Some(path) = self.playlist.get(index).map(|t| t.path.clone()) else {
            return Ok(false);
        };
        let removed = self.playlists.remove(name, &path)?;
        self.clamp_selection();
        Ok(removed)
    }

    /// Delete the named playlist the list is showing.
    pub fn delete_current_playlist(&mut self) {
        let name = self.view.name().to_string();
        match self.delete_playlist(&name) {
            Ok(()) => self.notice = Some(Notice::info("Playlist", format!("Deleted '{name}'"))),
            Err(e) => self.report(&e),
        }
    }

    fn create_playlist_reported(&mut self, name: &str) {
        match self.create_playlist(name) {
            Ok(name) => self.notice = Some(Notice::info("Playlist", format!("Created '{name}'"))),
            Err(e) => self.report(&e),
        }
    }

    fn add_selected_to_playlist_reported(&mut self, name: &str) {
        let Some(index) = self.selected_index() else {
            return;
        };
        let name = name.trim();
        match self.add_to_playlist(index, name) {
            Ok(true) => self.notice = Some(Notice::info("Playlist", format!("Added to '{name}'"))),
            Ok(false) => {
                self.notice = Some(Notice::info("Playlist", format!("Already in '{name}'")))
            }
            Err(e) => self.report(&e),
        }
    }

    pub fn report(&mut self, err: &PlayerError) {
        tracing::warn!(error = %err, "{}", err.title());
        self.notice = Some(Notice::from(err));
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Move selection to the next row, wrapping to the first.
    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    /// Move selection to the previous row, wrapping to the last.
    pub fn select_prev(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.rows().len().saturating_sub(1));
    }

    pub fn begin_input(&mut self, mode: InputMode) {
        self.input_mode = mode;
        self.input.clear();
    }

    pub fn push_input_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_input_char(&mut self) {
        self.input.pop();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    /// Act on whatever was typed, then leave the prompt.
    pub fn submit_input(&mut self) {
        let mode = std::mem::take(&mut self.input_mode);
        let raw = std::mem::take(&mut self.input);
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match mode {
            InputMode::AddFile => self.add_file_reported(&expand_home(raw)),
            InputMode::AddFolder => self.add_folder_reported(&expand_home(raw)),
            InputMode::NewPlaylist => self.create_playlist_reported(raw),
            InputMode::AddToPlaylist => self.add_selected_to_playlist_reported(raw),
            InputMode::Normal => {}
        }
    }
}

/// Expand a leading `~` to `$HOME`.
pub fn expand_home(raw: &str) -> PathBuf {
    let home = env::var_os("HOME").map(PathBuf::from);
    expand_tilde(raw, home.as_deref())
}

pub fn expand_tilde(raw: &str, home: Option<&Path>) -> PathBuf {
    match (raw, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (_, Some(home)) if raw.starts_with("~/") => home.join(&raw[2..]),
        _ => PathBuf::from(raw),
    }
}
