use std::env;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Notice};
use crate::audio::{AudioPlayer, PlaybackEngine};
use crate::config;
use crate::library::LoftyReader;
use crate::mpris::ControlCmd;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_problem) = settings::load_settings();
    let _log_guard = logging::init_logging(&settings.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cadenza starting");

    let audio_player = AudioPlayer::new();
    let mut app = App::new(audio_player, Box::new(LoftyReader), &settings);

    preload(&mut app, &settings, env::args_os().skip(1).map(PathBuf::from).collect());

    // Later notices replace earlier ones, so the most fundamental goes last.
    if let Some(problem) = settings_problem {
        tracing::warn!("{problem}");
        app.notice = Some(Notice::warning("Config", problem));
    }
    if let Some(e) = app.engine().device_error() {
        app.notice = Some(Notice::error(
            "No audio device",
            format!("Playback is unavailable: {e}"),
        ));
    }

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());
    mpris_sync::update_mpris(&mpris, &app);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &mpris,
        &control_tx,
        &control_rx,
        &mut state,
    );

    app.engine()
        .quit_softly(Duration::from_millis(settings.audio.quit_fade_out_ms));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &run_result {
        tracing::error!(error = %e, "event loop failed");
    }
    tracing::info!("cadenza exiting");
    run_result
}

/// Add the command-line paths, or the configured autoload folder when none
/// were given.
fn preload<E: PlaybackEngine>(app: &mut App<E>, settings: &config::Settings, paths: Vec<PathBuf>) {
    if paths.is_empty() {
        if let Some(dir) = &settings.library.autoload_dir {
            app.add_path(dir);
        }
        return;
    }
    for path in &paths {
        app.add_path(path);
    }
}
