//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Tabs, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, InputMode, NoticeLevel, PlaybackState, Progress, View};
use crate::audio::PlaybackEngine;
use crate::config::{BoundaryPolicy, Settings, TimeField, TrackDisplayField, UiSettings};
use crate::library::Track;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected song");
    map.insert("space/p", "play/pause");
    map.insert("s", "stop");
    map.insert("h/l", "prev/next song");
    // H/L is filled dynamically from config.
    map.insert("+/-", "volume");
    map.insert("a/A", "add file/folder");
    map.insert("d", "remove");
    map.insert("C", "clear");
    map.insert("f", "favourite");
    map.insert("tab", "switch view");
    map.insert("n/P/X", "new/add to/delete playlist");
    map.insert("K", "metadata");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "s", "+/-", "gg/G", "a/A", "d", "C", "f", "tab",
        "n/P/X", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    let non_blank = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(String::from);

    let parts: Vec<String> = ui
        .now_playing_track_fields
        .iter()
        .filter_map(|f| match f {
            TrackDisplayField::Display => non_blank(Some(track.display.as_str())),
            TrackDisplayField::Title => non_blank(Some(track.title.as_str())),
            TrackDisplayField::Artist => non_blank(track.artist.as_deref()),
            TrackDisplayField::Album => non_blank(track.album.as_deref()),
            TrackDisplayField::Filename => non_blank(track.path.file_stem().and_then(|s| s.to_str())),
            TrackDisplayField::Path => Some(track.path.display().to_string()),
        })
        .collect();

    if parts.is_empty() {
        track.display.clone()
    } else {
        parts.join(&ui.now_playing_track_separator)
    }
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(progress: &Progress, ui: &UiSettings) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(progress.elapsed)),
            TimeField::Total => progress.total.map(format_mmss),
            TimeField::Remaining => progress.remaining().map(|r| format!("-{}", format_mmss(r))),
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(3);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

/// Rows `[start, end)` of a `total`-long list to show in `height` rows so the
/// cursor stays near the middle, plus the cursor's row within that window.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    let selected = selected.min(total.saturating_sub(1));
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let start = selected.saturating_sub(half).min(total - height);
    (start, start + height, selected - start)
}

fn status_word(status: PlaybackState) -> &'static str {
    match status {
        PlaybackState::Stopped => "Stopped",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
    }
}

fn boundary_text(boundary: BoundaryPolicy) -> &'static str {
    match boundary {
        BoundaryPolicy::Wrap => "AT END: Loop-around",
        BoundaryPolicy::Stop => "AT END: Stop",
    }
}

fn status_text<E: PlaybackEngine>(app: &App<E>, progress: &Progress, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = vec![
        format!(" {}", status_word(app.status()).to_uppercase()),
        format!("VOLUME: {:.0}%", app.transport.volume * 100.0),
        boundary_text(app.boundary()).to_string(),
        format!("TRACKS: {}", app.playlist.len()),
    ];

    if let Some(track) = app.current_track() {
        let song = now_playing_track_text(track, ui);
        match now_playing_time_text(progress, ui) {
            Some(time) => parts.push(format!("Song: {} [{}]", song, time)),
            None => parts.push(format!("Song: {}", song)),
        }
    }

    parts.join(" • ")
}

fn playlist_line<E: PlaybackEngine>(app: &App<E>, index: usize, track: &Track) -> String {
    let marker = match (app.transport.current == Some(index), app.status()) {
        (true, PlaybackState::Playing) => "▶ ",
        (true, PlaybackState::Paused) => "⏸ ",
        (true, PlaybackState::Stopped) => "■ ",
        (false, _) => "  ",
    };
    let fav = if app.is_favourite(track) { "★ " } else { "" };
    match track.duration {
        Some(d) => format!("{marker}{fav}{} ({})", track.display, format_mmss(d)),
        None => format!("{marker}{fav}{}", track.display),
    }
}

/// Heading for the track list: the view name and the cursor position.
fn list_title(view: &View, selected: usize, total: usize) -> String {
    match (view, total) {
        (View::All, 0) => " All (press a or A to add music) ".to_string(),
        (_, 0) => format!(" {} (empty) ", view.name()),
        _ => format!(" {} ({}/{}) ", view.name(), selected + 1, total),
    }
}

fn padded_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw<E: PlaybackEngine>(frame: &mut Frame, app: &App<E>, settings: &Settings) {
    let ui_settings = &settings.ui;
    let progress = app.progress();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status_par = Paragraph::new(status_text(app, &progress, ui_settings))
        .block(Block::bordered().title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Views: All, Favourite, then named playlists.
    {
        let views = app.views();
        let active = views.iter().position(|v| v == app.view()).unwrap_or(0);
        let tabs = Tabs::new(views.iter().map(|v| v.name().to_string()))
            .block(Block::bordered().title(" playlists (tab switches) "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .select(active);
        frame.render_widget(tabs, chunks[2]);
    }

    // Main list. Only build ListItems for the visible window.
    {
        let rows = app.rows();
        let total = rows.len();
        let list_height = chunks[3].height.saturating_sub(2) as usize;
        let (start, end, selected_pos_in_visible) =
            visible_window(total, list_height, app.selected);

        let visible_items: Vec<ListItem> = rows[start..end]
            .iter()
            .filter_map(|&i| app.playlist.get(i).map(|track| (i, track)))
            .map(|(i, track)| {
                let item = ListItem::new(playlist_line(app, i, track));
                if app.transport.current == Some(i) {
                    item.style(Style::default().add_modifier(Modifier::BOLD))
                } else {
                    item
                }
            })
            .collect();

        let list = List::new(visible_items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(list_title(app.view(), app.selected, total)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    // Progress and volume
    {
        let row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(chunks[4]);

        let label = format!(
            "{} / {}",
            format_mmss(progress.elapsed),
            progress.total.map_or_else(|| "--:--".to_string(), format_mmss)
        );
        let progress_gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" progress "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(progress.ratio())
            .label(label);
        frame.render_widget(progress_gauge, row[0]);

        let volume = f64::from(app.transport.volume).clamp(0.0, 1.0);
        let volume_gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" volume "))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(volume)
            .label(format!("{:.0}%", volume * 100.0));
        frame.render_widget(volume_gauge, row[1]);
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        // Keep the popup inside the list area so it doesn't cover header/status/footer.
        let popup_area = centered_rect_sized(72, 9, chunks[3]);
        frame.render_widget(Clear, popup_area);

        let meta = if let Some(track) = app.selected_track() {
            format!(
                "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nPath: {}",
                track.title,
                track.artist.as_deref().unwrap_or("-"),
                track.album.as_deref().unwrap_or("-"),
                format_duration_mmss_ceil(track.duration),
                track.path.display()
            )
        } else {
            "No track selected".to_string()
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(padded_block(" metadata (K closes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    if let Some(notice) = &app.notice {
        let popup_area = centered_rect_sized(64, 7, chunks[3]);
        frame.render_widget(Clear, popup_area);

        let colour = match notice.level {
            NoticeLevel::Info => Color::Blue,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        let notice_paragraph = Paragraph::new(format!("{}\n\n(esc to dismiss)", notice.message))
            .block(
                padded_block(notice.title.as_str())
                    .border_style(Style::default().fg(colour))
                    .title_alignment(Alignment::Center),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(notice_paragraph, popup_area);
    }

    // The path prompt takes over the footer while it is open.
    let footer = if app.input_mode == InputMode::Normal {
        Paragraph::new(controls_text(settings.controls.scrub_seconds))
            .block(padded_block(" controls "))
            .wrap(Wrap { trim: true })
    } else {
        Paragraph::new(format!("{}{}_", app.input_mode.prompt(), app.input))
            .block(padded_block(" enter confirms, esc cancels "))
            .bold()
    };
    frame.render_widget(footer, chunks[5]);
}
