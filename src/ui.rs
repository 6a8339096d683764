//! Terminal rendering with `ratatui`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{App, fuzzy_match_positions};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{Track, display_from_fields};
use crate::player::{LoopMode, PlaybackInfo, TimeDisplay, TransportStatus};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("enter", "play selected"),
        ("space/p", "play/pause"),
        ("h/l", "prev/next"),
        ("+/-", "volume"),
        ("/", "filter"),
        ("r", "loop mode"),
        ("R", "retry"),
        ("K", "metadata"),
        ("q", "quit"),
    ])
});

fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "+/-", "gg/G", "K", "/", "r", "R", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{scrub_seconds}s"))
            } else {
                CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

fn now_playing_time_text(info: &PlaybackInfo, ui: &UiSettings) -> Option<String> {
    let time = TimeDisplay::sample(
        Some(info.elapsed.as_secs_f64()),
        info.total.map(|t| t.as_secs_f64()),
    )?;
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(time.elapsed_clock().to_string()),
            TimeField::Total => time.total_clock().map(|c| c.to_string()),
            TimeField::Remaining => time.remaining_clock().map(|c| format!("-{c}")),
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

fn status_text(info: &PlaybackInfo) -> String {
    match info.status {
        TransportStatus::Suspended(err) => format!("Unplayable ({err}) - R retries"),
        TransportStatus::Playing => "Playing".to_string(),
        TransportStatus::Ready => "Paused".to_string(),
        TransportStatus::Idle => "Stopped".to_string(),
    }
}

fn loop_text(mode: LoopMode) -> &'static str {
    match mode {
        LoopMode::NoLoop => "PLAYBACK: No-loop",
        LoopMode::LoopAll => "PLAYBACK: Loop-around",
        LoopMode::LoopOne => "PLAYBACK: Repeat-one",
    }
}

fn status_line(app: &App, info: &PlaybackInfo, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(if app.follow_playback {
        " CURSOR: Follow".to_string()
    } else {
        " CURSOR: Free-roam".to_string()
    });
    parts.push(loop_text(info.loop_mode).to_string());

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        parts.push(format!("FILTER: {q}").trim_end().to_string());
    }

    match info.index.and_then(|i| app.tracks.get(i)) {
        Some(track) => {
            let song = display_from_fields(
                track,
                &ui.now_playing_track_fields,
                &ui.now_playing_track_separator,
            );
            match now_playing_time_text(info, ui) {
                Some(time) => parts.push(format!("Song: {song} [{time}]")),
                None => parts.push(format!("Song: {song}")),
            }
            if let Some(kind) = info.adapter {
                parts.push(format!("{} {kind}", status_text(info)));
            } else {
                parts.push(status_text(info));
            }
        }
        None => parts.push(status_text(info)),
    }

    parts.push(format!("Vol: {:.0}%", info.volume * 100.0));

    if let Some(notice) = &info.notice {
        parts.push(format!("Note: {notice}"));
    }

    if let Some(label) = &app.source_label {
        parts.push(format!("Source: {label}"));
    }

    parts.join(" • ")
}

fn centered_rect_sized(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width.saturating_sub(2)).max(10);
    let height = height.min(r.height.saturating_sub(2)).max(5);
    Rect {
        x: r.x + r.width.saturating_sub(width) / 2,
        y: r.y + r.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

fn metadata_text(track: Option<&Track>) -> String {
    let Some(track) = track else {
        return "No track selected".to_string();
    };
    let or_dash = |s: &str| if s.trim().is_empty() { "-".to_string() } else { s.to_string() };
    format!(
        "Name: {}\nArtist: {}\nUser: {}\nDuration: {}\nSource: {}\nImage: {}",
        track.name,
        or_dash(&track.desc),
        track.user.as_deref().unwrap_or("-"),
        or_dash(&track.duration),
        track.source,
        track.image.as_deref().unwrap_or("-"),
    )
}

/// Uppercase the characters of `label` that matched the filter.
fn highlight_matches(label: &str, positions: Vec<usize>) -> String {
    let mut positions = positions.into_iter().peekable();
    let mut rendered = String::with_capacity(label.len());
    for (ci, ch) in label.chars().enumerate() {
        if positions.peek() == Some(&ci) {
            positions.next();
            rendered.extend(ch.to_uppercase());
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

/// Render the whole UI.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    info: &PlaybackInfo,
    visible: &[usize],
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" legato ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let padded = Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    };

    let mut status = Paragraph::new(status_line(app, info, ui_settings))
        .block(Block::bordered().padding(padded).title(" status "))
        .wrap(Wrap { trim: true });
    if info.playing() {
        status = status.slow_blink();
    }
    frame.render_widget(status, chunks[1]);

    // Track list, windowed around the cursor.
    {
        let query = app.filter_query.trim();
        let total = visible.len();
        let height = chunks[2].height as usize;
        let cursor_pos = visible.iter().position(|&i| i == app.cursor).unwrap_or(0);
        let (start, end) = if total <= height || height == 0 {
            (0, total)
        } else {
            let start = cursor_pos.saturating_sub(height / 2).min(total - height);
            (start, start + height)
        };

        let items: Vec<ListItem> = visible[start..end]
            .iter()
            .map(|&i| {
                let track = &app.tracks[i];
                let mut label = if query.is_empty() {
                    track.display.clone()
                } else {
                    match app.match_positions(i, query) {
                        Some(positions) => highlight_matches(&track.display, positions),
                        None => track.display.clone(),
                    }
                };
                if info.index == Some(i) {
                    if let TransportStatus::Suspended(_) = info.status {
                        label.push_str("  [unplayable]");
                    }
                }
                ListItem::new(label)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" tracks "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(cursor_pos - start));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    if app.metadata_window {
        let popup = centered_rect_sized(72, 9, chunks[2]);
        frame.render_widget(Clear, popup);
        let meta = Paragraph::new(metadata_text(app.cursor_track()))
            .block(
                Block::default()
                    .padding(padded)
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup);
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(padded),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapter::AdapterKind;
    use crate::error::PlaybackError;

    fn info(status: TransportStatus) -> PlaybackInfo {
        PlaybackInfo {
            index: Some(0),
            status,
            adapter: Some(AdapterKind::InlineAudio),
            elapsed: Duration::from_secs(75),
            total: Some(Duration::from_secs(240)),
            ..PlaybackInfo::default()
        }
    }

    #[test]
    fn time_text_follows_configured_fields() {
        let ui = UiSettings::default();
        assert_eq!(
            now_playing_time_text(&info(TransportStatus::Playing), &ui).as_deref(),
            Some("1:15 / 4:00 / -2:45")
        );

        let mut unknown_total = info(TransportStatus::Playing);
        unknown_total.total = None;
        assert_eq!(
            now_playing_time_text(&unknown_total, &ui).as_deref(),
            Some("1:15")
        );

        let ui = UiSettings {
            now_playing_time_fields: Vec::new(),
            ..UiSettings::default()
        };
        assert_eq!(now_playing_time_text(&info(TransportStatus::Playing), &ui), None);
    }

    #[test]
    fn suspended_status_is_marked_unplayable() {
        let text = status_text(&info(TransportStatus::Suspended(
            PlaybackError::EmbedNotPermitted,
        )));
        assert!(text.starts_with("Unplayable"));
        assert!(text.contains("embedding is not permitted"));
    }

    #[test]
    fn status_line_shows_song_and_volume() {
        let app = App::new(vec![crate::testing::track("a", "/music/a.mp3")]);
        let line = status_line(&app, &info(TransportStatus::Playing), &UiSettings::default());
        assert!(line.contains("Song: Artist - Track a [1:15 / 4:00 / -2:45]"));
        assert!(line.contains("Playing audio"));
        assert!(line.contains("Vol: 100%"));
        assert!(!line.contains("Note:"));

        let mut at_end = info(TransportStatus::Ready);
        at_end.notice = Some("already at the registry boundary".to_string());
        let line = status_line(&app, &at_end, &UiSettings::default());
        assert!(line.contains("Paused audio"));
        assert!(line.contains("Note: already at the registry boundary"));
    }

    #[test]
    fn highlight_uppercases_matched_chars() {
        let positions = fuzzy_match_positions("hello world", "hw").unwrap();
        assert_eq!(highlight_matches("hello world", positions), "Hello World");
    }

    #[test]
    fn controls_text_includes_scrub_seconds() {
        let text = controls_text(7);
        assert!(text.contains("[H/L] scrub -/+7s"));
        assert!(text.starts_with("[j/k] up/down"));
    }
}
