use super::*;
use crate::library::Track;
use crate::player::{PlaybackInfo, TransportStatus};

fn t(label: &str) -> Track {
    Track {
        id: label.to_lowercase(),
        name: label.into(),
        desc: String::new(),
        user: None,
        source: format!("/music/{label}.mp3"),
        image: None,
        duration: String::new(),
        display: label.into(),
    }
}

fn playing(index: usize) -> PlaybackInfo {
    PlaybackInfo {
        index: Some(index),
        status: TransportStatus::Playing,
        ..PlaybackInfo::default()
    }
}

#[test]
fn fuzzy_match_is_ordered_subsequence() {
    assert_eq!(fuzzy_match_positions("Hello World", "hw"), Some(vec![0, 6]));
    assert!(fuzzy_match_positions("Hello World", "ello").is_some());
    assert!(fuzzy_match_positions("Hello World", "wh").is_none());
    assert_eq!(fuzzy_match_positions("anything", ""), Some(vec![]));
}

#[test]
fn visible_indices_use_fuzzy_filter() {
    let mut app = App::new(vec![
        t("Metallica - Blackened"),
        t("Black Sabbath - Paranoid"),
    ]);
    app.filter_query = "mtbk".into();
    assert_eq!(app.visible_indices(), vec![0]);

    app.filter_query = "   ".into();
    assert_eq!(app.visible_indices(), vec![0, 1]);
}

#[test]
fn large_libraries_filter_the_same_way() {
    let tracks: Vec<Track> = (0..150).map(|i| t(&format!("Song {i:03}"))).collect();
    let mut app = App::new(tracks);
    app.filter_query = "SONG 14".into();
    let visible = app.visible_indices();
    assert_eq!(visible.first(), Some(&14));
    assert!(visible.contains(&140));
    assert_eq!(app.match_positions(14, "14"), Some(vec![6, 7]));
}

#[test]
fn filtering_moves_cursor_into_view() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.set_cursor(0);
    app.enter_filter_mode();
    assert!(!app.follow_playback);

    for c in "bet".chars() {
        app.push_filter_char(c);
    }
    assert_eq!(app.cursor, 1);

    app.clear_filter();
    assert!(!app.filter_mode);
    assert_eq!(app.visible_indices(), vec![0, 1, 2]);
}

#[test]
fn cursor_wraps_within_view() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.cursor_up();
    assert_eq!(app.cursor, 2);
    app.cursor_down();
    assert_eq!(app.cursor, 0);

    app.filter_query = "et".into();
    assert_eq!(app.step_from(0, true), Some(1));
    assert_eq!(app.step_from(1, false), Some(1));

    app.filter_query = "zzz".into();
    assert_eq!(app.step_from(0, true), None);
}

#[test]
fn cursor_first_and_last() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.cursor_last();
    assert_eq!(app.cursor, 2);
    app.cursor_first();
    assert_eq!(app.cursor, 0);
}

#[test]
fn cursor_follows_playback() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.sync_with_playback(&playing(2));
    assert_eq!(app.cursor, 2);

    app.follow_playback_off();
    app.sync_with_playback(&playing(0));
    assert_eq!(app.cursor, 2);
}

#[test]
fn pending_follow_waits_for_started_track() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.set_cursor(1);
    app.follow_after_start(1);

    // The previous track is still reported; the cursor must not jump back.
    app.sync_with_playback(&playing(0));
    assert_eq!(app.cursor, 1);
    assert_eq!(app.pending_follow, Some(1));

    app.sync_with_playback(&playing(1));
    assert_eq!(app.pending_follow, None);
    app.sync_with_playback(&playing(2));
    assert_eq!(app.cursor, 2);
}

#[test]
fn metadata_window_toggles() {
    let mut app = App::new(vec![t("Alpha")]);
    assert!(!app.metadata_window);
    app.toggle_metadata_window();
    assert!(app.metadata_window);
    assert_eq!(app.cursor_track().map(|t| t.id.as_str()), Some("alpha"));
}
