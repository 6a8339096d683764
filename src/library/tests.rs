use super::catalog::parse_catalog;
use super::*;
use crate::config::TrackDisplayField;

fn track(duration: &str) -> Track {
    Track {
        id: "1".into(),
        name: "Song".into(),
        desc: String::new(),
        user: None,
        source: "https://cdn.example.com/song.mp3".into(),
        image: None,
        duration: duration.into(),
        display: String::new(),
    }
}

#[test]
fn duration_hint_parses_common_forms() {
    assert_eq!(track("3:45").duration_hint(), Some(225));
    assert_eq!(track("1:02:03").duration_hint(), Some(3723));
    assert_eq!(track("90").duration_hint(), Some(90));
    assert_eq!(track(" 0:07 ").duration_hint(), Some(7));
    assert_eq!(track("").duration_hint(), None);
    assert_eq!(track("3:75").duration_hint(), None);
    assert_eq!(track("abc").duration_hint(), None);
    assert_eq!(track("1:1:1:1").duration_hint(), None);
}

#[test]
fn parse_catalog_accepts_song_envelope_with_rest_field_names() {
    let raw = r#"{
        "success": true,
        "songs": [
            {"_id": "a1", "name": "Intro", "desc": "Band", "user": "u1",
             "file": "https://res.example.com/intro.mp3", "image": "https://img/1.jpg",
             "duration": "2:10"},
            {"_id": "b2", "name": "Live", "desc": "Band",
             "file": "https://www.youtube.com/watch?v=dQw4w9WgXcQ", "duration": "3:33"}
        ]
    }"#;

    let tracks = parse_catalog(raw, &LibrarySettings::default()).unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "a1");
    assert_eq!(tracks[0].source, "https://res.example.com/intro.mp3");
    assert_eq!(tracks[0].user.as_deref(), Some("u1"));
    assert_eq!(tracks[1].image, None);
    assert_eq!(tracks[0].display, "Band - Intro");
}

#[test]
fn parse_catalog_accepts_bare_list_and_drops_duplicate_ids() {
    let raw = r#"[
        {"id": "x", "name": "First", "source": "/music/first.mp3"},
        {"id": "x", "name": "Second", "source": "/music/second.mp3"},
        {"id": "y", "name": "Third", "source": "/music/third.mp3"}
    ]"#;

    let settings = LibrarySettings {
        display_fields: vec![TrackDisplayField::Name, TrackDisplayField::Duration],
        display_separator: " | ".into(),
        ..LibrarySettings::default()
    };
    let tracks = parse_catalog(raw, &settings).unwrap();
    let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Third"]);
    // Empty duration is skipped rather than leaving a dangling separator.
    assert_eq!(tracks[0].display, "First");
}

#[test]
fn parse_catalog_rejects_garbage() {
    assert!(parse_catalog("{\"nope\": 1}", &LibrarySettings::default()).is_err());
}

#[test]
fn load_library_reads_catalog_file_and_reports_missing_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("songs.json");
    std::fs::write(
        &path,
        r#"[{"_id": "1", "name": "One", "file": "/m/one.mp3"}]"#,
    )
    .unwrap();

    let tracks = load_library(&path, &LibrarySettings::default()).unwrap();
    assert_eq!(tracks.len(), 1);

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        load_library(&missing, &LibrarySettings::default()),
        Err(crate::error::Error::Catalog(_))
    ));
}
