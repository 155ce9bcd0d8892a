use hbrip::{ScanResult, Selection, SelectionCriteria, Title, Warning};

const SCAN_OUTPUT: &str = "\
libdvdnav: Using dvdnav version 6.1.1
[12:00:01] scan: DVD has 3 title(s)
+ title 1:
  + vts 1, ttn 1, cells 0->0 (1 blocks)
  + duration: 00:03:12
  + size: 720x480, pixel aspect: 8/9, display aspect: 1.33, 29.970 fps
  + audio tracks:
    + 1, English (AC3) (2.0 ch) (iso639-2: eng), 48000Hz, 192000bps
  + subtitle tracks:
+ title 2:
  + vts 2, ttn 1, cells 0->24 (2765213 blocks)
  + duration: 01:52:41
  + chapters:
    + 1: cells 0->1, 184233 blocks, duration 00:05:12
  + audio tracks:
    + 1, English (AC3) (5.1 ch) (iso639-2: eng), 48000Hz, 448000bps
    + 2, Francais (AC3) (5.1 ch) (iso639-2: fra), 48000Hz, 384000bps
    + 3, English (AC3) (Dolby Surround) (iso639-2: eng), 48000Hz, 192000bps
  + subtitle tracks:
    + 1, English (iso639-2: eng) (Bitmap)(VOBSUB)
    + 2, Francais (iso639-2: fra) (Bitmap)(VOBSUB)
+ title 3:
  + duration: 00:44:10
  + audio tracks:
    + 1, English (AC3) (Dolby Surround) (iso639-2: eng), 48000Hz, 192000bps
    + 2, English (AC3) (2.0 ch) (iso639-2: eng), 48000Hz, 192000bps
HandBrake has exited.
";

fn title_with(id: &str, duration: u64) -> Title {
    let mut title = Title::new(id);
    title.duration = duration;
    title
}

fn audio_line(id: u32, format: &str, subformat: &str, language: &str) -> String {
    format!(
        "    + {}, {} ({}) ({}) (iso639-2: xxx), 48000Hz, 448000bps",
        id, language, format, subformat
    )
}

#[test]
fn test_scan_parses_titles_and_tracks() {
    let result = ScanResult::from_lines(SCAN_OUTPUT.lines());

    assert_eq!(result.titles.len(), 3);
    let main = result.title("2").unwrap();
    assert_eq!(main.duration, 3600 + 52 * 60 + 41);
    assert_eq!(main.audio_tracks.len(), 3);
    assert_eq!(main.audio_tracks[1].language, "Francais");
    assert_eq!(main.audio_tracks[2].subformat, "Dolby Surround");
    assert_eq!(main.subtitle_tracks.len(), 2);
    assert_eq!(main.subtitle_tracks[1].subtitle_id, "2");
    assert_eq!(main.subtitle_tracks[1].language, "Francais");
    assert!(result.title("3").unwrap().subtitle_tracks.is_empty());
}

#[test]
fn test_scan_without_title_header_is_empty() {
    let lines = [
        "libdvdread: Encrypted DVD support unavailable.",
        "  + duration: 01:30:00",
        "    + 1, English (AC3) (5.1 ch) (iso639-2: eng)",
        "    + 1, English (iso639-2: eng) (Bitmap)(VOBSUB)",
    ];
    let result = ScanResult::from_lines(lines);
    assert!(result.is_empty());
}

#[test]
fn test_scan_duration_is_hms_in_seconds() {
    let result = ScanResult::from_lines(["+ title 7:", "  + duration: 01:02:03"]);
    assert_eq!(result.titles[0].duration, 3723);
}

#[test]
fn test_scan_is_repeatable() {
    let first = ScanResult::from_lines(SCAN_OUTPUT.lines());
    let second = ScanResult::from_lines(SCAN_OUTPUT.lines());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_scan_from_reader_matches_from_lines() {
    let from_reader = ScanResult::from_reader(SCAN_OUTPUT.as_bytes()).await.unwrap();
    assert_eq!(from_reader, ScanResult::from_lines(SCAN_OUTPUT.lines()));
}

#[tokio::test]
async fn test_scan_from_reader_skips_non_utf8_lines() {
    let output: &[u8] = b"+ title 1:\n  + duration: 01:30:00\nlibdvdnav: DVD Title: CAF\xc9\n    + 1, English (AC3) (5.1 ch) (iso639-2: eng)\n";
    let scan = ScanResult::from_reader(output).await.unwrap();

    assert_eq!(scan.titles.len(), 1);
    assert_eq!(scan.titles[0].duration, 5400);
    assert_eq!(scan.titles[0].audio_tracks.len(), 1);
}

#[tokio::test]
async fn test_scan_from_reader_handles_crlf_and_missing_final_newline() {
    let output: &[u8] = b"+ title 4:\r\n  + duration: 00:10:00\r\n    + 1, English (AC3) (5.1 ch) (iso639-2: eng)";
    let scan = ScanResult::from_reader(output).await.unwrap();

    let title = scan.title("4").unwrap();
    assert_eq!(title.duration, 600);
    assert_eq!(title.audio_tracks[0].subformat, "5.1 ch");
}

#[test]
fn test_best_title_is_longest_with_ambiguity_warning() {
    let scan = ScanResult {
        titles: vec![
            title_with("1", 3600),
            title_with("2", 5400),
            title_with("3", 5401),
        ],
    };
    let selection = Selection::new(scan, &SelectionCriteria::default());

    assert_eq!(selection.best_title().unwrap().title_id, "3");
    assert!(selection.warnings().contains(&Warning::AmbiguousTitle {
        chosen: "3".to_string(),
        rival: "2".to_string(),
        difference: 1,
    }));
}

#[test]
fn test_ambiguity_window_is_inclusive() {
    let at_window = ScanResult {
        titles: vec![title_with("1", 4500), title_with("2", 5400)],
    };
    let selection = Selection::new(at_window, &SelectionCriteria::default());
    assert_eq!(
        selection.warnings(),
        vec![Warning::AmbiguousTitle {
            chosen: "2".to_string(),
            rival: "1".to_string(),
            difference: 900,
        }]
    );

    let past_window = ScanResult {
        titles: vec![title_with("1", 4499), title_with("2", 5400)],
    };
    let selection = Selection::new(past_window, &SelectionCriteria::default());
    assert!(
        !selection
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::AmbiguousTitle { .. }))
    );
}

#[test]
fn test_best_title_without_close_rival_has_no_ambiguity() {
    let selection = Selection::new(
        ScanResult::from_lines(SCAN_OUTPUT.lines()),
        &SelectionCriteria::default(),
    );

    assert_eq!(selection.best_title().unwrap().title_id, "2");
    assert!(
        !selection
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::AmbiguousTitle { .. }))
    );
    assert_eq!(selection.best_audio("2").unwrap().track_id, "1");
    assert!(selection.has_real_best());
}

#[test]
fn test_best_audio_not_track_one_warns() {
    let lines = vec![
        "+ title 1:".to_string(),
        "  + duration: 01:40:00".to_string(),
        audio_line(2, "AC3", "5.1 ch", "English"),
        audio_line(1, "AAC", "stereo", "English"),
    ];
    let selection = Selection::new(ScanResult::from_lines(&lines), &SelectionCriteria::default());

    assert_eq!(selection.best_audio("1").unwrap().track_id, "2");
    assert_eq!(
        selection.warnings(),
        vec![Warning::ForeignLanguage {
            title_id: "1".to_string(),
            track_id: "2".to_string(),
        }]
    );
}

#[test]
fn test_single_track_falls_back_with_warning() {
    let lines = vec![
        "+ title 1:".to_string(),
        "  + duration: 01:40:00".to_string(),
        audio_line(1, "MPEG1", "2.0 ch", "Deutsch"),
    ];
    let selection = Selection::new(ScanResult::from_lines(&lines), &SelectionCriteria::default());

    assert_eq!(selection.best_audio("1").unwrap().track_id, "1");
    assert_eq!(
        selection.warnings_for("1"),
        &[Warning::SingleTrackFallback {
            title_id: "1".to_string(),
            track_id: "1".to_string(),
        }]
    );
    assert!(selection.has_real_best());
}

#[test]
fn test_multiple_unmatched_tracks_stay_unresolved() {
    let selection = Selection::new(
        ScanResult::from_lines(SCAN_OUTPUT.lines()),
        &SelectionCriteria::default(),
    );

    assert!(selection.best_audio("3").is_none());
    assert!(selection.warnings_for("3").is_empty());
}

#[test]
fn test_empty_scan_has_no_real_best() {
    let selection = Selection::new(ScanResult::default(), &SelectionCriteria::default());
    assert!(selection.best_title().is_none());
    assert!(!selection.has_real_best());
    assert!(selection.warnings().is_empty());
}

#[test]
fn test_best_title_unresolved_audio_is_not_ready() {
    let lines = vec![
        "+ title 1:".to_string(),
        "  + duration: 01:40:00".to_string(),
        audio_line(1, "DTS", "5.1 ch", "English"),
        audio_line(2, "AC3", "2.0 ch", "English"),
    ];
    let selection = Selection::new(ScanResult::from_lines(&lines), &SelectionCriteria::default());

    assert_eq!(selection.best_title().unwrap().title_id, "1");
    assert!(!selection.has_real_best());
}
