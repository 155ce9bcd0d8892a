use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};

use crate::error::Error;
use crate::track::{AudioTrack, SubtitleTrack, Title};

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ title (?P<id>\d+):").expect("BUG: Failed to compile title regex")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ duration: (?P<h>\d{2}):(?P<m>\d{2}):(?P<s>\d{2})")
        .expect("BUG: Failed to compile duration regex")
});

static AUDIO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\+ (?P<id>\d+), (?P<lang>[A-Za-z]+) \((?P<format>[A-Za-z0-9]+)\) \((?P<subformat>[^)]*)\)",
    )
    .expect("BUG: Failed to compile audio track regex")
});

static SUBTITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+ (?P<id>\d+), (?P<lang>[A-Za-z]+).*\(iso[\d-]+: [A-Za-z]+\)")
        .expect("BUG: Failed to compile subtitle track regex")
});

/// A single line of `HandBrakeCLI --scan` output, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanLine {
    TitleHeader { title_id: String },
    Duration { seconds: u64 },
    AudioTrack(AudioTrack),
    SubtitleTrack(SubtitleTrack),
    Unrecognized,
}

impl ScanLine {
    /// Classifies a line. Patterns are tried in order; audio before subtitle
    /// since audio lines carry an iso639 marker too.
    pub fn classify(line: &str) -> ScanLine {
        if let Some(caps) = TITLE_RE.captures(line) {
            return ScanLine::TitleHeader {
                title_id: caps["id"].to_string(),
            };
        }

        if let Some(caps) = DURATION_RE.captures(line) {
            let h = caps["h"].parse::<u64>().unwrap_or(0);
            let m = caps["m"].parse::<u64>().unwrap_or(0);
            let s = caps["s"].parse::<u64>().unwrap_or(0);
            return ScanLine::Duration {
                seconds: h * 3600 + m * 60 + s,
            };
        }

        if let Some(caps) = AUDIO_RE.captures(line) {
            return ScanLine::AudioTrack(AudioTrack {
                track_id: caps["id"].to_string(),
                language: caps["lang"].to_string(),
                format: caps["format"].to_string(),
                subformat: caps["subformat"].to_string(),
            });
        }

        if let Some(caps) = SUBTITLE_RE.captures(line) {
            return ScanLine::SubtitleTrack(SubtitleTrack {
                subtitle_id: caps["id"].to_string(),
                language: caps["lang"].to_string(),
            });
        }

        ScanLine::Unrecognized
    }
}

/// Builds a [`ScanResult`] line by line.
///
/// The only state is the index of the title currently being described.
/// Duration and track lines seen before any title header are dropped.
#[derive(Debug, Default)]
pub struct ScanParser {
    titles: Vec<Title>,
    current: Option<usize>,
    orphaned: usize,
}

impl ScanParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        match ScanLine::classify(line) {
            ScanLine::TitleHeader { title_id } => {
                self.titles.push(Title::new(title_id));
                self.current = Some(self.titles.len() - 1);
            }
            ScanLine::Duration { seconds } => match self.current_title() {
                Some(title) => title.duration = seconds,
                None => self.orphaned += 1,
            },
            ScanLine::AudioTrack(track) => match self.current_title() {
                Some(title) => title.audio_tracks.push(track),
                None => self.orphaned += 1,
            },
            ScanLine::SubtitleTrack(track) => match self.current_title() {
                Some(title) => title.subtitle_tracks.push(track),
                None => self.orphaned += 1,
            },
            ScanLine::Unrecognized => {}
        }
    }

    fn current_title(&mut self) -> Option<&mut Title> {
        self.current.and_then(|i| self.titles.get_mut(i))
    }

    pub fn finish(self) -> ScanResult {
        if self.orphaned > 0 {
            tracing::debug!(
                orphaned = self.orphaned,
                "Dropped scan lines seen before any title header"
            );
        }
        tracing::debug!(titles = self.titles.len(), "Scan parsed");
        ScanResult {
            titles: self.titles,
        }
    }
}

/// The titles found by one device scan, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub titles: Vec<Title>,
}

impl ScanResult {
    /// Parses an already-collected scan transcript.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parser = ScanParser::new();
        for line in lines {
            parser.feed(line.as_ref());
        }
        parser.finish()
    }

    /// Parses scan output as it is read, typically from the scanner's `stderr`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ScanFailed` if the reader fails or yields invalid UTF-8.
    pub async fn from_reader<R>(reader: R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        // Disc labels are not always UTF-8, so lines are decoded lossily and never fail the scan.
        let codec = AnyDelimiterCodec::new(b"\n".to_vec(), Vec::new());
        let mut lines = FramedRead::new(reader, codec);
        let mut parser = ScanParser::new();
        while let Some(line) = lines.next().await {
            match line {
                Ok(bytes) => {
                    let line = String::from_utf8_lossy(&bytes);
                    parser.feed(line.trim_end_matches('\r'));
                }
                Err(AnyDelimiterCodecError::Io(e)) => return Err(Error::ScanFailed { source: e }),
                Err(e) => {
                    return Err(Error::ScanFailed {
                        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                    });
                }
            }
        }
        Ok(parser.finish())
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn title(&self, title_id: &str) -> Option<&Title> {
        self.titles.iter().find(|t| t.title_id == title_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_title_header() {
        assert_eq!(
            ScanLine::classify("+ title 12:"),
            ScanLine::TitleHeader {
                title_id: "12".to_string()
            }
        );
    }

    #[test]
    fn test_classify_duration() {
        assert_eq!(
            ScanLine::classify("  + duration: 01:02:03"),
            ScanLine::Duration { seconds: 3723 }
        );
    }

    #[test]
    fn test_classify_audio_track_with_iso_suffix() {
        let line = "    + 1, English (AC3) (5.1 ch) (iso639-2: eng), 48000Hz, 448000bps";
        assert_eq!(
            ScanLine::classify(line),
            ScanLine::AudioTrack(AudioTrack {
                track_id: "1".to_string(),
                language: "English".to_string(),
                format: "AC3".to_string(),
                subformat: "5.1 ch".to_string(),
            })
        );
    }

    #[test]
    fn test_classify_subtitle_track() {
        let line = "    + 2, Francais (Closed Caption) (iso639-2: fra) (Text)(CC)";
        assert_eq!(
            ScanLine::classify(line),
            ScanLine::SubtitleTrack(SubtitleTrack {
                subtitle_id: "2".to_string(),
                language: "Francais".to_string(),
            })
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        assert_eq!(
            ScanLine::classify("  + size: 720x480, pixel aspect: 32/27"),
            ScanLine::Unrecognized
        );
        assert_eq!(ScanLine::classify("+ duration: 1:02:03"), ScanLine::Unrecognized);
    }

    #[test]
    fn test_parser_drops_lines_before_first_title() {
        let mut parser = ScanParser::new();
        parser.feed("  + duration: 00:10:00");
        parser.feed("    + 1, English (AC3) (5.1 ch) (iso639-2: eng)");
        parser.feed("+ title 1:");
        let result = parser.finish();

        assert_eq!(result.titles.len(), 1);
        assert_eq!(result.titles[0].duration, 0);
        assert!(result.titles[0].audio_tracks.is_empty());
    }
}
