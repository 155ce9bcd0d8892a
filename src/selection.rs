//! Picks the main feature and its audio track from a [`ScanResult`].
//!
//! The best title is the longest one. The best audio track is the first one
//! matching the configured format, subformat pattern and language. Anything
//! suspicious about either choice is reported as a [`Warning`] rather than
//! failing the selection.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scan::ScanResult;
use crate::track::{AudioTrack, Title};

static DEFAULT_SUBFORMAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"5\.1").expect("BUG: Failed to compile subformat regex"));

/// Titles whose durations differ by at most this many seconds are "ambiguous".
pub const DEFAULT_AMBIGUITY_WINDOW: u64 = 15 * 60;

mod pattern {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(re: &Regex, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(re.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Regex, D::Error> {
        let raw = String::deserialize(d)?;
        Regex::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// What a "best" audio track looks like.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCriteria {
    /// Exact codec name, e.g. `"AC3"`.
    pub best_format: String,
    /// Searched for anywhere in the track's subformat text.
    #[serde(with = "pattern")]
    pub best_subformat: Regex,
    /// Exact language name, e.g. `"English"`.
    pub best_language: String,
    /// Seconds either side of the best title's duration that count as a near tie.
    pub ambiguity_window: u64,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        SelectionCriteria {
            best_format: "AC3".to_string(),
            best_subformat: DEFAULT_SUBFORMAT_RE.clone(),
            best_language: "English".to_string(),
            ambiguity_window: DEFAULT_AMBIGUITY_WINDOW,
        }
    }
}

impl SelectionCriteria {
    fn matches(&self, track: &AudioTrack) -> bool {
        track.format == self.best_format
            && self.best_subformat.is_match(&track.subformat)
            && track.language == self.best_language
    }
}

/// A non-fatal remark about a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// Another title runs close enough to the chosen one that it might be the feature.
    AmbiguousTitle {
        chosen: String,
        rival: String,
        difference: u64,
    },
    /// No track matched, but the title only has one, so it was taken.
    SingleTrackFallback { title_id: String, track_id: String },
    /// The chosen track is not the disc's first audio track.
    ForeignLanguage { title_id: String, track_id: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AmbiguousTitle {
                chosen,
                rival,
                difference,
            } => write!(
                f,
                "Picked title {} but title {} is only {}s shorter, check the result",
                chosen, rival, difference
            ),
            Warning::SingleTrackFallback { title_id, track_id } => write!(
                f,
                "Title {} has no preferred audio track, falling back to its only track {}",
                title_id, track_id
            ),
            Warning::ForeignLanguage { title_id, track_id } => write!(
                f,
                "Best audio for title {} is track {}, not track 1: possible foreign-language disc",
                title_id, track_id
            ),
        }
    }
}

fn pick_audio(title: &Title, criteria: &SelectionCriteria) -> (Option<usize>, Vec<Warning>) {
    let mut warnings = Vec::new();

    let picked = match title.audio_tracks.iter().position(|t| criteria.matches(t)) {
        Some(i) => Some(i),
        None if title.audio_tracks.len() == 1 => {
            warnings.push(Warning::SingleTrackFallback {
                title_id: title.title_id.clone(),
                track_id: title.audio_tracks[0].track_id.clone(),
            });
            Some(0)
        }
        None => None,
    };

    if let Some(track) = picked.map(|i| &title.audio_tracks[i]) {
        if track.track_id != "1" {
            warnings.push(Warning::ForeignLanguage {
                title_id: title.title_id.clone(),
                track_id: track.track_id.clone(),
            });
        }
    }

    (picked, warnings)
}

fn pick_title(titles: &[Title], window: u64) -> (Option<usize>, Vec<Warning>) {
    // First title wins a tie, so only replace on a strictly longer duration.
    let best = titles
        .iter()
        .enumerate()
        .fold(None::<usize>, |best, (i, title)| match best {
            Some(b) if titles[b].duration >= title.duration => Some(b),
            _ => Some(i),
        });

    let mut warnings = Vec::new();
    if let Some(b) = best {
        let chosen = &titles[b];
        let rival = titles
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != b)
            .map(|(_, t)| t)
            .find(|t| chosen.duration.abs_diff(t.duration) <= window);
        if let Some(rival) = rival {
            warnings.push(Warning::AmbiguousTitle {
                chosen: chosen.title_id.clone(),
                rival: rival.title_id.clone(),
                difference: chosen.duration.abs_diff(rival.duration),
            });
        }
    }

    (best, warnings)
}

/// The outcome of running the heuristic over one scan.
///
/// All choices are made at construction; the accessors only read them back.
#[derive(Debug, Clone)]
pub struct Selection {
    scan: ScanResult,
    best_title: Option<usize>,
    best_audio: Vec<Option<usize>>,
    title_warnings: Vec<Warning>,
    audio_warnings: Vec<Vec<Warning>>,
}

impl Selection {
    pub fn new(scan: ScanResult, criteria: &SelectionCriteria) -> Self {
        let (best_audio, audio_warnings): (Vec<Option<usize>>, Vec<Vec<Warning>>) = scan
            .titles
            .iter()
            .map(|t| pick_audio(t, criteria))
            .unzip();
        let (best_title, title_warnings) = pick_title(&scan.titles, criteria.ambiguity_window);

        let selection = Selection {
            scan,
            best_title,
            best_audio,
            title_warnings,
            audio_warnings,
        };
        tracing::debug!(
            best_title = selection.best_title().map(|t| t.title_id.as_str()),
            best_audio = selection
                .best_title()
                .and_then(|t| selection.best_audio(&t.title_id))
                .map(|a| a.track_id.as_str()),
            "Selection made"
        );
        selection
    }

    pub fn scan(&self) -> &ScanResult {
        &self.scan
    }

    /// The longest title, or `None` for an empty scan.
    pub fn best_title(&self) -> Option<&Title> {
        self.best_title.map(|i| &self.scan.titles[i])
    }

    /// The best audio track of the given title, or `None` if it could not be resolved.
    pub fn best_audio(&self, title_id: &str) -> Option<&AudioTrack> {
        let i = self
            .scan
            .titles
            .iter()
            .position(|t| t.title_id == title_id)?;
        let title = &self.scan.titles[i];
        self.best_audio[i].map(|a| &title.audio_tracks[a])
    }

    /// Warnings raised while choosing the best title and its audio track.
    pub fn warnings(&self) -> Vec<Warning> {
        let mut warnings = self.title_warnings.clone();
        if let Some(i) = self.best_title {
            warnings.extend(self.audio_warnings[i].iter().cloned());
        }
        warnings
    }

    /// Warnings raised while choosing the audio track of the given title.
    pub fn warnings_for(&self, title_id: &str) -> &[Warning] {
        self.scan
            .titles
            .iter()
            .position(|t| t.title_id == title_id)
            .map(|i| self.audio_warnings[i].as_slice())
            .unwrap_or(&[])
    }

    /// True only when there is a best title and its best audio track resolved.
    pub fn has_real_best(&self) -> bool {
        self.best_title()
            .and_then(|t| self.best_audio(&t.title_id))
            .is_some()
    }
}
