use serde::Serialize;

/// An audio track as reported by a `HandBrakeCLI` title scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioTrack {
    /// The 1-based track ordinal, as text.
    pub track_id: String,
    /// The language name, e.g. `"English"`.
    pub language: String,
    /// The codec name, e.g. `"AC3"`.
    pub format: String,
    /// Free text such as `"5.1 ch"` or `"Dolby Surround"`.
    pub subformat: String,
}

/// A subtitle track as reported by a `HandBrakeCLI` title scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleTrack {
    /// The 1-based track ordinal, as text.
    pub subtitle_id: String,
    /// The language name, e.g. `"English"`.
    pub language: String,
}

/// One title found on the disc.
///
/// Durations are whole seconds; `0` means the scan never reported one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Title {
    pub title_id: String,
    pub duration: u64,
    pub audio_tracks: Vec<AudioTrack>,
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

impl Title {
    pub fn new(title_id: impl Into<String>) -> Self {
        Title {
            title_id: title_id.into(),
            ..Default::default()
        }
    }

    /// Formats the duration back into HandBrake's `HH:MM:SS` form.
    pub fn duration_hms(&self) -> String {
        let h = self.duration / 3600;
        let m = (self.duration % 3600) / 60;
        let s = self.duration % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }
}
