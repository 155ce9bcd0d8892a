use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::RipConfig;
use crate::error::Error;
use crate::selection::Selection;

/// The options a rip command cannot be built without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionKey {
    Title,
    Audio,
    Filename,
    Subtitle,
    Preset,
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKey::Title => "title",
            OptionKey::Audio => "audio",
            OptionKey::Filename => "filename",
            OptionKey::Subtitle => "subtitle",
            OptionKey::Preset => "preset",
        };
        f.write_str(name)
    }
}

/// Caller-supplied options for one rip. Any of them may be left out;
/// `title` and `audio` can be filled in from a [`Selection`].
#[derive(Debug, Clone, Default)]
pub struct RipOptions {
    title: Option<String>,
    audio: Option<String>,
    filename: Option<String>,
    subtitle: Option<String>,
    preset: Option<String>,
}

impl RipOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title number to rip.
    pub fn title(mut self, title: impl ToString) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Sets the audio track number, used for both output audio tracks.
    pub fn audio(mut self, audio: impl ToString) -> Self {
        self.audio = Some(audio.to_string());
        self
    }

    /// Sets the output filename, relative to the configured output directory.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the native language for subtitle selection.
    ///
    /// Uses the `iso639-2` code, e.g. `"eng"`.
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Sets the `HandBrakeCLI` preset, e.g. `"High Profile"`.
    pub fn preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    /// The title number, if one has been set or defaulted.
    pub fn title_id(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Fills in `title` and `audio` from the selection where the caller left them out.
    ///
    /// `audio` is only defaulted when the best title has a resolved best audio track.
    pub fn with_defaults_from(mut self, selection: &Selection) -> Self {
        if let Some(best) = selection.best_title() {
            if self.title.is_none() {
                self.title = Some(best.title_id.clone());
            }
            if self.audio.is_none() {
                self.audio = selection
                    .best_audio(&best.title_id)
                    .map(|a| a.track_id.clone());
            }
        }
        self
    }

    /// Returns every key that is absent or empty, in a fixed order.
    pub fn missing(&self) -> Vec<OptionKey> {
        [
            (OptionKey::Title, &self.title),
            (OptionKey::Audio, &self.audio),
            (OptionKey::Filename, &self.filename),
            (OptionKey::Subtitle, &self.subtitle),
            (OptionKey::Preset, &self.preset),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().is_none_or(str::is_empty))
        .map(|(k, _)| k)
        .collect()
    }
}

/// Wraps `s` in double quotes, escaping what the shell still expands inside them.
pub fn double_quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// A fully resolved `HandBrakeCLI` invocation for one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RipCommand {
    handbrake_path: PathBuf,
    device: PathBuf,
    no_dvdnav: bool,
    preset: String,
    subtitle: String,
    title: String,
    audio: String,
    output: PathBuf,
}

impl RipCommand {
    /// Validates `options` and resolves them against `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingOption` naming every absent or empty option.
    pub fn new(
        handbrake_path: impl Into<PathBuf>,
        config: &RipConfig,
        options: RipOptions,
    ) -> Result<Self, Error> {
        let keys = options.missing();
        if !keys.is_empty() {
            return Err(Error::MissingOption { keys });
        }

        // Every field is present and non-empty past this point.
        let RipOptions {
            title,
            audio,
            filename,
            subtitle,
            preset,
        } = options;

        let command = RipCommand {
            handbrake_path: handbrake_path.into(),
            device: config.device.clone(),
            no_dvdnav: config.no_dvdnav,
            output: config.output_path(&filename.unwrap_or_default()),
            preset: preset.unwrap_or_default(),
            subtitle: subtitle.unwrap_or_default(),
            title: title.unwrap_or_default(),
            audio: audio.unwrap_or_default(),
        };
        tracing::debug!(command = %command, "Rip command built");
        Ok(command)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    /// Builds the argument list for spawning `HandBrakeCLI` directly, without a shell.
    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-i".into(), self.device.display().to_string()];
        if self.no_dvdnav {
            args.push("--no-dvdnav".into());
        }
        args.extend(["-Z".into(), self.preset.clone()]);
        args.extend([
            "--markers".into(),
            "--decomb".into(),
            "--subtitle".into(),
            "scan".into(),
            "--subtitle-forced".into(),
        ]);
        args.extend(["--native-language".into(), self.subtitle.clone()]);
        args.extend(["--title".into(), self.title.clone()]);
        args.extend(["--audio".into(), format!("{},{}", self.audio, self.audio)]);
        args.extend(["--output".into(), self.output.display().to_string()]);
        args
    }
}

impl fmt::Display for RipCommand {
    /// Renders the single shell line used in rip scripts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -i {} {}-Z {} --markers --decomb --subtitle scan --subtitle-forced --native-language {} --title {} --audio {},{} --output {}",
            self.handbrake_path.display(),
            self.device.display(),
            if self.no_dvdnav { "--no-dvdnav " } else { "" },
            double_quote(&self.preset),
            self.subtitle,
            self.title,
            self.audio,
            self.audio,
            double_quote(&self.output.display().to_string()),
        )
    }
}
