use std::io::Write;
use std::process::ExitStatus;

use tokio::process::Command;

use crate::error::Error;
use crate::rip::{RipCommand, double_quote};

const NOTIFY_URL: &str = "https://api.prowlapp.com/publicapi/add";

/// A `sh` script running one rip command per line, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RipScript {
    lines: Vec<String>,
    notification: Option<String>,
}

impl RipScript {
    pub fn new(commands: &[RipCommand]) -> Self {
        RipScript {
            lines: commands.iter().map(|c| c.to_string()).collect(),
            notification: None,
        }
    }

    /// Ends the script with a Prowl push announcing that `title` is done, sent with `api_key`.
    ///
    /// The push is a `curl` line run after the last rip. Calling this again replaces it.
    pub fn notify(mut self, title: &str, api_key: &str) -> Self {
        self.notification = Some(format!(
            "curl -s {} -d application=hbrip -d event=Completed -d {} -d {}",
            NOTIFY_URL,
            double_quote(&format!("description={} is done.", title)),
            double_quote(&format!("apikey={}", api_key)),
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        let mut script = String::from("#!/bin/sh\n");
        for line in &self.lines {
            script.push_str(line);
            script.push('\n');
        }
        if let Some(line) = &self.notification {
            script.push_str(line);
            script.push('\n');
        }
        script
    }

    /// Writes the script to a temporary file and runs it with `sh`, waiting for it to finish.
    ///
    /// `stdout` and `stderr` are inherited so HandBrake's progress stays visible.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the script could not be written, or
    /// `Error::ProcessSpawnFailed` if `sh` could not be spawned.
    pub async fn run(&self) -> Result<ExitStatus, Error> {
        let mut file = tempfile::Builder::new()
            .prefix("hbrip")
            .suffix(".sh")
            .tempfile()
            .map_err(|e| Error::Io {
                action: "create rip script",
                source: e,
            })?;
        file.write_all(self.render().as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| Error::Io {
                action: "write rip script",
                source: e,
            })?;

        tracing::info!(path = %file.path().display(), rips = self.lines.len(), "Running rip script");
        // `file` must outlive the child; dropping it deletes the script.
        Command::new("sh")
            .arg(file.path())
            .status()
            .await
            .map_err(|e| Error::ProcessSpawnFailed { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RipConfig;
    use crate::rip::RipOptions;

    #[test]
    fn test_render_empty() {
        assert_eq!(RipScript::new(&[]).render(), "#!/bin/sh\n");
    }

    #[test]
    fn test_render_one_line_per_command() {
        let config = RipConfig::default();
        let command = |title: u32| {
            let options = RipOptions::new()
                .title(title)
                .audio(1)
                .filename(format!("Ep {}", title))
                .subtitle("eng")
                .preset("Film");
            RipCommand::new("HandBrakeCLI", &config, options).unwrap()
        };
        let script = RipScript::new(&[command(1), command(2)]).render();
        let lines: Vec<&str> = script.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("--title 1 "));
        assert!(lines[2].ends_with("--output \"Ep 2\""));
    }

    #[test]
    fn test_render_notification_last() {
        let options = RipOptions::new()
            .title(3)
            .audio(1)
            .filename("Movie")
            .subtitle("eng")
            .preset("Film");
        let command = RipCommand::new("HandBrakeCLI", &RipConfig::default(), options).unwrap();
        let script = RipScript::new(&[command])
            .notify("Old", "stale")
            .notify("Movie", "abc123")
            .render();
        let lines: Vec<&str> = script.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("HandBrakeCLI "));
        assert_eq!(
            lines[2],
            "curl -s https://api.prowlapp.com/publicapi/add -d application=hbrip -d event=Completed \
             -d \"description=Movie is done.\" -d \"apikey=abc123\""
        );
    }

    #[test]
    fn test_render_without_notification() {
        assert!(!RipScript::new(&[]).render().contains("curl"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_empty_script_succeeds() {
        let status = RipScript::new(&[]).run().await.unwrap();
        assert!(status.success());
    }
}
