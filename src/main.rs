use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use hbrip::lookup::{candidates_from_results, rename_query, renamed_path};
use hbrip::{
    Error, HandBrake, RipCommand, RipConfig, RipOptions, RipPlan, RipScript, Selection,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Rip DVD titles with HandBrakeCLI, picking the main feature and audio track automatically.
#[derive(Parser, Debug)]
#[command(name = "hbrip", version, about, long_about = None)]
struct Cli {
    /// Output filenames. `%title%` is replaced by the two-digit title number.
    filenames: Vec<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// DVD device to read from
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Read the disc without libdvdnav
    #[arg(long)]
    no_dvdnav: bool,

    /// Path to HandBrakeCLI
    #[arg(long)]
    executable: Option<PathBuf>,

    /// Titles to rip
    #[arg(short, long, num_args = 1..)]
    title: Vec<u32>,

    /// Audio track to rip; defaults to the best track of the main feature
    #[arg(short, long)]
    audio: Option<u32>,

    /// Native language for subtitles (iso639-2)
    #[arg(short, long, default_value = "eng")]
    subtitle: String,

    /// HandBrake preset
    #[arg(short, long, default_value = "High Profile")]
    preset: String,

    /// Directory to write ripped files to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Rip the main feature without asking
    #[arg(long, conflicts_with = "title")]
    auto: bool,

    /// Print the rip script instead of running it
    #[arg(long)]
    pretend: bool,

    /// Don't scan the disc; titles and audio must be given
    #[arg(long)]
    skip_scan: bool,

    /// Skip this many rips at the start of the batch
    #[arg(long, default_value_t = 0)]
    start_at: usize,

    /// Print the scanned titles as JSON and exit
    #[arg(long, conflicts_with = "skip_scan")]
    json: bool,

    /// Rename an existing file to one of the candidate titles and exit
    #[arg(long)]
    rename: Option<PathBuf>,

    /// Candidate movie titles or search results for --rename, best match first
    #[arg(long = "candidate")]
    candidates: Vec<String>,

    /// Prowl API key; the rip script sends a push when it finishes
    #[arg(long, value_name = "TOKEN")]
    notify: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Lists `candidates` and reads a 1-based choice from stdin. Blank input picks nothing.
fn pick_candidate(candidates: &[String]) -> io::Result<Option<String>> {
    let mut stdout = io::stdout();
    for (i, c) in candidates.iter().enumerate() {
        writeln!(stdout, "{:>3}: {}", i + 1, c)?;
    }
    write!(stdout, "Choose: ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| candidates.get(i).cloned()))
}

fn rename(path: &Path, candidates: &[String]) -> Result<(), Error> {
    if !path.is_file() {
        return Err(Error::RenameSourceMissing {
            path: path.to_path_buf(),
        });
    }
    let Some(query) = rename_query(path) else {
        warn!(path = %path.display(), "No searchable name in filename");
        return Ok(());
    };

    let candidates = candidates_from_results(candidates);
    if candidates.is_empty() {
        // Print the query so it can be fed to a title search and the results passed back.
        warn!("No candidate titles given; search for the query and pass results with --candidate");
        println!("{}", query);
        return Ok(());
    }
    info!(%query, "Pick the matching title");
    let choice = pick_candidate(&candidates).map_err(|e| Error::Io {
        action: "read title choice",
        source: e,
    })?;
    if let Some(title) = choice {
        let target = renamed_path(path, &title);
        std::fs::rename(path, &target).map_err(|e| Error::Io {
            action: "rename file",
            source: e,
        })?;
        info!(to = %target.display(), "Renamed");
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode, Error> {
    if let Some(path) = &cli.rename {
        rename(path, &cli.candidates)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = match &cli.config {
        Some(path) => RipConfig::load_from_file(path)?,
        None => RipConfig::default(),
    };
    if let Some(device) = cli.device {
        config.device = device;
    }
    if cli.no_dvdnav {
        config.no_dvdnav = true;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = Some(dir);
    }
    if let Some(exe) = cli.executable {
        config.executable = Some(exe);
    }
    config.check_output_dir()?;

    let handbrake = if cli.pretend && cli.skip_scan {
        None
    } else {
        let hb = HandBrake::from_config(&config).await?;
        info!(version = hb.version(), "Found HandBrakeCLI");
        Some(hb)
    };
    let executable = match (&handbrake, &config.executable) {
        (Some(hb), _) => hb.executable_path().to_path_buf(),
        (None, Some(exe)) => exe.clone(),
        (None, None) => PathBuf::from("HandBrakeCLI"),
    };

    let selection: Option<Selection> = match (&handbrake, cli.skip_scan) {
        (Some(hb), false) => Some(hb.select(&config).await?),
        _ => None,
    };

    if let (true, Some(selection)) = (cli.json, &selection) {
        let json = serde_json::to_string_pretty(selection.scan()).map_err(|e| Error::Io {
            action: "serialize scan",
            source: e.into(),
        })?;
        println!("{}", json);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(selection) = &selection {
        for warning in selection.warnings() {
            warn!("{}", warning);
        }
        if selection.scan().is_empty() {
            if cli.auto {
                return Err(Error::NoTitlesFound);
            }
            warn!("No titles found");
        }
    }
    if cli.auto && !selection.as_ref().is_some_and(Selection::has_real_best) {
        return Err(Error::NotReady);
    }

    let titles: Vec<String> = cli.title.iter().map(|t| t.to_string()).collect();
    let plan = RipPlan::new(&titles, &cli.filenames, cli.auto)?.start_at(cli.start_at);

    let mut base = RipOptions::new().subtitle(cli.subtitle).preset(cli.preset);
    if let Some(audio) = cli.audio {
        base = base.audio(audio);
    }
    let commands = plan
        .rips()
        .iter()
        .map(|rip| RipCommand::new(&executable, &config, rip.options(&base, selection.as_ref())))
        .collect::<Result<Vec<RipCommand>, Error>>()?;

    let mut script = RipScript::new(&commands);
    if let (Some(api_key), Some(last)) = (&cli.notify, commands.last()) {
        let title = last
            .output()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        script = script.notify(&title, api_key);
    }
    if cli.pretend {
        print!("{}", script.render());
        return Ok(ExitCode::SUCCESS);
    }
    if script.is_empty() {
        info!("Nothing to rip");
        return Ok(ExitCode::SUCCESS);
    }

    let status = script.run().await?;
    if status.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(code = ?status.code(), "Rip script failed");
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
