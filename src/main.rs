//! FileSift: gather images, videos or custom file types from a folder tree.
//!
//! Thin binary entry point. All logic lives in the `filesift-core` crate;
//! this file parses flags, drives a `CopySession` and prints its events.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use filesift_core::config::{DestinationPlacement, SessionConfig};
use filesift_core::{
    CopyEvent, CopyRequest, CopySession, CustomExtensions, FileTypeSelector, StartStatus,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long one wait for a session event may block before the Ctrl-C flag
/// is checked again.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Conventional exit status for a run stopped by SIGINT.
const EXIT_CANCELED: u8 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Images,
    Videos,
    ImagesAndVideos,
    Custom,
}

#[derive(Debug, Parser)]
#[command(name = "filesift", version)]
#[command(about = "Copy or zip every image, video or custom file type under a folder into a new folder")]
struct Cli {
    /// Directory to search recursively.
    source: PathBuf,

    /// Which files to pick up.
    #[arg(long = "type", value_enum, default_value_t = Kind::Images)]
    kind: Kind,

    /// Extensions for `--type custom`, e.g. "txt, *.doc; md".
    #[arg(long, value_name = "LIST", required_if_eq("kind", "custom"))]
    ext: Option<String>,

    /// Write a single zip archive instead of loose copies.
    #[arg(long)]
    compress: bool,

    /// Create the output folder inside SOURCE instead of next to it.
    #[arg(long)]
    inside: bool,

    /// Do not open the output folder when done.
    #[arg(long)]
    no_reveal: bool,

    /// JSON settings file; flags above override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// trace, debug, info, warn or error. `RUST_LOG` takes precedence.
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Help and version go to stdout and are not failures.
            return Ok(if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    init_logging(&cli.log_level)?;
    info!("FileSift {} starting", env!("CARGO_PKG_VERSION"));

    let selector = selector_from(&cli)?;
    let config = config_from(&cli)?;
    let request = CopyRequest::new(&cli.source, selector, cli.compress);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        if !flag.swap(true, Ordering::Relaxed) {
            warn!("Interrupt received, cancelling after the current file");
        }
    })
    .context("failed to install Ctrl-C handler")?;

    let mut session = CopySession::new(config);
    match session.start(request).context("failed to start copy")? {
        StartStatus::Started => {}
        StartStatus::Rejected => bail!("a copy is already running"),
    }

    run_to_outcome(&mut session, &interrupted, &cli.source)
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level `{level}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn selector_from(cli: &Cli) -> Result<FileTypeSelector> {
    let selector = match (cli.kind, cli.ext.as_deref()) {
        (Kind::Custom, Some(list)) => FileTypeSelector::Custom(
            CustomExtensions::parse(list).context("invalid --ext list")?,
        ),
        (Kind::Custom, None) => bail!("--type custom needs --ext"),
        (_, Some(_)) => bail!("--ext only applies to --type custom"),
        (Kind::Images, None) => FileTypeSelector::Images,
        (Kind::Videos, None) => FileTypeSelector::Videos,
        (Kind::ImagesAndVideos, None) => FileTypeSelector::ImagesAndVideos,
    };
    Ok(selector)
}

fn config_from(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if cli.inside {
        config.placement = DestinationPlacement::Inside;
    }
    if cli.no_reveal {
        config.reveal_on_complete = false;
    }
    Ok(config)
}

/// Print progress until the run ends and map its outcome to an exit code.
fn run_to_outcome(
    session: &mut CopySession,
    interrupted: &AtomicBool,
    source: &Path,
) -> Result<ExitCode> {
    let mut last_percent = None;
    let mut stderr = std::io::stderr();

    loop {
        if interrupted.load(Ordering::Relaxed) && !session.is_cancel_requested() {
            session.cancel();
        }

        let Some(event) = session.next_event(POLL_INTERVAL) else {
            if session.state().is_idle() {
                bail!("copy session ended without an outcome");
            }
            continue;
        };

        match event {
            CopyEvent::Progress(progress) => {
                let percent = progress.percent();
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    let _ = write!(
                        stderr,
                        "\r{percent:>3}% ({}/{})",
                        progress.completed, progress.total
                    );
                    let _ = stderr.flush();
                }
            }
            CopyEvent::NoFilesFound => {
                info!("Outcome: no files found");
                println!("No matching files found in {}", source.display());
                return Ok(ExitCode::SUCCESS);
            }
            CopyEvent::Completed { destination } => {
                end_progress_line(&mut stderr, last_percent);
                info!("Outcome: completed into {}", destination.display());
                println!("Files copied to {}", destination.display());
                return Ok(ExitCode::SUCCESS);
            }
            CopyEvent::Canceled => {
                end_progress_line(&mut stderr, last_percent);
                info!("Outcome: cancelled");
                eprintln!("Cancelled. Files already copied were kept.");
                return Ok(ExitCode::from(EXIT_CANCELED));
            }
            CopyEvent::Failed { message } => {
                end_progress_line(&mut stderr, last_percent);
                warn!("Outcome: failed");
                eprintln!("Error: {message}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }
}

fn end_progress_line(stderr: &mut std::io::Stderr, last_percent: Option<u8>) {
    if last_percent.is_some() {
        let _ = writeln!(stderr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("filesift").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_to_images_with_sibling_placement() {
        let cli = parse(&["/data"]);
        assert_eq!(selector_from(&cli).unwrap(), FileTypeSelector::Images);

        let config = config_from(&cli).unwrap();
        assert_eq!(config.placement, DestinationPlacement::Sibling);
        assert!(config.reveal_on_complete);
    }

    #[test]
    fn custom_type_parses_the_extension_list() {
        let cli = parse(&["/data", "--type", "custom", "--ext", "TXT; *.md"]);
        match selector_from(&cli).unwrap() {
            FileTypeSelector::Custom(exts) => {
                assert_eq!(exts.iter().collect::<Vec<_>>(), vec![".md", ".txt"]);
            }
            other => panic!("expected Custom, got {other:?}"),
        }
    }

    #[test]
    fn custom_type_without_ext_is_a_usage_error() {
        let err = Cli::try_parse_from(["filesift", "/data", "--type", "custom"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn ext_with_a_fixed_type_is_rejected() {
        let cli = parse(&["/data", "--type", "videos", "--ext", "txt"]);
        assert!(selector_from(&cli).is_err());
    }

    #[test]
    fn malformed_ext_list_is_rejected_before_any_run() {
        let cli = parse(&["/data", "--type", "custom", "--ext", ".t!xt"]);
        assert!(selector_from(&cli).is_err());
    }

    #[test]
    fn flags_override_the_config_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("filesift.json");
        std::fs::write(&path, r#"{ "archive_name": "out.zip", "reveal_on_complete": true }"#)
            .unwrap();

        let cli = parse(&[
            "/data",
            "--config",
            path.to_str().unwrap(),
            "--inside",
            "--no-reveal",
        ]);
        let config = config_from(&cli).unwrap();
        assert_eq!(config.archive_name, "out.zip");
        assert_eq!(config.placement, DestinationPlacement::Inside);
        assert!(!config.reveal_on_complete);
    }
}
