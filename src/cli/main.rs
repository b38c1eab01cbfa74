use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use oly_imageshare::cache::ThumbnailCache;
use oly_imageshare::camera::{CameraClient, CameraSession, ConnectionState, RemoteImage};
use oly_imageshare::config::Config;
use oly_imageshare::download::{self, DownloadReport, FileOutcome, Progress};
use oly_imageshare::error;
use oly_imageshare::gallery::progress_label;

#[derive(Parser, Debug)]
#[command(
    name = "oly-imageshare",
    version,
    about = "Download photos from an Olympus camera over its Wi-Fi access point"
)]
struct Cli {
    /// File names (P8060001.JPG) or camera paths (/DCIM/100OLYMP/P8060001.JPG) to download
    #[arg(value_name = "NAME")]
    names: Vec<String>,

    /// Path to settings file (default: platform config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write default settings and exit
    #[arg(long)]
    init: bool,

    /// Check the camera connection and print camera info
    #[arg(long)]
    check: bool,

    /// List images on the camera
    #[arg(long)]
    list: bool,

    /// Download the named images
    #[arg(long)]
    download: bool,

    /// Download every listed image (with --download)
    #[arg(long)]
    all: bool,

    /// Camera host for this run
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Download directory for this run
    #[arg(long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Save a new download directory in the settings and exit
    #[arg(long = "set-download-dir", value_name = "DIR")]
    set_download_dir: Option<PathBuf>,

    /// Delete old cached thumbnails and exit
    #[arg(long = "purge-cache")]
    purge_cache: bool,

    /// Print listing and download results as a single JSON document
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let saved = Config::default().save(cli.config.as_deref())?;
        println!("Default settings written to {}", saved.display());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;

    // Handle --set-download-dir
    if let Some(ref dir) = cli.set_download_dir {
        config.download_dir = dir.clone();
        config.ensure_download_dir()?;
        let saved = config.save(cli.config.as_deref())?;
        println!(
            "Download directory set to {} ({})",
            config.download_dir.display(),
            saved.display()
        );
        return Ok(());
    }

    // Handle --purge-cache
    if cli.purge_cache {
        let cache = ThumbnailCache::new(&config.cache.root);
        let removed = cache.purge_older_than(config.cache.max_age_days);
        println!("Removed {removed} cached thumbnail(s)");
        return Ok(());
    }

    // Per-run overrides
    if let Some(ref host) = cli.host {
        config.camera.host = host.clone();
    }
    if let Some(ref dest) = cli.dest {
        config.download_dir = dest.clone();
    }

    if !cli.check && !cli.list && !cli.download {
        anyhow::bail!("Nothing to do. Use --check, --list or --download (see --help).");
    }

    let client = CameraClient::new(&config.camera)?;

    if cli.check {
        let mut session = CameraSession::new(config.camera.host.clone());
        match session.check(&client).await {
            ConnectionState::Connected { info } => println!("{info}"),
            ConnectionState::Unreachable { message } => {
                eprintln!("{message}");
                std::process::exit(1);
            }
            ConnectionState::Unknown => {}
        }
    }

    if !cli.list && !cli.download {
        return Ok(());
    }

    let images = match client
        .list_images(&config.camera.dcim_root, &config.gallery)
        .await
    {
        Ok(images) => images,
        Err(e) => {
            eprintln!("{}", error::user_message(&e));
            std::process::exit(1);
        }
    };

    if cli.list && !cli.json {
        for image in &images {
            println!("{:<40} {:>12}  {}", image.path, image.size, image.timestamp);
        }
        log::info!("{} image(s)", images.len());
    }

    let mut report = None;
    if cli.download {
        let wanted = pick(&images, &cli.names, cli.all)?;
        let dir = config.ensure_download_dir()?;
        log::info!(
            "Downloading {} file(s) to {}",
            wanted.len(),
            dir.display()
        );

        let done = download::download_selected(&client, &wanted, dir, |progress| match progress {
            Progress::Starting { index, total, image } => {
                log::info!("[{}] {}", progress_label(index, total), image.path);
            }
            Progress::Finished(item) => match &item.result {
                Ok(FileOutcome::Downloaded { path, bytes }) => {
                    log::info!("  Saved {} ({bytes} bytes)", path.display());
                }
                Ok(FileOutcome::Skipped { path }) => {
                    log::info!("  Exists, skipped: {}", path.display());
                }
                Err(msg) => log::error!("  Error: {msg}"),
            },
        })
        .await;

        log::info!(
            "Done: {} downloaded, {} skipped, {} failed out of {} file(s)",
            done.downloaded(),
            done.skipped(),
            done.failed(),
            done.items.len()
        );
        report = Some(done);
    }

    if cli.json {
        let listed = cli.list.then_some(images.as_slice());
        let summary = json_summary(listed, report.as_ref())?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    if report.is_some_and(|r| r.failed() > 0) {
        std::process::exit(1);
    }

    Ok(())
}

/// One JSON document for everything this run did.
fn json_summary(
    images: Option<&[RemoteImage]>,
    report: Option<&DownloadReport>,
) -> Result<serde_json::Value> {
    let mut summary = serde_json::Map::new();
    if let Some(images) = images {
        summary.insert("images".into(), serde_json::to_value(images)?);
    }
    if let Some(report) = report {
        summary.insert("download".into(), serde_json::to_value(report)?);
    }
    Ok(serde_json::Value::Object(summary))
}

/// Resolve the requested names against the listing.
fn pick(images: &[RemoteImage], names: &[String], all: bool) -> Result<Vec<RemoteImage>> {
    if all {
        return Ok(images.to_vec());
    }
    if names.is_empty() {
        anyhow::bail!("No files named. Pass file names or use --all.");
    }

    let mut wanted = Vec::new();
    for name in names {
        let found = images
            .iter()
            .find(|i| i.path == *name || i.file_name().eq_ignore_ascii_case(name));
        match found {
            Some(image) => {
                if !wanted.iter().any(|w: &RemoteImage| w.path == image.path) {
                    wanted.push(image.clone());
                }
            }
            None => log::warn!("Not on the camera: {name}"),
        }
    }
    if wanted.is_empty() {
        anyhow::bail!("None of the named files are on the camera.");
    }
    Ok(wanted)
}
