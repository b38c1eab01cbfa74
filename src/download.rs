//! Writes camera files into the download directory.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

use crate::camera::{CameraClient, RemoteImage};
use crate::error::CameraError;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    /// The destination already existed and was left untouched.
    Skipped { path: PathBuf },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded { path, .. } | Self::Skipped { path } => path,
        }
    }
}

/// Per-file entry of a [`DownloadReport`].
#[derive(Debug, Clone, Serialize)]
pub struct DownloadItem {
    pub remote_path: String,
    pub result: std::result::Result<FileOutcome, String>,
}

#[derive(Debug, Default, Serialize)]
pub struct DownloadReport {
    pub items: Vec<DownloadItem>,
}

impl DownloadReport {
    pub fn downloaded(&self) -> usize {
        self.count(|r| matches!(r, Ok(FileOutcome::Downloaded { .. })))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, Ok(FileOutcome::Skipped { .. })))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| r.is_err())
    }

    fn count(&self, pred: impl Fn(&std::result::Result<FileOutcome, String>) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.result)).count()
    }
}

/// Progress notifications from [`download_selected`].
pub enum Progress<'a> {
    /// About to fetch item `index` (1-based) of `total`.
    Starting {
        index: usize,
        total: usize,
        image: &'a RemoteImage,
    },
    Finished(&'a DownloadItem),
}

/// Local destination for a camera file inside `dir`.
pub fn destination_for(image: &RemoteImage, dir: &Path) -> Result<PathBuf> {
    let name = image.file_name();
    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return Err(CameraError::filesystem(dir.join(name), "invalid file name").into());
    }
    Ok(dir.join(name))
}

/// Download one file into `dir`, unless it is already there.
///
/// Bytes go to a `.part` file that is renamed once the listed size has been
/// received. The destination mtime is set to the capture time.
pub async fn download_image(
    client: &CameraClient,
    image: &RemoteImage,
    dir: &Path,
) -> Result<FileOutcome> {
    let dst = destination_for(image, dir)?;
    if dst.exists() {
        log::info!("Already downloaded, skipping: {}", dst.display());
        return Ok(FileOutcome::Skipped { path: dst });
    }

    log::debug!(
        "Downloading file: \"{}\" => \"{}\"",
        client.url(&image.path),
        dst.display()
    );
    let mut resp = client.open_file(image).await?;

    let part = part_path(&dst);
    let mut file = tokio::fs::File::create(&part)
        .await
        .map_err(|e| CameraError::filesystem(&part, e))?;

    let url = client.url(&image.path);
    let mut received = 0u64;
    let streamed: Result<()> = async {
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| CameraError::from_request(&url, &e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| CameraError::filesystem(&part, e))?;
            received += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| CameraError::filesystem(&part, e))?;
        Ok::<(), anyhow::Error>(())
    }
    .await;
    drop(file);

    let checked = streamed.and_then(|()| {
        if received != image.size {
            Err(CameraError::Truncated {
                url: url.clone(),
                expected: image.size,
                received,
            }
            .into())
        } else {
            Ok(())
        }
    });
    if let Err(e) = checked {
        if let Err(rm) = tokio::fs::remove_file(&part).await {
            log::warn!("Failed to remove {}: {rm}", part.display());
        }
        return Err(e);
    }

    tokio::fs::rename(&part, &dst)
        .await
        .map_err(|e| CameraError::filesystem(&dst, e))?;

    if let Some(mtime) = capture_time(image) {
        if let Err(e) = set_mtime(&dst, mtime) {
            log::warn!("Failed to set mtime on {}: {e:#}", dst.display());
        }
    }

    log::info!("Saved \"{}\"", dst.display());
    Ok(FileOutcome::Downloaded {
        path: dst,
        bytes: received,
    })
}

/// Download `images` in order. Individual failures are recorded, never fatal.
pub async fn download_selected(
    client: &CameraClient,
    images: &[RemoteImage],
    dir: &Path,
    mut on_progress: impl FnMut(Progress<'_>),
) -> DownloadReport {
    let mut report = DownloadReport::default();
    let total = images.len();

    for (i, image) in images.iter().enumerate() {
        on_progress(Progress::Starting {
            index: i + 1,
            total,
            image,
        });
        log::info!("Download {}", image.path);

        let result = download_image(client, image, dir).await.map_err(|e| {
            log::error!("Failed to download {}: {e:#}", image.path);
            crate::error::user_message(&e)
        });
        report.items.push(DownloadItem {
            remote_path: image.path.clone(),
            result,
        });
        if let Some(item) = report.items.last() {
            on_progress(Progress::Finished(item));
        }
    }

    report
}

fn part_path(dst: &Path) -> PathBuf {
    let mut name = dst.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dst.with_file_name(name)
}

/// Capture time as local wall clock, the way the camera records it.
fn capture_time(image: &RemoteImage) -> Option<SystemTime> {
    let naive = image.captured_at()?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(SystemTime::from(local))
}

fn set_mtime(path: &Path, mtime: SystemTime) -> Result<()> {
    let file = std::fs::File::options()
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.set_modified(mtime)
        .with_context(|| format!("Failed to set mtime on {}", path.display()))
}
