//! On-disk thumbnail cache.
//!
//! Thumbnails are stored under a two-level fan-out keyed by a truncated
//! SHA-256 of the remote path, size and timestamp, so a file replaced on the
//! card under the same name gets a fresh entry.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

use crate::camera::{CameraClient, RemoteImage};
use crate::error::CameraError;

const SECONDS_PER_DAY: u64 = 24 * 3600;

pub struct ThumbnailCache {
    root: PathBuf,
}

impl ThumbnailCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache key: 16 hex chars of SHA-256 over `path-size-timestamp`.
    pub fn key(image: &RemoteImage) -> String {
        let seed = format!("{}-{}-{}", image.path, image.size, image.timestamp);
        let digest = Sha256::digest(seed.as_bytes());
        digest
            .iter()
            .take(8)
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    pub fn path_for(&self, image: &RemoteImage) -> PathBuf {
        let key = Self::key(image);
        self.root
            .join(&key[0..2])
            .join(&key[2..4])
            .join(format!("{key}.jpg"))
    }

    /// Cached bytes, if present. A hit refreshes the file's mtime.
    pub fn get(&self, image: &RemoteImage) -> Option<Vec<u8>> {
        let path = self.path_for(image);
        let bytes = std::fs::read(&path).ok()?;
        if let Err(e) = touch(&path) {
            log::debug!("Failed to touch {}: {e}", path.display());
        }
        Some(bytes)
    }

    pub fn put(&self, image: &RemoteImage, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(image);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| CameraError::filesystem(dir, e))
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        std::fs::write(&path, bytes)
            .map_err(|e| CameraError::filesystem(&path, e))
            .context("Failed to write thumbnail")?;
        Ok(path)
    }

    /// Return the cached thumbnail or fetch it from the camera and store it.
    pub async fn get_or_fetch(&self, client: &CameraClient, image: &RemoteImage) -> Result<Vec<u8>> {
        if let Some(bytes) = self.get(image) {
            return Ok(bytes);
        }
        let bytes = client
            .fetch_thumbnail(image)
            .await
            .with_context(|| format!("Failed to get thumbnail for {}", image.path))?;
        if let Err(e) = self.put(image, &bytes) {
            log::error!("{e:#}");
        }
        Ok(bytes)
    }

    /// Delete cached `.jpg` files not touched for more than `max_age_days`.
    /// Returns the number of files removed.
    pub fn purge_older_than(&self, max_age_days: u64) -> usize {
        let max_age = Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY));
        self.purge_before(SystemTime::now(), max_age)
    }

    fn purge_before(&self, now: SystemTime, max_age: Duration) -> usize {
        log::debug!("Cleaning cache directory from older files");
        let mut removed = 0;
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("jpg")
            {
                continue;
            }
            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(t)) => t,
                Ok(Err(e)) => {
                    log::error!("Failed to get mtime from \"{}\": {e}", path.display());
                    continue;
                }
                Err(e) => {
                    log::error!("Failed to get mtime from \"{}\": {e}", path.display());
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age > max_age {
                log::debug!("Purging file \"{}\"", path.display());
                match std::fs::remove_file(path) {
                    Ok(()) => removed += 1,
                    Err(e) => log::error!("Failed to remove \"{}\": {e}", path.display()),
                }
            }
        }
        removed
    }
}

fn touch(path: &Path) -> std::io::Result<()> {
    std::fs::File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::protocol::parse_listing_line;
    use tempfile::TempDir;

    fn image(line: &str) -> RemoteImage {
        RemoteImage::from_line(&parse_listing_line(line).unwrap())
    }

    #[test]
    fn key_is_stable_and_short() {
        let a = image("/DCIM/100OLYMP,P1.JPG,10,0,22278,35850");
        let key = ThumbnailCache::key(&a);
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, ThumbnailCache::key(&a.clone()));
    }

    #[test]
    fn key_changes_with_size() {
        let a = image("/DCIM/100OLYMP,P1.JPG,10,0,22278,35850");
        let b = image("/DCIM/100OLYMP,P1.JPG,11,0,22278,35850");
        assert_ne!(ThumbnailCache::key(&a), ThumbnailCache::key(&b));
    }

    #[test]
    fn path_fans_out() {
        let cache = ThumbnailCache::new("/cache");
        let img = image("/DCIM/100OLYMP,P1.JPG,10,0,22278,35850");
        let key = ThumbnailCache::key(&img);
        let expected = PathBuf::from("/cache")
            .join(&key[0..2])
            .join(&key[2..4])
            .join(format!("{key}.jpg"));
        assert_eq!(cache.path_for(&img), expected);
    }

    #[test]
    fn put_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(dir.path());
        let img = image("/DCIM/100OLYMP,P1.JPG,10,0,22278,35850");

        assert!(cache.get(&img).is_none());
        cache.put(&img, b"thumb").unwrap();
        assert_eq!(cache.get(&img).as_deref(), Some(&b"thumb"[..]));
    }

    #[test]
    fn purge_removes_only_old_jpgs() {
        let dir = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(dir.path());
        let img = image("/DCIM/100OLYMP,P1.JPG,10,0,22278,35850");
        let thumb = cache.put(&img, b"thumb").unwrap();
        let other = dir.path().join("notes.txt");
        std::fs::write(&other, b"keep").unwrap();

        // Nothing is older than a day yet.
        assert_eq!(cache.purge_older_than(1), 0);
        assert!(thumb.exists());

        let later = SystemTime::now() + Duration::from_secs(10 * SECONDS_PER_DAY);
        assert_eq!(cache.purge_before(later, Duration::from_secs(SECONDS_PER_DAY)), 1);
        assert!(!thumb.exists());
        assert!(other.exists());
    }

    #[test]
    fn huge_max_age_keeps_everything() {
        let dir = TempDir::new().unwrap();
        let cache = ThumbnailCache::new(dir.path());
        let img = image("/DCIM/100OLYMP,P1.JPG,10,0,22278,35850");
        let thumb = cache.put(&img, b"thumb").unwrap();

        assert_eq!(cache.purge_older_than(u64::MAX / 1000), 0);
        assert_eq!(cache.purge_older_than(u64::MAX), 0);
        assert!(thumb.exists());
    }

    #[test]
    fn purge_missing_root_is_noop() {
        let cache = ThumbnailCache::new("/nonexistent/oly-cache");
        assert_eq!(cache.purge_older_than(1), 0);
    }
}
