use anyhow::{Context, Result};
use reqwest::{Client, Response};
use std::collections::HashSet;
use std::time::Duration;

use super::protocol::{
    self, ListingLine, RemoteImage, GET_CAMINFO, GET_IMGLIST, GET_MODE_PLAY,
};
use crate::config::{CameraConfig, GalleryConfig, Timeouts};
use crate::error::CameraError;

/// Directory levels below the DCIM root that are visited.
const MAX_LISTING_DEPTH: usize = 8;

/// HTTP client for the camera's Wi-Fi API.
pub struct CameraClient {
    base_url: String,
    timeouts: Timeouts,
    client: Client,
}

impl CameraClient {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.timeouts.file())
            .read_timeout(config.timeouts.file())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url(&config.host),
            timeouts: config.timeouts.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// GET a URL and fail on anything but 200.
    async fn get(&self, path_and_query: &str, timeout: Option<Duration>) -> Result<Response> {
        let url = self.url(path_and_query);
        log::debug!("Getting URL: \"{url}\"");

        let mut request = self.client.get(&url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| CameraError::from_request(&url, &e))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(CameraError::Http {
                status: status.as_u16(),
                url,
            }
            .into());
        }
        Ok(resp)
    }

    async fn get_text(&self, path_and_query: &str, timeout: Duration) -> Result<String> {
        let url = self.url(path_and_query);
        let resp = self.get(path_and_query, Some(timeout)).await?;
        resp.text()
            .await
            .map_err(|e| CameraError::from_request(&url, &e).into())
    }

    /// Query camera model and firmware, also used as the connection check.
    pub async fn camera_info(&self) -> Result<String> {
        self.get_text(GET_CAMINFO, self.timeouts.command())
            .await
            .context("Failed to get camera info")
    }

    /// The listing commands only answer in play mode.
    pub async fn switch_to_play(&self) -> Result<()> {
        log::info!("Setting camera mode: {}", self.url(GET_MODE_PLAY));
        self.get(GET_MODE_PLAY, Some(self.timeouts.command()))
            .await
            .context("Failed to switch camera to play mode")?;
        Ok(())
    }

    /// List one camera directory.
    pub async fn list_directory(&self, dir: &str) -> Result<Vec<ListingLine>> {
        let query = format!("{GET_IMGLIST}?DIR={dir}");
        let body = self
            .get_text(&query, self.timeouts.imglist())
            .await
            .with_context(|| format!("Failed to list {dir}"))?;
        Ok(protocol::parse_listing(&body))
    }

    /// Walk the camera tree from `root` and return the shown files, newest first.
    ///
    /// Switches to play mode first; a failure there is only logged. Failing to
    /// list `root` is an error, failing to list a subdirectory is not.
    pub async fn list_images(
        &self,
        root: &str,
        gallery: &GalleryConfig,
    ) -> Result<Vec<RemoteImage>> {
        if let Err(e) = self.switch_to_play().await {
            log::error!("{e:#}");
        }

        let mut images = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![(root.to_string(), 0usize)];

        while let Some((dir, depth)) = pending.pop() {
            let lines = match self.list_directory(&dir).await {
                Ok(lines) => lines,
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    log::error!("{e:#}");
                    continue;
                }
            };

            for line in lines {
                if line.is_ignored() {
                    continue;
                }
                if line.is_directory() {
                    if depth < MAX_LISTING_DEPTH {
                        pending.push((line.path(), depth + 1));
                    } else {
                        log::warn!("Not descending into {}: too deep", line.path());
                    }
                } else if line.is_plain_file() && gallery.shows(&line.name) {
                    let image = RemoteImage::from_line(&line);
                    if seen.insert(image.path.clone()) {
                        images.push(image);
                    }
                }
            }
        }

        protocol::sort_newest_first(&mut images);
        log::info!("Found {} image(s) on the camera", images.len());
        Ok(images)
    }

    pub async fn fetch_thumbnail(&self, image: &RemoteImage) -> Result<Vec<u8>> {
        let query = image.thumbnail_request();
        let url = self.url(&query);
        let resp = self.get(&query, Some(self.timeouts.thumbnail())).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CameraError::from_request(&url, &e))?;
        Ok(bytes.to_vec())
    }

    /// Start downloading a full-size file. The body is read by the caller.
    pub async fn open_file(&self, image: &RemoteImage) -> Result<Response> {
        self.get(&image.path, None)
            .await
            .with_context(|| format!("Failed to get {}", image.path))
    }
}

fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}
