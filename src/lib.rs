//! # oly-imageshare
//!
//! Download photos from an Olympus camera over its built-in Wi-Fi access point.
//!
//! ## Quick Start
//!
//! Join the camera's Wi-Fi network first (on the camera, pick
//! "Connection to Smartphone" from the Playback Menu). Then:
//!
//! ```rust,no_run
//! use oly_imageshare::camera::CameraClient;
//! use oly_imageshare::config::Config;
//! use oly_imageshare::download::download_selected;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let client = CameraClient::new(&config.camera)?;
//!
//!     println!("{}", client.camera_info().await?);
//!
//!     let images = client
//!         .list_images(&config.camera.dcim_root, &config.gallery)
//!         .await?;
//!     let dir = config.ensure_download_dir()?;
//!     let report = download_selected(&client, &images, dir, |_| {}).await;
//!     println!("{} downloaded, {} failed", report.downloaded(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Camera API
//!
//! | Request | Purpose |
//! |---------|---------|
//! | `/get_caminfo.cgi` | Camera model, used as the connection check |
//! | `/switch_cammode.cgi?mode=play` | Enter play mode before listing |
//! | `/get_imglist.cgi?DIR=/DCIM` | CSV directory listing |
//! | `/get_thumbnail.cgi?DIR=<path>` | JPEG thumbnail |
//! | `<path>` | Full-size file |
//!
//! ## Modules
//!
//! - [`camera`] — protocol parsing, HTTP client, session state
//! - [`config`] — persistent settings
//! - [`download`] — writes files into the download directory
//! - [`cache`] — thumbnail cache
//! - [`gallery`] — paging and selection model
//! - [`error`] — failure taxonomy and user-facing messages

pub mod cache;
pub mod camera;
pub mod config;
pub mod download;
pub mod error;
pub mod gallery;
