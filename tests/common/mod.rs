//! A fake Olympus camera HTTP server for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;

use oly_imageshare::config::{CameraConfig, Config};

pub const CAMINFO: &str = "<?xml version=\"1.0\"?><caminfo><model>E-M10MarkIII</model></caminfo>";

#[derive(Clone)]
pub struct MockFile {
    pub dir: String,
    pub name: String,
    pub attributes: u32,
    pub date: u16,
    pub time: u16,
    pub content: Vec<u8>,
    /// Size reported in the listing, when it should differ from the content.
    pub listed_size: Option<u64>,
}

impl MockFile {
    pub fn new(dir: &str, name: &str, date: u16, time: u16, content: &[u8]) -> Self {
        Self {
            dir: dir.to_string(),
            name: name.to_string(),
            attributes: 0,
            date,
            time,
            content: content.to_vec(),
            listed_size: None,
        }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.dir, self.name)
    }

    fn listing_line(&self) -> String {
        let size = self.listed_size.unwrap_or(self.content.len() as u64);
        format!(
            "{},{},{},{},{},{}",
            self.dir, self.name, size, self.attributes, self.date, self.time
        )
    }
}

/// Misbehaviours the fake camera can be asked to show.
#[derive(Clone, Default)]
pub struct MockOptions {
    /// Subdirectories of the root that are listed but answer 404.
    pub failing_dirs: Vec<String>,
    /// `switch_cammode.cgi` answers 500.
    pub fail_mode_switch: bool,
    /// Every file line is sent twice.
    pub duplicate_lines: bool,
    /// A root subdirectory whose listing always contains itself again,
    /// one level deeper, next to a single JPEG.
    pub looping_dir: Option<String>,
}

struct CameraState {
    root: String,
    files: Vec<MockFile>,
    options: MockOptions,
    thumbnail_hits: AtomicUsize,
    mode_switches: AtomicUsize,
    loop_listings: AtomicUsize,
}

pub struct MockCamera {
    pub addr: SocketAddr,
    state: Arc<CameraState>,
}

impl MockCamera {
    /// Serve `files` under the `/DCIM` root on an ephemeral port.
    pub async fn start(files: Vec<MockFile>) -> Self {
        Self::start_with(files, MockOptions::default()).await
    }

    pub async fn start_with(files: Vec<MockFile>, options: MockOptions) -> Self {
        let state = Arc::new(CameraState {
            root: "/DCIM".to_string(),
            files,
            options,
            thumbnail_hits: AtomicUsize::new(0),
            mode_switches: AtomicUsize::new(0),
            loop_listings: AtomicUsize::new(0),
        });

        let router = Router::new()
            .route("/get_caminfo.cgi", get(caminfo))
            .route("/switch_cammode.cgi", get(switch_mode))
            .route("/get_imglist.cgi", get(imglist))
            .route("/get_thumbnail.cgi", get(thumbnail))
            .fallback(serve_file)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            host: self.host(),
            ..CameraConfig::default()
        }
    }

    pub fn config(&self, download_dir: &std::path::Path, cache_root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.camera = self.camera_config();
        config.download_dir = download_dir.to_path_buf();
        config.cache.root = cache_root.to_path_buf();
        config
    }

    pub fn thumbnail_hits(&self) -> usize {
        self.state.thumbnail_hits.load(Ordering::SeqCst)
    }

    pub fn mode_switches(&self) -> usize {
        self.state.mode_switches.load(Ordering::SeqCst)
    }

    /// Listing requests answered for the looping directory.
    pub fn loop_listings(&self) -> usize {
        self.state.loop_listings.load(Ordering::SeqCst)
    }
}

/// A camera address nothing listens on.
pub async fn unreachable_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

pub fn thumbnail_bytes(path: &str) -> Vec<u8> {
    format!("thumb:{path}").into_bytes()
}

async fn caminfo() -> &'static str {
    CAMINFO
}

async fn switch_mode(State(cam): State<Arc<CameraState>>) -> StatusCode {
    cam.mode_switches.fetch_add(1, Ordering::SeqCst);
    if cam.options.fail_mode_switch {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn imglist(
    State(cam): State<Arc<CameraState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(dir) = query.get("DIR") else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if cam.options.failing_dirs.iter().any(|d| d == dir) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut body = String::from("VER_100\r\n");
    if let Some(looping) = &cam.options.looping_dir {
        if dir.starts_with(looping.as_str()) {
            cam.loop_listings.fetch_add(1, Ordering::SeqCst);
            let name = looping.rsplit('/').next().unwrap_or(looping.as_str());
            body.push_str(&format!("{dir},{name},0,16,22278,35850\r\n"));
            body.push_str(&format!("{dir},P0000001.JPG,4,0,22278,35850\r\n"));
            return body.into_response();
        }
    }
    if *dir == cam.root {
        // Subdirectories of the root, one line each.
        let prefix = format!("{}/", cam.root);
        let subdirs: BTreeSet<&str> = cam
            .files
            .iter()
            .map(|f| f.dir.as_str())
            .chain(cam.options.failing_dirs.iter().map(String::as_str))
            .chain(cam.options.looping_dir.as_deref())
            .filter(|d| d.starts_with(&prefix))
            .collect();
        for sub in subdirs {
            let name = sub.rsplit('/').next().unwrap_or(sub);
            body.push_str(&format!("{},{},0,16,22278,35850\r\n", cam.root, name));
        }
    }
    let mut found = *dir == cam.root;
    for file in cam.files.iter().filter(|f| f.dir == *dir) {
        found = true;
        let copies = if cam.options.duplicate_lines { 2 } else { 1 };
        for _ in 0..copies {
            body.push_str(&file.listing_line());
            body.push_str("\r\n");
        }
    }
    if !found {
        return StatusCode::NOT_FOUND.into_response();
    }
    body.into_response()
}

async fn thumbnail(
    State(cam): State<Arc<CameraState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    cam.thumbnail_hits.fetch_add(1, Ordering::SeqCst);
    match query.get("DIR") {
        Some(path) if cam.files.iter().any(|f| f.path() == *path) => {
            thumbnail_bytes(path).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve_file(State(cam): State<Arc<CameraState>>, uri: Uri) -> Response {
    match cam.files.iter().find(|f| f.path() == uri.path()) {
        Some(file) => file.content.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
