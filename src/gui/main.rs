#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;

use oly_imageshare::cache::ThumbnailCache;
use oly_imageshare::camera::{CameraClient, CameraSession, ConnectionState, RemoteImage};
use oly_imageshare::config::Config;
use oly_imageshare::download::{self, Progress};
use oly_imageshare::error;
use oly_imageshare::gallery::{progress_label, Gallery};

/// Window title in desktop environments.
const APP_TITLE: &str = "Open Oly ImageShare";

/// Pages skipped by the fast-forward and fast-backward buttons.
const FAST_STEP: usize = 5;

/// Longest side of a decoded thumbnail texture.
const THUMB_DECODE_SIZE: u32 = 240;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let viewport = egui::ViewportBuilder::default()
        .with_title(APP_TITLE)
        .with_inner_size([720.0, 900.0])
        .with_min_inner_size([360.0, 480.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}

// ── Messages sent from background tasks to the UI ───────────────────

enum BgMessage {
    /// Connection check finished.
    Connection(ConnectionState),
    /// Camera listing finished (error already formatted for display).
    Listing(Result<Vec<RemoteImage>, String>),
    /// A thumbnail was fetched and decoded, or failed (`None`).
    Thumbnail {
        path: String,
        image: Option<egui::ColorImage>,
    },
    /// Download of item `index` of `total` is starting.
    /// The thumbnail worker has no more requests in flight.
    ThumbnailsDone,
    DownloadProgress { index: usize, total: usize },
    /// This camera path is now in the download directory.
    Downloaded(String),
    /// All selected files were processed.
    DownloadDone(String),
    CachePurged(usize),
}

// ── Screens ─────────────────────────────────────────────────────────

#[derive(PartialEq, Clone, Copy)]
enum Screen {
    Menu,
    Gallery,
    Connection,
    Settings,
    About,
}

enum Thumb {
    Loading,
    Ready(egui::TextureHandle),
    Broken,
}

// ── Main application state ──────────────────────────────────────────

struct App {
    config: Config,
    config_path: Option<PathBuf>,
    screen: Screen,
    status: String,

    session: CameraSession,
    checking: bool,

    gallery: Option<Gallery>,
    listing: bool,
    listing_error: Option<String>,
    thumbs: HashMap<String, Thumb>,
    fetching_thumbs: bool,

    confirm_download: bool,
    downloading: bool,
    download_label: String,

    rx: mpsc::Receiver<BgMessage>,
    tx: mpsc::Sender<BgMessage>,
    /// Tokio runtime for async tasks.
    rt: tokio::runtime::Runtime,
}

impl App {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (tx, rx) = mpsc::channel();
        let config = Config::load(None).unwrap_or_else(|e| {
            log::error!("Failed to load settings: {e:#}");
            Config::default()
        });
        let session = CameraSession::new(config.camera.host.clone());

        Self {
            config,
            config_path: None,
            screen: Screen::Menu,
            status: "Ready".into(),
            session,
            checking: false,
            gallery: None,
            listing: false,
            listing_error: None,
            thumbs: HashMap::new(),
            fetching_thumbs: false,
            confirm_download: false,
            downloading: false,
            download_label: String::new(),
            rx,
            tx,
            rt: tokio::runtime::Runtime::new().expect("Failed to create tokio runtime"),
        }
    }

    fn busy(&self) -> bool {
        self.checking || self.listing || self.downloading
    }

    fn client(&self) -> Result<CameraClient, String> {
        CameraClient::new(&self.config.camera).map_err(|e| error::user_message(&e))
    }

    fn go(&mut self, screen: Screen) {
        if self.screen == Screen::Gallery && screen != Screen::Gallery {
            self.leave_gallery();
        }
        self.screen = screen;
        match screen {
            Screen::Connection => self.start_check(),
            Screen::Gallery => self.enter_gallery(),
            _ => {}
        }
    }

    fn start_check(&mut self) {
        if self.checking {
            return;
        }
        self.checking = true;
        self.session.host = self.config.camera.host.clone();
        self.session.disconnect();
        self.status = "Testing connection...".into();

        let camera = self.config.camera.clone();
        let host = camera.host.clone();
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let state = match CameraClient::new(&camera) {
                Ok(client) => {
                    let mut session = CameraSession::new(host);
                    session.check(&client).await.clone()
                }
                Err(e) => ConnectionState::Unreachable {
                    message: error::user_message(&e),
                },
            };
            let _ = tx.send(BgMessage::Connection(state));
        });
    }

    fn enter_gallery(&mut self) {
        if let Err(e) = self.config.ensure_download_dir() {
            log::error!("{e:#}");
            self.status = error::user_message(&e);
        }
        self.start_cache_purge();
        self.start_listing();
    }

    fn leave_gallery(&mut self) {
        if let Some(ref gallery) = self.gallery {
            let page = gallery.current_page();
            self.config.last_selected_page = page;
            // Unsaved edits from the Settings screen stay in memory only.
            if let Err(e) = Config::save_last_selected_page(self.config_path.as_deref(), page) {
                log::error!("Failed to save settings: {e:#}");
            }
        }
    }

    fn start_cache_purge(&mut self) {
        let cache = ThumbnailCache::new(&self.config.cache.root);
        let max_age_days = self.config.cache.max_age_days;
        let tx = self.tx.clone();
        self.rt.spawn_blocking(move || {
            let removed = cache.purge_older_than(max_age_days);
            let _ = tx.send(BgMessage::CachePurged(removed));
        });
    }

    fn start_listing(&mut self) {
        if self.listing || self.downloading {
            return;
        }
        self.listing = true;
        self.listing_error = None;
        self.status = "Reading image list...".into();

        let client = match self.client() {
            Ok(c) => c,
            Err(msg) => {
                self.listing = false;
                self.listing_error = Some(msg);
                return;
            }
        };
        let root = self.config.camera.dcim_root.clone();
        let gallery = self.config.gallery.clone();
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let result = client
                .list_images(&root, &gallery)
                .await
                .map_err(|e| error::user_message(&e));
            let _ = tx.send(BgMessage::Listing(result));
        });
    }

    /// Fetch thumbnails for the visible page that are not loaded yet.
    fn load_page_thumbnails(&mut self) {
        if self.fetching_thumbs {
            // Picked up again on ThumbnailsDone.
            return;
        }
        let Some(ref gallery) = self.gallery else {
            return;
        };
        let wanted: Vec<RemoteImage> = gallery
            .page_items()
            .iter()
            .filter(|i| !self.thumbs.contains_key(&i.path))
            .cloned()
            .collect();
        if wanted.is_empty() {
            return;
        }
        let client = match self.client() {
            Ok(c) => c,
            Err(msg) => {
                self.status = msg;
                return;
            }
        };
        for image in &wanted {
            self.thumbs.insert(image.path.clone(), Thumb::Loading);
        }

        self.fetching_thumbs = true;
        let cache = ThumbnailCache::new(&self.config.cache.root);
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            // One at a time: the camera serves requests serially.
            for image in wanted {
                let decoded = match cache.get_or_fetch(&client, &image).await {
                    Ok(bytes) => decode_thumbnail(&bytes),
                    Err(e) => {
                        log::error!("{e:#}");
                        None
                    }
                };
                let _ = tx.send(BgMessage::Thumbnail {
                    path: image.path,
                    image: decoded,
                });
            }
            let _ = tx.send(BgMessage::ThumbnailsDone);
        });
    }

    fn start_download(&mut self) {
        let Some(ref gallery) = self.gallery else {
            return;
        };
        let selected = gallery.selected_images();
        if selected.is_empty() || self.downloading {
            return;
        }
        let dir = match self.config.ensure_download_dir() {
            Ok(dir) => dir.to_path_buf(),
            Err(e) => {
                log::error!("{e:#}");
                self.status = error::user_message(&e);
                return;
            }
        };
        let client = match self.client() {
            Ok(c) => c,
            Err(msg) => {
                self.status = msg;
                return;
            }
        };

        self.downloading = true;
        self.download_label = progress_label(1, selected.len());
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            let report = download::download_selected(&client, &selected, &dir, |progress| {
                match progress {
                    Progress::Starting { index, total, .. } => {
                        let _ = tx.send(BgMessage::DownloadProgress { index, total });
                    }
                    Progress::Finished(item) => {
                        if item.result.is_ok() {
                            let _ = tx.send(BgMessage::Downloaded(item.remote_path.clone()));
                        }
                    }
                }
            })
            .await;

            let mut summary = format!(
                "Downloaded {}, skipped {}, failed {}",
                report.downloaded(),
                report.skipped(),
                report.failed()
            );
            if let Some(err) = report.items.iter().find_map(|i| i.result.as_ref().err()) {
                summary.push_str(&format!(" ({err})"));
            }
            let _ = tx.send(BgMessage::DownloadDone(summary));
        });
    }

    fn poll_messages(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BgMessage::Connection(state) => {
                    self.checking = false;
                    self.session.state = state;
                    self.status = if self.session.is_connected() {
                        "Camera connected".into()
                    } else {
                        "Camera not reachable".into()
                    };
                }
                BgMessage::Listing(Ok(images)) => {
                    self.listing = false;
                    self.status = format!("{} image(s) on the camera", images.len());
                    let mut gallery =
                        Gallery::new(images, self.config.gallery.rows, self.config.gallery.cols);
                    gallery.set_page(self.config.last_selected_page);
                    self.gallery = Some(gallery);
                    self.load_page_thumbnails();
                }
                BgMessage::Listing(Err(msg)) => {
                    self.listing = false;
                    self.status = "Failed to read image list".into();
                    self.listing_error = Some(msg);
                }
                BgMessage::Thumbnail { path, image } => {
                    let thumb = match image {
                        Some(image) => Thumb::Ready(ctx.load_texture(
                            path.clone(),
                            image,
                            egui::TextureOptions::LINEAR,
                        )),
                        None => Thumb::Broken,
                    };
                    self.thumbs.insert(path, thumb);
                }
                BgMessage::ThumbnailsDone => {
                    self.fetching_thumbs = false;
                    // The page may have changed while fetching.
                    self.load_page_thumbnails();
                }
                BgMessage::DownloadProgress { index, total } => {
                    self.download_label = progress_label(index, total);
                }
                BgMessage::Downloaded(path) => {
                    if let Some(ref mut gallery) = self.gallery {
                        gallery.mark_downloaded(&path);
                    }
                }
                BgMessage::DownloadDone(summary) => {
                    self.downloading = false;
                    self.status = summary;
                }
                BgMessage::CachePurged(removed) => {
                    if removed > 0 {
                        log::info!("Purged {removed} old thumbnail(s)");
                    }
                }
            }
        }
    }
}

fn decode_thumbnail(bytes: &[u8]) -> Option<egui::ColorImage> {
    let img = image::load_from_memory(bytes).ok()?;
    let img = img.thumbnail(THUMB_DECODE_SIZE, THUMB_DECODE_SIZE);
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    let pixels = rgba.as_flat_samples();
    Some(egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()))
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages(ctx);

        // Keep polling while background work is running
        let thumbs_loading = self.thumbs.values().any(|t| matches!(t, Thumb::Loading));
        if self.busy() || thumbs_loading {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        // Escape goes back to the menu
        if self.screen != Screen::Menu
            && !self.downloading
            && ctx.input(|i| i.key_pressed(egui::Key::Escape))
        {
            self.confirm_download = false;
            self.go(Screen::Menu);
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.busy() {
                    ui.spinner();
                }
                ui.label(&self.status);
            });
        });

        match self.screen {
            Screen::Menu => self.show_menu(ctx),
            Screen::Gallery => self.show_gallery(ctx),
            Screen::Connection => self.show_connection(ctx),
            Screen::Settings => self.show_settings(ctx),
            Screen::About => self.show_about(ctx),
        }
    }
}

// ── Menu and simple screens ─────────────────────────────────────────

impl App {
    fn show_menu(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(12.0);
            ui.vertical_centered_justified(|ui| {
                let height = (ui.available_height() * 0.10).max(36.0);
                let entries = [
                    ("Camera Gallery", Some(Screen::Gallery)),
                    ("Check Camera Connection", Some(Screen::Connection)),
                    ("Settings", Some(Screen::Settings)),
                    ("About", Some(Screen::About)),
                    ("Quit", None),
                ];
                for (label, target) in entries {
                    let button = egui::Button::new(egui::RichText::new(label).size(18.0))
                        .min_size(egui::vec2(ui.available_width(), height));
                    if ui.add(button).clicked() {
                        match target {
                            Some(screen) => self.go(screen),
                            None => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
                        }
                    }
                    ui.add_space(12.0);
                }
            });
        });
    }

    fn back_button(&mut self, ui: &mut egui::Ui) {
        if ui
            .add_enabled(!self.downloading, egui::Button::new("⬅ Menu"))
            .clicked()
        {
            self.go(Screen::Menu);
        }
    }

    fn show_connection(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("connection_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                self.back_button(ui);
                ui.separator();
                if ui
                    .add_enabled(!self.checking, egui::Button::new("🔄 Retry"))
                    .clicked()
                {
                    self.start_check();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label(format!("Camera: {}", self.session.host));
                ui.separator();
                match &self.session.state {
                    _ if self.checking => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Testing connection...");
                        });
                    }
                    ConnectionState::Connected { info } => {
                        ui.colored_label(egui::Color32::from_rgb(50, 180, 50), "✓ Connected");
                        ui.add_space(8.0);
                        ui.label(egui::RichText::new(info).monospace());
                    }
                    ConnectionState::Unreachable { message } => {
                        ui.colored_label(egui::Color32::from_rgb(220, 50, 50), message);
                    }
                    ConnectionState::Unknown => {
                        ui.label("Not checked yet");
                    }
                }
            });
        });
    }

    fn show_about(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("about_top").show(ctx, |ui| {
            ui.horizontal(|ui| self.back_button(ui));
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.heading(APP_TITLE);
                ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                ui.add_space(12.0);
                ui.label(env!("CARGO_PKG_DESCRIPTION"));
                ui.add_space(12.0);
                ui.label(format!("License: {}", env!("CARGO_PKG_LICENSE")));
                ui.label(format!("Author: {}", env!("CARGO_PKG_AUTHORS")));
            });
        });
    }
}

// ── Gallery screen ──────────────────────────────────────────────────

impl App {
    fn show_gallery(&mut self, ctx: &egui::Context) {
        let has_selection = self
            .gallery
            .as_ref()
            .is_some_and(|g| g.selected_count() > 0);
        let can_page = !self.downloading && self.gallery.as_ref().is_some_and(|g| !g.is_empty());

        // ── Top toolbar ─────────────────────────────────────────────
        egui::TopBottomPanel::top("gallery_top").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                self.back_button(ui);
                ui.separator();
                if ui
                    .add_enabled(can_page, egui::Button::new("☑ Select page"))
                    .clicked()
                {
                    if let Some(ref mut g) = self.gallery {
                        g.select_page();
                    }
                }
                if ui
                    .add_enabled(can_page, egui::Button::new("☐ Unselect page"))
                    .clicked()
                {
                    if let Some(ref mut g) = self.gallery {
                        g.unselect_page();
                    }
                }
                ui.separator();
                if ui
                    .add_enabled(has_selection && !self.downloading, egui::Button::new("⬇ Download"))
                    .clicked()
                {
                    self.confirm_download = true;
                }
                if ui
                    .add_enabled(!self.busy(), egui::Button::new("🔄 Reload"))
                    .clicked()
                {
                    self.thumbs.clear();
                    self.start_listing();
                }
            });
            ui.add_space(4.0);
        });

        // ── Bottom paging bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("gallery_bottom").show(ctx, |ui| {
            ui.add_space(4.0);
            let mut moved = false;
            ui.horizontal(|ui| {
                if ui.add_enabled(can_page, egui::Button::new("◀")).clicked() {
                    if let Some(ref mut g) = self.gallery {
                        g.backward(1);
                        moved = true;
                    }
                }
                if ui.add_enabled(can_page, egui::Button::new("⏪")).clicked() {
                    if let Some(ref mut g) = self.gallery {
                        g.backward(FAST_STEP);
                        moved = true;
                    }
                }
                if let Some(ref g) = self.gallery {
                    ui.label(g.selection_label());
                    ui.separator();
                    ui.label(g.page_label());
                }
                if ui.add_enabled(can_page, egui::Button::new("⏩")).clicked() {
                    if let Some(ref mut g) = self.gallery {
                        g.forward(FAST_STEP);
                        moved = true;
                    }
                }
                if ui.add_enabled(can_page, egui::Button::new("▶")).clicked() {
                    if let Some(ref mut g) = self.gallery {
                        g.forward(1);
                        moved = true;
                    }
                }
            });
            ui.add_space(4.0);
            if moved {
                self.load_page_thumbnails();
            }
        });

        // ── Thumbnail grid ──────────────────────────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(ref msg) = self.listing_error {
                ui.colored_label(egui::Color32::from_rgb(220, 50, 50), msg);
                return;
            }
            if self.listing {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            let Some(ref mut gallery) = self.gallery else {
                return;
            };
            if gallery.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("No images on the camera")
                            .size(18.0)
                            .color(egui::Color32::GRAY),
                    );
                });
                return;
            }

            let spacing = 6.0;
            let cols = gallery.cols();
            let rows = gallery.rows();
            let cell_w = (ui.available_width() - spacing * (cols as f32 - 1.0)) / cols as f32;
            let cell_h = (ui.available_height() - spacing * (rows as f32 - 1.0)) / rows as f32;
            let cell = egui::vec2(cell_w.max(16.0), cell_h.max(16.0));

            let items: Vec<RemoteImage> = gallery.page_items().to_vec();
            let mut toggled: Option<String> = None;

            egui::Grid::new("thumbnails_grid")
                .spacing([spacing, spacing])
                .show(ui, |ui| {
                    for row in 0..rows {
                        for col in 0..cols {
                            let image = items.get(row * cols + col);
                            let clicked = show_cell(
                                ui,
                                cell,
                                image,
                                image.and_then(|i| self.thumbs.get(&i.path)),
                                image.is_some_and(|i| gallery.is_selected(&i.path)),
                            );
                            if clicked && !self.downloading {
                                toggled = image.map(|i| i.path.clone());
                            }
                        }
                        ui.end_row();
                    }
                });

            if let Some(path) = toggled {
                gallery.toggle(&path);
            }
        });

        self.show_download_windows(ctx);
    }

    fn show_download_windows(&mut self, ctx: &egui::Context) {
        if self.confirm_download {
            let count = self.gallery.as_ref().map_or(0, |g| g.selected_count());
            egui::Window::new("File Download")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!("Ready to download {count} files..."));
                    ui.label(format!("To: {}", self.config.download_dir.display()));
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("Cancel").clicked() {
                            self.confirm_download = false;
                        }
                        if ui.button("OK").clicked() {
                            self.confirm_download = false;
                            self.start_download();
                        }
                    });
                });
        }

        if self.downloading {
            egui::Window::new("Downloading...")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(&self.download_label);
                    });
                });
        }
    }
}

/// Draw one grid cell. Returns `true` when an image cell was clicked.
fn show_cell(
    ui: &mut egui::Ui,
    size: egui::Vec2,
    image: Option<&RemoteImage>,
    thumb: Option<&Thumb>,
    selected: bool,
) -> bool {
    let sense = if image.is_some() {
        egui::Sense::click()
    } else {
        egui::Sense::hover()
    };
    let (rect, response) = ui.allocate_exact_size(size, sense);
    let painter = ui.painter_at(rect);
    let visuals = ui.visuals();

    painter.rect_filled(rect, 4.0, visuals.extreme_bg_color);

    let Some(image) = image else {
        return false;
    };

    match thumb {
        Some(Thumb::Ready(tex)) => {
            let tex_size = tex.size_vec2();
            let scale = (rect.width() / tex_size.x).min(rect.height() / tex_size.y);
            let img_rect = egui::Rect::from_center_size(rect.center(), tex_size * scale);
            painter.image(
                tex.id(),
                img_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        Some(Thumb::Broken) => {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                format!("⚠\n{}", image.file_name()),
                egui::FontId::proportional(12.0),
                egui::Color32::GRAY,
            );
        }
        Some(Thumb::Loading) | None => {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "…",
                egui::FontId::proportional(24.0),
                egui::Color32::GRAY,
            );
        }
    }

    if image.is_video() {
        painter.text(
            rect.left_bottom() + egui::vec2(4.0, -4.0),
            egui::Align2::LEFT_BOTTOM,
            "🎞",
            egui::FontId::proportional(16.0),
            egui::Color32::WHITE,
        );
    }

    if selected {
        let mark = rect.center() + egui::vec2(1.5, 1.5);
        painter.text(
            mark,
            egui::Align2::CENTER_CENTER,
            "✔",
            egui::FontId::proportional(size.y.min(size.x) * 0.4),
            egui::Color32::from_black_alpha(150),
        );
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "✔",
            egui::FontId::proportional(size.y.min(size.x) * 0.4),
            egui::Color32::YELLOW,
        );
    }

    response.on_hover_text(format!("{}\n{} bytes\n{}", image.path, image.size, image.timestamp))
        .clicked()
}

// ── Settings screen ─────────────────────────────────────────────────

impl App {
    fn show_settings(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("settings_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                self.back_button(ui);
                ui.separator();
                if ui.button("💾 Save").clicked() {
                    self.save_settings();
                }
                if ui.button("Defaults").clicked() {
                    self.config = Config::default();
                    self.status = "Defaults restored (not saved)".into();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Camera");
                ui.add_space(4.0);
                egui::Grid::new("camera_settings")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Camera address:");
                        ui.text_edit_singleline(&mut self.config.camera.host);
                        ui.end_row();

                        ui.label("Images root:");
                        ui.text_edit_singleline(&mut self.config.camera.dcim_root);
                        ui.end_row();

                        let timeouts = &mut self.config.camera.timeouts;
                        for (label, value) in [
                            ("Command timeout (ms):", &mut timeouts.command_ms),
                            ("Listing timeout (ms):", &mut timeouts.imglist_ms),
                            ("Thumbnail timeout (ms):", &mut timeouts.thumbnail_ms),
                            ("File timeout (ms):", &mut timeouts.file_ms),
                        ] {
                            ui.label(label);
                            ui.add(egui::DragValue::new(value).range(100..=60_000).speed(50));
                            ui.end_row();
                        }
                    });

                ui.add_space(16.0);
                ui.separator();
                ui.add_space(8.0);
                ui.heading("Download");
                ui.add_space(4.0);

                let mut dir = self.config.download_dir.display().to_string();
                ui.horizontal(|ui| {
                    ui.label("Download directory:");
                    if ui.text_edit_singleline(&mut dir).changed() {
                        self.config.download_dir = PathBuf::from(&dir);
                    }
                    if ui.button("Browse...").clicked() {
                        if let Some(picked) = rfd::FileDialog::new()
                            .set_directory(&self.config.download_dir)
                            .pick_folder()
                        {
                            self.config.download_dir = picked;
                        }
                    }
                });

                ui.add_space(16.0);
                ui.separator();
                ui.add_space(8.0);
                ui.heading("Gallery");
                ui.add_space(4.0);

                egui::Grid::new("gallery_settings")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Rows:");
                        ui.add(egui::DragValue::new(&mut self.config.gallery.rows).range(1..=12));
                        ui.end_row();

                        ui.label("Columns:");
                        ui.add(egui::DragValue::new(&mut self.config.gallery.cols).range(1..=12));
                        ui.end_row();

                        ui.label("Thumbnail cache age (days):");
                        ui.add(
                            egui::DragValue::new(&mut self.config.cache.max_age_days)
                                .range(1..=3650),
                        );
                        ui.end_row();
                    });
            });
        });
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.config.ensure_download_dir() {
            log::error!("{e:#}");
            self.status = error::user_message(&e);
            return;
        }
        match self.config.save(self.config_path.as_deref()) {
            Ok(path) => {
                self.config_path = Some(path);
                self.session.host = self.config.camera.host.clone();
                self.session.disconnect();
                // Layout or host may have changed
                self.gallery = None;
                self.thumbs.clear();
                self.status = "Settings saved".into();
            }
            Err(e) => self.status = format!("Failed to save settings: {e:#}"),
        }
    }
}
