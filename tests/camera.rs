mod common;

use common::{MockCamera, MockFile, MockOptions, CAMINFO};
use oly_imageshare::cache::ThumbnailCache;
use oly_imageshare::camera::{CameraClient, CameraSession, ConnectionState};
use oly_imageshare::config::{CameraConfig, GalleryConfig};
use oly_imageshare::error::{self, FailureKind};
use tempfile::TempDir;

fn sample_files() -> Vec<MockFile> {
    let mut hidden = MockFile::new("/DCIM/100OLYMP", "HIDDEN.JPG", 22278, 35850, b"h");
    hidden.attributes = 2;
    vec![
        MockFile::new("/DCIM/100OLYMP", "P8060001.JPG", 22278, 35850, b"first jpeg"),
        MockFile::new("/DCIM/100OLYMP", "P9140459.MOV", 22318, 12940, b"a movie"),
        MockFile::new("/DCIM/100OLYMP", "P8060002.ORF", 22278, 35851, b"raw"),
        hidden,
        MockFile::new("/DCIM/101OLYMP", "PA010003.JPG", 22337, 20000, b"newest"),
    ]
}

#[tokio::test]
async fn camera_info_returns_body() {
    let cam = MockCamera::start(sample_files()).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();

    assert_eq!(client.camera_info().await.unwrap(), CAMINFO);

    let mut session = CameraSession::new(cam.host());
    assert!(matches!(session.check(&client).await, ConnectionState::Connected { .. }));
    assert!(session.is_connected());
    session.disconnect();
    assert_eq!(session.state, ConnectionState::Unknown);
}

#[tokio::test]
async fn listing_matches_camera() {
    let cam = MockCamera::start(sample_files()).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();

    let images = client
        .list_images("/DCIM", &GalleryConfig::default())
        .await
        .unwrap();

    let paths: Vec<&str> = images.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/DCIM/101OLYMP/PA010003.JPG",
            "/DCIM/100OLYMP/P9140459.MOV",
            "/DCIM/100OLYMP/P8060001.JPG",
        ]
    );
    assert_eq!(images[2].size, b"first jpeg".len() as u64);
    assert_eq!(images[2].timestamp, "2023-08-06T17:32:20");
    assert_eq!(cam.mode_switches(), 1);
}

#[tokio::test]
async fn listing_respects_extension_filter() {
    let cam = MockCamera::start(sample_files()).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();
    let gallery = GalleryConfig {
        show_extensions: vec!["orf".into()],
        ..GalleryConfig::default()
    };

    let images = client.list_images("/DCIM", &gallery).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].file_name(), "P8060002.ORF");
}

#[tokio::test]
async fn missing_root_is_http_error() {
    let cam = MockCamera::start(sample_files()).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();

    let err = client
        .list_images("/NOPE", &GalleryConfig::default())
        .await
        .unwrap_err();
    assert_eq!(error::classify(&err), FailureKind::Http);
}

#[tokio::test]
async fn unreachable_camera_reports_message() {
    let host = common::unreachable_host().await;
    let config = CameraConfig {
        host,
        ..CameraConfig::default()
    };
    let client = CameraClient::new(&config).unwrap();

    let err = client.camera_info().await.unwrap_err();
    assert_eq!(error::classify(&err), FailureKind::Connection);
    assert!(error::user_message(&err).contains("Connection to Smartphone"));

    let mut session = CameraSession::new(config.host.clone());
    match session.check(&client).await {
        ConnectionState::Unreachable { message } => assert!(!message.is_empty()),
        other => panic!("expected unreachable, got {other:?}"),
    }

    let listing = client.list_images("/DCIM", &GalleryConfig::default()).await;
    assert!(listing.is_err());
}

#[tokio::test]
async fn thumbnails_are_cached() {
    let cam = MockCamera::start(sample_files()).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();
    let cache_dir = TempDir::new().unwrap();
    let cache = ThumbnailCache::new(cache_dir.path());

    let images = client
        .list_images("/DCIM", &GalleryConfig::default())
        .await
        .unwrap();
    let image = &images[0];

    let first = cache.get_or_fetch(&client, image).await.unwrap();
    let second = cache.get_or_fetch(&client, image).await.unwrap();

    assert_eq!(first, common::thumbnail_bytes(&image.path));
    assert_eq!(first, second);
    assert_eq!(cam.thumbnail_hits(), 1);
    assert!(cache.path_for(image).exists());
}

#[tokio::test]
async fn failing_subdirectory_is_skipped() {
    let options = MockOptions {
        failing_dirs: vec!["/DCIM/102OLYMP".into()],
        ..MockOptions::default()
    };
    let cam = MockCamera::start_with(sample_files(), options).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();

    let images = client
        .list_images("/DCIM", &GalleryConfig::default())
        .await
        .unwrap();
    assert_eq!(images.len(), 3);
}

#[tokio::test]
async fn failed_mode_switch_still_lists() {
    let options = MockOptions {
        fail_mode_switch: true,
        ..MockOptions::default()
    };
    let cam = MockCamera::start_with(sample_files(), options).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();

    assert!(client.switch_to_play().await.is_err());
    let images = client
        .list_images("/DCIM", &GalleryConfig::default())
        .await
        .unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!(cam.mode_switches(), 2);
}

#[tokio::test]
async fn duplicated_lines_are_listed_once() {
    let options = MockOptions {
        duplicate_lines: true,
        ..MockOptions::default()
    };
    let cam = MockCamera::start_with(sample_files(), options).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();

    let images = client
        .list_images("/DCIM", &GalleryConfig::default())
        .await
        .unwrap();
    let paths: Vec<&str> = images.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/DCIM/101OLYMP/PA010003.JPG",
            "/DCIM/100OLYMP/P9140459.MOV",
            "/DCIM/100OLYMP/P8060001.JPG",
        ]
    );
}

#[tokio::test]
async fn looping_directory_stops_at_depth_limit() {
    let options = MockOptions {
        looping_dir: Some("/DCIM/LOOP".into()),
        ..MockOptions::default()
    };
    let cam = MockCamera::start_with(Vec::new(), options).await;
    let client = CameraClient::new(&cam.camera_config()).unwrap();

    let images = client
        .list_images("/DCIM", &GalleryConfig::default())
        .await
        .unwrap();

    // /DCIM/LOOP is level 1; levels 1 to 8 are listed, level 9 is not.
    assert_eq!(cam.loop_listings(), 8);
    assert_eq!(images.len(), 8);
    assert!(images.iter().all(|i| i.file_name() == "P0000001.JPG"));
}
