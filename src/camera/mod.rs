//! Olympus Wi-Fi camera access.
//!
//! - [`protocol`] — endpoint paths, listing parser, attribute bits, timestamps
//! - [`CameraClient`] — the HTTP calls, with per-command timeouts
//! - [`CameraSession`] — endpoint plus last observed connectivity

mod client;
pub mod protocol;
mod session;

pub use client::CameraClient;
pub use protocol::{ListingLine, RemoteImage};
pub use session::{CameraSession, ConnectionState};
