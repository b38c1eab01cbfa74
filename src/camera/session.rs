use super::client::CameraClient;
use crate::error;

/// Connectivity as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Unknown,
    /// The camera answered `get_caminfo.cgi` with this body.
    Connected { info: String },
    /// The check failed; `message` is ready to show to the user.
    Unreachable { message: String },
}

/// A camera endpoint and whether it is reachable.
#[derive(Debug, Clone, Default)]
pub struct CameraSession {
    pub host: String,
    pub state: ConnectionState,
}

impl CameraSession {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            state: ConnectionState::Unknown,
        }
    }

    /// Query the camera and record the outcome.
    pub async fn check(&mut self, client: &CameraClient) -> &ConnectionState {
        self.state = match client.camera_info().await {
            Ok(info) => {
                log::info!("Camera at {} is reachable", self.host);
                ConnectionState::Connected { info }
            }
            Err(e) => {
                log::error!("Camera check failed: {e:#}");
                ConnectionState::Unreachable {
                    message: error::user_message(&e),
                }
            }
        };
        &self.state
    }

    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Unknown;
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }
}
