use periscope_core::utils::DEFAULT_STUN_ADDR;
use periscope_core::{CallOptions, IceServerConfig};
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a locally requested close waits for the peer's close frame.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Everything needed to place one call.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Signaling endpoint, e.g. `ws://192.168.1.10:8080/stream/webrtc`.
    pub endpoint: String,
    pub options: CallOptions,
    /// Empty means host candidates only.
    pub ice_servers: Vec<IceServerConfig>,
    pub connect_timeout: Duration,
    pub close_grace: Duration,
}

impl SessionConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            options: CallOptions::default(),
            ice_servers: vec![IceServerConfig::new(DEFAULT_STUN_ADDR)],
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            close_grace: DEFAULT_CLOSE_GRACE,
        }
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }
}
