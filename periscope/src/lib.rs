pub use periscope_core::{CallOptions, SessionId, SignalingMessage, VideoFormat};

pub mod model {
    pub use periscope_core::model::*;
}

pub mod input {
    pub use periscope_core::input::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use periscope_client::*;
}
