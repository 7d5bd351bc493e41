use crate::model::video_format::VideoFormat;
use serde::{Deserialize, Serialize};

/// Options carried by the `call` request.
///
/// Values are immutable: the `with_*` methods return a new value, so an
/// in-flight call never observes a later edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOptions {
    #[serde(rename = "force_hw_vcodec")]
    force_hardware_codec: bool,
    #[serde(rename = "vformat")]
    video_format: VideoFormat,
    trickle_ice: bool,
}

impl CallOptions {
    /// Trickle ICE is always requested; the session relies on it.
    pub fn new(video_format: VideoFormat) -> Self {
        Self {
            force_hardware_codec: false,
            video_format,
            trickle_ice: true,
        }
    }

    pub fn with_hardware_codec(self, force_hardware_codec: bool) -> Self {
        Self {
            force_hardware_codec,
            ..self
        }
    }

    pub fn with_video_format(self, video_format: VideoFormat) -> Self {
        Self {
            video_format,
            ..self
        }
    }

    pub fn force_hardware_codec(&self) -> bool {
        self.force_hardware_codec
    }

    pub fn video_format(&self) -> VideoFormat {
        self.video_format
    }

    pub fn trickle_ice(&self) -> bool {
        self.trickle_ice
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::new(VideoFormat::default()).with_hardware_codec(true)
    }
}
