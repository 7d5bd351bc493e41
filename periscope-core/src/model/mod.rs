mod options;
mod session_id;
mod signaling;
mod video_format;

pub use options::CallOptions;
pub use session_id::SessionId;
pub use signaling::{IceServerConfig, MessageKind, SignalingMessage};
pub use video_format::{ParseVideoFormatError, VideoFormat};
