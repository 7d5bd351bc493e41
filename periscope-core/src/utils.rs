/// Public STUN server the viewer falls back to when no ICE servers are configured.
pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Path under which UV4L-style peers expose their signaling socket.
pub const DEFAULT_SIGNALING_PATH: &str = "/stream/webrtc";
