use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resolution/framerate presets understood by the remote peer.
///
/// The table belongs to the peer and is not negotiable; on the wire each
/// preset travels as its numeric code string (`"35"` is 800x480 @ 30 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum VideoFormat {
    R320x240p15,
    R320x240p30,
    R640x480p15,
    R640x480p30,
    #[default]
    R800x480p30,
    R960x720p30,
    R1024x768p30,
    R1280x720p15,
    R1280x720p30,
    R1280x768p15,
    R1280x768p30,
    R1280x960p30,
    R1600x768p30,
    R1640x1232p15,
    R1640x1232p30,
    R1920x1080p15,
    R1920x1080p30,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown video format '{0}' (expected a preset code such as \"35\" or WxH@fps)")]
pub struct ParseVideoFormatError(pub String);

impl VideoFormat {
    pub const ALL: [VideoFormat; 17] = [
        VideoFormat::R320x240p15,
        VideoFormat::R320x240p30,
        VideoFormat::R640x480p15,
        VideoFormat::R640x480p30,
        VideoFormat::R800x480p30,
        VideoFormat::R960x720p30,
        VideoFormat::R1024x768p30,
        VideoFormat::R1280x720p15,
        VideoFormat::R1280x720p30,
        VideoFormat::R1280x768p15,
        VideoFormat::R1280x768p30,
        VideoFormat::R1280x960p30,
        VideoFormat::R1600x768p30,
        VideoFormat::R1640x1232p15,
        VideoFormat::R1640x1232p30,
        VideoFormat::R1920x1080p15,
        VideoFormat::R1920x1080p30,
    ];

    /// (code, width, height, fps)
    const fn spec(&self) -> (&'static str, u32, u32, u32) {
        match self {
            VideoFormat::R320x240p15 => ("5", 320, 240, 15),
            VideoFormat::R320x240p30 => ("10", 320, 240, 30),
            VideoFormat::R640x480p15 => ("25", 640, 480, 15),
            VideoFormat::R640x480p30 => ("30", 640, 480, 30),
            VideoFormat::R800x480p30 => ("35", 800, 480, 30),
            VideoFormat::R960x720p30 => ("40", 960, 720, 30),
            VideoFormat::R1024x768p30 => ("50", 1024, 768, 30),
            VideoFormat::R1280x720p15 => ("55", 1280, 720, 15),
            VideoFormat::R1280x720p30 => ("60", 1280, 720, 30),
            VideoFormat::R1280x768p15 => ("65", 1280, 768, 15),
            VideoFormat::R1280x768p30 => ("70", 1280, 768, 30),
            VideoFormat::R1280x960p30 => ("80", 1280, 960, 30),
            VideoFormat::R1600x768p30 => ("90", 1600, 768, 30),
            VideoFormat::R1640x1232p15 => ("95", 1640, 1232, 15),
            VideoFormat::R1640x1232p30 => ("97", 1640, 1232, 30),
            VideoFormat::R1920x1080p15 => ("100", 1920, 1080, 15),
            VideoFormat::R1920x1080p30 => ("105", 1920, 1080, 30),
        }
    }

    pub fn code(&self) -> &'static str {
        self.spec().0
    }

    pub fn width(&self) -> u32 {
        self.spec().1
    }

    pub fn height(&self) -> u32 {
        self.spec().2
    }

    pub fn fps(&self) -> u32 {
        self.spec().3
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    fn from_geometry(text: &str) -> Option<Self> {
        let (size, fps) = text.split_once('@')?;
        let (width, height) = size.trim().split_once('x')?;
        let width: u32 = width.trim().parse().ok()?;
        let height: u32 = height.trim().parse().ok()?;
        let fps: u32 = fps.trim().trim_end_matches("fps").trim().parse().ok()?;

        Self::ALL
            .into_iter()
            .find(|f| f.width() == width && f.height() == height && f.fps() == fps)
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} @ {} fps", self.width(), self.height(), self.fps())
    }
}

impl FromStr for VideoFormat {
    type Err = ParseVideoFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::from_code(s)
            .or_else(|| Self::from_geometry(s))
            .ok_or_else(|| ParseVideoFormatError(s.to_owned()))
    }
}

impl From<VideoFormat> for String {
    fn from(format: VideoFormat) -> Self {
        format.code().to_owned()
    }
}

impl TryFrom<String> for VideoFormat {
    type Error = ParseVideoFormatError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code).ok_or(ParseVideoFormatError(code))
    }
}
