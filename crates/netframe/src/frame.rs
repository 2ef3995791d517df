use serde::{Deserialize, Serialize};

/// Maximum number of image planes a decoded frame can carry (e.g. Y + UV).
pub const MAX_PLANES: usize = 3;

/// Pixel formats understood by the pipeline.
///
/// `P010Le`/`P016Le` are the 16-bit planar depth formats accepted by the
/// depth stage; `Rgb0`/`Bgr0` are the 32-bit color formats accepted as
/// texture input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Nv12,
    Yuv420p,
    Rgb0,
    Bgr0,
    P010Le,
    P016Le,
}

impl PixelFormat {
    /// 16-bit planar depth format, usable as depth-stage input.
    pub fn is_depth16(self) -> bool {
        matches!(self, PixelFormat::P010Le | PixelFormat::P016Le)
    }

    /// 32-bit per pixel color format, usable as texture input.
    pub fn is_color32(self) -> bool {
        matches!(self, PixelFormat::Rgb0 | PixelFormat::Bgr0)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Rgb0 => "rgb0",
            PixelFormat::Bgr0 => "bgr0",
            PixelFormat::P010Le => "p010le",
            PixelFormat::P016Le => "p016le",
        };
        f.write_str(name)
    }
}

/// Per-channel encoded payload within one multiplexed network unit.
///
/// An empty payload means the channel has no data this cycle (e.g. the
/// channels run at different framerates) and is skipped by the decode
/// cycle, not treated as an error.
#[derive(Debug, Clone, Default)]
pub struct Subframe {
    pub data: Vec<u8>,
}

impl Subframe {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One decoded video frame with owned plane storage.
///
/// Owned by the decode orchestrator until stored in a publish slot;
/// consumers only ever borrow it through a held
/// [`StateView`](crate::publish::StateView).
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    /// Plane data; unused planes stay empty.
    pub planes: [Vec<u8>; MAX_PLANES],
    /// Bytes per row for each plane.
    pub linesize: [usize; MAX_PLANES],
}

impl DecodedFrame {
    /// Single-plane constructor, enough for packed color and 16-bit depth
    /// data.
    pub fn packed(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
        linesize: usize,
    ) -> Self {
        Self {
            width,
            height,
            format,
            planes: [data, Vec::new(), Vec::new()],
            linesize: [linesize, 0, 0],
        }
    }
}
