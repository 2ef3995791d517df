use crate::frame::PixelFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Network listening configuration for the streamer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetConfig {
    /// IP to listen on, or `None` to listen on any interface.
    #[serde(default)]
    pub ip: Option<String>,
    /// Server port.
    pub port: u16,
    /// Receive timeout in milliseconds; also bounds shutdown latency.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
}

fn default_timeout_ms() -> u32 {
    500
}

/// Hardware decode parameters for a single channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HwConfig {
    /// Codec name, e.g. "h264", "hevc".
    pub codec: String,
    /// Decode device, e.g. "/dev/dri/renderD128".
    #[serde(default)]
    pub device: Option<String>,
    /// Output pixel format, or `None` for the decoder default.
    #[serde(default)]
    pub pixel_format: Option<PixelFormat>,
    /// Frame width, needed by some codecs.
    #[serde(default)]
    pub width: Option<u32>,
    /// Frame height, needed by some codecs.
    #[serde(default)]
    pub height: Option<u32>,
    /// Codec profile, or `None` for unknown.
    #[serde(default)]
    pub profile: Option<i32>,
}

/// Camera intrinsics for depth unprojection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Principal point x.
    pub ppx: f32,
    /// Principal point y.
    pub ppy: f32,
    /// Focal length x.
    pub fx: f32,
    /// Focal length y.
    pub fy: f32,
    /// Meters per depth unit, e.g. 0.0001.
    pub depth_unit: f32,
}

/// Depth unprojection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthConfig {
    /// Channel carrying the 16-bit depth stream.
    #[serde(default)]
    pub depth_channel: usize,
    /// Optional channel carrying the paired color texture.
    #[serde(default)]
    pub texture_channel: Option<usize>,
    pub intrinsics: CameraIntrinsics,
}

/// Root pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub net: NetConfig,
    /// Hardware decode channels, in multiplex order.
    pub channels: Vec<HwConfig>,
    /// Auxiliary raw channels multiplexed after the decode channels.
    #[serde(default)]
    pub aux_channels: usize,
    #[serde(default)]
    pub depth: Option<DepthConfig>,
    /// Upper bound on decode channels; unbounded when unset.
    #[serde(default)]
    pub max_channels: Option<usize>,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Total multiplexed channels the streamer delivers per set.
    pub fn total_channels(&self) -> usize {
        self.channels.len() + self.aux_channels
    }

    /// Check the channel topology.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one decode channel is required".to_string(),
            ));
        }
        if let Some(limit) = self.max_channels {
            if self.channels.len() > limit {
                return Err(ConfigError::ValidationError(format!(
                    "{} decode channels exceed the limit of {}",
                    self.channels.len(),
                    limit
                )));
            }
        }
        if let Some(depth) = &self.depth {
            if depth.depth_channel >= self.channels.len() {
                return Err(ConfigError::ValidationError(format!(
                    "depth channel {} is out of range for {} channels",
                    depth.depth_channel,
                    self.channels.len()
                )));
            }
            if let Some(texture) = depth.texture_channel {
                if texture >= self.channels.len() {
                    return Err(ConfigError::ValidationError(format!(
                        "texture channel {} is out of range for {} channels",
                        texture,
                        self.channels.len()
                    )));
                }
                if texture == depth.depth_channel {
                    return Err(ConfigError::ValidationError(
                        "texture channel must differ from the depth channel".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
