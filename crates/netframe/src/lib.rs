//! Minimal-latency network video decoding pipeline.
//!
//! `netframe` turns a stream of encoded network subframes into decoded
//! video frames and, optionally, 3-D point clouds. One producer thread
//! receives multiplexed subframe sets, fans them out across independent
//! hardware decoder channels and publishes the latest complete result
//! behind a single mutex; consumers borrow it through a short-lived
//! [`StateView`] guard. Transport, hardware decode and unprojection math
//! are collaborator traits ([`Streamer`], [`Decoder`], [`Unprojector`]).

pub mod cloud;
pub mod config;
pub mod decode;
pub mod frame;
pub mod pipeline;
pub mod publish;
pub mod stream;
pub mod unproject;

pub use cloud::PointCloud;
pub use config::{CameraIntrinsics, DepthConfig, HwConfig, NetConfig, PipelineConfig};
pub use decode::{CycleError, DecodeError, Decoder};
pub use frame::{DecodedFrame, PixelFormat, Subframe, MAX_PLANES};
pub use pipeline::{Cycle, InitError, NetDecoder, PipelineError};
pub use publish::StateView;
pub use stream::{Received, StreamError, Streamer};
pub use unproject::{DepthPlane, TexturePlane, UnprojectError, Unprojector};
