use crate::cloud::PointCloud;
use crate::config::{CameraIntrinsics, DepthConfig};
use crate::frame::{DecodedFrame, PixelFormat};
use thiserror::Error;

/// Borrowed view of a 16-bit depth plane handed to the unprojector.
#[derive(Debug, Clone, Copy)]
pub struct DepthPlane<'a> {
    pub data: &'a [u8],
    /// Bytes per row.
    pub linesize: usize,
    pub width: usize,
    pub height: usize,
}

/// Borrowed view of a packed 32-bit color plane.
#[derive(Debug, Clone, Copy)]
pub struct TexturePlane<'a> {
    pub data: &'a [u8],
    /// Bytes per row.
    pub linesize: usize,
}

/// Depth unprojection collaborator.
pub trait Unprojector: Send {
    /// Convert the depth plane into 3-D points, optionally sampling
    /// colors from `texture`, and return the number of points written.
    ///
    /// `points` and `colors` are sized to depth width × height. How
    /// missing texture is colored is the collaborator's business.
    fn unproject(
        &mut self,
        intrinsics: &CameraIntrinsics,
        depth: DepthPlane<'_>,
        texture: Option<TexturePlane<'_>>,
        points: &mut [[f32; 3]],
        colors: &mut [[u8; 4]],
    ) -> usize;
}

/// Frame/format mismatches detected before unprojection runs.
#[derive(Debug, Error)]
pub enum UnprojectError {
    #[error("depth format {0} is not a 16-bit depth format")]
    DepthFormat(PixelFormat),
    #[error("depth stride {linesize} is not 2 bytes per sample at width {width}")]
    DepthStride { linesize: usize, width: usize },
    #[error("texture format {0} is not a 32-bit color format")]
    TextureFormat(PixelFormat),
}

/// Adapts decoded depth (and texture) frames into point cloud updates.
///
/// Owns the unprojector collaborator and the depth/texture channel
/// pairing; the cloud itself lives in the published state and is passed
/// in under the publish lock.
pub(crate) struct DepthStage {
    unprojector: Box<dyn Unprojector>,
    config: DepthConfig,
}

impl DepthStage {
    pub fn new(unprojector: Box<dyn Unprojector>, config: DepthConfig) -> Self {
        Self {
            unprojector,
            config,
        }
    }

    pub fn depth_channel(&self) -> usize {
        self.config.depth_channel
    }

    pub fn texture_channel(&self) -> Option<usize> {
        self.config.texture_channel
    }

    /// Validate formats, size the cloud, run the collaborator and zero
    /// the unused tail.
    ///
    /// The cloud is left untouched when validation fails.
    pub fn update(
        &mut self,
        depth: &DecodedFrame,
        texture: Option<&DecodedFrame>,
        cloud: &mut PointCloud,
    ) -> Result<(), UnprojectError> {
        if !depth.format.is_depth16() {
            return Err(UnprojectError::DepthFormat(depth.format));
        }
        if depth.width == 0 || depth.linesize[0] / depth.width != 2 {
            return Err(UnprojectError::DepthStride {
                linesize: depth.linesize[0],
                width: depth.width,
            });
        }
        if let Some(texture) = texture {
            if !texture.format.is_color32() {
                return Err(UnprojectError::TextureFormat(texture.format));
            }
        }

        cloud.ensure_capacity(depth.width * depth.height);

        let depth_plane = DepthPlane {
            data: &depth.planes[0],
            linesize: depth.linesize[0],
            width: depth.width,
            height: depth.height,
        };
        let texture_plane = texture.map(|t| TexturePlane {
            data: &t.planes[0],
            linesize: t.linesize[0],
        });

        let (points, colors) = cloud.arrays_mut();
        let used = self.unprojector.unproject(
            &self.config.intrinsics,
            depth_plane,
            texture_plane,
            points,
            colors,
        );
        cloud.commit(used);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            ppx: 421.353,
            ppy: 240.93,
            fx: 426.768,
            fy: 426.768,
            depth_unit: 0.0001,
        }
    }

    fn depth_config() -> DepthConfig {
        DepthConfig {
            depth_channel: 0,
            texture_channel: None,
            intrinsics: intrinsics(),
        }
    }

    fn depth_frame(width: usize, height: usize, format: PixelFormat) -> DecodedFrame {
        DecodedFrame::packed(width, height, format, vec![0; width * 2 * height], width * 2)
    }

    /// Writes `used` marker points, ignoring the actual depth math.
    struct FixedUnprojector {
        used: usize,
    }

    impl Unprojector for FixedUnprojector {
        fn unproject(
            &mut self,
            _intrinsics: &CameraIntrinsics,
            _depth: DepthPlane<'_>,
            _texture: Option<TexturePlane<'_>>,
            points: &mut [[f32; 3]],
            colors: &mut [[u8; 4]],
        ) -> usize {
            let used = self.used.min(points.len());
            for point in &mut points[..used] {
                *point = [1.0, 2.0, 3.0];
            }
            for color in &mut colors[..used] {
                *color = [255, 128, 64, 255];
            }
            used
        }
    }

    #[test]
    fn depth_frame_fills_cloud_and_zeroes_tail() {
        let mut stage = DepthStage::new(Box::new(FixedUnprojector { used: 3000 }), depth_config());
        let mut cloud = PointCloud::default();

        stage
            .update(&depth_frame(64, 48, PixelFormat::P010Le), None, &mut cloud)
            .unwrap();

        assert_eq!(cloud.capacity(), 3072);
        assert_eq!(cloud.used(), 3000);
        assert_eq!(cloud.points()[0], [1.0, 2.0, 3.0]);
        assert!(cloud.points()[3000..].iter().all(|p| *p == [0.0; 3]));
        assert!(cloud.colors()[3000..].iter().all(|c| *c == [0; 4]));
    }

    #[test]
    fn same_dimensions_reuse_the_allocation() {
        let mut stage = DepthStage::new(Box::new(FixedUnprojector { used: 10 }), depth_config());
        let mut cloud = PointCloud::default();

        stage
            .update(&depth_frame(64, 48, PixelFormat::P010Le), None, &mut cloud)
            .unwrap();
        let before = cloud.points().as_ptr();

        stage
            .update(&depth_frame(64, 48, PixelFormat::P016Le), None, &mut cloud)
            .unwrap();
        assert_eq!(cloud.points().as_ptr(), before);

        stage
            .update(&depth_frame(32, 24, PixelFormat::P010Le), None, &mut cloud)
            .unwrap();
        assert_eq!(cloud.capacity(), 768);
    }

    #[test]
    fn non_depth_format_is_rejected_without_touching_cloud() {
        let mut stage = DepthStage::new(Box::new(FixedUnprojector { used: 10 }), depth_config());
        let mut cloud = PointCloud::default();
        stage
            .update(&depth_frame(8, 8, PixelFormat::P010Le), None, &mut cloud)
            .unwrap();

        let frame = DecodedFrame::packed(8, 8, PixelFormat::Nv12, vec![0; 96], 8);
        let err = stage.update(&frame, None, &mut cloud).unwrap_err();
        assert!(matches!(err, UnprojectError::DepthFormat(PixelFormat::Nv12)));
        assert_eq!(cloud.capacity(), 64);
        assert_eq!(cloud.used(), 10);
    }

    #[test]
    fn wrong_stride_is_rejected() {
        let mut stage = DepthStage::new(Box::new(FixedUnprojector { used: 10 }), depth_config());
        let mut cloud = PointCloud::default();

        let frame = DecodedFrame::packed(8, 8, PixelFormat::P010Le, vec![0; 3 * 8 * 8], 8 * 3);
        let err = stage.update(&frame, None, &mut cloud).unwrap_err();
        assert!(matches!(
            err,
            UnprojectError::DepthStride {
                linesize: 24,
                width: 8
            }
        ));
        assert!(cloud.is_empty());
    }

    #[test]
    fn non_color_texture_is_rejected() {
        let mut stage = DepthStage::new(Box::new(FixedUnprojector { used: 10 }), depth_config());
        let mut cloud = PointCloud::default();

        let texture = DecodedFrame::packed(8, 8, PixelFormat::Yuv420p, vec![0; 96], 8);
        let err = stage
            .update(
                &depth_frame(8, 8, PixelFormat::P010Le),
                Some(&texture),
                &mut cloud,
            )
            .unwrap_err();
        assert!(matches!(err, UnprojectError::TextureFormat(_)));
        assert!(cloud.is_empty());
    }

    #[test]
    fn color_texture_is_accepted() {
        let mut stage = DepthStage::new(Box::new(FixedUnprojector { used: 5 }), depth_config());
        let mut cloud = PointCloud::default();

        let texture = DecodedFrame::packed(8, 8, PixelFormat::Rgb0, vec![0; 4 * 8 * 8], 8 * 4);
        stage
            .update(
                &depth_frame(8, 8, PixelFormat::P010Le),
                Some(&texture),
                &mut cloud,
            )
            .unwrap();
        assert_eq!(cloud.used(), 5);
    }
}
