use crate::cloud::PointCloud;
use crate::frame::DecodedFrame;
use std::sync::MutexGuard;

/// The shared record behind the pipeline's single mutex: the most recent
/// decoded frame per channel, the derived point cloud and the cycle tag
/// of the last publish.
#[derive(Debug, Default)]
pub(crate) struct PublishedState {
    pub frames: Vec<Option<DecodedFrame>>,
    pub cloud: PointCloud,
    pub cycle: u64,
}

impl PublishedState {
    pub fn with_channels(channels: usize) -> Self {
        Self {
            frames: vec![None; channels],
            cloud: PointCloud::default(),
            cycle: 0,
        }
    }
}

/// Lock-held view of the published state.
///
/// This is the begin/end accessor protocol: obtaining the view acquires
/// the pipeline's single mutex, dropping it releases the mutex, so the
/// end half can never be skipped — including when there is no data yet.
/// Holding the view blocks the receive loop from publishing the next
/// cycle's results, so copy what you need and drop it promptly.
pub struct StateView<'a> {
    pub(crate) guard: MutexGuard<'a, PublishedState>,
}

impl StateView<'_> {
    /// Most recent decoded frame for `channel`, or `None` if the channel
    /// has not published yet (or is out of range).
    ///
    /// The borrow is valid only while the view is held.
    pub fn frame(&self, channel: usize) -> Option<&DecodedFrame> {
        self.guard.frames.get(channel).and_then(|slot| slot.as_ref())
    }

    /// Per-channel frame slots in declared order.
    pub fn frames(&self) -> impl Iterator<Item = Option<&DecodedFrame>> + '_ {
        self.guard.frames.iter().map(|slot| slot.as_ref())
    }

    /// `true` once any channel has published a frame.
    pub fn has_data(&self) -> bool {
        self.guard.frames.iter().any(|slot| slot.is_some())
    }

    /// The derived point cloud, or `None` before the first unprojection.
    pub fn point_cloud(&self) -> Option<&PointCloud> {
        if self.guard.cloud.is_empty() {
            None
        } else {
            Some(&self.guard.cloud)
        }
    }

    /// Cycle number of the most recent publish; increases monotonically.
    pub fn cycle(&self) -> u64 {
        self.guard.cycle
    }
}
