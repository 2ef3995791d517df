use crate::frame::{DecodedFrame, Subframe};
use crate::publish::PublishedState;
use crate::unproject::{DepthStage, UnprojectError};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Hardware decoder collaborator, one instance per channel.
pub trait Decoder: Send {
    /// Submit one encoded packet; `None` signals end of stream and starts
    /// a flush.
    fn send_packet(&mut self, packet: Option<&[u8]>) -> Result<(), DecodeError>;

    /// Pull the next decoded frame.
    ///
    /// `Ok(None)` means nothing is ready right now — decoders buffer
    /// internally and may emit 0, 1 or occasionally more frames per input
    /// packet. After a flush signal, repeated calls eventually return
    /// `Ok(None)` once the decoder is fully drained.
    fn receive_frame(&mut self) -> Result<Option<DecodedFrame>, DecodeError>;
}

/// Errors reported by a hardware decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("packet rejected: {0}")]
    Send(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// A fatal failure of one decode cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("channel {channel}: {source}")]
    Decode {
        channel: usize,
        #[source]
        source: DecodeError,
    },
    #[error("channel {channel}: {source}")]
    Unproject {
        channel: usize,
        #[source]
        source: UnprojectError,
    },
}

/// Drives all decoder channels through one cycle and publishes results.
///
/// Channels are processed in declared index order. Each pulled frame is
/// published immediately, so one channel's output never waits on another
/// channel still draining.
pub(crate) struct DecodeOrchestrator {
    decoders: Vec<Box<dyn Decoder>>,
    shared: Arc<Mutex<PublishedState>>,
    depth: Option<DepthStage>,
}

impl DecodeOrchestrator {
    pub fn new(
        decoders: Vec<Box<dyn Decoder>>,
        shared: Arc<Mutex<PublishedState>>,
        depth: Option<DepthStage>,
    ) -> Self {
        Self {
            decoders,
            shared,
            depth,
        }
    }

    /// Run one decode cycle.
    ///
    /// `Some(subframes)` is a normal cycle: non-empty subframes are
    /// submitted to their channel in index order, then each submitted
    /// channel is drained until no frame is ready. `None` is a flush
    /// cycle: every channel gets the end-of-stream signal and is drained
    /// until the decoder reports no more output is coming.
    pub fn cycle(&mut self, subframes: Option<&[Subframe]>, cycle_no: u64) -> Result<(), CycleError> {
        match subframes {
            Some(subframes) => self.normal_cycle(subframes, cycle_no),
            None => self.flush_cycle(cycle_no),
        }
    }

    fn normal_cycle(&mut self, subframes: &[Subframe], cycle_no: u64) -> Result<(), CycleError> {
        debug_assert!(subframes.len() >= self.decoders.len());

        for (channel, decoder) in self.decoders.iter_mut().enumerate() {
            let subframe = &subframes[channel];
            if subframe.is_empty() {
                // no data for this channel this cycle
                continue;
            }
            decoder
                .send_packet(Some(&subframe.data))
                .map_err(|source| CycleError::Decode { channel, source })?;
        }

        for channel in 0..self.decoders.len() {
            if subframes[channel].is_empty() {
                continue;
            }
            self.drain_channel(channel, cycle_no)?;
        }
        Ok(())
    }

    fn flush_cycle(&mut self, cycle_no: u64) -> Result<(), CycleError> {
        for (channel, decoder) in self.decoders.iter_mut().enumerate() {
            decoder
                .send_packet(None)
                .map_err(|source| CycleError::Decode { channel, source })?;
        }
        for channel in 0..self.decoders.len() {
            self.drain_channel(channel, cycle_no)?;
        }
        Ok(())
    }

    /// Pull frames from one channel until none is ready, publishing each.
    fn drain_channel(&mut self, channel: usize, cycle_no: u64) -> Result<(), CycleError> {
        loop {
            let frame = self.decoders[channel]
                .receive_frame()
                .map_err(|source| CycleError::Decode { channel, source })?;
            let Some(frame) = frame else {
                return Ok(());
            };
            self.publish(channel, frame, cycle_no)?;
        }
    }

    /// Replace the channel's publish slot with the new frame and, for the
    /// depth channel, run unprojection inside the same critical section
    /// so no consumer observes a frame without its matching cloud.
    fn publish(
        &mut self,
        channel: usize,
        frame: DecodedFrame,
        cycle_no: u64,
    ) -> Result<(), CycleError> {
        let mut state = self.shared.lock().unwrap();
        let PublishedState {
            frames,
            cloud,
            cycle,
        } = &mut *state;

        if let Some(depth) = &mut self.depth {
            if channel == depth.depth_channel() {
                let texture = depth
                    .texture_channel()
                    .and_then(|t| frames.get(t).and_then(|slot| slot.as_ref()));
                depth
                    .update(&frame, texture, cloud)
                    .map_err(|source| CycleError::Unproject { channel, source })?;
            }
        }

        frames[channel] = Some(frame);
        *cycle = cycle_no;
        Ok(())
    }
}
