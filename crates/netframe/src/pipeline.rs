use crate::config::PipelineConfig;
use crate::decode::{CycleError, DecodeOrchestrator, Decoder};
use crate::frame::Subframe;
use crate::publish::{PublishedState, StateView};
use crate::stream::{Received, StreamError, Streamer};
use crate::unproject::{DepthStage, Unprojector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;

/// Failure to construct a [`NetDecoder`].
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("{decoders} decoders supplied for {channels} configured channels")]
    ChannelMismatch { decoders: usize, channels: usize },
    #[error("a depth configuration and an unprojector must be supplied together")]
    DepthSetupMismatch,
}

/// A fatal runtime failure of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("network receive failed: {0}")]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Cycle(#[from] CycleError),
    #[error("streamer delivered {got} subframes for {expected} channels")]
    ShortSet { got: usize, expected: usize },
    #[error("the background receive loop owns the pipeline; synchronous receive is unavailable")]
    WorkerBusy,
}

/// Outcome of one synchronous receive cycle.
#[derive(Debug)]
pub enum Cycle {
    /// One multiplexed set was decoded; carries the raw per-channel
    /// payloads (decode channels followed by auxiliary raw channels).
    Frames(Vec<Subframe>),
    /// Nothing arrived within the timeout; the decoders were flushed and
    /// the streamer reset for a new sequence.
    Timeout,
}

/// Exclusively owned producer half: streamer plus decode orchestration.
///
/// Lives on the caller's thread in pull mode, or is moved wholesale into
/// the background thread by [`NetDecoder::start`]. Consumer threads never
/// touch it.
struct Worker {
    streamer: Box<dyn Streamer>,
    orchestrator: DecodeOrchestrator,
    expected_channels: usize,
    cycle: u64,
}

impl Worker {
    /// One receive-loop iteration: blocking receive, then a normal or
    /// flush decode cycle.
    fn run_once(&mut self) -> Result<Cycle, PipelineError> {
        match self.streamer.receive()? {
            Received::Set(subframes) => {
                if subframes.len() < self.expected_channels {
                    return Err(PipelineError::ShortSet {
                        got: subframes.len(),
                        expected: self.expected_channels,
                    });
                }
                self.cycle += 1;
                self.orchestrator.cycle(Some(&subframes), self.cycle)?;
                Ok(Cycle::Frames(subframes))
            }
            Received::Timeout => {
                log::trace!("receive timeout, resetting streamer and flushing decoders");
                self.streamer.reset_receive();
                self.cycle += 1;
                self.orchestrator.cycle(None, self.cycle)?;
                Ok(Cycle::Timeout)
            }
        }
    }
}

/// Network video decoder pipeline.
///
/// Construct with [`NetDecoder::new`], then either call
/// [`start`](NetDecoder::start) to run the receive loop on a background
/// thread and read results through [`view`](NetDecoder::view), or drive
/// the pipeline from the calling thread with
/// [`receive`](NetDecoder::receive).
pub struct NetDecoder {
    shared: Arc<Mutex<PublishedState>>,
    stop: Arc<AtomicBool>,
    worker: Option<Worker>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for NetDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetDecoder")
            .field("stop", &self.stop)
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

impl NetDecoder {
    /// Validate the configuration and assemble the pipeline.
    ///
    /// `decoders` supplies one instance per configured channel, in
    /// multiplex order. A depth configuration and an unprojector go
    /// together; supplying one without the other is an error. Nothing is
    /// retained on failure.
    pub fn new(
        config: PipelineConfig,
        streamer: Box<dyn Streamer>,
        decoders: Vec<Box<dyn Decoder>>,
        unprojector: Option<Box<dyn Unprojector>>,
    ) -> Result<Self, InitError> {
        config.validate()?;
        if decoders.len() != config.channels.len() {
            return Err(InitError::ChannelMismatch {
                decoders: decoders.len(),
                channels: config.channels.len(),
            });
        }
        let depth = match (config.depth.clone(), unprojector) {
            (Some(depth_config), Some(unprojector)) => {
                Some(DepthStage::new(unprojector, depth_config))
            }
            (None, None) => None,
            _ => return Err(InitError::DepthSetupMismatch),
        };

        let shared = Arc::new(Mutex::new(PublishedState::with_channels(decoders.len())));
        let orchestrator = DecodeOrchestrator::new(decoders, Arc::clone(&shared), depth);

        log::info!(
            "pipeline ready: {} decode channel(s), {} auxiliary, port {}, timeout {} ms",
            config.channels.len(),
            config.aux_channels,
            config.net.port,
            config.net.timeout_ms
        );

        Ok(Self {
            shared,
            stop: Arc::new(AtomicBool::new(false)),
            worker: Some(Worker {
                streamer,
                orchestrator,
                expected_channels: config.total_channels(),
                cycle: 0,
            }),
            thread: None,
        })
    }

    /// Spawn the background receive loop, moving exclusive ownership of
    /// the streamer and decoders into it.
    ///
    /// No-op when the loop is already running or the pipeline has been
    /// closed.
    pub fn start(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let stop = Arc::clone(&self.stop);
        self.thread = Some(std::thread::spawn(move || receive_loop(worker, stop)));
    }

    /// Run one receive cycle on the calling thread.
    ///
    /// This is the pull-style alternative to [`start`](NetDecoder::start):
    /// one blocking receive followed by a normal or flush decode cycle.
    /// Decoded frames land in the published state ([`view`](NetDecoder::view));
    /// the returned [`Cycle::Frames`] carries the raw subframe set,
    /// including any auxiliary channels. Unavailable while the background
    /// loop owns the streamer and decoders.
    pub fn receive(&mut self) -> Result<Cycle, PipelineError> {
        let worker = self.worker.as_mut().ok_or(PipelineError::WorkerBusy)?;
        worker.run_once()
    }

    /// Lock the published state for reading.
    ///
    /// Blocks while the receive loop is publishing; the lock is released
    /// when the returned view is dropped. Do no slow work while holding
    /// it — the producer needs the same mutex for the next cycle.
    pub fn view(&self) -> StateView<'_> {
        StateView {
            guard: self.shared.lock().unwrap(),
        }
    }

    /// Whether the background receive loop is still running.
    ///
    /// Turns false after [`close`](NetDecoder::close), and also after the
    /// loop terminates on a fatal network or decode error.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the background loop and release the collaborators.
    ///
    /// Returns once the loop has observed the stop flag and exited; the
    /// latency is bounded by the configured receive timeout. Safe to call
    /// more than once.
    pub fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        // In pull mode the streamer and decoders are still here; drop
        // them after the join so no concurrent owner can exist.
        self.worker = None;
    }
}

impl Drop for NetDecoder {
    fn drop(&mut self) {
        self.close();
    }
}

/// Background producer: receive, decode, publish, until stopped or a
/// fatal error.
fn receive_loop(mut worker: Worker, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match worker.run_once() {
            Ok(_) => {}
            Err(e) => {
                log::error!("receive loop terminating: {e}");
                break;
            }
        }
    }
    log::debug!("receive loop finished after {} cycles", worker.cycle);
}
