use crate::frame::Subframe;
use thiserror::Error;

/// Errors reported by the network streamer.
///
/// A timeout is not an error; it is reported through
/// [`Received::Timeout`]. Anything surfaced here is fatal to the receive
/// loop.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("receive failed: {0}")]
    Receive(String),
    #[error("streamer closed")]
    Closed,
}

/// Outcome of one blocking receive call.
#[derive(Debug)]
pub enum Received {
    /// One multiplexed set, one subframe per channel (decode channels
    /// followed by auxiliary raw channels).
    Set(Vec<Subframe>),
    /// Nothing arrived within the configured timeout window; a new
    /// streaming sequence may be about to begin.
    Timeout,
}

/// Network streamer collaborator.
///
/// `receive` must honor the configured timeout so that shutdown latency
/// stays bounded by it.
pub trait Streamer: Send {
    /// Block until the next multiplexed subframe set arrives or the
    /// timeout elapses.
    fn receive(&mut self) -> Result<Received, StreamError>;

    /// Re-arm the receiver after a timeout so a new sequence is accepted.
    fn reset_receive(&mut self);
}
