//! Face abstraction for the NDN certificate bundle library.
//!
//! A face delivers interests to the network and delivers back a Data, a
//! Nack, or a timeout per outstanding interest. The security crate's
//! validator and bundle producer are written against the [`Face`] trait so
//! tests can substitute an in-memory implementation.

use async_trait::async_trait;
use ndn_bundle_common::packet::{Data, Interest};
use thiserror::Error;

mod unix;

pub use unix::UnixFace;

/// Default Unix socket path of the local NDN forwarder.
pub const DEFAULT_FORWARDER_SOCKET: &str = "/run/nfd.sock";

/// Size of the receive reassembly buffer. A connection that fills it
/// without yielding a complete TLV is closed.
pub const MAX_RECEIVE_BUFFER: usize = 9000;

/// The negative outcomes of expressing an interest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The network answered with a negative acknowledgment.
    #[error("nack: {0}")]
    Nack(String),

    /// The interest lifetime elapsed without an answer.
    #[error("timeout")]
    Timeout,

    /// The face is closed or the connection was lost.
    #[error("face closed: {0}")]
    Closed(String),
}

/// A bidirectional attachment point to the NDN network.
#[async_trait]
pub trait Face: Send + Sync {
    /// Sends `interest` and waits for the matching Data. Resolves with a
    /// [`FetchError`] on nack, timeout (per the interest lifetime), or
    /// connection loss.
    async fn express_interest(&self, interest: Interest) -> Result<Data, FetchError>;

    /// Sends a Data packet towards the network.
    async fn put_data(&self, data: Data) -> Result<(), FetchError>;
}
