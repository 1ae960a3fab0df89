//! Error types for the NDN bundle packet model.

use thiserror::Error;

/// All possible errors raised by the packet model and codec.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed TLV, missing required field, or wrong outer type.
    #[error("TLV error: {0}")]
    Tlv(String),

    /// A name does not match the expected certificate or bundle shape.
    #[error("naming error: {0}")]
    Naming(String),

    /// Operation invoked on a default-constructed or frozen handle.
    #[error("invalid state: {0}")]
    State(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
