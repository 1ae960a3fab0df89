//! Common packet model and TLV codec for the NDN certificate bundle library.
//!
//! This crate provides the wire-level building blocks shared by the face and
//! security crates: names, Interest/Data packets, certificates, and metrics.

pub mod certificate;
pub mod error;
pub mod metrics;
pub mod name;
pub mod packet;
pub mod tlv;

/// Reexport of common types
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Maximum size of an NDN packet on the wire.
pub const MAX_NDN_PACKET_SIZE: usize = 8800;

/// Default Interest lifetime in milliseconds.
pub const DEFAULT_INTEREST_LIFETIME_MS: u64 = 4000;
