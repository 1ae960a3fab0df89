//! Certificate-bundle security for NDN: cache, producer, validator.
//!
//! Validating a data packet requires walking its certificate chain up to a
//! trust anchor, fetching each certificate over the network. The bundle
//! optimization collapses that walk into one segmented fetch: a producer
//! ([`bundle::BundleHelper`]) pre-assembles the chain into signed segments,
//! and the consumer ([`validator::Validator`]) fetches the bundle once,
//! fills its [`cache::CertificateCache`], and falls back to per-certificate
//! interests only when the bundle is unavailable.

pub mod bundle;
pub mod cache;
pub mod error;
pub mod policy;
pub mod validator;
pub mod verify;

pub use error::ValidationError;
pub type Result<T> = std::result::Result<T, ValidationError>;
