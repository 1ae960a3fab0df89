//! Trust policy: decides whether a packet is already trusted or which
//! certificate must be fetched next.
//!
//! The policy inspects a packet's signature and either verifies it against a
//! configured trust anchor (empty next-step list) or emits one
//! [`ValidationRequest`] naming the signer certificate to retrieve.

use crate::error::ValidationError;
use crate::verify;
use bytes::Bytes;
use ndn_bundle_common::certificate::Certificate;
use ndn_bundle_common::name::Name;
use ndn_bundle_common::packet::{Data, Interest, SignatureInfo, SignatureType};
use ndn_bundle_common::tlv::{self, TlvElement};

/// Default retry budget for a direct certificate fetch.
pub const DEFAULT_CERT_RETRIES: usize = 3;

/// Lifetime of a direct certificate-fetch interest, in milliseconds.
pub const CERT_FETCH_LIFETIME_MS: u64 = 1000;

/// Default bound on chain recursion depth.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Minimum name length of a signed interest: SignatureInfo and
/// SignatureValue components at the tail.
pub const SIGNED_INTEREST_MIN_LENGTH: usize = 2;

/// One pending signer lookup: the interest to express for the missing
/// certificate, its retry budget, and the recursion depth.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub interest: Interest,
    pub n_retries: usize,
    pub n_steps: usize,
}

/// The signed bytes of a packet together with its signature fields, in the
/// shape verification wants. Data packets carry them directly; signed
/// interests embed them in the last two name components.
#[derive(Debug, Clone)]
pub struct SignedSubject {
    pub name: Name,
    pub signed_portion: Bytes,
    pub signature_info: SignatureInfo,
    pub signature_value: Bytes,
}

impl SignedSubject {
    pub fn from_data(data: &Data) -> Self {
        Self {
            name: data.name().clone(),
            signed_portion: data.signed_portion(),
            signature_info: data.signature_info().clone(),
            signature_value: data.signature_value().clone(),
        }
    }

    pub fn from_interest(interest: &Interest) -> Result<Self, ValidationError> {
        let name = interest.name();
        if name.len() < SIGNED_INTEREST_MIN_LENGTH {
            return Err(ValidationError::PolicyRejected(format!(
                "interest {} carries no signature",
                name
            )));
        }

        let info_component = name.get(-2).unwrap();
        let mut info_bytes = info_component.as_bytes().clone();
        let info_element = TlvElement::decode(&mut info_bytes)?;
        if info_element.tlv_type != tlv::TLV_SIGNATURE_INFO {
            return Err(ValidationError::PolicyRejected(format!(
                "interest {} carries no signature info",
                name
            )));
        }
        let signature_info = SignatureInfo::from_tlv(&info_element)?;

        let value_component = name.get(-1).unwrap();
        let mut value_bytes = value_component.as_bytes().clone();
        let value_element = TlvElement::decode(&mut value_bytes)?;
        if value_element.tlv_type != tlv::TLV_SIGNATURE_VALUE {
            return Err(ValidationError::PolicyRejected(format!(
                "interest {} carries no signature value",
                name
            )));
        }

        // the signature covers every name component before the value
        let signed_portion = name.prefix(-1).to_tlv().value;

        Ok(Self {
            name: name.clone(),
            signed_portion,
            signature_info,
            signature_value: value_element.value,
        })
    }
}

/// Decides how validation proceeds for a packet.
pub trait ValidationPolicy: Send + Sync {
    /// Returns the pending signer lookups for `data`. An empty list means
    /// the packet is already verified.
    fn check_data_policy(
        &self,
        data: &Data,
        n_steps: usize,
    ) -> Result<Vec<ValidationRequest>, ValidationError>;

    /// Returns the pending signer lookups for a signed `interest`.
    fn check_interest_policy(
        &self,
        interest: &Interest,
        n_steps: usize,
    ) -> Result<Vec<ValidationRequest>, ValidationError>;
}

/// A chain-walking policy rooted at a set of trust anchor certificates.
///
/// Packets signed directly by an anchor are verified inline; everything else
/// produces a request for the signer certificate, to be resolved by the
/// validator and validated recursively.
pub struct TrustAnchorPolicy {
    anchors: Vec<Certificate>,
    max_steps: usize,
    n_retries: usize,
}

impl TrustAnchorPolicy {
    pub fn new(anchors: Vec<Certificate>) -> Self {
        Self {
            anchors,
            max_steps: DEFAULT_MAX_STEPS,
            n_retries: DEFAULT_CERT_RETRIES,
        }
    }

    pub fn with_limits(mut self, max_steps: usize, n_retries: usize) -> Self {
        self.max_steps = max_steps;
        self.n_retries = n_retries;
        self
    }

    pub fn anchors(&self) -> &[Certificate] {
        &self.anchors
    }

    fn find_anchor(&self, key_locator: &Name) -> Option<&Certificate> {
        self.anchors
            .iter()
            .find(|anchor| key_locator.is_prefix_of(anchor.name()))
    }

    fn evaluate(
        &self,
        subject: &SignedSubject,
        n_steps: usize,
    ) -> Result<Vec<ValidationRequest>, ValidationError> {
        // a bare digest proves integrity, not provenance; anyone can compute
        // one, so it never satisfies the chain requirement here. Bundle
        // segments, the one legitimate digest-signed object, are checked at
        // ingestion and never reach the policy.
        if subject.signature_info.signature_type == SignatureType::DigestSha256 {
            return Err(ValidationError::PolicyRejected(format!(
                "{} carries an integrity-only signature",
                subject.name
            )));
        }

        if n_steps >= self.max_steps {
            return Err(ValidationError::PolicyRejected(format!(
                "chain depth {} exceeded while validating {}",
                self.max_steps, subject.name
            )));
        }

        let key_locator = subject.signature_info.key_locator_name().ok_or_else(|| {
            ValidationError::PolicyRejected(format!(
                "{} names no signer certificate",
                subject.name
            ))
        })?;

        if let Some(anchor) = self.find_anchor(key_locator) {
            verify::verify_with_key(
                &subject.signed_portion,
                &subject.signature_info,
                &subject.signature_value,
                anchor.public_key_bits(),
            )
            .map_err(|e| match e {
                ValidationError::SignatureMismatch(_) => ValidationError::SignatureMismatch(
                    format!("anchor rejected signature on {}", subject.name),
                ),
                other => other,
            })?;
            return Ok(Vec::new());
        }

        let mut interest = Interest::new(key_locator.clone());
        interest
            .set_lifetime_ms(CERT_FETCH_LIFETIME_MS)
            .set_must_be_fresh(true);

        Ok(vec![ValidationRequest {
            interest,
            n_retries: self.n_retries,
            n_steps: n_steps + 1,
        }])
    }
}

impl ValidationPolicy for TrustAnchorPolicy {
    fn check_data_policy(
        &self,
        data: &Data,
        n_steps: usize,
    ) -> Result<Vec<ValidationRequest>, ValidationError> {
        self.evaluate(&SignedSubject::from_data(data), n_steps)
    }

    fn check_interest_policy(
        &self,
        interest: &Interest,
        n_steps: usize,
    ) -> Result<Vec<ValidationRequest>, ValidationError> {
        self.evaluate(&SignedSubject::from_interest(interest)?, n_steps)
    }
}
