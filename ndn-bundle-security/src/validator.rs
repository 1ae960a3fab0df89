//! Bundle-aware validator.
//!
//! For a target data packet the validator derives a bundle name, fetches the
//! bundle segments, ingests the contained certificates into the shared
//! cache, and resolves each chain step from the cache. A nack or timeout on
//! any bundle interest silently falls back to per-certificate fetching with
//! a bounded retry budget.

use crate::cache::CertificateCache;
use crate::error::ValidationError;
use crate::policy::{SignedSubject, ValidationPolicy, ValidationRequest};
use crate::verify;
use futures::future::BoxFuture;
use log::{debug, trace, warn};
use ndn_bundle_common::certificate::Certificate;
use ndn_bundle_common::metrics::BundleMetrics;
use ndn_bundle_common::name::{Name, NameComponent};
use ndn_bundle_common::packet::{Data, Interest, SignatureType};
use ndn_bundle_common::{tlv, Error};
use ndn_bundle_face::Face;
use std::sync::{Arc, Mutex};

/// Lifetime of the first bundle interest, in milliseconds. Long, since the
/// producer may assemble the bundle on demand.
pub const DEFAULT_BUNDLE_INTEREST_LIFETIME_MS: u64 = 100_000;

/// The literal component marking a bundle name.
pub const BUNDLE_COMPONENT: &[u8] = b"BUNDLE";

/// Tunables of a [`Validator`].
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Lifetime of the first bundle segment interest.
    pub bundle_interest_lifetime_ms: u64,
    /// Certificate cache bound; `None` keeps it unbounded.
    pub cache_capacity: Option<usize>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            bundle_interest_lifetime_ms: DEFAULT_BUNDLE_INTEREST_LIFETIME_MS,
            cache_capacity: None,
        }
    }
}

/// Derives the bundle name for a data name: strip a trailing implicit
/// digest and/or segment component, then append `BUNDLE`.
///
/// Stable under segmentation: every data differing only in segment number
/// or implicit digest maps to the same bundle name.
pub fn derive_bundle_name(name: &Name) -> Result<Name, Error> {
    let stripped = match name.get(-1) {
        Some(last) if last.is_implicit_sha256_digest() => {
            if name.get(-2).is_some_and(|c| c.is_segment()) {
                name.prefix(-2)
            } else {
                name.prefix(-1)
            }
        }
        Some(last) if last.is_segment() => name.prefix(-1),
        _ => name.clone(),
    };

    if stripped.is_empty() {
        return Err(Error::Naming(format!(
            "cannot derive a bundle name from {}",
            name
        )));
    }
    Ok(stripped.appended(NameComponent::new(BUNDLE_COMPONENT)))
}

/// Validates packets by walking their certificate chains, preferring the
/// bundle fast path over per-certificate fetching.
pub struct Validator<F: Face, P: ValidationPolicy> {
    face: Arc<F>,
    policy: P,
    cache: Mutex<CertificateCache>,
    config: ValidatorConfig,
    metrics: Arc<BundleMetrics>,
}

impl<F: Face, P: ValidationPolicy> Validator<F, P> {
    pub fn new(face: Arc<F>, policy: P) -> Self {
        Self::with_config(face, policy, ValidatorConfig::default())
    }

    pub fn with_config(face: Arc<F>, policy: P, config: ValidatorConfig) -> Self {
        Self {
            face,
            policy,
            cache: Mutex::new(CertificateCache::with_capacity(config.cache_capacity)),
            config,
            metrics: Arc::new(BundleMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<BundleMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Validates a data packet: resolves its certificate chain up to a
    /// trust anchor and verifies every signature along the way.
    pub async fn validate_data(&self, data: &Data) -> Result<(), ValidationError> {
        self.validate_data_at(data, 0).await
    }

    /// Like [`validate_data`](Self::validate_data) with an explicit
    /// starting recursion depth.
    pub async fn validate_data_at(
        &self,
        data: &Data,
        n_steps: usize,
    ) -> Result<(), ValidationError> {
        let result = self.do_validate_data(data.clone(), n_steps).await;
        self.record(&result);
        result
    }

    /// Validates a signed interest. Interests skip the bundle shortcut and
    /// resolve their chain by direct certificate fetch.
    pub async fn validate_interest(&self, interest: &Interest) -> Result<(), ValidationError> {
        self.validate_interest_at(interest, 0).await
    }

    pub async fn validate_interest_at(
        &self,
        interest: &Interest,
        n_steps: usize,
    ) -> Result<(), ValidationError> {
        let result = async {
            let next_steps = self.policy.check_interest_policy(interest, n_steps)?;
            let Some(step) = next_steps.into_iter().next() else {
                return Ok(());
            };
            let subject = SignedSubject::from_interest(interest)?;
            let cert_data = self.fetch_certificate_direct(&step).await?;
            self.continue_with_certificate(cert_data, subject, step).await
        }
        .await;
        self.record(&result);
        result
    }

    fn record(&self, result: &Result<(), ValidationError>) {
        if result.is_ok() {
            self.metrics.validations_succeeded.increment();
        } else {
            self.metrics.validations_failed.increment();
        }
    }

    fn do_validate_data(
        &self,
        data: Data,
        n_steps: usize,
    ) -> BoxFuture<'_, Result<(), ValidationError>> {
        Box::pin(async move {
            let next_steps = self.policy.check_data_policy(&data, n_steps)?;
            let Some(step) = next_steps.into_iter().next() else {
                // the policy verified the packet on its own
                return Ok(());
            };
            let subject = SignedSubject::from_data(&data);
            self.check_key_bundle(subject, step).await
        })
    }

    /// The bundle fetch state machine for one pending step.
    async fn check_key_bundle(
        &self,
        subject: SignedSubject,
        step: ValidationRequest,
    ) -> Result<(), ValidationError> {
        if let Some(cert_data) = self.cache_find(&step.interest) {
            return self.continue_with_certificate(cert_data, subject, step).await;
        }

        match derive_bundle_name(&subject.name) {
            Ok(bundle_name) => {
                if self.fetch_bundle(&bundle_name).await {
                    // the pending step resolves from the freshly filled cache
                    if let Some(cert_data) = self.cache_find(&step.interest) {
                        return self
                            .continue_with_certificate(cert_data, subject, step)
                            .await;
                    }
                    debug!(
                        "Bundle {} did not contain {}, falling back",
                        bundle_name,
                        step.interest.name()
                    );
                }
            }
            Err(e) => debug!("No bundle path for {}: {}", subject.name, e),
        }

        self.metrics.bundle_fallbacks.increment();
        let cert_data = self.fetch_certificate_direct(&step).await?;
        self.continue_with_certificate(cert_data, subject, step).await
    }

    /// Fetches and ingests bundle segments. Returns true when the final
    /// segment was ingested; false routes the caller to the fallback.
    async fn fetch_bundle(&self, bundle_name: &Name) -> bool {
        // the first interest discovers the newest bundle version
        let mut interest = Interest::new(bundle_name.clone());
        interest
            .set_lifetime_ms(self.config.bundle_interest_lifetime_ms)
            .set_must_be_fresh(true)
            .set_child_selector(Some(1));

        let mut segment_zero_expected = true;

        loop {
            self.metrics.bundle_interests_sent.increment();
            let segment = match self.face.express_interest(interest).await {
                Ok(segment) => segment,
                Err(e) => {
                    debug!("Bundle fetch for {} failed: {}", bundle_name, e);
                    return false;
                }
            };
            self.metrics.bundle_segments_received.increment();

            let segment_number = match segment
                .name()
                .get(-1)
                .ok_or(())
                .and_then(|c| c.to_segment().map_err(|_| ()))
            {
                Ok(n) => n,
                Err(()) => {
                    warn!("Bundle answer {} is not a segment", segment.name());
                    return false;
                }
            };

            if segment_zero_expected && segment_number != 0 {
                // rightmost-child discovery returned a later segment of the
                // newest version; pin to it and re-request segment zero
                interest = next_segment_interest(segment.name(), 0);
                segment_zero_expected = false;
                continue;
            }
            segment_zero_expected = false;

            if let Err(e) = self.ingest_segment(&segment) {
                warn!("Discarding bundle {}: {}", segment.name(), e);
                return false;
            }

            let complete = segment
                .final_block_id()
                .and_then(|f| f.to_segment().ok())
                .is_some_and(|final_segment| final_segment <= segment_number);
            if complete {
                trace!("Bundle {} complete at segment {}", bundle_name, segment_number);
                return true;
            }

            interest = next_segment_interest(segment.name(), segment_number + 1);
        }
    }

    /// Checks a segment's integrity signature, then parses each element of
    /// its content as a certificate and inserts it into the cache.
    /// Duplicate names overwrite idempotently.
    fn ingest_segment(&self, segment: &Data) -> Result<(), ValidationError> {
        // segments carry a digest signature only; the certificates inside
        // speak for their own provenance
        if segment.signature_info().signature_type != SignatureType::DigestSha256 {
            return Err(ValidationError::PolicyRejected(format!(
                "bundle segment {} is not digest-signed",
                segment.name()
            )));
        }
        verify::verify_digest_sha256(&segment.signed_portion(), segment.signature_value())?;

        let mut content = segment.content().clone();
        let mut cache = self.cache.lock().unwrap();
        while !content.is_empty() {
            let element = tlv::split_element(&mut content)?;
            let cert = Certificate::wire_decode(&element)?;
            trace!("Bundle yielded certificate {}", cert.name());
            cache.insert(cert.into_data());
            self.metrics.cache_inserts.increment();
        }
        self.metrics.cache_size.set(cache.len() as u64);
        Ok(())
    }

    /// Direct certificate fetch with the step's retry budget. Every attempt
    /// clones the interest with a fresh nonce; at most `n_retries + 1`
    /// interests go out.
    async fn fetch_certificate_direct(
        &self,
        step: &ValidationRequest,
    ) -> Result<Data, ValidationError> {
        let mut interest = step.interest.clone();
        let mut remaining = step.n_retries;

        loop {
            interest.refresh_nonce();
            self.metrics.cert_interests_sent.increment();
            match self.face.express_interest(interest.clone()).await {
                Ok(data) => return Ok(data),
                Err(e) if remaining > 0 => {
                    debug!(
                        "Retrying certificate fetch for {} ({} left): {}",
                        step.interest.name(),
                        remaining,
                        e
                    );
                    remaining -= 1;
                    self.metrics.cert_retries.increment();
                }
                Err(_) => {
                    return Err(ValidationError::CertFetchFailed(format!(
                        "Cannot fetch cert: {}",
                        step.interest.name()
                    )))
                }
            }
        }
    }

    /// Validates the retrieved certificate recursively, then verifies the
    /// subject's signature with its key.
    async fn continue_with_certificate(
        &self,
        cert_data: Data,
        subject: SignedSubject,
        step: ValidationRequest,
    ) -> Result<(), ValidationError> {
        let cert = Certificate::from_data(cert_data).map_err(|e| {
            ValidationError::CertFetchFailed(format!(
                "Cannot decode cert: {} ({})",
                step.interest.name(),
                e
            ))
        })?;

        self.do_validate_data(cert.as_data().clone(), step.n_steps)
            .await?;

        verify::verify_with_key(
            &subject.signed_portion,
            &subject.signature_info,
            &subject.signature_value,
            cert.public_key_bits(),
        )
        .map_err(|e| match e {
            ValidationError::SignatureMismatch(_) => {
                ValidationError::SignatureMismatch(format!("signature on {} is invalid", subject.name))
            }
            other => other,
        })
    }

    fn cache_find(&self, interest: &Interest) -> Option<Data> {
        let found = self.cache.lock().unwrap().find(interest);
        if found.is_some() {
            self.metrics.cache_hits.increment();
        } else {
            self.metrics.cache_misses.increment();
        }
        found
    }
}

/// The interest for segment `segment_number` of the bundle version pinned
/// by `segment_name`. Later segments use the default lifetime, leftmost
/// child selection, and no freshness requirement.
fn next_segment_interest(segment_name: &Name, segment_number: u64) -> Interest {
    let mut interest = Interest::new(
        segment_name.prefix(-1).appended_segment(segment_number),
    );
    interest
        .set_child_selector(Some(0))
        .set_must_be_fresh(false);
    interest
}
