//! Certificate bundle producer.
//!
//! Starting from a signing key name, [`BundleHelper`] walks the chain of
//! signer certificates over a face, collects them in a [`BundleState`], and
//! packs them into size-bounded segments each signed with a SHA-256 digest.
//! The certificates inside carry their own signatures, so the segments need
//! integrity only.

use crate::verify;
use bytes::{Bytes, BytesMut};
use log::debug;
use ndn_bundle_common::certificate::Certificate;
use ndn_bundle_common::name::{Name, NameComponent};
use ndn_bundle_common::packet::{Data, Interest};
use ndn_bundle_common::{Error, MAX_NDN_PACKET_SIZE};
use ndn_bundle_face::Face;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default cap on the certificate chain depth collected into one bundle.
pub const DEFAULT_MAX_BUNDLE_SIZE: usize = 25;

/// Freshness period of a produced bundle segment, in milliseconds.
const SEGMENT_FRESHNESS_MS: u64 = 10_000;

/// State of one in-flight bundle creation.
///
/// Collects the certificate chain rooted at the signing key name of the
/// target data, leaf-most first, and holds the segments produced from it.
pub struct BundleState {
    signing_key_name: Name,
    certificate_chain: Vec<Certificate>,
    seen_certificate_names: HashSet<Name>,
    bundle_segments: Vec<Data>,
}

impl BundleState {
    fn new(signing_key_name: Name) -> Self {
        Self {
            signing_key_name,
            certificate_chain: Vec::new(),
            seen_certificate_names: HashSet::new(),
            bundle_segments: Vec::new(),
        }
    }

    /// Depth of the collected certificate chain.
    pub fn depth(&self) -> usize {
        self.certificate_chain.len()
    }

    /// Checks if `cert_name` has been previously seen, recording it either
    /// way. Once true for a name, stays true for the life of the state.
    pub fn has_seen_certificate_name(&mut self, cert_name: &Name) -> bool {
        !self.seen_certificate_names.insert(cert_name.clone())
    }

    /// Appends `cert` to the back of the certificate chain.
    pub fn add_certificate(&mut self, cert: Certificate) {
        self.certificate_chain.push(cert);
    }

    pub fn certificate_chain(&self) -> &[Certificate] {
        &self.certificate_chain
    }

    pub fn segments(&self) -> &[Data] {
        &self.bundle_segments
    }

    /// Packs the collected chain into signed segments under
    /// `bundle_interest_name` plus a fresh version component.
    fn create_cert_bundle(&mut self, bundle_interest_name: &Name) -> Result<(), Error> {
        let versioned_name = bundle_interest_name.appended_version(current_version());
        self.bundle_segments.clear();

        let wires: Vec<(usize, Bytes)> = self
            .certificate_chain
            .iter()
            .map(|cert| {
                let content_size = cert.as_data().content().len();
                let mut data = cert.as_data().clone();
                data.wire_encode().map(|wire| (content_size, wire))
            })
            .collect::<Result<_, _>>()?;

        let mut segment_number = 0u64;
        let mut content = BytesMut::new();

        for (content_size, wire) in &wires {
            if !content.is_empty() && content.len() + content_size >= MAX_NDN_PACKET_SIZE {
                let segment = std::mem::take(&mut content).freeze();
                self.create_bundle_segment(&versioned_name, segment_number, segment, false)?;
                segment_number += 1;
            }
            content.extend_from_slice(wire);
        }

        self.create_bundle_segment(&versioned_name, segment_number, content.freeze(), true)
    }

    fn create_bundle_segment(
        &mut self,
        versioned_name: &Name,
        segment_number: u64,
        content: Bytes,
        is_final: bool,
    ) -> Result<(), Error> {
        let full_name = versioned_name.appended_segment(segment_number);

        let mut segment = Data::new(full_name, content);
        segment.set_freshness_period_ms(Some(SEGMENT_FRESHNESS_MS));
        if is_final {
            // only the final segment marks the object complete
            segment.set_final_block_id(Some(NameComponent::segment(segment_number)));
        }
        verify::sign_digest_sha256(&mut segment);

        self.bundle_segments.push(segment);
        Ok(())
    }
}

fn current_version() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Builds certificate bundles by walking signing-key chains over a face.
pub struct BundleHelper<F: Face> {
    face: Arc<F>,
    max_bundle_size: usize,
}

impl<F: Face> BundleHelper<F> {
    pub fn new(face: Arc<F>) -> Self {
        Self {
            face,
            max_bundle_size: DEFAULT_MAX_BUNDLE_SIZE,
        }
    }

    /// Sets the chain-depth cap.
    pub fn set_max_bundle_size(&mut self, bundle_size: usize) {
        self.max_bundle_size = bundle_size;
    }

    pub fn max_bundle_size(&self) -> usize {
        self.max_bundle_size
    }

    /// Starts a bundle: walks the certificate chain rooted at
    /// `signing_key_name` and returns the state holding whatever portion of
    /// the chain was retrievable.
    pub async fn begin_bundle_creation(&self, signing_key_name: &Name) -> BundleState {
        let mut state = BundleState::new(signing_key_name.clone());
        self.fetch_certificates(signing_key_name.clone(), &mut state)
            .await;
        state
    }

    /// Re-walks the chain of an existing state, picking up certificates
    /// that were unavailable on the previous pass.
    pub async fn refresh_bundle(&self, state: &mut BundleState) {
        self.fetch_certificates(state.signing_key_name.clone(), state)
            .await;
    }

    /// Finalizes the segments for `bundle_interest_name` and returns them in
    /// ascending segment order.
    pub fn get_bundle<'a>(
        &self,
        bundle_interest_name: &Name,
        state: &'a mut BundleState,
    ) -> Result<&'a [Data], Error> {
        state.create_cert_bundle(bundle_interest_name)?;
        Ok(state.segments())
    }

    /// Walks signer links starting at `cert_name`. A nack, timeout or
    /// undecodable answer terminates the walk silently; the partial chain
    /// is still publishable.
    async fn fetch_certificates(&self, mut cert_name: Name, state: &mut BundleState) {
        loop {
            if state.depth() >= self.max_bundle_size
                || state.has_seen_certificate_name(&cert_name)
            {
                return;
            }

            let mut interest = Interest::new(cert_name.clone());
            interest.set_lifetime_ms(1000).set_must_be_fresh(true);

            let data = match self.face.express_interest(interest).await {
                Ok(data) => data,
                Err(e) => {
                    debug!("Chain walk stopped at {}: {}", cert_name, e);
                    return;
                }
            };

            let cert = match Certificate::from_data(data) {
                Ok(cert) => cert,
                Err(e) => {
                    debug!("Chain walk stopped at {}: {}", cert_name, e);
                    return;
                }
            };

            let next = cert.signer_name().cloned();
            state.add_certificate(cert);

            match next {
                Some(signer) => cert_name = signer,
                None => return,
            }
        }
    }
}
