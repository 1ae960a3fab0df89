//! Shared fixtures: an in-memory face with programmable answers and
//! ring-backed test identities forming real certificate chains.

#![allow(dead_code)] // not every test binary exercises every fixture

use async_trait::async_trait;
use bytes::Bytes;
use ndn_bundle_common::certificate::Certificate;
use ndn_bundle_common::name::{Name, NameComponent};
use ndn_bundle_common::packet::{Data, Interest, KeyLocator, SignatureInfo, SignatureType};
use ndn_bundle_face::{Face, FetchError};
use ndn_bundle_security::verify;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use std::sync::{Arc, Mutex};

/* ---------------------------------------------------------------- *
 * Mock face
 * ---------------------------------------------------------------- */

pub type Handler = dyn Fn(&Interest) -> Result<Data, FetchError> + Send + Sync;

/// An in-memory face: answers every interest through a programmable
/// handler and records everything that was expressed.
pub struct MockFace {
    handler: Box<Handler>,
    sent: Mutex<Vec<Interest>>,
}

impl MockFace {
    pub fn with_handler(
        handler: impl Fn(&Interest) -> Result<Data, FetchError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// A face serving a fixed content store, nacking everything else.
    pub fn serving(store: Vec<Data>) -> Arc<Self> {
        Self::with_handler(move |interest| {
            find_in_store(&store, interest)
                .ok_or_else(|| FetchError::Nack(interest.name().to_string()))
        })
    }

    pub fn sent_interests(&self) -> Vec<Interest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Face for MockFace {
    async fn express_interest(&self, interest: Interest) -> Result<Data, FetchError> {
        self.sent.lock().unwrap().push(interest.clone());
        (self.handler)(&interest)
    }

    async fn put_data(&self, _data: Data) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Longest-prefix content-store lookup with NDN child selection: the child
/// selector orders candidates by the first component after the interest
/// name, leftmost thereafter.
pub fn find_in_store(store: &[Data], interest: &Interest) -> Option<Data> {
    let prefix_len = interest.name().len() as isize;
    let candidates: Vec<&Data> = store
        .iter()
        .filter(|d| interest.name().is_prefix_of(d.name()))
        .collect();

    let chosen = if interest.child_selector() == Some(1) {
        let max_first = candidates
            .iter()
            .map(|d| d.name().get(prefix_len))
            .max()?;
        candidates
            .into_iter()
            .filter(|d| d.name().get(prefix_len) == max_first)
            .min_by(|a, b| a.name().cmp(b.name()))
    } else {
        candidates.into_iter().min_by(|a, b| a.name().cmp(b.name()))
    };
    chosen.cloned()
}

/// True when `interest` is part of a bundle fetch.
pub fn is_bundle_interest(interest: &Interest) -> bool {
    interest
        .name()
        .components()
        .any(|c| c.as_bytes().as_ref() == b"BUNDLE")
}

/* ---------------------------------------------------------------- *
 * Test identities
 * ---------------------------------------------------------------- */

/// An identity with a P-256 key pair and a certificate, self-signed or
/// issued by a parent identity.
pub struct TestIdentity {
    pub name: Name,
    pub key_name: Name,
    pub cert: Certificate,
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl TestIdentity {
    /// A self-signed (anchor) identity.
    pub fn new(name: &str) -> Self {
        Self::build(name, None)
    }

    /// An identity whose certificate is signed by `issuer`.
    pub fn issued_by(name: &str, issuer: &TestIdentity) -> Self {
        Self::build(name, Some(issuer))
    }

    fn build(name: &str, issuer: Option<&TestIdentity>) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .expect("key generation");
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .expect("key parsing");

        let identity_name = Name::from_string(name);
        let key_name = identity_name
            .appended(NameComponent::from("KEY"))
            .appended(NameComponent::from("ksk-1"));
        let issuer_id = if issuer.is_some() { "parent" } else { "self" };
        let cert_name = key_name
            .appended(NameComponent::from(issuer_id))
            .appended_version(1);

        let spki = ec_spki_p256(key_pair.public_key().as_ref());
        let mut data = Data::new(cert_name, Bytes::from(spki));
        data.set_freshness_period_ms(Some(3_600_000));

        let mut identity = Self {
            name: identity_name,
            key_name,
            // placeholder until the data is signed below
            cert: Certificate::from_data(make_placeholder(&data)).unwrap(),
            key_pair,
            rng,
        };

        match issuer {
            Some(issuer) => issuer.sign_data(&mut data),
            None => identity.sign_data(&mut data),
        }
        identity.cert = Certificate::from_data(data).unwrap();
        identity
    }

    /// Signs `data` with this identity's key, naming its key as locator.
    pub fn sign_data(&self, data: &mut Data) {
        data.set_signature_info(SignatureInfo {
            signature_type: SignatureType::Sha256WithEcdsa,
            key_locator: Some(KeyLocator::Name(self.key_name.clone())),
        });
        let signed = data.signed_portion();
        let sig = self.key_pair.sign(&self.rng, &signed).expect("signing");
        data.set_signature_value(Bytes::copy_from_slice(sig.as_ref()));
    }

    /// Builds a signed interest: SignatureInfo and SignatureValue ride in
    /// the last two name components, the signature covering everything
    /// before the value component.
    pub fn sign_interest(&self, name: Name) -> Interest {
        use bytes::BytesMut;
        use ndn_bundle_common::tlv;

        let info = SignatureInfo {
            signature_type: SignatureType::Sha256WithEcdsa,
            key_locator: Some(KeyLocator::Name(self.key_name.clone())),
        };
        let mut info_bytes = BytesMut::new();
        info.to_tlv().encode(&mut info_bytes);
        let with_info = name.appended(NameComponent::new(info_bytes.freeze()));

        let signed = with_info.to_tlv().value;
        let sig = self.key_pair.sign(&self.rng, &signed).expect("signing");

        let mut value_bytes = BytesMut::new();
        tlv::TlvElement::new(tlv::TLV_SIGNATURE_VALUE, Bytes::copy_from_slice(sig.as_ref()))
            .encode(&mut value_bytes);

        Interest::new(with_info.appended(NameComponent::new(value_bytes.freeze())))
    }

    pub fn cert_data(&self) -> Data {
        self.cert.as_data().clone()
    }
}

fn make_placeholder(data: &Data) -> Data {
    let mut d = data.clone();
    d.set_signature_value(Bytes::from_static(&[0u8; 64]));
    d
}

/// Builds a SubjectPublicKeyInfo for an uncompressed P-256 point.
pub fn ec_spki_p256(point: &[u8]) -> Vec<u8> {
    fn der(tag: u8, contents: &[u8]) -> Vec<u8> {
        assert!(contents.len() < 128);
        let mut out = vec![tag, contents.len() as u8];
        out.extend_from_slice(contents);
        out
    }

    let mut algorithm = der(0x06, verify::OID_EC_PUBLIC_KEY);
    algorithm.extend_from_slice(&der(0x06, verify::OID_SECP256R1));
    let mut bit_string = vec![0u8];
    bit_string.extend_from_slice(point);
    let mut info = der(0x30, &algorithm);
    info.extend_from_slice(&der(0x03, &bit_string));
    der(0x30, &info)
}

/// A three-level chain: anchor → sub → leaf, plus a data packet signed by
/// the leaf.
pub struct ChainFixture {
    pub anchor: TestIdentity,
    pub sub: TestIdentity,
    pub leaf: TestIdentity,
    pub data: Data,
}

impl ChainFixture {
    pub fn new() -> Self {
        let anchor = TestIdentity::new("/fixture");
        let sub = TestIdentity::issued_by("/fixture/sub1", &anchor);
        let leaf = TestIdentity::issued_by("/fixture/sub1/sub3", &sub);

        let mut data = Data::new(
            Name::from_string("/fixture/sub1/sub3/data"),
            Bytes::from_static(b"application payload"),
        );
        data.set_freshness_period_ms(Some(10_000));
        leaf.sign_data(&mut data);

        Self {
            anchor,
            sub,
            leaf,
            data,
        }
    }

    /// Every certificate of the chain, leaf-most first.
    pub fn chain_certs(&self) -> Vec<Certificate> {
        vec![
            self.leaf.cert.clone(),
            self.sub.cert.clone(),
            self.anchor.cert.clone(),
        ]
    }

    /// Bundle segments carrying `groups` of certificates, named and signed
    /// the way the producer emits them: ascending segment numbers under one
    /// version, only the last carrying a finalBlockId.
    pub fn build_bundle_segments(
        bundle_name: &Name,
        version: u64,
        groups: &[&[&Certificate]],
    ) -> Vec<Data> {
        let versioned = bundle_name.appended_version(version);
        let last = groups.len() - 1;

        groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let mut content = Vec::new();
                for cert in group.iter() {
                    let mut d = cert.as_data().clone();
                    content.extend_from_slice(&d.wire_encode().unwrap());
                }
                let mut segment = Data::new(
                    versioned.appended_segment(i as u64),
                    Bytes::from(content),
                );
                segment.set_freshness_period_ms(Some(10_000));
                if i == last {
                    segment.set_final_block_id(Some(NameComponent::segment(i as u64)));
                }
                verify::sign_digest_sha256(&mut segment);
                segment
            })
            .collect()
    }
}
