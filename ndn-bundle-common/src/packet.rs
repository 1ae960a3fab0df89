//! NDN Interest and Data packets.
//!
//! Both packet types memoize their wire encoding: the first `wire_encode`
//! caches the encoded block, `wire_decode` records the incoming block as the
//! memo, and every setter invalidates it. Children of a decoded packet are
//! located by TLV type, never by position, since optional children may be
//! absent.

use crate::error::Error;
use crate::name::{Name, NameComponent};
use crate::tlv::{self, TlvElement};
use crate::DEFAULT_INTEREST_LIFETIME_MS;
use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Draw a process-unique nonce. Seeded from the clock once, then stepped by
/// an odd constant so consecutive draws never repeat.
pub fn generate_nonce() -> u32 {
    static SEED: OnceLock<u32> = OnceLock::new();
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let seed = *SEED.get_or_init(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(0x5EED_5EED)
    });
    seed.wrapping_add(COUNTER.fetch_add(0x9E37_79B9, Ordering::Relaxed))
}

/* ---------------------------------------------------------------- *
 * Exclude filter
 * ---------------------------------------------------------------- */

/// One entry of an exclude filter: a concrete component or an `Any` gap
/// extending the exclusion to the range between its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcludeEntry {
    Component(NameComponent),
    Any,
}

/// The Interest exclude filter, a range set over name components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclude {
    entries: Vec<ExcludeEntry>,
}

impl Exclude {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Excludes exactly `component`.
    pub fn push_component(&mut self, component: NameComponent) -> &mut Self {
        self.entries.push(ExcludeEntry::Component(component));
        self
    }

    /// Opens a range to the neighbouring components (or to infinity at
    /// either end).
    pub fn push_any(&mut self) -> &mut Self {
        self.entries.push(ExcludeEntry::Any);
        self
    }

    /// Checks whether `component` falls in the excluded set.
    pub fn is_excluded(&self, component: &NameComponent) -> bool {
        let mut prev: Option<&NameComponent> = None;
        let mut any_open = false;

        for entry in &self.entries {
            match entry {
                ExcludeEntry::Any => any_open = true,
                ExcludeEntry::Component(c) => {
                    if component == c {
                        return true;
                    }
                    if any_open && component < c && prev.is_none_or(|p| component > p) {
                        return true;
                    }
                    prev = Some(c);
                    any_open = false;
                }
            }
        }

        any_open && prev.is_none_or(|p| component > p)
    }

    fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        for entry in &self.entries {
            match entry {
                ExcludeEntry::Component(c) => c.to_tlv().encode(&mut buf),
                ExcludeEntry::Any => TlvElement::new(tlv::TLV_ANY, Bytes::new()).encode(&mut buf),
            }
        }
        TlvElement::new(tlv::TLV_EXCLUDE, buf.freeze())
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        let mut entries = Vec::new();
        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let child = TlvElement::decode(&mut buf)?;
            if child.tlv_type == tlv::TLV_ANY {
                entries.push(ExcludeEntry::Any);
            } else {
                entries.push(ExcludeEntry::Component(NameComponent::from_tlv(&child)?));
            }
        }
        Ok(Self { entries })
    }
}

/* ---------------------------------------------------------------- *
 * Selectors
 * ---------------------------------------------------------------- */

/// Optional constraints on what data satisfies an interest. Encoded on the
/// wire only when at least one field deviates from its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    pub min_suffix_components: Option<u64>,
    pub max_suffix_components: Option<u64>,
    pub exclude: Exclude,
    /// 0 = leftmost (lexicographically smallest) child, 1 = rightmost.
    pub child_selector: Option<u8>,
    pub must_be_fresh: bool,
}

impl Selectors {
    pub fn is_default(&self) -> bool {
        self.min_suffix_components.is_none()
            && self.max_suffix_components.is_none()
            && self.exclude.is_empty()
            && self.child_selector.is_none()
            && !self.must_be_fresh
    }

    fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        if let Some(min) = self.min_suffix_components {
            TlvElement::from_non_negative_integer(tlv::TLV_MIN_SUFFIX_COMPONENTS, min)
                .encode(&mut buf);
        }
        if let Some(max) = self.max_suffix_components {
            TlvElement::from_non_negative_integer(tlv::TLV_MAX_SUFFIX_COMPONENTS, max)
                .encode(&mut buf);
        }
        if !self.exclude.is_empty() {
            self.exclude.to_tlv().encode(&mut buf);
        }
        if let Some(child) = self.child_selector {
            TlvElement::from_non_negative_integer(tlv::TLV_CHILD_SELECTOR, child as u64)
                .encode(&mut buf);
        }
        if self.must_be_fresh {
            TlvElement::new(tlv::TLV_MUST_BE_FRESH, Bytes::new()).encode(&mut buf);
        }
        TlvElement::new(tlv::TLV_SELECTORS, buf.freeze())
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        let mut selectors = Self::default();
        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let child = TlvElement::decode(&mut buf)?;
            match child.tlv_type {
                tlv::TLV_MIN_SUFFIX_COMPONENTS => {
                    selectors.min_suffix_components = Some(child.as_non_negative_integer()?);
                }
                tlv::TLV_MAX_SUFFIX_COMPONENTS => {
                    selectors.max_suffix_components = Some(child.as_non_negative_integer()?);
                }
                tlv::TLV_EXCLUDE => selectors.exclude = Exclude::from_tlv(&child)?,
                tlv::TLV_CHILD_SELECTOR => {
                    selectors.child_selector = Some(child.as_non_negative_integer()? as u8);
                }
                tlv::TLV_MUST_BE_FRESH => selectors.must_be_fresh = true,
                _ => {} // unrecognized selector, skip
            }
        }
        Ok(selectors)
    }
}

/* ---------------------------------------------------------------- *
 * Interest
 * ---------------------------------------------------------------- */

/// Represents an NDN Interest packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    name: Name,
    selectors: Selectors,
    nonce: u32,
    scope: Option<u8>,
    lifetime_ms: u64,
    #[serde(skip)]
    wire: Option<Bytes>,
}

impl Interest {
    /// Creates a new Interest with a fresh nonce and the default lifetime.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            selectors: Selectors::default(),
            nonce: generate_nonce(),
            scope: None,
            lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            wire: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn scope(&self) -> Option<u8> {
        self.scope
    }

    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    pub fn must_be_fresh(&self) -> bool {
        self.selectors.must_be_fresh
    }

    pub fn child_selector(&self) -> Option<u8> {
        self.selectors.child_selector
    }

    pub fn set_name(&mut self, name: Name) -> &mut Self {
        self.name = name;
        self.invalidate();
        self
    }

    pub fn set_nonce(&mut self, nonce: u32) -> &mut Self {
        self.nonce = nonce;
        self.invalidate();
        self
    }

    /// Replaces the nonce with a fresh process-unique value. Retried
    /// interests must go out with a new nonce.
    pub fn refresh_nonce(&mut self) -> &mut Self {
        self.set_nonce(generate_nonce())
    }

    pub fn set_scope(&mut self, scope: Option<u8>) -> &mut Self {
        self.scope = scope;
        self.invalidate();
        self
    }

    pub fn set_lifetime_ms(&mut self, lifetime_ms: u64) -> &mut Self {
        self.lifetime_ms = lifetime_ms;
        self.invalidate();
        self
    }

    pub fn set_must_be_fresh(&mut self, must_be_fresh: bool) -> &mut Self {
        self.selectors.must_be_fresh = must_be_fresh;
        self.invalidate();
        self
    }

    pub fn set_child_selector(&mut self, child_selector: Option<u8>) -> &mut Self {
        self.selectors.child_selector = child_selector;
        self.invalidate();
        self
    }

    pub fn set_min_suffix_components(&mut self, min: Option<u64>) -> &mut Self {
        self.selectors.min_suffix_components = min;
        self.invalidate();
        self
    }

    pub fn set_max_suffix_components(&mut self, max: Option<u64>) -> &mut Self {
        self.selectors.max_suffix_components = max;
        self.invalidate();
        self
    }

    pub fn set_exclude(&mut self, exclude: Exclude) -> &mut Self {
        self.selectors.exclude = exclude;
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        self.wire = None;
    }

    /// Encodes this Interest, memoizing the resulting block.
    pub fn wire_encode(&mut self) -> Result<Bytes, Error> {
        if let Some(wire) = &self.wire {
            return Ok(wire.clone());
        }

        let mut content = BytesMut::new();
        self.name.to_tlv().encode(&mut content);
        if !self.selectors.is_default() {
            self.selectors.to_tlv().encode(&mut content);
        }
        // Nonce is always present on the wire.
        TlvElement::new(tlv::TLV_NONCE, self.nonce.to_be_bytes().to_vec()).encode(&mut content);
        if let Some(scope) = self.scope {
            TlvElement::from_non_negative_integer(tlv::TLV_SCOPE, scope as u64)
                .encode(&mut content);
        }
        if self.lifetime_ms != DEFAULT_INTEREST_LIFETIME_MS {
            TlvElement::from_non_negative_integer(tlv::TLV_INTEREST_LIFETIME, self.lifetime_ms)
                .encode(&mut content);
        }

        let mut buf = BytesMut::new();
        TlvElement::new(tlv::TLV_INTEREST, content.freeze()).encode(&mut buf);
        let wire = buf.freeze();
        self.wire = Some(wire.clone());
        Ok(wire)
    }

    /// Decodes an Interest from its exact wire block; the block becomes the
    /// encoding memo.
    pub fn wire_decode(wire: &[u8]) -> Result<Self, Error> {
        let whole = Bytes::copy_from_slice(wire);
        let mut buf = whole.clone();
        let outer = TlvElement::decode(&mut buf)?;
        if outer.tlv_type != tlv::TLV_INTEREST {
            return Err(Error::Tlv(format!(
                "Expected Interest TLV type {}, got {}",
                tlv::TLV_INTEREST,
                outer.tlv_type
            )));
        }
        if buf.has_remaining() {
            return Err(Error::Tlv("Trailing bytes after Interest".into()));
        }

        let mut name = None;
        let mut selectors = Selectors::default();
        let mut nonce = 0u32; // missing nonce normalizes to 0
        let mut scope = None;
        let mut lifetime_ms = DEFAULT_INTEREST_LIFETIME_MS;

        let mut children = outer.value.clone();
        while children.has_remaining() {
            let child = TlvElement::decode(&mut children)?;
            match child.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&child)?),
                tlv::TLV_SELECTORS => selectors = Selectors::from_tlv(&child)?,
                tlv::TLV_NONCE => {
                    if child.value.len() == 4 {
                        nonce = u32::from_be_bytes([
                            child.value[0],
                            child.value[1],
                            child.value[2],
                            child.value[3],
                        ]);
                    }
                }
                tlv::TLV_SCOPE => scope = Some(child.as_non_negative_integer()? as u8),
                tlv::TLV_INTEREST_LIFETIME => lifetime_ms = child.as_non_negative_integer()?,
                _ => {} // unrecognized child, skip
            }
        }

        let name = name.ok_or_else(|| Error::Tlv("Interest requires a Name".into()))?;

        Ok(Self {
            name,
            selectors,
            nonce,
            scope,
            lifetime_ms,
            wire: Some(whole),
        })
    }
}

impl PartialEq for Interest {
    fn eq(&self, other: &Self) -> bool {
        // the encoding memo does not participate in equality
        self.name == other.name
            && self.selectors == other.selectors
            && self.nonce == other.nonce
            && self.scope == other.scope
            && self.lifetime_ms == other.lifetime_ms
    }
}

impl Eq for Interest {}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/* ---------------------------------------------------------------- *
 * Data metadata and signature
 * ---------------------------------------------------------------- */

/// Data packet metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    pub content_type: Option<u64>,
    pub freshness_period_ms: Option<u64>,
    /// The last segment number of a multi-segment object. May be absent
    /// while more segments remain.
    pub final_block_id: Option<NameComponent>,
}

impl MetaInfo {
    fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        if let Some(ct) = self.content_type {
            TlvElement::from_non_negative_integer(tlv::TLV_CONTENT_TYPE, ct).encode(&mut buf);
        }
        if let Some(fp) = self.freshness_period_ms {
            TlvElement::from_non_negative_integer(tlv::TLV_FRESHNESS_PERIOD, fp).encode(&mut buf);
        }
        if let Some(fbi) = &self.final_block_id {
            let mut inner = BytesMut::new();
            fbi.to_tlv().encode(&mut inner);
            TlvElement::new(tlv::TLV_FINAL_BLOCK_ID, inner.freeze()).encode(&mut buf);
        }
        TlvElement::new(tlv::TLV_META_INFO, buf.freeze())
    }

    fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        let mut meta = Self::default();
        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let child = TlvElement::decode(&mut buf)?;
            match child.tlv_type {
                tlv::TLV_CONTENT_TYPE => meta.content_type = Some(child.as_non_negative_integer()?),
                tlv::TLV_FRESHNESS_PERIOD => {
                    meta.freshness_period_ms = Some(child.as_non_negative_integer()?);
                }
                tlv::TLV_FINAL_BLOCK_ID => {
                    let mut inner = child.value.clone();
                    let comp = TlvElement::decode(&mut inner)?;
                    meta.final_block_id = Some(NameComponent::from_tlv(&comp)?);
                }
                _ => {}
            }
        }
        Ok(meta)
    }
}

/// The cryptographic algorithm named by a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    /// SHA-256 digest only; integrity, no provenance.
    DigestSha256,
    /// RSA PKCS#1 v1.5 over SHA-256.
    Sha256WithRsa,
    /// ECDSA over SHA-256 (secp256r1 or secp384r1).
    Sha256WithEcdsa,
    /// An algorithm this implementation does not know.
    Other(u64),
}

impl SignatureType {
    pub fn code(self) -> u64 {
        match self {
            SignatureType::DigestSha256 => 0,
            SignatureType::Sha256WithRsa => 1,
            SignatureType::Sha256WithEcdsa => 3,
            SignatureType::Other(code) => code,
        }
    }

    pub fn from_code(code: u64) -> Self {
        match code {
            0 => SignatureType::DigestSha256,
            1 => SignatureType::Sha256WithRsa,
            3 => SignatureType::Sha256WithEcdsa,
            other => SignatureType::Other(other),
        }
    }
}

/// The key that produced a signature: a certificate/key name, or a digest of
/// the key. Only the name variant participates in chain walking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyLocator {
    Name(Name),
    KeyDigest(Bytes),
}

/// Signature metadata carried next to the signature value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature_type: SignatureType,
    pub key_locator: Option<KeyLocator>,
}

impl Default for SignatureInfo {
    fn default() -> Self {
        Self {
            signature_type: SignatureType::DigestSha256,
            key_locator: None,
        }
    }
}

impl SignatureInfo {
    /// The signer key name, when the locator is a name.
    pub fn key_locator_name(&self) -> Option<&Name> {
        match &self.key_locator {
            Some(KeyLocator::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        TlvElement::from_non_negative_integer(tlv::TLV_SIGNATURE_TYPE, self.signature_type.code())
            .encode(&mut buf);
        if let Some(locator) = &self.key_locator {
            let mut inner = BytesMut::new();
            match locator {
                KeyLocator::Name(name) => name.to_tlv().encode(&mut inner),
                KeyLocator::KeyDigest(digest) => {
                    TlvElement::new(tlv::TLV_KEY_DIGEST, digest.clone()).encode(&mut inner)
                }
            }
            TlvElement::new(tlv::TLV_KEY_LOCATOR, inner.freeze()).encode(&mut buf);
        }
        TlvElement::new(tlv::TLV_SIGNATURE_INFO, buf.freeze())
    }

    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        let mut signature_type = None;
        let mut key_locator = None;

        let mut buf = element.value.clone();
        while buf.has_remaining() {
            let child = TlvElement::decode(&mut buf)?;
            match child.tlv_type {
                tlv::TLV_SIGNATURE_TYPE => {
                    signature_type =
                        Some(SignatureType::from_code(child.as_non_negative_integer()?));
                }
                tlv::TLV_KEY_LOCATOR => {
                    let mut inner = child.value.clone();
                    let locator = TlvElement::decode(&mut inner)?;
                    key_locator = Some(match locator.tlv_type {
                        tlv::TLV_NAME => KeyLocator::Name(Name::from_tlv(&locator)?),
                        tlv::TLV_KEY_DIGEST => KeyLocator::KeyDigest(locator.value.clone()),
                        other => {
                            return Err(Error::Tlv(format!(
                                "Unexpected KeyLocator child TLV type {}",
                                other
                            )))
                        }
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            signature_type: signature_type
                .ok_or_else(|| Error::Tlv("SignatureInfo requires a SignatureType".into()))?,
            key_locator,
        })
    }
}

/* ---------------------------------------------------------------- *
 * Data
 * ---------------------------------------------------------------- */

/// Represents an NDN Data packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    name: Name,
    meta_info: MetaInfo,
    content: Bytes,
    signature_info: SignatureInfo,
    signature_value: Bytes,
    #[serde(skip)]
    wire: Option<Bytes>,
    #[serde(skip)]
    signed_portion: Option<Bytes>,
}

impl Data {
    /// Creates a new unsigned Data packet.
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            meta_info: MetaInfo::default(),
            content: content.into(),
            signature_info: SignatureInfo::default(),
            signature_value: Bytes::new(),
            wire: None,
            signed_portion: None,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn meta_info(&self) -> &MetaInfo {
        &self.meta_info
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn signature_info(&self) -> &SignatureInfo {
        &self.signature_info
    }

    pub fn signature_value(&self) -> &Bytes {
        &self.signature_value
    }

    pub fn freshness_period_ms(&self) -> Option<u64> {
        self.meta_info.freshness_period_ms
    }

    pub fn final_block_id(&self) -> Option<&NameComponent> {
        self.meta_info.final_block_id.as_ref()
    }

    pub fn set_name(&mut self, name: Name) -> &mut Self {
        self.name = name;
        self.invalidate();
        self
    }

    pub fn set_content(&mut self, content: impl Into<Bytes>) -> &mut Self {
        self.content = content.into();
        self.invalidate();
        self
    }

    pub fn set_content_type(&mut self, content_type: Option<u64>) -> &mut Self {
        self.meta_info.content_type = content_type;
        self.invalidate();
        self
    }

    pub fn set_freshness_period_ms(&mut self, freshness: Option<u64>) -> &mut Self {
        self.meta_info.freshness_period_ms = freshness;
        self.invalidate();
        self
    }

    pub fn set_final_block_id(&mut self, final_block_id: Option<NameComponent>) -> &mut Self {
        self.meta_info.final_block_id = final_block_id;
        self.invalidate();
        self
    }

    pub fn set_signature_info(&mut self, signature_info: SignatureInfo) -> &mut Self {
        self.signature_info = signature_info;
        self.invalidate();
        self
    }

    pub fn set_signature_value(&mut self, signature_value: impl Into<Bytes>) -> &mut Self {
        self.signature_value = signature_value.into();
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        self.wire = None;
        self.signed_portion = None;
    }

    /// The bytes covered by the signature: the Name, MetaInfo, Content and
    /// SignatureInfo blocks. Served from the memo when available.
    pub fn signed_portion(&self) -> Bytes {
        if let Some(signed) = &self.signed_portion {
            return signed.clone();
        }
        self.build_signed_portion()
    }

    fn build_signed_portion(&self) -> Bytes {
        let mut signed = BytesMut::new();
        self.name.to_tlv().encode(&mut signed);
        self.meta_info.to_tlv().encode(&mut signed);
        TlvElement::new(tlv::TLV_CONTENT, self.content.clone()).encode(&mut signed);
        self.signature_info.to_tlv().encode(&mut signed);
        signed.freeze()
    }

    /// Encodes this Data packet, memoizing the block and the signed portion.
    pub fn wire_encode(&mut self) -> Result<Bytes, Error> {
        if let Some(wire) = &self.wire {
            return Ok(wire.clone());
        }

        let signed = self.build_signed_portion();

        let mut content = BytesMut::with_capacity(signed.len() + self.signature_value.len() + 8);
        content.extend_from_slice(&signed);
        TlvElement::new(tlv::TLV_SIGNATURE_VALUE, self.signature_value.clone())
            .encode(&mut content);

        let mut buf = BytesMut::new();
        TlvElement::new(tlv::TLV_DATA, content.freeze()).encode(&mut buf);
        let wire = buf.freeze();

        self.signed_portion = Some(signed);
        self.wire = Some(wire.clone());
        Ok(wire)
    }

    /// Decodes a Data packet from its exact wire block; the block becomes
    /// the encoding memo.
    pub fn wire_decode(wire: &[u8]) -> Result<Self, Error> {
        let whole = Bytes::copy_from_slice(wire);
        let mut buf = whole.clone();
        let outer = TlvElement::decode(&mut buf)?;
        if outer.tlv_type != tlv::TLV_DATA {
            return Err(Error::Tlv(format!(
                "Expected Data TLV type {}, got {}",
                tlv::TLV_DATA,
                outer.tlv_type
            )));
        }
        if buf.has_remaining() {
            return Err(Error::Tlv("Trailing bytes after Data".into()));
        }

        let mut name = None;
        let mut meta_info = MetaInfo::default();
        let mut content = Bytes::new();
        let mut signature_info = None;
        let mut signature_value = None;
        let mut signed_end = None;

        let total = outer.value.len();
        let mut children = outer.value.clone();
        while children.has_remaining() {
            let consumed = total - children.remaining();
            let child = TlvElement::decode(&mut children)?;
            match child.tlv_type {
                tlv::TLV_NAME => name = Some(Name::from_tlv(&child)?),
                tlv::TLV_META_INFO => meta_info = MetaInfo::from_tlv(&child)?,
                tlv::TLV_CONTENT => content = child.value.clone(),
                tlv::TLV_SIGNATURE_INFO => signature_info = Some(SignatureInfo::from_tlv(&child)?),
                tlv::TLV_SIGNATURE_VALUE => {
                    signature_value = Some(child.value.clone());
                    signed_end = Some(consumed);
                }
                _ => {}
            }
        }

        let name = name.ok_or_else(|| Error::Tlv("Data requires a Name".into()))?;
        let signature_info =
            signature_info.ok_or_else(|| Error::Tlv("Data requires a SignatureInfo".into()))?;
        let signature_value =
            signature_value.ok_or_else(|| Error::Tlv("Data requires a SignatureValue".into()))?;
        let signed_portion = outer.value.slice(0..signed_end.unwrap_or(total));

        Ok(Self {
            name,
            meta_info,
            content,
            signature_info,
            signature_value,
            wire: Some(whole),
            signed_portion: Some(signed_portion),
        })
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        // the encoding memos do not participate in equality
        self.name == other.name
            && self.meta_info == other.meta_info
            && self.content == other.content
            && self.signature_info == other.signature_info
            && self.signature_value == other.signature_value
    }
}

impl Eq for Data {}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/* ---------------------------------------------------------------- *
 * Nack
 * ---------------------------------------------------------------- */

/// A negative acknowledgment: no producer can satisfy the enclosed interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nack {
    interest: Interest,
}

impl Nack {
    pub fn new(interest: Interest) -> Self {
        Self { interest }
    }

    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn wire_encode(&mut self) -> Result<Bytes, Error> {
        let inner = self.interest.wire_encode()?;
        let mut buf = BytesMut::new();
        TlvElement::new(tlv::TLV_NACK, inner).encode(&mut buf);
        Ok(buf.freeze())
    }

    pub fn wire_decode(wire: &[u8]) -> Result<Self, Error> {
        let mut buf = Bytes::copy_from_slice(wire);
        let outer = TlvElement::decode(&mut buf)?;
        if outer.tlv_type != tlv::TLV_NACK {
            return Err(Error::Tlv(format!(
                "Expected Nack TLV type {}, got {}",
                tlv::TLV_NACK,
                outer.tlv_type
            )));
        }
        Ok(Self {
            interest: Interest::wire_decode(&outer.value)?,
        })
    }
}
