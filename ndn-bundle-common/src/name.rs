//! NDN names and name components.
//!
//! A name is an ordered sequence of typed, opaque byte strings. Version and
//! segment components follow the NDN naming conventions: a generic component
//! whose value starts with a one-byte marker (0xFD for versions, 0x00 for
//! segments) followed by a non-negative integer.

use crate::error::Error;
use crate::tlv::{self, TlvElement};
use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Marker byte prefixing a segment number component.
pub const SEGMENT_MARKER: u8 = 0x00;

/// Marker byte prefixing a version number component.
pub const VERSION_MARKER: u8 = 0xFD;

/// Size of an implicit SHA-256 digest component value.
pub const SHA256_DIGEST_SIZE: usize = 32;

/// Represents a single NDN name component: a TLV type plus opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameComponent {
    tlv_type: u8,
    value: Bytes,
}

impl NameComponent {
    /// Creates a generic name component from a byte string.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            tlv_type: tlv::TLV_COMPONENT,
            value: bytes.into(),
        }
    }

    /// Creates a segment-number component (`0x00` marker convention).
    pub fn segment(segment: u64) -> Self {
        Self::with_marker(SEGMENT_MARKER, segment)
    }

    /// Creates a version-number component (`0xFD` marker convention).
    pub fn version(version: u64) -> Self {
        Self::with_marker(VERSION_MARKER, version)
    }

    /// Creates an implicit SHA-256 digest component.
    pub fn implicit_sha256_digest(digest: impl Into<Bytes>) -> Result<Self, Error> {
        let digest = digest.into();
        if digest.len() != SHA256_DIGEST_SIZE {
            return Err(Error::Naming(format!(
                "Implicit digest must be {} bytes, got {}",
                SHA256_DIGEST_SIZE,
                digest.len()
            )));
        }
        Ok(Self {
            tlv_type: tlv::TLV_IMPLICIT_SHA256_DIGEST_COMPONENT,
            value: digest,
        })
    }

    fn with_marker(marker: u8, number: u64) -> Self {
        let mut buf = BytesMut::with_capacity(9);
        buf.extend_from_slice(&[marker]);
        tlv::encode_non_negative_integer(number, &mut buf);
        Self {
            tlv_type: tlv::TLV_COMPONENT,
            value: buf.freeze(),
        }
    }

    /// Returns the component's TLV type.
    pub fn tlv_type(&self) -> u8 {
        self.tlv_type
    }

    /// Returns the component value as bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.value
    }

    pub fn is_generic(&self) -> bool {
        self.tlv_type == tlv::TLV_COMPONENT
    }

    pub fn is_implicit_sha256_digest(&self) -> bool {
        self.tlv_type == tlv::TLV_IMPLICIT_SHA256_DIGEST_COMPONENT
            && self.value.len() == SHA256_DIGEST_SIZE
    }

    pub fn is_segment(&self) -> bool {
        self.is_generic() && self.value.len() >= 2 && self.value[0] == SEGMENT_MARKER
    }

    pub fn is_version(&self) -> bool {
        self.is_generic() && self.value.len() >= 2 && self.value[0] == VERSION_MARKER
    }

    /// Interprets this component as a segment number.
    pub fn to_segment(&self) -> Result<u64, Error> {
        if !self.is_segment() {
            return Err(Error::Naming(format!("Not a segment component: {}", self)));
        }
        tlv::decode_non_negative_integer(&self.value[1..])
    }

    /// Interprets this component as a version number.
    pub fn to_version(&self) -> Result<u64, Error> {
        if !self.is_version() {
            return Err(Error::Naming(format!("Not a version component: {}", self)));
        }
        tlv::decode_non_negative_integer(&self.value[1..])
    }

    /// Encodes this name component as a TLV element.
    pub fn to_tlv(&self) -> TlvElement {
        TlvElement::new(self.tlv_type, self.value.clone())
    }

    /// Decodes a name component from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        match element.tlv_type {
            tlv::TLV_COMPONENT | tlv::TLV_IMPLICIT_SHA256_DIGEST_COMPONENT => Ok(Self {
                tlv_type: element.tlv_type,
                value: element.value.clone(),
            }),
            other => Err(Error::Tlv(format!(
                "Unexpected name component TLV type {}",
                other
            ))),
        }
    }
}

/// Canonical NDN component order: type, then length, then byte-wise value.
impl Ord for NameComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tlv_type
            .cmp(&other.tlv_type)
            .then_with(|| self.value.len().cmp(&other.value.len()))
            .then_with(|| self.value.as_ref().cmp(other.value.as_ref()))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for NameComponent {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_segment() {
            if let Ok(n) = self.to_segment() {
                return write!(f, "seg={}", n);
            }
        }
        if self.is_version() {
            if let Ok(n) = self.to_version() {
                return write!(f, "v={}", n);
            }
        }

        // Print printable ASCII characters directly, otherwise use hex
        let printable = !self.value.is_empty()
            && self.value.iter().all(|&b| b.is_ascii_graphic() || b == b' ');

        if printable {
            write!(f, "{}", String::from_utf8_lossy(&self.value))
        } else {
            write!(f, "0x")?;
            for &b in self.value.iter() {
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        }
    }
}

/// Represents an NDN name, an ordered sequence of name components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// Creates a new empty NDN name.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Creates a name from a string representation with '/' as component
    /// separator. Components are taken verbatim; percent-escaping is not
    /// interpreted.
    pub fn from_string(s: &str) -> Self {
        let components = s
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(|comp| NameComponent::new(comp.as_bytes().to_vec()))
            .collect();

        Self { components }
    }

    /// Returns the number of components in the name.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the name has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns an iterator over the name components.
    pub fn components(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    /// Gets a component by index. Negative indices count from the back,
    /// `-1` being the last component.
    pub fn get(&self, index: isize) -> Option<&NameComponent> {
        let idx = if index < 0 {
            self.components.len().checked_sub(index.unsigned_abs())?
        } else {
            index as usize
        };
        self.components.get(idx)
    }

    /// Appends a component in place.
    pub fn push(&mut self, component: NameComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Returns a copy of this name with `component` appended.
    pub fn appended(&self, component: NameComponent) -> Self {
        let mut name = self.clone();
        name.push(component);
        name
    }

    /// Returns a copy of this name with a segment-number component appended.
    pub fn appended_segment(&self, segment: u64) -> Self {
        self.appended(NameComponent::segment(segment))
    }

    /// Returns a copy of this name with a version-number component appended.
    pub fn appended_version(&self, version: u64) -> Self {
        self.appended(NameComponent::version(version))
    }

    /// Returns a prefix of this name. A non-negative `len` keeps the first
    /// `len` components; a negative `len` drops `-len` components from the
    /// back (the ndn convention `getPrefix(-1)`).
    pub fn prefix(&self, len: isize) -> Self {
        let keep = if len < 0 {
            self.components.len().saturating_sub(len.unsigned_abs())
        } else {
            (len as usize).min(self.components.len())
        };
        Self {
            components: self.components.iter().take(keep).cloned().collect(),
        }
    }

    /// Checks if this name is a prefix of another name.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }

        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }

    /// Encodes this name as a TLV element.
    pub fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();

        for component in &self.components {
            component.to_tlv().encode(&mut buf);
        }

        TlvElement::new(tlv::TLV_NAME, buf.freeze())
    }

    /// Decodes a name from a TLV element.
    pub fn from_tlv(element: &TlvElement) -> Result<Self, Error> {
        if element.tlv_type != tlv::TLV_NAME {
            return Err(Error::Tlv(format!(
                "Expected name TLV type {}, got {}",
                tlv::TLV_NAME,
                element.tlv_type
            )));
        }

        let mut components = Vec::new();
        let mut buf = element.value.clone();

        while buf.has_remaining() {
            let element = TlvElement::decode(&mut buf)?;
            components.push(NameComponent::from_tlv(&element)?);
        }

        Ok(Self { components })
    }
}

/// Total lexicographic order on the component sequence; a proper prefix
/// sorts before any of its extensions.
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }

        for component in &self.components {
            write!(f, "/{}", component)?;
        }

        Ok(())
    }
}
