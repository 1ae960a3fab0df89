//! TLV (Type-Length-Value) primitives.
//!
//! Every NDN packet is a tree of TLV elements: a one-byte type tag, a
//! variable-width length, then that many value bytes. This module holds the
//! length codec, the non-negative integer codec, a generic element wrapper,
//! and the frame-carving helpers the transport and bundle paths use.

use crate::error::Error;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/* ---------------------------------------------------------------- *
 * TLV type constants (NDN packet format, single-byte range)
 * ---------------------------------------------------------------- */

pub const TLV_IMPLICIT_SHA256_DIGEST_COMPONENT: u8 = 0x01;
pub const TLV_NACK: u8                  = 0x03;
pub const TLV_INTEREST: u8              = 0x05;
pub const TLV_DATA: u8                  = 0x06;
pub const TLV_NAME: u8                  = 0x07;
pub const TLV_COMPONENT: u8             = 0x08;
pub const TLV_SELECTORS: u8             = 0x09;
pub const TLV_NONCE: u8                 = 0x0A;
pub const TLV_SCOPE: u8                 = 0x0B;
pub const TLV_INTEREST_LIFETIME: u8     = 0x0C;
pub const TLV_MIN_SUFFIX_COMPONENTS: u8 = 0x0D;
pub const TLV_MAX_SUFFIX_COMPONENTS: u8 = 0x0E;
pub const TLV_EXCLUDE: u8               = 0x10;
pub const TLV_CHILD_SELECTOR: u8        = 0x11;
pub const TLV_MUST_BE_FRESH: u8         = 0x12;
pub const TLV_ANY: u8                   = 0x13;
pub const TLV_META_INFO: u8             = 0x14;
pub const TLV_CONTENT: u8               = 0x15;
pub const TLV_SIGNATURE_INFO: u8        = 0x16;
pub const TLV_SIGNATURE_VALUE: u8       = 0x17;
pub const TLV_CONTENT_TYPE: u8          = 0x18;
pub const TLV_FRESHNESS_PERIOD: u8      = 0x19;
pub const TLV_FINAL_BLOCK_ID: u8        = 0x1A;
pub const TLV_SIGNATURE_TYPE: u8        = 0x1B;
pub const TLV_KEY_LOCATOR: u8           = 0x1C;
pub const TLV_KEY_DIGEST: u8            = 0x1D;

/* ---------------------------------------------------------------- *
 * Variable-width length codec
 * ---------------------------------------------------------------- */

/// Largest length that fits in the length octet itself.
const LEN_INLINE_MAX: u8 = 252;
/// Marker octet announcing a 16-bit big-endian length.
const LEN_U16_MARKER: u8 = 253;
/// Marker octet announcing a 32-bit big-endian length.
const LEN_U32_MARKER: u8 = 254;

/// Appends a length field: the value itself up to 252, otherwise a marker
/// octet followed by the big-endian 16- or 32-bit length.
pub fn put_var_length(length: usize, buf: &mut BytesMut) {
    match length {
        0..=252 => buf.put_u8(length as u8),
        253..=65_535 => {
            buf.put_u8(LEN_U16_MARKER);
            buf.put_u16(length as u16);
        }
        _ => {
            buf.put_u8(LEN_U32_MARKER);
            buf.put_u32(length as u32);
        }
    }
}

/// How many bytes [`put_var_length`] spends on `length`.
pub fn var_length_size(length: usize) -> usize {
    match length {
        0..=252 => 1,
        253..=65_535 => 3,
        _ => 5,
    }
}

/// Reads a full TLV header off the front of `buf`: the type octet and the
/// variable-width length, in one step.
///
/// The 64-bit length form (marker 255) exists on paper but has no place in
/// packets bounded by the NDN MTU, so it is refused here.
pub fn read_header(buf: &mut impl Buf) -> Result<(u8, usize), Error> {
    if buf.remaining() < 2 {
        return Err(Error::Tlv("TLV header cut short".into()));
    }

    let tlv_type = buf.get_u8();
    let length = match buf.get_u8() {
        n @ 0..=LEN_INLINE_MAX => n as usize,
        LEN_U16_MARKER => {
            if buf.remaining() < 2 {
                return Err(header_cut_short(tlv_type));
            }
            buf.get_u16() as usize
        }
        LEN_U32_MARKER => {
            if buf.remaining() < 4 {
                return Err(header_cut_short(tlv_type));
            }
            buf.get_u32() as usize
        }
        _ => {
            return Err(Error::Tlv(format!(
                "type {}: 8-byte TLV lengths are not accepted",
                tlv_type
            )))
        }
    };

    Ok((tlv_type, length))
}

fn header_cut_short(tlv_type: u8) -> Error {
    Error::Tlv(format!("type {}: length field cut short", tlv_type))
}

/* ---------------------------------------------------------------- *
 * Non-negative integer codec
 * ---------------------------------------------------------------- */

/// Encode `value` as an NDN non-negative integer (1, 2, 4 or 8 bytes,
/// big-endian, shortest form).
pub fn encode_non_negative_integer(value: u64, buf: &mut BytesMut) {
    if value <= 0xFF {
        buf.put_u8(value as u8);
    } else if value <= 0xFFFF {
        buf.put_u16(value as u16);
    } else if value <= 0xFFFF_FFFF {
        buf.put_u32(value as u32);
    } else {
        buf.put_u64(value);
    }
}

/// Decode an NDN non-negative integer from the full TLV value.
pub fn decode_non_negative_integer(value: &[u8]) -> Result<u64, Error> {
    match value.len() {
        1 => Ok(value[0] as u64),
        2 => Ok(u16::from_be_bytes([value[0], value[1]]) as u64),
        4 => Ok(u32::from_be_bytes([value[0], value[1], value[2], value[3]]) as u64),
        8 => Ok(u64::from_be_bytes([
            value[0], value[1], value[2], value[3], value[4], value[5], value[6], value[7],
        ])),
        n => Err(Error::Tlv(format!(
            "Invalid non-negative integer length {}",
            n
        ))),
    }
}

/* ---------------------------------------------------------------- *
 * TLV element wrapper
 * ---------------------------------------------------------------- */

/// One TLV element: its type tag and value bytes. The length field is
/// implied by the value and rebuilt on encode.
#[derive(Debug, Clone, PartialEq)]
pub struct TlvElement {
    pub tlv_type: u8,
    pub value: Bytes,
}

impl TlvElement {
    /// Create a new wrapper from raw parts.
    pub fn new(tlv_type: u8, value: impl Into<Bytes>) -> Self {
        Self {
            tlv_type,
            value: value.into(),
        }
    }

    /// Build an element holding a non-negative integer value.
    pub fn from_non_negative_integer(tlv_type: u8, value: u64) -> Self {
        let mut buf = BytesMut::with_capacity(8);
        encode_non_negative_integer(value, &mut buf);
        Self {
            tlv_type,
            value: buf.freeze(),
        }
    }

    /// Interpret the value as a non-negative integer.
    pub fn as_non_negative_integer(&self) -> Result<u64, Error> {
        decode_non_negative_integer(&self.value)
    }

    /// Encoded size of this element, header included.
    pub fn len(&self) -> usize {
        1 + var_length_size(self.value.len()) + self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Append this element, header first, to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.tlv_type);
        put_var_length(self.value.len(), buf);
        buf.extend_from_slice(&self.value);
    }

    /// Consume one element off the front of `buf`.
    pub fn decode(buf: &mut impl Buf) -> Result<Self, Error> {
        let (tlv_type, length) = read_header(buf)?;

        if buf.remaining() < length {
            return Err(Error::Tlv(format!(
                "type {} declares {} value bytes, buffer holds {}",
                tlv_type,
                length,
                buf.remaining()
            )));
        }

        Ok(Self {
            tlv_type,
            value: buf.copy_to_bytes(length),
        })
    }
}

/* ---------------------------------------------------------------- *
 * Whole-element splitting
 * ---------------------------------------------------------------- */

/// Split one complete TLV element (header *and* value) off the front of `buf`.
///
/// Used when the nested element must be re-parsed as a full packet, e.g. the
/// wire-encoded certificates inside a bundle segment's Content.
pub fn split_element(buf: &mut Bytes) -> Result<Bytes, Error> {
    let element_len = complete_element_len(buf)?
        .ok_or_else(|| Error::Tlv("Truncated TLV element".into()))?;
    Ok(buf.split_to(element_len))
}

/// Total encoded length of the TLV element at the start of `bytes`, or `None`
/// if `bytes` does not yet hold a complete element.
///
/// The transport uses this to carve complete frames out of a stream buffer,
/// so unlike [`read_header`] it never consumes input.
pub fn complete_element_len(bytes: &[u8]) -> Result<Option<usize>, Error> {
    if bytes.len() < 2 {
        return Ok(None);
    }

    let (length, header) = match bytes[1] {
        n @ 0..=LEN_INLINE_MAX => (n as usize, 2),
        LEN_U16_MARKER => {
            if bytes.len() < 4 {
                return Ok(None);
            }
            (u16::from_be_bytes([bytes[2], bytes[3]]) as usize, 4)
        }
        LEN_U32_MARKER => {
            if bytes.len() < 6 {
                return Ok(None);
            }
            (
                u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]) as usize,
                6,
            )
        }
        _ => {
            return Err(Error::Tlv(format!(
                "type {}: 8-byte TLV lengths are not accepted",
                bytes[0]
            )))
        }
    };

    if bytes.len() < header + length {
        return Ok(None);
    }
    Ok(Some(header + length))
}
