//! Signature verification primitives.
//!
//! Certificate contents are DER-encoded SubjectPublicKeyInfo structures; the
//! minimal DER walk below extracts the algorithm OID and the key bits, which
//! are then handed to ring's verifiers. NDN ECDSA signature values are DER
//! sequences, so the `_ASN1` verification algorithms consume them directly.

use crate::error::ValidationError;
use bytes::Bytes;
use ndn_bundle_common::packet::{Data, SignatureInfo, SignatureType};
use ring::digest;
use ring::signature::{self, UnparsedPublicKey};

/* ---------------------------------------------------------------- *
 * Algorithm OIDs (DER contents octets)
 * ---------------------------------------------------------------- */

/// 1.2.840.113549.1.1.1 — rsaEncryption
pub const OID_RSA_ENCRYPTION: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];

/// 1.2.840.10045.2.1 — id-ecPublicKey
pub const OID_EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];

/// 1.2.840.10045.3.1.7 — secp256r1
pub const OID_SECP256R1: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];

/// 1.3.132.0.34 — secp384r1
pub const OID_SECP384R1: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x22];

const DER_SEQUENCE: u8 = 0x30;
const DER_OID: u8 = 0x06;
const DER_BIT_STRING: u8 = 0x03;

/// A public key extracted from a certificate's SubjectPublicKeyInfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// RSAPublicKey DER (modulus + exponent).
    Rsa(Bytes),
    /// Uncompressed secp256r1 point.
    EcdsaP256(Bytes),
    /// Uncompressed secp384r1 point.
    EcdsaP384(Bytes),
}

/* ---------------------------------------------------------------- *
 * Minimal DER reader
 * ---------------------------------------------------------------- */

struct DerReader<'a> {
    bytes: &'a [u8],
}

impl<'a> DerReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Reads one element, returning its tag and contents octets.
    fn read_element(&mut self) -> Result<(u8, &'a [u8]), ValidationError> {
        if self.bytes.len() < 2 {
            return Err(malformed("truncated DER element"));
        }
        let tag = self.bytes[0];
        let first = self.bytes[1];
        let (len, header) = if first < 0x80 {
            (first as usize, 2)
        } else {
            let n = (first & 0x7F) as usize;
            if n == 0 || n > 4 || self.bytes.len() < 2 + n {
                return Err(malformed("unsupported DER length"));
            }
            let mut len = 0usize;
            for &b in &self.bytes[2..2 + n] {
                len = (len << 8) | b as usize;
            }
            (len, 2 + n)
        };
        if self.bytes.len() < header + len {
            return Err(malformed("DER element overruns its buffer"));
        }
        let contents = &self.bytes[header..header + len];
        self.bytes = &self.bytes[header + len..];
        Ok((tag, contents))
    }

    fn expect(&mut self, expected: u8) -> Result<&'a [u8], ValidationError> {
        let (tag, contents) = self.read_element()?;
        if tag != expected {
            return Err(malformed(&format!(
                "expected DER tag {:#04x}, found {:#04x}",
                expected, tag
            )));
        }
        Ok(contents)
    }
}

fn malformed(detail: &str) -> ValidationError {
    ValidationError::UnsupportedAlgorithm(format!("malformed public key: {}", detail))
}

/// Parses a DER SubjectPublicKeyInfo into one of the supported key types.
pub fn parse_spki(spki: &[u8]) -> Result<PublicKey, ValidationError> {
    let mut outer = DerReader::new(spki);
    let mut info = DerReader::new(outer.expect(DER_SEQUENCE)?);

    let mut algorithm = DerReader::new(info.expect(DER_SEQUENCE)?);
    let alg_oid = algorithm.expect(DER_OID)?;

    let bits = info.expect(DER_BIT_STRING)?;
    // a BIT STRING's first contents octet counts unused trailing bits
    let key_bits = match bits.split_first() {
        Some((0, rest)) => rest,
        _ => return Err(malformed("public key BIT STRING has unused bits")),
    };

    if alg_oid == OID_RSA_ENCRYPTION {
        return Ok(PublicKey::Rsa(Bytes::copy_from_slice(key_bits)));
    }

    if alg_oid == OID_EC_PUBLIC_KEY {
        let curve_oid = algorithm.expect(DER_OID)?;
        return if curve_oid == OID_SECP256R1 {
            Ok(PublicKey::EcdsaP256(Bytes::copy_from_slice(key_bits)))
        } else if curve_oid == OID_SECP384R1 {
            Ok(PublicKey::EcdsaP384(Bytes::copy_from_slice(key_bits)))
        } else {
            Err(ValidationError::UnsupportedAlgorithm(
                "unrecognized elliptic curve".into(),
            ))
        };
    }

    Err(ValidationError::UnsupportedAlgorithm(
        "unrecognized public key algorithm".into(),
    ))
}

/* ---------------------------------------------------------------- *
 * Verification
 * ---------------------------------------------------------------- */

/// Verifies `sig_value` over `signed` using the key in `spki`, according to
/// the algorithm named in `info`.
pub fn verify_with_key(
    signed: &[u8],
    info: &SignatureInfo,
    sig_value: &[u8],
    spki: &[u8],
) -> Result<(), ValidationError> {
    match info.signature_type {
        SignatureType::DigestSha256 => verify_digest_sha256(signed, sig_value),
        SignatureType::Sha256WithRsa => {
            let PublicKey::Rsa(key) = parse_spki(spki)? else {
                return Err(ValidationError::SignatureMismatch(
                    "RSA signature with non-RSA key".into(),
                ));
            };
            UnparsedPublicKey::new(&signature::RSA_PKCS1_2048_8192_SHA256, key)
                .verify(signed, sig_value)
                .map_err(|_| ValidationError::SignatureMismatch("RSA verification failed".into()))
        }
        SignatureType::Sha256WithEcdsa => {
            let (algorithm, key): (&'static dyn signature::VerificationAlgorithm, _) =
                match parse_spki(spki)? {
                    PublicKey::EcdsaP256(key) => (&signature::ECDSA_P256_SHA256_ASN1, key),
                    PublicKey::EcdsaP384(key) => (&signature::ECDSA_P384_SHA256_ASN1, key),
                    PublicKey::Rsa(_) => {
                        return Err(ValidationError::SignatureMismatch(
                            "ECDSA signature with RSA key".into(),
                        ))
                    }
                };
            UnparsedPublicKey::new(algorithm, key)
                .verify(signed, sig_value)
                .map_err(|_| ValidationError::SignatureMismatch("ECDSA verification failed".into()))
        }
        SignatureType::Other(code) => Err(ValidationError::UnsupportedAlgorithm(format!(
            "signature type {}",
            code
        ))),
    }
}

/// Verifies a SHA-256 integrity signature.
pub fn verify_digest_sha256(signed: &[u8], sig_value: &[u8]) -> Result<(), ValidationError> {
    let computed = digest::digest(&digest::SHA256, signed);
    if computed.as_ref() == sig_value {
        Ok(())
    } else {
        Err(ValidationError::SignatureMismatch(
            "SHA-256 digest mismatch".into(),
        ))
    }
}

/// Signs `data` with a SHA-256 digest. Integrity only; used for bundle
/// segments, whose enclosed certificates carry their own signatures.
pub fn sign_digest_sha256(data: &mut Data) {
    data.set_signature_info(SignatureInfo {
        signature_type: SignatureType::DigestSha256,
        key_locator: None,
    });
    let signed = data.signed_portion();
    let sig = digest::digest(&digest::SHA256, &signed);
    data.set_signature_value(Bytes::copy_from_slice(sig.as_ref()));
}
