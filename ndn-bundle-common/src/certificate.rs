//! NDN certificates.
//!
//! A certificate is a Data packet whose name follows
//! `<identity>/KEY/<keyId>/<issuerId>/<version>` and whose content is a
//! DER-encoded public key (SubjectPublicKeyInfo).

use crate::error::Error;
use crate::name::{Name, NameComponent};
use crate::packet::Data;
use bytes::Bytes;
use std::fmt;

/// The literal `KEY` name component marking the key portion of a
/// certificate name.
pub const KEY_COMPONENT: &[u8] = b"KEY";

/// Offset of the `KEY` component from the end of a certificate name.
pub const KEY_COMPONENT_OFFSET: isize = -4;

/// Minimum number of trailing components after the identity prefix:
/// `KEY`, keyId, issuerId, version.
pub const MIN_CERT_NAME_LENGTH: usize = 4;

/// A Data packet interpreted as a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    data: Data,
}

impl Certificate {
    /// Wraps a Data packet, checking the certificate naming convention.
    pub fn from_data(data: Data) -> Result<Self, Error> {
        if !is_cert_name(data.name()) {
            return Err(Error::Naming(format!(
                "Name does not follow the certificate convention: {}",
                data.name()
            )));
        }
        Ok(Self { data })
    }

    /// Decodes a certificate from a Data wire block.
    pub fn wire_decode(wire: &[u8]) -> Result<Self, Error> {
        Self::from_data(Data::wire_decode(wire)?)
    }

    pub fn as_data(&self) -> &Data {
        &self.data
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    pub fn name(&self) -> &Name {
        self.data.name()
    }

    fn key_index(&self) -> usize {
        // from_data established len >= 4
        self.name().len() - MIN_CERT_NAME_LENGTH
    }

    /// Identity name: the prefix before the `KEY` component.
    pub fn identity(&self) -> Name {
        self.name().prefix(self.key_index() as isize)
    }

    /// Key name: the prefix up to and including the keyId component.
    pub fn key_name(&self) -> Name {
        self.name().prefix(self.key_index() as isize + 2)
    }

    pub fn key_id(&self) -> &NameComponent {
        self.name().get(KEY_COMPONENT_OFFSET + 1).unwrap()
    }

    pub fn issuer_id(&self) -> &NameComponent {
        self.name().get(KEY_COMPONENT_OFFSET + 2).unwrap()
    }

    /// The public key bits (SubjectPublicKeyInfo DER).
    pub fn public_key_bits(&self) -> &Bytes {
        self.data.content()
    }

    /// The signer key name from the KeyLocator, when present as a name.
    pub fn signer_name(&self) -> Option<&Name> {
        self.data.signature_info().key_locator_name()
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Checks whether `name` follows the certificate naming convention:
/// at least four components with the literal `KEY` at position −4.
pub fn is_cert_name(name: &Name) -> bool {
    name.len() >= MIN_CERT_NAME_LENGTH
        && name
            .get(KEY_COMPONENT_OFFSET)
            .is_some_and(|c| c.is_generic() && c.as_bytes().as_ref() == KEY_COMPONENT)
}

/// Extracts the key name (identity + `KEY` + keyId) from a certificate name.
pub fn to_key_name(cert_name: &Name) -> Result<Name, Error> {
    if !is_cert_name(cert_name) {
        return Err(Error::Naming(format!(
            "Not a certificate name: {}",
            cert_name
        )));
    }
    Ok(cert_name.prefix(-2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{KeyLocator, SignatureInfo, SignatureType};

    fn make_cert_data(name: &str) -> Data {
        let mut data = Data::new(Name::from_string(name), Bytes::from_static(b"spki"));
        data.set_signature_info(SignatureInfo {
            signature_type: SignatureType::Sha256WithEcdsa,
            key_locator: Some(KeyLocator::Name(Name::from_string("/root/KEY/k0"))),
        })
        .set_signature_value(Bytes::from_static(&[0u8; 64]));
        data
    }

    #[test]
    fn accepts_conventional_names() {
        let cert = Certificate::from_data(make_cert_data("/com/acme/KEY/k1/self/v1")).unwrap();
        assert_eq!(cert.identity(), Name::from_string("/com/acme"));
        assert_eq!(cert.key_name(), Name::from_string("/com/acme/KEY/k1"));
        assert_eq!(cert.key_id().as_bytes().as_ref(), b"k1");
        assert_eq!(cert.issuer_id().as_bytes().as_ref(), b"self");
        assert_eq!(cert.signer_name(), Some(&Name::from_string("/root/KEY/k0")));
    }

    #[test]
    fn rejects_short_or_misplaced_key() {
        assert!(Certificate::from_data(make_cert_data("/KEY/k1/self")).is_err());
        assert!(Certificate::from_data(make_cert_data("/a/b/c/d/e")).is_err());
        // KEY in the wrong position
        assert!(Certificate::from_data(make_cert_data("/a/KEY/k1/self/v1/extra")).is_err());
    }

    #[test]
    fn empty_identity_is_allowed() {
        let cert = Certificate::from_data(make_cert_data("/KEY/k1/self/v1")).unwrap();
        assert!(cert.identity().is_empty());
        assert_eq!(cert.key_name(), Name::from_string("/KEY/k1"));
    }

    #[test]
    fn key_name_extraction() {
        let name = Name::from_string("/id/KEY/k/iss/v");
        assert_eq!(to_key_name(&name).unwrap(), Name::from_string("/id/KEY/k"));
        assert!(to_key_name(&Name::from_string("/id/k")).is_err());
    }
}
