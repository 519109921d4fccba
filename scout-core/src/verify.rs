//! Detached-signature verification
//!
//! The server contract mandates RSA PKCS#1 v1.5 over SHA-256; there is no
//! algorithm negotiation. The configured public key is a PEM
//! SubjectPublicKeyInfo envelope and must wrap an RSA key.

use rsa::pkcs8::der::{Decode, Document};
use rsa::pkcs8::spki::{self, SubjectPublicKeyInfoRef};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::error::ScoutError;

const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// Check `signature` over `bytes` against the PEM public key and return
/// the hex SHA-256 digest that was covered.
///
/// The digest is recomputed here; callers treat the returned value as the
/// authoritative content hash of `bytes`.
pub fn verify_detached(
    public_key_pem: &str,
    bytes: &[u8],
    signature: &[u8],
) -> Result<String, ScoutError> {
    let (label, document) =
        Document::from_pem(public_key_pem).map_err(|_| ScoutError::PemDecode)?;
    if label != PUBLIC_KEY_LABEL {
        return Err(ScoutError::PemDecode);
    }

    let info = SubjectPublicKeyInfoRef::from_der(document.as_bytes())
        .map_err(|_| ScoutError::ParseKey)?;
    let key = RsaPublicKey::try_from(info).map_err(|err| match err {
        spki::Error::OidUnknown { .. } => ScoutError::WrongKeyAlgorithm,
        _ => ScoutError::ParseKey,
    })?;

    let digest = Sha256::digest(bytes);
    key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .map_err(|_| ScoutError::SignatureInvalid)?;

    Ok(hex::encode(digest))
}
