//! # RSA Public Keys
//!
//! Issuers publish their verification key as PEM text at the assertion's
//! `verify.url`. Both SubjectPublicKeyInfo (`BEGIN PUBLIC KEY`) and PKCS#1
//! (`BEGIN RSA PUBLIC KEY`) encodings are accepted.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;

use crate::jws::JwsError;

const PKCS1_LABEL: &str = "BEGIN RSA PUBLIC KEY";

/// Parse an RSA public key from PEM text.
///
/// # Errors
///
/// Returns [`JwsError::Key`] if the text is not a PEM-encoded RSA public key.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, JwsError> {
    let pem = pem.trim();
    if pem.contains(PKCS1_LABEL) {
        RsaPublicKey::from_pkcs1_pem(pem)
            .map_err(|e| JwsError::Key(format!("invalid PKCS#1 public key: {e}")))
    } else {
        RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| JwsError::Key(format!("invalid public key: {e}")))
    }
}
