//! # Compact JWS Decoding and Verification
//!
//! A signed assertion is a compact JWS: `header.payload.signature`, each
//! part base64url-encoded. Decoding classifies failures into the three
//! token stages of the error taxonomy:
//!
//! - `jws-decode`: wrong number of parts, bad base64url, header not JSON.
//! - `jws-algorithm`: header `alg` is not an RSA-family algorithm.
//! - `jws-payload-parse`: payload is not a JSON object.
//!
//! ## Security Invariant
//!
//! The algorithm check runs before anything else looks at the payload or
//! signature. An `HS*` header is never verified, so an RSA public key can
//! never be used as an HMAC secret.

use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use rsa::signature::Verifier;
use rsa::{pkcs1v15, pss, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;

use badge_core::{ErrorCode, ValidationError};

use crate::key::parse_public_key;

/// base64url, emitting no padding and tolerating it on input.
const B64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors from token decoding and verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwsError {
    /// The token is not a well-formed compact JWS.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The header names an algorithm outside the RSA family.
    #[error("rejected algorithm: {0}")]
    Algorithm(String),

    /// The payload is not a JSON object.
    #[error("payload is not a JSON object: {0}")]
    Payload(String),

    /// The public key could not be parsed.
    #[error("key error: {0}")]
    Key(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl JwsError {
    /// Error taxonomy code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Malformed(_) | Self::Key(_) | Self::Signing(_) => ErrorCode::JwsDecode,
            Self::Algorithm(_) => ErrorCode::JwsAlgorithm,
            Self::Payload(_) => ErrorCode::JwsPayloadParse,
        }
    }
}

impl From<JwsError> for ValidationError {
    fn from(e: JwsError) -> Self {
        ValidationError::new(e.code(), e.to_string())
    }
}

/// Accepted signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    RS512,
    /// RSASSA-PSS with SHA-256.
    PS256,
    /// RSASSA-PSS with SHA-384.
    PS384,
    /// RSASSA-PSS with SHA-512.
    PS512,
}

impl Algorithm {
    /// Returns the JOSE `alg` name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = JwsError;

    fn from_str(alg: &str) -> Result<Self, Self::Err> {
        match alg {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            "PS256" => Ok(Self::PS256),
            "PS384" => Ok(Self::PS384),
            "PS512" => Ok(Self::PS512),
            hmac if hmac.to_ascii_uppercase().starts_with("HS") => Err(JwsError::Algorithm(format!(
                "{hmac} is a symmetric algorithm; only RSA-family algorithms are accepted"
            ))),
            other => Err(JwsError::Algorithm(format!(
                "{other} is not an RSA-family algorithm"
            ))),
        }
    }
}

/// JOSE header of a signed assertion. Unknown members are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Algorithm name exactly as declared.
    pub alg: String,
    /// Media type, usually `JWT` or absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Key identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// A decoded (not yet verified) compact JWS.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedJws {
    /// The JOSE header.
    pub header: JwsHeader,
    /// The accepted algorithm named by the header.
    pub algorithm: Algorithm,
    /// The JSON payload.
    pub payload: Value,
    signing_input: String,
    signature: Vec<u8>,
}

impl DecodedJws {
    /// Bytes covered by the signature: `header_b64 + "." + payload_b64`.
    pub fn signing_input(&self) -> &[u8] {
        self.signing_input.as_bytes()
    }

    /// Raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Verify the signature with an RSA public key.
    pub fn verify_with(&self, key: &RsaPublicKey) -> bool {
        let msg = self.signing_input();
        let sig = self.signature();
        match self.algorithm {
            Algorithm::RS256 => check::<_, pkcs1v15::Signature>(pkcs1v15::VerifyingKey::<Sha256>::new(key.clone()), msg, sig),
            Algorithm::RS384 => check::<_, pkcs1v15::Signature>(pkcs1v15::VerifyingKey::<Sha384>::new(key.clone()), msg, sig),
            Algorithm::RS512 => check::<_, pkcs1v15::Signature>(pkcs1v15::VerifyingKey::<Sha512>::new(key.clone()), msg, sig),
            Algorithm::PS256 => check::<_, pss::Signature>(pss::VerifyingKey::<Sha256>::new(key.clone()), msg, sig),
            Algorithm::PS384 => check::<_, pss::Signature>(pss::VerifyingKey::<Sha384>::new(key.clone()), msg, sig),
            Algorithm::PS512 => check::<_, pss::Signature>(pss::VerifyingKey::<Sha512>::new(key.clone()), msg, sig),
        }
    }
}

fn check<V, S>(verifier: V, msg: &[u8], sig: &[u8]) -> bool
where
    V: Verifier<S>,
    S: for<'a> TryFrom<&'a [u8]>,
{
    match S::try_from(sig) {
        Ok(signature) => verifier.verify(msg, &signature).is_ok(),
        Err(_) => false,
    }
}

/// Split a compact JWS into its three parts.
pub fn split(token: &str) -> Result<(&str, &str, &str), JwsError> {
    let mut parts = token.trim().splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s)) if !h.is_empty() && !p.is_empty() && !s.is_empty() && !s.contains('.') => {
            Ok((h, p, s))
        }
        _ => Err(JwsError::Malformed("expected three non-empty dot-separated parts".into())),
    }
}

/// Cheap shape check: three base64url segments separated by dots.
pub fn is_compact_jws(input: &str) -> bool {
    split(input)
        .map(|(h, p, s)| [h, p, s].iter().all(|part| part.bytes().all(is_b64url_byte)))
        .unwrap_or(false)
}

fn is_b64url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'='
}

/// Decode a compact JWS without verifying it.
///
/// # Errors
///
/// - [`JwsError::Malformed`] for structural or base64url failures.
/// - [`JwsError::Algorithm`] for any non-RSA `alg`, `HS*` included.
/// - [`JwsError::Payload`] when the payload is not a JSON object.
pub fn decode(token: &str) -> Result<DecodedJws, JwsError> {
    let (header_b64, payload_b64, signature_b64) = split(token)?;

    let header_bytes = B64URL
        .decode(header_b64)
        .map_err(|e| JwsError::Malformed(format!("header is not base64url: {e}")))?;
    let header: JwsHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| JwsError::Malformed(format!("header is not a JOSE object: {e}")))?;

    let algorithm = header.alg.parse::<Algorithm>().map_err(|e| {
        tracing::warn!(alg = %header.alg, "rejecting token with non-RSA algorithm");
        e
    })?;

    let signature = B64URL
        .decode(signature_b64)
        .map_err(|e| JwsError::Malformed(format!("signature is not base64url: {e}")))?;
    let payload_bytes = B64URL
        .decode(payload_b64)
        .map_err(|e| JwsError::Malformed(format!("payload is not base64url: {e}")))?;

    let payload: Value =
        serde_json::from_slice(&payload_bytes).map_err(|e| JwsError::Payload(e.to_string()))?;
    if !payload.is_object() {
        return Err(JwsError::Payload("payload must be a JSON object".into()));
    }

    Ok(DecodedJws {
        header,
        algorithm,
        payload,
        signing_input: format!("{header_b64}.{payload_b64}"),
        signature,
    })
}

/// Verify a compact JWS against a PEM-encoded RSA public key.
///
/// Returns `false` for any token that does not decode, any key that does
/// not parse, and any signature that does not match.
pub fn verify(token: &str, public_key_pem: &str) -> bool {
    let decoded = match decode(token) {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!(error = %e, "token did not decode; signature not verified");
            return false;
        }
    };
    let key = match parse_public_key(public_key_pem) {
        Ok(k) => k,
        Err(e) => {
            tracing::warn!(error = %e, "issuer public key is unusable");
            return false;
        }
    };
    decoded.verify_with(&key)
}

/// Sign a JSON payload as a compact JWS.
#[cfg(feature = "signing")]
pub fn sign(
    algorithm: Algorithm,
    payload: &Value,
    key: &rsa::RsaPrivateKey,
) -> Result<String, JwsError> {
    use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer};

    let header = JwsHeader {
        alg: algorithm.as_str().to_string(),
        typ: Some("JWT".into()),
        kid: None,
    };
    let header_json = serde_json::to_vec(&header).map_err(|e| JwsError::Signing(e.to_string()))?;
    let payload_json = serde_json::to_vec(payload).map_err(|e| JwsError::Signing(e.to_string()))?;
    let signing_input = format!("{}.{}", B64URL.encode(header_json), B64URL.encode(payload_json));
    let msg = signing_input.as_bytes();

    let mut rng = rand::thread_rng();
    let signature = match algorithm {
        Algorithm::RS256 => pkcs1v15::SigningKey::<Sha256>::new(key.clone()).sign(msg).to_vec(),
        Algorithm::RS384 => pkcs1v15::SigningKey::<Sha384>::new(key.clone()).sign(msg).to_vec(),
        Algorithm::RS512 => pkcs1v15::SigningKey::<Sha512>::new(key.clone()).sign(msg).to_vec(),
        Algorithm::PS256 => pss::BlindedSigningKey::<Sha256>::new(key.clone()).sign_with_rng(&mut rng, msg).to_vec(),
        Algorithm::PS384 => pss::BlindedSigningKey::<Sha384>::new(key.clone()).sign_with_rng(&mut rng, msg).to_vec(),
        Algorithm::PS512 => pss::BlindedSigningKey::<Sha512>::new(key.clone()).sign_with_rng(&mut rng, msg).to_vec(),
    };

    Ok(format!("{signing_input}.{}", B64URL.encode(signature)))
}
