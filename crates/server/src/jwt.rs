//! Subject extraction from identity tokens.
//!
//! Tokens are issued by the wallet and only carry the identity the request is
//! made for. They are not verified here: the identity still has to pass KYC
//! before anything is paid out to it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

/// Prefix of the `sub` claim.
pub const SUBJECT_PREFIX: &str = "coreid:";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum JwtError {
    #[error("token must have three segments")]
    Malformed,

    #[error("payload is not valid base64url")]
    Encoding,

    #[error("payload is not valid JSON: {0}")]
    Payload(String),

    #[error("subject is not a core id")]
    Subject,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
}

/// Identity named by the `sub` claim of `token`.
pub fn subject_id(token: &str) -> Result<String, JwtError> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(JwtError::Malformed),
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| JwtError::Encoding)?;
    let claims: Claims =
        serde_json::from_slice(&decoded).map_err(|e| JwtError::Payload(e.to_string()))?;

    claims
        .sub
        .as_deref()
        .and_then(|sub| sub.strip_prefix(SUBJECT_PREFIX))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(JwtError::Subject)
}

#[cfg(test)]
pub(crate) fn encode_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
