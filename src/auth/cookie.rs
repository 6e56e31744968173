//! Signed cookie envelopes and cookie header helpers.
//!
//! The identity service stores the session token inside a signed cookie
//! value (format version 2):
//!
//! ```text
//! 2|<len>:<key_version>|<len>:<timestamp>|<len>:<name>|<len>:<base64 value>|<hex hmac>
//! ```
//!
//! The HMAC-SHA256 covers everything up to and including the last `|`.

use axum::http::{header::COOKIE, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE_NAME: &str = "auth";

/// Signed values older than this are rejected.
pub const SIGNED_VALUE_MAX_AGE_DAYS: i64 = 31;

const SIGNED_VALUE_VERSION: &str = "2|";

/// Reasons a signed cookie value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("malformed signed value")]
    Malformed,

    #[error("signature mismatch")]
    BadSignature,

    #[error("signed for cookie '{0}'")]
    NameMismatch(String),

    #[error("signed value is older than {} days", SIGNED_VALUE_MAX_AGE_DAYS)]
    Expired,

    #[error("payload is not valid base64 text")]
    Encoding,
}

/// Verifies (and, in tests, produces) signed cookie values.
#[derive(Clone)]
pub struct CookieSigner {
    secret: Vec<u8>,
}

impl CookieSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Verify a signed value for the named cookie and return its payload.
    pub fn unsign(&self, name: &str, signed: &str) -> Result<String, EnvelopeError> {
        self.unsign_at(name, signed, Utc::now().timestamp())
    }

    fn unsign_at(&self, name: &str, signed: &str, now: i64) -> Result<String, EnvelopeError> {
        let rest = signed
            .strip_prefix(SIGNED_VALUE_VERSION)
            .ok_or(EnvelopeError::Malformed)?;
        let (_key_version, rest) = consume_field(rest)?;
        let (timestamp, rest) = consume_field(rest)?;
        let (field_name, rest) = consume_field(rest)?;
        let (payload, signature) = consume_field(rest)?;

        let signed_part = &signed[..signed.len() - signature.len()];
        let signature = hex::decode(signature).map_err(|_| EnvelopeError::Malformed)?;
        self.mac(signed_part)
            .verify_slice(&signature)
            .map_err(|_| EnvelopeError::BadSignature)?;

        if field_name != name {
            return Err(EnvelopeError::NameMismatch(field_name.to_string()));
        }

        let timestamp: i64 = timestamp.parse().map_err(|_| EnvelopeError::Malformed)?;
        if timestamp < now - SIGNED_VALUE_MAX_AGE_DAYS * 86_400 {
            return Err(EnvelopeError::Expired);
        }

        let decoded = STANDARD
            .decode(payload)
            .map_err(|_| EnvelopeError::Encoding)?;
        String::from_utf8(decoded).map_err(|_| EnvelopeError::Encoding)
    }

    /// Produce a signed value the way the identity service does.
    #[cfg(test)]
    pub fn sign_at(&self, name: &str, value: &str, now: i64) -> String {
        let to_sign = format!(
            "2|{}|{}|{}|{}|",
            format_field("0"),
            format_field(&now.to_string()),
            format_field(name),
            format_field(&STANDARD.encode(value)),
        );
        let signature = hex::encode(self.mac(&to_sign).finalize().into_bytes());
        to_sign + &signature
    }

    fn mac(&self, message: &str) -> HmacSha256 {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC key length is unrestricted"));
        mac.update(message.as_bytes());
        mac
    }
}

/// Split one `<len>:<value>|` field off the front of `input`.
fn consume_field(input: &str) -> Result<(&str, &str), EnvelopeError> {
    let (length, rest) = input.split_once(':').ok_or(EnvelopeError::Malformed)?;
    let length: usize = length.parse().map_err(|_| EnvelopeError::Malformed)?;
    let value = rest.get(..length).ok_or(EnvelopeError::Malformed)?;
    let rest = rest
        .get(length..)
        .and_then(|r| r.strip_prefix('|'))
        .ok_or(EnvelopeError::Malformed)?;
    Ok((value, rest))
}

#[cfg(test)]
fn format_field(value: &str) -> String {
    format!("{}:{}", value.len(), value)
}

/// Find a cookie value in the request's `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const COOKIE_SECRET: &str = "test-cookie-secret";

    #[test]
    fn test_unsign_roundtrip() {
        let signer = CookieSigner::new(COOKIE_SECRET);
        let now = Utc::now().timestamp();
        let signed = signer.sign_at(AUTH_COOKIE_NAME, "header.payload.sig", now);

        assert!(signed.starts_with("2|1:0|"));
        assert_eq!(
            signer.unsign(AUTH_COOKIE_NAME, &signed).unwrap(),
            "header.payload.sig"
        );
    }

    #[test]
    fn test_known_envelope_layout() {
        let signer = CookieSigner::new(COOKIE_SECRET);
        let signed = signer.sign_at("auth", "tok", 1_700_000_000);

        let (body, signature) = signed.rsplit_once('|').unwrap();
        assert_eq!(body, "2|1:0|10:1700000000|4:auth|4:dG9r");
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now().timestamp();
        let signed = CookieSigner::new("another-secret").sign_at(AUTH_COOKIE_NAME, "tok", now);

        let err = CookieSigner::new(COOKIE_SECRET)
            .unsign(AUTH_COOKIE_NAME, &signed)
            .unwrap_err();
        assert_eq!(err, EnvelopeError::BadSignature);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signer = CookieSigner::new(COOKIE_SECRET);
        let now = Utc::now().timestamp();
        let signed = signer.sign_at(AUTH_COOKIE_NAME, "tok", now);
        let tampered = signed.replace("4:dG9r", "4:dG9s");

        assert_eq!(
            signer.unsign(AUTH_COOKIE_NAME, &tampered).unwrap_err(),
            EnvelopeError::BadSignature
        );
    }

    #[test]
    fn test_name_mismatch_rejected() {
        let signer = CookieSigner::new(COOKIE_SECRET);
        let now = Utc::now().timestamp();
        let signed = signer.sign_at("_xsrf", "tok", now);

        assert_eq!(
            signer.unsign(AUTH_COOKIE_NAME, &signed).unwrap_err(),
            EnvelopeError::NameMismatch("_xsrf".to_string())
        );
    }

    #[test]
    fn test_stale_envelope_rejected() {
        let signer = CookieSigner::new(COOKIE_SECRET);
        let now = Utc::now().timestamp();
        let signed = signer.sign_at(AUTH_COOKIE_NAME, "tok", now - 32 * 86_400);

        assert_eq!(
            signer.unsign(AUTH_COOKIE_NAME, &signed).unwrap_err(),
            EnvelopeError::Expired
        );
    }

    #[test]
    fn test_malformed_envelopes_rejected() {
        let signer = CookieSigner::new(COOKIE_SECRET);
        for raw in ["", "plain-token", "2|x:0|", "2|1:0|10:17000", "1|1:0|1:1|1:a|1:b|ff"] {
            assert_eq!(
                signer.unsign(AUTH_COOKIE_NAME, raw).unwrap_err(),
                EnvelopeError::Malformed,
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn test_cookie_value_lookup() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("_xsrf=abc; auth=\"2|1:0|x\""));
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));

        assert_eq!(cookie_value(&headers, "auth"), Some("2|1:0|x"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
