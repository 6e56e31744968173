//! Session token verification.
//!
//! Tokens are issued by the external identity service; this side only
//! verifies them. The algorithm is pinned to HS256 regardless of what the
//! token header claims.

use chrono::Utc;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded payload of a verified session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Subject (caller identity).
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Expiration time (Unix timestamp, rounded up to the whole second).
    pub fn expires_at(&self) -> Option<i64> {
        self.0
            .get("exp")
            .and_then(Value::as_f64)
            .map(|exp| exp.ceil() as i64)
    }
}

/// Why a session credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("No session credential presented")]
    NoCredential,

    #[error("Session credential has expired")]
    ExpiredCredential,

    #[error("Session credential is malformed or invalid: {0}")]
    MalformedOrInvalidCredential(String),

    #[error("Unexpected error while verifying session credential: {0}")]
    UnexpectedVerificationError(String),
}

/// Verifies HS256 session tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for tokens signed with the given secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry in one pass and decode the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, GateError> {
        let claims = decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)
            .map(|data| Claims(data.claims))
            .map_err(classify)?;

        // jsonwebtoken only rejects `exp < now`; a token is already expired at `exp == now`
        match claims.expires_at() {
            Some(exp) if exp > Utc::now().timestamp() => Ok(claims),
            _ => Err(GateError::ExpiredCredential),
        }
    }
}

/// Sort a verification failure into the gate taxonomy.
fn classify(error: jsonwebtoken::errors::Error) -> GateError {
    match error.kind() {
        ErrorKind::ExpiredSignature => GateError::ExpiredCredential,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => GateError::MalformedOrInvalidCredential(error.to_string()),
        _ => GateError::UnexpectedVerificationError(error.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    pub(crate) const SECRET: &str = "test-app-secret-12345";

    /// Mint a token the way the identity service does.
    pub(crate) fn sign(claims: &Value, secret: &str, algorithm: Algorithm) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    pub(crate) fn claims_expiring_in(offset: Duration) -> Value {
        let now = Utc::now();
        json!({
            "sub": "employee-42",
            "email": "jane@example.com",
            "role": "manager",
            "iat": now.timestamp(),
            "exp": (now + offset).timestamp(),
        })
    }

    #[test]
    fn test_verify_roundtrip() {
        let payload = claims_expiring_in(Duration::hours(1));
        let token = sign(&payload, SECRET, Algorithm::HS256);

        let claims = TokenVerifier::new(SECRET).verify(&token).unwrap();
        assert_eq!(serde_json::to_value(&claims).unwrap(), payload);
        assert_eq!(claims.subject(), Some("employee-42"));
        assert_eq!(claims.expires_at(), payload["exp"].as_i64());
    }

    #[test]
    fn test_expired_token() {
        let token = sign(
            &claims_expiring_in(Duration::hours(-1)),
            SECRET,
            Algorithm::HS256,
        );

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert_eq!(err, GateError::ExpiredCredential);
    }

    #[test]
    fn test_token_expiring_this_second_is_expired() {
        let now = Utc::now().timestamp();
        let token = sign(&json!({"sub": "x", "exp": now}), SECRET, Algorithm::HS256);

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert_eq!(err, GateError::ExpiredCredential);
    }

    #[test]
    fn test_token_expiring_next_second_is_accepted() {
        let exp = Utc::now().timestamp() + 2;
        let token = sign(&json!({"sub": "x", "exp": exp}), SECRET, Algorithm::HS256);

        let claims = TokenVerifier::new(SECRET).verify(&token).unwrap();
        assert_eq!(claims.expires_at(), Some(exp));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = sign(
            &claims_expiring_in(Duration::hours(1)),
            "some-other-secret",
            Algorithm::HS256,
        );

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::MalformedOrInvalidCredential(_)));
    }

    #[test]
    fn test_expired_with_wrong_secret_is_invalid_not_expired() {
        let token = sign(
            &claims_expiring_in(Duration::hours(-1)),
            "some-other-secret",
            Algorithm::HS256,
        );

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::MalformedOrInvalidCredential(_)));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let token = sign(
            &claims_expiring_in(Duration::hours(1)),
            SECRET,
            Algorithm::HS512,
        );

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::MalformedOrInvalidCredential(_)));
    }

    #[test]
    fn test_missing_exp_rejected() {
        let token = sign(&json!({"sub": "employee-42"}), SECRET, Algorithm::HS256);

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::MalformedOrInvalidCredential(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        for token in ["", "not-a-token", "a.b.c", "eyJhbGciOiJub25lIn0.e30."] {
            let err = verifier.verify(token).unwrap_err();
            assert!(
                matches!(err, GateError::MalformedOrInvalidCredential(_)),
                "token {token:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_classify_unexpected() {
        let err = classify(ErrorKind::InvalidKeyFormat.into());
        assert!(matches!(err, GateError::UnexpectedVerificationError(_)));
    }
}
