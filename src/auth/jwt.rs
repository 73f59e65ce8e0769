//! JWT token issuance, verification and refresh
//!
//! Tokens are stateless HS256 JWTs carrying `sub` (identity id), `iat` and
//! `exp`. A token is valid iff its signature verifies against the process
//! secret and `now < exp`. Expiry is the only invalidation mechanism.

use crate::{config::AppConfig, error::AppError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The single signing algorithm; anything else is rejected on verify
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Fixed validity window of every issued token, in seconds
pub const TOKEN_VALIDITY_SECS: i64 = 24 * 60 * 60;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

/// Why a presented token was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token cannot be parsed")]
    MalformedToken,

    #[error("token signature or algorithm rejected")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token has no subject")]
    MissingSubject,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Every rejection collapses into the same unauthenticated outcome
impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(msg) => AppError::Internal(msg),
            other => {
                tracing::debug!(reason = %other, "Token rejected");
                AppError::Unauthorized
            }
        }
    }
}

/// Freshly issued token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.signing_secret(config.environment)?;
        Ok(Self::from_secret(secret.expose_secret().as_bytes()))
    }

    /// Create JWT service from raw key material
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Expiry is checked against the caller's clock, not the library's
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a token for `subject` valid until `now + 24h`.
    ///
    /// Timestamps carry whole seconds; `now` is truncated before use.
    pub fn issue(&self, subject: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let issued_at = now.timestamp();
        let expires_at = issued_at + TOKEN_VALIDITY_SECS;

        let claims = Claims {
            sub: Some(subject.to_string()),
            iat: issued_at,
            exp: expires_at,
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("Failed to encode token: {:?}", e);
                TokenError::Signing(e.to_string())
            })?;

        let expires_at = DateTime::from_timestamp(expires_at, 0)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate signature, algorithm, structure and expiry; return the subject.
    ///
    /// `exp` is whole seconds after the truncated issue time, so a token
    /// issued at a sub-second `t0` expires up to 1s before `t0 + 24h`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let claims = self.decode_claims(token)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        let subject = claims.sub.ok_or(TokenError::MissingSubject)?;
        Uuid::parse_str(&subject).map_err(|_| TokenError::MissingSubject)
    }

    /// Re-issue a token for the same subject with a fresh window from `now`.
    /// Only a currently valid token can be refreshed.
    pub fn refresh(&self, token: &str, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let subject = self.verify(token, now)?;
        self.issue(subject, now)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ if names_foreign_algorithm(token) => TokenError::BadSignature,
                _ => TokenError::MalformedToken,
            })
    }
}

/// True when the header parses as a JSON object naming an `alg` other than
/// HS256, including names `jsonwebtoken` cannot represent such as `none`.
fn names_foreign_algorithm(token: &str) -> bool {
    let Some(segment) = token.split('.').next() else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment) else {
        return false;
    };
    let Ok(serde_json::Value::Object(header)) = serde_json::from_slice(&bytes) else {
        return false;
    };

    matches!(
        header.get("alg").and_then(serde_json::Value::as_str),
        Some(alg) if alg != "HS256"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn validity() -> Duration {
        Duration::seconds(TOKEN_VALIDITY_SECS)
    }

    const SECRET: &[u8] = b"test_secret_key_32_characters_long!";

    fn service() -> JwtService {
        JwtService::from_secret(SECRET)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let service = service();
        let user_id = Uuid::new_v4();

        let issued = service.issue(user_id, t0()).unwrap();
        assert_eq!(issued.expires_at, t0() + validity());

        let subject = service.verify(&issued.token, t0()).unwrap();
        assert_eq!(subject, user_id);
    }

    #[test]
    fn test_validity_window_boundary() {
        let service = service();
        let user_id = Uuid::new_v4();
        let issued = service.issue(user_id, t0()).unwrap();

        let last_valid = t0() + validity() - Duration::seconds(1);
        assert_eq!(service.verify(&issued.token, last_valid), Ok(user_id));

        let expiry = t0() + validity();
        assert_eq!(service.verify(&issued.token, expiry), Err(TokenError::Expired));
    }

    #[test]
    fn test_issue_is_deterministic_for_same_inputs() {
        let service = service();
        let user_id = Uuid::new_v4();

        let a = service.issue(user_id, t0()).unwrap();
        let b = service.issue(user_id, t0()).unwrap();
        assert_eq!(a.token, b.token);
    }

    #[test]
    fn test_foreign_secret_is_bad_signature() {
        let other = JwtService::from_secret(b"another_secret_key_32_characters_!!");
        let issued = other.issue(Uuid::new_v4(), t0()).unwrap();

        assert_eq!(
            service().verify(&issued.token, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_foreign_algorithm_is_bad_signature() {
        let claims = Claims {
            sub: Some(Uuid::new_v4().to_string()),
            iat: t0().timestamp(),
            exp: (t0() + validity()).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service().verify(&token, t0()), Err(TokenError::BadSignature));

        // Algorithms the library cannot even name are still a signing mismatch
        for header in [r#"{"alg":"none"}"#, r#"{"alg":"RS256","typ":"JWT"}"#, r#"{"alg":"XX999"}"#] {
            let token = hand_built(header, &claims, "");
            assert_eq!(
                service().verify(&token, t0()),
                Err(TokenError::BadSignature),
                "header {header}"
            );
        }
    }

    #[test]
    fn test_unreadable_header_is_malformed() {
        let claims = Claims {
            sub: Some(Uuid::new_v4().to_string()),
            iat: t0().timestamp(),
            exp: (t0() + validity()).timestamp(),
        };

        for header in ["not json", r#"["alg","none"]"#, r#"{"typ":"JWT"}"#] {
            let token = hand_built(header, &claims, "sig");
            assert_eq!(
                service().verify(&token, t0()),
                Err(TokenError::MalformedToken),
                "header {header}"
            );
        }
    }

    fn hand_built(header: &str, claims: &Claims, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap()),
            signature
        )
    }

    #[test]
    fn test_sub_second_issue_expires_on_the_truncated_second() {
        let service = service();
        let user_id = Uuid::new_v4();
        let issued_at = t0() + Duration::milliseconds(500);
        let issued = service.issue(user_id, issued_at).unwrap();

        assert_eq!(issued.expires_at, t0() + validity());

        let just_before_truncated_expiry = t0() + validity() - Duration::milliseconds(1);
        assert_eq!(
            service.verify(&issued.token, just_before_truncated_expiry),
            Ok(user_id)
        );

        // Still short of issued_at + 24h, but past the whole-second expiry
        let within_tolerance = issued_at + validity() - Duration::milliseconds(100);
        assert_eq!(
            service.verify(&issued.token, within_tolerance),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_missing_subject() {
        let claims = Claims {
            sub: None,
            iat: t0().timestamp(),
            exp: (t0() + validity()).timestamp(),
        };
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service().verify(&token, t0()), Err(TokenError::MissingSubject));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = service();
        assert_eq!(service.verify("garbage", t0()), Err(TokenError::MalformedToken));
        assert_eq!(service.verify("", t0()), Err(TokenError::MalformedToken));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let mut token = service.issue(Uuid::new_v4(), t0()).unwrap().token;

        let last_char = token.pop().unwrap();
        token.push(if last_char == 'a' { 'b' } else { 'a' });

        assert!(service.verify(&token, t0()).is_err());
    }

    #[test]
    fn test_refresh_extends_window() {
        let service = service();
        let user_id = Uuid::new_v4();
        let original = service.issue(user_id, t0()).unwrap();

        let later = t0() + Duration::hours(1);
        let refreshed = service.refresh(&original.token, later).unwrap();

        assert!(refreshed.expires_at > original.expires_at);
        assert_eq!(service.verify(&refreshed.token, later), Ok(user_id));
    }

    #[test]
    fn test_refresh_after_expiry_fails() {
        let service = service();
        let original = service.issue(Uuid::new_v4(), t0()).unwrap();

        let too_late = t0() + validity();
        assert!(matches!(
            service.refresh(&original.token, too_late),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_rejections_collapse_to_unauthorized() {
        for e in [
            TokenError::MalformedToken,
            TokenError::BadSignature,
            TokenError::Expired,
            TokenError::MissingSubject,
        ] {
            assert!(matches!(AppError::from(e), AppError::Unauthorized));
        }
    }
}
