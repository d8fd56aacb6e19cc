//! Admin login tokens: HS256 JWT-format strings signed with the configured secret.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256, AppError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Unauthorized(format!("token key unusable: {}", e)))
    }

    pub fn issue(&self, subject: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let header = Header {
            alg: "HS256".into(),
            typ: "JWT".into(),
        };
        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = B64.encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", signing_input, signature))
    }

    /// Check signature, algorithm and expiry. Every failure is `Unauthorized`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let invalid = || AppError::Unauthorized("invalid token".into());
        let mut parts = token.split('.');
        let (Some(h), Some(c), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };

        let signature = B64.decode(s).map_err(|_| invalid())?;
        let mut mac = self.mac()?;
        mac.update(h.as_bytes());
        mac.update(b".");
        mac.update(c.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let header: Header = decode_segment(h).ok_or_else(invalid)?;
        if header.alg != "HS256" {
            return Err(invalid());
        }
        let claims: Claims = decode_segment(c).ok_or_else(invalid)?;
        if claims.exp <= now.timestamp() {
            return Err(AppError::Unauthorized("token expired".into()));
        }
        Ok(claims)
    }

    /// Compare submitted credentials with the configured ones in constant time.
    pub fn credentials_match(&self, expected: (&str, &str), given: (&str, &str)) -> bool {
        let tag = |user: &str, pass: &str| -> Option<Vec<u8>> {
            let mut mac = self.mac().ok()?;
            mac.update(user.as_bytes());
            mac.update(&[0]);
            mac.update(pass.as_bytes());
            Some(mac.finalize().into_bytes().to_vec())
        };
        let (Some(want), Ok(mut mac)) = (tag(expected.0, expected.1), self.mac()) else {
            return false;
        };
        mac.update(given.0.as_bytes());
        mac.update(&[0]);
        mac.update(given.1.as_bytes());
        mac.verify_slice(&want).is_ok()
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AppError> {
    let bytes = serde_json::to_vec(value).map_err(|e| AppError::SaveFailed(format!("token encoding: {}", e)))?;
    Ok(B64.encode(bytes))
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Option<T> {
    let bytes = B64.decode(segment).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Token from `Authorization: Bearer <token>`, if any.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Reject requests without a valid bearer token. Installed on `/api` when auth is required.
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let signer = TokenSigner::new(&state.settings.token_secret);
    let verified = match bearer_token(request.headers()) {
        Some(token) => signer.verify(token, Utc::now()),
        None => Err(AppError::Unauthorized("authentication required".into())),
    };
    match verified {
        Ok(claims) => {
            let mut request = request;
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(path = %request.uri().path(), error = %e, "rejected unauthenticated request");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let signer = TokenSigner::new("s3cret");
        let token = signer.issue("admin", now()).unwrap();
        assert_eq!(token.split('.').count(), 3);
        let claims = signer.verify(&token, now() + Duration::hours(1)).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn expired_and_tampered_tokens_fail() {
        let signer = TokenSigner::new("s3cret");
        let token = signer.issue("admin", now()).unwrap();
        assert!(signer.verify(&token, now() + Duration::hours(25)).is_err());
        assert!(TokenSigner::new("other").verify(&token, now()).is_err());

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = B64.encode(br#"{"sub":"root","iat":0,"exp":99999999999}"#);
        parts[1] = &forged;
        assert!(signer.verify(&parts.join("."), now()).is_err());
        assert!(signer.verify("not-a-token", now()).is_err());
    }

    #[test]
    fn credentials_compare() {
        let signer = TokenSigner::new("k");
        assert!(signer.credentials_match(("admin", "pw"), ("admin", "pw")));
        assert!(!signer.credentials_match(("admin", "pw"), ("admin", "pw ")));
        assert!(!signer.credentials_match(("admin", "pw"), ("admi", "npw")));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = axum::http::HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
        headers.insert(header::AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
