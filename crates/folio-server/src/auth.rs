use crate::AppState;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use folio_api::ApiError;
use folio_model::UserId;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    Malformed,
    BadSignature,
    Expired,
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed session token"),
            Self::BadSignature => write!(f, "session token signature mismatch"),
            Self::Expired => write!(f, "session token expired"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Stateless session tokens: `base64(user_id.expiry).base64(hmac_sha256)`.
/// Mirrors the original's JWT strategy without a session table; revocation
/// is out of scope, expiry bounds the damage of a leaked token.
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl SessionSigner {
    #[must_use]
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs,
        }
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac
    }

    #[must_use]
    pub fn issue(&self, user: UserId, now: i64) -> String {
        let payload = format!("{}.{}", user.0, now + self.ttl_secs as i64);
        let sig = self.mac(&payload).finalize().into_bytes();
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(sig)
        )
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<UserId, AuthError> {
        let (payload_b64, sig_b64) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::Malformed)?;
        let payload = String::from_utf8(payload_bytes).map_err(|_| AuthError::Malformed)?;
        let sig = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| AuthError::Malformed)?;
        self.mac(&payload)
            .verify_slice(&sig)
            .map_err(|_| AuthError::BadSignature)?;
        let (uid, expiry) = payload.split_once('.').ok_or(AuthError::Malformed)?;
        let uid = uid.parse::<i64>().map_err(|_| AuthError::Malformed)?;
        let expiry = expiry.parse::<i64>().map_err(|_| AuthError::Malformed)?;
        if expiry <= now {
            return Err(AuthError::Expired);
        }
        Ok(UserId(uid))
    }
}

pub(crate) fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// The identity gate: every mutating or owner-scoped read goes through here.
/// Public reads never call it.
pub(crate) fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<UserId, ApiError> {
    let raw = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized());
    }
    state
        .sessions
        .verify(token, unix_seconds())
        .map_err(|_| ApiError::unauthorized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        let signer = SessionSigner::new("test-secret", 3600);
        let token = signer.issue(UserId(7), 1_000);
        assert_eq!(signer.verify(&token, 1_001).expect("verify"), UserId(7));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let signer = SessionSigner::new("test-secret", 60);
        let token = signer.issue(UserId(7), 1_000);
        assert_eq!(signer.verify(&token, 1_061), Err(AuthError::Expired));
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let signer = SessionSigner::new("test-secret", 3600);
        let token = signer.issue(UserId(7), 1_000);
        let (payload, _sig) = token.split_once('.').expect("token shape");
        let forged = format!("{payload}.AAAA");
        assert_eq!(signer.verify(&forged, 1_001), Err(AuthError::BadSignature));
    }

    #[test]
    fn foreign_secret_fails_verification() {
        let signer = SessionSigner::new("test-secret", 3600);
        let other = SessionSigner::new("other-secret", 3600);
        let token = signer.issue(UserId(7), 1_000);
        assert_eq!(other.verify(&token, 1_001), Err(AuthError::BadSignature));
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        let signer = SessionSigner::new("test-secret", 3600);
        assert_eq!(signer.verify("not-a-token", 0), Err(AuthError::Malformed));
        assert_eq!(signer.verify("a.b.c", 0), Err(AuthError::Malformed));
    }
}
