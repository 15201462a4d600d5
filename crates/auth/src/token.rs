// SPDX-License-Identifier: MIT

//! Signed credential tokens (spec.md §4.8, §3 "Credential pair").
//!
//! A token is `base64url(claims json) "." base64url(hmac-sha256(claims_b64))` —
//! opaque to the client, self-contained for the server. No external JWT
//! crate is pulled in since the claim set is small and fixed; the signing
//! primitive mirrors the teacher's existing `sha2`-based digest use,
//! generalized with `hmac` for a keyed MAC.

use base64::Engine;
use hearth_core::{Error, Result};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Which side of the credential pair a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub subject: String,
    pub kind: TokenKind,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
    /// Present on refresh tokens only — the key the revocation registry
    /// tracks as live or revoked. Access tokens are never individually
    /// revocable (spec.md §4.8: only the refresh side is tracked).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Signs and verifies tokens with a shared secret.
///
/// The secret is process-local config, never persisted or logged; rotating
/// it invalidates every outstanding token, which is acceptable for a
/// homelab-scale deployment (spec.md Non-goals: no distributed token store).
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn sign(&self, claims: &Claims) -> String {
        let body = serde_json::to_vec(claims).unwrap_or_default();
        let body_b64 = B64.encode(&body);
        let signature = self.mac(body_b64.as_bytes());
        format!("{body_b64}.{signature}")
    }

    /// Verifies signature and expiry (with `skew_ms` tolerance), returning
    /// the embedded claims. `kind` restricts acceptance to that token side
    /// so an access token cannot be replayed as a refresh token or vice versa.
    pub fn verify(&self, token: &str, kind: TokenKind, now_ms: u64, skew_ms: u64) -> Result<Claims> {
        let (body_b64, signature) =
            token.split_once('.').ok_or_else(|| Error::InvalidToken("malformed token".into()))?;

        let expected = self.mac(body_b64.as_bytes());
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(Error::InvalidToken("signature mismatch".into()));
        }

        let body = B64
            .decode(body_b64)
            .map_err(|_| Error::InvalidToken("malformed claims encoding".into()))?;
        let claims: Claims =
            serde_json::from_slice(&body).map_err(|_| Error::InvalidToken("malformed claims".into()))?;

        if claims.kind != kind {
            return Err(Error::InvalidToken("wrong token kind".into()));
        }
        if now_ms > claims.expires_at_ms.saturating_add(skew_ms) {
            return Err(Error::TokenExpired);
        }

        Ok(claims)
    }

    fn mac(&self, data: &[u8]) -> String {
        // HMAC accepts any key length; construction only fails for invalid
        // key material, which a byte slice never is.
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
        };
        mac.update(data);
        B64.encode(mac.finalize().into_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(kind: TokenKind, now_ms: u64, ttl_ms: u64, jti: Option<&str>) -> Claims {
        Claims {
            subject: "alice".into(),
            kind,
            issued_at_ms: now_ms,
            expires_at_ms: now_ms + ttl_ms,
            jti: jti.map(str::to_string),
        }
    }

    #[test]
    fn signed_token_round_trips() {
        let signer = TokenSigner::new("secret-key");
        let c = claims(TokenKind::Access, 1_000, 60_000, None);
        let token = signer.sign(&c);
        let verified = signer.verify(&token, TokenKind::Access, 1_500, 0).unwrap();
        assert_eq!(verified.subject, "alice");
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new("secret-key");
        let c = claims(TokenKind::Access, 1_000, 1_000, None);
        let token = signer.sign(&c);
        let err = signer.verify(&token, TokenKind::Access, 10_000, 0).unwrap_err();
        assert!(matches!(err, Error::TokenExpired));
    }

    #[test]
    fn clock_skew_allowance_admits_a_recently_expired_token() {
        let signer = TokenSigner::new("secret-key");
        let c = claims(TokenKind::Access, 1_000, 1_000, None);
        let token = signer.sign(&c);
        assert!(signer.verify(&token, TokenKind::Access, 2_100, 5_000).is_ok());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = TokenSigner::new("secret-key");
        let c = claims(TokenKind::Access, 1_000, 60_000, None);
        let mut token = signer.sign(&c);
        token.push('x');
        let err = signer.verify(&token, TokenKind::Access, 1_500, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let signer = TokenSigner::new("secret-key");
        let c = claims(TokenKind::Refresh, 1_000, 60_000, Some("refresh-1"));
        let token = signer.sign(&c);
        let err = signer.verify(&token, TokenKind::Access, 1_500, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[test]
    fn different_secret_is_rejected() {
        let signer_a = TokenSigner::new("secret-a");
        let signer_b = TokenSigner::new("secret-b");
        let c = claims(TokenKind::Access, 1_000, 60_000, None);
        let token = signer_a.sign(&c);
        let err = signer_b.verify(&token, TokenKind::Access, 1_500, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
    }
}
