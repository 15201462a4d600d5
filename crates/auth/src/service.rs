// SPDX-License-Identifier: MIT

//! `Login`/`Validate`/`Refresh`/`Logout` (spec.md §4.8, C8).

use crate::credentials::CredentialTable;
use crate::registry::RevocationRegistry;
use crate::token::{Claims, TokenKind, TokenSigner};
use hearth_core::{Clock, Error, Result};
use std::sync::Arc;

/// Default access-credential lifetime (spec.md §4.8: "~15 min").
pub const DEFAULT_ACCESS_TTL_MS: u64 = 15 * 60 * 1000;
/// Default refresh-credential lifetime: a week, long enough for a homelab
/// session to outlive a day without forcing a fresh login.
pub const DEFAULT_REFRESH_TTL_MS: u64 = 7 * 24 * 60 * 60 * 1000;
/// Allowed clock skew on validation (spec.md §4.8 "a small allowance for
/// clock skew is permitted on validate").
pub const DEFAULT_SKEW_MS: u64 = 30_000;

/// An issued access/refresh credential pair, ready to serialize into the
/// `POST /auth/login` and `POST /auth/refresh` response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
    pub access_expires_at_ms: u64,
}

/// The subject and expiry recovered from a validated access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub subject: String,
    pub expires_at_ms: u64,
}

pub struct AuthConfig {
    pub access_ttl_ms: u64,
    pub refresh_ttl_ms: u64,
    pub skew_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_ms: DEFAULT_ACCESS_TTL_MS,
            refresh_ttl_ms: DEFAULT_REFRESH_TTL_MS,
            skew_ms: DEFAULT_SKEW_MS,
        }
    }
}

pub struct AuthService<C: Clock> {
    credentials: CredentialTable,
    signer: TokenSigner,
    registry: Arc<RevocationRegistry>,
    clock: C,
    config: AuthConfig,
}

impl<C: Clock> AuthService<C> {
    pub fn new(credentials: CredentialTable, secret: impl Into<Vec<u8>>, clock: C, config: AuthConfig) -> Self {
        Self {
            credentials,
            signer: TokenSigner::new(secret),
            registry: Arc::new(RevocationRegistry::new()),
            clock,
            config,
        }
    }

    pub fn revocation_registry(&self) -> Arc<RevocationRegistry> {
        self.registry.clone()
    }

    /// `Login(user, pass)` (spec.md §4.8). Fails `InvalidCredentials` on any
    /// mismatch — unknown user and wrong password are indistinguishable to
    /// the caller.
    pub fn login(&self, username: &str, password: &str) -> Result<CredentialPair> {
        if !self.credentials.verify(username, password) {
            return Err(Error::InvalidCredentials);
        }
        self.issue_pair(username)
    }

    /// `Validate(access)`.
    pub fn validate(&self, access_token: &str) -> Result<AccessClaims> {
        let claims = self.signer.verify(access_token, TokenKind::Access, self.clock.epoch_ms(), self.config.skew_ms)?;
        Ok(AccessClaims { subject: claims.subject, expires_at_ms: claims.expires_at_ms })
    }

    /// `Refresh(refresh)`: validates, checks liveness, revokes the used
    /// credential, and issues a fresh pair (rotation).
    pub fn refresh(&self, refresh_token: &str) -> Result<CredentialPair> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh, self.clock.epoch_ms(), self.config.skew_ms)?;
        let jti = claims.jti.as_deref().ok_or_else(|| Error::InvalidToken("refresh token missing jti".into()))?;
        if !self.registry.is_live(jti) {
            return Err(Error::TokenRevoked);
        }
        self.registry.revoke(jti);
        self.issue_pair(&claims.subject)
    }

    /// `Logout(refresh)`: revokes without issuing anything new.
    pub fn logout(&self, refresh_token: &str) -> Result<()> {
        let claims = self.signer.verify(refresh_token, TokenKind::Refresh, self.clock.epoch_ms(), self.config.skew_ms)?;
        if let Some(jti) = claims.jti.as_deref() {
            self.registry.revoke(jti);
        }
        Ok(())
    }

    fn issue_pair(&self, subject: &str) -> Result<CredentialPair> {
        let now = self.clock.epoch_ms();
        let access_expires_at_ms = now + self.config.access_ttl_ms;
        let access = self.signer.sign(&Claims {
            subject: subject.to_string(),
            kind: TokenKind::Access,
            issued_at_ms: now,
            expires_at_ms: access_expires_at_ms,
            jti: None,
        });

        let jti = nanoid::nanoid!(24);
        let refresh_expires_at_ms = now + self.config.refresh_ttl_ms;
        let refresh = self.signer.sign(&Claims {
            subject: subject.to_string(),
            kind: TokenKind::Refresh,
            issued_at_ms: now,
            expires_at_ms: refresh_expires_at_ms,
            jti: Some(jti.clone()),
        });
        self.registry.mark_live(jti, refresh_expires_at_ms);

        Ok(CredentialPair { access, refresh, access_expires_at_ms })
    }
}
