// SPDX-License-Identifier: MIT

//! Credential issuance, validation, and revocation (spec.md §4.8, C8).

pub mod credentials;
pub mod registry;
pub mod service;
pub mod token;

pub use credentials::CredentialTable;
pub use registry::RevocationRegistry;
pub use service::{AccessClaims, AuthConfig, AuthService, CredentialPair, DEFAULT_ACCESS_TTL_MS, DEFAULT_REFRESH_TTL_MS, DEFAULT_SKEW_MS};
pub use token::{Claims, TokenKind, TokenSigner};
