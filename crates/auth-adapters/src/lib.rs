//! # auth-adapters
//!
//! Credential hashing (Argon2id) and bearer tokens (HS256 JWT, feature
//! `auth-jwt`) behind the `CredentialHasher` and `TokenIssuer` ports.

pub mod argon;

#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use argon::Argon2Hasher;

#[cfg(feature = "auth-jwt")]
pub use jwt::JwtIssuer;
