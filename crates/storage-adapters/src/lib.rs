//! # storage-adapters
//!
//! Implementations of the persistence and media ports:
//! - `memory`: DashMap-backed repositories for development and tests
//! - `postgres`: sqlx repositories (feature `db-postgres`)
//! - `local`: covers and temp uploads on the local filesystem
//! - `transcode`: `image` decoding + lossy WebP encoding

pub mod local;
pub mod memory;
pub mod transcode;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use local::LocalMediaStorage;
pub use memory::InMemoryStore;
pub use transcode::WebpTranscoder;

#[cfg(feature = "db-postgres")]
pub use postgres::{PgPostRepository, PgUserRepository};
