use std::path::PathBuf;
use std::sync::Arc;

use services::{PostService, UserService};

use crate::metrics::Metrics;

/// HTTP-level settings the handlers and router need.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Where multipart uploads are written before the cover pipeline runs
    pub uploads_dir: PathBuf,
    /// Served read-only under `/images/covers`
    pub covers_dir: PathBuf,
    /// Prefix for cover URLs in responses
    pub public_url: String,
    pub max_upload_bytes: usize,
    /// Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl HttpSettings {
    pub fn cover_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), filename)
    }
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub users: Arc<UserService>,
    pub metrics: Arc<Metrics>,
    pub http: Arc<HttpSettings>,
}
