use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    /// Outbound timeout for the link metadata fetch.
    pub meta_fetch_timeout: Duration,
    pub meta_user_agent: String,
    /// Secret signing session tokens. Overridden in any real deployment.
    pub session_secret: String,
    pub session_ttl: Duration,
    pub database_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            meta_fetch_timeout: Duration::from_secs(5),
            meta_user_agent: "Mozilla/5.0 (compatible; folio/1.0)".to_string(),
            session_secret: "insecure-dev-secret".to_string(),
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            database_path: "folio.sqlite".to_string(),
        }
    }
}
