//! Server configuration (env-driven, defaults suit local development)

#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub environment: String,

    /// Base URLs of the collaborator services; unset means in-memory stand-ins
    pub catalog_url: Option<String>,
    pub identity_url: Option<String>,
    pub media_url: Option<String>,
    /// Bounded timeout for every collaborator call
    pub collaborator_timeout_ms: u64,

    pub log_level: Option<String>,
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/bazaar".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            catalog_url: std::env::var("CATALOG_URL").ok(),
            identity_url: std::env::var("IDENTITY_URL").ok(),
            media_url: std::env::var("MEDIA_URL").ok(),
            collaborator_timeout_ms: std::env::var("COLLABORATOR_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            log_level: std::env::var("LOG_LEVEL").ok(),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
