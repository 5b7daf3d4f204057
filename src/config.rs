use dotenv::dotenv;
use std::env;

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub enrichment_timeout_secs: u64,
    /// Attempts per ledger mutation before a version conflict is surfaced
    pub ledger_retry_limit: u32,
    pub allowed_origins: Vec<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_api_url", &self.gemini_api_url)
            .field("enrichment_timeout_secs", &self.enrichment_timeout_secs)
            .field("ledger_retry_limit", &self.ledger_retry_limit)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            log_level: "info".to_string(),
            jwt_secret: "secret".to_string(),
            gemini_api_key: None,
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            enrichment_timeout_secs: 60,
            ledger_retry_limit: 3,
            allowed_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Config::default();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(defaults.port),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret), // Use a secure secret in production
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            gemini_api_url: env::var("GEMINI_API_URL").unwrap_or(defaults.gemini_api_url),
            enrichment_timeout_secs: env::var("ENRICHMENT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enrichment_timeout_secs),
            ledger_retry_limit: env::var("LEDGER_RETRY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.ledger_retry_limit),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(defaults.allowed_origins),
        }
    }
}

/// Accepts a comma list or a JSON array of origins.
fn parse_origins(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list;
        }
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
