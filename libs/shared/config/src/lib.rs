use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_CACHE_STALE_SECONDS: u64 = 300;
const DEFAULT_DASHBOARD_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub supabase_jwt_secret: String,
    pub cache_stale_seconds: u64,
    pub dashboard_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("API_URL")
                .unwrap_or_else(|_| {
                    warn!("API_URL not set, using default");
                    DEFAULT_API_URL.to_string()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            cache_stale_seconds: parse_or_default("CACHE_STALE_SECONDS", DEFAULT_CACHE_STALE_SECONDS),
            dashboard_port: parse_or_default("DASHBOARD_PORT", DEFAULT_DASHBOARD_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Config pointing at a given backend, with defaults for everything else.
    pub fn with_backend(api_base_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            supabase_jwt_secret: jwt_secret.into(),
            cache_stale_seconds: DEFAULT_CACHE_STALE_SECONDS,
            dashboard_port: DEFAULT_DASHBOARD_PORT,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty() && !self.supabase_jwt_secret.is_empty()
    }

    pub fn cache_stale_after(&self) -> Duration {
        Duration::from_secs(self.cache_stale_seconds)
    }
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
