// libs/auth-cell/src/session.rs
use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Method;
use tokio::sync::RwLock;
use tracing::debug;

use shared_backend::{BackendClient, BackendError};
use shared_config::AppConfig;
use shared_models::auth::UserProfile;

struct CachedProfile {
    profile: UserProfile,
    fetched_at: Instant,
}

/// Resolves dashboard profiles. The backend profile endpoint is the only
/// source of a user's role; token claims are used for identity alone.
pub struct SessionService {
    backend: BackendClient,
    stale_after: Duration,
    profiles: RwLock<HashMap<String, CachedProfile>>,
}

impl SessionService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_backend(BackendClient::new(config), config.cache_stale_after())
    }

    pub fn with_backend(backend: BackendClient, stale_after: Duration) -> Self {
        Self {
            backend,
            stale_after,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Profile for `user_id`, served from cache while fresh.
    pub async fn profile(&self, user_id: &str, auth_token: &str) -> Result<UserProfile, BackendError> {
        {
            let profiles = self.profiles.read().await;
            if let Some(cached) = profiles.get(user_id) {
                if cached.fetched_at.elapsed() < self.stale_after {
                    return Ok(cached.profile.clone());
                }
            }
        }

        debug!("Fetching profile for user: {}", user_id);
        let path = format!("/api/users/{}", urlencoding::encode(user_id));
        let profile: UserProfile = self.backend.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        self.profiles.write().await.insert(user_id.to_string(), CachedProfile {
            profile: profile.clone(),
            fetched_at: Instant::now(),
        });

        Ok(profile)
    }

    pub async fn invalidate(&self, user_id: &str) {
        self.profiles.write().await.remove(user_id);
    }
}
