use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use tokio::sync::RwLock;
use tracing::{debug, info};

use shared_backend::{BackendClient, BackendError};
use shared_config::AppConfig;

use crate::models::Professional;

struct CachedDirectory {
    professionals: Arc<Vec<Professional>>,
    fetched_at: Instant,
}

/// Cached list of bookable professionals.
pub struct ProfessionalDirectory {
    backend: BackendClient,
    stale_after: Duration,
    cache: RwLock<Option<CachedDirectory>>,
}

impl ProfessionalDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_backend(BackendClient::new(config), config.cache_stale_after())
    }

    pub fn with_backend(backend: BackendClient, stale_after: Duration) -> Self {
        Self {
            backend,
            stale_after,
            cache: RwLock::new(None),
        }
    }

    /// All professionals, served from cache while fresh.
    pub async fn list(&self, auth_token: &str) -> Result<Arc<Vec<Professional>>, BackendError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.fetched_at.elapsed() < self.stale_after {
                return Ok(Arc::clone(&cached.professionals));
            }
        }

        debug!("Fetching professionals");
        let professionals: Vec<Professional> = self.backend.request(
            Method::GET,
            "/api/users/professionals",
            Some(auth_token),
            None,
        ).await?;

        info!("Loaded {} professionals", professionals.len());
        let professionals = Arc::new(professionals);

        *self.cache.write().await = Some(CachedDirectory {
            professionals: Arc::clone(&professionals),
            fetched_at: Instant::now(),
        });

        Ok(professionals)
    }

    pub async fn get(&self, professional_id: &str, auth_token: &str) -> Result<Option<Professional>, BackendError> {
        let professionals = self.list(auth_token).await?;
        Ok(professionals.iter().find(|p| p.id == professional_id).cloned())
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}
