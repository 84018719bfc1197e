use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::ApiResponse;

use crate::error::BackendError;

/// REST client for the scheduling backend. Every response is unwrapped from the
/// `{ success, message, data, timestamp }` envelope.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| BackendError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<String, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);

            // Prefer the envelope's message when the backend sent one.
            let message = serde_json::from_str::<ApiResponse<Value>>(&text)
                .map(|envelope| envelope.message)
                .ok()
                .filter(|message| !message.is_empty())
                .unwrap_or(text);

            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }

    /// Sends a request and returns the envelope's `data`.
    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, BackendError>
    where T: DeserializeOwned {
        let text = self.send(method, path, auth_token, body).await?;

        let envelope: ApiResponse<T> = serde_json::from_str(&text)?;
        if !envelope.success {
            error!("Backend rejected request to {}: {}", path, envelope.message);
            return Err(BackendError::Rejected(envelope.message));
        }

        envelope.data.ok_or(BackendError::MissingData)
    }

    /// Sends a request whose envelope carries no meaningful `data`.
    pub async fn request_empty(&self, method: Method, path: &str,
                               auth_token: Option<&str>, body: Option<Value>)
                               -> Result<(), BackendError> {
        let text = self.send(method, path, auth_token, body).await?;

        if text.trim().is_empty() {
            return Ok(());
        }

        let envelope: ApiResponse<Value> = serde_json::from_str(&text)?;
        if !envelope.success {
            error!("Backend rejected request to {}: {}", path, envelope.message);
            return Err(BackendError::Rejected(envelope.message));
        }

        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// `path?key=value` with the value percent-encoded.
pub fn with_query(path: &str, key: &str, value: &str) -> String {
    format!("{}?{}={}", path, key, urlencoding::encode(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_query_values() {
        assert_eq!(
            with_query("/api/availability", "professionalId", "a b&c"),
            "/api/availability?professionalId=a%20b%26c"
        );
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let config = AppConfig::with_backend("http://localhost:3000/", "secret");
        let client = BackendClient::new(&config);
        assert_eq!(client.get_base_url(), "http://localhost:3000");
    }
}
