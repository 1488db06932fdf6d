use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store rejected a write because a unique constraint already holds
    /// a matching row. Callers translate this into their own conflict error.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("store returned an empty result for a write")]
    EmptyWriteResult,
}

/// PostgREST client for the document store. One instance is created at
/// process start and shared by every workflow; requests authenticate with
/// the service key rather than a per-request token.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn headers(&self, extra: Option<HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.service_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key)).unwrap(),
        );

        if let Some(extra) = extra {
            headers.extend(extra);
        }

        headers
    }

    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(extra_headers));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Store error ({}): {}", status, error_text);

            // PostgREST reports duplicate-key rejections (error 23505) as 409.
            if status == StatusCode::CONFLICT {
                return Err(StoreError::UniqueViolation(error_text));
            }

            return Err(StoreError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Filtered lookup. The path carries the PostgREST filter string, e.g.
    /// `/rest/v1/users?email=eq.foo%40bar.com&limit=1`.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, None, None).await
    }

    /// Insert a single row and return the stored representation. A unique
    /// violation surfaces as [`StoreError::UniqueViolation`], which is what
    /// makes conditional inserts (insert-if-absent) possible without a
    /// separate read holding any lock.
    pub async fn insert<T>(&self, path: &str, row: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let mut rows: Vec<T> = self
            .request(Method::POST, path, Some(row), Some(headers))
            .await?;

        if rows.is_empty() {
            return Err(StoreError::EmptyWriteResult);
        }

        Ok(rows.remove(0))
    }

    /// Patch rows matching the path filter and return the updated
    /// representations.
    pub async fn update<T>(&self, path: &str, patch: Value) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request(Method::PATCH, path, Some(patch), Some(headers))
            .await
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
