//! HTTP backend client
//!
//! Talks to the purchase order backend over its JSON API. Every response is
//! wrapped in the backend's envelope:
//!
//! ```json
//! { "success": true, "data": { ... }, "pagination": { "page": 1, "limit": 10, "total": 42, "totalPages": 5 } }
//! ```
//!
//! Failed requests carry `{"success": false, "error": "..."}`. The session is
//! cookie based; call [`ApiStore::login`] before anything else.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    DUPLICATE_ORDER_NUMBER, Page, RemoteStore, StoreError, StoreResult,
};
use crate::config::ApiSection;
use crate::models::{CompanyProfile, PurchaseOrder, PurchaseOrderDraft};

/// Response envelope used by every backend endpoint
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    #[allow(dead_code)]
    page: u32,
    #[allow(dead_code)]
    limit: u32,
    #[allow(dead_code)]
    total: u64,
    total_pages: u32,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ServerPdfRequest<'a> {
    company: &'a CompanyProfile,
}

/// Remote store backed by the HTTP API
pub struct ApiStore {
    client: Client,
    base_url: String,
}

impl ApiStore {
    /// Create a client for the API at `base_url` (e.g. `http://localhost:4000/api`)
    pub fn new(base_url: impl Into<String>) -> StoreResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a client from the `[api]` configuration section
    pub fn from_config(config: &ApiSection) -> StoreResult<Self> {
        Self::with_timeout(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transient(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a cookie session
    pub async fn login(&self, username: &str, password: &str) -> StoreResult<()> {
        let request = self
            .request(Method::POST, "/auth/login")
            .json(&Credentials { username, password });
        let _: ApiResponse<serde_json::Value> = send(request).await?;
        info!("Logged in as {}", username);
        Ok(())
    }

    /// End the cookie session
    pub async fn logout(&self) -> StoreResult<()> {
        let _: ApiResponse<serde_json::Value> =
            send(self.request(Method::POST, "/auth/logout")).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn order_path(id: &str) -> String {
        format!("/purchase-orders/{}", urlencoding::encode(id))
    }
}

/// Send a request and decode the envelope, mapping failures onto [`StoreError`]
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> StoreResult<ApiResponse<T>> {
    let response = request.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    let envelope: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();

    if !status.is_success() {
        let message = envelope
            .as_ref()
            .and_then(|e| e.error.clone().or_else(|| e.message.clone()))
            .unwrap_or_else(|| status.to_string());
        return Err(status_error(status, message));
    }

    let envelope = envelope.ok_or_else(|| {
        StoreError::SerializationError(format!("Unexpected response body from backend ({})", status))
    })?;

    if !envelope.success {
        let message = envelope
            .error
            .clone()
            .unwrap_or_else(|| "request failed".to_string());
        return Err(status_error(StatusCode::BAD_REQUEST, message));
    }

    Ok(envelope)
}

fn require_data<T>(envelope: ApiResponse<T>, what: &str) -> StoreResult<T> {
    envelope
        .data
        .ok_or_else(|| StoreError::SerializationError(format!("Response carried no {}", what)))
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::SerializationError(err.to_string())
    } else {
        StoreError::Transient(err.to_string())
    }
}

fn status_error(status: StatusCode, message: String) -> StoreError {
    if message == DUPLICATE_ORDER_NUMBER || status == StatusCode::CONFLICT {
        return StoreError::Conflict(message);
    }
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::Transient(message)
        }
        s if s.is_server_error() => StoreError::Transient(message),
        _ => StoreError::Rejected(message),
    }
}

#[async_trait(?Send)]
impl RemoteStore for ApiStore {
    async fn list(&self, search_term: &str, page: u32, page_size: u32) -> StoreResult<Page> {
        let request = self
            .request(Method::GET, "/purchase-orders")
            .query(&[
                ("q", search_term.to_string()),
                ("page", page.to_string()),
                ("limit", page_size.to_string()),
            ]);
        let envelope: ApiResponse<Vec<PurchaseOrder>> = send(request).await?;

        let total_pages = envelope
            .pagination
            .as_ref()
            .map(|p| p.total_pages)
            .unwrap_or(1)
            .max(1);
        let records = envelope.data.unwrap_or_default();
        debug!(
            "Fetched {} orders for '{}' page {}/{}",
            records.len(),
            search_term,
            page,
            total_pages
        );

        Ok(Page {
            records,
            total_pages,
        })
    }

    async fn get(&self, id: &str) -> StoreResult<PurchaseOrder> {
        let envelope = send(self.request(Method::GET, &Self::order_path(id))).await?;
        require_data(envelope, "purchase order")
    }

    async fn create(&self, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder> {
        let request = self.request(Method::POST, "/purchase-orders").json(draft);
        require_data(send(request).await?, "purchase order")
    }

    async fn update(&self, id: &str, draft: &PurchaseOrderDraft) -> StoreResult<PurchaseOrder> {
        let request = self.request(Method::PUT, &Self::order_path(id)).json(draft);
        require_data(send(request).await?, "purchase order")
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let _: ApiResponse<serde_json::Value> =
            send(self.request(Method::DELETE, &Self::order_path(id))).await?;
        Ok(())
    }

    async fn company_profile(&self) -> StoreResult<Option<CompanyProfile>> {
        match send::<CompanyProfile>(self.request(Method::GET, "/company")).await {
            Ok(envelope) => Ok(envelope.data),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save_company_profile(&self, profile: &CompanyProfile) -> StoreResult<CompanyProfile> {
        let request = self.request(Method::POST, "/company").json(profile);
        let envelope: ApiResponse<CompanyProfile> = send(request).await?;
        Ok(envelope.data.unwrap_or_else(|| profile.clone()))
    }

    async fn render_server_pdf(
        &self,
        id: &str,
        profile: Option<&CompanyProfile>,
    ) -> StoreResult<Vec<u8>> {
        let path = format!("{}/pdf", Self::order_path(id));
        let request = match profile {
            Some(company) => self
                .request(Method::POST, &path)
                .json(&ServerPdfRequest { company }),
            None => self.request(Method::GET, &path),
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            warn!("Server PDF for {} failed with {}", id, status);
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Could not read error body for server PDF {}: {}", id, e);
                    String::new()
                }
            };
            return Err(status_error(status, failure_message(status, &body)));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

/// Backend error text from a failed response body, else the status line
fn failure_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_else(|| status.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "gone".into()),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, DUPLICATE_ORDER_NUMBER.into()),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "dup".into()),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "down".into()),
            StoreError::Transient(_)
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "login".into()),
            StoreError::Rejected(_)
        ));
    }

    #[test]
    fn test_failure_message() {
        assert_eq!(
            failure_message(
                StatusCode::NOT_FOUND,
                r#"{"success": false, "error": "Purchase order not found"}"#
            ),
            "Purchase order not found"
        );
        assert_eq!(
            failure_message(StatusCode::BAD_GATEWAY, ""),
            StatusCode::BAD_GATEWAY.to_string()
        );
    }

    #[test]
    fn test_envelope_decoding() {
        let body = r#"{
            "success": true,
            "data": [],
            "pagination": { "page": 2, "limit": 10, "total": 11, "totalPages": 2 }
        }"#;
        let envelope: ApiResponse<Vec<PurchaseOrder>> = serde_json::from_str(body).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.pagination.unwrap().total_pages, 2);
    }

    #[test]
    fn test_order_path_is_encoded() {
        assert_eq!(ApiStore::order_path("a/b"), "/purchase-orders/a%2Fb");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let store = ApiStore::new("http://localhost:4000/api/").unwrap();
        assert_eq!(store.base_url(), "http://localhost:4000/api");
    }
}
