pub mod endpoints;
mod error;
mod macros;
pub mod repositories;

pub use crate::error::{DirectoryApiError, ErrorDetail};
use repositories::*;
use tower_api_client::header::{HeaderMap, HeaderValue};
use tower_api_client::{Client as ApiClient, Request as ApiRequest};

/// Client for the directory's PostgREST surface (`<backend>/rest/v1`)
pub struct Client {
    inner: ApiClient,
}

impl Client {
    /// Anonymous client. The project key goes out as `apikey` on every
    /// request and doubles as the bearer token until `bearer_auth` is set.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, DirectoryApiError> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| DirectoryApiError::Config("anon_key is not a valid header value".into()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);

        // Endpoints carry their own leading slash
        let base_url = base_url.trim_end_matches('/');
        Ok(Self {
            inner: ApiClient::new(base_url)
                .default_headers(headers)
                .bearer_auth(api_key),
        })
    }

    /// Act as a signed-in user instead of the anonymous role
    pub fn bearer_auth(self, access_token: &str) -> Self {
        Self {
            inner: self.inner.bearer_auth(access_token),
        }
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, DirectoryApiError>
    where
        R: ApiRequest,
    {
        self.inner.send(request).await.map_err(|e| {
            tracing::debug!("Directory request failed: {}", e);
            From::from(e)
        })
    }
}

pub struct Request;

impl Request {
    pub fn services() -> ServiceRepository {
        ServiceRepository::new()
    }
}
