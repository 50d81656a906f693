//! HTTP access to the AppTrust REST API.
//!
//! [`ApiClient`] sends one JSON request per call and hands back the raw
//! [`ApiResponse`]. It does not interpret status codes: callers decide which
//! codes mean success and which failures (typically 404) are recoverable.

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::{Credentials, ResolvedConfig};
use crate::error::ProviderError;

/// Root of every application-scoped endpoint.
pub const APPLICATIONS_PATH: &str = "apptrust/api/v1/applications";

const API_KEY_HEADER: &str = "X-JFrog-Art-Api";

/// Ordered query parameters. Keys may repeat (`owner=a&owner=b`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    /// An empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a parameter if a value is present.
    pub fn push_opt(&mut self, key: &str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Builder-style [`Query::push`].
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    /// The parameters in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// Whether no parameters were added.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is 404.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        if self.body.is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Map the response onto [`ProviderError`].
    pub fn into_error(self, operation: &str, resource_kind: &str) -> ProviderError {
        ProviderError::from_response(self.status, &self.body, operation, resource_kind)
    }

    /// Pass 2xx responses through and turn everything else into an error.
    pub fn ensure_success(self, operation: &str, resource_kind: &str) -> Result<Self, ProviderError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error(operation, resource_kind))
        }
    }
}

/// Substitute `{name}` placeholders in `template` with percent-encoded values.
///
/// ```
/// use apptrust_provider::client::expand_path;
///
/// let path = expand_path(
///     "apptrust/api/v1/applications/{key}/packages/{name}",
///     &[("key", "app-1"), ("name", "@scope/pkg")],
/// );
/// assert_eq!(path, "apptrust/api/v1/applications/app-1/packages/%40scope%2Fpkg");
/// ```
pub fn expand_path(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |path, (name, value)| {
        path.replace(&format!("{{{}}}", name), &urlencoding::encode(value))
    })
}

/// An authenticated client bound to one JFrog Platform URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    /// Build a client from a resolved configuration.
    pub fn new(config: &ResolvedConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .user_agent(concat!("apptrust-provider/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.bypass_tls_verification)
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path`.
    pub async fn get(&self, path: &str, query: &Query) -> Result<ApiResponse, ProviderError> {
        self.send(Method::GET, path, query, None).await
    }

    /// POST a JSON body to `path`.
    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, ProviderError> {
        self.send(Method::POST, path, &Query::new(), Some(body)).await
    }

    /// PATCH a JSON body to `path`.
    pub async fn patch(
        &self,
        path: &str,
        query: &Query,
        body: &Value,
    ) -> Result<ApiResponse, ProviderError> {
        self.send(Method::PATCH, path, query, Some(body)).await
    }

    /// DELETE `path`.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ProviderError> {
        self.send(Method::DELETE, path, &Query::new(), None).await
    }

    /// Send a request and collect the response.
    ///
    /// Only transport failures are errors; every status code is returned as
    /// an [`ApiResponse`].
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<ApiResponse, ProviderError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, %url, params = query.pairs().len(), "sending request");

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request = match &self.credentials {
            Credentials::AccessToken(token) => request.bearer_auth(token),
            Credentials::ApiKey(key) => request.header(API_KEY_HEADER, key),
        };

        let response = request.send().await.map_err(|e| {
            error!(%method, %url, error = %e, "request failed");
            e
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(%method, %url, status, "received response");

        Ok(ApiResponse { status, body })
    }
}
