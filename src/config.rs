//! Provider configuration and its environment fallbacks.
//!
//! The provider block is deserialized into [`ProviderConfig`]. Anything it
//! leaves out is filled from the environment by [`ProviderConfig::resolve`],
//! which takes the environment as a lookup function so it can be exercised
//! without touching process state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment variables consulted for the server URL, in order.
pub const URL_ENV_VARS: [&str; 2] = ["JFROG_URL", "ARTIFACTORY_URL"];

/// Environment variables consulted for the access token, in order.
pub const ACCESS_TOKEN_ENV_VARS: [&str; 2] = ["JFROG_ACCESS_TOKEN", "ARTIFACTORY_ACCESS_TOKEN"];

/// Set to `true` to disable TLS certificate verification.
pub const BYPASS_TLS_ENV_VAR: &str = "JFROG_BYPASS_TLS_VERIFICATION";

/// The provider configuration block as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the JFrog Platform.
    #[serde(default)]
    pub url: Option<String>,
    /// Access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Deprecated API key, used only when no access token is available.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// How requests are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent as `Authorization: Bearer <token>`.
    AccessToken(String),
    /// Sent as `X-JFrog-Art-Api: <key>`.
    ApiKey(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

/// A fully resolved configuration, ready to build an [`crate::client::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Base URL without a trailing slash.
    pub url: String,
    /// Request credentials.
    pub credentials: Credentials,
    /// Skip TLS certificate verification.
    pub bypass_tls_verification: bool,
}

impl ProviderConfig {
    /// Deserialize the provider block. `null` is treated as an empty block.
    pub fn from_value(value: &Value) -> Result<Self, ProviderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Diagnostics that do not depend on the environment: URL scheme and the
    /// api_key deprecation.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if let Some(url) = non_empty(self.url.as_deref()) {
            if !is_http_url(url) {
                diagnostics.push(
                    Diagnostic::error("Invalid URL")
                        .with_detail(format!("'{}' must start with http:// or https://", url))
                        .with_attribute("url"),
                );
            }
        }
        if non_empty(self.api_key.as_deref()).is_some() {
            diagnostics.push(
                Diagnostic::warning("Deprecated attribute 'api_key'")
                    .with_detail("API Keys are deprecated. Please use access_token instead.")
                    .with_attribute("api_key"),
            );
        }
        diagnostics
    }

    /// Merge the block with the environment.
    ///
    /// Explicit attributes take precedence over environment variables, and an
    /// access token takes precedence over an API key.
    pub fn resolve(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ResolvedConfig, Vec<Diagnostic>> {
        let url = non_empty(self.url.as_deref())
            .map(str::to_string)
            .or_else(|| first_env(&lookup, &URL_ENV_VARS));
        let Some(url) = url else {
            return Err(vec![Diagnostic::error("Missing URL Configuration").with_detail(
                "While configuring the provider, the url was not found in the \
                 JFROG_URL/ARTIFACTORY_URL environment variable or provider \
                 configuration block url attribute.",
            )]);
        };
        if !is_http_url(&url) {
            return Err(vec![Diagnostic::error("Invalid URL")
                .with_detail(format!("'{}' must start with http:// or https://", url))
                .with_attribute("url")]);
        }

        let access_token = non_empty(self.access_token.as_deref())
            .map(str::to_string)
            .or_else(|| first_env(&lookup, &ACCESS_TOKEN_ENV_VARS));
        let credentials = match (access_token, non_empty(self.api_key.as_deref())) {
            (Some(token), _) => Credentials::AccessToken(token),
            (None, Some(key)) => Credentials::ApiKey(key.to_string()),
            (None, None) => {
                return Err(vec![Diagnostic::error("Missing JFrog API key or Access Token")
                    .with_detail(
                        "While configuring the provider, the API key or Access Token was not \
                         found in the environment variables or provider configuration attributes.",
                    )])
            },
        };

        let bypass_tls_verification = lookup(BYPASS_TLS_ENV_VAR)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(ResolvedConfig {
            url: url.trim_end_matches('/').to_string(),
            credentials,
            bypass_tls_verification,
        })
    }

    /// Resolve against the process environment.
    pub fn resolve_from_env(&self) -> Result<ResolvedConfig, Vec<Diagnostic>> {
        self.resolve(|name| std::env::var(name).ok())
    }
}

/// Schema of the provider configuration block.
pub fn provider_schema() -> Schema {
    Schema::v0()
        .with_description("Configuration for the JFrog AppTrust provider.")
        .with_attribute(
            "url",
            Attribute::optional_string().with_description(
                "JFrog Platform URL. Falls back to JFROG_URL, then ARTIFACTORY_URL.",
            ),
        )
        .with_attribute(
            "access_token",
            Attribute::optional_string()
                .sensitive()
                .with_description(
                    "Access token. Falls back to JFROG_ACCESS_TOKEN, then ARTIFACTORY_ACCESS_TOKEN.",
                ),
        )
        .with_attribute(
            "api_key",
            Attribute::optional_string()
                .sensitive()
                .with_description("Deprecated API key, ignored when an access token is set."),
        )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn first_env(lookup: &impl Fn(&str) -> Option<String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_value() {
        let config = ProviderConfig::from_value(&json!({
            "url": "https://acme.jfrog.io",
            "access_token": "tok"
        }))
        .unwrap();
        assert_eq!(config.url.as_deref(), Some("https://acme.jfrog.io"));
        assert_eq!(config.api_key, None);

        assert_eq!(ProviderConfig::from_value(&Value::Null).unwrap(), ProviderConfig::default());
        assert!(ProviderConfig::from_value(&json!({"url": 5})).is_err());
    }

    #[test]
    fn test_env_fallback_order() {
        let config = ProviderConfig::default();
        let resolved = config
            .resolve(env(&[
                ("ARTIFACTORY_URL", "https://second.example"),
                ("JFROG_URL", ""),
                ("ARTIFACTORY_ACCESS_TOKEN", "t2"),
            ]))
            .unwrap();
        assert_eq!(resolved.url, "https://second.example");
        assert_eq!(resolved.credentials, Credentials::AccessToken("t2".to_string()));
        assert!(!resolved.bypass_tls_verification);
    }

    #[test]
    fn test_explicit_config_wins() {
        let config = ProviderConfig {
            url: Some("https://explicit.example/".to_string()),
            access_token: Some("mine".to_string()),
            api_key: None,
        };
        let resolved = config
            .resolve(env(&[("JFROG_URL", "https://env.example"), ("JFROG_ACCESS_TOKEN", "env")]))
            .unwrap();
        assert_eq!(resolved.url, "https://explicit.example");
        assert_eq!(resolved.credentials, Credentials::AccessToken("mine".to_string()));
    }

    #[test]
    fn test_api_key_used_without_token() {
        let config = ProviderConfig {
            url: Some("https://acme.jfrog.io".to_string()),
            access_token: None,
            api_key: Some("key".to_string()),
        };
        let resolved = config.resolve(env(&[])).unwrap();
        assert_eq!(resolved.credentials, Credentials::ApiKey("key".to_string()));

        let diags = config.validate();
        assert_eq!(diags.len(), 1);
        assert!(!diags[0].is_error());
    }

    #[test]
    fn test_missing_url() {
        let diags = ProviderConfig::default()
            .resolve(env(&[("JFROG_ACCESS_TOKEN", "t")]))
            .unwrap_err();
        assert_eq!(diags[0].summary, "Missing URL Configuration");
    }

    #[test]
    fn test_missing_credentials() {
        let diags = ProviderConfig::default()
            .resolve(env(&[("JFROG_URL", "https://acme.jfrog.io")]))
            .unwrap_err();
        assert_eq!(diags[0].summary, "Missing JFrog API key or Access Token");
    }

    #[test]
    fn test_invalid_url_scheme() {
        let config = ProviderConfig {
            url: Some("ftp://acme".to_string()),
            ..Default::default()
        };
        assert!(config.validate()[0].is_error());
        let diags = config.resolve(env(&[("JFROG_ACCESS_TOKEN", "t")])).unwrap_err();
        assert_eq!(diags[0].summary, "Invalid URL");
    }

    #[test]
    fn test_bypass_tls() {
        let resolved = ProviderConfig::default()
            .resolve(env(&[
                ("JFROG_URL", "https://acme.jfrog.io"),
                ("JFROG_ACCESS_TOKEN", "t"),
                ("JFROG_BYPASS_TLS_VERIFICATION", "TRUE"),
            ]))
            .unwrap();
        assert!(resolved.bypass_tls_verification);
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let rendered = format!("{:?}", Credentials::AccessToken("secret".to_string()));
        assert!(!rendered.contains("secret"));
    }
}
