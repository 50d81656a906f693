//! `apptrust_application_version_status` data source.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{with_computed, DataSource};
use crate::client::{expand_path, ApiClient, Query};
use crate::error::ProviderError;
use crate::resources::application_version::VERSION_PATH;
use crate::resources::required_str;
use crate::schema::{Attribute, Schema};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VersionStatus {
    version_release_status: String,
}

/// Reports the release status of one version.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionStatusDataSource;

impl VersionStatusDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "apptrust_application_version_status";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for VersionStatusDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Returns the release status of an application version.")
            .with_attribute("application_key", Attribute::required_string())
            .with_attribute("version", Attribute::required_string())
            .with_attribute(
                "version_release_status",
                Attribute::computed_string()
                    .with_description("Null when the version does not exist."),
            )
    }

    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError> {
        let key = required_str(config, "application_key")?;
        let version = required_str(config, "version")?;
        info!(application_key = key, version, "reading application version status");

        let path = format!(
            "{}/status",
            expand_path(VERSION_PATH, &[("application_key", key), ("version", version)])
        );
        let response = client.get(&path, &Query::new()).await?;
        let status = if response.is_not_found() {
            Value::Null
        } else {
            let status: VersionStatus = response
                .ensure_success("read", "application version status")?
                .json()?;
            Value::String(status.version_release_status)
        };

        Ok(with_computed(config, [("version_release_status", status)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_status_and_missing_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apptrust/api/v1/applications/app/versions/1.0.0/status"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"version_release_status": "trusted_release"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/apptrust/api/v1/applications/app/versions/9.9.9/status"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let out = VersionStatusDataSource
            .read(&client, &json!({"application_key": "app", "version": "1.0.0"}))
            .await
            .unwrap();
        assert_eq!(out["version_release_status"], json!("trusted_release"));

        let out = VersionStatusDataSource
            .read(&client, &json!({"application_key": "app", "version": "9.9.9"}))
            .await
            .unwrap();
        assert_eq!(out["version_release_status"], Value::Null);
    }

    #[tokio::test]
    async fn test_server_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = VersionStatusDataSource
            .read(
                &test_client(&server.uri()),
                &json!({"application_key": "app", "version": "1.0.0"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Server { status: 503, .. }));
    }
}
