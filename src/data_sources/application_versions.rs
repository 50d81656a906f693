//! `apptrust_application_versions` data source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{query_from, to_value, with_computed, DataSource};
use crate::client::{expand_path, ApiClient};
use crate::error::ProviderError;
use crate::resources::application_version::VERSIONS_PATH;
use crate::resources::required_str;
use crate::schema::{Attribute, AttributeType, Schema};

const FILTERS: [(&str, &str); 6] = [
    ("created_by", "created_by"),
    ("release_status", "release_status"),
    ("tag", "tag"),
    ("offset", "offset"),
    ("limit", "limit"),
    ("order_asc", "order_asc"),
];

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct VersionSummary {
    version: String,
    tag: String,
    status: String,
    release_status: String,
    current_stage: String,
    created_by: String,
    created: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VersionsPage {
    versions: Vec<VersionSummary>,
    total: i64,
}

/// Lists the versions of one application.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationVersionsDataSource;

impl ApplicationVersionsDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "apptrust_application_versions";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for ApplicationVersionsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let summary = AttributeType::object(
            ["version", "tag", "status", "release_status", "current_stage", "created_by", "created"]
                .map(|name| (name, AttributeType::String)),
        );
        Schema::v0()
            .with_description("Returns the versions of an AppTrust application.")
            .with_attribute("application_key", Attribute::required_string())
            .with_attribute("created_by", Attribute::optional_string())
            .with_attribute(
                "release_status",
                Attribute::optional_string()
                    .with_description("pre_release, released or trusted_release."),
            )
            .with_attribute("tag", Attribute::optional_string())
            .with_attribute("offset", Attribute::optional_int64())
            .with_attribute("limit", Attribute::optional_int64())
            .with_attribute("order_asc", Attribute::optional_bool())
            .with_attribute("versions", Attribute::computed(AttributeType::list(summary)))
            .with_attribute("total", Attribute::computed_int64())
    }

    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError> {
        let key = required_str(config, "application_key")?;
        info!(application_key = key, "listing application versions");

        let response = client
            .get(
                &expand_path(VERSIONS_PATH, &[("application_key", key)]),
                &query_from(config, &FILTERS),
            )
            .await?;
        if response.is_not_found() {
            return Ok(with_computed(
                config,
                [("versions", Value::Null), ("total", Value::from(0))],
            ));
        }
        let page: VersionsPage = response
            .ensure_success("read", "application versions")?
            .json()?;

        Ok(with_computed(
            config,
            [
                ("versions", to_value(&page.versions)?),
                ("total", Value::from(page.total)),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_read_versions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apptrust/api/v1/applications/app/versions"))
            .and(query_param("release_status", "released"))
            .and(query_param("order_asc", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "versions": [{"version": "1.0.0", "release_status": "released", "current_stage": "PROD"}],
                "total": 1,
                "limit": 25,
                "offset": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = json!({"application_key": "app", "release_status": "released", "order_asc": true});
        let out = ApplicationVersionsDataSource
            .read(&test_client(&server.uri()), &config)
            .await
            .unwrap();
        assert_eq!(out["total"], json!(1));
        assert_eq!(out["versions"][0]["version"], json!("1.0.0"));
        assert_eq!(out["versions"][0]["tag"], json!(""));
        assert_eq!(out["versions"][0]["current_stage"], json!("PROD"));
    }

    #[tokio::test]
    async fn test_unknown_application_yields_no_versions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let out = ApplicationVersionsDataSource
            .read(&test_client(&server.uri()), &json!({"application_key": "nope"}))
            .await
            .unwrap();
        assert_eq!(out, json!({"application_key": "nope", "versions": null, "total": 0}));
    }
}
