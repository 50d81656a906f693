//! `apptrust_application_package_bindings` data source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{query_from, to_value, with_computed, DataSource};
use crate::client::{expand_path, ApiClient};
use crate::error::ProviderError;
use crate::resources::bound_package::PACKAGES_PATH;
use crate::resources::required_str;
use crate::schema::{Attribute, AttributeType, Schema};

const FILTERS: [(&str, &str); 4] = [
    ("name", "name"),
    ("type", "type"),
    ("offset", "offset"),
    ("limit", "limit"),
];

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct BoundPackage {
    name: String,
    #[serde(rename = "type")]
    package_type: String,
    num_versions: i64,
    latest_version: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct Pagination {
    offset: i64,
    limit: i64,
    total_items: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackagesPage {
    packages: Vec<BoundPackage>,
    pagination: Option<Pagination>,
}

/// Lists the packages bound to an application.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageBindingsDataSource;

impl PackageBindingsDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "apptrust_application_package_bindings";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for PackageBindingsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let package = AttributeType::object([
            ("name", AttributeType::String),
            ("type", AttributeType::String),
            ("num_versions", AttributeType::Int64),
            ("latest_version", AttributeType::String),
        ]);
        let pagination = AttributeType::object([
            ("offset", AttributeType::Int64),
            ("limit", AttributeType::Int64),
            ("total_items", AttributeType::Int64),
        ]);
        Schema::v0()
            .with_description("Returns the packages bound to an AppTrust application.")
            .with_attribute("application_key", Attribute::required_string())
            .with_attribute("name", Attribute::optional_string().with_description("Filter by package name."))
            .with_attribute("type", Attribute::optional_string().with_description("Filter by package type."))
            .with_attribute("offset", Attribute::optional_int64())
            .with_attribute("limit", Attribute::optional_int64())
            .with_attribute("packages", Attribute::computed(AttributeType::list(package)))
            .with_attribute("pagination", Attribute::computed(pagination))
    }

    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError> {
        let key = required_str(config, "application_key")?;
        info!(application_key = key, "listing package bindings");

        let response = client
            .get(
                &expand_path(PACKAGES_PATH, &[("application_key", key)]),
                &query_from(config, &FILTERS),
            )
            .await?;
        if response.is_not_found() {
            return Ok(with_computed(
                config,
                [("packages", Value::Null), ("pagination", Value::Null)],
            ));
        }
        let page: PackagesPage = response.ensure_success("read", "package bindings")?.json()?;

        // older servers omit pagination
        let pagination = page.pagination.unwrap_or(Pagination {
            offset: 0,
            limit: 0,
            total_items: page.packages.len() as i64,
        });

        Ok(with_computed(
            config,
            [
                ("packages", to_value(&page.packages)?),
                ("pagination", to_value(&pagination)?),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_client;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_read_with_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apptrust/api/v1/applications/app/packages"))
            .and(query_param("type", "docker"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "packages": [{"name": "web", "type": "docker", "num_versions": 2, "latest_version": "1.1"}],
                "pagination": {"offset": 0, "limit": 25, "total_items": 1}
            })))
            .mount(&server)
            .await;

        let out = PackageBindingsDataSource
            .read(
                &test_client(&server.uri()),
                &json!({"application_key": "app", "type": "docker"}),
            )
            .await
            .unwrap();
        assert_eq!(
            out["packages"],
            json!([{"name": "web", "type": "docker", "num_versions": 2, "latest_version": "1.1"}])
        );
        assert_eq!(out["pagination"], json!({"offset": 0, "limit": 25, "total_items": 1}));
    }

    #[tokio::test]
    async fn test_missing_pagination_counts_packages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "packages": [{"name": "a", "type": "npm"}, {"name": "b", "type": "npm"}]
            })))
            .mount(&server)
            .await;

        let out = PackageBindingsDataSource
            .read(&test_client(&server.uri()), &json!({"application_key": "app"}))
            .await
            .unwrap();
        assert_eq!(out["pagination"], json!({"offset": 0, "limit": 0, "total_items": 2}));
    }

    #[tokio::test]
    async fn test_unknown_application() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let out = PackageBindingsDataSource
            .read(&test_client(&server.uri()), &json!({"application_key": "app"}))
            .await
            .unwrap();
        assert_eq!(out["packages"], Value::Null);
        assert_eq!(out["pagination"], Value::Null);
    }
}
