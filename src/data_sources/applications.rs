//! `apptrust_applications` data source: filtered, paged application listing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{query_from, to_value, with_computed, DataSource};
use crate::client::{ApiClient, APPLICATIONS_PATH};
use crate::error::ProviderError;
use crate::resources::application::{CRITICALITY_LEVELS, MATURITY_LEVELS};
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};
use crate::validation;

/// Accepted `order_by` values.
pub const ORDER_BY_OPTIONS: [&str; 2] = ["name", "created"];

/// Single-valued filters, as `(query parameter, attribute)`. The list API
/// filters on `maturity`, not `maturity_level`.
const FILTERS: [(&str, &str); 8] = [
    ("project_key", "project_key"),
    ("name", "name"),
    ("maturity", "maturity"),
    ("criticality", "criticality"),
    ("order_by", "order_by"),
    ("order_asc", "order_asc"),
    ("offset", "offset"),
    ("limit", "limit"),
];

/// One entry of the listing. The list endpoint carries no version data, so
/// the version fields are always empty.
#[derive(Debug, Default, Deserialize, Serialize)]
struct ApplicationSummary {
    #[serde(default)]
    project_key: String,
    #[serde(default)]
    application_name: String,
    #[serde(default)]
    application_key: String,
    #[serde(default, skip_deserializing)]
    application_version_latest: String,
    #[serde(default, skip_deserializing)]
    application_version_tag: String,
    #[serde(default, skip_deserializing)]
    application_versions_count: i64,
}

/// Whether `label` is `key:value` with exactly one delimiter and both sides
/// non-empty.
fn is_valid_label(label: &str) -> bool {
    matches!(label.split_once(':'), Some((k, v)) if !k.is_empty() && !v.is_empty() && !v.contains(':'))
}

/// Lists applications.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationsDataSource;

impl ApplicationsDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "apptrust_applications";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for ApplicationsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let summary = AttributeType::object([
            ("project_key", AttributeType::String),
            ("application_name", AttributeType::String),
            ("application_key", AttributeType::String),
            ("application_version_latest", AttributeType::String),
            ("application_version_tag", AttributeType::String),
            ("application_versions_count", AttributeType::Int64),
        ]);

        Schema::v0()
            .with_description(
                "Returns a list of AppTrust applications. Supports filtering, pagination and sorting.",
            )
            .with_attribute(
                "project_key",
                Attribute::optional_string()
                    .with_description("Only applications of this project. All projects when unset."),
            )
            .with_attribute("name", Attribute::optional_string())
            .with_attribute(
                "owners",
                Attribute::optional_string_list()
                    .with_description("Owners (users or groups), each sent as an `owner` filter."),
            )
            .with_attribute("maturity", Attribute::optional_string().with_one_of(&MATURITY_LEVELS))
            .with_attribute(
                "criticality",
                Attribute::optional_string().with_one_of(&CRITICALITY_LEVELS),
            )
            .with_attribute(
                "labels",
                Attribute::optional_string_list()
                    .with_description("Label filters in the format 'key:value'."),
            )
            .with_attribute(
                "order_by",
                Attribute::optional_string().with_one_of(&ORDER_BY_OPTIONS),
            )
            .with_attribute("order_asc", Attribute::optional_bool())
            .with_attribute("offset", Attribute::optional_int64())
            .with_attribute("limit", Attribute::optional_int64())
            .with_attribute("applications", Attribute::computed(AttributeType::list(summary)))
            .with_attribute(
                "total",
                Attribute::computed_int64().with_description("Number of applications returned."),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        let strings = |name: &str| -> Vec<String> {
            config
                .get(name)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default()
        };
        if strings("owners").iter().any(String::is_empty) {
            diagnostics.push(
                Diagnostic::error("Invalid value in 'owners'")
                    .with_detail("Each owner must be at least 1 character in length")
                    .with_attribute("owners"),
            );
        }
        for label in strings("labels").iter().filter(|l| !is_valid_label(l)) {
            diagnostics.push(
                Diagnostic::error("Invalid label filter")
                    .with_detail(format!("label must be in format 'key:value', got \"{}\"", label))
                    .with_attribute("labels"),
            );
        }
        diagnostics
    }

    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError> {
        let mut query = query_from(config, &FILTERS);
        for (param, attr) in [("owner", "owners"), ("label", "labels")] {
            let values = config.get(attr).and_then(Value::as_array).into_iter().flatten();
            for value in values.filter_map(Value::as_str) {
                query.push(param, value);
            }
        }
        info!(filters = query.pairs().len(), "listing applications");

        let response = client.get(APPLICATIONS_PATH, &query).await?;
        let applications: Vec<ApplicationSummary> = if response.is_not_found() {
            Vec::new()
        } else {
            response
                .ensure_success("read", "applications")?
                .json::<Option<Vec<ApplicationSummary>>>()?
                .unwrap_or_default()
        };

        let total = applications.len();
        Ok(with_computed(
            config,
            [
                ("applications", to_value(&applications)?),
                ("total", Value::from(total)),
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

    #[test]
    fn test_label_format() {
        assert!(is_valid_label("env:prod"));
        assert!(!is_valid_label("env"));
        assert!(!is_valid_label("env:"));
        assert!(!is_valid_label("a:b:c"));
    }

    #[test]
    fn test_validate_filters() {
        let diags = ApplicationsDataSource.validate(&json!({
            "maturity": "ancient",
            "owners": ["", "bob"],
            "labels": ["env:prod", "broken"]
        }));
        let attrs: Vec<_> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(attrs, vec!["maturity", "owners", "labels"]);
    }

    #[tokio::test]
    async fn test_read_sends_repeated_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apptrust/api/v1/applications"))
            .and(query_param("project_key", "proj"))
            .and(query_param("maturity", "production"))
            .and(query_param("owner", "alice"))
            .and(query_param("owner", "devs"))
            .and(query_param("label", "env:prod"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"application_key": "a1", "application_name": "A1", "project_key": "proj", "criticality": "high"},
                {"application_key": "a2", "application_name": "A2", "project_key": "proj"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let config = json!({
            "project_key": "proj",
            "maturity": "production",
            "owners": ["alice", "devs"],
            "labels": ["env:prod"],
            "limit": 5
        });
        let out = ApplicationsDataSource
            .read(&test_client(&server.uri()), &config)
            .await
            .unwrap();
        assert_eq!(out["total"], json!(2));
        assert_eq!(
            out["applications"][0],
            json!({
                "project_key": "proj",
                "application_name": "A1",
                "application_key": "a1",
                "application_version_latest": "",
                "application_version_tag": "",
                "application_versions_count": 0
            })
        );
        assert_eq!(out["limit"], json!(5));
    }

    #[tokio::test]
    async fn test_not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let out = ApplicationsDataSource
            .read(&test_client(&server.uri()), &json!({}))
            .await
            .unwrap();
        assert_eq!(out, json!({"applications": [], "total": 0}));
    }
}
