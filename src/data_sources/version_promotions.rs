//! `apptrust_application_version_promotions` data source: promotion history
//! of one version.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{query_from, to_value, with_computed, DataSource};
use crate::client::{expand_path, ApiClient};
use crate::error::ProviderError;
use crate::resources::application_version::VERSION_PATH;
use crate::resources::required_str;
use crate::schema::{Attribute, AttributeType, Schema};

const FILTERS: [(&str, &str); 6] = [
    ("include", "include"),
    ("offset", "offset"),
    ("limit", "limit"),
    ("filter_by", "filter_by"),
    ("order_by", "order_by"),
    ("order_asc", "order_asc"),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PromotionMessage {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RemotePromotion {
    application_key: String,
    application_version: String,
    created: String,
    created_by: String,
    created_millis: i64,
    messages: Vec<PromotionMessage>,
    project_key: String,
    source_stage: String,
    status: String,
    target_stage: String,
}

/// A promotion record as stored in the result: messages are flattened to
/// their text.
#[derive(Debug, Serialize)]
struct Promotion {
    application_key: String,
    application_version: String,
    created: String,
    created_by: String,
    created_millis: i64,
    messages: Vec<String>,
    project_key: String,
    source_stage: String,
    status: String,
    target_stage: String,
}

impl From<RemotePromotion> for Promotion {
    fn from(remote: RemotePromotion) -> Self {
        Self {
            application_key: remote.application_key,
            application_version: remote.application_version,
            created: remote.created,
            created_by: remote.created_by,
            created_millis: remote.created_millis,
            messages: remote.messages.into_iter().map(|m| m.text).collect(),
            project_key: remote.project_key,
            source_stage: remote.source_stage,
            status: remote.status,
            target_stage: remote.target_stage,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PromotionsPage {
    promotions: Vec<RemotePromotion>,
    total: i64,
}

/// Lists the promotions of one application version.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionPromotionsDataSource;

impl VersionPromotionsDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "apptrust_application_version_promotions";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for VersionPromotionsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut fields: Vec<(&str, AttributeType)> = [
            "application_key",
            "application_version",
            "created",
            "created_by",
            "project_key",
            "source_stage",
            "status",
            "target_stage",
        ]
        .into_iter()
        .map(|name| (name, AttributeType::String))
        .collect();
        fields.push(("created_millis", AttributeType::Int64));
        fields.push(("messages", AttributeType::list(AttributeType::String)));

        Schema::v0()
            .with_description("Returns the promotion history of an application version.")
            .with_attribute("application_key", Attribute::required_string())
            .with_attribute("version", Attribute::required_string())
            .with_attribute(
                "include",
                Attribute::optional_string().with_description("Set to 'messages' to include messages."),
            )
            .with_attribute("offset", Attribute::optional_int64())
            .with_attribute("limit", Attribute::optional_int64())
            .with_attribute("filter_by", Attribute::optional_string())
            .with_attribute("order_by", Attribute::optional_string())
            .with_attribute("order_asc", Attribute::optional_bool())
            .with_attribute(
                "promotions",
                Attribute::computed(AttributeType::list(AttributeType::object(fields))),
            )
            .with_attribute("total", Attribute::computed_int64())
    }

    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError> {
        let key = required_str(config, "application_key")?;
        let version = required_str(config, "version")?;
        info!(application_key = key, version, "listing version promotions");

        let path = format!(
            "{}/promotions",
            expand_path(VERSION_PATH, &[("application_key", key), ("version", version)])
        );
        let response = client.get(&path, &query_from(config, &FILTERS)).await?;
        if response.status != 200 {
            return Err(response.into_error("read", "application version promotions"));
        }
        let page: PromotionsPage = response.json()?;
        let promotions: Vec<Promotion> = page.promotions.into_iter().map(Promotion::from).collect();

        Ok(with_computed(
            config,
            [
                ("promotions", to_value(&promotions)?),
                ("total", Value::from(page.total)),
            ],
        ))
    }
}
