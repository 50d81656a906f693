//! `apptrust_application` data source: look one application up by key.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::info;

use super::{with_computed, DataSource};
use crate::client::{expand_path, ApiClient, Query};
use crate::error::ProviderError;
use crate::resources::application::UNSPECIFIED;
use crate::resources::required_str;
use crate::schema::{Attribute, AttributeType, Schema};

const APPLICATION_PATH: &str = "apptrust/api/v1/applications/{application_key}";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApplicationModel {
    application_name: String,
    project_key: String,
    description: String,
    maturity_level: String,
    criticality: String,
    labels: BTreeMap<String, String>,
    user_owners: Vec<String>,
    group_owners: Vec<String>,
}

impl ApplicationModel {
    /// Empty values, and the unset sentinel of enumerated attributes, read
    /// as null.
    fn into_attributes(self) -> Vec<(&'static str, Value)> {
        let text = |s: String| if s.is_empty() { Value::Null } else { Value::String(s) };
        let level = |s: String| {
            if s.is_empty() || s == UNSPECIFIED {
                Value::Null
            } else {
                Value::String(s)
            }
        };
        let list = |v: Vec<String>| {
            if v.is_empty() {
                Value::Null
            } else {
                Value::Array(v.into_iter().map(Value::String).collect())
            }
        };
        let labels = if self.labels.is_empty() {
            Value::Null
        } else {
            Value::Object(
                self.labels
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect::<Map<_, _>>(),
            )
        };

        vec![
            ("application_name", Value::String(self.application_name)),
            ("project_key", Value::String(self.project_key)),
            ("description", text(self.description)),
            ("maturity_level", level(self.maturity_level)),
            ("criticality", level(self.criticality)),
            ("labels", labels),
            ("user_owners", list(self.user_owners)),
            ("group_owners", list(self.group_owners)),
        ]
    }
}

/// Looks up a single application.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationDataSource;

impl ApplicationDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "apptrust_application";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for ApplicationDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Returns the details of an AppTrust application.")
            .with_attribute(
                "application_key",
                Attribute::required_string().with_description("The application key."),
            )
            .with_attribute("application_name", Attribute::computed_string())
            .with_attribute("project_key", Attribute::computed_string())
            .with_attribute("description", Attribute::computed_string())
            .with_attribute(
                "maturity_level",
                Attribute::computed_string().with_description("Null when unspecified."),
            )
            .with_attribute(
                "criticality",
                Attribute::computed_string().with_description("Null when unspecified."),
            )
            .with_attribute(
                "labels",
                Attribute::computed(AttributeType::map(AttributeType::String)),
            )
            .with_attribute(
                "user_owners",
                Attribute::computed(AttributeType::list(AttributeType::String)),
            )
            .with_attribute(
                "group_owners",
                Attribute::computed(AttributeType::list(AttributeType::String)),
            )
    }

    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError> {
        let key = required_str(config, "application_key")?;
        info!(application_key = key, "reading application data source");

        let response = client
            .get(&expand_path(APPLICATION_PATH, &[("application_key", key)]), &Query::new())
            .await?;
        if response.is_not_found() {
            return Err(ProviderError::NotFound(format!(
                "Application Not Found: Application with key '{}' was not found.",
                key
            )));
        }
        let model: ApplicationModel = response.ensure_success("read", "application")?.json()?;

        Ok(with_computed(config, model.into_attributes()))
    }
}
