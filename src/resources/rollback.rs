//! `apptrust_application_version_rollback`: undo the latest promotion of a
//! version out of a stage.

use async_trait::async_trait;
use serde_json::Value;

use super::action::{base_schema, ActionSpec};
use super::{object, required_str, Resource};
use crate::client::ApiClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const ROLLBACK: ActionSpec = ActionSpec {
    verb: "rollback",
    endpoint: "rollback",
    identifying: &["application_key", "version", "from_stage"],
    import_format: "Import ID must be application_key:version:from_stage",
    body: rollback_body,
    stored: &[],
};

fn rollback_body(plan: &Value) -> Result<Value, ProviderError> {
    let stage = required_str(plan, "from_stage")?;
    Ok(object([("from_stage", Value::String(stage.to_string()))]))
}

/// The `apptrust_application_version_rollback` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct RollbackResource;

impl RollbackResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "apptrust_application_version_rollback";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn Resource> {
        Box::new(Self)
    }
}

#[async_trait]
impl Resource for RollbackResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        base_schema(
            "Rolls back the latest promotion of an application version.",
            "application_key:version:from_stage",
            "The application version to roll back.",
        )
        .with_attribute(
            "from_stage",
            Attribute::required_string()
                .with_force_new()
                .with_description("Stage from which to roll back (e.g. qa, PROD)."),
        )
    }

    async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        ROLLBACK.create(client, plan).await
    }

    async fn read(&self, _client: &ApiClient, state: &Value) -> Result<Option<Value>, ProviderError> {
        ROLLBACK.restate(state).map(Some)
    }

    async fn update(
        &self,
        _client: &ApiClient,
        _prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError> {
        ROLLBACK.restate(plan)
    }

    async fn delete(&self, _client: &ApiClient, _state: &Value) -> Result<(), ProviderError> {
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        ROLLBACK.import(id)
    }
}
