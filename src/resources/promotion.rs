//! `apptrust_application_version_promotion`: promote a version to a
//! lifecycle stage.

use async_trait::async_trait;
use serde_json::Value;

use super::action::{base_schema, promotion_body, promotion_schema, ActionSpec};
use super::Resource;
use crate::client::ApiClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const PROMOTION: ActionSpec = ActionSpec {
    verb: "promote",
    endpoint: "promote",
    identifying: &["application_key", "version", "target_stage"],
    import_format: "Import ID must be application_key:version:target_stage (e.g. my-app:1.0.0:QA)",
    body: promotion_body,
    stored: &[
        "promotion_type",
        "included_repository_keys",
        "excluded_repository_keys",
        "promotion_authorization_type",
    ],
};

/// The `apptrust_application_version_promotion` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromotionResource;

impl PromotionResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "apptrust_application_version_promotion";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn Resource> {
        Box::new(Self)
    }
}

#[async_trait]
impl Resource for PromotionResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let schema = base_schema(
            "Promotes an application version to a target lifecycle stage.",
            "application_key:version:target_stage",
            "The application version to promote.",
        )
        .with_attribute(
            "target_stage",
            Attribute::required_string()
                .with_force_new()
                .with_description("Target lifecycle stage (e.g. QA, PROD)."),
        );
        promotion_schema(schema)
    }

    async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        PROMOTION.create(client, plan).await
    }

    async fn read(&self, _client: &ApiClient, state: &Value) -> Result<Option<Value>, ProviderError> {
        PROMOTION.restate(state).map(Some)
    }

    async fn update(
        &self,
        _client: &ApiClient,
        _prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError> {
        PROMOTION.restate(plan)
    }

    async fn delete(&self, _client: &ApiClient, _state: &Value) -> Result<(), ProviderError> {
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        PROMOTION.import(id)
    }
}
