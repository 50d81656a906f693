//! `apptrust_application_version_release`: release a version to production.

use async_trait::async_trait;
use serde_json::Value;

use super::action::{base_schema, promotion_body, promotion_schema, ActionSpec};
use super::Resource;
use crate::client::ApiClient;
use crate::error::ProviderError;
use crate::schema::Schema;

const RELEASE: ActionSpec = ActionSpec {
    verb: "release",
    endpoint: "release",
    identifying: &["application_key", "version"],
    import_format: "Import ID must be application_key:version",
    body: promotion_body,
    stored: &[
        "promotion_type",
        "included_repository_keys",
        "excluded_repository_keys",
        "promotion_authorization_type",
    ],
};

/// The `apptrust_application_version_release` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReleaseResource;

impl ReleaseResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "apptrust_application_version_release";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn Resource> {
        Box::new(Self)
    }
}

#[async_trait]
impl Resource for ReleaseResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        promotion_schema(base_schema(
            "Releases an application version to the PROD stage.",
            "application_key:version",
            "The application version to release.",
        ))
    }

    async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        RELEASE.create(client, plan).await
    }

    async fn read(&self, _client: &ApiClient, state: &Value) -> Result<Option<Value>, ProviderError> {
        RELEASE.restate(state).map(Some)
    }

    async fn update(
        &self,
        _client: &ApiClient,
        _prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError> {
        RELEASE.restate(plan)
    }

    async fn delete(&self, _client: &ApiClient, _state: &Value) -> Result<(), ProviderError> {
        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        RELEASE.import(id)
    }
}
