//! Managed AppTrust resources.
//!
//! Each resource implements [`Resource`]. State flows in and out as JSON
//! objects shaped like the resource's [`Schema`].

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

mod action;
pub mod application;
pub mod application_version;
pub mod bound_package;
pub mod promotion;
pub mod release;
pub mod rollback;

pub use application::ApplicationResource;
pub use application_version::ApplicationVersionResource;
pub use bound_package::BoundPackageResource;
pub use promotion::PromotionResource;
pub use release::ReleaseResource;
pub use rollback::RollbackResource;

/// A resource type with a full lifecycle.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name, e.g. `apptrust_application`.
    fn type_name(&self) -> &'static str;

    /// Schema of the resource's configuration and state.
    fn schema(&self) -> Schema;

    /// Validate configuration. The default checks it against [`Resource::schema`].
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Create the remote object and return its state.
    async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError>;

    /// Refresh state. `Ok(None)` means the object is gone.
    async fn read(&self, client: &ApiClient, state: &Value) -> Result<Option<Value>, ProviderError>;

    /// Apply `plan` on top of `prior`.
    async fn update(
        &self,
        client: &ApiClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object. Deleting something already gone succeeds.
    async fn delete(&self, client: &ApiClient, state: &Value) -> Result<(), ProviderError>;

    /// Turn an import identifier into a minimal state for a subsequent read.
    fn import(&self, id: &str) -> Result<Value, ProviderError>;
}

/// A required, non-empty string attribute.
pub(crate) fn required_str<'a>(state: &'a Value, name: &str) -> Result<&'a str, ProviderError> {
    state
        .get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProviderError::Validation(format!("Missing required attribute '{}'", name)))
}

/// An optional string attribute; empty strings count as unset.
pub(crate) fn optional_str<'a>(state: &'a Value, name: &str) -> Option<&'a str> {
    state
        .get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
}

/// Build an object from `(name, value)` pairs.
pub(crate) fn object<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<Map<String, Value>>(),
    )
}
