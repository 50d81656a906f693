//! [`AppTrustProvider`]: the [`ProviderService`] implementation.
//!
//! The provider starts unconfigured. `configure` resolves the provider block
//! against the environment and builds the shared [`ApiClient`]; every remote
//! operation before that fails with [`ProviderError::Configuration`].

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::ApiClient;
use crate::config::{provider_schema, ProviderConfig};
use crate::error::ProviderError;
use crate::registry::Registry;
use crate::schema::{has_errors, summarize_errors, Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::ImportedResource;
use crate::validation;

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// The JFrog AppTrust provider.
pub struct AppTrustProvider {
    registry: Registry,
    env: EnvLookup,
    client: RwLock<Option<ApiClient>>,
}

impl Default for AppTrustProvider {
    fn default() -> Self {
        Self::new(Registry::apptrust())
    }
}

impl AppTrustProvider {
    /// A provider over `registry` that reads the process environment.
    pub fn new(registry: Registry) -> Self {
        Self::with_env(registry, |name| std::env::var(name).ok())
    }

    /// A provider that resolves environment variables through `lookup`.
    pub fn with_env(
        registry: Registry,
        lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            env: Arc::new(lookup),
            client: RwLock::new(None),
        }
    }

    /// Whether `configure` has succeeded.
    pub async fn is_configured(&self) -> bool {
        self.client.read().await.is_some()
    }

    async fn client(&self) -> Result<ApiClient, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration(
                "The provider has not been configured. Call configure first.".to_string(),
            )
        })
    }
}

fn ensure_no_errors(diagnostics: &[Diagnostic]) -> Result<(), ProviderError> {
    match summarize_errors(diagnostics) {
        Some(message) => Err(ProviderError::Validation(message)),
        None => Ok(()),
    }
}

#[async_trait::async_trait]
impl ProviderService for AppTrustProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(provider_schema());
        for name in self.registry.resource_types() {
            if let Ok(resource) = self.registry.resource(name) {
                schema = schema.with_resource(name, resource.schema());
            }
        }
        for name in self.registry.data_source_types() {
            if let Ok(data_source) = self.registry.data_source(name) {
                schema = schema.with_data_source(name, data_source.schema());
            }
        }
        schema
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&provider_schema(), &config);
        if !has_errors(&diagnostics) {
            diagnostics.extend(ProviderConfig::from_value(&config)?.validate());
        }
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = self.validate_provider_config(config.clone()).await?;
        if has_errors(&diagnostics) {
            return Ok(diagnostics);
        }

        let resolved = match ProviderConfig::from_value(&config)?.resolve(|name| (self.env)(name)) {
            Ok(resolved) => resolved,
            Err(errors) => {
                warn!("provider configuration incomplete");
                diagnostics.extend(errors);
                return Ok(diagnostics);
            },
        };

        let client = ApiClient::new(&resolved)?;
        info!(url = %resolved.url, "provider configured");
        *self.client.write().await = Some(client);
        Ok(diagnostics)
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.registry.resource(resource_type)?.validate(&config))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        ensure_no_errors(&resource.validate(&planned_state))?;
        let client = self.client().await?;
        resource.create(&client, &planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        let client = self.client().await?;
        let state = resource.read(&client, &current_state).await?;
        if state.is_none() {
            debug!("resource no longer exists");
        }
        Ok(state)
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        ensure_no_errors(&resource.validate(&planned_state))?;
        let client = self.client().await?;
        resource.update(&client, &prior_state, &planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.registry.resource(resource_type)?;
        let client = self.client().await?;
        resource.delete(&client, &current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let state = self.registry.resource(resource_type)?.import(id)?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.registry.data_source(data_source_type)?.validate(&config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.registry.data_source(data_source_type)?;
        ensure_no_errors(&data_source.validate(&config))?;
        let client = self.client().await?;
        data_source.read(&client, &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_without_env() -> AppTrustProvider {
        AppTrustProvider::with_env(Registry::apptrust(), |_| None)
    }

    #[test]
    fn test_schema_lists_every_type() {
        let provider = provider_without_env();
        let metadata = provider.metadata();
        assert_eq!(metadata.resources.len(), 6);
        assert_eq!(metadata.data_sources.len(), 7);
        assert!(provider.schema().provider.attributes.contains_key("access_token"));
    }

    #[tokio::test]
    async fn test_operations_require_configuration() {
        let provider = provider_without_env();
        let err = provider
            .read("apptrust_application", json!({"id": "web"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_missing_url() {
        let provider = provider_without_env();
        let diagnostics = provider.configure(json!({"access_token": "t"})).await.unwrap();
        assert!(has_errors(&diagnostics));
        assert_eq!(diagnostics[0].summary, "Missing URL Configuration");
        assert!(!provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_configure_from_env() {
        let provider = AppTrustProvider::with_env(Registry::apptrust(), |name| match name {
            "JFROG_URL" => Some("https://acme.jfrog.io/".to_string()),
            "JFROG_ACCESS_TOKEN" => Some("token".to_string()),
            _ => None,
        });
        let diagnostics = provider.configure(Value::Null).await.unwrap();
        assert!(diagnostics.is_empty());
        assert!(provider.is_configured().await);
    }

    #[tokio::test]
    async fn test_invalid_plan_is_rejected_before_any_request() {
        let provider = AppTrustProvider::with_env(Registry::apptrust(), |_| None);
        provider
            .configure(json!({"url": "http://127.0.0.1:9", "access_token": "t"}))
            .await
            .unwrap();
        let err = provider
            .create(
                "apptrust_application",
                json!({"application_key": "Bad Key", "application_name": "x", "project_key": "p"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(ref m) if m.contains("Invalid application_key")));
    }

    #[tokio::test]
    async fn test_unknown_types() {
        let provider = provider_without_env();
        assert!(matches!(
            provider.import_resource("apptrust_project", "p").await,
            Err(ProviderError::UnknownResource(_))
        ));
        assert!(matches!(
            provider.validate_data_source_config("apptrust_project", json!({})).await,
            Err(ProviderError::UnknownResource(_))
        ));
    }

    #[tokio::test]
    async fn test_import_wraps_state() {
        let imported = provider_without_env()
            .import_resource("apptrust_application_version", "web:1.2.3")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].state["version"], json!("1.2.3"));
    }
}
