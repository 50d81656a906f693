//! Lookup of resources and data sources by type name.

use std::collections::BTreeMap;

use crate::data_sources::{
    ApplicationDataSource, ApplicationVersionsDataSource, ApplicationsDataSource,
    BoundPackageVersionsDataSource, DataSource, PackageBindingsDataSource,
    VersionPromotionsDataSource, VersionStatusDataSource,
};
use crate::error::ProviderError;
use crate::resources::{
    ApplicationResource, ApplicationVersionResource, BoundPackageResource, PromotionResource,
    ReleaseResource, RollbackResource, Resource,
};

/// Builds a resource handler.
pub type ResourceFactory = fn() -> Box<dyn Resource>;

/// Builds a data source handler.
pub type DataSourceFactory = fn() -> Box<dyn DataSource>;

/// Type names mapped to handler constructors.
#[derive(Default, Clone)]
pub struct Registry {
    resources: BTreeMap<&'static str, ResourceFactory>,
    data_sources: BTreeMap<&'static str, DataSourceFactory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every AppTrust resource and data source.
    pub fn apptrust() -> Self {
        Self::new()
            .with_resource(ApplicationResource::TYPE_NAME, ApplicationResource::boxed)
            .with_resource(ApplicationVersionResource::TYPE_NAME, ApplicationVersionResource::boxed)
            .with_resource(BoundPackageResource::TYPE_NAME, BoundPackageResource::boxed)
            .with_resource(PromotionResource::TYPE_NAME, PromotionResource::boxed)
            .with_resource(ReleaseResource::TYPE_NAME, ReleaseResource::boxed)
            .with_resource(RollbackResource::TYPE_NAME, RollbackResource::boxed)
            .with_data_source(ApplicationDataSource::TYPE_NAME, ApplicationDataSource::boxed)
            .with_data_source(ApplicationsDataSource::TYPE_NAME, ApplicationsDataSource::boxed)
            .with_data_source(
                ApplicationVersionsDataSource::TYPE_NAME,
                ApplicationVersionsDataSource::boxed,
            )
            .with_data_source(VersionStatusDataSource::TYPE_NAME, VersionStatusDataSource::boxed)
            .with_data_source(
                VersionPromotionsDataSource::TYPE_NAME,
                VersionPromotionsDataSource::boxed,
            )
            .with_data_source(PackageBindingsDataSource::TYPE_NAME, PackageBindingsDataSource::boxed)
            .with_data_source(
                BoundPackageVersionsDataSource::TYPE_NAME,
                BoundPackageVersionsDataSource::boxed,
            )
    }

    /// Register a resource. A later registration under the same name wins.
    pub fn with_resource(mut self, type_name: &'static str, factory: ResourceFactory) -> Self {
        self.resources.insert(type_name, factory);
        self
    }

    /// Register a data source. A later registration under the same name wins.
    pub fn with_data_source(mut self, type_name: &'static str, factory: DataSourceFactory) -> Self {
        self.data_sources.insert(type_name, factory);
        self
    }

    /// Build the handler for `type_name`.
    pub fn resource(&self, type_name: &str) -> Result<Box<dyn Resource>, ProviderError> {
        self.resources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// Build the data source handler for `type_name`.
    pub fn data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| ProviderError::UnknownResource(format!("data source {}", type_name)))
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apptrust_registry() {
        let registry = Registry::apptrust();
        assert_eq!(registry.resource_types().count(), 6);
        assert_eq!(registry.data_source_types().count(), 7);

        // the same name is used for a resource and a data source
        assert!(registry.resource("apptrust_application").is_ok());
        assert!(registry.data_source("apptrust_application").is_ok());
    }

    #[test]
    fn test_handlers_report_their_name() {
        let registry = Registry::apptrust();
        for name in registry.resource_types() {
            assert_eq!(registry.resource(name).unwrap().type_name(), name);
        }
        for name in registry.data_source_types() {
            assert_eq!(registry.data_source(name).unwrap().type_name(), name);
        }
    }

    #[test]
    fn test_unknown_type() {
        let err = Registry::apptrust().resource("apptrust_project").err().unwrap();
        assert!(matches!(err, ProviderError::UnknownResource(ref name) if name == "apptrust_project"));
    }
}
