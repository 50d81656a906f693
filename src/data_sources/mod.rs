//! Read-only AppTrust data sources.
//!
//! A data source takes its configuration (filters, keys, paging) and returns
//! that same object with the computed attributes filled in. Unlike resource
//! reads there is no prior state, so how a 404 is handled is decided per
//! data source: some report an error, others an empty result.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::{ApiClient, Query};
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

pub mod application;
pub mod application_versions;
pub mod applications;
pub mod bound_package_versions;
pub mod package_bindings;
pub mod version_promotions;
pub mod version_status;

pub use application::ApplicationDataSource;
pub use application_versions::ApplicationVersionsDataSource;
pub use applications::ApplicationsDataSource;
pub use bound_package_versions::BoundPackageVersionsDataSource;
pub use package_bindings::PackageBindingsDataSource;
pub use version_promotions::VersionPromotionsDataSource;
pub use version_status::VersionStatusDataSource;

/// A read-only view onto the API.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name, e.g. `apptrust_applications`.
    fn type_name(&self) -> &'static str;

    /// Schema of the configuration and the computed result.
    fn schema(&self) -> Schema;

    /// Validate configuration. The default checks it against [`DataSource::schema`].
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Fetch and return `config` with the computed attributes set.
    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError>;
}

/// Copy `config` and overlay `computed` on it.
pub(crate) fn with_computed<'a>(
    config: &Value,
    computed: impl IntoIterator<Item = (&'a str, Value)>,
) -> Value {
    let mut out = config.as_object().cloned().unwrap_or_else(Map::new);
    for (name, value) in computed {
        out.insert(name.to_string(), value);
    }
    Value::Object(out)
}

/// Build a query from scalar configuration attributes, as `(parameter,
/// attribute)` pairs. Null and missing attributes are skipped.
pub(crate) fn query_from(config: &Value, params: &[(&str, &str)]) -> Query {
    let mut query = Query::new();
    for (param, attr) in params {
        query.push_opt(param, config.get(*attr).and_then(scalar_string));
    }
    query
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Serialize a response model into the value stored in the result.
pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(value)?)
}
