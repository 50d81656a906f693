//! `apptrust_bound_package_versions` data source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{query_from, to_value, with_computed, DataSource};
use crate::client::{expand_path, ApiClient};
use crate::error::ProviderError;
use crate::resources::bound_package::PACKAGE_VERSIONS_PATH;
use crate::resources::required_str;
use crate::schema::{Attribute, AttributeType, Schema};

const FILTERS: [(&str, &str); 3] = [
    ("package_version", "package_version"),
    ("offset", "offset"),
    ("limit", "limit"),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RemoteVersion {
    version: String,
    vcs_url: String,
    vcs_branch: String,
    branch: String,
    vcs_revision: String,
    revision: String,
}

#[derive(Debug, Serialize)]
struct BoundVersion {
    version: String,
    vcs_url: String,
    vcs_branch: String,
    vcs_revision: String,
}

fn first_non_empty(preferred: String, fallback: String) -> String {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

impl From<RemoteVersion> for BoundVersion {
    fn from(remote: RemoteVersion) -> Self {
        Self {
            version: remote.version,
            vcs_url: remote.vcs_url,
            vcs_branch: first_non_empty(remote.vcs_branch, remote.branch),
            vcs_revision: first_non_empty(remote.vcs_revision, remote.revision),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VersionsPage {
    versions: Vec<RemoteVersion>,
    total: i64,
}

/// Lists the bound versions of one package.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundPackageVersionsDataSource;

impl BoundPackageVersionsDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "apptrust_bound_package_versions";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn DataSource> {
        Box::new(Self)
    }
}

#[async_trait]
impl DataSource for BoundPackageVersionsDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let version = AttributeType::object(
            ["version", "vcs_url", "vcs_branch", "vcs_revision"].map(|name| (name, AttributeType::String)),
        );
        Schema::v0()
            .with_description("Returns the versions of a package bound to an AppTrust application.")
            .with_attribute("application_key", Attribute::required_string())
            .with_attribute("package_type", Attribute::required_string())
            .with_attribute("package_name", Attribute::required_string())
            .with_attribute("package_version", Attribute::optional_string())
            .with_attribute("offset", Attribute::optional_int64())
            .with_attribute("limit", Attribute::optional_int64())
            .with_attribute("versions", Attribute::computed(AttributeType::list(version)))
            .with_attribute("total", Attribute::computed_int64())
    }

    async fn read(&self, client: &ApiClient, config: &Value) -> Result<Value, ProviderError> {
        let key = required_str(config, "application_key")?;
        let package_type = required_str(config, "package_type")?;
        let package_name = required_str(config, "package_name")?;
        info!(application_key = key, package_type, package_name, "listing bound package versions");

        let path = expand_path(
            PACKAGE_VERSIONS_PATH,
            &[("application_key", key), ("type", package_type), ("name", package_name)],
        );
        let response = client.get(&path, &query_from(config, &FILTERS)).await?;
        if response.is_not_found() {
            return Ok(with_computed(
                config,
                [("versions", Value::Null), ("total", Value::from(0))],
            ));
        }
        let page: VersionsPage = response
            .ensure_success("read", "bound package versions")?
            .json()?;
        let versions: Vec<BoundVersion> = page.versions.into_iter().map(BoundVersion::from).collect();

        Ok(with_computed(
            config,
            [
                ("versions", to_value(&versions)?),
                ("total", Value::from(page.total)),
            ],
        ))
    }
}
