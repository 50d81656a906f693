//! `apptrust_bound_package`: a package version bound to an application.
//!
//! Every attribute is identifying, so a binding is only ever created,
//! refreshed or removed. The package name is the one identifier segment that
//! may itself contain the delimiter (Maven `group:artifact` coordinates).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{object, optional_str, required_str, Resource};
use crate::client::{expand_path, ApiClient, Query};
use crate::error::ProviderError;
use crate::identifier;
use crate::schema::{Attribute, Schema};

pub(crate) const PACKAGES_PATH: &str = "apptrust/api/v1/applications/{application_key}/packages";
pub(crate) const PACKAGE_VERSIONS_PATH: &str =
    "apptrust/api/v1/applications/{application_key}/packages/{type}/{name}";
const PACKAGE_VERSION_PATH: &str =
    "apptrust/api/v1/applications/{application_key}/packages/{type}/{name}/{version}";

const KIND: &str = "bound package";
const IMPORT_FORMAT: &str = "Use application_key:package_type:package_name:package_version \
                             (e.g. my-app:maven:com.example:lib:1.0.0)";

/// The four identifying attributes of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBinding {
    /// Application the package is bound to.
    pub application_key: String,
    /// Package type such as `maven` or `npm`.
    pub package_type: String,
    /// Package name; may itself contain `:` (Maven `group:artifact`).
    pub package_name: String,
    /// Bound package version.
    pub package_version: String,
}

impl PackageBinding {
    /// Decode `application_key:package_type:package_name:package_version`.
    pub fn decode(id: &str) -> Result<Self, ProviderError> {
        let malformed = || ProviderError::MalformedIdentifier(IMPORT_FORMAT.to_string());
        let decoded = identifier::decode(id, 2, 1).map_err(|_| malformed())?;
        if decoded.middle.is_empty() {
            return Err(malformed());
        }
        let mut prefix = decoded.prefix.into_iter();
        let mut suffix = decoded.suffix.into_iter();
        match (prefix.next(), prefix.next(), suffix.next()) {
            (Some(application_key), Some(package_type), Some(package_version)) => Ok(Self {
                application_key,
                package_type,
                package_name: decoded.middle,
                package_version,
            }),
            _ => Err(malformed()),
        }
    }

    /// Read the binding from state, falling back to its `id`.
    fn from_state(state: &Value) -> Result<Self, ProviderError> {
        let fields = (
            optional_str(state, "application_key"),
            optional_str(state, "package_type"),
            optional_str(state, "package_name"),
            optional_str(state, "package_version"),
        );
        match fields {
            (Some(key), Some(ty), Some(name), Some(version)) => Ok(Self {
                application_key: key.to_string(),
                package_type: ty.to_string(),
                package_name: name.to_string(),
                package_version: version.to_string(),
            }),
            _ => match optional_str(state, "id") {
                Some(id) => Self::decode(id),
                None => Err(ProviderError::MalformedIdentifier(
                    "application_key, package_type, package_name, package_version or valid id required"
                        .to_string(),
                )),
            },
        }
    }

    fn from_plan(plan: &Value) -> Result<Self, ProviderError> {
        Ok(Self {
            application_key: required_str(plan, "application_key")?.to_string(),
            package_type: required_str(plan, "package_type")?.to_string(),
            package_name: required_str(plan, "package_name")?.to_string(),
            package_version: required_str(plan, "package_version")?.to_string(),
        })
    }

    /// The composite identifier.
    pub fn id(&self) -> String {
        identifier::encode(&[
            &self.application_key,
            &self.package_type,
            &self.package_name,
            &self.package_version,
        ])
    }

    fn to_state(&self) -> Value {
        object([
            ("id", Value::String(self.id())),
            ("application_key", Value::String(self.application_key.clone())),
            ("package_type", Value::String(self.package_type.clone())),
            ("package_name", Value::String(self.package_name.clone())),
            ("package_version", Value::String(self.package_version.clone())),
        ])
    }

    fn path(&self, template: &str) -> String {
        expand_path(
            template,
            &[
                ("application_key", self.application_key.as_str()),
                ("type", self.package_type.as_str()),
                ("name", self.package_name.as_str()),
                ("version", self.package_version.as_str()),
            ],
        )
    }
}

#[derive(Debug, Deserialize)]
struct PackageVersions {
    #[serde(default)]
    versions: Vec<PackageVersionItem>,
}

#[derive(Debug, Deserialize)]
struct PackageVersionItem {
    version: String,
}

/// The `apptrust_bound_package` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundPackageResource;

impl BoundPackageResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "apptrust_bound_package";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn Resource> {
        Box::new(Self)
    }
}

#[async_trait]
impl Resource for BoundPackageResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "Binds a package version to an AppTrust application. Changing any attribute \
                 replaces the binding.",
            )
            .with_attribute(
                "id",
                Attribute::computed_string()
                    .with_description("application_key:package_type:package_name:package_version"),
            )
            .with_attribute("application_key", Attribute::required_string().with_force_new())
            .with_attribute(
                "package_type",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Package type (e.g. maven, docker, npm, generic)."),
            )
            .with_attribute("package_name", Attribute::required_string().with_force_new())
            .with_attribute("package_version", Attribute::required_string().with_force_new())
    }

    async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        let binding = PackageBinding::from_plan(plan)?;
        let body = object([
            ("package_type", Value::String(binding.package_type.clone())),
            ("package_name", Value::String(binding.package_name.clone())),
            ("package_version", Value::String(binding.package_version.clone())),
        ]);

        info!(id = %binding.id(), "binding package");
        let response = client.post(&binding.path(PACKAGES_PATH), &body).await?;
        if response.status != 201 {
            return Err(response.into_error("create", KIND));
        }
        Ok(binding.to_state())
    }

    async fn read(&self, client: &ApiClient, state: &Value) -> Result<Option<Value>, ProviderError> {
        let binding = PackageBinding::from_state(state)?;

        info!(id = %binding.id(), "reading package binding");
        let query = Query::new().with("package_version", &binding.package_version);
        let response = client.get(&binding.path(PACKAGE_VERSIONS_PATH), &query).await?;
        if response.is_not_found() {
            warn!(id = %binding.id(), "bound package not found, removing from state");
            return Ok(None);
        }
        let versions: PackageVersions = response.ensure_success("read", KIND)?.json()?;

        if versions
            .versions
            .iter()
            .any(|v| v.version == binding.package_version)
        {
            Ok(Some(binding.to_state()))
        } else {
            warn!(id = %binding.id(), "bound package version not found, removing from state");
            Ok(None)
        }
    }

    async fn update(
        &self,
        _client: &ApiClient,
        _prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError> {
        Ok(PackageBinding::from_plan(plan)?.to_state())
    }

    async fn delete(&self, client: &ApiClient, state: &Value) -> Result<(), ProviderError> {
        let binding = PackageBinding::from_state(state)?;

        info!(id = %binding.id(), "unbinding package");
        let response = client.delete(&binding.path(PACKAGE_VERSION_PATH)).await?;
        match response.status {
            200 | 204 => Ok(()),
            404 => {
                warn!(id = %binding.id(), "bound package already removed");
                Ok(())
            },
            _ => Err(response.into_error("delete", KIND)),
        }
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        Ok(PackageBinding::decode(id)?.to_state())
    }
}
