//! `apptrust_application_version`: an immutable release candidate of an
//! application, assembled from artifacts, builds or other versions.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{object, optional_str, required_str, Resource};
use crate::client::{expand_path, ApiClient, Query};
use crate::error::ProviderError;
use crate::identifier;
use crate::reconcile::OptionalAttribute;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

pub(crate) const VERSIONS_PATH: &str = "apptrust/api/v1/applications/{application_key}/versions";
pub(crate) const VERSION_PATH: &str =
    "apptrust/api/v1/applications/{application_key}/versions/{version}";

/// Page size used when looking a version up in the version list.
const LIST_LIMIT: u32 = 1000;

const KIND: &str = "application version";
const TAG: OptionalAttribute = OptionalAttribute::scalar("tag");

/// Attributes copied verbatim from configuration into state.
const PASSTHROUGH: [&str; 5] = [
    "source_artifacts",
    "source_builds",
    "source_versions",
    "properties",
    "delete_properties",
];

#[derive(Debug, Deserialize)]
struct VersionList {
    #[serde(default)]
    versions: Vec<VersionListItem>,
}

#[derive(Debug, Deserialize)]
struct VersionListItem {
    version: String,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    release_status: Option<String>,
    #[serde(default)]
    current_stage: Option<String>,
}

/// The `apptrust_application_version` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationVersionResource;

impl ApplicationVersionResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "apptrust_application_version";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn Resource> {
        Box::new(Self)
    }
}

/// Split `application_key:version`. The version keeps any further colons.
pub(crate) fn decode_version_id(id: &str) -> Result<(String, String), ProviderError> {
    let malformed = || {
        ProviderError::MalformedIdentifier(
            "Import ID must be application_key:version (e.g. my-app:1.0.0)".to_string(),
        )
    };
    let decoded = identifier::decode(id, 1, 0).map_err(|_| malformed())?;
    if decoded.middle.is_empty() {
        return Err(malformed());
    }
    let key = decoded.prefix.into_iter().next().ok_or_else(malformed)?;
    Ok((key, decoded.middle))
}

/// Application key and version from state, falling back to the `id` left
/// behind by an import.
pub(crate) fn version_coordinates(state: &Value) -> Result<(String, String), ProviderError> {
    match (
        optional_str(state, "application_key"),
        optional_str(state, "version"),
    ) {
        (Some(key), Some(version)) => Ok((key.to_string(), version.to_string())),
        _ => match optional_str(state, "id") {
            Some(id) => decode_version_id(id),
            None => Err(ProviderError::MalformedIdentifier(
                "id must be application_key:version or state must have application_key and version"
                    .to_string(),
            )),
        },
    }
}

fn version_path(template: &str, key: &str, version: &str) -> String {
    expand_path(template, &[("application_key", key), ("version", version)])
}

/// Build the `sources` object of a create request.
fn sources(plan: &Value) -> Result<Value, ProviderError> {
    let mut sources = Map::new();

    let artifacts = list_items(plan, "source_artifacts")
        .map(|item| -> Result<Value, ProviderError> {
            let mut out = Map::new();
            out.insert("path".into(), Value::String(item_str(item, "source_artifacts", "path")?));
            if let Some(sha) = optional_str(item, "sha256") {
                out.insert("sha256".into(), Value::String(sha.to_string()));
            }
            Ok(Value::Object(out))
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    let builds = list_items(plan, "source_builds")
        .map(|item| -> Result<Value, ProviderError> {
            let mut out = Map::new();
            out.insert("name".into(), Value::String(item_str(item, "source_builds", "name")?));
            out.insert("number".into(), Value::String(item_str(item, "source_builds", "number")?));
            if item.get("include_dependencies").and_then(Value::as_bool) == Some(true) {
                out.insert("include_dependencies".into(), Value::Bool(true));
            }
            for name in ["repository_key", "started"] {
                if let Some(v) = optional_str(item, name) {
                    out.insert(name.into(), Value::String(v.to_string()));
                }
            }
            Ok(Value::Object(out))
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    let versions = list_items(plan, "source_versions")
        .map(|item| -> Result<Value, ProviderError> {
            Ok(object([
                (
                    "application_key",
                    Value::String(item_str(item, "source_versions", "application_key")?),
                ),
                ("version", Value::String(item_str(item, "source_versions", "version")?)),
            ]))
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    if artifacts.is_empty() && builds.is_empty() && versions.is_empty() {
        return Err(ProviderError::Validation(
            "At least one source required: Create application version requires at least one of \
             source_artifacts, source_builds, or source_versions."
                .to_string(),
        ));
    }
    for (name, items) in [("artifacts", artifacts), ("builds", builds), ("versions", versions)] {
        if !items.is_empty() {
            sources.insert(name.to_string(), Value::Array(items));
        }
    }
    Ok(Value::Object(sources))
}

fn list_items<'a>(plan: &'a Value, name: &str) -> impl Iterator<Item = &'a Value> {
    plan.get(name)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn item_str(item: &Value, list: &str, name: &str) -> Result<String, ProviderError> {
    optional_str(item, name).map(str::to_string).ok_or_else(|| {
        ProviderError::Validation(format!("Every entry of '{}' needs a '{}'", list, name))
    })
}

/// Assemble state from configuration plus the remote-owned attributes.
fn build_state(
    key: &str,
    version: &str,
    config: &Value,
    tag: Option<Value>,
    release_status: Value,
    current_stage: Value,
) -> Value {
    let mut state = Map::new();
    state.insert("id".into(), Value::String(identifier::encode(&[key, version])));
    state.insert("application_key".into(), Value::String(key.to_string()));
    state.insert("version".into(), Value::String(version.to_string()));
    state.insert("tag".into(), tag.unwrap_or(Value::Null));
    for name in PASSTHROUGH {
        state.insert(name.into(), config.get(name).cloned().unwrap_or(Value::Null));
    }
    state.insert("release_status".into(), release_status);
    state.insert("current_stage".into(), current_stage);
    Value::Object(state)
}

fn computed(state: &Value, name: &str) -> Value {
    state.get(name).cloned().unwrap_or(Value::Null)
}

fn non_empty_string(value: Option<String>) -> Value {
    value
        .filter(|v| !v.is_empty())
        .map(Value::String)
        .unwrap_or(Value::Null)
}

#[async_trait]
impl Resource for ApplicationVersionResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let artifact = AttributeType::object([
            ("path", AttributeType::String),
            ("sha256", AttributeType::String),
        ]);
        let build = AttributeType::object([
            ("name", AttributeType::String),
            ("number", AttributeType::String),
            ("include_dependencies", AttributeType::Bool),
            ("repository_key", AttributeType::String),
            ("started", AttributeType::String),
        ]);
        let source_version = AttributeType::object([
            ("application_key", AttributeType::String),
            ("version", AttributeType::String),
        ]);

        Schema::v0()
            .with_description(
                "An application version. At least one source must be provided on create; \
                 only the tag and properties can change afterwards.",
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("application_key:version"),
            )
            .with_attribute(
                "application_key",
                Attribute::required_string().with_force_new(),
            )
            .with_attribute(
                "version",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The application version (e.g. SemVer 1.0.0)."),
            )
            .with_attribute(
                "tag",
                Attribute::optional_string()
                    .with_length(0, 128)
                    .with_description("Tag associated with the version, such as a branch name."),
            )
            .with_attribute(
                "source_artifacts",
                Attribute::new(AttributeType::list(artifact), AttributeFlags::optional()),
            )
            .with_attribute(
                "source_builds",
                Attribute::new(AttributeType::list(build), AttributeFlags::optional()),
            )
            .with_attribute(
                "source_versions",
                Attribute::new(AttributeType::list(source_version), AttributeFlags::optional()),
            )
            .with_attribute(
                "properties",
                Attribute::new(
                    AttributeType::map(AttributeType::list(AttributeType::String)),
                    AttributeFlags::optional(),
                )
                .with_description("Version properties, key to list of values."),
            )
            .with_attribute(
                "delete_properties",
                Attribute::optional_string_list()
                    .with_description("Property keys to remove on update."),
            )
            .with_attribute(
                "release_status",
                Attribute::computed_string()
                    .with_description("pre_release, released or trusted_release."),
            )
            .with_attribute(
                "current_stage",
                Attribute::computed_string().with_description("Current lifecycle stage."),
            )
    }

    async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        let key = required_str(plan, "application_key")?;
        let version = required_str(plan, "version")?;

        let mut body = Map::new();
        body.insert("version".into(), Value::String(version.to_string()));
        body.insert("sources".into(), sources(plan)?);
        if let Some(tag) = TAG.create_value(plan.get("tag")) {
            body.insert("tag".into(), tag);
        }

        info!(application_key = key, version, "creating application version");
        let response = client
            .post(&expand_path(VERSIONS_PATH, &[("application_key", key)]), &Value::Object(body))
            .await?;
        if !matches!(response.status, 201 | 202) {
            return Err(response.into_error("create", KIND));
        }

        // the endpoint does not echo the version, so the submitted tag stands in
        let tag = TAG.reconcile(None, plan.get("tag"), plan.get("tag"));
        Ok(build_state(key, version, plan, tag, Value::Null, Value::Null))
    }

    async fn read(&self, client: &ApiClient, state: &Value) -> Result<Option<Value>, ProviderError> {
        let (key, version) = version_coordinates(state)?;

        info!(application_key = %key, %version, "reading application version");
        let query = Query::new().with("limit", LIST_LIMIT);
        let response = client
            .get(&expand_path(VERSIONS_PATH, &[("application_key", key.as_str())]), &query)
            .await?;
        if response.is_not_found() {
            warn!(application_key = %key, "application not found, removing version from state");
            return Ok(None);
        }
        let list: VersionList = response.ensure_success("read", KIND)?.json()?;

        let Some(found) = list.versions.into_iter().find(|v| v.version == version) else {
            warn!(application_key = %key, %version, "application version not found, removing from state");
            return Ok(None);
        };

        let remote_tag = found.tag.map(Value::String);
        let tag = TAG.reconcile(state.get("tag"), state.get("tag"), remote_tag.as_ref());
        Ok(Some(build_state(
            &key,
            &version,
            state,
            tag,
            non_empty_string(found.release_status),
            non_empty_string(found.current_stage),
        )))
    }

    async fn update(
        &self,
        client: &ApiClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError> {
        let key = required_str(plan, "application_key")?;
        let version = required_str(plan, "version")?;

        // the API resets an omitted tag, so it is always sent
        let mut body = Map::new();
        body.insert(
            "tag".into(),
            Value::String(optional_str(plan, "tag").unwrap_or_default().to_string()),
        );
        for name in ["properties", "delete_properties"] {
            if let Some(value) = plan.get(name).filter(|v| !v.is_null()) {
                body.insert(name.into(), value.clone());
            }
        }

        info!(application_key = key, version, "updating application version");
        let response = client
            .patch(&version_path(VERSION_PATH, key, version), &Query::new(), &Value::Object(body))
            .await?;
        if !matches!(response.status, 200 | 202) {
            return Err(response.into_error("update", KIND));
        }

        let tag = TAG.reconcile(prior.get("tag"), plan.get("tag"), plan.get("tag"));
        Ok(build_state(
            key,
            version,
            plan,
            tag,
            computed(prior, "release_status"),
            computed(prior, "current_stage"),
        ))
    }

    async fn delete(&self, client: &ApiClient, state: &Value) -> Result<(), ProviderError> {
        let (key, version) = version_coordinates(state)?;

        info!(application_key = %key, %version, "deleting application version");
        let response = client.delete(&version_path(VERSION_PATH, &key, &version)).await?;
        match response.status {
            200 | 202 | 204 => Ok(()),
            404 => {
                warn!(application_key = %key, %version, "application version already deleted");
                Ok(())
            },
            _ => Err(response.into_error("delete", KIND)),
        }
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let (key, version) = decode_version_id(id)?;
        Ok(object([
            ("application_key", Value::String(key)),
            ("version", Value::String(version)),
            ("id", Value::String(id.to_string())),
        ]))
    }
}
