//! `apptrust_application`: registration of an application in a project.
//!
//! Fully driven by [`EntitySpec`]; this module only declares the entity and
//! its schema, plus the application key format check.

use async_trait::async_trait;
use serde_json::Value;

use super::Resource;
use crate::client::{ApiClient, APPLICATIONS_PATH};
use crate::driver::EntitySpec;
use crate::error::ProviderError;
use crate::reconcile::OptionalAttribute;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation;

/// Allowed values of `maturity_level`.
pub const MATURITY_LEVELS: [&str; 4] = ["unspecified", "experimental", "production", "end_of_life"];

/// Allowed values of `criticality`.
pub const CRITICALITY_LEVELS: [&str; 5] = ["unspecified", "low", "medium", "high", "critical"];

/// Value the API reports for an unset enumerated attribute.
pub const UNSPECIFIED: &str = "unspecified";

/// Remote entity description for applications.
pub const APPLICATION: EntitySpec = EntitySpec {
    kind: "application",
    collection_path: APPLICATIONS_PATH,
    item_path: "apptrust/api/v1/applications/{application_key}",
    identifying: &["application_key"],
    required: &["application_name", "project_key"],
    immutable: &["project_key"],
    optional: &[
        OptionalAttribute::scalar("description"),
        OptionalAttribute::map("labels"),
        OptionalAttribute::list("user_owners"),
        OptionalAttribute::list("group_owners"),
        OptionalAttribute::enumerated("maturity_level", UNSPECIFIED),
        OptionalAttribute::enumerated("criticality", UNSPECIFIED),
    ],
    update_scope: &[("project", "project_key")],
    conflict_message: conflict_message,
};

fn conflict_message(key: &str) -> String {
    format!(
        "An application with key '{}' already exists. Please use a different application_key.",
        key
    )
}

/// Whether `key` is 2-64 characters of lowercase letters, digits and hyphens,
/// starting with a letter and ending with a letter or digit.
pub fn is_valid_application_key(key: &str) -> bool {
    let len = key.chars().count();
    if !(2..=64).contains(&len) {
        return false;
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';
    key.starts_with(|c: char| c.is_ascii_lowercase())
        && key.ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && key.chars().all(allowed)
}

/// The `apptrust_application` resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationResource;

impl ApplicationResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "apptrust_application";

    /// Constructor used by the registry.
    pub fn boxed() -> Box<dyn Resource> {
        Box::new(Self)
    }
}

#[async_trait]
impl Resource for ApplicationResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description(
                "An AppTrust application: the system of record for a piece of software \
                 and every version of it.",
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Always equal to application_key."),
            )
            .with_attribute(
                "application_key",
                Attribute::required_string()
                    .with_force_new()
                    .with_length(2, 64)
                    .with_description(
                        "Unique, immutable key: lowercase alphanumerics and hyphens, \
                         beginning with a letter.",
                    ),
            )
            .with_attribute(
                "application_name",
                Attribute::required_string()
                    .with_length(1, 255)
                    .with_description("Display name, unique within the project."),
            )
            .with_attribute(
                "project_key",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("Key of the owning project."),
            )
            .with_attribute(
                "description",
                Attribute::optional_string().with_description("Free-text description."),
            )
            .with_attribute(
                "maturity_level",
                Attribute::optional_computed_string()
                    .with_one_of(&MATURITY_LEVELS)
                    .with_default(Value::String(UNSPECIFIED.to_string()))
                    .with_description("Maturity level of the application."),
            )
            .with_attribute(
                "criticality",
                Attribute::optional_computed_string()
                    .with_one_of(&CRITICALITY_LEVELS)
                    .with_default(Value::String(UNSPECIFIED.to_string()))
                    .with_description("How critical the application is for the business."),
            )
            .with_attribute(
                "labels",
                Attribute::optional_string_map().with_description("Free-text key-value labels."),
            )
            .with_attribute(
                "user_owners",
                Attribute::optional_string_list().with_description("Users owning the application."),
            )
            .with_attribute(
                "group_owners",
                Attribute::optional_string_list().with_description("Groups owning the application."),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        if let Some(key) = config.get("application_key").and_then(Value::as_str) {
            if !is_valid_application_key(key) {
                diagnostics.push(
                    Diagnostic::error("Invalid application_key")
                        .with_detail(
                            "application_key must be 2-64 lowercase alphanumeric characters \
                             and hyphens, beginning with a letter",
                        )
                        .with_attribute("application_key"),
                );
            }
        }
        for list in ["user_owners", "group_owners"] {
            let owners = config.get(list).and_then(Value::as_array);
            if owners.is_some_and(|o| o.iter().any(|v| v.as_str() == Some(""))) {
                diagnostics.push(
                    Diagnostic::error(format!("Invalid value in '{}'", list))
                        .with_detail("Each owner must be at least 1 character in length")
                        .with_attribute(list),
                );
            }
        }
        diagnostics
    }

    async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        APPLICATION.create(client, plan).await
    }

    async fn read(&self, client: &ApiClient, state: &Value) -> Result<Option<Value>, ProviderError> {
        APPLICATION.read(client, state).await
    }

    async fn update(
        &self,
        client: &ApiClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError> {
        APPLICATION.update(client, prior, plan).await
    }

    async fn delete(&self, client: &ApiClient, state: &Value) -> Result<(), ProviderError> {
        APPLICATION.delete(client, state).await
    }

    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        APPLICATION.import(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::has_errors;
    use crate::testing::test_client;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote_app(extra: Value) -> Value {
        let mut app = json!({
            "application_key": "app1",
            "application_name": "App One",
            "project_key": "proj",
            "maturity_level": "unspecified",
            "criticality": "unspecified"
        });
        if let (Some(obj), Some(extra)) = (app.as_object_mut(), extra.as_object()) {
            obj.extend(extra.clone());
        }
        app
    }

    #[test]
    fn test_application_key_format() {
        assert!(is_valid_application_key("ab"));
        assert!(is_valid_application_key("my-app-1"));
        assert!(!is_valid_application_key("a"));
        assert!(!is_valid_application_key("1app"));
        assert!(!is_valid_application_key("app-"));
        assert!(!is_valid_application_key("My-app"));
        assert!(!is_valid_application_key(&"a".repeat(65)));
    }

    #[test]
    fn test_validate_config() {
        let resource = ApplicationResource;
        let ok = json!({
            "application_key": "app1",
            "application_name": "App One",
            "project_key": "proj",
            "maturity_level": "production"
        });
        assert!(resource.validate(&ok).is_empty());

        let bad = json!({
            "application_key": "App1",
            "application_name": "",
            "project_key": "proj",
            "criticality": "extreme",
            "user_owners": [""]
        });
        let diags = resource.validate(&bad);
        assert!(has_errors(&diags));
        let attrs: Vec<_> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert!(attrs.contains(&"application_key"));
        assert!(attrs.contains(&"application_name"));
        assert!(attrs.contains(&"criticality"));
        assert!(attrs.contains(&"user_owners"));
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_empty_owners() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apptrust/api/v1/applications"))
            .and(body_json(json!({
                "application_key": "app1",
                "application_name": "App One",
                "project_key": "proj",
                "maturity_level": "unspecified",
                "criticality": "unspecified"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(remote_app(json!({}))))
            .expect(1)
            .mount(&server)
            .await;

        let plan = json!({
            "application_key": "app1",
            "application_name": "App One",
            "project_key": "proj",
            "user_owners": []
        });
        let state = ApplicationResource
            .create(&test_client(&server.uri()), &plan)
            .await
            .unwrap();

        assert_eq!(
            state,
            json!({
                "id": "app1",
                "application_key": "app1",
                "application_name": "App One",
                "project_key": "proj",
                "description": null,
                "labels": null,
                "user_owners": [],
                "group_owners": null,
                "maturity_level": "unspecified",
                "criticality": "unspecified"
            })
        );
    }

    #[tokio::test]
    async fn test_create_conflict_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "exists"})))
            .mount(&server)
            .await;

        let plan = json!({"application_key": "app1", "application_name": "A", "project_key": "p"});
        let err = ApplicationResource
            .create(&test_client(&server.uri()), &plan)
            .await
            .unwrap_err();
        assert_eq!(
            err.message(),
            "An application with key 'app1' already exists. Please use a different application_key."
        );
    }

    #[tokio::test]
    async fn test_update_clears_owners_and_sends_project() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/apptrust/api/v1/applications/app1"))
            .and(query_param("project", "proj"))
            .and(body_json(json!({
                "application_name": "App One",
                "user_owners": [],
                "labels": {"env": "prod"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(remote_app(json!({"labels": {"env": "prod"}}))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let prior = json!({
            "id": "app1",
            "application_key": "app1",
            "application_name": "App One",
            "project_key": "proj",
            "description": null,
            "labels": null,
            "user_owners": [],
            "group_owners": null,
            "maturity_level": "unspecified",
            "criticality": "unspecified"
        });
        let plan = json!({
            "application_key": "app1",
            "application_name": "App One",
            "project_key": "proj",
            "labels": {"env": "prod"},
            "maturity_level": null,
            "criticality": null
        });
        let state = ApplicationResource
            .update(&test_client(&server.uri()), &prior, &plan)
            .await
            .unwrap();
        assert_eq!(state["user_owners"], Value::Null);
        assert_eq!(state["labels"], json!({"env": "prod"}));
    }

    #[test]
    fn test_import() {
        let state = ApplicationResource.import("app1").unwrap();
        assert_eq!(state, json!({"application_key": "app1", "id": "app1"}));
        assert!(ApplicationResource.import("").is_err());
    }
}
