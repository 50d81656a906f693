//! Generic create/read/update/delete for entities with reconciled optional
//! attributes.
//!
//! An [`EntitySpec`] describes one remote entity type: where it lives, which
//! attributes identify it, which are required and which are optional. The
//! driver turns that description into the four lifecycle operations plus
//! import, running every write-then-read cycle through
//! [`crate::reconcile`] so that refreshes converge.
//!
//! Local state is a JSON object holding every identifying, required and
//! optional attribute plus a computed `id`. Absent optional attributes are
//! stored as `null`.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::{expand_path, ApiClient, Query};
use crate::error::ProviderError;
use crate::identifier;
use crate::reconcile::{reconcile_into, OptionalAttribute};

/// Name of the computed identifier attribute in local state.
pub const ID_ATTRIBUTE: &str = "id";

/// Static description of a remote entity type.
#[derive(Clone, Copy)]
pub struct EntitySpec {
    /// Human-readable name used in messages ("application").
    pub kind: &'static str,
    /// Collection endpoint, target of create.
    pub collection_path: &'static str,
    /// Item endpoint. Placeholders are named after identifying attributes.
    pub item_path: &'static str,
    /// Attributes that make up the identifier, in identifier order.
    pub identifying: &'static [&'static str],
    /// Attributes that must always have a value. May overlap `immutable`.
    pub required: &'static [&'static str],
    /// Required attributes that are fixed after creation and therefore never
    /// sent in an update.
    pub immutable: &'static [&'static str],
    /// Reconciled optional attributes.
    pub optional: &'static [OptionalAttribute],
    /// Query parameters added to updates, as `(parameter, attribute)` pairs.
    pub update_scope: &'static [(&'static str, &'static str)],
    /// Message for a create that hits an existing entity.
    pub conflict_message: fn(&str) -> String,
}

impl EntitySpec {
    /// Build the identifier from the identifying attributes of `state`.
    pub fn identifier(&self, state: &Value) -> Result<String, ProviderError> {
        let segments = self.identifying_values(state)?;
        Ok(identifier::encode(&segments))
    }

    /// Decode an externally supplied identifier into a minimal state holding
    /// the identifying attributes and `id`. No remote call is made.
    pub fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let segments = identifier::decode_exact(id, self.identifying.len())?;
        let mut state = Map::new();
        for (name, value) in self.identifying.iter().zip(segments) {
            state.insert(name.to_string(), Value::String(value));
        }
        state.insert(ID_ATTRIBUTE.to_string(), Value::String(id.to_string()));
        Ok(Value::Object(state))
    }

    /// Create the entity described by `plan` and return its reconciled state.
    pub async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        self.check_required(plan)?;
        let id = self.identifier(plan)?;

        let mut body = Map::new();
        for name in self.identifying.iter().chain(self.required) {
            if let Some(value) = present(plan.get(*name)) {
                body.insert(name.to_string(), value.clone());
            }
        }
        for attr in self.optional {
            if let Some(value) = attr.create_value(plan.get(attr.name)) {
                body.insert(attr.name.to_string(), value);
            }
        }

        info!(kind = self.kind, %id, "creating entity");
        let response = client
            .post(self.collection_path, &Value::Object(body))
            .await?;
        if response.status == 409 {
            warn!(kind = self.kind, %id, "entity already exists");
            return Err(ProviderError::Conflict((self.conflict_message)(&id)));
        }
        let response = response.ensure_success("create", self.kind)?;
        let remote: Value = response.json()?;

        self.materialize(&Value::Null, plan, &remote)
    }

    /// Refresh `state` from the remote.
    ///
    /// Returns `Ok(None)` when the entity no longer exists, meaning the local
    /// copy should be discarded.
    pub async fn read(
        &self,
        client: &ApiClient,
        state: &Value,
    ) -> Result<Option<Value>, ProviderError> {
        let state = self.with_identifying_from_id(state)?;
        let id = self.identifier(&state)?;
        let path = self.item_path_for(&state)?;

        info!(kind = self.kind, %id, "reading entity");
        let response = client.get(&path, &Query::new()).await?;
        if response.is_not_found() {
            warn!(kind = self.kind, %id, "entity not found, removing from state");
            return Ok(None);
        }
        let response = response.ensure_success("read", self.kind)?;
        let remote: Value = response.json()?;

        self.materialize(&state, &state, &remote).map(Some)
    }

    /// Apply `plan` on top of `prior` and return the reconciled state.
    pub async fn update(
        &self,
        client: &ApiClient,
        prior: &Value,
        plan: &Value,
    ) -> Result<Value, ProviderError> {
        self.check_required(plan)?;
        let id = self.identifier(plan)?;
        let path = self.item_path_for(plan)?;

        let mut body = Map::new();
        for name in self.required.iter().filter(|n| !self.immutable.contains(*n)) {
            if let Some(value) = present(plan.get(*name)) {
                body.insert(name.to_string(), value.clone());
            }
        }
        for attr in self.optional {
            if let Some(value) = attr.update_value(prior.get(attr.name), plan.get(attr.name)) {
                body.insert(attr.name.to_string(), value);
            }
        }

        let mut query = Query::new();
        for (param, attr) in self.update_scope {
            query.push_opt(param, present(plan.get(*attr)).and_then(Value::as_str));
        }

        info!(kind = self.kind, %id, "updating entity");
        debug!(kind = self.kind, fields = body.len(), "update payload");
        let response = client.patch(&path, &query, &Value::Object(body)).await?;
        let response = response.ensure_success("update", self.kind)?;
        let remote: Value = response.json()?;

        self.materialize(prior, plan, &remote)
    }

    /// Delete the entity. A missing entity counts as deleted.
    pub async fn delete(&self, client: &ApiClient, state: &Value) -> Result<(), ProviderError> {
        let state = self.with_identifying_from_id(state)?;
        let id = self.identifier(&state)?;
        let path = self.item_path_for(&state)?;

        info!(kind = self.kind, %id, "deleting entity");
        let response = client.delete(&path).await?;
        if response.is_not_found() {
            warn!(kind = self.kind, %id, "entity not found during delete, assuming already deleted");
            return Ok(());
        }
        response.ensure_success("delete", self.kind)?;
        Ok(())
    }

    /// Build local state from the three inputs of a write-then-read cycle.
    ///
    /// Identifying and required attributes prefer the remote value and fall
    /// back to `desired`. The identifier is recomputed from the result.
    pub fn materialize(
        &self,
        prior: &Value,
        desired: &Value,
        remote: &Value,
    ) -> Result<Value, ProviderError> {
        let mut state = Map::new();
        for name in self.identifying.iter().chain(self.required) {
            let value = present(remote.get(*name))
                .or_else(|| present(desired.get(*name)))
                .cloned()
                .unwrap_or(Value::Null);
            state.insert(name.to_string(), value);
        }
        reconcile_into(&mut state, self.optional, prior, desired, remote);

        let mut state = Value::Object(state);
        let id = self.identifier(&state)?;
        if let Some(obj) = state.as_object_mut() {
            obj.insert(ID_ATTRIBUTE.to_string(), Value::String(id));
        }
        Ok(state)
    }

    fn check_required(&self, plan: &Value) -> Result<(), ProviderError> {
        let missing: Vec<&str> = self
            .identifying
            .iter()
            .chain(self.required)
            .filter(|name| present(plan.get(**name)).is_none())
            .copied()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation(format!(
                "Missing required attribute(s) for {}: {}",
                self.kind,
                missing.join(", ")
            )))
        }
    }

    /// After an import only `id` is known; fill the identifying attributes
    /// from it.
    fn with_identifying_from_id(&self, state: &Value) -> Result<Value, ProviderError> {
        if self.identifying_values(state).is_ok() {
            return Ok(state.clone());
        }
        let id = state
            .get(ID_ATTRIBUTE)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProviderError::MalformedIdentifier(format!(
                    "{} state has neither identifying attributes nor an id",
                    self.kind
                ))
            })?;
        let imported = self.import(id)?;

        let mut merged = state.as_object().cloned().unwrap_or_default();
        if let Value::Object(fields) = imported {
            merged.extend(fields);
        }
        Ok(Value::Object(merged))
    }

    fn identifying_values(&self, state: &Value) -> Result<Vec<String>, ProviderError> {
        self.identifying
            .iter()
            .map(|name| {
                state
                    .get(*name)
                    .and_then(Value::as_str)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ProviderError::MalformedIdentifier(format!(
                            "{} is missing identifying attribute '{}'",
                            self.kind, name
                        ))
                    })
            })
            .collect()
    }

    fn item_path_for(&self, state: &Value) -> Result<String, ProviderError> {
        let values = self.identifying_values(state)?;
        let params: Vec<(&str, &str)> = self
            .identifying
            .iter()
            .copied()
            .zip(values.iter().map(String::as_str))
            .collect();
        Ok(expand_path(self.item_path, &params))
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, ResolvedConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WIDGET: EntitySpec = EntitySpec {
        kind: "widget",
        collection_path: "api/widgets",
        item_path: "api/widgets/{owner}/{key}",
        identifying: &["owner", "key"],
        required: &["name", "region"],
        immutable: &["region"],
        optional: &[
            OptionalAttribute::scalar("description"),
            OptionalAttribute::list("tags"),
            OptionalAttribute::enumerated("tier", "unspecified"),
        ],
        update_scope: &[("region", "region")],
        conflict_message: widget_conflict,
    };

    fn widget_conflict(id: &str) -> String {
        format!("A widget with id '{}' already exists", id)
    }

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&ResolvedConfig {
            url: server.uri(),
            credentials: Credentials::AccessToken("t".to_string()),
            bypass_tls_verification: false,
        })
        .unwrap()
    }

    #[test]
    fn test_import_decodes_identifier() {
        let state = WIDGET.import("acme:w1").unwrap();
        assert_eq!(state, json!({"owner": "acme", "key": "w1", "id": "acme:w1"}));

        let err = WIDGET.import("acme").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedIdentifier(_)));
        assert!(WIDGET.import("acme:w1:extra").is_err());
    }

    #[test]
    fn test_materialize_recomputes_identifier() {
        let state = WIDGET
            .materialize(
                &Value::Null,
                &json!({"owner": "acme", "key": "w1", "name": "W", "region": "eu", "tags": []}),
                &json!({"owner": "acme", "key": "w1", "name": "Widget", "region": "eu"}),
            )
            .unwrap();
        assert_eq!(
            state,
            json!({
                "owner": "acme", "key": "w1", "id": "acme:w1",
                "name": "Widget", "region": "eu",
                "description": null, "tags": [], "tier": "unspecified"
            })
        );
    }

    #[tokio::test]
    async fn test_create_omits_zero_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/widgets"))
            .and(body_json(
                json!({"owner": "acme", "key": "w1", "name": "W", "region": "eu", "tier": "unspecified"}),
            ))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"owner": "acme", "key": "w1", "name": "W", "region": "eu"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let plan = json!({
            "owner": "acme", "key": "w1", "name": "W", "region": "eu",
            "description": "", "tags": []
        });
        let state = WIDGET.create(&client_for(&server), &plan).await.unwrap();
        assert_eq!(state["description"], json!(""));
        assert_eq!(state["tags"], json!([]));
        assert_eq!(state["tier"], json!("unspecified"));
        assert_eq!(state["id"], json!("acme:w1"));
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let plan = json!({"owner": "acme", "key": "w1", "name": "W", "region": "eu"});
        let err = WIDGET.create(&client_for(&server), &plan).await.unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(ref m) if m == "A widget with id 'acme:w1' already exists"));
    }

    #[tokio::test]
    async fn test_create_requires_attributes_without_remote_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = WIDGET
            .create(&client_for(&server), &json!({"owner": "acme", "key": "w1", "name": "W"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(ref m) if m.contains("region")));
    }

    #[tokio::test]
    async fn test_read_after_import_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/widgets/acme/w1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(
                    json!({"owner": "acme", "key": "w1", "name": "W", "region": "eu", "tier": "gold"}),
                ),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/widgets/acme/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let state = WIDGET
            .read(&client, &json!({"id": "acme:w1"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["name"], json!("W"));
        assert_eq!(state["tier"], json!("gold"));
        assert_eq!(state["description"], Value::Null);

        let gone = WIDGET.read(&client, &json!({"id": "acme:gone"})).await.unwrap();
        assert_eq!(gone, None);
    }

    #[tokio::test]
    async fn test_update_sends_clearing_values_and_scope() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/widgets/acme/w1"))
            .and(query_param("region", "eu"))
            .and(body_json(json!({"name": "W2", "description": "", "tags": [], "tier": "unspecified"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"owner": "acme", "key": "w1", "name": "W2", "region": "eu"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let prior = json!({
            "owner": "acme", "key": "w1", "name": "W", "region": "eu",
            "description": "old", "tags": ["a"], "tier": "gold"
        });
        let plan = json!({"owner": "acme", "key": "w1", "name": "W2", "region": "eu"});
        let state = WIDGET.update(&client_for(&server), &prior, &plan).await.unwrap();
        assert_eq!(state["description"], Value::Null);
        assert_eq!(state["tags"], Value::Null);
        assert_eq!(state["tier"], json!("unspecified"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/widgets/acme/w1"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/widgets/acme/w1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let state = json!({"owner": "acme", "key": "w1"});
        WIDGET.delete(&client, &state).await.unwrap();
        WIDGET.delete(&client, &state).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_surfaces_other_errors() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = WIDGET
            .delete(&client_for(&server), &json!({"owner": "acme", "key": "w1"}))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "You do not have permission to delete widget.");
    }
}
