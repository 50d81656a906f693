//! One-shot version actions: promote, release and roll back.
//!
//! The remote side keeps no addressable record of an action, so create sends
//! the request and stores the configuration, read and update hand state back
//! unchanged, and delete only forgets it.

use serde_json::{Map, Value};
use tracing::info;

use super::application_version::VERSION_PATH;
use super::{optional_str, required_str};
use crate::client::{expand_path, ApiClient};
use crate::error::ProviderError;
use crate::identifier;
use crate::schema::{Attribute, Schema};

/// Promotion type sent when none is configured.
pub const DEFAULT_PROMOTION_TYPE: &str = "copy";

/// Accepted promotion types.
pub const PROMOTION_TYPES: [&str; 4] = ["move", "copy", "keep", "dry_run"];

/// Static description of an action resource.
#[derive(Clone, Copy)]
pub(crate) struct ActionSpec {
    /// Verb used in messages ("promote").
    pub verb: &'static str,
    /// Path segment appended to the version endpoint.
    pub endpoint: &'static str,
    /// Attributes that make up the identifier, in order. The first two are
    /// always `application_key` and `version`.
    pub identifying: &'static [&'static str],
    /// Message for an identifier that does not decode.
    pub import_format: &'static str,
    /// Build the request body from the plan.
    pub body: fn(&Value) -> Result<Value, ProviderError>,
    /// Attributes stored from the plan besides the identifying ones.
    pub stored: &'static [&'static str],
}

impl ActionSpec {
    pub fn identifier(&self, state: &Value) -> Result<String, ProviderError> {
        let segments = self
            .identifying
            .iter()
            .map(|name| required_str(state, name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(identifier::encode(&segments))
    }

    /// Decode an import identifier. With two identifying attributes the
    /// version takes everything after the first delimiter; otherwise the
    /// segment count must match exactly.
    pub fn decode(&self, id: &str) -> Result<Vec<String>, ProviderError> {
        let malformed = || ProviderError::MalformedIdentifier(self.import_format.to_string());
        if self.identifying.len() == 2 {
            let decoded = identifier::decode(id, 1, 0).map_err(|_| malformed())?;
            if decoded.middle.is_empty() {
                return Err(malformed());
            }
            let mut segments = decoded.prefix;
            segments.push(decoded.middle);
            Ok(segments)
        } else {
            identifier::decode_exact(id, self.identifying.len()).map_err(|_| malformed())
        }
    }

    pub async fn create(&self, client: &ApiClient, plan: &Value) -> Result<Value, ProviderError> {
        let id = self.identifier(plan)?;
        let key = required_str(plan, "application_key")?;
        let version = required_str(plan, "version")?;
        let body = (self.body)(plan)?;

        let path = format!(
            "{}/{}",
            expand_path(VERSION_PATH, &[("application_key", key), ("version", version)]),
            self.endpoint
        );
        info!(action = self.verb, %id, "running version action");
        let response = client.post(&path, &body).await?;
        if !matches!(response.status, 200 | 202) {
            return Err(response.into_error(self.verb, "application version"));
        }

        Ok(self.state_from(plan, &body, &id))
    }

    /// Stored state: identifying attributes, configured extras and `id`.
    /// Attributes the request filled with a default are stored with that
    /// default.
    fn state_from(&self, plan: &Value, body: &Value, id: &str) -> Value {
        let mut state = Map::new();
        for name in self.identifying.iter().chain(self.stored) {
            let value = plan
                .get(*name)
                .filter(|v| !v.is_null())
                .or_else(|| body.get(*name))
                .cloned()
                .unwrap_or(Value::Null);
            state.insert(name.to_string(), value);
        }
        state.insert("id".into(), Value::String(id.to_string()));
        Value::Object(state)
    }

    /// Refresh or update: the configuration is the state.
    pub fn restate(&self, state: &Value) -> Result<Value, ProviderError> {
        let state = self.with_identifying_from_id(state)?;
        let id = self.identifier(&state)?;
        let mut out = state.as_object().cloned().unwrap_or_default();
        out.insert("id".into(), Value::String(id));
        Ok(Value::Object(out))
    }

    pub fn import(&self, id: &str) -> Result<Value, ProviderError> {
        let segments = self.decode(id)?;
        let mut state = Map::new();
        for (name, value) in self.identifying.iter().zip(segments) {
            state.insert(name.to_string(), Value::String(value));
        }
        state.insert("id".into(), Value::String(id.to_string()));
        Ok(Value::Object(state))
    }

    fn with_identifying_from_id(&self, state: &Value) -> Result<Value, ProviderError> {
        if self.identifier(state).is_ok() {
            return Ok(state.clone());
        }
        let id = optional_str(state, "id")
            .ok_or_else(|| ProviderError::MalformedIdentifier(self.import_format.to_string()))?;
        let mut merged = state.as_object().cloned().unwrap_or_default();
        if let Value::Object(fields) = self.import(id)? {
            merged.extend(fields);
        }
        Ok(Value::Object(merged))
    }
}

/// Body shared by promote and release.
pub(crate) fn promotion_body(plan: &Value) -> Result<Value, ProviderError> {
    let mut body = Map::new();
    if let Some(stage) = optional_str(plan, "target_stage") {
        body.insert("target_stage".into(), Value::String(stage.to_string()));
    }
    body.insert(
        "promotion_type".into(),
        Value::String(
            optional_str(plan, "promotion_type")
                .unwrap_or(DEFAULT_PROMOTION_TYPE)
                .to_string(),
        ),
    );
    for name in ["included_repository_keys", "excluded_repository_keys"] {
        if let Some(keys) = plan.get(name).and_then(Value::as_array) {
            if !keys.is_empty() {
                body.insert(name.into(), Value::Array(keys.clone()));
            }
        }
    }
    if let Some(auth) = optional_str(plan, "promotion_authorization_type") {
        body.insert("promotion_authorization_type".into(), Value::String(auth.to_string()));
    }
    Ok(Value::Object(body))
}

/// Attributes shared by promote and release, on top of `application_key`
/// and `version`.
pub(crate) fn promotion_schema(schema: Schema) -> Schema {
    schema
        .with_attribute(
            "promotion_type",
            Attribute::optional_computed_string()
                .with_one_of(&PROMOTION_TYPES)
                .with_default(Value::String(DEFAULT_PROMOTION_TYPE.to_string()))
                .with_description("Promotion type: move, copy, keep, or dry_run. Default is copy."),
        )
        .with_attribute(
            "included_repository_keys",
            Attribute::optional_string_list().with_description("Repository keys to include."),
        )
        .with_attribute(
            "excluded_repository_keys",
            Attribute::optional_string_list().with_description("Repository keys to exclude."),
        )
        .with_attribute(
            "promotion_authorization_type",
            Attribute::optional_string().with_description("Promotion authorization type."),
        )
}

/// `id`, `application_key` and `version`, all actions start from these.
pub(crate) fn base_schema(description: &str, id_format: &str, version_role: &str) -> Schema {
    Schema::v0()
        .with_description(description)
        .with_attribute("id", Attribute::computed_string().with_description(id_format))
        .with_attribute(
            "application_key",
            Attribute::required_string()
                .with_force_new()
                .with_description("The application key."),
        )
        .with_attribute(
            "version",
            Attribute::required_string()
                .with_force_new()
                .with_description(version_role),
        )
}
