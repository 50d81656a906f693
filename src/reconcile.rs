//! Reconciliation of optional attributes across write-then-read cycles.
//!
//! The AppTrust API collapses "omitted" and "explicitly empty" into one wire
//! representation when it echoes an entity back. Local state has to keep the
//! two apart, otherwise a configuration with `owners = []` would flip to
//! `null` on every refresh and never converge. The reconciler decides the
//! stored representation of each optional attribute from three inputs: the
//! previously stored value, the value the caller asked for, and what the
//! remote returned.
//!
//! Values are `serde_json::Value`s taken from entity state objects; a missing
//! key and `null` both mean [`Presence::Absent`].

use serde_json::{Map, Value};

/// The observable state of an optional attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Never set (missing key or `null`).
    Absent,
    /// Set to the zero value of its kind: `""`, `[]` or `{}`.
    Empty,
    /// Set to a non-zero value.
    Populated,
}

/// The shape of an optional attribute, which determines its zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string.
    Scalar,
    /// An ordered list of strings.
    List,
    /// A string-to-string mapping.
    Map,
}

impl FieldKind {
    /// Classify a value of this kind.
    ///
    /// A value whose JSON type does not match the kind counts as populated;
    /// validation rejects such values before they reach the reconciler.
    pub fn presence(self, value: Option<&Value>) -> Presence {
        let is_empty = match (self, value) {
            (_, None) | (_, Some(Value::Null)) => return Presence::Absent,
            (FieldKind::Scalar, Some(Value::String(s))) => s.is_empty(),
            (FieldKind::List, Some(Value::Array(a))) => a.is_empty(),
            (FieldKind::Map, Some(Value::Object(m))) => m.is_empty(),
            _ => false,
        };
        if is_empty {
            Presence::Empty
        } else {
            Presence::Populated
        }
    }

    /// The explicit zero value used to clear an attribute of this kind.
    pub fn empty_value(self) -> Value {
        match self {
            FieldKind::Scalar => Value::String(String::new()),
            FieldKind::List => Value::Array(Vec::new()),
            FieldKind::Map => Value::Object(Map::new()),
        }
    }
}

/// An optional attribute of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalAttribute {
    /// Attribute name, shared by local state and the wire format.
    pub name: &'static str,
    /// Value shape.
    pub kind: FieldKind,
    /// Documented default the remote reports for an unset value. Attributes
    /// with a sentinel are never stored as absent.
    pub sentinel: Option<&'static str>,
}

impl OptionalAttribute {
    /// An optional string.
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
            sentinel: None,
        }
    }

    /// An optional list of strings.
    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::List,
            sentinel: None,
        }
    }

    /// An optional string-to-string map.
    pub const fn map(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Map,
            sentinel: None,
        }
    }

    /// An enumerated string whose unset value is reported as `sentinel`.
    pub const fn enumerated(name: &'static str, sentinel: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar,
            sentinel: Some(sentinel),
        }
    }

    /// Choose the value to store after a write or a refresh.
    ///
    /// `None` means the attribute is stored as absent.
    pub fn reconcile(
        &self,
        prior: Option<&Value>,
        desired: Option<&Value>,
        remote: Option<&Value>,
    ) -> Option<Value> {
        match self.sentinel {
            Some(sentinel) => Some(reconcile_sentinel(remote, sentinel)),
            None => reconcile(self.kind, prior, desired, remote),
        }
    }

    /// The value to send in an update payload, or `None` to omit the field.
    ///
    /// A desired value is always sent. An absent desired value that replaces a
    /// previously set one is sent as the explicit clearing value, since the
    /// API treats an omitted field as "leave unchanged".
    pub fn update_value(&self, prior: Option<&Value>, desired: Option<&Value>) -> Option<Value> {
        if self.kind.presence(desired) != Presence::Absent {
            return desired.cloned();
        }
        if self.kind.presence(prior) == Presence::Absent {
            return None;
        }
        match self.sentinel {
            // already at its unset value
            Some(sentinel) if prior.and_then(Value::as_str) == Some(sentinel) => None,
            Some(sentinel) => Some(Value::String(sentinel.to_string())),
            None => Some(self.kind.empty_value()),
        }
    }

    /// The value to send in a create payload.
    ///
    /// Populated values are sent as is. Enumerated attributes fall back to
    /// their sentinel; other zero values are left out.
    pub fn create_value(&self, desired: Option<&Value>) -> Option<Value> {
        match (self.kind.presence(desired), self.sentinel) {
            (Presence::Populated, _) => desired.cloned(),
            (Presence::Absent | Presence::Empty, Some(sentinel)) => {
                Some(Value::String(sentinel.to_string()))
            },
            (Presence::Absent | Presence::Empty, None) => None,
        }
    }
}

/// Decide the stored representation of an optional attribute.
///
/// Evaluated in order:
/// 1. a populated remote value wins;
/// 2. an explicitly empty desired value is kept as empty;
/// 3. a clear (desired absent after a populated prior value) stays absent;
/// 4. anything else is absent.
pub fn reconcile(
    kind: FieldKind,
    prior: Option<&Value>,
    desired: Option<&Value>,
    remote: Option<&Value>,
) -> Option<Value> {
    if kind.presence(remote) == Presence::Populated {
        return remote.cloned();
    }
    match (kind.presence(desired), kind.presence(prior)) {
        (Presence::Empty, _) => Some(kind.empty_value()),
        // clear request
        (Presence::Absent, Presence::Populated) => None,
        (Presence::Absent, Presence::Absent | Presence::Empty) => None,
        // remote dropped the value; writes without an echo pass `desired` as `remote`
        (Presence::Populated, _) => None,
    }
}

/// Normalize an enumerated attribute: missing, null and empty all read as the
/// sentinel.
pub fn reconcile_sentinel(remote: Option<&Value>, sentinel: &str) -> Value {
    match remote {
        Some(Value::String(s)) if !s.is_empty() => Value::String(s.clone()),
        _ => Value::String(sentinel.to_string()),
    }
}

/// Apply [`OptionalAttribute::reconcile`] for every attribute in `attributes`,
/// writing the result into `target`. Absent results are stored as `null`.
pub fn reconcile_into(
    target: &mut Map<String, Value>,
    attributes: &[OptionalAttribute],
    prior: &Value,
    desired: &Value,
    remote: &Value,
) {
    for attr in attributes {
        let stored = attr.reconcile(
            prior.get(attr.name),
            desired.get(attr.name),
            remote.get(attr.name),
        );
        target.insert(attr.name.to_string(), stored.unwrap_or(Value::Null));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OWNERS: OptionalAttribute = OptionalAttribute::list("user_owners");
    const DESCRIPTION: OptionalAttribute = OptionalAttribute::scalar("description");
    const LABELS: OptionalAttribute = OptionalAttribute::map("labels");
    const MATURITY: OptionalAttribute = OptionalAttribute::enumerated("maturity_level", "unspecified");

    #[test]
    fn test_presence_per_kind() {
        assert_eq!(FieldKind::Scalar.presence(None), Presence::Absent);
        assert_eq!(FieldKind::Scalar.presence(Some(&Value::Null)), Presence::Absent);
        assert_eq!(FieldKind::Scalar.presence(Some(&json!(""))), Presence::Empty);
        assert_eq!(FieldKind::Scalar.presence(Some(&json!("x"))), Presence::Populated);
        assert_eq!(FieldKind::List.presence(Some(&json!([]))), Presence::Empty);
        assert_eq!(FieldKind::List.presence(Some(&json!(["a"]))), Presence::Populated);
        assert_eq!(FieldKind::Map.presence(Some(&json!({}))), Presence::Empty);
        assert_eq!(FieldKind::Map.presence(Some(&json!({"k": "v"}))), Presence::Populated);
    }

    #[test]
    fn test_remote_populated_wins() {
        let remote = json!(["alice"]);
        let out = OWNERS.reconcile(Some(&json!([])), Some(&json!([])), Some(&remote));
        assert_eq!(out, Some(remote));
    }

    #[test]
    fn test_explicit_empty_is_preserved() {
        assert_eq!(OWNERS.reconcile(None, Some(&json!([])), None), Some(json!([])));
        assert_eq!(
            OWNERS.reconcile(None, Some(&json!([])), Some(&json!([]))),
            Some(json!([]))
        );
        assert_eq!(DESCRIPTION.reconcile(None, Some(&json!("")), None), Some(json!("")));
        assert_eq!(LABELS.reconcile(None, Some(&json!({})), None), Some(json!({})));
    }

    #[test]
    fn test_clear_stays_absent() {
        let out = OWNERS.reconcile(Some(&json!(["alice"])), None, Some(&json!([])));
        assert_eq!(out, None);
        let out = DESCRIPTION.reconcile(Some(&json!("old")), Some(&Value::Null), None);
        assert_eq!(out, None);
    }

    #[test]
    fn test_submitted_value_stands_in_for_missing_echo() {
        let tag = json!("main");
        assert_eq!(DESCRIPTION.reconcile(None, Some(&tag), Some(&tag)), Some(tag.clone()));
        let next = json!("release");
        assert_eq!(
            DESCRIPTION.reconcile(Some(&tag), Some(&next), Some(&next)),
            Some(next.clone())
        );
        // without any remote value a populated request is not trusted
        assert_eq!(DESCRIPTION.reconcile(Some(&tag), Some(&next), None), None);
    }

    #[test]
    fn test_never_set_stays_absent() {
        assert_eq!(LABELS.reconcile(None, None, None), None);
        assert_eq!(LABELS.reconcile(Some(&json!({})), None, None), None);
    }

    #[test]
    fn test_sentinel_never_absent() {
        assert_eq!(MATURITY.reconcile(None, None, None), Some(json!("unspecified")));
        assert_eq!(
            MATURITY.reconcile(None, None, Some(&json!(""))),
            Some(json!("unspecified"))
        );
        assert_eq!(
            MATURITY.reconcile(None, None, Some(&json!("production"))),
            Some(json!("production"))
        );
    }

    #[test]
    fn test_update_value() {
        // desired value is sent as is, empty included
        assert_eq!(OWNERS.update_value(None, Some(&json!([]))), Some(json!([])));
        assert_eq!(OWNERS.update_value(None, Some(&json!(["a"]))), Some(json!(["a"])));
        // clearing a previously set value sends the zero value
        assert_eq!(OWNERS.update_value(Some(&json!(["a"])), None), Some(json!([])));
        assert_eq!(LABELS.update_value(Some(&json!({})), None), Some(json!({})));
        assert_eq!(DESCRIPTION.update_value(Some(&json!("d")), None), Some(json!("")));
        // nothing to clear
        assert_eq!(DESCRIPTION.update_value(None, None), None);
        // enumerated attributes are reset to their sentinel
        assert_eq!(
            MATURITY.update_value(Some(&json!("production")), None),
            Some(json!("unspecified"))
        );
        assert_eq!(MATURITY.update_value(Some(&json!("unspecified")), None), None);
    }

    #[test]
    fn test_create_value_omits_zero_values() {
        assert_eq!(OWNERS.create_value(Some(&json!([]))), None);
        assert_eq!(OWNERS.create_value(None), None);
        assert_eq!(OWNERS.create_value(Some(&json!(["a"]))), Some(json!(["a"])));
        assert_eq!(DESCRIPTION.create_value(Some(&json!(""))), None);
    }

    #[test]
    fn test_create_value_sends_sentinel_default() {
        assert_eq!(MATURITY.create_value(None), Some(json!("unspecified")));
        assert_eq!(MATURITY.create_value(Some(&Value::Null)), Some(json!("unspecified")));
        assert_eq!(MATURITY.create_value(Some(&json!(""))), Some(json!("unspecified")));
        assert_eq!(MATURITY.create_value(Some(&json!("production"))), Some(json!("production")));
    }

    #[test]
    fn test_reconcile_into() {
        let mut target = Map::new();
        let attrs = [OWNERS, DESCRIPTION, MATURITY];
        reconcile_into(
            &mut target,
            &attrs,
            &json!({"description": "old"}),
            &json!({"user_owners": []}),
            &json!({"key": "app1"}),
        );
        assert_eq!(target["user_owners"], json!([]));
        assert_eq!(target["description"], Value::Null);
        assert_eq!(target["maturity_level"], json!("unspecified"));
    }
}
