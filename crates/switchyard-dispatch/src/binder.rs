//! Parameter binding.
//!
//! [`bind`] resolves every declared parameter of a command against an
//! [`ArgMap`] and produces [`BoundArguments`], the value handlers read from.
//!
//! Resolution for each parameter, except the reserved cancellation parameter:
//!
//! 1. Look up the parameter's key (override name, else name), case-insensitively
//!    unless it opts into case sensitivity. A matched `null` counts as unmatched.
//! 2. If unmatched: the declared default, else `null` if optional, else
//!    [`DispatchError::MissingArgument`].
//! 3. Validate: `null` only where the type allows it, and a non-null value
//!    must already be of the declared kind. Values are never coerced.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::args::ArgMap;
use crate::error::DispatchError;
use crate::param::{ParamSpec, ValueKind};

/// Resolved parameter values, in declaration order.
///
/// Values are addressed by parameter name (not the override lookup key).
#[derive(Debug, Clone, Default)]
pub struct BoundArguments {
    values: Vec<(String, Value)>,
    cancel: CancellationToken,
}

impl BoundArguments {
    /// Creates bound arguments directly, bypassing the binder.
    pub fn new(values: Vec<(String, Value)>, cancel: CancellationToken) -> Self {
        Self { values, cancel }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns the string value, or `None` if unbound or null.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(Value::as_i64)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_f64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    /// Deserializes a bound value into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.value(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The invocation's cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Iterates `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Binds `params` of `command` against `map`.
pub fn bind(
    command: &str,
    params: &[ParamSpec],
    map: &ArgMap,
    cancel: &CancellationToken,
) -> Result<BoundArguments, DispatchError> {
    let mut values = Vec::with_capacity(params.len());

    for param in params {
        if param.is_cancellation() {
            continue;
        }

        // First non-null key in insertion order.
        let matched = map
            .iter()
            .find(|(key, value)| param.matches_key(key) && !value.is_null())
            .map(|(_, value)| value.clone());

        let value = match matched {
            Some(value) => value,
            None => match param.default_value() {
                Some(default) => default.clone(),
                None if param.is_optional() => Value::Null,
                None => {
                    return Err(DispatchError::MissingArgument {
                        command: command.to_string(),
                        param: param.name().to_string(),
                    })
                }
            },
        };

        validate(command, param, &value)?;
        tracing::trace!(command, param = param.name(), %value, "bound parameter");
        values.push((param.name().to_string(), value));
    }

    Ok(BoundArguments::new(values, cancel.clone()))
}

fn validate(command: &str, param: &ParamSpec, value: &Value) -> Result<(), DispatchError> {
    let ty = param.ty();
    let reason = match ValueKind::of(value) {
        None if ty.allows_null() => return Ok(()),
        None => format!("null is not allowed for a {} parameter", ty.kind),
        Some(_) if ty.kind.accepts(value) => return Ok(()),
        Some(actual) => format!("expected {}, got {}", ty.kind, actual),
    };

    Err(DispatchError::InvalidArgument {
        command: command.to_string(),
        param: param.name().to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> ArgMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn bind_one(param: ParamSpec, args: ArgMap) -> Result<BoundArguments, DispatchError> {
        bind("cmd", &[param], &args, &CancellationToken::new())
    }

    #[test]
    fn test_case_insensitive_match() {
        let bound = bind_one(ParamSpec::string("name"), map(&[("Name", json!("John"))])).unwrap();
        assert_eq!(bound.str("name"), Some("John"));
    }

    #[test]
    fn test_case_sensitive_miss_uses_default() {
        let param = ParamSpec::string("name").case_sensitive().default("anon");
        let bound = bind_one(param, map(&[("Name", json!("John"))])).unwrap();
        assert_eq!(bound.str("name"), Some("anon"));
    }

    #[test]
    fn test_override_name() {
        let param = ParamSpec::string("user").named("login");
        let bound = bind_one(param, map(&[("LOGIN", json!("ada"))])).unwrap();
        assert_eq!(bound.str("user"), Some("ada"));
    }

    #[test]
    fn test_default_when_absent() {
        let bound = bind_one(ParamSpec::integer("count").default(10), ArgMap::new()).unwrap();
        assert_eq!(bound.i64("count"), Some(10));
    }

    #[test]
    fn test_matched_null_falls_back_to_default() {
        let param = ParamSpec::integer("count").default(10);
        let bound = bind_one(param, map(&[("count", Value::Null)])).unwrap();
        assert_eq!(bound.i64("count"), Some(10));
    }

    #[test]
    fn test_optional_binds_null() {
        let bound = bind_one(ParamSpec::string("note").optional(), ArgMap::new()).unwrap();
        assert_eq!(bound.value("note"), Some(&Value::Null));
        assert_eq!(bound.str("note"), None);
    }

    #[test]
    fn test_optional_value_kind_rejects_null() {
        let err = bind_one(ParamSpec::integer("n").optional(), ArgMap::new()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument { .. }));
    }

    #[test]
    fn test_optional_nullable_value_kind() {
        let bound = bind_one(ParamSpec::integer("n").optional().nullable(), ArgMap::new()).unwrap();
        assert_eq!(bound.value("n"), Some(&Value::Null));
    }

    #[test]
    fn test_missing_required() {
        let err = bind_one(ParamSpec::integer("id"), ArgMap::new()).unwrap_err();
        match err {
            DispatchError::MissingArgument { command, param } => {
                assert_eq!(command, "cmd");
                assert_eq!(param, "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_coercion() {
        let err = bind_one(ParamSpec::integer("count"), map(&[("count", json!("10"))])).unwrap_err();
        assert!(err.to_string().contains("expected integer, got string"));
    }

    #[test]
    fn test_cancellation_param_is_not_looked_up() {
        let cancel = CancellationToken::new();
        let params = [ParamSpec::cancellation("ct"), ParamSpec::string("name")];
        let bound = bind("cmd", &params, &map(&[("name", json!("x"))]), &cancel).unwrap();

        assert_eq!(bound.len(), 1);
        cancel.cancel();
        assert!(bound.cancellation().is_cancelled());
    }

    #[test]
    fn test_declaration_order_and_get() {
        #[derive(serde::Deserialize, PartialEq, Debug)]
        struct Point {
            x: i64,
            y: i64,
        }

        let params = [
            ParamSpec::new("point", ValueKind::Object),
            ParamSpec::bool("verbose").default(false),
        ];
        let bound = bind(
            "cmd",
            &params,
            &map(&[("point", json!({"x": 1, "y": 2}))]),
            &CancellationToken::new(),
        )
        .unwrap();

        let names: Vec<&str> = bound.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["point", "verbose"]);
        assert_eq!(bound.get::<Point>("point"), Some(Point { x: 1, y: 2 }));
        assert_eq!(bound.bool("verbose"), Some(false));
    }

    #[test]
    fn test_first_inserted_key_wins() {
        let args = map(&[("name", json!("first")), ("NAME", json!("second"))]);
        let bound = bind_one(ParamSpec::string("name"), args).unwrap();
        assert_eq!(bound.str("name"), Some("first"));

        let args = map(&[("NAME", json!("first")), ("name", json!("second"))]);
        let bound = bind_one(ParamSpec::string("name"), args).unwrap();
        assert_eq!(bound.str("name"), Some("first"));
    }
}
