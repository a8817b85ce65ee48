//! Parameter declarations.
//!
//! A handler declares its parameters as an ordered list of [`ParamSpec`]s.
//! Each spec carries an explicit type tag ([`ParamType`]) that the binder
//! checks against the kind of the bound [`serde_json::Value`]. Nothing is
//! ever converted: a `"10"` string does not satisfy an integer parameter.

use serde_json::Value;
use std::fmt;

use crate::descriptor::fold_case;

/// Kind of value a parameter accepts.
///
/// `Integer`, `Float` and `Bool` are value kinds: unless the parameter is
/// marked nullable, a null value is rejected for them. `String`, `Array`,
/// `Object` and `Any` are reference kinds and accept null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Bool,
    Array,
    Object,
    /// Accepts any non-null value.
    Any,
}

impl ValueKind {
    /// Returns true for kinds that reject null unless declared nullable.
    pub fn is_value_kind(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float | ValueKind::Bool)
    }

    /// Returns the kind tag of a JSON value, or `None` for null.
    pub fn of(value: &Value) -> Option<ValueKind> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Number(n) if n.is_f64() => Some(ValueKind::Float),
            Value::Number(_) => Some(ValueKind::Integer),
            Value::String(_) => Some(ValueKind::String),
            Value::Array(_) => Some(ValueKind::Array),
            Value::Object(_) => Some(ValueKind::Object),
        }
    }

    /// Returns true if a non-null value is an instance of this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, ValueKind::of(value)) {
            (_, None) => false,
            (ValueKind::Any, Some(_)) => true,
            (expected, Some(actual)) => expected == actual,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// Type tag of a parameter: its kind plus nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamType {
    pub kind: ValueKind,
    pub nullable: bool,
}

impl ParamType {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Returns true if null may be bound to this parameter.
    pub fn allows_null(&self) -> bool {
        self.nullable || !self.kind.is_value_kind()
    }
}

/// Declaration of one handler parameter.
///
/// # Example
///
/// ```rust
/// use switchyard_dispatch::{ParamSpec, ValueKind};
///
/// let name = ParamSpec::string("name").named("Name");
/// let count = ParamSpec::integer("count").default(10);
/// let token = ParamSpec::cancellation("ct");
///
/// assert_eq!(name.lookup_key(), "Name");
/// assert_eq!(count.ty().kind, ValueKind::Integer);
/// assert!(token.is_cancellation());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    override_name: Option<String>,
    case_sensitive: bool,
    ty: ParamType,
    default: Option<Value>,
    optional: bool,
    cancellation: bool,
}

impl ParamSpec {
    /// Creates a required parameter of the given kind.
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            override_name: None,
            case_sensitive: false,
            ty: ParamType::new(kind),
            default: None,
            optional: false,
            cancellation: false,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Float)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Bool)
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Any)
    }

    /// Declares the reserved cancellation parameter.
    ///
    /// It is always filled from the invocation's cancellation token and never
    /// looked up in the argument map.
    pub fn cancellation(name: impl Into<String>) -> Self {
        Self {
            cancellation: true,
            ..Self::new(name, ValueKind::Any)
        }
    }

    /// Looks the value up under `name` instead of the parameter's own name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.override_name = Some(name.into());
        self
    }

    /// Matches the lookup key exactly instead of case-insensitively.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Sets the value used when no argument matches.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Binds null when no argument matches and there is no default.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Allows null for a value kind.
    pub fn nullable(mut self) -> Self {
        self.ty.nullable = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key the binder looks for: the override name if any, else the name.
    pub fn lookup_key(&self) -> &str {
        self.override_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn ty(&self) -> ParamType {
        self.ty
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_cancellation(&self) -> bool {
        self.cancellation
    }

    /// Returns true if `key` addresses this parameter.
    pub fn matches_key(&self, key: &str) -> bool {
        if self.case_sensitive {
            key == self.lookup_key()
        } else {
            fold_case(key) == fold_case(self.lookup_key())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_of_json_values() {
        assert_eq!(ValueKind::of(&json!(null)), None);
        assert_eq!(ValueKind::of(&json!("x")), Some(ValueKind::String));
        assert_eq!(ValueKind::of(&json!(10)), Some(ValueKind::Integer));
        assert_eq!(ValueKind::of(&json!(1.5)), Some(ValueKind::Float));
        assert_eq!(ValueKind::of(&json!(true)), Some(ValueKind::Bool));
        assert_eq!(ValueKind::of(&json!([1])), Some(ValueKind::Array));
        assert_eq!(ValueKind::of(&json!({"a": 1})), Some(ValueKind::Object));
    }

    #[test]
    fn test_accepts_without_coercion() {
        assert!(ValueKind::Integer.accepts(&json!(10)));
        assert!(!ValueKind::Integer.accepts(&json!("10")));
        assert!(!ValueKind::Float.accepts(&json!(10)));
        assert!(ValueKind::Any.accepts(&json!("anything")));
        assert!(!ValueKind::Any.accepts(&json!(null)));
    }

    #[test]
    fn test_null_rules() {
        assert!(!ParamType::new(ValueKind::Integer).allows_null());
        assert!(ParamSpec::integer("n").nullable().ty().allows_null());
        assert!(ParamType::new(ValueKind::Object).allows_null());
        assert!(ParamType::new(ValueKind::String).allows_null());
    }

    #[test]
    fn test_lookup_key_matching() {
        let p = ParamSpec::string("name");
        assert!(p.matches_key("NAME"));

        let p = ParamSpec::string("name").named("Name").case_sensitive();
        assert!(p.matches_key("Name"));
        assert!(!p.matches_key("name"));

        let p = ParamSpec::string("straße");
        assert!(p.matches_key("STRAßE"));
        assert!(ParamSpec::string("élan").matches_key("ÉLAN"));
    }
}
