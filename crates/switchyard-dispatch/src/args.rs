//! Argument map construction.
//!
//! Before a handler runs, the raw argument vector is turned into an
//! [`ArgMap`]: a map from parameter names to JSON values. By default this is
//! positional (see [`positional_args`]). A command may instead declare its own
//! builder, either [`ArgsBuilder`] or [`ArgsBuilderAsync`].
//!
//! `args[0]` is always the command alias. Builders see the full vector and
//! decide for themselves what to skip.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::param::ParamSpec;

/// Parameter name to argument value.
///
/// Keys keep insertion order, so when several keys address the same
/// parameter the first one inserted wins.
pub type ArgMap = Map<String, Value>;

/// Builds an argument map synchronously.
///
/// # Example
///
/// ```rust
/// use switchyard_dispatch::{ArgMap, ArgsBuilder};
/// use serde_json::json;
///
/// struct NameBuilder;
///
/// impl ArgsBuilder for NameBuilder {
///     fn build(&self, args: &[String]) -> anyhow::Result<ArgMap> {
///         let mut map = ArgMap::new();
///         map.insert("Name".into(), json!(args.get(1).cloned().unwrap_or_default()));
///         Ok(map)
///     }
/// }
/// ```
pub trait ArgsBuilder: Send + Sync {
    fn build(&self, args: &[String]) -> anyhow::Result<ArgMap>;
}

/// Builds an argument map, possibly suspending.
///
/// The cancellation token is the one the invocation runs under.
#[async_trait]
pub trait ArgsBuilderAsync: Send + Sync {
    async fn build(&self, args: &[String], cancel: &CancellationToken) -> anyhow::Result<ArgMap>;
}

/// Maps `args[1..]` onto the non-cancellation parameters in declaration order.
///
/// Each value is a JSON string keyed by the parameter's lookup key. Surplus
/// arguments are ignored; missing ones are simply absent from the map.
pub fn positional_args(params: &[ParamSpec], args: &[String]) -> ArgMap {
    params
        .iter()
        .filter(|p| !p.is_cancellation())
        .zip(args.iter().skip(1))
        .map(|(param, arg)| (param.lookup_key().to_string(), Value::String(arg.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_skips_alias() {
        let params = vec![ParamSpec::string("name"), ParamSpec::string("city")];
        let map = positional_args(&params, &argv(&["greet", "Ada", "London"]));

        assert_eq!(map.get("name"), Some(&json!("Ada")));
        assert_eq!(map.get("city"), Some(&json!("London")));
    }

    #[test]
    fn test_positional_skips_cancellation_param() {
        let params = vec![
            ParamSpec::cancellation("ct"),
            ParamSpec::string("name"),
        ];
        let map = positional_args(&params, &argv(&["greet", "Ada"]));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("name"), Some(&json!("Ada")));
    }

    #[test]
    fn test_positional_uses_lookup_key() {
        let params = vec![ParamSpec::string("name").named("UserName")];
        let map = positional_args(&params, &argv(&["greet", "Ada"]));
        assert!(map.contains_key("UserName"));
    }

    #[test]
    fn test_positional_short_and_long_vectors() {
        let params = vec![ParamSpec::string("a"), ParamSpec::string("b")];

        let map = positional_args(&params, &argv(&["cmd", "1"]));
        assert_eq!(map.len(), 1);

        let map = positional_args(&params, &argv(&["cmd", "1", "2", "3"]));
        assert_eq!(map.len(), 2);

        let map = positional_args(&params, &argv(&["cmd"]));
        assert!(map.is_empty());
    }

    #[test]
    fn test_values_are_never_coerced() {
        let params = vec![ParamSpec::integer("count")];
        let map = positional_args(&params, &argv(&["cmd", "10"]));
        assert_eq!(map.get("count"), Some(&json!("10")));
    }
}
