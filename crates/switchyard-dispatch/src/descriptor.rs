//! Command descriptors.
//!
//! A [`CommandDescriptor`] is the static metadata for one command: the aliases
//! it answers to, its help text, how it is executed and which handler runs it.
//! Descriptors are declared with builder calls and handed to the routing
//! builder by a [`CommandProvider`](crate::CommandProvider).
//!
//! # Declaring commands
//!
//! The constructor picks the declared execution mode, the handler method
//! attaches the handler. The two must agree, otherwise the routing builder
//! rejects the descriptor with [`DispatchError::DescriptorInvalid`].
//!
//! ```rust
//! use switchyard_dispatch::{CommandDescriptor, ParamSpec};
//!
//! struct Greeter;
//!
//! let hello = CommandDescriptor::sync(["hello", "hi"])
//!     .description("Greets someone")
//!     .example("hello <name>")
//!     .param(ParamSpec::string("name").default("World"))
//!     .handler(|_g: &Greeter, args| {
//!         println!("Hello, {}!", args.str("name").unwrap_or_default());
//!         Ok(0)
//!     });
//!
//! assert_eq!(hello.aliases(), ["hello", "hi"]);
//! ```
//!
//! The handler's first argument is an instance of its declaring class, obtained
//! from the [`Resolver`](crate::Resolver) when the command runs.

use futures::future::BoxFuture;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::args::{ArgMap, ArgsBuilder, ArgsBuilderAsync};
use crate::binder::BoundArguments;
use crate::error::DispatchError;
use crate::help::CommandInfo;
use crate::param::ParamSpec;
use crate::resolver::{downcast_instance, Instance};

/// Case folding shared by alias lookup, help triggers and parameter keys.
///
/// Full Unicode lowercasing, so `ÉTAT` and `état` are the same alias.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Identifies a handler or builder type for the resolver.
#[derive(Clone, Copy)]
pub struct ClassKey {
    id: TypeId,
    name: &'static str,
}

impl ClassKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ClassKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassKey {}

impl std::hash::Hash for ClassKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How a command's handler is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Returns its status code immediately.
    Sync,
    /// Returns a future that resolves to the status code.
    Suspending,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sync => write!(f, "sync"),
            ExecutionMode::Suspending => write!(f, "suspending"),
        }
    }
}

pub(crate) type SyncHandlerFn =
    Arc<dyn Fn(&Instance, &BoundArguments) -> Result<i32, DispatchError> + Send + Sync>;

pub(crate) type AsyncHandlerFn = Arc<
    dyn Fn(Instance, BoundArguments) -> BoxFuture<'static, Result<i32, DispatchError>>
        + Send
        + Sync,
>;

/// Type-erased handler reference.
#[derive(Clone)]
pub(crate) enum HandlerFn {
    Sync(SyncHandlerFn),
    Suspending(AsyncHandlerFn),
}

impl HandlerFn {
    fn mode(&self) -> ExecutionMode {
        match self {
            HandlerFn::Sync(_) => ExecutionMode::Sync,
            HandlerFn::Suspending(_) => ExecutionMode::Suspending,
        }
    }
}

pub(crate) type SyncBuildFn =
    Arc<dyn Fn(&Instance, &[String], &str) -> Result<ArgMap, DispatchError> + Send + Sync>;

pub(crate) type AsyncBuildFn = Arc<
    dyn Fn(
            Instance,
            Vec<String>,
            CancellationToken,
            String,
        ) -> BoxFuture<'static, Result<ArgMap, DispatchError>>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub(crate) enum BuildFn {
    Sync(SyncBuildFn),
    Suspending(AsyncBuildFn),
}

/// Reference to the argument builder declared for a command.
///
/// Holds the builder's [`ClassKey`] for resolution plus the calling
/// convention captured at registration time.
#[derive(Clone)]
pub struct BuilderRef {
    class: ClassKey,
    pub(crate) build: BuildFn,
}

impl BuilderRef {
    pub fn class(&self) -> ClassKey {
        self.class
    }

    pub fn mode(&self) -> ExecutionMode {
        match self.build {
            BuildFn::Sync(_) => ExecutionMode::Sync,
            BuildFn::Suspending(_) => ExecutionMode::Suspending,
        }
    }
}

impl fmt::Debug for BuilderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderRef")
            .field("class", &self.class)
            .field("mode", &self.mode())
            .finish()
    }
}

/// Static metadata describing one command.
#[derive(Clone)]
pub struct CommandDescriptor {
    aliases: Vec<String>,
    description: String,
    example: String,
    hidden: bool,
    group: Option<String>,
    order: i32,
    mode: ExecutionMode,
    builder: Option<BuilderRef>,
    class: Option<ClassKey>,
    pub(crate) handler: Option<HandlerFn>,
    params: Vec<ParamSpec>,
}

impl CommandDescriptor {
    fn with_mode<I, S>(aliases: I, mode: ExecutionMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            description: String::new(),
            example: String::new(),
            hidden: false,
            group: None,
            order: 0,
            mode,
            builder: None,
            class: None,
            handler: None,
            params: Vec::new(),
        }
    }

    /// Declares a command whose handler returns its status code directly.
    pub fn sync<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(aliases, ExecutionMode::Sync)
    }

    /// Declares a command whose handler is awaited.
    pub fn suspending<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(aliases, ExecutionMode::Suspending)
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    pub fn example(mut self, text: impl Into<String>) -> Self {
        self.example = text.into();
        self
    }

    /// Excludes the command from help. It still routes.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the help sort key. Ties are broken by example text.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Appends a parameter. Positional binding follows declaration order.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Uses a synchronous argument builder instead of positional mapping.
    ///
    /// The builder instance is obtained from the resolver at run time.
    pub fn args_builder<B>(mut self) -> Self
    where
        B: ArgsBuilder + 'static,
    {
        let build: SyncBuildFn = Arc::new(|instance: &Instance, args: &[String], command: &str| {
            let builder = downcast_instance::<B>(instance.clone())?;
            builder
                .build(args)
                .map_err(|source| DispatchError::ArgsBuilder {
                    command: command.to_string(),
                    source,
                })
        });
        self.builder = Some(BuilderRef {
            class: ClassKey::of::<B>(),
            build: BuildFn::Sync(build),
        });
        self
    }

    /// Uses a suspending argument builder instead of positional mapping.
    pub fn args_builder_async<B>(mut self) -> Self
    where
        B: ArgsBuilderAsync + 'static,
    {
        let build: AsyncBuildFn = Arc::new(
            |instance: Instance,
             args: Vec<String>,
             cancel: CancellationToken,
             command: String|
             -> BoxFuture<'static, Result<ArgMap, DispatchError>> {
                Box::pin(async move {
                    let builder = downcast_instance::<B>(instance)?;
                    builder
                        .build(&args, &cancel)
                        .await
                        .map_err(|source| DispatchError::ArgsBuilder { command, source })
                })
            },
        );
        self.builder = Some(BuilderRef {
            class: ClassKey::of::<B>(),
            build: BuildFn::Suspending(build),
        });
        self
    }

    /// Attaches a synchronous handler declared on class `H`.
    pub fn handler<H, F>(mut self, f: F) -> Self
    where
        H: Send + Sync + 'static,
        F: Fn(&H, &BoundArguments) -> anyhow::Result<i32> + Send + Sync + 'static,
    {
        let handler: SyncHandlerFn = Arc::new(move |instance: &Instance, args: &BoundArguments| {
            let target = downcast_instance::<H>(instance.clone())?;
            f(target.as_ref(), args).map_err(DispatchError::Handler)
        });
        self.class = Some(ClassKey::of::<H>());
        self.handler = Some(HandlerFn::Sync(handler));
        self
    }

    /// Attaches a suspending handler declared on class `H`.
    pub fn handler_async<H, F, Fut>(mut self, f: F) -> Self
    where
        H: Send + Sync + 'static,
        F: Fn(Arc<H>, BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<i32>> + Send + 'static,
    {
        let f = Arc::new(f);
        let handler: AsyncHandlerFn = Arc::new(
            move |instance: Instance,
                  args: BoundArguments|
                  -> BoxFuture<'static, Result<i32, DispatchError>> {
                let f = Arc::clone(&f);
                Box::pin(async move {
                    let target = downcast_instance::<H>(instance)?;
                    f(target, args).await.map_err(DispatchError::Handler)
                })
            },
        );
        self.class = Some(ClassKey::of::<H>());
        self.handler = Some(HandlerFn::Suspending(handler));
        self
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The first alias, used to name the command in messages.
    pub fn name(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or("")
    }

    /// Returns true if the command answers to `alias` (case-insensitive).
    pub fn answers_to(&self, alias: &str) -> bool {
        let wanted = fold_case(alias);
        self.aliases.iter().any(|a| fold_case(a) == wanted)
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn get_example(&self) -> &str {
        &self.example
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn get_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn get_order(&self) -> i32 {
        self.order
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn builder(&self) -> Option<&BuilderRef> {
        self.builder.as_ref()
    }

    /// The declaring handler class, once a handler is attached.
    pub fn class(&self) -> Option<ClassKey> {
        self.class
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Projects the descriptor onto its help entry.
    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            aliases: self.aliases.clone(),
            description: self.description.clone(),
            example: self.example.clone(),
            group: self.group.clone(),
            order: self.order,
        }
    }

    /// Checks the declaration before it is accepted into a routing table.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let name = self.name();
        let invalid = |reason: String| Err(DispatchError::invalid_descriptor(name, reason));

        if self.aliases.is_empty() {
            return invalid("no aliases declared".to_string());
        }
        if self.aliases.iter().any(|a| a.trim().is_empty()) {
            return invalid("blank alias".to_string());
        }

        match &self.handler {
            None => return invalid("no handler attached".to_string()),
            Some(handler) if handler.mode() != self.mode => {
                return invalid(format!(
                    "declared {} but the handler is {}",
                    self.mode,
                    handler.mode()
                ));
            }
            Some(_) => {}
        }

        let mut seen: Vec<&ParamSpec> = Vec::new();
        for param in self.params.iter().filter(|p| !p.is_cancellation()) {
            if seen.iter().any(|other| {
                param.matches_key(other.lookup_key()) || other.matches_key(param.lookup_key())
            }) {
                return invalid(format!(
                    "parameter key '{}' declared more than once",
                    param.lookup_key()
                ));
            }
            seen.push(param);

            if let Some(default) = param.default_value() {
                let ty = param.ty();
                let fits = match default {
                    Value::Null => ty.allows_null(),
                    other => ty.kind.accepts(other),
                };
                if !fits {
                    return invalid(format!(
                        "default for parameter '{}' is not a {}",
                        param.name(),
                        ty.kind
                    ));
                }
            }
        }

        if self.params.iter().filter(|p| p.is_cancellation()).count() > 1 {
            return invalid("more than one cancellation parameter".to_string());
        }

        Ok(())
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("example", &self.example)
            .field("hidden", &self.hidden)
            .field("group", &self.group)
            .field("order", &self.order)
            .field("mode", &self.mode)
            .field("builder", &self.builder)
            .field("class", &self.class)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Target;

    fn ok_handler(d: CommandDescriptor) -> CommandDescriptor {
        d.handler(|_t: &Target, _args| Ok(0))
    }

    #[test]
    fn test_valid_descriptor() {
        let d = ok_handler(CommandDescriptor::sync(["run"]).param(ParamSpec::string("name")));
        assert!(d.validate().is_ok());
        assert_eq!(d.class(), Some(ClassKey::of::<Target>()));
        assert_eq!(d.mode(), ExecutionMode::Sync);
    }

    #[test]
    fn test_mode_mismatch_is_invalid() {
        let d = ok_handler(CommandDescriptor::suspending(["run"]));
        let err = d.validate().unwrap_err();
        assert!(matches!(err, DispatchError::DescriptorInvalid { .. }));
        assert!(err.to_string().contains("declared suspending"));
    }

    #[test]
    fn test_missing_handler_is_invalid() {
        let d = CommandDescriptor::sync(["run"]);
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_blank_alias_is_invalid() {
        let d = ok_handler(CommandDescriptor::sync(["run", " "]));
        assert!(d.validate().is_err());

        let d = ok_handler(CommandDescriptor::sync(Vec::<String>::new()));
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_duplicate_param_keys_are_invalid() {
        let d = ok_handler(
            CommandDescriptor::sync(["run"])
                .param(ParamSpec::string("name"))
                .param(ParamSpec::string("other").named("NAME")),
        );
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_incompatible_default_is_invalid() {
        let d = ok_handler(
            CommandDescriptor::sync(["run"]).param(ParamSpec::integer("count").default("ten")),
        );
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("not a integer"));
    }

    #[test]
    fn test_two_cancellation_params_are_invalid() {
        let d = ok_handler(
            CommandDescriptor::sync(["run"])
                .param(ParamSpec::cancellation("a"))
                .param(ParamSpec::cancellation("b")),
        );
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_answers_to_is_case_insensitive() {
        let d = ok_handler(CommandDescriptor::sync(["Create", "new"]));
        assert!(d.answers_to("create"));
        assert!(d.answers_to("NEW"));
        assert!(!d.answers_to("delete"));
        assert_eq!(d.name(), "Create");
    }

    #[test]
    fn test_info_projection() {
        let d = ok_handler(
            CommandDescriptor::sync(["ls"])
                .description("List")
                .example("ls [dir]")
                .group("Files")
                .order(3),
        );
        let info = d.info();
        assert_eq!(info.aliases, vec!["ls"]);
        assert_eq!(info.group.as_deref(), Some("Files"));
        assert_eq!(info.order, 3);
    }
}
