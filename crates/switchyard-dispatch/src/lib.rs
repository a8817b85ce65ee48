//! Command routing, argument binding and interceptor pipeline for
//! multi-command CLIs.
//!
//! `switchyard-dispatch` turns command declarations spread over independently
//! registered modules into a routing table, binds raw arguments to typed
//! handler parameters and runs the handler through an interceptor pipeline,
//! producing an exit code. It has no opinion on output: handlers print what
//! they like.
//!
//! # Features
//!
//! - **Routing**: full or narrow ("optimized") discovery with alias collision
//!   detection
//! - **Binding**: positional or custom argument builders, defaults, optional
//!   and nullable parameters, strict kind checks with no coercion
//! - **Pipeline**: ordered async interceptors around both the command and the
//!   help path, plus a ready-made [`Hooks`] interceptor
//! - **Single active engine**: at most one engine runs per process
//!
//! # Flow
//!
//! ```text
//! providers ─► RoutingBuilder ─► RoutingTable + HelpManifest
//!                                        │
//! args ─► help policy ─┬─ help ──────────┴─────────────► pipeline ─► renderer
//!                      └─ command ─► ArgMap ─► bind ───► pipeline ─► handler
//! ```
//!
//! The `switchyard` crate wraps this in an `App` with a default help renderer
//! and tracing setup.

mod args;
mod binder;
mod context;
mod descriptor;
mod engine;
mod error;
mod guard;
mod help;
mod hooks;
mod param;
mod pipeline;
mod provider;
mod resolver;
mod routing;

pub use args::{positional_args, ArgMap, ArgsBuilder, ArgsBuilderAsync};

pub use binder::{bind, BoundArguments};

pub use context::InvocationContext;

pub use descriptor::{fold_case, BuilderRef, ClassKey, CommandDescriptor, ExecutionMode};

pub use engine::{Engine, EngineBuilder};

pub use error::DispatchError;

pub use guard::ActiveGuard;

pub use help::{
    CommandInfo, HelpCommand, HelpCommandAsync, HelpConfig, HelpManifest, HelpRenderer,
    DEFAULT_HELP_TRIGGERS,
};

pub use hooks::{AfterFn, BeforeFn, HookError, HookPhase, Hooks};

pub use param::{ParamSpec, ParamType, ValueKind};

pub use pipeline::{Interceptor, Next};

pub use provider::{CommandProvider, Module, PartialProvider, ProviderParts};

pub use resolver::{Instance, Resolver, Services};

pub use routing::{DiscoveryOptions, DuplicateScope, RoutingBuilder, RoutingTable, Routes};

// Re-exported so handlers and interceptors can name them without extra dependencies.
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
