//! # Switchyard - Multi-Command CLI Applications
//!
//! Switchyard routes an invocation like `myapp create John` to the handler
//! that declared `create`, binds `John` to that handler's parameters and runs
//! it through a chain of interceptors, producing an exit code.
//!
//! - Commands are declared in independently registered modules
//! - Aliases are unique across all modules, case-insensitively
//! - Optimized initialization scans modules only for the invoked alias
//! - Arguments bind positionally or through per-command argument builders
//! - Interceptors (middleware) wrap both commands and help
//! - A default help renderer lists commands by group
//! - At most one app runs per process
//!
//! This crate is the application layer. The routing, binding and pipeline
//! core lives in [`switchyard_dispatch`], re-exported here.
//!
//! ## Quick Start
//!
//! ```rust
//! use switchyard::cli::App;
//! use switchyard::{ArgMap, ArgsBuilder, CommandDescriptor, Module, ParamSpec};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Users;
//!
//! struct CreateArgs;
//!
//! impl ArgsBuilder for CreateArgs {
//!     fn build(&self, args: &[String]) -> anyhow::Result<ArgMap> {
//!         let mut map = ArgMap::new();
//!         map.insert("Name".into(), json!(args.get(1).cloned().unwrap_or_default()));
//!         Ok(map)
//!     }
//! }
//!
//! let users = Module::new("users").command(
//!     CommandDescriptor::sync(["create"])
//!         .description("Creates a user")
//!         .example("create <name>")
//!         .args_builder::<CreateArgs>()
//!         .param(ParamSpec::string("name"))
//!         .handler(|_users: &Users, args| {
//!             assert_eq!(args.str("name"), Some("John"));
//!             Ok(0)
//!         }),
//! );
//!
//! let app = App::builder()
//!     .args(["create", "John"])
//!     .optimized_initialization(true)
//!     .service(Users::default())
//!     .service(CreateArgs)
//!     .module(users)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(app.run_blocking().unwrap(), 0);
//! ```
//!
//! ## Logging
//!
//! Discovery, routing and run outcomes are reported through `tracing`.
//! [`setup::init_tracing`] installs a stderr subscriber honoring `RUST_LOG`.

pub mod cli;
pub mod setup;

pub use setup::{init_tracing, SetupError};

pub use switchyard_dispatch::{
    async_trait, bind, fold_case, positional_args, ActiveGuard, AfterFn, ArgMap, ArgsBuilder,
    ArgsBuilderAsync, BeforeFn, BoundArguments, BuilderRef, CancellationToken, ClassKey,
    CommandDescriptor, CommandInfo, CommandProvider, DiscoveryOptions, DispatchError,
    DuplicateScope, Engine, EngineBuilder, ExecutionMode, HelpCommand, HelpCommandAsync,
    HelpConfig, HelpManifest, HelpRenderer, HookError, HookPhase, Hooks, Instance, Interceptor,
    InvocationContext, Module, Next, ParamSpec, ParamType, PartialProvider, ProviderParts,
    Resolver, RoutingBuilder, RoutingTable, Routes, Services, ValueKind, DEFAULT_HELP_TRIGGERS,
};
