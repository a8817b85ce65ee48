//! The execution engine.
//!
//! An [`Engine`] owns a frozen routing table, the interceptor chain and the
//! resolver. Each run:
//!
//! 1. claims the process-wide [`ActiveGuard`] (`AlreadyRunning` if taken);
//! 2. picks the help path or the command path from the help-trigger policy;
//! 3. on the command path, looks up the alias, builds the argument map and
//!    binds the handler's parameters;
//! 4. drives the interceptor pipeline to the handler or the help renderer.
//!
//! The guard is released however the run ends.
//!
//! ```rust
//! use switchyard_dispatch::{CommandDescriptor, Engine, Module, ParamSpec, Services};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Greeter;
//!
//! let mut services = Services::new();
//! services.insert(Greeter);
//!
//! let engine = Engine::builder()
//!     .args(["greet", "Ada"])
//!     .optimized_initialization(true)
//!     .provider(Module::new("greetings").command(
//!         CommandDescriptor::sync(["greet"])
//!             .param(ParamSpec::string("name"))
//!             .handler(|_g: &Greeter, args| {
//!                 assert_eq!(args.str("name"), Some("Ada"));
//!                 Ok(0)
//!             }),
//!     ))
//!     .resolver(services)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(engine.run_blocking(CancellationToken::new()).unwrap(), 0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

use crate::args::{positional_args, ArgMap};
use crate::binder::bind;
use crate::context::InvocationContext;
use crate::descriptor::{BuildFn, CommandDescriptor};
use crate::error::DispatchError;
use crate::guard::{self, ActiveGuard};
use crate::help::{HelpConfig, HelpManifest, HelpRenderer};
use crate::pipeline::{Interceptor, Next, Terminal};
use crate::provider::CommandProvider;
use crate::resolver::{Resolver, Services};
use crate::routing::{DiscoveryOptions, DuplicateScope, RoutingBuilder, RoutingTable};

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Configures and builds an [`Engine`].
pub struct EngineBuilder {
    args: Vec<String>,
    providers: Vec<Arc<dyn CommandProvider>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    resolver: Option<Arc<dyn Resolver>>,
    help: HelpConfig,
    discovery: DiscoveryOptions,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            providers: Vec::new(),
            interceptors: Vec::new(),
            resolver: None,
            help: HelpConfig::default(),
            discovery: DiscoveryOptions::default(),
        }
    }

    /// Sets the argument vector, alias first (program name excluded).
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Registers a command provider. Registration order is scan order.
    pub fn provider<P: CommandProvider + 'static>(self, provider: P) -> Self {
        self.provider_arc(Arc::new(provider))
    }

    pub fn provider_arc(mut self, provider: Arc<dyn CommandProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Appends an interceptor to the pipeline.
    ///
    /// Interceptors supplied by providers are appended after these, in
    /// provider registration order.
    pub fn interceptor<I: Interceptor + 'static>(self, interceptor: I) -> Self {
        self.interceptor_arc(Arc::new(interceptor))
    }

    pub fn interceptor_arc(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Sets the resolver. Defaults to an empty [`Services`] map.
    pub fn resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn resolver_arc(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn help(mut self, help: HelpConfig) -> Self {
        self.help = help;
        self
    }

    pub fn help_renderer(mut self, renderer: HelpRenderer) -> Self {
        self.help = self.help.renderer(renderer);
        self
    }

    pub fn empty_args_means_help(mut self, yes: bool) -> Self {
        self.help = self.help.empty_args_means_help(yes);
        self
    }

    /// Scans providers only for the invoked alias when it is not a help request.
    pub fn optimized_initialization(mut self, yes: bool) -> Self {
        self.discovery.narrow = yes;
        self
    }

    pub fn duplicate_scope(mut self, scope: DuplicateScope) -> Self {
        self.discovery.duplicate_scope = scope;
        self
    }

    pub fn discovery(mut self, options: DiscoveryOptions) -> Self {
        self.discovery = options;
        self
    }

    /// Builds the routing table and freezes the engine.
    pub fn build(self) -> Result<Engine, DispatchError> {
        let routing = RoutingBuilder::new(self.discovery);
        let routes = routing.build(
            &self.providers,
            &self.help,
            self.args.first().map(String::as_str),
        )?;

        let mut interceptors = self.interceptors;
        for provider in &self.providers {
            let supplied = provider.interceptors();
            if !supplied.is_empty() {
                tracing::trace!(
                    module = provider.name(),
                    count = supplied.len(),
                    "module interceptors"
                );
            }
            interceptors.extend(supplied);
        }

        let id = NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            engine = id,
            commands = routes.table.len(),
            interceptors = interceptors.len(),
            narrowed = routes.table.narrowed_alias(),
            "engine built"
        );

        Ok(Engine {
            id,
            args: self.args,
            table: Arc::new(routes.table),
            manifest: routes.manifest.map(Arc::new),
            renderer: routes.help,
            providers: self.providers,
            interceptors,
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(Services::new())),
            help: self.help,
            routing,
            help_routes: OnceLock::new(),
        })
    }
}

/// A built, immutable dispatcher.
pub struct Engine {
    id: u64,
    args: Vec<String>,
    table: Arc<RoutingTable>,
    manifest: Option<Arc<HelpManifest>>,
    renderer: Option<HelpRenderer>,
    providers: Vec<Arc<dyn CommandProvider>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    resolver: Arc<dyn Resolver>,
    help: HelpConfig,
    routing: RoutingBuilder,
    /// Help routes assembled on first use by a narrowed engine.
    help_routes: OnceLock<(Arc<HelpManifest>, HelpRenderer)>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Process-unique id of this engine.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Id of the engine currently running in this process, if any.
    pub fn current() -> Option<u64> {
        guard::current()
    }

    /// Returns true if this engine is the one currently running.
    pub fn is_current(&self) -> bool {
        Self::current() == Some(self.id)
    }

    /// The argument vector fixed at build time.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// The help manifest, if it was assembled at build time.
    pub fn manifest(&self) -> Option<&HelpManifest> {
        self.manifest.as_deref()
    }

    /// Runs the argument vector fixed at build time.
    pub async fn run(&self, cancel: CancellationToken) -> Result<i32, DispatchError> {
        let _guard = ActiveGuard::try_acquire(self.id)?;
        let args = self.args.clone();

        let result = if self.help.is_help_request(&args) {
            self.help_path(args, cancel).await
        } else if args.is_empty() {
            Err(DispatchError::MissingCommand)
        } else {
            self.command_path(args, cancel).await
        };

        self.log_outcome(&result);
        result
    }

    /// Runs `alias` with the arguments following it.
    pub async fn run_command<I, S>(
        &self,
        alias: &str,
        args: I,
        cancel: CancellationToken,
    ) -> Result<i32, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _guard = ActiveGuard::try_acquire(self.id)?;
        let argv: Vec<String> = std::iter::once(alias.to_string())
            .chain(args.into_iter().map(Into::into))
            .collect();

        let result = self.command_path(argv, cancel).await;
        self.log_outcome(&result);
        result
    }

    /// Runs the help path directly.
    ///
    /// A narrowed engine has no manifest, so the first help run performs a
    /// full discovery and keeps the result. Errors of that discovery
    /// (`DuplicateCommand`, `DescriptorInvalid`, `HelpNotConfigured`) are
    /// returned from the run and are not cached.
    pub async fn run_help<I, S>(&self, args: I, cancel: CancellationToken) -> Result<i32, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _guard = ActiveGuard::try_acquire(self.id)?;
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();

        let result = self.help_path(argv, cancel).await;
        self.log_outcome(&result);
        result
    }

    /// Runs [`Engine::run`] to completion on the current thread.
    pub fn run_blocking(&self, cancel: CancellationToken) -> Result<i32, DispatchError> {
        futures::executor::block_on(self.run(cancel))
    }

    async fn command_path(
        &self,
        args: Vec<String>,
        cancel: CancellationToken,
    ) -> Result<i32, DispatchError> {
        let alias = args.first().cloned().ok_or(DispatchError::MissingCommand)?;
        let descriptor = self
            .table
            .get(&alias)
            .cloned()
            .ok_or_else(|| DispatchError::CommandNotFound {
                alias: alias.clone(),
            })?;
        tracing::debug!(engine = self.id, alias = %alias, command = descriptor.name(), "command path");

        let map = self.build_args(&descriptor, &args, &cancel).await?;
        let bound = bind(descriptor.name(), descriptor.params(), &map, &cancel)?;

        let ctx = InvocationContext::command(self.id, args, Arc::clone(&descriptor), cancel);
        let terminal = Terminal::Command { descriptor, bound };
        Next::new(&self.interceptors, &terminal, self.resolver.as_ref())
            .run(&ctx)
            .await
    }

    async fn help_path(
        &self,
        args: Vec<String>,
        cancel: CancellationToken,
    ) -> Result<i32, DispatchError> {
        tracing::debug!(engine = self.id, "help path");
        let (manifest, renderer) = self.help_routes()?;

        let ctx = InvocationContext::help(self.id, args, cancel);
        let terminal = Terminal::Help { manifest, renderer };
        Next::new(&self.interceptors, &terminal, self.resolver.as_ref())
            .run(&ctx)
            .await
    }

    /// The manifest and renderer, assembling them if the table was narrowed.
    fn help_routes(&self) -> Result<(Arc<HelpManifest>, HelpRenderer), DispatchError> {
        if let (Some(manifest), Some(renderer)) = (&self.manifest, &self.renderer) {
            return Ok((Arc::clone(manifest), renderer.clone()));
        }

        if let Some((manifest, renderer)) = self.help_routes.get() {
            return Ok((Arc::clone(manifest), renderer.clone()));
        }

        tracing::debug!(engine = self.id, "assembling help routes");
        let routes = self.routing.build(&self.providers, &self.help, None)?;
        let built = match (routes.manifest, routes.help) {
            (Some(manifest), Some(renderer)) => (Arc::new(manifest), renderer),
            _ => return Err(DispatchError::HelpNotConfigured),
        };
        let (manifest, renderer) = self.help_routes.get_or_init(|| built);
        Ok((Arc::clone(manifest), renderer.clone()))
    }

    async fn build_args(
        &self,
        descriptor: &CommandDescriptor,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<ArgMap, DispatchError> {
        let Some(builder) = descriptor.builder() else {
            return Ok(positional_args(descriptor.params(), args));
        };

        let instance = self.resolver.resolve(&builder.class())?;
        match &builder.build {
            BuildFn::Sync(build) => build(&instance, args, descriptor.name()),
            BuildFn::Suspending(build) => {
                build(
                    instance,
                    args.to_vec(),
                    cancel.clone(),
                    descriptor.name().to_string(),
                )
                .await
            }
        }
    }

    fn log_outcome(&self, result: &Result<i32, DispatchError>) {
        match result {
            Ok(code) => tracing::debug!(engine = self.id, code, "run finished"),
            Err(err) => tracing::debug!(engine = self.id, error = %err, "run failed"),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("args", &self.args)
            .field("commands", &self.table.len())
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamSpec;
    use crate::provider::Module;
    use serial_test::serial;

    struct Calc;

    fn calc_module() -> Module {
        Module::new("calc").command(
            CommandDescriptor::sync(["double"])
                .param(ParamSpec::integer("n").default(21))
                .handler(|_c: &Calc, args| Ok(args.i64("n").unwrap_or(0) as i32 * 2)),
        )
    }

    fn services() -> Services {
        let mut services = Services::new();
        services.insert(Calc);
        services
    }

    #[test]
    #[serial]
    fn test_run_blocking_returns_handler_code() {
        let engine = Engine::builder()
            .args(["double"])
            .optimized_initialization(true)
            .provider(calc_module())
            .resolver(services())
            .build()
            .unwrap();

        assert_eq!(engine.run_blocking(CancellationToken::new()).unwrap(), 42);
        assert_eq!(Engine::current(), None);
    }

    struct SilentHelp;

    impl crate::help::HelpCommand for SilentHelp {
        fn render(&self, _: &HelpManifest, _: &CancellationToken) -> anyhow::Result<i32> {
            Ok(0)
        }
    }

    #[test]
    #[serial]
    fn test_full_mode_requires_help_renderer() {
        let engine = Engine::builder()
            .optimized_initialization(true)
            .provider(calc_module())
            .build();
        assert!(matches!(engine, Err(DispatchError::HelpNotConfigured)));
    }

    #[test]
    #[serial]
    fn test_empty_args_without_help_is_missing_command() {
        let engine = Engine::builder()
            .provider(calc_module())
            .help_renderer(HelpRenderer::sync(SilentHelp))
            .build()
            .unwrap();

        let err = engine.run_blocking(CancellationToken::new()).unwrap_err();
        assert!(matches!(err, DispatchError::MissingCommand));
    }

    #[test]
    #[serial]
    fn test_missing_resolver_entry() {
        let engine = Engine::builder()
            .args(["double"])
            .optimized_initialization(true)
            .provider(calc_module())
            .build()
            .unwrap();

        let err = engine.run_blocking(CancellationToken::new()).unwrap_err();
        assert!(matches!(err, DispatchError::Resolve { .. }));
        assert_eq!(Engine::current(), None);
    }

    #[test]
    #[serial]
    fn test_narrow_engine_can_still_render_help() {
        use crate::help::HelpCommand;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingHelp(Arc<AtomicUsize>);

        impl HelpCommand for CountingHelp {
            fn render(&self, manifest: &HelpManifest, _: &CancellationToken) -> anyhow::Result<i32> {
                self.0.store(manifest.len(), Ordering::SeqCst);
                Ok(0)
            }
        }

        let seen = Arc::new(AtomicUsize::new(0));
        let engine = Engine::builder()
            .args(["double"])
            .optimized_initialization(true)
            .provider(calc_module())
            .help_renderer(HelpRenderer::sync(CountingHelp(seen.clone())))
            .build()
            .unwrap();
        assert!(engine.manifest().is_none());

        let code = futures::executor::block_on(
            engine.run_help(Vec::<String>::new(), CancellationToken::new()),
        )
        .unwrap();
        assert_eq!(code, 0);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    struct CountingProvider {
        inner: Module,
        full_scans: Arc<std::sync::atomic::AtomicUsize>,
    }

    impl CommandProvider for CountingProvider {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn commands(&self, filter: Option<&str>) -> Vec<CommandDescriptor> {
            if filter.is_none() {
                self.full_scans
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            self.inner.commands(filter)
        }
    }

    #[test]
    #[serial]
    fn test_narrow_engine_assembles_help_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let full_scans = Arc::new(AtomicUsize::new(0));
        let engine = Engine::builder()
            .args(["double"])
            .optimized_initialization(true)
            .provider(CountingProvider {
                inner: calc_module(),
                full_scans: full_scans.clone(),
            })
            .help_renderer(HelpRenderer::sync(SilentHelp))
            .build()
            .unwrap();

        let help = || {
            futures::executor::block_on(
                engine.run_help(Vec::<String>::new(), CancellationToken::new()),
            )
        };
        assert_eq!(help().unwrap(), 0);
        let after_first = full_scans.load(Ordering::SeqCst);
        assert!(after_first > 0);

        assert_eq!(help().unwrap(), 0);
        assert_eq!(full_scans.load(Ordering::SeqCst), after_first);
    }

    #[test]
    #[serial]
    fn test_narrow_engine_help_reports_discovery_errors() {
        let clash = Module::new("clash")
            .command(CommandDescriptor::sync(["half"]).handler(|_c: &Calc, _| Ok(0)))
            .command(CommandDescriptor::sync(["HALF"]).handler(|_c: &Calc, _| Ok(0)));
        let engine = Engine::builder()
            .args(["double"])
            .optimized_initialization(true)
            .provider(calc_module())
            .provider(clash)
            .resolver(services())
            .help_renderer(HelpRenderer::sync(SilentHelp))
            .build()
            .unwrap();

        assert_eq!(engine.run_blocking(CancellationToken::new()).unwrap(), 42);
        for _ in 0..2 {
            let err = futures::executor::block_on(
                engine.run_help(Vec::<String>::new(), CancellationToken::new()),
            )
            .unwrap_err();
            assert!(matches!(err, DispatchError::DuplicateCommand { .. }));
            assert_eq!(Engine::current(), None);
        }
    }
}
