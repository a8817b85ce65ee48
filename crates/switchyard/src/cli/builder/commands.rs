//! Module, interceptor and service registration.

use std::sync::Arc;
use switchyard_dispatch::{
    CommandProvider, Hooks, Interceptor, PartialProvider, ProviderParts, Resolver,
};

use super::AppBuilder;

impl AppBuilder {
    /// Registers a command module. Modules are scanned in registration order.
    pub fn module<P: CommandProvider + 'static>(mut self, module: P) -> Self {
        self.providers.push(Arc::new(module));
        self
    }

    /// Registers an already shared command module.
    pub fn module_arc(mut self, module: Arc<dyn CommandProvider>) -> Self {
        self.providers.push(module);
        self
    }

    /// Registers only the given contributions of a module.
    pub fn module_parts<P>(mut self, module: P, parts: ProviderParts) -> Self
    where
        P: CommandProvider + 'static,
    {
        self.providers
            .push(Arc::new(PartialProvider::new(Arc::new(module), parts)));
        self
    }

    /// Registers a module's commands and interceptors, but not its help renderer.
    pub fn module_commands<P: CommandProvider + 'static>(self, module: P) -> Self {
        self.module_parts(module, ProviderParts::COMMANDS)
    }

    /// Registers only a module's help renderer.
    pub fn module_help<P: CommandProvider + 'static>(self, module: P) -> Self {
        self.module_parts(module, ProviderParts::HELP)
    }

    /// Registers only a module's interceptors.
    pub fn module_interceptors<P: CommandProvider + 'static>(self, module: P) -> Self {
        self.module_parts(module, ProviderParts::INTERCEPTORS)
    }

    /// Appends an interceptor. The first registered runs outermost, and
    /// interceptors supplied by modules run inside all of these.
    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends a [`Hooks`] interceptor.
    ///
    /// ```rust
    /// use switchyard::cli::App;
    /// use switchyard::Hooks;
    ///
    /// let builder = App::builder().hooks(
    ///     Hooks::new().before(|ctx| {
    ///         tracing::info!(alias = ?ctx.alias(), "running");
    ///         Ok(())
    ///     }),
    /// );
    /// ```
    pub fn hooks(self, hooks: Hooks) -> Self {
        self.interceptor(hooks)
    }

    /// Registers a handler or builder instance with the default resolver.
    ///
    /// Ignored once a custom resolver is set with [`resolver`](Self::resolver).
    pub fn service<T: Send + Sync + 'static>(mut self, instance: T) -> Self {
        self.services.insert(instance);
        self
    }

    /// Registers an already shared instance with the default resolver.
    pub fn service_arc<T: Send + Sync + 'static>(mut self, instance: Arc<T>) -> Self {
        self.services.insert_arc(instance);
        self
    }

    /// Replaces the default resolver.
    pub fn resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }
}
