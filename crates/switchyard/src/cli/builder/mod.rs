//! AppBuilder for constructing App instances.
//!
//! This module provides the [`AppBuilder`] type for configuring and
//! constructing [`App`] instances with modules, interceptors, services and
//! help configuration.
//!
//! # Services
//!
//! Handler and argument-builder instances come from a resolver. By default
//! that is a [`Services`] map filled with `.service()`:
//!
//! ```rust,ignore
//! App::builder()
//!     .service(UserCommands::new(Database::connect()?))
//!     .module(users::module())
//!     .build()?
//!     .run_to_exit_code()
//! ```
//!
//! The builder is split into submodules by concern:
//! - [`config`]: Help and discovery configuration
//! - [`commands`]: Modules, interceptors and services

mod commands;
mod config;

use std::sync::Arc;
use switchyard_dispatch::{
    CommandProvider, DiscoveryOptions, Engine, HelpConfig, Interceptor, Resolver, Services,
};

use super::app::App;
use super::help::{validate_template, DefaultHelp};
use crate::setup::SetupError;
use switchyard_dispatch::HelpRenderer;

/// Builder for constructing an App instance.
///
/// # Example
///
/// ```rust
/// use switchyard::cli::App;
/// use switchyard::{CommandDescriptor, Module};
///
/// struct Hello;
///
/// let app = App::builder()
///     .args(["hello"])
///     .use_default_help()
///     .service(Hello)
///     .module(Module::new("greetings").command(
///         CommandDescriptor::sync(["hello"]).handler(|_h: &Hello, _| Ok(0)),
///     ))
///     .build()
///     .unwrap();
///
/// assert_eq!(app.run_blocking().unwrap(), 0);
/// ```
pub struct AppBuilder {
    pub(crate) args: Vec<String>,
    pub(crate) providers: Vec<Arc<dyn CommandProvider>>,
    pub(crate) interceptors: Vec<Arc<dyn Interceptor>>,
    pub(crate) services: Services,
    pub(crate) resolver: Option<Arc<dyn Resolver>>,
    pub(crate) help: HelpConfig,
    /// Install [`DefaultHelp`] unless a renderer is set explicitly.
    pub(crate) default_help: bool,
    pub(crate) help_template: Option<String>,
    pub(crate) discovery: DiscoveryOptions,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    /// Creates a new builder with default settings.
    ///
    /// By default:
    /// - the argument vector is empty (see [`args_from_env`](Self::args_from_env))
    /// - full discovery is used
    /// - the default help triggers are active, empty arguments are not help
    /// - no help renderer is installed
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            providers: Vec::new(),
            interceptors: Vec::new(),
            services: Services::new(),
            resolver: None,
            help: HelpConfig::default(),
            default_help: false,
            help_template: None,
            discovery: DiscoveryOptions::default(),
        }
    }

    /// Sets the argument vector, alias first.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Uses the process arguments, without the program name.
    pub fn args_from_env(self) -> Self {
        self.args(std::env::args().skip(1))
    }

    /// Builds the routing table and returns the App.
    ///
    /// # Errors
    ///
    /// - [`SetupError::Template`] if a custom help template does not parse
    /// - [`SetupError::Dispatch`] if the routing table cannot be built
    pub fn build(self) -> Result<App, SetupError> {
        let mut help = self.help;
        if self.default_help && help.get_renderer().is_none() {
            let renderer = match self.help_template {
                Some(template) => {
                    validate_template(&template)?;
                    DefaultHelp::with_template(template)
                }
                None => DefaultHelp::new(),
            };
            help = help.renderer(HelpRenderer::sync(renderer));
        } else if self.help_template.is_some() {
            return Err(SetupError::Config(
                "help_template requires use_default_help and no explicit renderer".into(),
            ));
        }

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(self.services) as Arc<dyn Resolver>);

        let mut engine = Engine::builder()
            .args(self.args)
            .help(help)
            .discovery(self.discovery)
            .resolver_arc(resolver);
        for provider in self.providers {
            engine = engine.provider_arc(provider);
        }
        for interceptor in self.interceptors {
            engine = engine.interceptor_arc(interceptor);
        }

        let engine = engine.build()?;
        tracing::debug!(engine = engine.id(), "app built");
        Ok(App { engine })
    }
}
