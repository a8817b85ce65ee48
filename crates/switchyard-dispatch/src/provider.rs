//! Command providers.
//!
//! A provider is one independently registered source of command declarations.
//! The routing builder queries each provider, either for everything it
//! declares or filtered to the single alias being invoked. A provider may
//! also contribute a help renderer and interceptors.
//!
//! [`PartialProvider`] registers only some of what a provider contributes.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::CommandDescriptor;
use crate::help::HelpRenderer;
use crate::pipeline::Interceptor;

/// A source of command descriptors.
pub trait CommandProvider: Send + Sync {
    /// Name used in log events and error messages.
    fn name(&self) -> &str;

    /// Returns the provider's descriptors, in declaration order.
    ///
    /// With a filter, only descriptors answering to that alias
    /// (case-insensitively) are returned.
    fn commands(&self, filter: Option<&str>) -> Vec<CommandDescriptor>;

    /// A help renderer supplied by this provider, if any.
    fn help_renderer(&self) -> Option<HelpRenderer> {
        None
    }

    /// Interceptors supplied by this provider, outermost first.
    ///
    /// They run inside the interceptors registered on the engine itself.
    fn interceptors(&self) -> Vec<Arc<dyn Interceptor>> {
        Vec::new()
    }
}

/// A provider assembled from builder calls.
///
/// ```rust
/// use switchyard_dispatch::{CommandDescriptor, CommandProvider, Module};
///
/// struct Users;
///
/// let module = Module::new("users")
///     .command(CommandDescriptor::sync(["adduser"]).handler(|_u: &Users, _| Ok(0)))
///     .command(CommandDescriptor::sync(["deluser"]).handler(|_u: &Users, _| Ok(0)));
///
/// assert_eq!(module.commands(None).len(), 2);
/// assert_eq!(module.commands(Some("ADDUSER")).len(), 1);
/// ```
#[derive(Clone)]
pub struct Module {
    name: String,
    commands: Vec<CommandDescriptor>,
    help: Option<HelpRenderer>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            help: None,
            interceptors: Vec::new(),
        }
    }

    pub fn command(mut self, descriptor: CommandDescriptor) -> Self {
        self.commands.push(descriptor);
        self
    }

    /// Supplies a help renderer from this module.
    pub fn help(mut self, renderer: HelpRenderer) -> Self {
        self.help = Some(renderer);
        self
    }

    /// Supplies an interceptor from this module.
    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("commands", &self.commands)
            .field("help", &self.help)
            .field("interceptor_count", &self.interceptors.len())
            .finish()
    }
}

impl CommandProvider for Module {
    fn name(&self) -> &str {
        &self.name
    }

    fn commands(&self, filter: Option<&str>) -> Vec<CommandDescriptor> {
        match filter {
            None => self.commands.clone(),
            Some(alias) => self
                .commands
                .iter()
                .filter(|d| d.answers_to(alias))
                .cloned()
                .collect(),
        }
    }

    fn help_renderer(&self) -> Option<HelpRenderer> {
        self.help.clone()
    }

    fn interceptors(&self) -> Vec<Arc<dyn Interceptor>> {
        self.interceptors.clone()
    }
}

/// Which contributions of a provider are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderParts {
    pub commands: bool,
    pub help: bool,
    pub interceptors: bool,
}

impl ProviderParts {
    /// Everything the provider contributes.
    pub const ALL: Self = Self {
        commands: true,
        help: true,
        interceptors: true,
    };

    /// Commands and their interceptors, but not the help renderer.
    pub const COMMANDS: Self = Self {
        commands: true,
        help: false,
        interceptors: true,
    };

    pub const HELP: Self = Self {
        commands: false,
        help: true,
        interceptors: false,
    };

    pub const INTERCEPTORS: Self = Self {
        commands: false,
        help: false,
        interceptors: true,
    };
}

impl Default for ProviderParts {
    fn default() -> Self {
        Self::ALL
    }
}

/// A provider registered for only some of its contributions.
///
/// ```rust
/// use std::sync::Arc;
/// use switchyard_dispatch::{CommandDescriptor, CommandProvider, Module, PartialProvider, ProviderParts};
///
/// struct Users;
///
/// let module = Module::new("users")
///     .command(CommandDescriptor::sync(["adduser"]).handler(|_u: &Users, _| Ok(0)));
/// let help_only = PartialProvider::new(Arc::new(module), ProviderParts::HELP);
///
/// assert!(help_only.commands(None).is_empty());
/// ```
#[derive(Clone)]
pub struct PartialProvider {
    inner: Arc<dyn CommandProvider>,
    parts: ProviderParts,
}

impl PartialProvider {
    pub fn new(inner: Arc<dyn CommandProvider>, parts: ProviderParts) -> Self {
        Self { inner, parts }
    }

    pub fn parts(&self) -> ProviderParts {
        self.parts
    }
}

impl CommandProvider for PartialProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn commands(&self, filter: Option<&str>) -> Vec<CommandDescriptor> {
        if self.parts.commands {
            self.inner.commands(filter)
        } else {
            Vec::new()
        }
    }

    fn help_renderer(&self) -> Option<HelpRenderer> {
        if self.parts.help {
            self.inner.help_renderer()
        } else {
            None
        }
    }

    fn interceptors(&self) -> Vec<Arc<dyn Interceptor>> {
        if self.parts.interceptors {
            self.inner.interceptors()
        } else {
            Vec::new()
        }
    }
}

impl fmt::Debug for PartialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialProvider")
            .field("name", &self.inner.name())
            .field("parts", &self.parts)
            .finish()
    }
}
