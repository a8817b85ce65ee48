//! Help and discovery configuration.

use switchyard_dispatch::{DuplicateScope, HelpConfig, HelpRenderer};

use super::AppBuilder;

impl AppBuilder {
    /// Installs [`DefaultHelp`](crate::cli::help::DefaultHelp) as the help renderer.
    ///
    /// An explicit [`help_renderer`](Self::help_renderer) takes precedence.
    pub fn use_default_help(mut self) -> Self {
        self.default_help = true;
        self
    }

    /// Renders the default help through a custom MiniJinja template.
    ///
    /// Only meaningful together with [`use_default_help`](Self::use_default_help).
    pub fn help_template(mut self, template: impl Into<String>) -> Self {
        self.help_template = Some(template.into());
        self
    }

    /// Designates the help renderer.
    pub fn help_renderer(mut self, renderer: HelpRenderer) -> Self {
        self.help = self.help.renderer(renderer);
        self
    }

    /// Replaces the help trigger aliases (default `-h`, `--help`, `/?`, `help`).
    pub fn help_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.help = self.help.triggers(triggers);
        self
    }

    /// Treats an empty argument vector as a help request.
    pub fn empty_args_means_help(mut self, yes: bool) -> Self {
        self.help = self.help.empty_args_means_help(yes);
        self
    }

    /// Replaces the whole help configuration.
    pub fn help_config(mut self, help: HelpConfig) -> Self {
        self.help = help;
        self
    }

    /// Scans modules only for the invoked alias, unless it is a help request.
    ///
    /// Startup cost then no longer grows with the number of commands, but
    /// collisions with other aliases go undetected.
    pub fn optimized_initialization(mut self, yes: bool) -> Self {
        self.discovery.narrow = yes;
        self
    }

    /// Sets how far optimized initialization looks for duplicate aliases.
    pub fn duplicate_scope(mut self, scope: DuplicateScope) -> Self {
        self.discovery.duplicate_scope = scope;
        self
    }
}
