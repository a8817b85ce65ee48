//! Routing-table construction.
//!
//! [`RoutingBuilder::build`] merges the descriptors of every registered
//! provider into one [`RoutingTable`], keyed by lowercased alias, and
//! assembles the [`HelpManifest`] when help metadata is needed.
//!
//! # Discovery modes
//!
//! - **Full**: every provider is asked for all of its descriptors. Each one is
//!   validated and every alias inserted; the first collision fails with
//!   [`DispatchError::DuplicateCommand`]. The help manifest is always built,
//!   which requires a help renderer.
//! - **Narrow**: each provider is asked only for descriptors answering to the
//!   requested alias. Used when [`DiscoveryOptions::narrow`] is set, an alias
//!   was requested and that alias is not a help trigger. Zero matches yields an
//!   empty table, so the run fails with `CommandNotFound`.
//!
//! Providers are always scanned in registration order, so the reported
//! collision is deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{fold_case, CommandDescriptor};
use crate::error::DispatchError;
use crate::help::{HelpConfig, HelpManifest, HelpRenderer};
use crate::provider::CommandProvider;

/// How far narrow discovery looks for a second match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateScope {
    /// A second match in any provider is a collision.
    #[default]
    Global,
    /// Only a second match within the same provider is a collision. The first
    /// provider with a match wins.
    PerProvider,
}

/// Discovery configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Scan only for the requested alias when possible.
    pub narrow: bool,
    pub duplicate_scope: DuplicateScope,
}

/// Immutable alias to descriptor mapping.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<String, Arc<CommandDescriptor>>,
    commands: Vec<Arc<CommandDescriptor>>,
    narrowed: Option<String>,
}

impl RoutingTable {
    fn insert(&mut self, descriptor: CommandDescriptor) -> Result<(), DispatchError> {
        let descriptor = Arc::new(descriptor);
        for alias in descriptor.aliases() {
            let key = fold_case(alias);
            if self.routes.contains_key(&key) {
                return Err(DispatchError::DuplicateCommand {
                    alias: alias.clone(),
                });
            }
            tracing::trace!(alias = %alias, command = descriptor.name(), "registered alias");
            self.routes.insert(key, Arc::clone(&descriptor));
        }
        self.commands.push(descriptor);
        Ok(())
    }

    /// Looks a command up by alias, case-insensitively.
    pub fn get(&self, alias: &str) -> Option<&Arc<CommandDescriptor>> {
        self.routes.get(&fold_case(alias))
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    /// Descriptors in registration order.
    pub fn commands(&self) -> &[Arc<CommandDescriptor>] {
        &self.commands
    }

    /// Number of commands (not aliases).
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The alias this table was narrowed to, if built in narrow mode.
    pub fn narrowed_alias(&self) -> Option<&str> {
        self.narrowed.as_deref()
    }
}

/// Output of a routing build.
#[derive(Debug, Clone)]
pub struct Routes {
    pub table: RoutingTable,
    /// Present whenever help metadata was required.
    pub manifest: Option<HelpManifest>,
    pub help: Option<HelpRenderer>,
}

/// Builds routing tables from providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingBuilder {
    options: DiscoveryOptions,
}

impl RoutingBuilder {
    pub fn new(options: DiscoveryOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> DiscoveryOptions {
        self.options
    }

    /// Builds the routes for an invocation of `requested`, if known.
    pub fn build(
        &self,
        providers: &[Arc<dyn CommandProvider>],
        help: &HelpConfig,
        requested: Option<&str>,
    ) -> Result<Routes, DispatchError> {
        let help_requested = match requested {
            Some(alias) => help.is_help_request(&[alias.to_string()]),
            None => help.get_empty_args_means_help(),
        };

        match requested {
            Some(alias) if self.options.narrow && !help_requested => {
                tracing::debug!(alias, scope = ?self.options.duplicate_scope, "narrow discovery");
                self.build_narrow(providers, alias)
            }
            _ => {
                tracing::debug!(providers = providers.len(), "full discovery");
                self.build_full(providers, help, requested, help_requested)
            }
        }
    }

    fn build_full(
        &self,
        providers: &[Arc<dyn CommandProvider>],
        help: &HelpConfig,
        requested: Option<&str>,
        help_requested: bool,
    ) -> Result<Routes, DispatchError> {
        let mut table = RoutingTable::default();
        for provider in providers {
            for descriptor in provider.commands(None) {
                descriptor.validate()?;
                table.insert(descriptor)?;
            }
        }

        let renderer = resolve_renderer(providers, help)?;

        if table.is_empty() && !help_requested {
            return Err(DispatchError::NoCommandsDefined {
                alias: requested.map(str::to_string),
            });
        }

        let manifest = HelpManifest::new(
            table
                .commands()
                .iter()
                .filter(|d| !d.is_hidden())
                .map(|d| d.info())
                .collect(),
        );

        tracing::debug!(
            commands = table.len(),
            visible = manifest.len(),
            "routing table built"
        );

        Ok(Routes {
            table,
            manifest: Some(manifest),
            help: Some(renderer),
        })
    }

    fn build_narrow(
        &self,
        providers: &[Arc<dyn CommandProvider>],
        alias: &str,
    ) -> Result<Routes, DispatchError> {
        let mut found: Option<CommandDescriptor> = None;
        let mut found_in = "";

        for provider in providers {
            let mut matches = provider
                .commands(Some(alias))
                .into_iter()
                .filter(|d| d.answers_to(alias));

            match self.options.duplicate_scope {
                DuplicateScope::Global => {
                    for descriptor in matches {
                        if found.is_some() {
                            return Err(duplicate(alias));
                        }
                        found = Some(descriptor);
                        found_in = provider.name();
                    }
                }
                DuplicateScope::PerProvider => {
                    let Some(first) = matches.next() else {
                        continue;
                    };
                    if matches.next().is_some() {
                        return Err(duplicate(alias));
                    }
                    if found.is_some() {
                        tracing::warn!(
                            alias,
                            kept = found_in,
                            ignored = provider.name(),
                            "command declared by more than one module"
                        );
                        continue;
                    }
                    found = Some(first);
                    found_in = provider.name();
                }
            }
        }

        let mut table = RoutingTable {
            narrowed: Some(alias.to_string()),
            ..RoutingTable::default()
        };

        match found {
            Some(descriptor) => {
                descriptor.validate()?;
                table.insert(descriptor)?;
                tracing::debug!(alias, module = found_in, "narrowed to one command");
            }
            None => {
                if providers.iter().all(|p| p.commands(None).is_empty()) {
                    return Err(DispatchError::NoCommandsDefined {
                        alias: Some(alias.to_string()),
                    });
                }
                tracing::debug!(alias, "no command matches the requested alias");
            }
        }

        Ok(Routes {
            table,
            manifest: None,
            help: None,
        })
    }
}

fn duplicate(alias: &str) -> DispatchError {
    DispatchError::DuplicateCommand {
        alias: alias.to_string(),
    }
}

/// The configured renderer, else the single one supplied by a provider.
fn resolve_renderer(
    providers: &[Arc<dyn CommandProvider>],
    help: &HelpConfig,
) -> Result<HelpRenderer, DispatchError> {
    if let Some(renderer) = help.get_renderer() {
        return Ok(renderer.clone());
    }

    let mut supplied: Option<(&str, HelpRenderer)> = None;
    for provider in providers {
        let Some(renderer) = provider.help_renderer() else {
            continue;
        };
        if let Some((first, _)) = &supplied {
            return Err(DispatchError::DuplicateHelpRenderer {
                first: first.to_string(),
                second: provider.name().to_string(),
            });
        }
        supplied = Some((provider.name(), renderer));
    }

    supplied
        .map(|(_, renderer)| renderer)
        .ok_or(DispatchError::HelpNotConfigured)
}
