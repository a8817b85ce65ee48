//! Help metadata, help renderers and the help-trigger policy.
//!
//! The help path never binds arguments. Instead the engine hands the frozen
//! [`HelpManifest`] to a renderer: either the one configured on
//! [`HelpConfig`], or the single renderer supplied by a registered
//! [`CommandProvider`](crate::CommandProvider).

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::descriptor::fold_case;

/// Help projection of one visible command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    pub aliases: Vec<String>,
    pub description: String,
    pub example: String,
    pub group: Option<String>,
    pub order: i32,
}

/// The ordered list of commands shown by help.
///
/// Entries are sorted by group (ungrouped first, then by group name), then by
/// order, then by example text. Hidden commands are never part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HelpManifest {
    entries: Vec<CommandInfo>,
}

impl HelpManifest {
    pub fn new(mut entries: Vec<CommandInfo>) -> Self {
        entries.sort_by(|a, b| {
            a.group
                .cmp(&b.group)
                .then(a.order.cmp(&b.order))
                .then_with(|| a.example.cmp(&b.example))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[CommandInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries split into consecutive runs sharing a group.
    pub fn groups(&self) -> Vec<(Option<&str>, Vec<&CommandInfo>)> {
        let mut groups: Vec<(Option<&str>, Vec<&CommandInfo>)> = Vec::new();
        for entry in &self.entries {
            let group = entry.group.as_deref();
            match groups.last_mut() {
                Some((current, items)) if *current == group => items.push(entry),
                _ => groups.push((group, vec![entry])),
            }
        }
        groups
    }
}

/// Renders help synchronously and returns an exit code.
pub trait HelpCommand: Send + Sync {
    fn render(&self, manifest: &HelpManifest, cancel: &CancellationToken) -> anyhow::Result<i32>;
}

/// Renders help, possibly suspending.
#[async_trait]
pub trait HelpCommandAsync: Send + Sync {
    async fn render(
        &self,
        manifest: &HelpManifest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<i32>;
}

/// A help renderer with its calling convention.
#[derive(Clone)]
pub enum HelpRenderer {
    Sync(Arc<dyn HelpCommand>),
    Suspending(Arc<dyn HelpCommandAsync>),
}

impl HelpRenderer {
    pub fn sync<H: HelpCommand + 'static>(renderer: H) -> Self {
        HelpRenderer::Sync(Arc::new(renderer))
    }

    pub fn suspending<H: HelpCommandAsync + 'static>(renderer: H) -> Self {
        HelpRenderer::Suspending(Arc::new(renderer))
    }

    pub(crate) async fn render(
        &self,
        manifest: &HelpManifest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<i32> {
        match self {
            HelpRenderer::Sync(r) => r.render(manifest, cancel),
            HelpRenderer::Suspending(r) => r.render(manifest, cancel).await,
        }
    }
}

impl fmt::Debug for HelpRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelpRenderer::Sync(_) => f.write_str("HelpRenderer::Sync"),
            HelpRenderer::Suspending(_) => f.write_str("HelpRenderer::Suspending"),
        }
    }
}

/// Aliases that request help when given as the first argument.
pub const DEFAULT_HELP_TRIGGERS: [&str; 4] = ["-h", "--help", "/?", "help"];

/// Help configuration.
///
/// ```rust
/// use switchyard_dispatch::HelpConfig;
///
/// let help = HelpConfig::default().empty_args_means_help(true);
///
/// assert!(help.is_help_request(&[]));
/// assert!(help.is_help_request(&["--HELP".to_string()]));
/// assert!(!help.is_help_request(&["deploy".to_string()]));
/// ```
#[derive(Debug, Clone)]
pub struct HelpConfig {
    triggers: Vec<String>,
    empty_args_means_help: bool,
    renderer: Option<HelpRenderer>,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            triggers: DEFAULT_HELP_TRIGGERS.iter().map(|s| s.to_string()).collect(),
            empty_args_means_help: false,
            renderer: None,
        }
    }
}

impl HelpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the trigger aliases.
    pub fn triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    pub fn empty_args_means_help(mut self, yes: bool) -> Self {
        self.empty_args_means_help = yes;
        self
    }

    /// Designates the renderer. It takes precedence over any supplied by a module.
    pub fn renderer(mut self, renderer: HelpRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn get_triggers(&self) -> &[String] {
        &self.triggers
    }

    pub fn get_empty_args_means_help(&self) -> bool {
        self.empty_args_means_help
    }

    pub fn get_renderer(&self) -> Option<&HelpRenderer> {
        self.renderer.as_ref()
    }

    /// Applies the trigger policy to an argument vector.
    pub fn is_help_request(&self, args: &[String]) -> bool {
        match args.first() {
            None => self.empty_args_means_help,
            Some(first) => {
                let first = fold_case(first);
                self.triggers.iter().any(|t| fold_case(t) == first)
            }
        }
    }
}
