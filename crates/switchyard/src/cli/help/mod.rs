//! Default help rendering.
//!
//! - [`DefaultHelp`]: a help renderer that prints the command listing to stdout
//! - [`render_help_text`]: the same listing as a plain string
//!
//! The listing is produced by a MiniJinja template. Group headers are styled
//! with `console` when stdout is a terminal.

mod render;

use std::io::Write;
use switchyard_dispatch::{CancellationToken, HelpCommand, HelpManifest};

pub use render::render_help_text;
pub(crate) use render::validate_template;

use render::{render_with, DEFAULT_TEMPLATE};

/// Prints the help listing to stdout and exits with `0`.
#[derive(Debug, Clone, Default)]
pub struct DefaultHelp {
    template: Option<String>,
}

impl DefaultHelp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom MiniJinja template.
    ///
    /// The template receives `groups` (each with an optional `name` and its
    /// `commands`) and `width`, the length of the longest example. The `pad`
    /// and `header` filters are available.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
        }
    }

    /// Renders the listing without printing it.
    pub fn render_to_string(&self, manifest: &HelpManifest) -> Result<String, minijinja::Error> {
        let template = self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        render_with(manifest, template, console::colors_enabled())
    }
}

impl HelpCommand for DefaultHelp {
    fn render(&self, manifest: &HelpManifest, _cancel: &CancellationToken) -> anyhow::Result<i32> {
        let text = self.render_to_string(manifest)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(0)
    }
}
