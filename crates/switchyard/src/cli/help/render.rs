//! Help rendering functions.

use console::Style;
use minijinja::{context, Environment};
use serde::Serialize;
use switchyard_dispatch::{CommandInfo, HelpManifest};

pub(crate) const DEFAULT_TEMPLATE: &str = include_str!("template.txt");

#[derive(Serialize)]
struct GroupView<'a> {
    name: Option<&'a str>,
    commands: Vec<&'a CommandInfo>,
}

fn environment(styled: bool) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_filter("pad", |value: String, width: usize| format!("{value:<width$}"));
    env.add_filter("header", move |value: String| {
        if styled {
            Style::new().bold().apply_to(value).to_string()
        } else {
            value
        }
    });
    env
}

/// Checks that a custom help template parses.
pub(crate) fn validate_template(template: &str) -> Result<(), minijinja::Error> {
    environment(false).template_from_str(template).map(|_| ())
}

pub(crate) fn render_with(
    manifest: &HelpManifest,
    template: &str,
    styled: bool,
) -> Result<String, minijinja::Error> {
    let width = manifest
        .entries()
        .iter()
        .map(|e| e.example.chars().count())
        .max()
        .unwrap_or(0);

    let groups: Vec<GroupView<'_>> = manifest
        .groups()
        .into_iter()
        .map(|(name, commands)| GroupView { name, commands })
        .collect();

    let env = environment(styled);
    let rendered = env
        .template_from_str(template)?
        .render(context! { groups => groups, width => width })?;

    let mut out = rendered
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    Ok(out)
}

/// Renders the help listing for `manifest` as plain text.
///
/// Commands are listed under a `Usage:` header, grouped, with their examples
/// padded to the widest example so descriptions line up:
///
/// ```text
/// Usage:
///   create <name> Creates a user
///   list          Lists users
///
///   Admin
///   purge         Deletes everything
/// ```
pub fn render_help_text(manifest: &HelpManifest) -> Result<String, minijinja::Error> {
    render_with(manifest, DEFAULT_TEMPLATE, false)
}
