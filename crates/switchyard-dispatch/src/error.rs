//! Error types for routing, binding and execution.
//!
//! Every failure the dispatcher can produce is a [`DispatchError`]. The
//! variants fall into four groups:
//!
//! | Group | Variants | When |
//! |-------|----------|------|
//! | Build-time | `DuplicateCommand`, `NoCommandsDefined`, `HelpNotConfigured`, `DescriptorInvalid`, `DuplicateHelpRenderer` | while the routing table is assembled |
//! | Run-setup | `CommandNotFound`, `AlreadyRunning`, `MissingCommand`, `Resolve` | before any stage runs |
//! | Argument-time | `MissingArgument`, `InvalidArgument`, `ArgsBuilder` | before the handler runs |
//! | Pipeline | `Hook`, `Handler`, `HelpRenderer` | raised by user code |
//!
//! Handler failures are carried unchanged: `DispatchError::Handler` wraps the
//! handler's own `anyhow::Error` transparently, so its message and source
//! chain are what the caller sees.

use crate::hooks::HookError;

/// Errors produced while building or running an engine.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Two descriptors claim the same alias.
    #[error("multiple commands found for '{alias}'")]
    DuplicateCommand { alias: String },

    /// No provider declared any command.
    #[error("{}", no_commands_message(.alias.as_deref()))]
    NoCommandsDefined { alias: Option<String> },

    /// Help metadata was requested but no renderer is available.
    #[error("help renderer not configured and not supplied by any registered module")]
    HelpNotConfigured,

    /// More than one module supplied a help renderer.
    #[error("multiple help renderers supplied by registered modules ('{first}', '{second}')")]
    DuplicateHelpRenderer { first: String, second: String },

    /// A descriptor failed validation.
    #[error("invalid command '{command}': {reason}")]
    DescriptorInvalid { command: String, reason: String },

    /// The requested alias is not in the routing table.
    #[error("command '{alias}' not found")]
    CommandNotFound { alias: String },

    /// The argument vector was empty and empty arguments do not mean help.
    #[error("no command given")]
    MissingCommand,

    /// Another engine is active in this process.
    #[error("an engine is already running in this process")]
    AlreadyRunning,

    /// The resolver could not supply an instance.
    #[error("could not resolve '{class}': {reason}")]
    Resolve { class: String, reason: String },

    /// A required parameter had no value, default or optional marker.
    #[error("missing argument '{param}' for command '{command}'")]
    MissingArgument { command: String, param: String },

    /// A bound value was null for a non-nullable parameter or of the wrong kind.
    #[error("invalid argument '{param}' for command '{command}': {reason}")]
    InvalidArgument {
        command: String,
        param: String,
        reason: String,
    },

    /// A custom argument builder failed.
    #[error("argument builder for command '{command}' failed: {source}")]
    ArgsBuilder {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    /// An interceptor hook aborted the pipeline.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Error raised by a command handler.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// Error raised by the help renderer.
    #[error(transparent)]
    HelpRenderer(anyhow::Error),
}

fn no_commands_message(alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("no commands defined for '{}' in the registered modules", alias),
        None => "no commands defined in the registered modules".to_string(),
    }
}

impl DispatchError {
    /// Creates a [`DispatchError::DescriptorInvalid`].
    pub fn invalid_descriptor(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DescriptorInvalid {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors raised while building the routing table.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateCommand { .. }
                | Self::NoCommandsDefined { .. }
                | Self::HelpNotConfigured
                | Self::DuplicateHelpRenderer { .. }
                | Self::DescriptorInvalid { .. }
        )
    }

    /// Returns true for errors raised while binding arguments.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. } | Self::InvalidArgument { .. } | Self::ArgsBuilder { .. }
        )
    }

    /// Returns the handler's own error if this is a handler failure.
    pub fn as_handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }
}
