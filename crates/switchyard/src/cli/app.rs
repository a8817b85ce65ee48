//! App struct and implementation.
//!
//! This module provides the [`App`] type, the main entry point of a
//! switchyard application.

use std::process::ExitCode;
use switchyard_dispatch::{CancellationToken, DispatchError, Engine, HelpManifest};

/// Main entry point of a switchyard application.
///
/// Wraps a built [`Engine`]. The routing table is fixed by the time an App
/// exists; running it dispatches the argument vector given to the builder.
///
/// Only one App (or Engine) runs at a time in a process. A second concurrent
/// run fails with [`DispatchError::AlreadyRunning`].
///
/// ```rust,ignore
/// fn main() -> std::process::ExitCode {
///     switchyard::setup::init_tracing().ok();
///
///     switchyard::cli::App::builder()
///         .args_from_env()
///         .use_default_help()
///         .empty_args_means_help(true)
///         .optimized_initialization(true)
///         .service(Users::default())
///         .module(users::module())
///         .build()
///         .map(|app| app.run_to_exit_code())
///         .unwrap_or_else(|err| {
///             eprintln!("Error: {err}");
///             std::process::ExitCode::FAILURE
///         })
/// }
/// ```
#[derive(Debug)]
pub struct App {
    pub(crate) engine: Engine,
}

impl App {
    /// Creates a new builder for constructing an App instance.
    pub fn builder() -> super::AppBuilder {
        super::AppBuilder::new()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The help manifest, if the routing table was built in full mode.
    pub fn manifest(&self) -> Option<&HelpManifest> {
        self.engine.manifest()
    }

    /// Id of the engine currently running in this process, if any.
    pub fn current() -> Option<u64> {
        Engine::current()
    }

    /// Returns true if this App is the one currently running.
    pub fn is_current(&self) -> bool {
        self.engine.is_current()
    }

    /// Runs the configured arguments.
    pub async fn run(&self, cancel: CancellationToken) -> Result<i32, DispatchError> {
        self.engine.run(cancel).await
    }

    /// Runs a specific command with the arguments following its alias.
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
        self.engine.run_command(alias, args, cancel).await
    }

    /// Runs the configured arguments on the current thread.
    pub fn run_blocking(&self) -> Result<i32, DispatchError> {
        self.engine.run_blocking(CancellationToken::new())
    }

    /// Runs the configured arguments and maps the outcome to a process exit code.
    ///
    /// Errors are logged and printed to stderr, and exit with `1`.
    pub fn run_to_exit_code(&self) -> ExitCode {
        to_exit_code(self.run_blocking())
    }
}

/// Maps a run outcome to a process exit code.
///
/// Handler codes outside `0..=255` become `1`.
pub fn to_exit_code(result: Result<i32, DispatchError>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
