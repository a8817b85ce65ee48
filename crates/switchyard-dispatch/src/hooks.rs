//! Hook system for pre/post command execution.
//!
//! [`Hooks`] is a ready-made [`Interceptor`] for the common case of running
//! plain functions around the terminal action, without writing an interceptor
//! by hand.
//!
//! # Pipeline Position
//!
//! ```text
//! bound arguments
//!   → BEFORE HOOKS ← (validation, auth checks, logging)
//!   → rest of the pipeline / handler or help renderer
//!   → AFTER HOOKS ← (exit code mapping, auditing)
//! ```
//!
//! # Hook Points
//!
//! - Before: runs before the rest of the pipeline. Returning an error aborts
//!   the invocation with [`DispatchError::Hook`]; later hooks and the handler
//!   do not run.
//! - After: runs once the rest of the pipeline returned an exit code. Receives
//!   the code and returns the code to pass on, so hooks chain. Not run when
//!   the pipeline failed.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::context::InvocationContext;
use crate::error::DispatchError;
use crate::pipeline::{Interceptor, Next};

/// The phase at which a hook error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    /// Error occurred in a before hook
    Before,
    /// Error occurred in an after hook
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Before => write!(f, "before"),
            HookPhase::After => write!(f, "after"),
        }
    }
}

/// Error returned by a hook.
#[derive(Debug, Error)]
#[error("hook error ({phase}): {message}")]
pub struct HookError {
    /// Human-readable error message
    pub message: String,
    /// The hook phase where the error occurred
    pub phase: HookPhase,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    /// Creates a new hook error for the before phase.
    pub fn before(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: HookPhase::Before,
            source: None,
        }
    }

    /// Creates a new hook error for the after phase.
    pub fn after(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase: HookPhase::After,
            source: None,
        }
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Type alias for before hook functions.
pub type BeforeFn = Arc<dyn Fn(&InvocationContext) -> Result<(), HookError> + Send + Sync>;

/// Type alias for after hook functions.
pub type AfterFn = Arc<dyn Fn(&InvocationContext, i32) -> Result<i32, HookError> + Send + Sync>;

/// Hook configuration.
///
/// Hooks run in registration order. By default they apply to every
/// invocation; [`Hooks::only`] restricts them to some commands.
///
/// # Example
///
/// ```rust
/// use switchyard_dispatch::{Hooks, HookError};
///
/// let hooks = Hooks::new()
///     .before(|ctx| {
///         if ctx.alias() == Some("drop-db") && std::env::var("I_MEAN_IT").is_err() {
///             return Err(HookError::before("refusing to drop the database"));
///         }
///         Ok(())
///     })
///     .after(|_ctx, code| Ok(if code > 1 { 1 } else { code }));
/// ```
#[derive(Clone, Default)]
pub struct Hooks {
    before: Vec<BeforeFn>,
    after: Vec<AfterFn>,
    only: Option<Vec<String>>,
}

impl Hooks {
    /// Creates a new empty hooks configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Adds a before hook.
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&InvocationContext) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(f));
        self
    }

    /// Adds an after hook.
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&InvocationContext, i32) -> Result<i32, HookError> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(f));
        self
    }

    /// Applies the hooks only to commands answering to one of `aliases`.
    ///
    /// Scoped hooks never run on the help path.
    pub fn only<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    fn applies_to(&self, ctx: &InvocationContext) -> bool {
        match (&self.only, ctx.descriptor()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(aliases), Some(descriptor)) => aliases.iter().any(|a| descriptor.answers_to(a)),
        }
    }

    /// Runs all before hooks.
    pub fn run_before(&self, ctx: &InvocationContext) -> Result<(), HookError> {
        for hook in &self.before {
            hook(ctx)?;
        }
        Ok(())
    }

    /// Runs all after hooks, chaining the exit code.
    pub fn run_after(&self, ctx: &InvocationContext, code: i32) -> Result<i32, HookError> {
        let mut current = code;
        for hook in &self.after {
            current = hook(ctx, current)?;
        }
        Ok(current)
    }
}

#[async_trait]
impl Interceptor for Hooks {
    async fn invoke(&self, ctx: &InvocationContext, next: Next<'_>) -> Result<i32, DispatchError> {
        if !self.applies_to(ctx) {
            return next.run(ctx).await;
        }

        self.run_before(ctx)?;
        let code = next.run(ctx).await?;
        Ok(self.run_after(ctx, code)?)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_count", &self.before.len())
            .field("after_count", &self.after.len())
            .field("only", &self.only)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::CommandDescriptor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio_util::sync::CancellationToken;

    struct Target;

    fn test_context(alias: &str) -> InvocationContext {
        let descriptor = CommandDescriptor::sync([alias]).handler(|_t: &Target, _| Ok(0));
        InvocationContext::command(
            1,
            vec![alias.to_string()],
            Arc::new(descriptor),
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_hook_error_creation() {
        let err = HookError::before("test error");
        assert_eq!(err.phase, HookPhase::Before);
        assert_eq!(err.message, "test error");
        assert_eq!(err.to_string(), "hook error (before): test error");
    }

    #[test]
    fn test_hooks_empty() {
        let hooks = Hooks::new();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_before_success() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let hooks = Hooks::new().before(move |_| {
            called_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        let result = hooks.run_before(&test_context("test"));

        assert!(result.is_ok());
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_before_error_aborts() {
        let hooks = Hooks::new()
            .before(|_| Err(HookError::before("first fails")))
            .before(|_| panic!("should not be called"));

        let result = hooks.run_before(&test_context("test"));

        assert!(result.is_err());
    }

    #[test]
    fn test_after_chains_exit_code() {
        let hooks = Hooks::new()
            .after(|_, code| Ok(code + 1))
            .after(|_, code| Ok(code * 10));

        let result = hooks.run_after(&test_context("test"), 1);
        assert_eq!(result.unwrap(), 20);
    }

    #[test]
    fn test_only_scopes_hooks() {
        let hooks = Hooks::new().only(["deploy"]);
        assert!(hooks.applies_to(&test_context("DEPLOY")));
        assert!(!hooks.applies_to(&test_context("status")));

        let help = InvocationContext::help(1, vec![], CancellationToken::new());
        assert!(!hooks.applies_to(&help));
        assert!(Hooks::new().applies_to(&help));
    }
}
