//! The interceptor pipeline.
//!
//! Every invocation, command or help, runs through the same ordered chain of
//! [`Interceptor`]s before reaching its terminal action. Each interceptor gets
//! the [`InvocationContext`] and a [`Next`] continuation standing for the rest
//! of the chain plus the terminal action.
//!
//! ```text
//! interceptor[0] → interceptor[1] → … → terminal
//!                                       ├─ command: resolve class, call handler
//!                                       └─ help: call help renderer
//! ```
//!
//! An interceptor may work before or after calling `next.run(ctx)`, or not call
//! it at all, in which case its own return value becomes the result.
//!
//! ```rust
//! use async_trait::async_trait;
//! use switchyard_dispatch::{DispatchError, Interceptor, InvocationContext, Next};
//!
//! struct Timing;
//!
//! #[async_trait]
//! impl Interceptor for Timing {
//!     async fn invoke(&self, ctx: &InvocationContext, next: Next<'_>) -> Result<i32, DispatchError> {
//!         let start = std::time::Instant::now();
//!         let code = next.run(ctx).await;
//!         eprintln!("{:?} took {:?}", ctx.alias(), start.elapsed());
//!         code
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::binder::BoundArguments;
use crate::context::InvocationContext;
use crate::descriptor::{CommandDescriptor, HandlerFn};
use crate::error::DispatchError;
use crate::help::{HelpManifest, HelpRenderer};
use crate::resolver::Resolver;

/// One stage of the pipeline.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn invoke(&self, ctx: &InvocationContext, next: Next<'_>) -> Result<i32, DispatchError>;
}

/// What the pipeline ends in.
pub(crate) enum Terminal {
    Command {
        descriptor: Arc<CommandDescriptor>,
        bound: BoundArguments,
    },
    Help {
        manifest: Arc<HelpManifest>,
        renderer: HelpRenderer,
    },
}

impl Terminal {
    async fn execute(
        &self,
        ctx: &InvocationContext,
        resolver: &dyn Resolver,
    ) -> Result<i32, DispatchError> {
        match self {
            Terminal::Command { descriptor, bound } => {
                let missing =
                    || DispatchError::invalid_descriptor(descriptor.name(), "no handler attached");
                let class = descriptor.class().ok_or_else(missing)?;
                let handler = descriptor.handler.as_ref().ok_or_else(missing)?;

                let instance = resolver.resolve(&class)?;
                tracing::trace!(command = descriptor.name(), class = %class, "invoking handler");

                match handler {
                    HandlerFn::Sync(f) => f(&instance, bound),
                    HandlerFn::Suspending(f) => f(instance, bound.clone()).await,
                }
            }
            Terminal::Help { manifest, renderer } => renderer
                .render(manifest, ctx.cancellation())
                .await
                .map_err(DispatchError::HelpRenderer),
        }
    }
}

/// The rest of the pipeline after the current interceptor.
pub struct Next<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    terminal: &'a Terminal,
    resolver: &'a dyn Resolver,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        interceptors: &'a [Arc<dyn Interceptor>],
        terminal: &'a Terminal,
        resolver: &'a dyn Resolver,
    ) -> Self {
        Self {
            interceptors,
            terminal,
            resolver,
        }
    }

    /// Number of interceptors still ahead of the terminal action.
    pub fn remaining(&self) -> usize {
        self.interceptors.len()
    }

    /// Runs the remaining interceptors and the terminal action.
    pub async fn run(self, ctx: &InvocationContext) -> Result<i32, DispatchError> {
        match self.interceptors.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    interceptors: rest,
                    terminal: self.terminal,
                    resolver: self.resolver,
                };
                head.invoke(ctx, next).await
            }
            None => self.terminal.execute(ctx, self.resolver).await,
        }
    }
}
