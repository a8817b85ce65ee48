//! Per-invocation context.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::descriptor::CommandDescriptor;

/// State of one invocation, shared by reference with every interceptor.
///
/// Created once per run. Routing fields cannot change after creation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    engine_id: u64,
    alias: Option<String>,
    args: Vec<String>,
    descriptor: Option<Arc<CommandDescriptor>>,
    cancel: CancellationToken,
    help: bool,
}

impl InvocationContext {
    pub(crate) fn command(
        engine_id: u64,
        args: Vec<String>,
        descriptor: Arc<CommandDescriptor>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine_id,
            alias: args.first().cloned(),
            args,
            descriptor: Some(descriptor),
            cancel,
            help: false,
        }
    }

    pub(crate) fn help(engine_id: u64, args: Vec<String>, cancel: CancellationToken) -> Self {
        Self {
            engine_id,
            alias: args.first().cloned(),
            args,
            descriptor: None,
            cancel,
            help: true,
        }
    }

    /// Id of the engine running this invocation.
    pub fn engine_id(&self) -> u64 {
        self.engine_id
    }

    /// The requested alias, as typed. `None` for help on empty arguments.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The raw argument vector, alias first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The resolved command. `None` on the help path.
    pub fn descriptor(&self) -> Option<&CommandDescriptor> {
        self.descriptor.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_help(&self) -> bool {
        self.help
    }
}
