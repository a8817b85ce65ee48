//! Error types for setup operations, and logging setup.

use minijinja::Error as JinjaError;
use switchyard_dispatch::DispatchError;

/// Error type for setup operations.
#[derive(Debug)]
pub enum SetupError {
    /// Help template parsing error.
    Template(String),
    /// Configuration error.
    Config(String),
    /// Routing table could not be built.
    Dispatch(DispatchError),
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::Template(msg) => write!(f, "template error: {}", msg),
            SetupError::Config(msg) => write!(f, "configuration error: {}", msg),
            SetupError::Dispatch(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Dispatch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JinjaError> for SetupError {
    fn from(e: JinjaError) -> Self {
        SetupError::Template(e.to_string())
    }
}

impl From<DispatchError> for SetupError {
    fn from(e: DispatchError) -> Self {
        SetupError::Dispatch(e)
    }
}

impl SetupError {
    /// The dispatch error behind a failed build, if any.
    pub fn as_dispatch(&self) -> Option<&DispatchError> {
        match self {
            SetupError::Dispatch(err) => Some(err),
            _ => None,
        }
    }
}

/// Installs a tracing subscriber writing to stderr.
///
/// Honors `RUST_LOG`, with `info` as the baseline directive. Calling it again
/// once a subscriber is installed returns an error and changes nothing.
///
/// # Errors
/// Returns an error if a global subscriber is already set
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
