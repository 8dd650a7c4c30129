use thiserror::Error;

/// Every failure the environment core can surface to a caller.
#[derive(Debug, Error)]
pub enum GymError {
    /// A space was constructed with an inconsistent domain.
    #[error("invalid space: {0}")]
    InvalidSpace(String),

    /// An environment config describes something that cannot be built.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no environment registered with id '{0}'")]
    NotFound(String),

    #[error("registered environment '{id}' does not match requested types (expected {expected}, found {found})")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("action {0} is outside the declared action space")]
    InvalidAction(String),

    /// A space value could not be converted to the requested payload type.
    #[error("expected a {expected} value, got {found}")]
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("wrong amount of actions: got {got}, expecting {expected}")]
    BatchSize { expected: usize, got: usize },

    #[error("step_wait called with no step_async pending")]
    NoPendingStep,

    #[error("unknown render mode '{0}'")]
    UnknownRenderMode(String),

    #[error("environment registry lock was poisoned")]
    RegistryPoisoned,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T, E = GymError> = std::result::Result<T, E>;
