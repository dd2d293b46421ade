use thiserror::Error;

/// Errors raised while assembling a relay.
///
/// Provider failures during a turn are not errors: they are reported as
/// [`crate::StageOutcome`] values so the turn can degrade instead of abort.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("No model configured for the {0} stage")]
    EmptyModel(&'static str),

    #[error("Reasoning prompt must contain the {{query}} placeholder: {0}")]
    InvalidReasoningPrompt(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
