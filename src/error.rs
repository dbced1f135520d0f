use thiserror::Error;

/// Failure of a single document accessor call.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("element <{tag}> carries no geometry")]
    MissingGeometry { tag: String },
    #[error("element <{tag}> has malformed geometry '{value}'")]
    MalformedGeometry { tag: String, value: String },
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),
}

/// Failure of an extraction pass or of one unit of work inside it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("label '{0}' produced no usable field key")]
    UnusableKey(String),
}
