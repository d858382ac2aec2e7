use thiserror::Error;

/// Errors surfaced by the horse and owner services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced horse or owner does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Malformed input the caller can fix without new data.
    #[error("{summary}: {}", .errors.join(", "))]
    Validation { summary: String, errors: Vec<String> },

    /// Well-formed input that contradicts stored state.
    #[error("{summary}: {}", .errors.join(", "))]
    Conflict { summary: String, errors: Vec<String> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Broken store invariant; never the caller's fault.
    #[error("Fatal: {0}")]
    Fatal(String),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        ServiceError::Fatal(message.into())
    }

    /// Ok when `errors` is empty, otherwise a validation failure carrying all of them.
    pub fn validation(summary: &str, errors: Vec<String>) -> Result<(), Self> {
        if errors.is_empty() {
            return Ok(());
        }
        Err(ServiceError::Validation {
            summary: summary.to_string(),
            errors,
        })
    }

    /// Ok when `errors` is empty, otherwise a conflict carrying all of them.
    pub fn conflict(summary: &str, errors: Vec<String>) -> Result<(), Self> {
        if errors.is_empty() {
            return Ok(());
        }
        Err(ServiceError::Conflict {
            summary: summary.to_string(),
            errors,
        })
    }

    /// Individual violation messages, empty for kinds that carry a single message.
    pub fn errors(&self) -> &[String] {
        match self {
            ServiceError::Validation { errors, .. } | ServiceError::Conflict { errors, .. } => {
                errors
            }
            _ => &[],
        }
    }

    pub fn summary(&self) -> String {
        match self {
            ServiceError::Validation { summary, .. } | ServiceError::Conflict { summary, .. } => {
                summary.clone()
            }
            other => other.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
