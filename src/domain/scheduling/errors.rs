//! Scheduling-specific error types.

use crate::domain::foundation::{DomainError, ErrorCode, SessionId, TemplateId};

/// Errors raised by template and session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// Template was not found.
    TemplateNotFound(TemplateId),

    /// Session was not found.
    SessionNotFound(SessionId),

    /// Invalid state for the requested operation.
    InvalidState { current: String, attempted: String },

    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// A single template failed to generate; the batch continues.
    Generation {
        template_id: TemplateId,
        message: String,
    },

    /// Infrastructure error.
    Infrastructure(String),
}

impl SchedulingError {
    pub fn template_not_found(id: TemplateId) -> Self {
        SchedulingError::TemplateNotFound(id)
    }

    pub fn session_not_found(id: SessionId) -> Self {
        SchedulingError::SessionNotFound(id)
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        SchedulingError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SchedulingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn generation(template_id: TemplateId, message: impl Into<String>) -> Self {
        SchedulingError::Generation {
            template_id,
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SchedulingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SchedulingError::TemplateNotFound(_) => ErrorCode::TemplateNotFound,
            SchedulingError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            SchedulingError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            SchedulingError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SchedulingError::Generation { .. } => ErrorCode::GenerationFailed,
            SchedulingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            SchedulingError::TemplateNotFound(id) => format!("Template not found: {}", id),
            SchedulingError::SessionNotFound(id) => format!("Session not found: {}", id),
            SchedulingError::InvalidState { current, attempted } => {
                format!("Cannot {} session in {} state", attempted, current)
            }
            SchedulingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SchedulingError::Generation {
                template_id,
                message,
            } => format!("Generation failed for template {}: {}", template_id, message),
            SchedulingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SchedulingError {}

impl From<DomainError> for SchedulingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => SchedulingError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.to_string(),
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => SchedulingError::ValidationFailed {
                field: "unknown".to_string(),
                message: err.to_string(),
            },
            _ => SchedulingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<SchedulingError> for DomainError {
    fn from(err: SchedulingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_error_categories() {
        assert_eq!(
            SchedulingError::template_not_found(TemplateId::new()).code(),
            ErrorCode::TemplateNotFound
        );
        assert_eq!(
            SchedulingError::generation(TemplateId::new(), "boom").code(),
            ErrorCode::GenerationFailed
        );
        assert_eq!(
            SchedulingError::infrastructure("db down").code(),
            ErrorCode::DatabaseError
        );
    }

    #[test]
    fn domain_error_roundtrip_preserves_code() {
        let err = SchedulingError::session_not_found(SessionId::new());
        let domain: DomainError = err.into();
        assert_eq!(domain.code, ErrorCode::SessionNotFound);
    }

    #[test]
    fn invalid_state_message_names_both_states() {
        let err = SchedulingError::invalid_state("Done", "cancel");
        assert!(err.message().contains("Done"));
        assert!(err.message().contains("cancel"));
    }
}
