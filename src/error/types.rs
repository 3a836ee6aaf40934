use thiserror::Error;

/// Unified result type for the page manager.
pub type Result<T> = std::result::Result<T, NavError>;

/// Errors surfaced by navigation requests.
///
/// None of these are fatal: the manager logs the failure, leaves its state
/// untouched and hands the error back so the caller can decide to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("page `{0}` is already installed")]
    DuplicateName(String),
    #[error("page `{0}` not found")]
    NotFound(String),
    #[error("page `{0}` is not installed")]
    NotInstalled(String),
    #[error("page `{0}` is already on the stack")]
    AlreadyOnStack(String),
    #[error("page `{0}` is still on the stack")]
    StillOnStack(String),
    #[error("page switch in progress, request ignored")]
    TransitionBusy,
    #[error("page stack is empty")]
    StackEmpty,
    #[error("stash allocation of {0} bytes failed")]
    AllocationFailure(usize),
    #[error("load animation code {0} is out of range")]
    InvalidTransitionType(u8),
}

impl NavError {
    /// Short machine-friendly name used in log fields and audit details.
    pub fn kind(&self) -> &'static str {
        match self {
            NavError::DuplicateName(_) => "duplicate_name",
            NavError::NotFound(_) => "not_found",
            NavError::NotInstalled(_) => "not_installed",
            NavError::AlreadyOnStack(_) => "already_on_stack",
            NavError::StillOnStack(_) => "still_on_stack",
            NavError::TransitionBusy => "transition_busy",
            NavError::StackEmpty => "stack_empty",
            NavError::AllocationFailure(_) => "allocation_failure",
            NavError::InvalidTransitionType(_) => "invalid_transition_type",
        }
    }
}
