use thiserror::Error;

use crate::{confirm::ConfirmTransitionError, domain::case::CaseStatus};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid case transition from {from:?} to {to:?}")]
    InvalidCaseTransition { from: CaseStatus, to: CaseStatus },
    #[error(transparent)]
    ConfirmTransition(#[from] ConfirmTransitionError),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("provider failure: {0}")]
    Provider(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(_) => "The request could not be processed. Check inputs and try again.",
            Self::Persistence(_) => "The record store is temporarily unavailable. Please retry shortly.",
            Self::Provider(_) => "The language model is temporarily unavailable. Please retry shortly.",
            Self::Configuration(_) => "An unexpected internal error occurred.",
        }
    }
}
