use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("NDA must be exactly {expected} characters, got {actual}")]
    InvalidNdaLength { expected: usize, actual: usize },
    #[error("at least one action category is required")]
    MissingActionCategory,
}
