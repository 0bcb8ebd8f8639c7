use thiserror;

use crate::primitives::Time;

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ChainError {
    #[error(
        "Items overlap: {item} (offset={offset}) starts before \
        current time ({cursor})"
    )]
    Overlap {
        item: String,
        offset: Time,
        cursor: Time,
    },
    #[error("The shift would result in negative time: {item}, resulting offset: {offset}")]
    NegativeTime { item: String, offset: Time },
    #[error("Expected {expected} at index {index}, found: {found}")]
    StructuralType {
        expected: &'static str,
        index: usize,
        found: String,
    },
    #[error("Event has no duration: {0}")]
    MissingDuration(String),
    #[error("Event has neither explicit nor resolved offset: {0}")]
    UnresolvedOffset(String),
    #[error("No item at path {0:?}")]
    InvalidPath(Vec<usize>),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Key `{key}` is not known. Possible keys: {known}")]
    UnknownConfigKey { key: String, known: String },
    #[error("Can not set `{key}` to {value}: {reason}")]
    InvalidConfigValue {
        key: String,
        value: String,
        reason: String,
    },
}
pub type ChainResult<T> = Result<T, ChainError>;
