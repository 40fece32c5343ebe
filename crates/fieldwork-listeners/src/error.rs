use crate::category::Category;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Fieldwork error: {0}")]
    Fieldwork(#[from] fieldwork_core::error::FieldworkError),

    /// Opening a congregation-scoped category before a congregation is bound.
    #[error("No congregation bound for {0} listener")]
    NoCongregation(Category),

    #[error("Invalid listener state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, ListenerError>;
