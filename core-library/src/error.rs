use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid stored value: {field} - {message}")]
    InvalidStoredValue { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, LibraryError>;
