/// Errors raised while loading a question catalog.
///
/// The scoring and generation functions themselves never fail; only reference
/// data supplied from outside the crate can be rejected.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("malformed catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),

    #[error("question {id} has unknown category: {category}")]
    UnknownCategory { id: String, category: String },
}
