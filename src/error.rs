/// Validation failure raised while building or rendering a node tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SafeDomError {
    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("Invalid attribute name: {0:?}")]
    InvalidAttributeName(String),

    #[error("Invalid entity: {0:?}")]
    InvalidEntity(String),

    #[error("Entity no longer matches the entity grammar: {0:?}")]
    TamperedEntity(String),
}

pub type Result<T> = std::result::Result<T, SafeDomError>;
