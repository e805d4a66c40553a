#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The target id names no live node.
    NotFound { id: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound { id } => write!(f, "no live node with id {id:?}"),
        }
    }
}

impl std::error::Error for StoreError {}
