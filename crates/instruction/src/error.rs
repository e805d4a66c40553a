#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// The instruction names no known operation.
    UnknownOperation { name: String },
    /// `arguments` was a string that is not valid JSON, or a field had an
    /// unusable type.
    BadArguments { detail: String },
    /// A required field for the operation is absent.
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::UnknownOperation { name } => {
                write!(f, "unknown operation {name:?}")
            }
            ValidationError::BadArguments { detail } => {
                write!(f, "bad arguments: {detail}")
            }
            ValidationError::MissingField { operation, field } => {
                write!(f, "{operation} requires field {field:?}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
