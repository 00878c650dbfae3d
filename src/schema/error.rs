#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Collection not found: {name_or_id}")]
    NotFound { name_or_id: String },

    #[error("Field {field_id} already exists in collection {collection}")]
    Conflict {
        collection: String,
        field_id: String,
    },

    #[error("Collection {collection} already exists")]
    CollectionExists { collection: String },

    #[error("Invalid collection {collection}: {reason}")]
    Validation { collection: String, reason: String },

    #[error("Storage error during {operation}: {error_message}")]
    Storage {
        operation: String,
        error_message: String,
    },
}

impl SchemaError {
    pub fn not_found(name_or_id: impl Into<String>) -> Self {
        Self::NotFound {
            name_or_id: name_or_id.into(),
        }
    }

    /// Whether the error reports a duplicate, i.e. the change already ran.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::CollectionExists { .. })
    }

    pub fn storage(operation: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Storage {
            operation: operation.into(),
            error_message: error.to_string(),
        }
    }
}
