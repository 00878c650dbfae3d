use crate::schema::{Collection, SchemaError};

/// A ledger row: a step that has been applied, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    pub id: String,
    pub sequence: i64,
    /// Unix timestamp (seconds)
    pub applied_at: i64,
}

/// Port trait for the collection definitions migration steps act on.
///
/// The production implementation is `database::SeaSchemaStore`; tests use
/// the generated mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SchemaStore: Send + Sync {
    /// Look a collection up by id, falling back to its name.
    async fn find_collection(&self, name_or_id: &str) -> Result<Collection, SchemaError>;

    /// Validate and persist `collection`, inserting it when its id is new.
    async fn save_collection(&self, collection: &Collection) -> Result<(), SchemaError>;

    /// Remove a collection. Deleting a missing collection is not an error.
    async fn delete_collection(&self, id: &str) -> Result<(), SchemaError>;
}

/// Port trait for the persisted record of which steps have run.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StepLedger: Send + Sync {
    /// Applied steps ordered by ascending sequence.
    async fn applied_steps(&self) -> Result<Vec<AppliedStep>, SchemaError>;

    async fn is_applied(&self, step_id: &str) -> Result<bool, SchemaError>;

    async fn record_applied(&self, step_id: &str, sequence: i64) -> Result<(), SchemaError>;

    async fn record_reverted(&self, step_id: &str) -> Result<(), SchemaError>;
}
