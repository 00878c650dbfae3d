mod add_fields;
mod create_collection;
mod runner;

pub use add_fields::AddFields;
pub use create_collection::CreateCollection;
pub use runner::{Migrator, StepStatus};

use crate::ports::schema_store::SchemaStore;
use crate::schema::SchemaError;

#[derive(Debug, thiserror::Error)]
pub enum MigratorError {
    #[error("Steps {first} and {second} share sequence {sequence}")]
    DuplicateSequence {
        sequence: i64,
        first: String,
        second: String,
    },
    #[error("Step id {0} is registered twice")]
    DuplicateId(String),
    #[error("Step {step} failed: {source}")]
    Step { step: String, source: SchemaError },
    #[error("Applied step {0} is not registered with this migrator")]
    UnknownAppliedStep(String),
    #[error("Failed to read step ledger: {0}")]
    Ledger(#[from] SchemaError),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// One reversible schema change.
///
/// Steps never run concurrently; the runner applies them in ascending
/// [`sequence`](MigrationStep::sequence) order and reverts in descending
/// order.
#[async_trait::async_trait]
pub trait MigrationStep: Send + Sync {
    /// Ledger key, `<sequence>_<name>`
    fn id(&self) -> &str;

    fn sequence(&self) -> i64;

    async fn apply(&self, store: &dyn SchemaStore) -> Result<(), SchemaError>;

    async fn revert(&self, store: &dyn SchemaStore) -> Result<(), SchemaError>;
}

fn step_id(sequence: i64, name: &str) -> String {
    format!("{}_{}", sequence, name)
}
