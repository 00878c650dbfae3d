use crate::ports::schema_store::SchemaStore;
use crate::schema::{FieldDescriptor, SchemaError};

use super::{MigrationStep, step_id};

/// Inserts fields into an existing collection; reverting removes them by id.
pub struct AddFields {
    id: String,
    sequence: i64,
    collection: String,
    fields: Vec<FieldDescriptor>,
}

impl AddFields {
    pub fn new(
        sequence: i64,
        name: &str,
        collection: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            id: step_id(sequence, name),
            sequence,
            collection: collection.into(),
            fields,
        }
    }
}

#[async_trait::async_trait]
impl MigrationStep for AddFields {
    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(&self) -> i64 {
        self.sequence
    }

    async fn apply(&self, store: &dyn SchemaStore) -> Result<(), SchemaError> {
        let mut collection = store.find_collection(&self.collection).await?;

        for descriptor in &self.fields {
            let index = collection.add_field_at(descriptor.position, descriptor.field.clone())?;
            if index != descriptor.position {
                log::warn!(
                    "{} field {} ('{}') requested position {} in collection {}, appended at {}",
                    descriptor.field.type_name(),
                    descriptor.field.id,
                    descriptor.field.name,
                    descriptor.position,
                    collection.id,
                    index
                );
            }
        }

        store.save_collection(&collection).await?;
        log::info!(
            "Step {}: added {} field(s) to collection '{}'",
            self.id,
            self.fields.len(),
            collection.name
        );
        Ok(())
    }

    async fn revert(&self, store: &dyn SchemaStore) -> Result<(), SchemaError> {
        let mut collection = store.find_collection(&self.collection).await?;

        let mut removed = 0;
        for descriptor in &self.fields {
            match collection.remove_field_by_id(&descriptor.field.id) {
                Some(_) => removed += 1,
                None => log::debug!(
                    "Field {} not present in collection {}, skipping",
                    descriptor.field.id,
                    collection.id
                ),
            }
        }

        store.save_collection(&collection).await?;
        log::info!(
            "Step {}: removed {} field(s) from collection '{}'",
            self.id,
            removed,
            collection.name
        );
        Ok(())
    }
}
