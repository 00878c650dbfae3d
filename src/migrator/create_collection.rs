use crate::ports::schema_store::SchemaStore;
use crate::schema::{Collection, SchemaError};

use super::{MigrationStep, step_id};

/// Creates a collection with its initial fields; reverting deletes it.
pub struct CreateCollection {
    id: String,
    sequence: i64,
    collection: Collection,
}

impl CreateCollection {
    pub fn new(sequence: i64, name: &str, collection: Collection) -> Self {
        Self {
            id: step_id(sequence, name),
            sequence,
            collection,
        }
    }
}

#[async_trait::async_trait]
impl MigrationStep for CreateCollection {
    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(&self) -> i64 {
        self.sequence
    }

    async fn apply(&self, store: &dyn SchemaStore) -> Result<(), SchemaError> {
        match store.find_collection(&self.collection.id).await {
            Ok(_) => {
                return Err(SchemaError::CollectionExists {
                    collection: self.collection.id.clone(),
                });
            }
            Err(SchemaError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        store.save_collection(&self.collection).await?;
        log::info!(
            "Step {}: created collection '{}' ({})",
            self.id,
            self.collection.name,
            self.collection.id
        );
        Ok(())
    }

    async fn revert(&self, store: &dyn SchemaStore) -> Result<(), SchemaError> {
        store.delete_collection(&self.collection.id).await?;
        log::info!(
            "Step {}: deleted collection '{}' ({})",
            self.id,
            self.collection.name,
            self.collection.id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::schema_store::MockSchemaStore;
    use crate::schema::Field;

    fn step() -> CreateCollection {
        CreateCollection::new(
            50,
            "created_albums",
            Collection::new("pbc_albums", "albums").with_fields(vec![Field::text("text1", "name")]),
        )
    }

    #[tokio::test]
    async fn test_apply_saves_new_collection() {
        let mut store = MockSchemaStore::new();
        store
            .expect_find_collection()
            .returning(|name_or_id| Err(SchemaError::not_found(name_or_id)));
        store
            .expect_save_collection()
            .withf(|c| c.id == "pbc_albums" && c.fields.len() == 1)
            .times(1)
            .returning(|_| Ok(()));

        step().apply(&store).await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_existing_collection_conflicts() {
        let mut store = MockSchemaStore::new();
        store
            .expect_find_collection()
            .returning(|_| Ok(Collection::new("pbc_albums", "albums")));
        store.expect_save_collection().never();

        let err = step().apply(&store).await.unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_apply_surfaces_storage_errors() {
        let mut store = MockSchemaStore::new();
        store
            .expect_find_collection()
            .returning(|_| Err(SchemaError::storage("find collection by id", "locked")));
        store.expect_save_collection().never();

        let err = step().apply(&store).await.unwrap_err();

        assert!(matches!(err, SchemaError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_revert_deletes() {
        let mut store = MockSchemaStore::new();
        store
            .expect_delete_collection()
            .withf(|id| id == "pbc_albums")
            .times(1)
            .returning(|_| Ok(()));

        step().revert(&store).await.unwrap();
    }
}
