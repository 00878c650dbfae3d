use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectOptions, ConnectionTrait,
    Database as SeaDatabase, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::path::Path;
use std::time::Duration;

use crate::entities::{applied_step, collection};
use crate::ports::schema_store::{AppliedStep, SchemaStore, StepLedger};
use crate::schema::{Collection, Field, SchemaError, validate::validate_collection};

pub struct Database {
    pub(crate) conn: DatabaseConnection,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create database directory: {}",
                parent.display()
            ))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        let database = Self::bootstrap(conn).await?;
        log::info!("Database ready at: {}", path.display());
        Ok(database)
    }

    /// Create the store's own tables if they don't exist yet.
    pub async fn bootstrap(conn: DatabaseConnection) -> Result<Self> {
        log::debug!("Running store table migrations");
        migration::Migrator::up(&conn, None)
            .await
            .context("Failed to create schema store tables")?;

        Ok(Database { conn })
    }

    /// Schema store and step ledger bound to this database's connection.
    pub fn store(&self) -> SeaSchemaStore<'_, DatabaseConnection> {
        SeaSchemaStore::new(&self.conn)
    }
}

/// [`SchemaStore`] and [`StepLedger`] over any sea-orm connection.
///
/// Bind it to a `DatabaseTransaction` to make a step's save and its ledger
/// entry commit together.
pub struct SeaSchemaStore<'c, C> {
    conn: &'c C,
}

impl<'c, C> SeaSchemaStore<'c, C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// All collections, ordered by name.
    pub async fn list_collections(&self) -> Result<Vec<Collection>, SchemaError> {
        let models = collection::Entity::find()
            .order_by_asc(collection::Column::Name)
            .all(self.conn)
            .await
            .map_err(|e| SchemaError::storage("list collections", e))?;

        models.into_iter().map(model_to_collection).collect()
    }
}

fn model_to_collection(model: collection::Model) -> Result<Collection, SchemaError> {
    let fields: Vec<Field> = serde_json::from_str(&model.fields).map_err(|e| {
        SchemaError::storage(format!("decode fields of collection {}", model.id), e)
    })?;

    Ok(Collection {
        id: model.id,
        name: model.name,
        fields,
    })
}

#[async_trait::async_trait]
impl<'c, C> SchemaStore for SeaSchemaStore<'c, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn find_collection(&self, name_or_id: &str) -> Result<Collection, SchemaError> {
        let by_id = collection::Entity::find_by_id(name_or_id.to_string())
            .one(self.conn)
            .await
            .map_err(|e| SchemaError::storage("find collection by id", e))?;

        let model = match by_id {
            Some(model) => model,
            None => collection::Entity::find()
                .filter(collection::Column::Name.eq(name_or_id))
                .one(self.conn)
                .await
                .map_err(|e| SchemaError::storage("find collection by name", e))?
                .ok_or_else(|| SchemaError::not_found(name_or_id))?,
        };

        model_to_collection(model)
    }

    async fn save_collection(&self, collection: &Collection) -> Result<(), SchemaError> {
        validate_collection(collection)?;

        let name_taken = collection::Entity::find()
            .filter(collection::Column::Name.eq(collection.name.as_str()))
            .filter(collection::Column::Id.ne(collection.id.as_str()))
            .one(self.conn)
            .await
            .map_err(|e| SchemaError::storage("check collection name", e))?;
        if let Some(other) = name_taken {
            return Err(SchemaError::Validation {
                collection: collection.id.clone(),
                reason: format!(
                    "collection name `{}` is already used by {}",
                    collection.name, other.id
                ),
            });
        }

        let fields = serde_json::to_string(&collection.fields).map_err(|e| {
            SchemaError::storage(format!("encode fields of collection {}", collection.id), e)
        })?;
        let now = chrono::Utc::now().timestamp();

        let existing = collection::Entity::find_by_id(collection.id.clone())
            .one(self.conn)
            .await
            .map_err(|e| SchemaError::storage("find collection by id", e))?;

        match existing {
            Some(model) => {
                let mut active: collection::ActiveModel = model.into();
                active.name = ActiveValue::Set(collection.name.clone());
                active.fields = ActiveValue::Set(fields);
                active.updated_at = ActiveValue::Set(now);
                active
                    .update(self.conn)
                    .await
                    .map_err(|e| SchemaError::storage("update collection", e))?;
                log::debug!(
                    "Collection updated: '{}' ({}, {} fields)",
                    collection.name,
                    collection.id,
                    collection.fields.len()
                );
            }
            None => {
                collection::ActiveModel {
                    id: ActiveValue::Set(collection.id.clone()),
                    name: ActiveValue::Set(collection.name.clone()),
                    fields: ActiveValue::Set(fields),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                }
                .insert(self.conn)
                .await
                .map_err(|e| SchemaError::storage("insert collection", e))?;
                log::debug!(
                    "Collection created: '{}' ({})",
                    collection.name,
                    collection.id
                );
            }
        }

        Ok(())
    }

    async fn delete_collection(&self, id: &str) -> Result<(), SchemaError> {
        let result = collection::Entity::delete_by_id(id.to_string())
            .exec(self.conn)
            .await
            .map_err(|e| SchemaError::storage("delete collection", e))?;

        if result.rows_affected == 0 {
            log::debug!("Collection {} already absent, nothing to delete", id);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'c, C> StepLedger for SeaSchemaStore<'c, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn applied_steps(&self) -> Result<Vec<AppliedStep>, SchemaError> {
        let models = applied_step::Entity::find()
            .order_by_asc(applied_step::Column::Sequence)
            .all(self.conn)
            .await
            .map_err(|e| SchemaError::storage("list applied steps", e))?;

        Ok(models
            .into_iter()
            .map(|m| AppliedStep {
                id: m.id,
                sequence: m.sequence,
                applied_at: m.applied_at,
            })
            .collect())
    }

    async fn is_applied(&self, step_id: &str) -> Result<bool, SchemaError> {
        let found = applied_step::Entity::find_by_id(step_id.to_string())
            .one(self.conn)
            .await
            .map_err(|e| SchemaError::storage("look up applied step", e))?;

        Ok(found.is_some())
    }

    async fn record_applied(&self, step_id: &str, sequence: i64) -> Result<(), SchemaError> {
        applied_step::ActiveModel {
            id: ActiveValue::Set(step_id.to_string()),
            sequence: ActiveValue::Set(sequence),
            applied_at: ActiveValue::Set(chrono::Utc::now().timestamp()),
        }
        .insert(self.conn)
        .await
        .map_err(|e| SchemaError::storage(format!("record step {} as applied", step_id), e))?;

        Ok(())
    }

    async fn record_reverted(&self, step_id: &str) -> Result<(), SchemaError> {
        applied_step::Entity::delete_by_id(step_id.to_string())
            .exec(self.conn)
            .await
            .map_err(|e| SchemaError::storage(format!("record step {} as reverted", step_id), e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldOptions, SelectOptions};
    use crate::test_utils::{test_db, tracks_collection};

    #[tokio::test]
    async fn test_find_missing_collection() {
        let db = test_db().await;

        let result = db.store().find_collection("pbc_missing").await;

        assert!(matches!(result, Err(SchemaError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_save_then_find_by_id_and_name() {
        let db = test_db().await;
        let store = db.store();
        let tracks = tracks_collection();

        store.save_collection(&tracks).await.unwrap();

        assert_eq!(store.find_collection("pbc_327047008").await.unwrap(), tracks);
        assert_eq!(store.find_collection("tracks").await.unwrap(), tracks);
    }

    #[tokio::test]
    async fn test_save_updates_existing_collection() {
        let db = test_db().await;
        let store = db.store();
        let mut tracks = tracks_collection();
        store.save_collection(&tracks).await.unwrap();

        tracks.name = "songs".to_string();
        tracks.fields.pop();
        store.save_collection(&tracks).await.unwrap();

        let found = store.find_collection("pbc_327047008").await.unwrap();
        assert_eq!(found.name, "songs");
        assert_eq!(found.fields.len(), 2);
        assert_eq!(store.list_collections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_field() {
        let db = test_db().await;
        let store = db.store();
        let mut tracks = tracks_collection();
        tracks.fields.push(Field::new(
            "select1",
            "download_status",
            FieldOptions::Select(SelectOptions::default()),
        ));

        let result = store.save_collection(&tracks).await;

        assert!(matches!(result, Err(SchemaError::Validation { .. })));
        assert!(matches!(
            store.find_collection("pbc_327047008").await,
            Err(SchemaError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_rejects_taken_name() {
        let db = test_db().await;
        let store = db.store();
        store.save_collection(&tracks_collection()).await.unwrap();

        let other = Collection::new("pbc_other", "tracks");
        let err = store.save_collection(&other).await.unwrap_err();

        assert!(err.to_string().contains("already used by pbc_327047008"));
    }

    #[tokio::test]
    async fn test_delete_collection_is_idempotent() {
        let db = test_db().await;
        let store = db.store();
        store.save_collection(&tracks_collection()).await.unwrap();

        store.delete_collection("pbc_327047008").await.unwrap();
        store.delete_collection("pbc_327047008").await.unwrap();

        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_round_trip() {
        let db = test_db().await;
        let store = db.store();

        store.record_applied("200_second", 200).await.unwrap();
        store.record_applied("100_first", 100).await.unwrap();

        assert!(store.is_applied("100_first").await.unwrap());
        let ids: Vec<_> = store
            .applied_steps()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["100_first", "200_second"]);

        store.record_reverted("100_first").await.unwrap();
        assert!(!store.is_applied("100_first").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schema.db");

        let db = Database::open(&path).await.unwrap();
        db.store().save_collection(&tracks_collection()).await.unwrap();
        drop(db);

        let reopened = Database::open(&path).await.unwrap();
        assert_eq!(reopened.store().list_collections().await.unwrap().len(), 1);
    }
}
