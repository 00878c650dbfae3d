use std::sync::Arc;

use sea_orm::{ConnectOptions, Database as SeaDatabase};

use crate::database::Database;
use crate::schema::{Collection, Field, FieldOptions, FileOptions};
use crate::steps::TRACKS_COLLECTION_ID;

pub async fn test_db() -> Arc<Database> {
    // A second pooled connection would open a separate in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:?mode=rwc");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = SeaDatabase::connect(opt).await.unwrap();

    Arc::new(Database::bootstrap(conn).await.unwrap())
}

/// The tracks collection as it looks before any metadata fields exist.
pub fn tracks_collection() -> Collection {
    Collection::new(TRACKS_COLLECTION_ID, "tracks").with_fields(vec![
        Field::text("text3208210256", "id")
            .primary_key()
            .required()
            .system(),
        Field::text("text1430225584", "spotify_track_id").required(),
        Field::new(
            "file2359244304",
            "file",
            FieldOptions::File(FileOptions {
                max_select: 1,
                ..Default::default()
            }),
        ),
    ])
}
