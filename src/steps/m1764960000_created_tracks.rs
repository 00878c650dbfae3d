use crate::migrator::{CreateCollection, MigrationStep};
use crate::schema::{AutodateOptions, Collection, Field, FieldOptions, FileOptions, TextOptions};

use super::TRACKS_COLLECTION_ID;

pub fn step() -> Box<dyn MigrationStep> {
    let tracks = Collection::new(TRACKS_COLLECTION_ID, "tracks").with_fields(vec![
        Field::new(
            "text3208210256",
            "id",
            FieldOptions::Text(TextOptions {
                min: 15,
                max: 15,
                pattern: "^[a-z0-9]+$".to_string(),
                autogenerate_pattern: "[a-z0-9]{15}".to_string(),
            }),
        )
        .primary_key()
        .required()
        .system(),
        Field::text("text1430225584", "spotify_track_id").required(),
        Field::new(
            "file2359244304",
            "file",
            FieldOptions::File(FileOptions {
                max_select: 1,
                max_size: 0,
                mime_types: vec!["audio/mpeg".to_string()],
            }),
        ),
        Field::new(
            "autodate2990389176",
            "created",
            FieldOptions::Autodate(AutodateOptions {
                on_create: true,
                on_update: false,
            }),
        ),
        Field::new(
            "autodate3332085495",
            "updated",
            FieldOptions::Autodate(AutodateOptions {
                on_create: true,
                on_update: true,
            }),
        ),
    ]);

    Box::new(CreateCollection::new(1764960000, "created_tracks", tracks))
}
