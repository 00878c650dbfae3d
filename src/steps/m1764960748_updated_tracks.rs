use crate::migrator::{AddFields, MigrationStep};
use crate::schema::{Field, FieldDescriptor};

use super::TRACKS_COLLECTION_ID;

/// Track metadata copied from Spotify when a track is queued.
pub fn step() -> Box<dyn MigrationStep> {
    Box::new(AddFields::new(
        1764960748,
        "updated_tracks",
        TRACKS_COLLECTION_ID,
        vec![
            FieldDescriptor::new(3, Field::text("text724990059", "title")),
            FieldDescriptor::new(4, Field::text("text22648455", "artist")),
            FieldDescriptor::new(5, Field::text("text966291011", "album")),
            FieldDescriptor::new(6, Field::number("number2254405824", "duration")),
        ],
    ))
}
