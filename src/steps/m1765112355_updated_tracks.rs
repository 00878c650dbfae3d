use crate::migrator::{AddFields, MigrationStep};
use crate::schema::{Field, FieldDescriptor, FieldOptions, SelectOptions};

use super::TRACKS_COLLECTION_ID;

pub fn step() -> Box<dyn MigrationStep> {
    let download_status = Field::new(
        "select3120095287",
        "download_status",
        FieldOptions::Select(SelectOptions {
            max_select: 1,
            values: ["queued", "downloading", "completed", "failed"]
                .into_iter()
                .map(String::from)
                .collect(),
        }),
    );

    Box::new(AddFields::new(
        1765112355,
        "updated_tracks",
        TRACKS_COLLECTION_ID,
        vec![FieldDescriptor::new(10, download_status)],
    ))
}
