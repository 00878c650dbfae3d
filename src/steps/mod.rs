//! Registered schema steps for the music library.
//!
//! Files are named `m<sequence>_<name>.rs`; add new steps to [`all`].

use crate::migrator::{MigrationStep, Migrator, MigratorError};

mod m1764960000_created_tracks;
mod m1764960748_updated_tracks;
mod m1765112355_updated_tracks;

pub const TRACKS_COLLECTION_ID: &str = "pbc_327047008";

pub fn all() -> Vec<Box<dyn MigrationStep>> {
    vec![
        m1764960000_created_tracks::step(),
        m1764960748_updated_tracks::step(),
        m1765112355_updated_tracks::step(),
    ]
}

/// Migrator over every registered step.
pub fn migrator() -> Result<Migrator, MigratorError> {
    Migrator::new(all())
}
