pub mod applied_step;
pub mod collection;
