pub mod schema_store;
