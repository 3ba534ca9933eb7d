/// Database model definitions.
pub mod models;
/// Match, team and profile persistence.
pub mod score_store;
/// Storage abstraction layer for database operations.
pub mod storage;
