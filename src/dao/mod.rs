/// Database model definitions.
pub mod models;
/// Session, question, player, and answer storage operations.
pub mod session_store;
/// Storage abstraction layer for backend errors.
pub mod storage;
