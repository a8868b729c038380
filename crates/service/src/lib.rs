//! Service layer: the storage adapter over pluggable persistence backends.
//! - `storage::Storage` is the uniform contract handlers program against.
//! - `storage::FileStore` persists a JSON snapshot of all records.
//! - `storage::DbStore` stages operations and commits them per `save`.

pub mod errors;
pub mod storage;
#[cfg(test)]
pub mod test_support;
