//! Core traits defined in `stratus-core` and implemented by other crates.

pub mod object_store;

pub use object_store::{ByteStream, ObjectStore};
