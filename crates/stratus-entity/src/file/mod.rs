//! File domain entities.

pub mod model;
pub mod object_key;
pub mod revision;

pub use model::{File, FileWithRevisions};
pub use object_key::ObjectKey;
pub use revision::FileRevision;
