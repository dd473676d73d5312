mod error;
mod key;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use key::{BlobFolder, StorageKey};
pub use traits::{BlobStore, BoxReader};
