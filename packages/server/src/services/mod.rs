pub mod attachments;
pub mod blob;
pub mod sweep;

pub use blob::PendingUpload;
