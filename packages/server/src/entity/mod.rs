pub mod blob;
pub mod content_document;
