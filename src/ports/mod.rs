pub mod backup_sink;
pub mod document_store;

pub use backup_sink::BackupSink;
pub use document_store::DocumentStore;
