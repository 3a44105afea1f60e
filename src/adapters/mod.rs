pub mod file_backup;
pub mod http_api;
pub mod yaml_file_store;

/// Re-export commonly used types from adapters
pub use file_backup::TimestampedBackupSink;
pub use http_api::router;
pub use yaml_file_store::YamlFileStore;
