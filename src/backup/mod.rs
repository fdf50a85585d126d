pub mod archive;
pub mod backup_config;
pub mod log_sink;
pub mod orchestrator;
pub mod path;
pub mod result_error;
pub mod validate;
pub mod zip_writer;
