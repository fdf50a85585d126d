//! Validation functions for configuration values.

use validator::ValidationError;

use std::path::PathBuf;

pub fn validate_non_empty_paths(paths: &[PathBuf]) -> Result<(), ValidationError> {
    if let Some(idx) = paths.iter().position(|p| p.as_os_str().is_empty()) {
        return Err(ValidationError::new("EmptyPath")
            .with_message(format!("path #{idx} is empty").into()));
    }

    Ok(())
}
