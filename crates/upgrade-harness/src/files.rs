//! Reading catalogue, genesis and config files

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use upgrade_core::HarnessError;

/// File loading errors
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// File could not be read
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// File
        path: PathBuf,
        /// Cause
        #[source]
        source: std::io::Error,
    },

    /// File content is malformed
    #[error("cannot parse {}: {reason}", .path.display())]
    Parse {
        /// File
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

impl From<FileError> for HarnessError {
    fn from(error: FileError) -> Self {
        HarnessError::Configuration(error.to_string())
    }
}

/// Read a file to a string
///
/// # Errors
/// Returns `FileError::Read` on I/O failure
pub async fn read_text(path: &Path) -> Result<String, FileError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Read JSON or YAML, chosen by extension (`.yaml`/`.yml` are YAML)
///
/// # Errors
/// Returns `FileError` if the file cannot be read or parsed
pub async fn read_structured<T: DeserializeOwned>(path: &Path) -> Result<T, FileError> {
    let text = read_text(path).await?;
    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| FileError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_by_extension() {
        assert!(is_yaml(Path::new("catalogue.yaml")));
        assert!(is_yaml(Path::new("dir/genesis.yml")));
        assert!(!is_yaml(Path::new("catalogue.json")));
        assert!(!is_yaml(Path::new("catalogue")));
    }

    #[tokio::test]
    async fn missing_file_is_a_configuration_error() {
        let err = read_text(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("cannot read /definitely/not/here.json"));
        assert!(HarnessError::from(err).is_fatal());
    }
}
