//! Output destinations for renderers that write files.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a file-producing renderer writes its document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputDestination {
    /// Write to standard output
    #[default]
    Stdout,
    /// Write to a specific file
    File(PathBuf),
}

impl OutputDestination {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        OutputDestination::File(path.into())
    }

    /// Fails if a file destination's parent directory is missing.
    pub fn validate(&self) -> std::io::Result<()> {
        match self {
            OutputDestination::Stdout => Ok(()),
            OutputDestination::File(path) => validate_path(path),
        }
    }

    /// Writes binary content to this destination.
    pub fn write_binary(&self, content: &[u8]) -> std::io::Result<()> {
        match self {
            OutputDestination::Stdout => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(content)?;
                handle.flush()
            }
            OutputDestination::File(path) => {
                validate_path(path)?;
                std::fs::write(path, content)
            }
        }
    }
}

impl fmt::Display for OutputDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDestination::Stdout => f.write_str("stdout"),
            OutputDestination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Validates that a file path's parent directory exists.
fn validate_path(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Parent directory does not exist: {}", parent.display()),
            ));
        }
    }
    Ok(())
}
