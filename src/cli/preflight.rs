//! Pre-flight checks before starting a chat.
//!
//! Validates that required tools and credentials are available before
//! starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{HjelperError, Result};
use crate::session::Credentials;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// A chat turn needs both API keys.
    Chat { with_csv: bool },
    /// The web UI collects keys per session.
    Serve,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, credentials: &Credentials, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chat { with_csv } => {
            credentials.require()?;
            if with_csv {
                check_python(&settings.csv.python)?;
            }
        }
        Operation::Serve => {}
    }
    Ok(())
}

/// Check that the interpreter runs and can import pandas.
pub fn check_python(python: &str) -> Result<()> {
    match Command::new(python).args(["-c", "import pandas"]).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(HjelperError::ToolNotFound(format!(
            "{} is installed but cannot import pandas",
            python
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HjelperError::ToolNotFound(python.to_string()))
        }
        Err(e) => Err(HjelperError::ToolNotFound(format!("{}: {}", python, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_has_no_requirements() {
        assert!(check(Operation::Serve, &Credentials::default(), &Settings::default()).is_ok());
    }

    #[test]
    fn test_chat_requires_keys() {
        let err = check(Operation::Chat { with_csv: false }, &Credentials::default(), &Settings::default())
            .unwrap_err();
        assert!(matches!(err, HjelperError::MissingCredentials(_)));
    }

    #[test]
    fn test_missing_interpreter() {
        let err = check_python("definitely-not-a-python-binary").unwrap_err();
        assert!(matches!(err, HjelperError::ToolNotFound(_)));
    }
}
