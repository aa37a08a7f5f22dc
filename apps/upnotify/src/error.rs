//! CLI error handling

use std::fmt;

use upnotify_errors::{CacheError, UserFacingError};

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(upnotify_errors::ConfigError),
    /// Error from the session or one of its collaborators
    Session(upnotify_errors::Error),
    /// I/O error
    Io(std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    ///
    /// Errors that end the process before a session can start, such as an
    /// unreadable package cache, exit with 2; everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Session(e) if e.is_fatal_startup() => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Session(upnotify_errors::Error::Cache(CacheError::OpenFailed { message })) => {
                write!(f, "Opening the cache ({message})")
            }
            CliError::Session(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<upnotify_errors::ConfigError> for CliError {
    fn from(e: upnotify_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<upnotify_errors::Error> for CliError {
    fn from(e: upnotify_errors::Error) -> Self {
        match e {
            upnotify_errors::Error::Config(e) => CliError::Config(e),
            e => CliError::Session(e),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_errors_exit_with_two() {
        let err = CliError::from(upnotify_errors::Error::from(CacheError::OpenFailed {
            message: "lock".to_string(),
        }));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Opening the cache (lock)");

        let err = CliError::from(upnotify_errors::ConfigError::Invalid {
            message: "bad".to_string(),
        });
        assert_eq!(err.exit_code(), 1);
    }
}
