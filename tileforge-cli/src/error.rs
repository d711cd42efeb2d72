//! CLI error types.

use std::fmt;

/// Errors that can occur running a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be read or parsed.
    Config(String),

    /// Invalid engine configuration.
    Engine(tileforge::ConfigError),

    /// Invalid tile coordinate on the command line.
    Coord(tileforge::CoordError),

    /// HTTP client construction failed.
    Source(tileforge::SourceError),

    /// I/O error writing output.
    Io(std::io::Error),

    /// The requested tile could not be resolved.
    Unavailable,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Engine(e) => write!(f, "Invalid engine configuration: {}", e),
            CliError::Coord(e) => write!(f, "Invalid tile coordinate: {}", e),
            CliError::Source(e) => write!(f, "HTTP client error: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Unavailable => write!(f, "Tile unavailable"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Engine(e) => Some(e),
            CliError::Coord(e) => Some(e),
            CliError::Source(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<tileforge::ConfigError> for CliError {
    fn from(e: tileforge::ConfigError) -> Self {
        CliError::Engine(e)
    }
}

impl From<tileforge::CoordError> for CliError {
    fn from(e: tileforge::CoordError) -> Self {
        CliError::Coord(e)
    }
}

impl From<tileforge::SourceError> for CliError {
    fn from(e: tileforge::SourceError) -> Self {
        CliError::Source(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
