//! Error types for the editor
//!
//! A failed command is recoverable: the session reports `?` and keeps going.
//! Running out of input is not, and ends the session.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Recoverable failure of a single command.
#[derive(Debug)]
pub enum CommandError {
    /// An address term did not resolve to a line in the buffer
    InvalidAddress,
    /// The resolved range does not satisfy `0 < line1 <= line2`
    InvalidRange,
    /// Move destination lies inside the range being moved
    InvalidDestination,
    /// Malformed command text
    Syntax(String),
    /// Unknown command character
    UnknownCommand(char),
    /// Command may not run under a global prefix
    NotInGlobal(char),
    /// Regular expression failed to compile
    BadPattern { pattern: String, message: String },
    /// Empty pattern with no active pattern to fall back on
    NoPreviousPattern,
    /// Substitution matched nothing in the range
    NoMatch,
    /// No filename given and none remembered
    NoFilename,
    /// Reading or writing a file failed
    File { path: PathBuf, source: io::Error },
    /// Writing to the output stream failed
    Output(io::Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidAddress => write!(f, "Invalid address"),
            CommandError::InvalidRange => write!(f, "Invalid address range"),
            CommandError::InvalidDestination => write!(f, "Invalid destination"),
            CommandError::Syntax(msg) => write!(f, "{}", msg),
            CommandError::UnknownCommand(c) => write!(f, "Unknown command: {}", c),
            CommandError::NotInGlobal(c) => {
                write!(f, "Command '{}' not allowed under a global prefix", c)
            }
            CommandError::BadPattern { pattern, message } => {
                write!(f, "Invalid pattern '{}': {}", pattern, message)
            }
            CommandError::NoPreviousPattern => write!(f, "No previous pattern"),
            CommandError::NoMatch => write!(f, "No match"),
            CommandError::NoFilename => write!(f, "No current filename"),
            CommandError::File { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            CommandError::Output(e) => write!(f, "Cannot write output: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::File { source, .. } => Some(source),
            CommandError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::Output(e)
    }
}

/// Outcome of anything that runs inside the session loop.
#[derive(Debug)]
pub enum EdError {
    /// The command failed; report and continue
    Command(CommandError),
    /// The input stream ended; the session is over
    InputExhausted,
}

impl fmt::Display for EdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdError::Command(e) => write!(f, "{}", e),
            EdError::InputExhausted => write!(f, "Unexpected end of input"),
        }
    }
}

impl std::error::Error for EdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EdError::Command(e) => Some(e),
            EdError::InputExhausted => None,
        }
    }
}

impl From<CommandError> for EdError {
    fn from(e: CommandError) -> Self {
        EdError::Command(e)
    }
}

impl From<io::Error> for EdError {
    fn from(e: io::Error) -> Self {
        EdError::Command(CommandError::Output(e))
    }
}

pub type EdResult<T> = Result<T, EdError>;
