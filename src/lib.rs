//! lined: a line-oriented text editor in the tradition of ed
//!
//! The library holds the whole editor so it can be driven from tests over
//! in-memory streams. The binary is at src/main.rs.

pub mod address;
pub mod buffer;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod global;
pub mod logger;
pub mod pattern;
pub mod session;
pub mod substitute;

// Re-export commonly used types for convenience
pub use address::{Address, AddressList, AddressTerm, Cursor, Range};
pub use buffer::{Buffer, Line};
pub use command::{Command, ParsedCommand, Statement, parse_statement};
pub use error::{CommandError, EdError, EdResult};
pub use pattern::{ActivePattern, RegexFlavor};
pub use session::{Session, SessionOptions};
