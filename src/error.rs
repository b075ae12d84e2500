use derive_more::Display;
use error_stack::Report;
use std::error::Error;

pub type ESResult<T, E> = Result<T, Report<E>>;

#[derive(Debug, Display, Clone, Copy, Eq, PartialEq)]
pub enum JdklinkError {
    /// Wrong command line.
    #[display("Invalid invocation")]
    Usage,
    /// The API could not be reached, or answered with a failure.
    #[display("Failed to fetch the JDK from the API")]
    Transport,
    /// The API answered, but not with something we understand.
    #[display("Unexpected response from the API")]
    Parse,
    /// Error from the local filesystem.
    #[display("Filesystem operation failed")]
    Filesystem,
    /// The downloaded archive could not be read or extracted.
    #[display("Failed to process the JDK archive")]
    Archive,
}

impl Error for JdklinkError {}

impl JdklinkError {
    /// Process exit code for a run that failed with this error.
    pub fn exit_code(self) -> i32 {
        match self {
            JdklinkError::Usage => 1,
            JdklinkError::Transport => 2,
            JdklinkError::Parse => 3,
            JdklinkError::Filesystem => 4,
            JdklinkError::Archive => 5,
        }
    }
}

/// Message for the user, printed instead of the full report when present.
#[derive(Debug)]
pub struct UserMessage {
    pub message: String,
}
