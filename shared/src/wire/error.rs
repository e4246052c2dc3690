use thiserror::Error;

/// Errors that can occur while decoding a message from the wire
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Buffer too short to hold the fixed header (SECURITY: untrusted network data)
    #[error("Malformed message of {length} bytes: the header alone requires {expected} bytes")]
    MalformedMessage { length: usize, expected: usize },
}
