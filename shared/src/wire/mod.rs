pub mod error;
pub mod wire_message;
