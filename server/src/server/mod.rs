mod server;
pub use server::{Server, ServerStats};

mod server_config;
pub use server_config::{ServerConfig, ServerMode};
