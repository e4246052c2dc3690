pub mod output_policy;
pub mod scheduler;
pub mod stats;
pub mod stream;
pub mod stream_registry;
pub mod sync_config;
pub mod synchronizer;
pub mod transport;
