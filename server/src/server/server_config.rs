use std::default::Default;

use iomust_shared::DEFAULT_PORT;

use crate::{
    relay::{BroadcastConfig, ForwardConfig},
    sync::{output_policy::OutputPolicyKind, sync_config::SyncConfig},
};

/// Which engine handles the datagrams the Server receives
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMode {
    /// Align every sender into shared slots and release them with the given
    /// OutputPolicy
    Mix(OutputPolicyKind),
    /// Forward each message to the destination in its header
    Forward(ForwardConfig),
    /// Re-send each message to every other configured peer
    Broadcast(BroadcastConfig),
}

impl Default for ServerMode {
    fn default() -> Self {
        ServerMode::Mix(OutputPolicyKind::default())
    }
}

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// UDP port the Server listens on
    pub port: u16,
    /// Used to configure the Synchronizer in Mix mode
    pub sync: SyncConfig,
    /// Determines how received messages are handled
    pub mode: ServerMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            sync: SyncConfig::default(),
            mode: ServerMode::default(),
        }
    }
}
