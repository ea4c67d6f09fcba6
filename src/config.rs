use crate::admin::{GenerateConfigParams, IdentifierFormat};
use crate::core::PeerId;
use serde::{Deserialize, Serialize};

/// Table configuration engine settings
///
/// Loadable from JSON with every field optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How servers and databases are shown in documents and parsed back
    pub identifier_format: IdentifierFormat,

    /// Parameters for placing brand-new tables
    pub generation: GenerateConfigParams,

    /// Capacity of the coordinator's request mailbox
    pub request_queue_depth: usize,

    /// Identity of this participant in the metadata version stamps
    pub peer_id: PeerId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identifier_format: IdentifierFormat::Name,
            generation: GenerateConfigParams::default(),
            request_queue_depth: 64,
            peer_id: PeerId::new_v4(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier display format
    pub fn identifier_format(mut self, format: IdentifierFormat) -> Self {
        self.identifier_format = format;
        self
    }

    /// Set the replica count used for new tables
    pub fn default_replicas(mut self, num_replicas: usize) -> Self {
        self.generation.num_replicas = num_replicas;
        self
    }

    /// Set the coordinator mailbox capacity
    pub fn request_queue_depth(mut self, depth: usize) -> Self {
        self.request_queue_depth = depth;
        self
    }

    /// Set the participant identity
    pub fn peer_id(mut self, peer_id: PeerId) -> Self {
        self.peer_id = peer_id;
        self
    }
}
