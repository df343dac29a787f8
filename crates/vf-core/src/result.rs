use serde::{Deserialize, Serialize};

/// A finished generation as handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Script the service wrote, only present for topic generations
    pub script: Option<String>,
    /// Absolute URL of the produced video, reachable from this device
    pub artifact_url: String,
}
