use serde::{Deserialize, Serialize};

/// Progress block carried by generation and deployment updates
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Progress {
    pub stage: String,
    pub percentage: f64,
    pub message: String,
}
