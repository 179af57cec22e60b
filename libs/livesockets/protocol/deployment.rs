use super::progress::Progress;
use serde::{Deserialize, Serialize};

/// Lifecycle states reported for a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Preparing,
    Building,
    Deploying,
    Completed,
    Failed,
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Completed | DeploymentStatus::Failed)
    }
}

/// Server-pushed progress update for one deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentUpdate {
    pub deployment_id: String,
    pub app_id: String,
    pub status: DeploymentStatus,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentUpdate {
    pub fn is_completed(&self) -> bool {
        self.status == DeploymentStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == DeploymentStatus::Failed
    }
}
