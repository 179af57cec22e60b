use super::progress::Progress;
use serde::{Deserialize, Serialize};

/// Lifecycle states reported for an app generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Initializing,
    Blueprint,
    Generating,
    Reviewing,
    Completed,
    Failed,
    Cancelled,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Completed | GenerationStatus::Failed | GenerationStatus::Cancelled
        )
    }
}

/// A file produced by the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Server-pushed progress update for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationUpdate {
    pub generation_id: String,
    pub status: GenerationStatus,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<GeneratedFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationUpdate {
    pub fn is_completed(&self) -> bool {
        self.status == GenerationStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == GenerationStatus::Failed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == GenerationStatus::Cancelled
    }
}
