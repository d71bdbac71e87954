//! Values handed back to the caller

use crate::artifact::{Artifact, FileType};
use crate::conversation::{preview, AgentRole, ConversationLog};
use crate::plan::ProjectType;
use crate::scorer::ScoreBreakdown;
use crate::stages::tester::TestReport;
use serde::{Deserialize, Serialize};

const ARTIFACT_PREVIEW_CHARS: usize = 200;

/// One scored iteration. Only the best one is kept.
#[derive(Debug, Clone)]
pub struct IterationResult {
    pub artifacts: Vec<Artifact>,
    pub run_instructions: String,
    pub test: TestReport,
    pub quality_score: f64,
    pub breakdown: ScoreBreakdown,
    pub iteration_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSummary {
    pub path: String,
    pub file_type: FileType,
    pub size: usize,
    pub dependencies: Vec<String>,
    pub preview: String,
}

impl From<&Artifact> for ArtifactSummary {
    fn from(artifact: &Artifact) -> Self {
        Self {
            path: artifact.path.clone(),
            file_type: artifact.file_type,
            size: artifact.content.len(),
            dependencies: artifact.dependencies.clone(),
            preview: preview(&artifact.content, ARTIFACT_PREVIEW_CHARS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub turns: usize,
    /// Roles that spoke, in order of first appearance
    pub roles: Vec<AgentRole>,
    /// The prompt window at the end of the run
    pub recent: String,
}

impl ConversationSummary {
    pub fn of(log: &ConversationLog, window: usize) -> Self {
        Self {
            turns: log.len(),
            roles: log.roles(),
            recent: log.render_recent(window),
        }
    }
}

/// Terminal value of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub status: Status,
    pub message: String,
    pub request: String,
    pub run_instructions: String,
    pub project_type: ProjectType,
    pub artifacts: Vec<ArtifactSummary>,
    pub dependencies: Vec<String>,
    pub workspace_files: Vec<String>,
    pub conversation: ConversationSummary,
    pub quality_score: f64,
    pub breakdown: ScoreBreakdown,
    /// Furthest step reached, 1..=8
    pub current_step: u8,
    pub step_progress: String,
    pub iterations_run: u32,
    pub best_iteration: Option<u32>,
    /// Score of every scored iteration, in order
    pub score_history: Vec<f64>,
    pub errors: Vec<String>,
    pub cancelled: bool,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Project type as seen from the files actually produced
pub fn project_type_of(artifacts: &[Artifact]) -> ProjectType {
    let has = |ty| artifacts.iter().any(|a| a.file_type == ty);
    if has(FileType::Html) && has(FileType::Css) && has(FileType::Javascript) {
        ProjectType::WebApp
    } else if has(FileType::Python) && artifacts.len() > 1 {
        ProjectType::MultiFile
    } else if has(FileType::Python) {
        ProjectType::SingleFile
    } else {
        ProjectType::Unknown
    }
}
