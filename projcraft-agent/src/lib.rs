//! # projcraft Agent
//!
//! Turns a free-text project request into files and run instructions:
//! 1. Planner turns the request into a plan
//! 2. Architect turns the plan into a file structure
//! 3. Developer generates every file, Reviewer normalizes them
//! 4. Tester writes run instructions
//! 5. Files are materialized and scored
//! 6. Steps 3 to 5 repeat against a revised structure until the score
//!    reaches the threshold or the iteration budget runs out
//!
//! Every stage degrades from the model to a reduced prompt to a canned
//! heuristic, so a run always ends with an outcome value.

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod conversation;
mod fields;
pub mod outcome;
pub mod pipeline;
pub mod plan;
pub mod progress;
pub mod scorer;
pub mod stages;
pub mod structure;
pub mod templates;
pub mod tiers;

pub use artifact::{Artifact, FileType};
pub use catalog::Category;
pub use config::PipelineConfig;
pub use conversation::{AgentRole, ConversationLog, ConversationMessage};
pub use outcome::{ArtifactSummary, ConversationSummary, IterationResult, PipelineOutcome, Status};
pub use pipeline::Pipeline;
pub use plan::{Plan, ProjectType};
pub use progress::{Progress, Step};
pub use scorer::{score, ScoreBreakdown};
pub use stages::tester::TestReport;
pub use stages::StageContext;
pub use structure::{FileSpec, Structure};
pub use tiers::{degrade, Degraded, Tier};
