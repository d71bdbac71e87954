//! Pipeline - drives the stages and the quality loop

use crate::artifact::Artifact;
use crate::config::PipelineConfig;
use crate::conversation::ConversationLog;
use crate::outcome::{
    project_type_of, ArtifactSummary, ConversationSummary, IterationResult, PipelineOutcome, Status,
};
use crate::plan::ProjectType;
use crate::progress::{step_report, Progress, Step};
use crate::scorer::{self, ScoreBreakdown};
use crate::stages::architect::{self, Feedback};
use crate::stages::{developer, planner, reviewer, tester, StageContext};
use projcraft_error::{Error, Result};
use projcraft_runtime::{normalize_path, LlmProvider, RateLimitedClient, RateLimiter, Workspace};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The pipeline orchestrator - planner, architect, then the
/// develop/review/test/materialize/score loop
pub struct Pipeline<P> {
    client: RateLimitedClient<P>,
    config: PipelineConfig,
    /// Only the pipeline writes here, and only during materialization
    workspace: Workspace,
    progress: Progress,
}

impl<P: LlmProvider> Pipeline<P> {
    /// Create a pipeline around an existing client.
    ///
    /// Fails with `ConfigInvalid` when `config` does not validate.
    pub fn new(client: RateLimitedClient<P>, workspace: Workspace, config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(|e| e.with_operation("pipeline::new"))?;
        Ok(Self {
            client,
            config,
            workspace,
            progress: Progress::new(),
        })
    }

    /// Create a pipeline whose client throttles on `limiter` and cools down
    /// for the configured duration
    pub fn with_provider(
        provider: P,
        limiter: Arc<RateLimiter>,
        workspace: Workspace,
        config: PipelineConfig,
    ) -> Result<Self> {
        let client = RateLimitedClient::new(provider, limiter).with_cooldown(config.rate_limit_cooldown());
        Self::new(client, workspace, config)
    }

    /// Handle for polling progress while `run` is in flight
    pub fn progress(&self) -> Progress {
        self.progress.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn client(&self) -> &RateLimitedClient<P> {
        &self.client
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Run one request to completion
    pub async fn run(&mut self, request: &str) -> PipelineOutcome {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Run one request, checking `cancel` between stages.
    ///
    /// A cancelled run returns the best iteration so far, if any.
    pub async fn run_with_cancel(&mut self, request: &str, cancel: CancellationToken) -> PipelineOutcome {
        let request = request.trim();
        self.progress.reset();
        let mut log = ConversationLog::new();
        let mut errors = Vec::new();
        let mut best: Option<IterationResult> = None;
        let mut score_history = Vec::new();
        let mut iterations_run = 0;
        let mut cancelled = false;
        // Paths this run wrote, and the iteration whose files are on disk
        let mut written = BTreeSet::new();
        let mut on_disk = None;

        let ctx = StageContext::new(&self.client, &self.config, request);
        info!(category = %ctx.category, max_iterations = self.config.max_iterations, "pipeline started");

        'run: {
            if cancel.is_cancelled() {
                cancelled = true;
                break 'run;
            }
            self.progress.enter(Step::Planning);
            let plan = planner::run(&ctx, &mut log).await.value;

            if cancel.is_cancelled() {
                cancelled = true;
                break 'run;
            }
            self.progress.enter(Step::Architecture);
            let mut structure = architect::design(&ctx, &mut log, &plan).await.value;

            for iteration in 1..=self.config.max_iterations {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                iterations_run = iteration;
                self.progress.begin_iteration(iteration);

                self.progress.enter(Step::Development);
                let development = developer::run(&ctx, &mut log, &plan, &structure).await;
                if development.is_empty() {
                    warn!(iteration, "no artifacts generated, abandoning iteration");
                    errors.push(format!("iteration {}: no artifacts generated", iteration));
                    continue;
                }

                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                self.progress.enter(Step::Review);
                let review = reviewer::run(&ctx, &mut log, &development.artifacts()).await;

                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                self.progress.enter(Step::Testing);
                let test = tester::run(request, &review.artifacts, &mut log);

                self.progress.enter(Step::Materialization);
                let materialized = materialize(&mut self.workspace, review.artifacts, &mut errors);
                if !materialized.is_empty() {
                    written.extend(materialized.iter().filter_map(|a| normalize_path(&a.path).ok()));
                    on_disk = Some(iteration);
                }
                if materialized.is_empty() {
                    warn!(iteration, "nothing materialized, abandoning iteration");
                    errors.push(format!("iteration {}: no artifact could be written", iteration));
                    continue;
                }

                self.progress.enter(Step::Scoring);
                let breakdown = scorer::breakdown(request, &materialized, &test);
                let score = breakdown.total();
                score_history.push(score);
                info!(iteration, score, files = materialized.len(), "iteration scored");

                if best.as_ref().map_or(true, |b| score > b.quality_score) {
                    best = Some(IterationResult {
                        artifacts: materialized.clone(),
                        run_instructions: test.run_instructions.clone(),
                        test,
                        quality_score: score,
                        breakdown,
                        iteration_index: iteration,
                    });
                }

                if score >= self.config.quality_threshold {
                    info!(iteration, score, "quality threshold met");
                    break;
                }
                if iteration == self.config.max_iterations {
                    break;
                }
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }

                self.progress.begin_iteration(iteration + 1);
                self.progress.enter(Step::Architecture);
                let feedback = Feedback {
                    artifacts: &materialized,
                    score,
                    iteration,
                };
                structure = architect::revise(&ctx, &mut log, &plan, &structure, feedback).await.value;
            }
        }

        if cancelled {
            warn!(iterations_run, "pipeline cancelled");
            let err = Error::cancelled(format!("stopped after {} iterations", iterations_run))
                .with_operation("pipeline::run");
            errors.push(err.to_string());
        }
        self.progress.enter(Step::Finalization);

        if let Some(best) = &best {
            if on_disk != Some(best.iteration_index) {
                restore(&mut self.workspace, best, &written, &mut errors);
            }
        }

        let workspace_files = self.workspace.list().unwrap_or_else(|e| {
            errors.push(format!("workspace listing failed: {}", e));
            Vec::new()
        });

        let outcome = Finalizer {
            request,
            log: &log,
            window: self.config.window(),
            current_step: self.progress.current_step(),
            workspace_files,
            iterations_run,
            score_history,
            errors,
            cancelled,
        }
        .finish(best);
        info!(status = ?outcome.status, score = outcome.quality_score, iterations = iterations_run, "pipeline finished");
        outcome
    }
}

/// Write every artifact, keeping the ones that made it
fn materialize(workspace: &mut Workspace, artifacts: Vec<Artifact>, errors: &mut Vec<String>) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .filter(|artifact| match workspace.materialize(&artifact.path, &artifact.content) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %artifact.path, error = %e, "failed to materialize artifact");
                errors.push(format!("{}: {}", artifact.path, e));
                false
            }
        })
        .collect()
}

/// Put the best iteration's files back after a later, worse iteration
/// overwrote them. Files only a later iteration wrote are removed.
fn restore(workspace: &mut Workspace, best: &IterationResult, written: &BTreeSet<String>, errors: &mut Vec<String>) {
    info!(iteration = best.iteration_index, "restoring best iteration in the workspace");
    let keep: BTreeSet<String> = best.artifacts.iter().filter_map(|a| normalize_path(&a.path).ok()).collect();
    for stale in written.difference(&keep) {
        if let Err(e) = workspace.delete(stale) {
            warn!(path = %stale, error = %e, "failed to remove stale artifact");
            errors.push(format!("{}: {}", stale, e));
        }
    }
    for artifact in &best.artifacts {
        if let Err(e) = workspace.materialize(&artifact.path, &artifact.content) {
            warn!(path = %artifact.path, error = %e, "failed to restore artifact");
            errors.push(format!("{}: {}", artifact.path, e));
        }
    }
}

struct Finalizer<'a> {
    request: &'a str,
    log: &'a ConversationLog,
    window: usize,
    current_step: u8,
    workspace_files: Vec<String>,
    iterations_run: u32,
    score_history: Vec<f64>,
    errors: Vec<String>,
    cancelled: bool,
}

impl Finalizer<'_> {
    fn finish(self, best: Option<IterationResult>) -> PipelineOutcome {
        let conversation = ConversationSummary::of(self.log, self.window);
        let step_progress = step_report(self.current_step);

        let Some(best) = best else {
            let message = if self.cancelled {
                "Pipeline cancelled before any iteration completed".to_string()
            } else {
                format!("No iteration produced any files after {} attempts", self.iterations_run)
            };
            return PipelineOutcome {
                status: Status::Failed,
                message,
                request: self.request.to_string(),
                run_instructions: String::new(),
                project_type: ProjectType::Unknown,
                artifacts: Vec::new(),
                dependencies: Vec::new(),
                workspace_files: self.workspace_files,
                conversation,
                quality_score: 0.0,
                breakdown: ScoreBreakdown::default(),
                current_step: self.current_step,
                step_progress,
                iterations_run: self.iterations_run,
                best_iteration: None,
                score_history: self.score_history,
                errors: self.errors,
                cancelled: self.cancelled,
            };
        };

        let message = format!(
            "Project created with {} files, quality score {:.1} (iteration {} of {})",
            best.artifacts.len(),
            best.quality_score,
            best.iteration_index,
            self.iterations_run
        );
        PipelineOutcome {
            status: Status::Success,
            message,
            request: self.request.to_string(),
            project_type: project_type_of(&best.artifacts),
            artifacts: best.artifacts.iter().map(ArtifactSummary::from).collect(),
            dependencies: best.test.dependencies,
            run_instructions: best.run_instructions,
            workspace_files: self.workspace_files,
            conversation,
            quality_score: best.quality_score,
            breakdown: best.breakdown,
            current_step: self.current_step,
            step_progress,
            iterations_run: self.iterations_run,
            best_iteration: Some(best.iteration_index),
            score_history: self.score_history,
            errors: self.errors,
            cancelled: self.cancelled,
        }
    }
}
