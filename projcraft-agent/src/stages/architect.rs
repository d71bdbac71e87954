//! Architect: [`Plan`] to [`Structure`], and revisions seeded with feedback

use super::{tier_metadata, StageContext};
use crate::artifact::Artifact;
use crate::catalog::MODULAR_LAYOUT;
use crate::conversation::{AgentRole, ConversationLog};
use crate::plan::Plan;
use crate::scorer;
use crate::structure::Structure;
use crate::tiers::{degrade, Degraded};
use projcraft_error::{Error, Result};
use projcraft_runtime::{LlmProvider, Structured};
use serde_json::{json, Value};

const STRUCTURE_FIELDS: &[&str] = &[
    "architecture_pattern",
    "file_structure",
    "file_specifications",
    "dependencies",
    "design_patterns",
];

/// What the previous iteration produced
#[derive(Debug, Clone, Copy)]
pub struct Feedback<'a> {
    pub artifacts: &'a [Artifact],
    pub score: f64,
    pub iteration: u32,
}

pub async fn design<P: LlmProvider>(
    ctx: &StageContext<'_, P>,
    log: &mut ConversationLog,
    plan: &Plan,
) -> Degraded<Structure> {
    let history = log.render_recent(ctx.config.window());
    let history = history.as_str();

    let result = degrade(
        "architect",
        move || async move {
            let prompt = json!({
                "task": "design_structure",
                "plan": plan_summary(plan),
                "history": history,
                "fields": STRUCTURE_FIELDS,
                "file_specification_fields": ["path", "content_type", "description", "key_features", "dependencies"],
                "format": "json",
            });
            validate(ctx.ask(&prompt, &ctx.config.architect).await?, plan)
        },
        move || async move {
            let prompt = json!({
                "task": "structure",
                "project_type": plan.project_type,
                "features": plan.features,
                "fields": ["file_structure", "file_specifications"],
            });
            validate(ctx.ask(&prompt, &ctx.config.architect).await?, plan)
        },
        move || Structure::from_layout(ctx.category.layout(), &plan.technology_stack),
    )
    .await;

    log.append(
        AgentRole::Architect,
        format!(
            "Designed {} structure with {} files{}",
            result.value.architecture_pattern,
            result.value.file_specifications.len(),
            result.fallback_note()
        ),
        tier_metadata(&result),
    );
    result
}

/// Propose a structure that covers what the last iteration missed
pub async fn revise<P: LlmProvider>(
    ctx: &StageContext<'_, P>,
    log: &mut ConversationLog,
    plan: &Plan,
    previous: &Structure,
    feedback: Feedback<'_>,
) -> Degraded<Structure> {
    let missing = scorer::missing_roles(ctx.request, feedback.artifacts);
    let files: Vec<&str> = feedback.artifacts.iter().map(|a| a.path.as_str()).collect();
    let (missing, files) = (missing.as_slice(), files.as_slice());

    let result = degrade(
        "architect",
        move || async move {
            let prompt = json!({
                "task": "improve_structure",
                "request": ctx.request,
                "plan": plan_summary(plan),
                "previous_pattern": previous.architecture_pattern,
                "files": files,
                "score": feedback.score,
                "missing": missing,
                "fields": STRUCTURE_FIELDS,
                "format": "json",
            });
            validate(ctx.ask(&prompt, &ctx.config.architect).await?, plan)
        },
        move || async move {
            let prompt = json!({
                "task": "structure",
                "files": files,
                "missing": missing,
                "fields": ["file_structure", "file_specifications"],
            });
            validate(ctx.ask(&prompt, &ctx.config.architect).await?, plan)
        },
        move || {
            let layout = ctx.category.improvement(feedback.artifacts).unwrap_or(&MODULAR_LAYOUT);
            Structure::from_layout(layout, &plan.technology_stack)
        },
    )
    .await;

    let mut metadata = tier_metadata(&result);
    metadata.insert("iteration".into(), json!(feedback.iteration));
    metadata.insert("previous_score".into(), json!(feedback.score));
    log.append(
        AgentRole::Architect,
        format!(
            "Revised structure after scoring {:.1}: {} with {} files{}",
            feedback.score,
            result.value.architecture_pattern,
            result.value.file_specifications.len(),
            result.fallback_note()
        ),
        metadata,
    );
    result
}

fn plan_summary(plan: &Plan) -> Value {
    json!({
        "project_name": plan.project_name,
        "project_type": plan.project_type,
        "scope": plan.scope,
        "features": plan.features,
        "technology_stack": plan.technology_stack,
        "estimated_files": plan.estimated_file_count,
    })
}

fn validate(map: Structured, plan: &Plan) -> Result<Structure> {
    if !Structure::recognizes(&map) {
        return Err(Error::extraction_failed("payload has no structure fields").with_operation("architect::validate"));
    }
    Ok(Structure::from_structured(&map, plan))
}
