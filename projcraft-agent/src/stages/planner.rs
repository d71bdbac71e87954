//! Planner: request to [`Plan`]

use super::{tier_metadata, StageContext};
use crate::conversation::{AgentRole, ConversationLog};
use crate::plan::Plan;
use crate::tiers::{degrade, Degraded};
use projcraft_error::{Error, Result};
use projcraft_runtime::{LlmProvider, Structured};
use serde_json::json;

pub async fn run<P: LlmProvider>(ctx: &StageContext<'_, P>, log: &mut ConversationLog) -> Degraded<Plan> {
    let history = log.render_recent(ctx.config.window());
    let history = history.as_str();

    let result = degrade(
        "planner",
        move || primary(ctx, history),
        move || secondary(ctx),
        move || Plan::heuristic(ctx.request, ctx.category),
    )
    .await;

    let plan = &result.value;
    log.append(
        AgentRole::Planner,
        format!(
            "Planned {} ({}) with {} features{}",
            plan.project_name,
            plan.project_type,
            plan.features.len(),
            result.fallback_note()
        ),
        tier_metadata(&result),
    );
    result
}

async fn primary<P: LlmProvider>(ctx: &StageContext<'_, P>, history: &str) -> Result<Plan> {
    let prompt = json!({
        "task": "create_prd",
        "request": ctx.request,
        "history": history,
        "fields": [
            "project_name", "project_type", "scope", "features", "technology_stack",
            "complexity_level", "estimated_files", "dependencies", "constraints"
        ],
        "project_types": ["single_file", "multi_file", "web_app", "api_service", "desktop_app", "library", "script"],
        "format": "json",
    });
    validate(ctx.ask(&prompt, &ctx.config.planner).await?, ctx.request)
}

async fn secondary<P: LlmProvider>(ctx: &StageContext<'_, P>) -> Result<Plan> {
    let prompt = json!({
        "task": "prd",
        "request": ctx.request,
        "fields": ["project_name", "project_type", "features", "technology_stack"],
    });
    validate(ctx.ask(&prompt, &ctx.config.planner).await?, ctx.request)
}

fn validate(map: Structured, request: &str) -> Result<Plan> {
    if !Plan::recognizes(&map) {
        return Err(Error::extraction_failed("payload has no plan fields").with_operation("planner::validate"));
    }
    Ok(Plan::from_structured(&map, request))
}
