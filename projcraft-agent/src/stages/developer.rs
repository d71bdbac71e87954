//! Developer: one [`Artifact`] per file specification.
//!
//! Files are generated independently and dispatched concurrently, bounded by
//! `developer_concurrency`. All calls still go through the shared limiter.

use super::StageContext;
use crate::artifact::Artifact;
use crate::conversation::{AgentRole, ConversationLog};
use crate::plan::Plan;
use crate::structure::{FileSpec, Structure};
use crate::templates;
use crate::tiers::{degrade, Tier};
use futures_util::stream::{self, StreamExt};
use projcraft_error::{Error, Result};
use projcraft_runtime::{strip_code_fences, LlmProvider};
use serde_json::{json, Map};
use tracing::warn;

/// One generated file and how it was produced
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub artifact: Artifact,
    pub tier: Tier,
    /// Content came from the final per-type template
    pub templated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Development {
    pub files: Vec<GeneratedFile>,
}

impl Development {
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.files.iter().map(|f| f.artifact.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn count(&self, tier: Tier) -> usize {
        self.files.iter().filter(|f| f.tier == tier).count()
    }
}

pub async fn run<P: LlmProvider>(
    ctx: &StageContext<'_, P>,
    log: &mut ConversationLog,
    plan: &Plan,
    structure: &Structure,
) -> Development {
    let specs = if structure.file_specifications.is_empty() {
        warn!(stage = "developer", "structure has no file specifications, using the canned file set");
        templates::fallback_file_set(plan.project_type, ctx.category)
    } else {
        structure.file_specifications.clone()
    };

    let history = log.render_recent(ctx.config.window());
    let history = history.as_str();

    let files: Vec<GeneratedFile> = stream::iter(specs.iter())
        .map(move |spec| generate(ctx, plan, structure, spec, history))
        .buffered(ctx.config.concurrency())
        .collect()
        .await;
    let development = Development { files };

    let primary = development.count(Tier::Primary);
    let templated = development.files.iter().filter(|f| f.templated).count();
    let mut metadata = Map::new();
    metadata.insert("files".into(), json!(development.files.iter().map(|f| &f.artifact.path).collect::<Vec<_>>()));
    metadata.insert("primary".into(), json!(primary));
    metadata.insert("secondary".into(), json!(development.count(Tier::Secondary)));
    metadata.insert("tertiary".into(), json!(development.count(Tier::Tertiary)));
    log.append(
        AgentRole::Developer,
        format!(
            "Generated {} files ({} from the model, {} from fallbacks, {} templated)",
            development.files.len(),
            primary + development.count(Tier::Secondary),
            development.count(Tier::Tertiary),
            templated
        ),
        metadata,
    );
    development
}

async fn generate<P: LlmProvider>(
    ctx: &StageContext<'_, P>,
    plan: &Plan,
    structure: &Structure,
    spec: &FileSpec,
    history: &str,
) -> GeneratedFile {
    let min_len = ctx.config.min_content_len;
    let result = degrade(
        "developer",
        move || async move {
            let prompt = json!({
                "task": "create_code",
                "request": ctx.request,
                "file_path": spec.path,
                "content_type": spec.content_type,
                "description": spec.description,
                "key_features": spec.key_features,
                "dependencies": spec.dependencies,
                "history": history,
                "format": "raw file content",
            });
            clean(ctx.ask_text(&prompt, &ctx.config.developer).await?, min_len)
        },
        move || async move {
            let prompt = json!({"task": "code", "file": spec.path});
            clean(ctx.ask_text(&prompt, &ctx.config.developer).await?, min_len)
        },
        move || templates::tertiary_content(spec, plan, structure, ctx.category),
    )
    .await;

    let tier = result.tier;
    let (content, templated) = if result.value.trim().len() > min_len {
        (result.value, false)
    } else {
        warn!(stage = "developer", path = %spec.path, "content too short, using the file type template");
        (templates::assemble(spec), true)
    };

    GeneratedFile {
        artifact: Artifact::new(spec.path.clone(), content, spec.dependencies.clone()),
        tier,
        templated,
    }
}

/// Unwrap a fenced reply and reject content that is too short to be a file
pub(crate) fn clean(text: String, min_len: usize) -> Result<String> {
    let body = strip_code_fences(&text);
    if body.trim().len() <= min_len {
        return Err(Error::inference_failed(format!("generated content too short ({} chars)", body.trim().len()))
            .with_operation("developer::clean"));
    }
    Ok(body.to_string())
}
