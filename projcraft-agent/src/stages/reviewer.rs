//! Reviewer: structural normalization plus optional model notes.
//!
//! Notes never rewrite content. Without a usable model reply the review is a
//! plain normalization pass.

use super::{tier_metadata, StageContext};
use crate::artifact::Artifact;
use crate::conversation::{preview, AgentRole, ConversationLog};
use crate::tiers::{degrade, Tier};
use projcraft_error::{Error, Result};
use projcraft_runtime::{LlmProvider, Structured};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

const NOTE_PREVIEW_CHARS: usize = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewNote {
    pub path: String,
    pub note: String,
}

#[derive(Debug, Clone, Default)]
pub struct Review {
    pub artifacts: Vec<Artifact>,
    /// Files whose content changed during normalization
    pub touched: usize,
    pub notes: Vec<ReviewNote>,
    /// Tier that produced the notes, `None` when notes were not requested
    pub tier: Option<Tier>,
}

pub async fn run<P: LlmProvider>(
    ctx: &StageContext<'_, P>,
    log: &mut ConversationLog,
    artifacts: &[Artifact],
) -> Review {
    let (notes, tier, mut metadata) = if ctx.config.review_with_model {
        let result = degrade(
            "reviewer",
            move || async move {
                let files: Vec<Value> = artifacts
                    .iter()
                    .map(|a| {
                        json!({
                            "path": a.path,
                            "file_type": a.file_type,
                            "preview": preview(&a.content, NOTE_PREVIEW_CHARS),
                        })
                    })
                    .collect();
                let prompt = json!({
                    "task": "review_code",
                    "request": ctx.request,
                    "files": files,
                    "fields": ["notes"],
                    "note_fields": ["path", "note"],
                });
                parse_notes(ctx.ask(&prompt, &ctx.config.reviewer).await?, artifacts)
            },
            move || async move {
                let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
                let prompt = json!({"task": "review", "files": paths, "fields": ["notes"]});
                parse_notes(ctx.ask(&prompt, &ctx.config.reviewer).await?, artifacts)
            },
            Vec::new,
        )
        .await;
        let metadata = tier_metadata(&result);
        (result.value, Some(result.tier), metadata)
    } else {
        (Vec::new(), None, Map::new())
    };

    let mut touched = 0;
    let reviewed: Vec<Artifact> = artifacts
        .iter()
        .map(|artifact| {
            let content = normalize(&artifact.content);
            if content != artifact.content {
                touched += 1;
            }
            artifact.with_content(content)
        })
        .collect();

    metadata.insert("touched".into(), json!(touched));
    metadata.insert("notes".into(), json!(notes));
    log.append(
        AgentRole::Reviewer,
        format!("Reviewed {} files, normalized {}, {} notes", reviewed.len(), touched, notes.len()),
        metadata,
    );

    Review {
        artifacts: reviewed,
        touched,
        notes,
        tier,
    }
}

/// LF line endings and exactly one trailing newline
pub fn normalize(content: &str) -> String {
    let mut text = content.replace("\r\n", "\n");
    let trimmed = text.trim_end_matches('\n').len();
    text.truncate(trimmed);
    text.push('\n');
    text
}

fn parse_notes(map: Structured, artifacts: &[Artifact]) -> Result<Vec<ReviewNote>> {
    let entries = match map.get("notes") {
        Some(Value::Array(entries)) => entries,
        _ => return Err(Error::extraction_failed("payload has no notes list").with_operation("reviewer::parse")),
    };
    let known: HashSet<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
    Ok(entries
        .iter()
        .filter_map(|entry| {
            let path = entry.get("path").or_else(|| entry.get("file"))?.as_str()?;
            let note = entry.get("note").or_else(|| entry.get("comment"))?.as_str()?;
            known.contains(path).then(|| ReviewNote {
                path: path.to_string(),
                note: note.trim().to_string(),
            })
        })
        .collect())
}
