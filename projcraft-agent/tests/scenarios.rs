mod common;

use common::{client, cooperative, is_task, pipeline};
use projcraft_agent::stages::{architect, developer, planner, StageContext};
use projcraft_agent::{
    AgentRole, Category, ConversationLog, FileType, Plan, PipelineConfig, ProjectType, Status, Structure, Tier,
};
use projcraft_runtime::{extract, MockProvider, ProviderError, Structured};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_calculator_with_failing_model() {
    let config = PipelineConfig::default();
    let client = client(MockProvider::failing());
    let ctx = StageContext::new(&client, &config, "calculator");
    let mut log = ConversationLog::new();

    let plan = planner::run(&ctx, &mut log).await;
    assert_eq!(plan.tier, Tier::Tertiary);
    assert_eq!(plan.failures.len(), 2);
    assert_eq!(plan.value.project_type, ProjectType::SingleFile);

    let structure = architect::design(&ctx, &mut log, &plan.value).await.value;
    let sources: Vec<_> = structure.paths().into_iter().filter(|p| p.ends_with(".py")).collect();
    assert_eq!(sources, vec!["calculator.py"]);

    let development = developer::run(&ctx, &mut log, &plan.value, &structure).await;
    let python: Vec<_> = development
        .artifacts()
        .into_iter()
        .filter(|a| a.file_type == FileType::Python)
        .collect();
    assert_eq!(python.len(), 1);
    assert!(!python[0].content.trim().is_empty());
    assert_eq!(log.len(), 3);

    let config = PipelineConfig::default();
    let max = config.max_iterations;
    let mut pipeline = pipeline(MockProvider::failing(), config);
    let outcome = pipeline.run("calculator").await;

    assert_eq!(outcome.status, Status::Success);
    assert!(outcome.iterations_run <= max);
    if outcome.quality_score < 75.0 {
        assert_eq!(outcome.iterations_run, max);
    }
    assert!(outcome.artifacts.iter().any(|a| a.path == "calculator.py" && a.size > 0));
    assert_eq!(outcome.current_step, 8);
    assert_eq!(pipeline.progress().current_step(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_fenced_payload_recovers_same_plan() {
    let plain = MockProvider::new(|prompt| {
        if is_task(prompt, "create_prd") {
            Ok(common::PLAN_JSON.to_string())
        } else {
            Err(ProviderError::Other("unused".into()))
        }
    });
    let fenced = MockProvider::new(|prompt| {
        if is_task(prompt, "create_prd") {
            Ok(format!("Sure, the plan:\n```json\n{}\n```\nAnything else?", common::PLAN_JSON))
        } else {
            Err(ProviderError::Other("unused".into()))
        }
    });

    let config = PipelineConfig::default();
    let (plain, fenced) = (client(plain), client(fenced));
    let plain_plan = planner::run(&StageContext::new(&plain, &config, "todo"), &mut ConversationLog::new()).await;
    let fenced_plan = planner::run(&StageContext::new(&fenced, &config, "todo"), &mut ConversationLog::new()).await;

    assert_eq!(plain_plan.tier, Tier::Primary);
    assert_eq!(fenced_plan.tier, Tier::Primary);
    assert_eq!(plain_plan.value, fenced_plan.value);
    assert_eq!(fenced_plan.value.project_name, "TodoBoard");
}

#[tokio::test(start_paused = true)]
async fn test_model_calls_respect_minimum_interval() {
    let config = PipelineConfig::default().with_max_iterations(2);
    let interval = config.min_call_interval();
    let mut pipeline = pipeline(MockProvider::new(cooperative), config);
    let outcome = pipeline.run("todo board").await;
    assert_eq!(outcome.status, Status::Success);

    let provider = pipeline.client().provider();
    let starts = provider.call_starts();
    assert!(starts.len() >= 4);
    assert_eq!(starts.len(), provider.call_count());
    assert_eq!(provider.prompts().len(), provider.call_count());
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= interval, "calls {:?} apart", pair[1] - pair[0]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_failing_files_fall_back_to_templates() {
    let provider = MockProvider::new(|prompt| {
        if prompt.contains("broken_") {
            Err(ProviderError::Api { status: 500, message: "boom".into() })
        } else {
            Ok(format!("# generated\n{}", "value = 1\n".repeat(20)))
        }
    });
    let config = PipelineConfig::default();
    let client = client(provider);
    let ctx = StageContext::new(&client, &config, "a utility");
    let plan = Plan::heuristic("a utility", Category::General);

    let payload: Structured = extract(
        r#"{"file_specifications": [
            {"path": "main.py", "key_features": ["Run"]},
            {"path": "broken_a.py", "key_features": ["Parse input"]},
            {"path": "helpers.py"},
            {"path": "broken_b.js", "content_type": "javascript", "key_features": ["Render list"]},
            {"path": "notes.md"}
        ]}"#,
    )
    .unwrap();
    let structure = Structure::from_structured(&payload, &plan);
    assert_eq!(structure.file_specifications.len(), 5);

    let mut log = ConversationLog::new();
    let development = developer::run(&ctx, &mut log, &plan, &structure).await;
    let artifacts = development.artifacts();

    assert_eq!(artifacts.len(), 5);
    assert!(artifacts.iter().all(|a| a.content.trim().len() > config.min_content_len));
    let paths: Vec<_> = artifacts.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(paths, structure.paths());

    let fallback: Vec<_> = development
        .files
        .iter()
        .filter(|f| f.tier == Tier::Tertiary)
        .map(|f| f.artifact.path.as_str())
        .collect();
    assert_eq!(fallback, vec!["broken_a.py", "broken_b.js"]);
    assert!(artifacts[1].content.contains("def parse_input("));
    assert!(artifacts[3].content.contains("function renderList()"));
    assert_eq!(log.events().last().map(|m| m.role), Some(AgentRole::Developer));
}

#[tokio::test(start_paused = true)]
async fn test_garbage_model_terminates_within_budget() {
    let config = PipelineConfig::default().with_max_iterations(3);
    let mut pipeline = pipeline(MockProvider::with_response("I would rather not."), config);
    let outcome = pipeline.run("something unusual").await;

    assert!(outcome.iterations_run >= 1 && outcome.iterations_run <= 3);
    assert!((0.0..=100.0).contains(&outcome.quality_score));
    assert_eq!(outcome.status, Status::Success);
    assert!(!outcome.artifacts.is_empty());
    assert!(!outcome.run_instructions.is_empty());
    assert_eq!(outcome.score_history.len() as u32, outcome.iterations_run);
}

#[tokio::test(start_paused = true)]
async fn test_best_iteration_is_kept() {
    let mut config = PipelineConfig::default().with_max_iterations(3);
    config.quality_threshold = 100.0;
    config.review_with_model = false;
    let mut pipeline = pipeline(MockProvider::failing(), config);
    let outcome = pipeline.run("something unusual").await;

    assert!(outcome.iterations_run <= 3);
    assert_eq!(outcome.score_history.len() as u32, outcome.iterations_run);
    let best = outcome.score_history.iter().cloned().fold(f64::MIN, f64::max);
    assert_eq!(outcome.quality_score, best);
    let first_best = outcome.score_history.iter().position(|s| *s == best).map(|i| i as u32 + 1);
    assert_eq!(outcome.best_iteration, first_best);
    assert!(outcome.workspace_files.len() >= outcome.artifacts.len());
}

#[tokio::test(start_paused = true)]
async fn test_cooperative_model_run() {
    let mut pipeline = pipeline(MockProvider::new(cooperative), PipelineConfig::default());
    let progress = pipeline.progress();
    let outcome = pipeline.run("todo board").await;

    assert_eq!(outcome.status, Status::Success);
    assert!(outcome.quality_score >= 75.0);
    assert_eq!(outcome.iterations_run, 1);
    assert_eq!(outcome.best_iteration, Some(1));
    assert_eq!(outcome.project_type, ProjectType::WebApp);
    assert!(outcome.workspace_files.contains(&"static/index.html".to_string()));
    assert_eq!(outcome.dependencies, vec!["flask"]);
    assert_eq!(
        outcome.conversation.roles,
        vec![AgentRole::Planner, AgentRole::Architect, AgentRole::Developer, AgentRole::Reviewer, AgentRole::Tester]
    );
    assert_eq!(outcome.conversation.turns, 5);
    assert!(outcome.run_instructions.contains("python main.py"));
    assert_eq!(progress.current_step(), 8);
    assert!(outcome.errors.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_calls_are_spaced_by_limiter() {
    let start = tokio::time::Instant::now();
    let mut pipeline = pipeline(MockProvider::failing(), PipelineConfig::default().with_max_iterations(1));
    pipeline.run("calculator").await;
    assert!(start.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start() {
    let token = tokio_util::sync::CancellationToken::new();
    token.cancel();
    let mut pipeline = pipeline(MockProvider::new(cooperative), PipelineConfig::default());
    let outcome = pipeline.run_with_cancel("todo board", token).await;

    assert_eq!(outcome.status, Status::Failed);
    assert!(outcome.cancelled);
    assert_eq!(outcome.iterations_run, 0);
    assert_eq!(outcome.best_iteration, None);
    assert_eq!(pipeline.client().provider().call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_iterations_keeps_best() {
    let token = tokio_util::sync::CancellationToken::new();
    let trigger = token.clone();
    // Cancel as soon as the architect is asked to revise
    let provider = MockProvider::new(move |prompt| {
        if is_task(prompt, "improve_structure") {
            trigger.cancel();
        }
        Err(ProviderError::Other("offline".into()))
    });
    let mut config = PipelineConfig::default();
    config.quality_threshold = 100.0;
    let mut pipeline = pipeline(provider, config);
    let outcome = pipeline.run_with_cancel("something unusual", token).await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.status, Status::Success);
    assert_eq!(outcome.iterations_run, 1);
    assert_eq!(outcome.best_iteration, Some(1));
    assert!(outcome.errors.iter().any(|e| e.starts_with("Cancelled") && e.contains("pipeline::run")));
}

#[tokio::test(start_paused = true)]
async fn test_workspace_holds_best_iteration() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let rounds = Arc::new(AtomicUsize::new(0));
    let counter = rounds.clone();
    // First structure scores 85, every revision drops to 55
    let provider = MockProvider::new(move |prompt| {
        if is_task(prompt, "create_prd") {
            Ok(common::PLAN_JSON.to_string())
        } else if is_task(prompt, "design_structure") {
            Ok(r#"{"file_specifications": [{"path": "main.py"}, {"path": "helpers.py"}, {"path": "util.py"}]}"#.to_string())
        } else if is_task(prompt, "improve_structure") {
            Ok(r#"{"file_specifications": [{"path": "main.py"}, {"path": "stale.py"}]}"#.to_string())
        } else if is_task(prompt, "create_code") {
            let round = if prompt.contains("\"file_path\":\"main.py\"") {
                counter.fetch_add(1, Ordering::SeqCst) + 1
            } else {
                counter.load(Ordering::SeqCst)
            };
            Ok(format!("# round {}\n{}", round, "value = 1\n".repeat(150)))
        } else {
            Err(ProviderError::Other("unused".into()))
        }
    });
    let mut config = PipelineConfig::default().with_max_iterations(3);
    config.quality_threshold = 90.0;
    config.review_with_model = false;
    let mut pipeline = pipeline(provider, config);
    let outcome = pipeline.run("something unusual").await;

    assert_eq!(outcome.iterations_run, 3);
    assert_eq!(outcome.score_history.len(), 3);
    assert_eq!(outcome.best_iteration, Some(1));
    assert!(outcome.score_history[0] > outcome.score_history[2]);

    let main = outcome.artifacts.iter().find(|a| a.path == "main.py").unwrap();
    assert!(main.preview.starts_with("# round 1"));
    let workspace = pipeline.workspace();
    assert!(workspace.read("main.py").unwrap().starts_with("# round 1"));
    assert_eq!(workspace.list().unwrap(), vec!["helpers.py", "main.py", "util.py"]);
    assert_eq!(outcome.workspace_files, vec!["helpers.py", "main.py", "util.py"]);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_is_rejected_up_front() {
    let limiter = projcraft_runtime::RateLimiter::shared(Duration::from_secs(6));
    let mut config = PipelineConfig::default();
    config.quality_threshold = 101.0;
    let err = projcraft_agent::Pipeline::with_provider(
        MockProvider::failing(),
        limiter.clone(),
        projcraft_runtime::Workspace::memory(),
        config,
    )
    .err()
    .unwrap();
    assert_eq!(err.kind(), projcraft_error::ErrorKind::ConfigInvalid);
    assert_eq!(err.operation(), "pipeline::new");

    let config = PipelineConfig::default().with_max_iterations(0);
    let result = projcraft_agent::Pipeline::with_provider(
        MockProvider::failing(),
        limiter,
        projcraft_runtime::Workspace::memory(),
        config,
    );
    assert!(result.is_err());
}
