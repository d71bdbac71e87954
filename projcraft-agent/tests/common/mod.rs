#![allow(dead_code)]

use projcraft_agent::{Pipeline, PipelineConfig};
use projcraft_runtime::{MockProvider, ProviderError, RateLimitedClient, RateLimiter, Workspace};

pub const PLAN_JSON: &str = r#"{
  "project_name": "TodoBoard",
  "project_type": "web_app",
  "scope": "Track tasks in the browser",
  "features": ["Add tasks", "Mark complete"],
  "technology_stack": ["python", "flask", "html", "css", "javascript"],
  "complexity_level": "medium",
  "estimated_files": 6,
  "dependencies": ["flask"],
  "constraints": "Runs locally"
}"#;

pub const STRUCTURE_JSON: &str = r#"{
  "architecture_pattern": "Frontend/Backend",
  "file_structure": {"root": ["README.md", "requirements.txt"], "src": ["main.py", "todo_manager.py"], "static": ["index.html", "styles.css", "app.js"]},
  "file_specifications": [
    {"path": "README.md", "content_type": "markdown", "description": "Docs", "key_features": ["Usage"]},
    {"path": "requirements.txt", "content_type": "text", "description": "Deps"},
    {"path": "main.py", "content_type": "python_main", "description": "Entry", "key_features": ["Serve pages"], "dependencies": ["flask"]},
    {"path": "todo_manager.py", "content_type": "python_module", "description": "Tasks"},
    {"path": "static/index.html", "content_type": "html", "description": "Page"},
    {"path": "static/styles.css", "content_type": "css", "description": "Styles"},
    {"path": "static/app.js", "content_type": "javascript", "description": "Client"}
  ],
  "dependencies": ["flask"],
  "design_patterns": ["MVC"]
}"#;

pub fn is_task(prompt: &str, task: &str) -> bool {
    prompt.contains(&format!("\"task\":\"{}\"", task))
}

fn code_for(prompt: &str) -> String {
    if prompt.contains("README.md") {
        format!("# TodoBoard\n\n{}\n", "A small task board served by Flask. ".repeat(10))
    } else {
        format!("```\n{}\n```", "// generated file body\n".repeat(60))
    }
}

/// A well-behaved model: fenced JSON for structured tasks, code otherwise
pub fn cooperative(prompt: &str) -> Result<String, ProviderError> {
    if is_task(prompt, "create_prd") {
        Ok(format!("Here is the plan:\n```json\n{}\n```", PLAN_JSON))
    } else if is_task(prompt, "design_structure") || is_task(prompt, "improve_structure") {
        Ok(STRUCTURE_JSON.to_string())
    } else if is_task(prompt, "create_code") {
        Ok(code_for(prompt))
    } else if is_task(prompt, "review_code") {
        Ok(r#"{"notes": [{"path": "main.py", "note": "add logging"}]}"#.to_string())
    } else {
        Err(ProviderError::Other("unexpected prompt".into()))
    }
}

pub fn pipeline(provider: MockProvider, config: PipelineConfig) -> Pipeline<MockProvider> {
    let limiter = RateLimiter::shared(config.min_call_interval());
    Pipeline::with_provider(provider, limiter, Workspace::memory(), config).unwrap()
}

pub fn client(provider: MockProvider) -> RateLimitedClient<MockProvider> {
    RateLimitedClient::new(provider, RateLimiter::shared(std::time::Duration::from_secs(6)))
}
