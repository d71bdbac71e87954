//! Tester: run instructions from the artifact set.
//!
//! Deterministic; nothing is executed.

use crate::artifact::{Artifact, FileType};
use crate::conversation::{AgentRole, ConversationLog};
use crate::scorer::is_entry_point;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::collections::BTreeSet;
use std::fmt::Write;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub run_instructions: String,
    /// Sorted, de-duplicated union of artifact dependencies
    pub dependencies: Vec<String>,
    /// File that starts the project, if one exists
    pub entry_point: Option<String>,
}

pub fn run(request: &str, artifacts: &[Artifact], log: &mut ConversationLog) -> TestReport {
    let report = inspect(request, artifacts);

    let mut metadata = Map::new();
    metadata.insert("entry_point".into(), json!(report.entry_point));
    metadata.insert("dependencies".into(), json!(report.dependencies));
    log.append(
        AgentRole::Tester,
        format!("Validated {} files and wrote run instructions", artifacts.len()),
        metadata,
    );
    report
}

/// Entry point preference: named python entry, guarded python script, `index.html`
pub fn entry_point(artifacts: &[Artifact]) -> Option<&Artifact> {
    let python = |a: &&Artifact| a.file_type == FileType::Python && is_entry_point(a);
    let named = |a: &&Artifact| {
        let name = a.file_name();
        name.contains("main") || name == "app.py"
    };
    artifacts
        .iter()
        .find(|a| python(a) && named(a))
        .or_else(|| artifacts.iter().find(python))
        .or_else(|| artifacts.iter().find(|a| a.file_type == FileType::Html && is_entry_point(a)))
}

pub fn inspect(request: &str, artifacts: &[Artifact]) -> TestReport {
    let of_type = |ty| artifacts.iter().filter(move |a: &&Artifact| a.file_type == ty);
    let entry = entry_point(artifacts);
    let mut out = format!("# Run Instructions for {}\n", request.trim());

    if let Some(first_python) = of_type(FileType::Python).next() {
        let target = entry.filter(|a| a.file_type == FileType::Python).unwrap_or(first_python);
        out.push_str("\n## Python Application\n\n");
        if artifacts.iter().any(|a| a.file_name() == "requirements.txt") {
            out.push_str("1. Install dependencies: `pip install -r requirements.txt`\n");
        } else {
            out.push_str("1. No third-party packages to install\n");
        }
        let _ = writeln!(out, "2. Run the application: `python {}`", target.path);
    }

    if let Some(first_html) = of_type(FileType::Html).next() {
        let page = entry.filter(|a| a.file_type == FileType::Html).unwrap_or(first_html);
        out.push_str("\n## Web Application\n\n");
        let _ = writeln!(out, "1. Open `{}` in a web browser", page.path);
        out.push_str("2. Or serve the folder with `python -m http.server 8000` and visit http://localhost:8000\n");
    }

    if of_type(FileType::Javascript).next().is_some() {
        out.push_str("\n## JavaScript\n\n");
        let node_entry = of_type(FileType::Javascript)
            .find(|a| matches!(a.file_name().as_str(), "main.js" | "server.js" | "index.js"));
        match node_entry {
            Some(script) => {
                let _ = writeln!(out, "Run with Node.js: `node {}`", script.path);
            }
            None => out.push_str("Scripts run in the browser through the HTML pages\n"),
        }
    }

    out.push_str("\n## Project Files\n\n");
    for artifact in artifacts {
        let _ = writeln!(out, "- `{}` ({})", artifact.path, artifact.file_type);
    }

    let dependencies: Vec<String> = artifacts
        .iter()
        .flat_map(|a| a.dependencies.iter())
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !dependencies.is_empty() {
        out.push_str("\n## Dependencies\n\n");
        for dep in &dependencies {
            let _ = writeln!(out, "- {}", dep);
        }
    }

    TestReport {
        run_instructions: out,
        dependencies,
        entry_point: entry.map(|a| a.path.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str, deps: &[&str]) -> Artifact {
        Artifact::new(path, content, deps.iter().map(|d| d.to_string()).collect())
    }

    #[test]
    fn test_python_and_web_blocks() {
        let artifacts = vec![
            file("utils.py", "def f(): pass", &["sqlite3"]),
            file("main.py", "print()", &["flask", "sqlite3"]),
            file("index.html", "<html></html>", &[]),
            file("app.js", "run()", &[]),
            file("requirements.txt", "flask\n", &[]),
        ];
        let report = inspect("todo app", &artifacts);
        let text = &report.run_instructions;
        assert!(text.starts_with("# Run Instructions for todo app\n"));
        assert!(text.contains("pip install -r requirements.txt"));
        assert!(text.contains("`python main.py`"));
        assert!(text.contains("Open `index.html`"));
        assert!(text.contains("Scripts run in the browser"));
        assert!(text.contains("- `utils.py` (python)"));
        assert_eq!(report.dependencies, vec!["flask", "sqlite3"]);
        assert_eq!(report.entry_point.as_deref(), Some("main.py"));
    }

    #[test]
    fn test_guarded_script_is_entry() {
        let artifacts = vec![
            file("README.md", "# Calc", &[]),
            file("calculator.py", "if __name__ == \"__main__\":\n    main()\n", &[]),
        ];
        let report = inspect("calculator", &artifacts);
        assert_eq!(report.entry_point.as_deref(), Some("calculator.py"));
        assert!(report.run_instructions.contains("No third-party packages"));
        assert!(!report.run_instructions.contains("## Web Application"));
    }

    #[test]
    fn test_node_entry() {
        let artifacts = vec![file("server.js", "listen()", &[])];
        let report = inspect("service", &artifacts);
        assert!(report.run_instructions.contains("`node server.js`"));
        assert_eq!(report.entry_point, None);
    }

    #[test]
    fn test_run_appends_one_message() {
        let mut log = ConversationLog::new();
        run("x", &[file("main.py", "print()", &[])], &mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(log.events()[0].role, AgentRole::Tester);
    }
}
