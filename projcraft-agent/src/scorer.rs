//! Quality scorer.
//!
//! A pure heuristic over file roles, a category bonus and content volume.
//! Clamped to `[0, 100]`; the empty set scores 0.

use crate::artifact::{Artifact, FileType};
use crate::catalog::{Category, ScoreRule};
use crate::stages::tester::TestReport;
use serde::Serialize;

const MANIFESTS: &[&str] = &["requirements.txt", "package.json", "pyproject.toml", "setup.py", "pipfile"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Entry point, documentation and manifest, at most 30
    pub roles: f64,
    /// Category bonus, at most 70
    pub domain: f64,
    /// Aggregate content size, at most 20
    pub volume: f64,
    /// README length, at most 10
    pub documentation: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        (self.roles + self.domain + self.volume + self.documentation).clamp(0.0, 100.0)
    }
}

pub fn score(request: &str, artifacts: &[Artifact], test: &TestReport) -> f64 {
    breakdown(request, artifacts, test).total()
}

/// Whether `artifact` can start the project
pub fn is_entry_point(artifact: &Artifact) -> bool {
    let name = artifact.file_name();
    match artifact.file_type {
        FileType::Python => {
            name.contains("main")
                || name == "app.py"
                || artifact.content.contains("__name__ == \"__main__\"")
                || artifact.content.contains("__name__ == '__main__'")
        }
        FileType::Html => name == "index.html",
        _ => false,
    }
}

fn is_readme(artifact: &Artifact) -> bool {
    artifact.file_name().starts_with("readme")
}

fn is_manifest(artifact: &Artifact) -> bool {
    MANIFESTS.contains(&artifact.file_name().as_str())
}

struct Census {
    files: usize,
    python: usize,
    html: bool,
    css: bool,
    js: bool,
}

impl Census {
    fn of(artifacts: &[Artifact]) -> Self {
        let count = |ty| artifacts.iter().filter(|a| a.file_type == ty).count();
        Self {
            files: artifacts.len(),
            python: count(FileType::Python),
            html: count(FileType::Html) > 0,
            css: count(FileType::Css) > 0,
            js: count(FileType::Javascript) > 0,
        }
    }

    fn markup_stack(&self) -> bool {
        self.html && self.css && self.js
    }
}

fn points(condition: bool, value: f64) -> f64 {
    if condition {
        value
    } else {
        0.0
    }
}

pub fn breakdown(request: &str, artifacts: &[Artifact], test: &TestReport) -> ScoreBreakdown {
    if artifacts.is_empty() {
        return ScoreBreakdown::default();
    }
    let census = Census::of(artifacts);

    let readme = artifacts.iter().find(|a| is_readme(a));
    let roles = points(test.entry_point.is_some(), 15.0)
        + points(readme.is_some(), 10.0)
        + points(artifacts.iter().any(is_manifest), 5.0);

    let domain = match Category::classify(request).score_rule() {
        ScoreRule::Calculator => {
            let calc = artifacts
                .iter()
                .any(|a| a.file_type == FileType::Python && a.path.to_lowercase().contains("calc"));
            points(calc, 40.0) + points(census.files >= 2, 20.0)
        }
        ScoreRule::Todo => {
            points(census.markup_stack(), 30.0) + points(census.python >= 2, 20.0) + points(census.files >= 6, 20.0)
        }
        ScoreRule::Web => points(census.markup_stack(), 40.0) + points(census.python >= 1, 20.0),
        ScoreRule::Api => {
            let config = artifacts.iter().any(|a| a.path.to_lowercase().contains("config"));
            points(census.python >= 3, 40.0) + points(config, 20.0)
        }
        ScoreRule::Generic => {
            points(census.files >= 3, 30.0) + points(census.python >= 1, 20.0) + points(census.files >= 5, 20.0)
        }
    };

    let total_chars: usize = artifacts.iter().map(|a| a.content.len()).sum();
    let volume = if total_chars > 1000 {
        20.0
    } else if total_chars > 500 {
        10.0
    } else {
        0.0
    };

    let documentation = points(readme.is_some_and(|r| r.content.len() > 200), 10.0);

    ScoreBreakdown { roles, domain, volume, documentation }
}

/// Roles and category expectations the artifact set does not meet
pub fn missing_roles(request: &str, artifacts: &[Artifact]) -> Vec<&'static str> {
    let census = Census::of(artifacts);
    let mut missing = Vec::new();
    if !artifacts.iter().any(is_entry_point) {
        missing.push("entry point");
    }
    if !artifacts.iter().any(is_readme) {
        missing.push("documentation");
    }
    if !artifacts.iter().any(is_manifest) {
        missing.push("dependency manifest");
    }

    match Category::classify(request).score_rule() {
        ScoreRule::Calculator => {
            if !artifacts.iter().any(|a| a.file_type == FileType::Python && a.path.to_lowercase().contains("calc")) {
                missing.push("calculator module");
            }
        }
        ScoreRule::Todo | ScoreRule::Web => {
            if !census.html {
                missing.push("markup");
            }
            if !census.css {
                missing.push("stylesheet");
            }
            if !census.js {
                missing.push("script");
            }
            if census.python == 0 {
                missing.push("backend module");
            }
        }
        ScoreRule::Api => {
            if census.python < 3 {
                missing.push("service modules");
            }
            if !artifacts.iter().any(|a| a.path.to_lowercase().contains("config")) {
                missing.push("configuration");
            }
        }
        ScoreRule::Generic => {
            if census.files < 5 {
                missing.push("supporting modules");
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> Artifact {
        Artifact::new(path, content, vec![])
    }

    fn report(entry: Option<&str>) -> TestReport {
        TestReport {
            entry_point: entry.map(str::to_string),
            ..TestReport::default()
        }
    }

    #[test]
    fn test_empty_set_scores_zero() {
        assert_eq!(score("anything", &[], &report(None)), 0.0);
        assert_eq!(score("calculator", &[], &report(Some("main.py"))), 0.0);
    }

    #[test]
    fn test_calculator_breakdown() {
        let artifacts = vec![
            file("calculator.py", &"x".repeat(600)),
            file("README.md", &"y".repeat(250)),
        ];
        let b = breakdown("a calculator", &artifacts, &report(Some("calculator.py")));
        assert_eq!(b.roles, 25.0);
        assert_eq!(b.domain, 60.0);
        assert_eq!(b.volume, 10.0);
        assert_eq!(b.documentation, 10.0);
        assert_eq!(b.total(), 100.0);
    }

    #[test]
    fn test_score_is_clamped() {
        let big = "z".repeat(2000);
        let artifacts = vec![
            file("main.py", &big),
            file("app.py", "print()"),
            file("index.html", "<html></html>"),
            file("styles.css", "body {}"),
            file("app.js", "run()"),
            file("README.md", &big),
            file("requirements.txt", "flask"),
        ];
        let b = breakdown("web page", &artifacts, &report(Some("main.py")));
        assert!(b.roles + b.domain + b.volume + b.documentation > 100.0);
        assert_eq!(b.total(), 100.0);
    }

    #[test]
    fn test_web_without_markup_stack() {
        let artifacts = vec![file("main.py", "print('hi')"), file("index.html", "<p></p>")];
        let b = breakdown("a web page", &artifacts, &report(None));
        assert_eq!(b.domain, 20.0);
        assert_eq!(b.roles, 0.0);
        let missing = missing_roles("a web page", &artifacts);
        assert!(missing.contains(&"stylesheet"));
        assert!(missing.contains(&"script"));
        assert!(!missing.contains(&"markup"));
        assert!(missing.contains(&"documentation"));
    }

    #[test]
    fn test_entry_point_detection() {
        assert!(is_entry_point(&file("src/main.py", "")));
        assert!(is_entry_point(&file("app.py", "")));
        assert!(is_entry_point(&file("calc.py", "if __name__ == \"__main__\":\n    run()")));
        assert!(is_entry_point(&file("index.html", "")));
        assert!(!is_entry_point(&file("utils.py", "def f(): pass")));
        assert!(!is_entry_point(&file("main.js", "")));
    }

    #[test]
    fn test_generic_rule() {
        let artifacts: Vec<_> = (0..5).map(|i| file(&format!("m{}.py", i), "pass")).collect();
        let b = breakdown("something else", &artifacts, &report(None));
        assert_eq!(b.domain, 70.0);
        assert!(missing_roles("something else", &artifacts).contains(&"entry point"));
    }
}
