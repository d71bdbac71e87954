//! Deterministic file content.
//!
//! Used by the developer's tertiary tier and by the final per-file guard, so
//! every specified file ends up with real content even when the model is
//! unreachable.

use crate::catalog::Category;
use crate::plan::{Plan, ProjectType};
use crate::structure::{derive_specs, FileSpec, Structure};
use std::collections::BTreeSet;
use std::fmt::Write;

/// Content for `spec` without any model involvement
pub fn tertiary_content(spec: &FileSpec, plan: &Plan, structure: &Structure, category: Category) -> String {
    let name = file_name(&spec.path);
    match name.as_str() {
        "readme.md" => readme(plan, structure),
        "requirements.txt" => {
            let deps: Vec<String> = structure
                .dependencies
                .iter()
                .chain(plan.technology_stack.iter())
                .cloned()
                .collect();
            requirements(&deps)
        }
        _ => match canned(category, &name) {
            Some(text) => text.to_string(),
            None => assemble(spec),
        },
    }
}

fn file_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_lowercase()
}

/// Hand-written file for a category, when one exists
pub fn canned(category: Category, name: &str) -> Option<&'static str> {
    if category == Category::Calculator && name.ends_with(".py") && name.contains("calc") {
        return Some(CALCULATOR_PY);
    }
    if name == "todo_manager.py" {
        return Some(TODO_MANAGER_PY);
    }
    None
}

/// File set used when a structure has no specifications at all
pub fn fallback_file_set(project_type: ProjectType, category: Category) -> Vec<FileSpec> {
    let folders: Vec<(&str, Vec<&str>)> = match project_type {
        ProjectType::WebApp => vec![
            ("frontend", vec!["index.html", "styles.css", "js/app.js", "js/models/task.js", "js/utils/storage.js"]),
            ("root", vec!["README.md"]),
        ],
        ProjectType::ApiService => vec![
            ("src", vec!["main.py", "models.py", "routes.py", "database.py"]),
            ("root", vec!["requirements.txt", "README.md"]),
        ],
        ProjectType::MultiFile => vec![
            ("src", vec!["main.py", "utils.py", "models.py", "config.py"]),
            ("root", vec!["README.md"]),
        ],
        _ => {
            let file = match category {
                Category::Calculator => "calculator.py",
                Category::Todo => "todo_app.py",
                Category::Workout => "workout_app.py",
                _ => "main.py",
            };
            vec![("src", vec![file])]
        }
    };
    derive_specs(folders.iter().map(|(folder, files)| (*folder, files.iter().copied())))
}

// ============================================================================
// Project files
// ============================================================================

pub fn readme(plan: &Plan, structure: &Structure) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", plan.project_name);
    let _ = writeln!(out, "{}\n", plan.scope);

    out.push_str("## Features\n\n");
    for feature in &plan.features {
        let _ = writeln!(out, "- {}", feature);
    }

    out.push_str("\n## Project Structure\n\n");
    for spec in &structure.file_specifications {
        let _ = writeln!(out, "- `{}`: {}", spec.path, spec.description);
    }

    out.push_str("\n## Getting Started\n\n");
    if structure.paths().iter().any(|p| file_name(p) == "requirements.txt") {
        out.push_str("Install the dependencies:\n\n```bash\npip install -r requirements.txt\n```\n\n");
    }
    let entry = structure
        .file_specifications
        .iter()
        .find(|s| s.content_type == "python_main")
        .or_else(|| structure.file_specifications.iter().find(|s| s.path.ends_with(".py")));
    match entry {
        Some(spec) => {
            let _ = writeln!(out, "Run the application:\n\n```bash\npython {}\n```", spec.path);
        }
        None => out.push_str("Open the HTML entry page in a browser.\n"),
    }

    let _ = writeln!(out, "\n## Technology\n\n{}", plan.technology_stack.join(", "));
    out
}

/// `requirements.txt` for a dependency list; standard library and front-end
/// entries are skipped.
pub fn requirements(deps: &[String]) -> String {
    let mut pins = BTreeSet::new();
    for dep in deps {
        let pinned: &[&str] = match dep.trim().to_lowercase().as_str() {
            "flask" => &["flask>=2.3"],
            "fastapi" => &["fastapi>=0.100", "uvicorn>=0.23"],
            "uvicorn" => &["uvicorn>=0.23"],
            "sqlalchemy" => &["sqlalchemy>=2.0"],
            "pydantic" => &["pydantic>=2.0"],
            "websockets" => &["flask-socketio>=5.3"],
            "pygame" => &["pygame>=2.5"],
            "requests" => &["requests>=2.31"],
            _ => &[],
        };
        pins.extend(pinned.iter().copied());
    }
    if pins.is_empty() {
        return "# Standard library only, nothing to install\n".to_string();
    }
    pins.into_iter().map(|p| format!("{}\n", p)).collect()
}

// ============================================================================
// Skeleton assembly
// ============================================================================

/// Imports, skeleton and one stub per key feature, by content type
pub fn assemble(spec: &FileSpec) -> String {
    let features: Vec<&str> = if spec.key_features.is_empty() {
        vec!["Core functionality"]
    } else {
        spec.key_features.iter().map(String::as_str).collect()
    };

    match spec.content_type.as_str() {
        "python_main" | "python_module" | "python" => python(spec, &features),
        "python_config" => python_config(spec),
        "html" => html(spec, &features),
        "css" => css(spec, &features),
        "javascript" | "js" => javascript(spec, &features),
        "sql" => sql(spec, &features),
        "json" => json(spec, &features),
        "markdown" => {
            let mut out = format!("# {}\n\n", spec.description);
            for feature in &features {
                let _ = writeln!(out, "- {}", feature);
            }
            out
        }
        _ => {
            let mut out = format!("{}\n\n", spec.description);
            for feature in &features {
                let _ = writeln!(out, "* {}", feature);
            }
            out
        }
    }
}

fn snake_case(text: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    let out = out.trim_end_matches('_').to_string();
    match out.chars().next() {
        None => "feature".to_string(),
        Some(c) if c.is_ascii_digit() => format!("feature_{}", out),
        Some(_) => out,
    }
}

/// Keywords, plus the names the python template binds itself
const PYTHON_RESERVED: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif", "else", "except",
    "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass",
    "raise", "return", "try", "while", "with", "yield", "main", "index", "app", "sys", "request", "jsonify",
    "sqlite3", "print", "list", "str",
];

const JS_KEYWORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do", "else",
    "export", "extends", "finally", "for", "function", "if", "import", "in", "instanceof", "let", "new",
    "return", "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Python function name for a feature, suffixed when it would clash
fn py_ident(text: &str) -> String {
    let name = snake_case(text);
    if PYTHON_RESERVED.contains(&name.as_str()) {
        format!("{}_feature", name)
    } else {
        name
    }
}

fn js_ident(text: &str) -> String {
    let name = camel_case(text);
    if JS_KEYWORDS.contains(&name.as_str()) {
        format!("{}Feature", name)
    } else {
        name
    }
}

/// Text safe inside a double-quoted Python string or docstring
fn py_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' | '\t' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

fn camel_case(text: &str) -> String {
    let snake = snake_case(text);
    let mut out = String::new();
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn uses(spec: &FileSpec, dep: &str) -> bool {
    spec.dependencies.iter().any(|d| d.eq_ignore_ascii_case(dep)) || spec.description.to_lowercase().contains(dep)
}

fn python(spec: &FileSpec, features: &[&str]) -> String {
    let flask = uses(spec, "flask");
    let is_main = spec.content_type == "python_main";
    let mut out = format!("\"\"\"{}.\"\"\"\n\n", py_text(spec.description.trim_end_matches('.')));

    let wants_db = features.iter().any(|f| {
        let f = f.to_lowercase();
        f.contains("database") || f.contains("storage")
    });
    if wants_db || uses(spec, "sqlite3") {
        out.push_str("import sqlite3\n");
    }
    out.push_str("import sys\n");
    if flask {
        out.push_str("\nfrom flask import Flask, jsonify, request\n\napp = Flask(__name__)\n");
    }
    out.push('\n');

    let mut defined = BTreeSet::new();
    for feature in features {
        let lower = feature.to_lowercase();
        if lower.contains("database") || lower.contains("storage") {
            if defined.insert("setup_database".to_string()) {
                out.push_str(
                    "\ndef setup_database(path=\"app.db\"):\n    \"\"\"Create the storage tables.\"\"\"\n    \
                     conn = sqlite3.connect(path)\n    conn.execute(\n        \"CREATE TABLE IF NOT EXISTS items \"\n        \
                     \"(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)\"\n    )\n    conn.commit()\n    return conn\n\n",
                );
            }
        } else if flask && (lower.contains("api") || lower.contains("endpoint") || lower.contains("route")) {
            let name = py_ident(feature);
            let feature = py_text(feature);
            if defined.insert(name.clone()) {
                let _ = write!(
                    out,
                    "\n@app.route(\"/api/{route}\", methods=[\"GET\", \"POST\"])\ndef {name}():\n    \"\"\"{feature}.\"\"\"\n    \
                     if request.method == \"POST\":\n        return jsonify(request.get_json(silent=True) or {{}}), 201\n    \
                     return jsonify({{\"feature\": \"{feature}\"}})\n\n",
                    route = snake_case(&feature).replace('_', "-"),
                );
            }
        } else if lower.contains("error") {
            if defined.insert("handle_error".to_string()) {
                out.push_str(
                    "\ndef handle_error(error):\n    \"\"\"Report an error without crashing.\"\"\"\n    \
                     print(f\"Error: {error}\", file=sys.stderr)\n    return {\"error\": str(error)}\n\n",
                );
            }
        } else {
            let name = py_ident(feature);
            let feature = py_text(feature);
            if defined.insert(name.clone()) {
                let _ = write!(
                    out,
                    "\ndef {name}(*args, **kwargs):\n    \"\"\"{feature}.\"\"\"\n    \
                     return {{\"feature\": \"{feature}\", \"args\": list(args), \"options\": kwargs}}\n\n"
                );
            }
        }
    }

    if flask && is_main {
        out.push_str(
            "\n@app.route(\"/\")\ndef index():\n    return jsonify({\"status\": \"ok\"})\n\n\n\
             if __name__ == \"__main__\":\n    app.run(debug=True)\n",
        );
    } else if is_main {
        let calls: String = defined
            .iter()
            .filter(|name| name.as_str() != "handle_error")
            .map(|name| format!("        print({}())\n", name))
            .collect();
        let _ = write!(
            out,
            "\ndef main():\n    \"\"\"Entry point.\"\"\"\n    try:\n{calls}    except Exception as error:\n        \
             print(f\"Error: {{error}}\", file=sys.stderr)\n        return 1\n    return 0\n\n\n\
             if __name__ == \"__main__\":\n    sys.exit(main())\n",
            calls = if calls.is_empty() { "        pass\n".to_string() } else { calls },
        );
    }
    out
}

fn python_config(spec: &FileSpec) -> String {
    format!(
        "\"\"\"{}.\"\"\"\n\nimport os\n\n\nclass Config:\n    DEBUG = os.environ.get(\"DEBUG\", \"false\").lower() == \"true\"\n    \
         SECRET_KEY = os.environ.get(\"SECRET_KEY\", \"change-me\")\n    \
         DATABASE_URL = os.environ.get(\"DATABASE_URL\", \"sqlite:///app.db\")\n    PORT = int(os.environ.get(\"PORT\", \"5000\"))\n",
        py_text(spec.description.trim_end_matches('.'))
    )
}

fn html(spec: &FileSpec, features: &[&str]) -> String {
    let mut sections = String::new();
    for feature in features {
        let _ = writeln!(
            sections,
            "    <section id=\"{}\">\n      <h2>{}</h2>\n    </section>",
            snake_case(feature).replace('_', "-"),
            feature
        );
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  <title>{title}</title>\n  \
         <link rel=\"stylesheet\" href=\"styles.css\">\n</head>\n<body>\n  <header>\n    <h1>{title}</h1>\n  </header>\n  \
         <main>\n{sections}  </main>\n  <script src=\"app.js\"></script>\n</body>\n</html>\n",
        title = spec.description,
    )
}

fn css(spec: &FileSpec, features: &[&str]) -> String {
    let mut out = format!(
        "/* {} */\n\n* {{\n  box-sizing: border-box;\n}}\n\nbody {{\n  margin: 0;\n  \
         font-family: system-ui, sans-serif;\n  color: #222;\n  background: #f7f7f7;\n}}\n\nmain {{\n  \
         max-width: 960px;\n  margin: 0 auto;\n  padding: 1rem;\n}}\n",
        spec.description
    );
    for feature in features {
        let _ = write!(
            out,
            "\n#{} {{\n  margin-bottom: 1rem;\n  padding: 1rem;\n  background: #fff;\n  border-radius: 6px;\n}}\n",
            snake_case(feature).replace('_', "-")
        );
    }
    out
}

fn javascript(spec: &FileSpec, features: &[&str]) -> String {
    let mut out = format!("// {}\n'use strict';\n", spec.description);
    let mut names = Vec::new();
    for feature in features {
        let name = js_ident(feature);
        if names.contains(&name) {
            continue;
        }
        let _ = write!(
            out,
            "\nfunction {name}() {{\n  const section = document.getElementById('{id}');\n  \
             if (section) {{\n    section.dataset.ready = 'true';\n  }}\n  return section;\n}}\n",
            id = snake_case(feature).replace('_', "-"),
        );
        names.push(name);
    }
    let calls: String = names.iter().map(|n| format!("  {}();\n", n)).collect();
    let _ = write!(out, "\ndocument.addEventListener('DOMContentLoaded', () => {{\n{}}});\n", calls);
    out
}

fn sql(spec: &FileSpec, features: &[&str]) -> String {
    let mut out = format!("-- {}\n", spec.description);
    for feature in features {
        let _ = writeln!(out, "-- {}", feature);
    }
    out.push_str(
        "\nCREATE TABLE IF NOT EXISTS items (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    name TEXT NOT NULL,\n    \
         created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n);\n",
    );
    out
}

fn json(spec: &FileSpec, features: &[&str]) -> String {
    let value = serde_json::json!({
        "description": spec.description,
        "features": features,
    });
    let mut out = serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string());
    out.push('\n');
    out
}

// ============================================================================
// Canned files
// ============================================================================

const CALCULATOR_PY: &str = r#""""Command line calculator."""

import operator
import sys

OPERATIONS = {
    "+": operator.add,
    "-": operator.sub,
    "*": operator.mul,
    "/": operator.truediv,
    "%": operator.mod,
    "**": operator.pow,
}


def calculate(left, op, right):
    """Apply `op` to two numbers."""
    if op not in OPERATIONS:
        raise ValueError(f"Unsupported operation: {op}")
    if op in ("/", "%") and right == 0:
        raise ZeroDivisionError("Division by zero")
    return OPERATIONS[op](left, right)


def parse_number(text):
    """Parse user input as a number."""
    try:
        value = float(text)
    except ValueError as error:
        raise ValueError(f"Not a number: {text!r}") from error
    return int(value) if value.is_integer() else value


def evaluate(line):
    """Evaluate a line of the form `<number> <op> <number>`."""
    parts = line.split()
    if len(parts) != 3:
        raise ValueError("Expected: <number> <operator> <number>")
    left, op, right = parts
    return calculate(parse_number(left), op, parse_number(right))


def main():
    """Read expressions until the user types quit."""
    print("Calculator. Operators: " + " ".join(OPERATIONS) + ". Type 'quit' to exit.")
    while True:
        try:
            line = input("> ").strip()
        except (EOFError, KeyboardInterrupt):
            print()
            return 0
        if line.lower() in ("quit", "exit", "q"):
            return 0
        if not line:
            continue
        try:
            print(evaluate(line))
        except (ValueError, ZeroDivisionError) as error:
            print(f"Error: {error}")


if __name__ == "__main__":
    sys.exit(main())
"#;

const TODO_MANAGER_PY: &str = r#""""Task storage and operations."""

import json
import os
from datetime import datetime


class TodoManager:
    """Keeps tasks in a JSON file."""

    def __init__(self, path="todos.json"):
        self.path = path
        self.tasks = self._load()

    def _load(self):
        if not os.path.exists(self.path):
            return []
        with open(self.path, encoding="utf-8") as handle:
            return json.load(handle)

    def _save(self):
        with open(self.path, "w", encoding="utf-8") as handle:
            json.dump(self.tasks, handle, indent=2)

    def add(self, title, category="general"):
        task = {
            "id": max((t["id"] for t in self.tasks), default=0) + 1,
            "title": title,
            "category": category,
            "done": False,
            "created_at": datetime.now().isoformat(),
        }
        self.tasks.append(task)
        self._save()
        return task

    def remove(self, task_id):
        before = len(self.tasks)
        self.tasks = [t for t in self.tasks if t["id"] != task_id]
        self._save()
        return len(self.tasks) != before

    def complete(self, task_id):
        for task in self.tasks:
            if task["id"] == task_id:
                task["done"] = True
                self._save()
                return task
        return None

    def list(self, category=None):
        if category is None:
            return list(self.tasks)
        return [t for t in self.tasks if t["category"] == category]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(path: &str, content_type: &str, features: &[&str]) -> FileSpec {
        FileSpec::new(path, content_type, "Sample file").with_features(features)
    }

    #[test]
    fn test_identifier_conversion() {
        assert_eq!(snake_case("Add tasks"), "add_tasks");
        assert_eq!(snake_case("Charts & graphs!"), "charts_graphs");
        assert_eq!(snake_case("3D view"), "feature_3d_view");
        assert_eq!(snake_case("!!"), "feature");
        assert_eq!(camel_case("Mark complete"), "markComplete");
    }

    #[test]
    fn test_reserved_names_are_suffixed() {
        assert_eq!(py_ident("Import"), "import_feature");
        assert_eq!(py_ident("class"), "class_feature");
        assert_eq!(py_ident("Main"), "main_feature");
        assert_eq!(py_ident("Add tasks"), "add_tasks");
        assert_eq!(js_ident("Delete"), "deleteFeature");
        assert_eq!(js_ident("Mark complete"), "markComplete");
    }

    #[test]
    fn test_feature_text_is_escaped() {
        let text = assemble(&spec("tool.py", "python_module", &["Say \"hi\"", "import"]));
        assert!(text.contains("\"\"\"Say \\\"hi\\\".\"\"\""));
        assert!(text.contains("{\"feature\": \"Say \\\"hi\\\"\""));
        assert!(text.contains("def import_feature("));
        assert!(!text.contains("def import("));
        assert_eq!(py_text("a\\b\nc"), "a\\\\b c");
    }

    #[test]
    fn test_python_main_has_entry_point() {
        let text = assemble(&spec("main.py", "python_main", &["Add tasks", "Database storage", "Error handling"]));
        assert!(text.contains("def add_tasks("));
        assert!(text.contains("def setup_database("));
        assert!(text.contains("def handle_error("));
        assert!(text.contains("if __name__ == \"__main__\":"));
        assert!(text.contains("import sqlite3"));
    }

    #[test]
    fn test_flask_app() {
        let spec = spec("app.py", "python_main", &["API endpoints"]).with_dependencies(&["flask"]);
        let text = assemble(&spec);
        assert!(text.contains("app = Flask(__name__)"));
        assert!(text.contains("@app.route(\"/api/api-endpoints\""));
        assert!(text.contains("app.run(debug=True)"));
    }

    #[test]
    fn test_every_content_type_is_non_empty() {
        for ct in ["python_module", "python_config", "html", "css", "javascript", "sql", "json", "markdown", "text", "other"] {
            let text = assemble(&spec("x", ct, &[]));
            assert!(text.trim().len() > 10, "{}", ct);
        }
    }

    #[test]
    fn test_requirements() {
        let deps: Vec<String> = ["python", "flask", "fastapi", "html"].iter().map(|s| s.to_string()).collect();
        assert_eq!(requirements(&deps), "fastapi>=0.100\nflask>=2.3\nuvicorn>=0.23\n");
        assert!(requirements(&["python".to_string()]).starts_with('#'));
    }

    #[test]
    fn test_readme_is_substantial() {
        let plan = Plan::heuristic("calculator", Category::Calculator);
        let structure = Structure::from_layout(Category::Calculator.layout(), &plan.technology_stack);
        let text = readme(&plan, &structure);
        assert!(text.len() > 200);
        assert!(text.starts_with("# CalculatorApp"));
        assert!(text.contains("python calculator.py"));
    }

    #[test]
    fn test_canned_files() {
        assert!(canned(Category::Calculator, "calculator.py").is_some());
        assert!(canned(Category::Calculator, "math_operations.py").is_none());
        assert!(canned(Category::General, "calculator.py").is_none());
        assert!(canned(Category::General, "todo_manager.py").is_some());
        assert!(CALCULATOR_PY.contains("if __name__ == \"__main__\":"));
    }

    #[test]
    fn test_fallback_file_sets() {
        let web = fallback_file_set(ProjectType::WebApp, Category::Todo);
        let paths: Vec<_> = web.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["index.html", "styles.css", "js/app.js", "js/models/task.js", "js/utils/storage.js", "README.md"]);
        assert_eq!(fallback_file_set(ProjectType::ApiService, Category::Api).len(), 6);
        assert_eq!(fallback_file_set(ProjectType::SingleFile, Category::Calculator)[0].path, "calculator.py");
        assert_eq!(fallback_file_set(ProjectType::Unknown, Category::General)[0].path, "main.py");
    }
}
