//! Project structure and per-file specifications

use crate::artifact::FileType;
use crate::catalog::{Layout, DEFAULT_LAYOUT};
use crate::fields;
use crate::plan::{Plan, UNKNOWN};
use projcraft_runtime::{normalize_path, Structured};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_PATTERN: &str = "Simple";
pub const DEFAULT_DESIGN_PATTERNS: &[&str] = &["Separation of Concerns"];

/// What the developer should produce for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: String,
    pub content_type: String,
    pub description: String,
    pub key_features: Vec<String>,
    pub dependencies: Vec<String>,
}

impl FileSpec {
    pub fn new(path: impl Into<String>, content_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
            description: description.into(),
            key_features: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.key_features = features.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.dependencies = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Validate one model entry. Entries without a usable path yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let (raw_path, map) = match value {
            Value::String(path) => (path.clone(), None),
            Value::Object(map) => (fields::string(map, &["path", "file_path", "filename", "name"])?, Some(map)),
            _ => return None,
        };
        let path = normalize_path(&raw_path).ok()?;
        let content_type = infer_content_type(&path);
        let mut spec = FileSpec::new(&path, content_type, format!("Project file {}", path));
        if let Some(map) = map {
            if let Some(ct) = fields::string(map, &["content_type", "type"]) {
                spec.content_type = ct.to_lowercase();
            }
            if let Some(desc) = fields::string(map, &["description", "purpose"]) {
                spec.description = desc;
            }
            spec.key_features = fields::string_list(map, &["key_features", "features"]).unwrap_or_default();
            spec.dependencies = fields::string_list(map, &["dependencies", "imports"]).unwrap_or_default();
        }
        if spec.key_features.is_empty() {
            spec.key_features = vec!["Core functionality".to_string()];
        }
        Some(spec)
    }
}

/// Validated structure. `file_specifications` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub architecture_pattern: String,
    pub file_structure: BTreeMap<String, Vec<String>>,
    pub file_specifications: Vec<FileSpec>,
    pub dependencies: Vec<String>,
    pub design_patterns: Vec<String>,
    pub folder_organization: String,
}

const STRUCTURE_KEYS: &[&str] = &["file_specifications", "file_structure", "files"];

impl Structure {
    pub fn recognizes(map: &Structured) -> bool {
        fields::has_any(map, STRUCTURE_KEYS)
    }

    /// Validate a model payload against the plan.
    ///
    /// Specifications fall back to the ones derived from `file_structure`,
    /// then to the default layout.
    pub fn from_structured(map: &Structured, plan: &Plan) -> Self {
        let mut file_structure: BTreeMap<String, Vec<String>> = match map.get("file_structure") {
            Some(Value::Object(folders)) => folders
                .iter()
                .filter_map(|(folder, files)| Some((folder.clone(), fields::as_string_list(files)?)))
                .collect(),
            _ => BTreeMap::new(),
        };

        let mut seen = HashSet::new();
        let mut specs: Vec<FileSpec> = match map.get("file_specifications").or_else(|| map.get("files")) {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(FileSpec::from_value)
                .filter(|spec| seen.insert(spec.path.clone()))
                .collect(),
            _ => Vec::new(),
        };

        if specs.is_empty() {
            specs = derive_specs(file_structure.iter().map(|(k, v)| (k.as_str(), v.iter().map(String::as_str))));
        }
        if specs.is_empty() {
            file_structure = layout_folders(&DEFAULT_LAYOUT);
            specs = derive_specs(DEFAULT_LAYOUT.folders.iter().map(|(k, v)| (*k, v.iter().copied())));
        }
        if file_structure.is_empty() {
            file_structure.insert("root".to_string(), specs.iter().map(|s| s.path.clone()).collect());
        }

        Self {
            architecture_pattern: fields::string(map, &["architecture_pattern", "pattern"])
                .unwrap_or_else(|| DEFAULT_PATTERN.into()),
            file_structure,
            file_specifications: specs,
            dependencies: fields::string_list(map, &["dependencies"]).unwrap_or_else(|| plan.technology_stack.clone()),
            design_patterns: fields::string_list(map, &["design_patterns"])
                .unwrap_or_else(|| DEFAULT_DESIGN_PATTERNS.iter().map(|s| s.to_string()).collect()),
            folder_organization: fields::string(map, &["folder_organization"]).unwrap_or_else(|| UNKNOWN.into()),
        }
    }

    /// Structure for a canned layout. An empty layout dependency list means `stack`.
    pub fn from_layout(layout: &Layout, stack: &[String]) -> Self {
        let dependencies = if layout.dependencies.is_empty() {
            stack.to_vec()
        } else {
            layout.dependencies.iter().map(|s| s.to_string()).collect()
        };
        Self {
            architecture_pattern: layout.architecture_pattern.to_string(),
            file_structure: layout_folders(layout),
            file_specifications: derive_specs(layout.folders.iter().map(|(k, v)| (*k, v.iter().copied()))),
            dependencies,
            design_patterns: vec!["Separation of Concerns".to_string(), "Single Responsibility".to_string()],
            folder_organization: layout.folder_organization.to_string(),
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.file_specifications.iter().map(|s| s.path.as_str()).collect()
    }
}

fn layout_folders(layout: &Layout) -> BTreeMap<String, Vec<String>> {
    layout
        .folders
        .iter()
        .map(|(folder, files)| (folder.to_string(), files.iter().map(|f| f.to_string()).collect()))
        .collect()
}

// ============================================================================
// Derivation by folder role
// ============================================================================

/// Content type guessed from a path
pub fn infer_content_type(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    match FileType::from_path(path) {
        FileType::Python if name.contains("main") || name == "app.py" => "python_main",
        FileType::Python if name.contains("config") || name.contains("settings") => "python_config",
        FileType::Python => "python_module",
        FileType::Html => "html",
        FileType::Css => "css",
        FileType::Javascript => "javascript",
        FileType::Json => "json",
        FileType::Markdown => "markdown",
        FileType::Text if name.ends_with(".sql") => "sql",
        FileType::Text => "text",
    }
}

/// Derive specifications from folder listings, in folder order, skipping
/// duplicate and invalid paths.
pub fn derive_specs<'a, F>(folders: impl IntoIterator<Item = (&'a str, F)>) -> Vec<FileSpec>
where
    F: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut specs = Vec::new();
    for (folder, files) in folders {
        for file in files {
            let Ok(path) = normalize_path(file) else {
                continue;
            };
            if seen.insert(path.clone()) {
                specs.push(spec_for_role(&folder.to_lowercase(), &path));
            }
        }
    }
    specs
}

fn humanize(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let stem = name.split('.').next().unwrap_or(name).replace(['_', '-'], " ");
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn spec_for_role(folder: &str, path: &str) -> FileSpec {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    let inferred = infer_content_type(path);
    let label = humanize(path);

    match (folder, inferred) {
        (_, "markdown") if name == "readme.md" => FileSpec::new(path, "markdown", "Project documentation")
            .with_features(&["Project overview", "Setup instructions", "Usage guide"]),
        (_, "text") if name == "requirements.txt" => {
            FileSpec::new(path, "text", "Python dependencies").with_features(&["Dependency list"])
        }
        ("root", "markdown" | "text") => {
            FileSpec::new(path, inferred, format!("Project {}", name)).with_features(&["Basic project file"])
        }
        ("backend" | "src", "python_main") if name.contains("app") => {
            FileSpec::new(path, "python_main", "Main Flask application")
                .with_features(&["Flask app setup", "Route definitions", "Error handling"])
                .with_dependencies(&["flask"])
        }
        ("backend" | "src", "python_main") => FileSpec::new(path, "python_main", "Main application entry point")
            .with_features(&["Application entry point", "Core functionality", "Error handling"]),
        (_, "python_module") if name.starts_with("models") => FileSpec::new(path, "python_module", "Data models")
            .with_features(&["Database models", "Data validation", "Relationships"])
            .with_dependencies(&["sqlite3"]),
        (_, "python_module") if name.starts_with("routes") => FileSpec::new(path, "python_module", "Route handlers")
            .with_features(&["API endpoints", "Request handling", "Response formatting"])
            .with_dependencies(&["flask"]),
        (_, "python_module") if name.starts_with("database") => FileSpec::new(path, "python_module", "Database access")
            .with_features(&["Database setup", "Connection management", "Queries"])
            .with_dependencies(&["sqlite3"]),
        ("backend", "python_module") => FileSpec::new(path, "python_module", format!("Backend module: {}", label))
            .with_features(&[label.as_str(), "Error handling"]),
        ("modules", "python_module") => FileSpec::new(path, "python_module", format!("Feature module: {}", label))
            .with_features(&["Core functionality"]),
        (_, "python_module") => FileSpec::new(path, "python_module", format!("{} module", label))
            .with_features(&[label.as_str(), "Core functionality"]),
        (_, "python_config") => FileSpec::new(path, "python_config", "Configuration settings")
            .with_features(&["Environment settings", "Default values"]),
        (_, "html") => FileSpec::new(path, "html", format!("{} page", label))
            .with_features(&["Page layout", "Forms", "Navigation"]),
        (_, "css") => FileSpec::new(path, "css", "Stylesheet").with_features(&["Layout", "Responsive design", "Theme"]),
        (_, "javascript") => FileSpec::new(path, "javascript", format!("Client-side logic: {}", label))
            .with_features(&["DOM interaction", "Event handling", "API calls"]),
        (_, "sql") => FileSpec::new(path, "sql", "Database schema").with_features(&["Table definitions", "Indexes"]),
        _ => FileSpec::new(path, inferred, format!("Project file {}", path)).with_features(&["Core functionality"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use serde_json::json;

    fn plan() -> Plan {
        Plan::heuristic("todo app", Category::Todo)
    }

    fn payload(value: Value) -> Structured {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_validation_drops_bad_entries() {
        let structure = Structure::from_structured(
            &payload(json!({
                "architecture_pattern": "MVC",
                "file_specifications": [
                    {"path": "src\\main.py"},
                    {"description": "no path"},
                    {"path": "../escape.py"},
                    {"path": "/static/app.js", "content_type": "JavaScript", "key_features": ["Render"]},
                    {"path": "src/main.py"},
                    "README.md"
                ]
            })),
            &plan(),
        );
        assert_eq!(structure.paths(), vec!["src/main.py", "static/app.js", "README.md"]);
        assert_eq!(structure.file_specifications[0].content_type, "python_main");
        assert_eq!(structure.file_specifications[1].content_type, "javascript");
        assert_eq!(structure.file_specifications[1].key_features, vec!["Render"]);
        assert_eq!(structure.file_specifications[2].key_features, vec!["Core functionality"]);
        assert_eq!(structure.architecture_pattern, "MVC");
        assert_eq!(structure.dependencies, plan().technology_stack);
    }

    #[test]
    fn test_falls_back_to_file_structure() {
        let structure = Structure::from_structured(
            &payload(json!({"file_structure": {"backend": ["app.py"], "frontend": ["index.html"]}})),
            &plan(),
        );
        assert_eq!(structure.paths(), vec!["app.py", "index.html"]);
        assert_eq!(structure.file_specifications[0].description, "Main Flask application");
    }

    #[test]
    fn test_falls_back_to_default_layout() {
        let structure = Structure::from_structured(&payload(json!({"file_specifications": []})), &plan());
        assert_eq!(structure.paths(), vec!["README.md", "main.py"]);
        assert_eq!(structure.architecture_pattern, DEFAULT_PATTERN);
        assert_eq!(structure.design_patterns, vec!["Separation of Concerns"]);
        assert!(!structure.file_structure.is_empty());
    }

    #[test]
    fn test_from_layout() {
        let structure = Structure::from_layout(Category::Todo.layout(), &plan().technology_stack);
        assert_eq!(
            structure.paths(),
            vec!["README.md", "requirements.txt", "main.py", "todo_manager.py", "index.html", "styles.css", "app.js"]
        );
        let manager = &structure.file_specifications[3];
        assert_eq!(manager.content_type, "python_module");
        assert_eq!(manager.description, "Backend module: Todo manager");
        assert_eq!(structure.dependencies, plan().technology_stack);
    }

    #[test]
    fn test_infer_content_type() {
        assert_eq!(infer_content_type("main.py"), "python_main");
        assert_eq!(infer_content_type("config/settings.py"), "python_config");
        assert_eq!(infer_content_type("schema.sql"), "sql");
        assert_eq!(infer_content_type("notes.txt"), "text");
    }
}
