//! Project plan

use crate::catalog::Category;
use crate::fields;
use projcraft_runtime::Structured;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_FEATURES: &[&str] = &["Core functionality"];
pub const DEFAULT_STACK: &[&str] = &["python"];
pub const DEFAULT_CONSTRAINTS: &str = "Must be runnable and well-documented";
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    SingleFile,
    MultiFile,
    WebApp,
    ApiService,
    DesktopApp,
    Library,
    Script,
    #[default]
    Unknown,
}

impl ProjectType {
    /// Lenient parse: case, spaces and dashes are ignored, unknown names map to `Unknown`
    pub fn parse(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "single_file" | "single" => Self::SingleFile,
            "multi_file" | "multi" => Self::MultiFile,
            "web_app" | "webapp" | "web_application" | "web" => Self::WebApp,
            "api_service" | "api" | "rest_api" => Self::ApiService,
            "desktop_app" | "desktop" => Self::DesktopApp,
            "library" | "lib" => Self::Library,
            "script" => Self::Script,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleFile => "single_file",
            Self::MultiFile => "multi_file",
            Self::WebApp => "web_app",
            Self::ApiService => "api_service",
            Self::DesktopApp => "desktop_app",
            Self::Library => "library",
            Self::Script => "script",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated plan. Every field is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub project_name: String,
    pub project_type: ProjectType,
    pub scope: String,
    pub features: Vec<String>,
    pub technology_stack: Vec<String>,
    pub complexity_level: String,
    pub estimated_file_count: u32,
    pub dependencies: Vec<String>,
    pub constraints: String,
    pub user_request: String,
}

const PLAN_KEYS: &[&str] = &[
    "project_name",
    "project_type",
    "scope",
    "features",
    "technology_stack",
    "complexity_level",
    "estimated_files",
    "estimated_file_count",
    "dependencies",
    "constraints",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Plan {
    /// Whether `map` looks like a plan payload at all
    pub fn recognizes(map: &Structured) -> bool {
        fields::has_any(map, PLAN_KEYS)
    }

    /// Validate a model payload, filling every missing field with its default
    pub fn from_structured(map: &Structured, request: &str) -> Self {
        let features = fields::string_list(map, &["features", "key_features"]).unwrap_or_else(|| owned(DEFAULT_FEATURES));
        let technology_stack =
            fields::string_list(map, &["technology_stack", "tech_stack"]).unwrap_or_else(|| owned(DEFAULT_STACK));
        Self {
            project_name: fields::string(map, &["project_name", "name"]).unwrap_or_else(|| UNKNOWN.into()),
            project_type: fields::string(map, &["project_type", "type"])
                .map(|t| ProjectType::parse(&t))
                .unwrap_or_default(),
            scope: fields::string(map, &["scope", "description"]).unwrap_or_else(|| UNKNOWN.into()),
            estimated_file_count: fields::count(map, &["estimated_files", "estimated_file_count"])
                .unwrap_or(features.len() as u32)
                .max(1),
            complexity_level: fields::string(map, &["complexity_level", "complexity"]).unwrap_or_else(|| UNKNOWN.into()),
            dependencies: fields::string_list(map, &["dependencies"]).unwrap_or_else(|| owned(DEFAULT_STACK)),
            constraints: fields::string(map, &["constraints"]).unwrap_or_else(|| DEFAULT_CONSTRAINTS.into()),
            user_request: request.to_string(),
            features,
            technology_stack,
        }
    }

    /// Canned plan for the request's category
    pub fn heuristic(request: &str, category: Category) -> Self {
        let template = category.plan_template();
        let project_type = template.project_type;
        Self {
            project_name: project_name(request),
            project_type,
            scope: format!("A {} application that {}", project_type.as_str().replace('_', " "), request.trim()),
            features: owned(template.features),
            technology_stack: owned(template.technology_stack),
            complexity_level: template.complexity_level.to_string(),
            estimated_file_count: template.estimated_file_count,
            dependencies: owned(template.technology_stack),
            constraints: "Must be runnable, well-documented, and user-friendly".to_string(),
            user_request: request.to_string(),
        }
    }
}

/// First three words, capitalised and joined, plus `App`
pub fn project_name(request: &str) -> String {
    let mut name: String = request
        .split_whitespace()
        .take(3)
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .filter(|w: &String| w.chars().any(char::is_alphanumeric))
        .collect();
    name.retain(|c| c.is_alphanumeric());
    name.push_str("App");
    name
}
