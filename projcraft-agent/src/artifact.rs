//! Generated files

use serde::{Deserialize, Serialize};
use std::fmt;

/// File type, derived from the path extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Python,
    Html,
    Css,
    Javascript,
    Json,
    Markdown,
    Text,
}

impl FileType {
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        let ext = match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Self::Text,
        };
        match ext.as_str() {
            "py" => Self::Python,
            "html" => Self::Html,
            "css" => Self::Css,
            "js" => Self::Javascript,
            "json" => Self::Json,
            "md" => Self::Markdown,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Html => "html",
            Self::Css => "css",
            Self::Javascript => "javascript",
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated file. Never mutated; review produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub content: String,
    pub file_type: FileType,
    pub dependencies: Vec<String>,
}

impl Artifact {
    pub fn new(path: impl Into<String>, content: impl Into<String>, dependencies: Vec<String>) -> Self {
        let path = path.into();
        Self {
            file_type: FileType::from_path(&path),
            path,
            content: content.into(),
            dependencies,
        }
    }

    /// Same file with different content
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            path: self.path.clone(),
            content: content.into(),
            file_type: self.file_type,
            dependencies: self.dependencies.clone(),
        }
    }

    /// Lowercased final path segment
    pub fn file_name(&self) -> String {
        self.path.rsplit('/').next().unwrap_or(&self.path).to_lowercase()
    }
}
