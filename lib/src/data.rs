use serde::{Deserialize, Serialize};

use crate::diff::is_diff_file;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub file_name: String,
    pub code: String,
    pub language: String,
}

impl File {
    pub fn new(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let language = Language::from_file_name(&file_name).as_str().to_owned();

        Self {
            file_name,
            code: code.into(),
            language,
        }
    }

    pub fn is_diff(&self) -> bool {
        is_diff_file(&self.file_name)
    }
}

/// The three file groups attached to a chapter.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChapterFiles {
    pub source: Vec<File>,
    pub template: Vec<File>,
    pub solution: Vec<File>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Rust,
    Python,
    Json,
    Html,
    Css,
    Markdown,
    Diff,
    Text,
}

impl Language {
    pub fn from_file_name(file_name: &str) -> Self {
        if is_diff_file(file_name) {
            return Self::Diff;
        }

        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        match extension.as_str() {
            "js" | "jsx" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "rs" => Self::Rust,
            "py" => Self::Python,
            "json" => Self::Json,
            "html" => Self::Html,
            "css" => Self::Css,
            "md" => Self::Markdown,
            "diff" => Self::Diff,
            _ => Self::Text,
        }
    }

    /// Tag attached to fetched files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Rust => "rust",
            Self::Python => "python",
            Self::Json => "json",
            Self::Html => "html",
            Self::Css => "css",
            Self::Markdown => "markdown",
            Self::Diff => "diff",
            Self::Text => "text",
        }
    }

    /// Whether quotes delimit string literals. Prose formats use `'` as an
    /// apostrophe, so they get no literal tracking.
    pub fn has_string_literals(self) -> bool {
        !matches!(self, Self::Markdown | Self::Diff | Self::Text)
    }

    /// Tag understood by the editor, which calls unknown files `plaintext`.
    pub fn editor_tag(self) -> &'static str {
        match self {
            Self::Text => "plaintext",
            other => other.as_str(),
        }
    }
}
