//! Intent classification
//!
//! Maps a raw utterance to a [`TaskCategory`] with a fixed lexical policy:
//! case-fold, then test image keywords before code keywords, falling back to
//! plain text. Matching is by substring, so a keyword inside an unrelated word
//! still triggers ("manuscript" contains "script" and classifies as code).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Image keywords, checked first
pub const DEFAULT_IMAGE_KEYWORDS: &[&str] = &["image", "draw", "picture", "visual"];

/// Code keywords, checked only when no image keyword matched
pub const DEFAULT_CODE_KEYWORDS: &[&str] = &["code", "function", "script", "program"];

/// Task category an utterance is routed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    Text,
    Code,
    Image,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 3] = [TaskCategory::Text, TaskCategory::Code, TaskCategory::Image];

    /// Stable lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Text => "text",
            TaskCategory::Code => "code",
            TaskCategory::Image => "image",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label that names no known task category
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task type '{0}'")]
pub struct UnknownTaskCategory(pub String);

impl FromStr for TaskCategory {
    type Err = UnknownTaskCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(TaskCategory::Text),
            "code" => Ok(TaskCategory::Code),
            "image" => Ok(TaskCategory::Image),
            other => Err(UnknownTaskCategory(other.to_string())),
        }
    }
}

/// Classification capability. Implementations must be total and pure.
pub trait Classifier: Send + Sync {
    fn classify(&self, utterance: &str) -> TaskCategory;
}

/// Keyword-substring classifier
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    image_keywords: Vec<String>,
    code_keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_IMAGE_KEYWORDS, DEFAULT_CODE_KEYWORDS)
    }

    /// Build a classifier from custom keyword lists.
    ///
    /// Keywords are case-folded here so they compare against the case-folded
    /// utterance. Empty keywords are dropped since they would match anything.
    pub fn with_keywords<I, C>(image_keywords: I, code_keywords: C) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            image_keywords: normalize_keywords(image_keywords),
            code_keywords: normalize_keywords(code_keywords),
        }
    }

    pub fn image_keywords(&self) -> &[String] {
        &self.image_keywords
    }

    pub fn code_keywords(&self) -> &[String] {
        &self.code_keywords
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, utterance: &str) -> TaskCategory {
        let normalized = utterance.to_lowercase();

        if contains_any(&normalized, &self.image_keywords) {
            TaskCategory::Image
        } else if contains_any(&normalized, &self.code_keywords) {
            TaskCategory::Code
        } else {
            TaskCategory::Text
        }
    }
}

fn normalize_keywords<I>(keywords: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}
