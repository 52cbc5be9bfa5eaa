//! Static processor metadata

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maturity of a processor implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CodeState {
    Broken,
    #[default]
    Experimental,
    Stable,
    Deprecated,
}

impl fmt::Display for CodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeState::Broken => "Broken",
            CodeState::Experimental => "Experimental",
            CodeState::Stable => "Stable",
            CodeState::Deprecated => "Deprecated",
        };
        f.write_str(name)
    }
}

/// Describes a kind of processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorInfo {
    /// Unique type identifier, e.g. `org.inviwo.BufferSource`
    pub class_identifier: String,
    pub display_name: String,
    pub category: String,
    pub code_state: CodeState,
    pub tags: Vec<String>,
}

impl ProcessorInfo {
    pub fn new(class_identifier: &str, display_name: &str) -> Self {
        Self {
            class_identifier: class_identifier.to_string(),
            display_name: display_name.to_string(),
            category: String::new(),
            code_state: CodeState::default(),
            tags: Vec::new(),
        }
    }

    /// Set category
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Set code state
    pub fn code_state(mut self, state: CodeState) -> Self {
        self.code_state = state;
        self
    }

    /// Set tags from a comma separated list
    pub fn tags(mut self, tags: &str) -> Self {
        self.tags = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
