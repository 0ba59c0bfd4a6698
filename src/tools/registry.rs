//! Tool registry with JSON schemas
//!
//! Maintains the catalogue of tools this binary can run, with the input
//! and output schemas an agent needs to describe them.
//!
//! Tools:
//! - scrape: Scrape a Wikipedia page
//! - summarize: Summarize text within a word budget
//! - translate: Translate text into a target language
//! - sentiment: VADER sentiment analysis
//! - resize: Fetch and resize an image to JPEG

use crate::tools::types::ToolSchema;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The tools hosted by this binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Scrape,
    Summarize,
    Translate,
    Sentiment,
    Resize,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Scrape,
        ToolKind::Summarize,
        ToolKind::Translate,
        ToolKind::Sentiment,
        ToolKind::Resize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Scrape => "scrape",
            ToolKind::Summarize => "summarize",
            ToolKind::Translate => "translate",
            ToolKind::Sentiment => "sentiment",
            ToolKind::Resize => "resize",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

/// Tool registry
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// Map of tool name to schema
    tools: HashMap<String, ToolSchema>,
}

impl ToolRegistry {
    /// Create new tool registry with all tools
    pub fn new() -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };

        registry.register(ToolSchema::new(
            ToolKind::Scrape.name(),
            "Scrape a Wikipedia article: title, paragraph text and image URLs",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "Absolute http(s) URL of the article"}
                },
                "required": ["url"]
            }),
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "text": {"type": "string"},
                    "images": {"type": "array", "items": {"type": "string"}}
                }
            }),
            true,
        ));

        registry.register(ToolSchema::new(
            ToolKind::Summarize.name(),
            "Summarize text within a word budget",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"},
                    "max_words": {"type": "integer", "minimum": 1, "maximum": 5000, "default": 200}
                },
                "required": ["text"]
            }),
            json!({
                "type": "object",
                "properties": {"summary": {"type": "string"}}
            }),
            true,
        ));

        registry.register(ToolSchema::new(
            ToolKind::Translate.name(),
            "Translate text into a target language",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"},
                    "target_language": {"type": "string"}
                },
                "required": ["text", "target_language"]
            }),
            json!({
                "type": "object",
                "properties": {"translated": {"type": "string"}}
            }),
            true,
        ));

        registry.register(ToolSchema::new(
            ToolKind::Sentiment.name(),
            "Sentiment analysis: positive, negative or neutral with valence scores",
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
            json!({
                "type": "object",
                "properties": {
                    "label": {"type": "string", "enum": ["positive", "negative", "neutral"]},
                    "scores": {
                        "type": "object",
                        "properties": {
                            "neg": {"type": "number"},
                            "neu": {"type": "number"},
                            "pos": {"type": "number"},
                            "compound": {"type": "number"}
                        }
                    }
                }
            }),
            false,
        ));

        registry.register(ToolSchema::new(
            ToolKind::Resize.name(),
            "Resize an image from a URL and return it as base64 JPEG",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string"},
                    "width": {"type": "integer", "minimum": 1, "maximum": 8192},
                    "height": {"type": "integer", "minimum": 1, "maximum": 8192},
                    "keep_aspect": {"type": "boolean", "default": true}
                },
                "required": ["url", "width", "height"]
            }),
            json!({
                "type": "object",
                "properties": {"image_base64_jpeg": {"type": "string"}}
            }),
            true,
        ));

        registry
    }

    fn register(&mut self, schema: ToolSchema) {
        self.tools.insert(schema.name.clone(), schema);
    }

    /// Get tool schema by name
    pub fn get(&self, name: &str) -> Option<&ToolSchema> {
        self.tools.get(name)
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// All schemas, sorted by name
    pub fn schemas(&self) -> Vec<&ToolSchema> {
        let mut schemas: Vec<&ToolSchema> = self.tools.values().collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
