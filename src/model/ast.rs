//! Rendered post content tree
//!
//! Each span of a post's `astMap` holds one of these trees serialized as a
//! JSON string. A node is exactly one of `root`, `element` or `text`; any
//! other `type` is a data error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AstNode {
    Root(AstRoot),
    Element(AstElement),
    Text(AstText),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstRoot {
    #[serde(default)]
    pub children: Vec<AstNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstElement {
    pub tag_name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub children: Vec<AstNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AstElement {
    /// A string-valued property
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    pub fn set_property(&mut self, name: &str, value: String) {
        self.properties.insert(name.to_string(), Value::String(value));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstText {
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AstNode {
    #[must_use]
    pub fn children(&self) -> &[AstNode] {
        match self {
            AstNode::Root(root) => &root.children,
            AstNode::Element(element) => &element.children,
            AstNode::Text(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<AstNode>> {
        match self {
            AstNode::Root(root) => Some(&mut root.children),
            AstNode::Element(element) => Some(&mut element.children),
            AstNode::Text(_) => None,
        }
    }
}
