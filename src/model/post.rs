use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::project::{AskingProject, Project};

/// A post as returned by the platform API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: u64,
    pub filename: String,
    pub single_post_page_url: String,
    pub posting_project: Project,
    #[serde(default)]
    pub related_projects: Vec<Project>,
    #[serde(default)]
    pub blocks: Vec<PostBlock>,
    pub ast_map: AstMap,
    /// Posts this one transparently shares or replies to, oldest first
    #[serde(default)]
    pub share_tree: Vec<Post>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rendered post body, split into spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstMap {
    #[serde(default)]
    pub read_more_index: Option<u64>,
    #[serde(default)]
    pub spans: Vec<AstSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstSpan {
    pub start_index: u64,
    pub end_index: u64,
    /// Serialized [`AstNode`](super::ast::AstNode) tree
    pub ast: String,
}

/// A block of post content. Any other `type` fails deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PostBlock {
    Markdown { markdown: MarkdownBlock },
    Ask { ask: Ask },
    Attachment { attachment: Attachment },
    AttachmentRow { attachments: Vec<AttachmentWrapper> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownBlock {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ask {
    #[serde(default)]
    pub asking_project: Option<AskingProject>,
    /// Markdown body of the ask
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentWrapper {
    pub attachment: Attachment,
}

/// An image or audio attachment; `kind` and metadata live in `extra`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "fileURL")]
    pub file_url: String,
    #[serde(rename = "previewURL", default)]
    pub preview_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
