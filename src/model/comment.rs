use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::project::Project;

/// A comment with the project that posted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Absent for comments by deleted projects
    #[serde(default)]
    pub poster: Option<Project>,
    pub comment: CommentBody,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub comment_id: String,
    /// Markdown
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub children: Vec<Comment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
