use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A cohost project (a user's page)
///
/// Only the fields the archiver reads or rewrites are typed; everything
/// else is carried through `extra` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: u64,
    pub handle: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
    #[serde(rename = "avatarPreviewURL")]
    pub avatar_preview_url: String,
    #[serde(rename = "headerURL", default, skip_serializing_if = "Option::is_none")]
    pub header_url: Option<String>,
    #[serde(rename = "headerPreviewURL", default, skip_serializing_if = "Option::is_none")]
    pub header_preview_url: Option<String>,
    /// Markdown bio
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The trimmed-down project attached to an ask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskingProject {
    pub handle: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
    #[serde(rename = "avatarPreviewURL")]
    pub avatar_preview_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
