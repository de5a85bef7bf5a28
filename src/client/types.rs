//! Request and response types exchanged with the Acontext backend.

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored conversation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a create-session call.
#[derive(Debug, Clone, Default, Builder, Serialize, PartialEq)]
pub struct CreateSessionRequest {
    /// Desired session id. The backend answers with a conflict when it is taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub use_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub user: Option<String>,
}

/// Record returned after a message is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredMessage {
    pub id: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A file stored on a disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub disk_id: String,
    pub path: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl Artifact {
    /// Full path of the artifact, directory and filename joined.
    pub fn full_path(&self) -> String {
        format!("{}{}", ensure_dir(&self.path), self.filename)
    }
}

/// Which artifact to fetch and what to include in the answer.
#[derive(Debug, Clone, Builder, PartialEq)]
pub struct ArtifactQuery {
    #[builder(into)]
    pub file_path: String,
    #[builder(into)]
    pub filename: String,
    #[builder(default)]
    pub with_content: bool,
    #[builder(default)]
    pub with_public_url: bool,
    /// Public URL lifetime in seconds.
    pub expire: Option<u64>,
}

/// An artifact plus the optional payloads requested through [`ArtifactQuery`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactContent {
    pub artifact: Artifact,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
}

/// Directory listing of a disk path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtifactListing {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub directories: Vec<String>,
}

/// An entry of the skill catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_index: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// How to find a skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillLookup {
    Id(String),
    Name(String),
}

/// Partial update of a skill. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Builder, Serialize, PartialEq)]
pub struct SkillUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl SkillUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.meta.is_none()
    }
}

/// A file bundled with a skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillFile {
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Result of running a shell command in a sandbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandOutput {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A sandbox file copied onto a disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportedFile {
    pub artifact: Artifact,
    #[serde(default)]
    pub public_url: Option<String>,
}

/// A skill made available inside a sandbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MountedSkill {
    pub skill_id: String,
    pub name: String,
    pub path: String,
}

/// Normalize a directory path to start and end with `/`.
pub fn ensure_dir(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return "/".to_string();
    }
    let mut out = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('/') {
        out.push('/');
    }
    out.push_str(trimmed);
    if !trimmed.ends_with('/') {
        out.push('/');
    }
    out
}
