//! Backend collaborator surface.
//!
//! The tool pools and the conversation adapter only talk to the backend
//! through the traits below, so tests can swap in an in-memory fake.
//! [`AcontextClient`] is the HTTP implementation of all four.

pub mod http;
pub mod types;

pub use http::AcontextClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MessageBlob, MessageFormat, MessageMeta};

/// Session creation and message storage.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Create a session. Fails with a conflict when `use_uuid` is already taken.
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session>;

    async fn store_message(
        &self,
        session_id: &str,
        blob: &MessageBlob,
        format: MessageFormat,
        meta: Option<&MessageMeta>,
    ) -> Result<StoredMessage>;
}

/// File storage on disks.
#[async_trait]
pub trait DiskApi: Send + Sync {
    async fn upsert_artifact(
        &self,
        disk_id: &str,
        file_path: &str,
        filename: &str,
        content: &str,
    ) -> Result<Artifact>;

    async fn get_artifact(&self, disk_id: &str, query: &ArtifactQuery) -> Result<ArtifactContent>;

    async fn list_artifacts(&self, disk_id: &str, path: &str) -> Result<ArtifactListing>;

    /// Search artifact contents with a regex.
    async fn grep_artifacts(
        &self,
        disk_id: &str,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Artifact>>;

    /// Match artifact paths with a glob pattern.
    async fn glob_artifacts(
        &self,
        disk_id: &str,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Artifact>>;
}

/// Skill catalog.
#[async_trait]
pub trait SkillApi: Send + Sync {
    async fn get_skill(&self, lookup: &SkillLookup) -> Result<Skill>;

    async fn list_skills(&self, limit: Option<u32>) -> Result<Vec<Skill>>;

    async fn update_skill(&self, skill_id: &str, update: &SkillUpdate) -> Result<Skill>;

    async fn get_skill_file(&self, skill_id: &str, file_path: &str) -> Result<SkillFile>;
}

/// Remote sandbox execution.
#[async_trait]
pub trait SandboxApi: Send + Sync {
    /// Run a shell command. `timeout_ms` is forwarded untouched.
    async fn exec_command(
        &self,
        sandbox_id: &str,
        command: &str,
        timeout_ms: Option<u64>,
    ) -> Result<CommandOutput>;

    async fn export_file(
        &self,
        sandbox_id: &str,
        disk_id: &str,
        sandbox_path: &str,
        sandbox_filename: &str,
    ) -> Result<ExportedFile>;

    async fn mount_skill(&self, sandbox_id: &str, skill_id: &str) -> Result<MountedSkill>;
}
