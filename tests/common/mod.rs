//! Shared test helpers and an in-memory backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use acontext::client::*;
use acontext::error::{AcontextError, Result};
use acontext::types::{MessageBlob, MessageFormat, MessageMeta};

/// One recorded `store_message` call.
#[derive(Debug, Clone)]
pub struct StoreCall {
    pub session_id: String,
    pub blob: MessageBlob,
    pub format: MessageFormat,
    pub meta: Option<MessageMeta>,
}

/// One recorded `exec_command` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecCall {
    pub sandbox_id: String,
    pub command: String,
    pub timeout_ms: Option<u64>,
}

/// Backend that keeps everything in memory and records every call.
#[derive(Default)]
pub struct FakeBackend {
    pub creates: Mutex<Vec<CreateSessionRequest>>,
    pub stores: Mutex<Vec<StoreCall>>,
    pub execs: Mutex<Vec<ExecCall>>,
    pub upserts: Mutex<Vec<(String, String, String)>>,
    files: Mutex<HashMap<String, String>>,
    skills: Mutex<Vec<Skill>>,
    exec_outputs: Mutex<Vec<CommandOutput>>,
    create_conflict: Mutex<bool>,
    create_failures: Mutex<u32>,
    store_failures: Mutex<u32>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `create_session` with a conflict.
    pub fn conflict_on_create(&self) {
        *self.create_conflict.lock().unwrap() = true;
    }

    /// Fail the next `n` `create_session` calls with a 500.
    pub fn fail_creates(&self, n: u32) {
        *self.create_failures.lock().unwrap() = n;
    }

    /// Fail the next `n` `store_message` calls with a 500.
    pub fn fail_stores(&self, n: u32) {
        *self.store_failures.lock().unwrap() = n;
    }

    pub fn put_file(&self, dir: &str, filename: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(format!("{}{}", ensure_dir(dir), filename), content.to_string());
    }

    pub fn file(&self, dir: &str, filename: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(&format!("{}{}", ensure_dir(dir), filename))
            .cloned()
    }

    pub fn add_skill(&self, id: &str, name: &str, description: &str, files: &[&str]) {
        self.skills.lock().unwrap().push(Skill {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            file_index: files.iter().map(|f| f.to_string()).collect(),
            meta: None,
        });
    }

    /// Queue the output of the next `exec_command`. Unqueued calls succeed silently.
    pub fn queue_exec(&self, stdout: &str, exit_code: i32) {
        self.exec_outputs.lock().unwrap().push(CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(exit_code),
        });
    }

    pub fn create_count(&self) -> usize {
        self.creates.lock().unwrap().len()
    }

    pub fn stored(&self) -> Vec<StoreCall> {
        self.stores.lock().unwrap().clone()
    }

    pub fn exec_calls(&self) -> Vec<ExecCall> {
        self.execs.lock().unwrap().clone()
    }

    fn take_failure(counter: &Mutex<u32>) -> bool {
        let mut left = counter.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            true
        } else {
            false
        }
    }

    fn artifact(disk_id: &str, dir: &str, filename: &str) -> Artifact {
        Artifact {
            disk_id: disk_id.to_string(),
            path: ensure_dir(dir),
            filename: filename.to_string(),
            meta: None,
        }
    }
}

#[async_trait]
impl SessionApi for FakeBackend {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session> {
        self.creates.lock().unwrap().push(request.clone());
        if Self::take_failure(&self.create_failures) {
            return Err(AcontextError::api(500, "create failed"));
        }
        if *self.create_conflict.lock().unwrap() {
            return Err(AcontextError::Conflict("session already exists".into()));
        }
        Ok(Session {
            id: request
                .use_uuid
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            user_id: request.user.clone(),
            created_at: None,
        })
    }

    async fn store_message(
        &self,
        session_id: &str,
        blob: &MessageBlob,
        format: MessageFormat,
        meta: Option<&MessageMeta>,
    ) -> Result<StoredMessage> {
        self.stores.lock().unwrap().push(StoreCall {
            session_id: session_id.to_string(),
            blob: blob.clone(),
            format,
            meta: meta.cloned(),
        });
        if Self::take_failure(&self.store_failures) {
            return Err(AcontextError::api(500, "store failed"));
        }
        Ok(StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role: Some(blob.role.to_string()),
            created_at: None,
        })
    }
}

#[async_trait]
impl DiskApi for FakeBackend {
    async fn upsert_artifact(
        &self,
        disk_id: &str,
        file_path: &str,
        filename: &str,
        content: &str,
    ) -> Result<Artifact> {
        self.upserts.lock().unwrap().push((
            file_path.to_string(),
            filename.to_string(),
            content.to_string(),
        ));
        self.put_file(file_path, filename, content);
        Ok(Self::artifact(disk_id, file_path, filename))
    }

    async fn get_artifact(&self, disk_id: &str, query: &ArtifactQuery) -> Result<ArtifactContent> {
        let content = self
            .file(&query.file_path, &query.filename)
            .ok_or_else(|| {
                AcontextError::NotFound(format!(
                    "artifact {}{} not found",
                    ensure_dir(&query.file_path),
                    query.filename
                ))
            })?;
        Ok(ArtifactContent {
            artifact: Self::artifact(disk_id, &query.file_path, &query.filename),
            content: query.with_content.then_some(content),
            public_url: query.with_public_url.then(|| {
                format!(
                    "https://files.example.com{}{}?expire={}",
                    ensure_dir(&query.file_path),
                    query.filename,
                    query.expire.unwrap_or_default()
                )
            }),
        })
    }

    async fn list_artifacts(&self, disk_id: &str, path: &str) -> Result<ArtifactListing> {
        let dir = ensure_dir(path);
        let files = self.files.lock().unwrap();
        let mut listing = ArtifactListing::default();
        let mut keys: Vec<&String> = files.keys().collect();
        keys.sort();
        for key in keys {
            let Some(rest) = key.strip_prefix(&dir) else {
                continue;
            };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    if !listing.directories.iter().any(|d| d == sub) {
                        listing.directories.push(sub.to_string());
                    }
                }
                None => listing.artifacts.push(Self::artifact(disk_id, &dir, rest)),
            }
        }
        Ok(listing)
    }

    async fn grep_artifacts(
        &self,
        disk_id: &str,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Artifact>> {
        let files = self.files.lock().unwrap();
        let mut found: Vec<Artifact> = files
            .iter()
            .filter(|(_, content)| content.contains(query))
            .map(|(key, _)| {
                let (dir, name) = key.rsplit_once('/').unwrap_or(("", key));
                Self::artifact(disk_id, dir, name)
            })
            .collect();
        found.sort_by_key(|a| a.full_path());
        found.truncate(limit.unwrap_or(u32::MAX) as usize);
        Ok(found)
    }

    async fn glob_artifacts(
        &self,
        disk_id: &str,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Artifact>> {
        let suffix = query.trim_start_matches("**/").trim_start_matches('*');
        let files = self.files.lock().unwrap();
        let mut found: Vec<Artifact> = files
            .keys()
            .filter(|key| key.ends_with(suffix))
            .map(|key| {
                let (dir, name) = key.rsplit_once('/').unwrap_or(("", key));
                Self::artifact(disk_id, dir, name)
            })
            .collect();
        found.sort_by_key(|a| a.full_path());
        found.truncate(limit.unwrap_or(u32::MAX) as usize);
        Ok(found)
    }
}

#[async_trait]
impl SkillApi for FakeBackend {
    async fn get_skill(&self, lookup: &SkillLookup) -> Result<Skill> {
        let skills = self.skills.lock().unwrap();
        let found = skills.iter().find(|s| match lookup {
            SkillLookup::Id(id) => &s.id == id,
            SkillLookup::Name(name) => &s.name == name,
        });
        found
            .cloned()
            .ok_or_else(|| AcontextError::NotFound(format!("skill {lookup:?} not found")))
    }

    async fn list_skills(&self, limit: Option<u32>) -> Result<Vec<Skill>> {
        let skills = self.skills.lock().unwrap();
        Ok(skills
            .iter()
            .take(limit.unwrap_or(u32::MAX) as usize)
            .cloned()
            .collect())
    }

    async fn update_skill(&self, skill_id: &str, update: &SkillUpdate) -> Result<Skill> {
        let mut skills = self.skills.lock().unwrap();
        let skill = skills
            .iter_mut()
            .find(|s| s.id == skill_id)
            .ok_or_else(|| AcontextError::NotFound(format!("skill {skill_id} not found")))?;
        if let Some(name) = &update.name {
            skill.name = name.clone();
        }
        if let Some(description) = &update.description {
            skill.description = description.clone();
        }
        if let Some(meta) = &update.meta {
            skill.meta = Some(meta.clone());
        }
        Ok(skill.clone())
    }

    async fn get_skill_file(&self, skill_id: &str, file_path: &str) -> Result<SkillFile> {
        let skills = self.skills.lock().unwrap();
        let skill = skills
            .iter()
            .find(|s| s.id == skill_id)
            .ok_or_else(|| AcontextError::NotFound(format!("skill {skill_id} not found")))?;
        if !skill.file_index.iter().any(|f| f == file_path) {
            return Err(AcontextError::NotFound(format!("{file_path} not found")));
        }
        Ok(SkillFile {
            path: file_path.to_string(),
            content: Some(format!("contents of {file_path}")),
            mime_type: Some("text/markdown".into()),
        })
    }
}

#[async_trait]
impl SandboxApi for FakeBackend {
    async fn exec_command(
        &self,
        sandbox_id: &str,
        command: &str,
        timeout_ms: Option<u64>,
    ) -> Result<CommandOutput> {
        self.execs.lock().unwrap().push(ExecCall {
            sandbox_id: sandbox_id.to_string(),
            command: command.to_string(),
            timeout_ms,
        });
        let mut queued = self.exec_outputs.lock().unwrap();
        if queued.is_empty() {
            return Ok(CommandOutput {
                exit_code: Some(0),
                ..Default::default()
            });
        }
        Ok(queued.remove(0))
    }

    async fn export_file(
        &self,
        _sandbox_id: &str,
        disk_id: &str,
        sandbox_path: &str,
        sandbox_filename: &str,
    ) -> Result<ExportedFile> {
        Ok(ExportedFile {
            artifact: Self::artifact(disk_id, sandbox_path, sandbox_filename),
            public_url: Some(format!("https://files.example.com/{sandbox_filename}")),
        })
    }

    async fn mount_skill(&self, _sandbox_id: &str, skill_id: &str) -> Result<MountedSkill> {
        let name = self
            .skills
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == skill_id)
            .map(|s| s.name.clone())
            .ok_or_else(|| AcontextError::NotFound(format!("skill {skill_id} not found")))?;
        Ok(MountedSkill {
            skill_id: skill_id.to_string(),
            path: format!("/skills/{name}"),
            name,
        })
    }
}
