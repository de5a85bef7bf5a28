//! reqwest-backed implementation of the backend traits.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::types::*;
use super::{DiskApi, SandboxApi, SessionApi, SkillApi};
use crate::config::ClientConfig;
use crate::error::{AcontextError, Result};
use crate::types::{MessageBlob, MessageFormat, MessageMeta};

/// HTTP client for the Acontext API.
#[derive(Debug, Clone)]
pub struct AcontextClient {
    http: reqwest::Client,
    base: Url,
    config: ClientConfig,
}

impl AcontextClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers(&config)?)
            .build()
            .map_err(|e| AcontextError::Configuration(format!("failed to build HTTP client: {e}")))?;
        let base = Url::parse(config.api_root()).map_err(|e| {
            AcontextError::Configuration(format!("invalid base URL {:?}: {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(AcontextError::Configuration(format!(
                "base URL {:?} cannot carry a path",
                config.base_url
            )));
        }
        Ok(Self { http, base, config })
    }

    /// Build a client from `ACONTEXT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env();
        if config.api_key.is_none() {
            return Err(AcontextError::Configuration(
                "ACONTEXT_API_KEY is not set".to_string(),
            ));
        }
        Self::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// API URL for `segments`, each percent-encoded as a single path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_to_error(status.as_u16(), &body));
        }
        let value: serde_json::Value = if body.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&body)?
        };
        Ok(serde_json::from_value(unwrap_envelope(value))?)
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&config.user_agent) {
        headers.insert(USER_AGENT, val);
    }
    if let Some(key) = &config.api_key {
        let val = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| AcontextError::Configuration("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, val);
    }
    Ok(headers)
}

/// Strip the `{code, data, msg}` envelope when the server sends one.
fn unwrap_envelope(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut obj)
            if obj.contains_key("data") && (obj.contains_key("code") || obj.contains_key("msg")) =>
        {
            obj.remove("data").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    }
}

/// Map an HTTP error status onto the error taxonomy.
pub fn status_to_error(status: u16, body: &str) -> AcontextError {
    let message = error_message(body);
    match status {
        401 | 403 => AcontextError::Authentication(message),
        404 => AcontextError::NotFound(message),
        409 => AcontextError::Conflict(message),
        _ => AcontextError::api(status, message),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl SessionApi for AcontextClient {
    async fn create_session(&self, request: &CreateSessionRequest) -> Result<Session> {
        debug!(use_uuid = ?request.use_uuid, "creating session");
        self.send(self.http.post(self.url(&["session"])).json(request))
            .await
    }

    async fn store_message(
        &self,
        session_id: &str,
        blob: &MessageBlob,
        format: MessageFormat,
        meta: Option<&MessageMeta>,
    ) -> Result<StoredMessage> {
        let mut body = json!({ "blob": blob, "format": format });
        if let Some(meta) = meta {
            body["meta"] = serde_json::to_value(meta)?;
        }
        self.send(
            self.http
                .post(self.url(&["session", session_id, "messages"]))
                .json(&body),
        )
        .await
    }
}

#[async_trait]
impl DiskApi for AcontextClient {
    async fn upsert_artifact(
        &self,
        disk_id: &str,
        file_path: &str,
        filename: &str,
        content: &str,
    ) -> Result<Artifact> {
        let body = json!({
            "file_path": file_path,
            "filename": filename,
            "content": content,
        });
        self.send(
            self.http
                .post(self.url(&["disk", disk_id, "artifact"]))
                .json(&body),
        )
        .await
    }

    async fn get_artifact(&self, disk_id: &str, query: &ArtifactQuery) -> Result<ArtifactContent> {
        let mut params = vec![
            ("file_path", query.file_path.clone()),
            ("filename", query.filename.clone()),
            ("with_content", query.with_content.to_string()),
            ("with_public_url", query.with_public_url.to_string()),
        ];
        if let Some(expire) = query.expire {
            params.push(("expire", expire.to_string()));
        }
        self.send(
            self.http
                .get(self.url(&["disk", disk_id, "artifact"]))
                .query(&params),
        )
        .await
    }

    async fn list_artifacts(&self, disk_id: &str, path: &str) -> Result<ArtifactListing> {
        self.send(
            self.http
                .get(self.url(&["disk", disk_id, "artifact", "ls"]))
                .query(&[("path", path)]),
        )
        .await
    }

    async fn grep_artifacts(
        &self,
        disk_id: &str,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Artifact>> {
        self.send(
            self.http
                .get(self.url(&["disk", disk_id, "artifact", "grep"]))
                .query(&search_params(query, limit)),
        )
        .await
    }

    async fn glob_artifacts(
        &self,
        disk_id: &str,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Artifact>> {
        self.send(
            self.http
                .get(self.url(&["disk", disk_id, "artifact", "glob"]))
                .query(&search_params(query, limit)),
        )
        .await
    }
}

fn search_params(query: &str, limit: Option<u32>) -> Vec<(&'static str, String)> {
    let mut params = vec![("query", query.to_string())];
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

#[async_trait]
impl SkillApi for AcontextClient {
    async fn get_skill(&self, lookup: &SkillLookup) -> Result<Skill> {
        let request = match lookup {
            SkillLookup::Id(id) => self.http.get(self.url(&["agent_skills", id.as_str()])),
            SkillLookup::Name(name) => self
                .http
                .get(self.url(&["agent_skills", "by_name"]))
                .query(&[("name", name)]),
        };
        self.send(request).await
    }

    async fn list_skills(&self, limit: Option<u32>) -> Result<Vec<Skill>> {
        let mut request = self.http.get(self.url(&["agent_skills"]));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.send(request).await
    }

    async fn update_skill(&self, skill_id: &str, update: &SkillUpdate) -> Result<Skill> {
        self.send(
            self.http
                .put(self.url(&["agent_skills", skill_id]))
                .json(update),
        )
        .await
    }

    async fn get_skill_file(&self, skill_id: &str, file_path: &str) -> Result<SkillFile> {
        self.send(
            self.http
                .get(self.url(&["agent_skills", skill_id, "file"]))
                .query(&[("file_path", file_path)]),
        )
        .await
    }
}

#[async_trait]
impl SandboxApi for AcontextClient {
    async fn exec_command(
        &self,
        sandbox_id: &str,
        command: &str,
        timeout_ms: Option<u64>,
    ) -> Result<CommandOutput> {
        let mut body = json!({ "command": command });
        if let Some(timeout) = timeout_ms {
            body["timeout"] = timeout.into();
        }
        self.send(
            self.http
                .post(self.url(&["sandbox", sandbox_id, "exec"]))
                .json(&body),
        )
        .await
    }

    async fn export_file(
        &self,
        sandbox_id: &str,
        disk_id: &str,
        sandbox_path: &str,
        sandbox_filename: &str,
    ) -> Result<ExportedFile> {
        let body = json!({
            "disk_id": disk_id,
            "sandbox_path": sandbox_path,
            "sandbox_filename": sandbox_filename,
        });
        self.send(
            self.http
                .post(self.url(&["sandbox", sandbox_id, "export"]))
                .json(&body),
        )
        .await
    }

    async fn mount_skill(&self, sandbox_id: &str, skill_id: &str) -> Result<MountedSkill> {
        self.send(
            self.http
                .post(self.url(&["sandbox", sandbox_id, "skills"]))
                .json(&json!({ "skill_id": skill_id })),
        )
        .await
    }
}
