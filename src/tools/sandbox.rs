//! Sandbox execution tools.
//!
//! Every tool here goes through [`SandboxApi`]; the text editor is built on
//! plain shell commands so it works against any sandbox image with `cat`,
//! `mkdir` and `base64`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use strum::{Display, EnumString};

use super::arguments::ToolArguments;
use super::pool::ToolPool;
use super::tool::Tool;
use super::types::{ArgType, ToolParameters};
use crate::client::{CommandOutput, SandboxApi};
use crate::error::{AcontextError, Result};

const OUTPUT_MAX_BYTES: usize = 32_768;

/// Per-run state for sandbox tools.
///
/// `mounted_skills` maps skill name to its mount path inside the sandbox and
/// is filled in by `mount_skill` as the run goes on.
#[derive(Clone)]
pub struct SandboxContext {
    pub client: Arc<dyn SandboxApi>,
    pub sandbox_id: String,
    pub disk_id: String,
    pub mounted_skills: BTreeMap<String, String>,
}

impl SandboxContext {
    /// Mount path of a skill mounted earlier in this run.
    pub fn skill_path(&self, name: &str) -> Option<&str> {
        self.mounted_skills.get(name).map(String::as_str)
    }
}

impl std::fmt::Debug for SandboxContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxContext")
            .field("sandbox_id", &self.sandbox_id)
            .field("disk_id", &self.disk_id)
            .field("mounted_skills", &self.mounted_skills)
            .finish_non_exhaustive()
    }
}

pub type SandboxToolPool = ToolPool<SandboxContext>;

impl ToolPool<SandboxContext> {
    pub fn format_context(
        &self,
        client: Arc<dyn SandboxApi>,
        sandbox_id: impl Into<String>,
        disk_id: impl Into<String>,
    ) -> SandboxContext {
        SandboxContext {
            client,
            sandbox_id: sandbox_id.into(),
            disk_id: disk_id.into(),
            mounted_skills: BTreeMap::new(),
        }
    }
}

/// A fresh pool holding every sandbox tool, with no default timeout.
pub fn sandbox_tools() -> SandboxToolPool {
    build_sandbox_tools(None)
}

/// Like [`sandbox_tools`], with a default command timeout in seconds.
pub fn sandbox_tools_with_timeout(timeout_secs: f64) -> SandboxToolPool {
    build_sandbox_tools(Some(timeout_secs))
}

fn build_sandbox_tools(timeout_secs: Option<f64>) -> SandboxToolPool {
    SandboxToolPool::from_tools([
        Arc::new(BashTool::new(timeout_secs)) as Arc<dyn Tool<SandboxContext>>,
        Arc::new(TextEditorTool::new(timeout_secs)),
        Arc::new(ExportFileTool::new()),
        Arc::new(MountSkillTool::new()),
    ])
}

/// Convert a caller-facing timeout in seconds to the transport's milliseconds.
pub fn seconds_to_millis(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

fn resolve_timeout(args: &ToolArguments, default: Option<f64>) -> Result<Option<u64>> {
    let secs = args.get_f64_opt("timeout")?.or(default);
    match secs {
        Some(s) if !s.is_finite() || s <= 0.0 => Err(AcontextError::validation(
            "timeout must be a positive number of seconds",
        )),
        Some(s) => Ok(Some(seconds_to_millis(s))),
        None => Ok(None),
    }
}

/// Quote a string for POSIX `sh`.
fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

fn truncate_utf8(s: &str, max_bytes: usize) -> (String, bool) {
    if s.len() <= max_bytes {
        return (s.to_string(), false);
    }
    let mut cutoff = max_bytes;
    while cutoff > 0 && !s.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    (format!("{}\n... (truncated)", &s[..cutoff]), true)
}

/// `bash_execution_sandbox`: run a shell command.
pub struct BashTool {
    parameters: ToolParameters,
    default_timeout: Option<f64>,
}

impl BashTool {
    pub fn new(default_timeout: Option<f64>) -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("command", "Shell command to run inside the sandbox", true)
                .nullable(
                    "timeout",
                    "Timeout in seconds. Omit to use the default",
                    ArgType::Number,
                    false,
                )
                .build(),
            default_timeout,
        }
    }
}

#[async_trait]
impl Tool<SandboxContext> for BashTool {
    fn name(&self) -> &str {
        "bash_execution_sandbox"
    }

    fn description(&self) -> &str {
        "Run a bash command in the sandbox and return its stdout, stderr and exit code."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SandboxContext, args: &ToolArguments) -> Result<String> {
        let command = args.get_str("command")?;
        let timeout_ms = resolve_timeout(args, self.default_timeout)?;

        let output = ctx
            .client
            .exec_command(&ctx.sandbox_id, command, timeout_ms)
            .await?;

        let (stdout, stdout_truncated) = truncate_utf8(&output.stdout, OUTPUT_MAX_BYTES);
        let (stderr, stderr_truncated) = truncate_utf8(&output.stderr, OUTPUT_MAX_BYTES);
        Ok(json!({
            "stdout": stdout,
            "stderr": stderr,
            "exit_code": output.exit_code,
            "truncated": stdout_truncated || stderr_truncated,
        })
        .to_string())
    }
}

/// Sub-commands of the text editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum EditorCommand {
    View,
    Create,
    StrReplace,
}

/// `text_editor_sandbox`: view, create and edit files inside the sandbox.
pub struct TextEditorTool {
    parameters: ToolParameters,
    default_timeout: Option<f64>,
}

impl TextEditorTool {
    pub fn new(default_timeout: Option<f64>) -> Self {
        Self {
            parameters: ToolParameters::object()
                .string_enum(
                    "command",
                    "Operation to perform",
                    &["view", "create", "str_replace"],
                    true,
                )
                .string("path", "Absolute path of the file inside the sandbox", true)
                .string("file_text", "Content of the new file (create)", false)
                .string("old_str", "Exact text to replace; must occur once (str_replace)", false)
                .string("new_str", "Replacement text (str_replace). Defaults to empty", false)
                .array(
                    "view_range",
                    "1-based inclusive [start, end] line range (view). end = -1 reads to the end",
                    ArgType::Integer,
                    false,
                )
                .build(),
            default_timeout,
        }
    }

    async fn run(&self, ctx: &SandboxContext, args: &ToolArguments, command: &str) -> Result<CommandOutput> {
        let timeout_ms = resolve_timeout(args, self.default_timeout)?;
        ctx.client
            .exec_command(&ctx.sandbox_id, command, timeout_ms)
            .await
    }

    async fn read_file(&self, ctx: &SandboxContext, args: &ToolArguments, path: &str) -> Result<String> {
        let output = self
            .run(ctx, args, &format!("cat -- {}", shell_quote(path)))
            .await?;
        if !output.success() {
            return Err(AcontextError::tool_execution(
                "text_editor_sandbox",
                format!("cannot read {path}: {}", output.stderr.trim()),
            ));
        }
        Ok(output.stdout)
    }

    async fn write_file(&self, ctx: &SandboxContext, args: &ToolArguments, path: &str, text: &str) -> Result<()> {
        let quoted = shell_quote(path);
        let command = format!(
            "mkdir -p \"$(dirname -- {quoted})\" && printf '%s' {} | base64 -d > {quoted}",
            shell_quote(&STANDARD.encode(text)),
        );
        let output = self.run(ctx, args, &command).await?;
        if !output.success() {
            return Err(AcontextError::tool_execution(
                "text_editor_sandbox",
                format!("cannot write {path}: {}", output.stderr.trim()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Tool<SandboxContext> for TextEditorTool {
    fn name(&self) -> &str {
        "text_editor_sandbox"
    }

    fn description(&self) -> &str {
        "View, create or edit text files inside the sandbox."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SandboxContext, args: &ToolArguments) -> Result<String> {
        let raw_command = args.get_str("command")?;
        let command: EditorCommand = raw_command.parse().map_err(|_| {
            AcontextError::validation(format!(
                "Unknown command: {raw_command}. Expected one of view, create, str_replace"
            ))
        })?;
        let path = args.get_str("path")?;

        match command {
            EditorCommand::View => {
                let range = view_range(args)?;
                let content = self.read_file(ctx, args, path).await?;
                Ok(number_lines(&content, range))
            }
            EditorCommand::Create => {
                // An empty string creates an empty file.
                let file_text = args
                    .raw("file_text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AcontextError::validation("file_text is required for create"))?;
                self.write_file(ctx, args, path, file_text).await?;
                Ok(format!("File created successfully at: {path}"))
            }
            EditorCommand::StrReplace => {
                let old_str = args
                    .get_str_opt("old_str")
                    .ok_or_else(|| AcontextError::validation("old_str is required for str_replace"))?;
                let new_str = args.get_str_opt("new_str").unwrap_or("");

                let content = self.read_file(ctx, args, path).await?;
                match content.matches(old_str).count() {
                    0 => Ok(format!(
                        "No replacement was performed: old_str did not appear verbatim in {path}"
                    )),
                    1 => {
                        let updated = content.replacen(old_str, new_str, 1);
                        self.write_file(ctx, args, path, &updated).await?;
                        Ok(format!("The file {path} has been edited successfully"))
                    }
                    n => Ok(format!(
                        "No replacement was performed: old_str occurs {n} times in {path}; make it unique"
                    )),
                }
            }
        }
    }
}

/// Validated `view_range` as 1-based (start, optional inclusive end).
fn view_range(args: &ToolArguments) -> Result<Option<(usize, Option<usize>)>> {
    let Some(items) = args.get_array_opt("view_range")? else {
        return Ok(None);
    };
    let bounds: Vec<i64> = items.iter().filter_map(|v| v.as_i64()).collect();
    match bounds.as_slice() {
        [start, -1] if *start >= 1 => Ok(Some((*start as usize, None))),
        [start, end] if *start >= 1 && end >= start => {
            Ok(Some((*start as usize, Some(*end as usize))))
        }
        _ => Err(AcontextError::validation(
            "view_range must be [start, end] with 1 <= start <= end, or end = -1",
        )),
    }
}

fn number_lines(content: &str, range: Option<(usize, Option<usize>)>) -> String {
    let content = content.strip_suffix('\n').unwrap_or(content);
    let (start, end) = range.unwrap_or((1, None));
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(n, _)| *n >= start && end.map_or(true, |e| *n <= e))
        .map(|(n, line)| format!("{n:6}\t{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `export_file_sandbox`: copy a sandbox file onto the run's disk.
pub struct ExportFileTool {
    parameters: ToolParameters,
}

impl ExportFileTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("sandbox_path", "Directory of the file inside the sandbox, e.g. '/workspace/'", true)
                .string("sandbox_filename", "Name of the file to export", true)
                .build(),
        }
    }
}

impl Default for ExportFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<SandboxContext> for ExportFileTool {
    fn name(&self) -> &str {
        "export_file_sandbox"
    }

    fn description(&self) -> &str {
        "Export a file from the sandbox to the disk so it can be downloaded or shared."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SandboxContext, args: &ToolArguments) -> Result<String> {
        let sandbox_path = args.get_str("sandbox_path")?;
        let sandbox_filename = args.get_str("sandbox_filename")?;

        let exported = ctx
            .client
            .export_file(&ctx.sandbox_id, &ctx.disk_id, sandbox_path, sandbox_filename)
            .await?;

        let mut out = format!(
            "Exported {sandbox_filename} from the sandbox to disk path {}",
            exported.artifact.full_path()
        );
        if let Some(url) = exported.public_url {
            out.push_str(&format!("\nPublic URL: {url}"));
        }
        Ok(out)
    }
}

/// `mount_skill`: make a skill's files available inside the sandbox.
pub struct MountSkillTool {
    parameters: ToolParameters,
}

impl MountSkillTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("skill_id", "Id of the skill to mount", true)
                .build(),
        }
    }
}

impl Default for MountSkillTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<SandboxContext> for MountSkillTool {
    fn name(&self) -> &str {
        "mount_skill"
    }

    fn description(&self) -> &str {
        "Mount a skill into the sandbox and report the directory holding its files."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SandboxContext, args: &ToolArguments) -> Result<String> {
        let skill_id = args.get_str("skill_id")?;

        let mounted = ctx.client.mount_skill(&ctx.sandbox_id, skill_id).await?;
        tracing::debug!(skill = %mounted.name, path = %mounted.path, "mounted skill");
        ctx.mounted_skills
            .insert(mounted.name.clone(), mounted.path.clone());

        Ok(format!(
            "Skill '{}' mounted at {}",
            mounted.name, mounted.path
        ))
    }
}
