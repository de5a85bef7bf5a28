//! File-storage tools operating on one disk.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::pool::ToolPool;
use super::tool::Tool;
use super::types::ToolParameters;
use crate::client::{ensure_dir, ArtifactQuery, DiskApi};
use crate::error::{AcontextError, Result};

const DEFAULT_LINE_LIMIT: u64 = 100;
const DEFAULT_URL_EXPIRE_SECS: u64 = 3600;

/// Per-run state for disk tools.
#[derive(Clone)]
pub struct DiskContext {
    pub client: Arc<dyn DiskApi>,
    pub disk_id: String,
}

impl std::fmt::Debug for DiskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskContext")
            .field("disk_id", &self.disk_id)
            .finish_non_exhaustive()
    }
}

pub type DiskToolPool = ToolPool<DiskContext>;

impl ToolPool<DiskContext> {
    pub fn format_context(&self, client: Arc<dyn DiskApi>, disk_id: impl Into<String>) -> DiskContext {
        DiskContext {
            client,
            disk_id: disk_id.into(),
        }
    }
}

/// A fresh pool holding every disk tool.
pub fn disk_tools() -> DiskToolPool {
    DiskToolPool::from_tools([
        Arc::new(WriteFileTool::new()) as Arc<dyn Tool<DiskContext>>,
        Arc::new(ReadFileTool::new()),
        Arc::new(ReplaceStringTool::new()),
        Arc::new(ListArtifactsTool::new()),
        Arc::new(GrepArtifactsTool::new()),
        Arc::new(GlobArtifactsTool::new()),
        Arc::new(DownloadFileTool::new()),
    ])
}

fn dir_arg(args: &ToolArguments) -> String {
    ensure_dir(args.get_str_opt("file_path").unwrap_or("/"))
}

async fn read_text(ctx: &DiskContext, tool: &str, file_path: &str, filename: &str) -> Result<String> {
    let query = ArtifactQuery::builder()
        .file_path(file_path)
        .filename(filename)
        .with_content(true)
        .build();
    let fetched = ctx.client.get_artifact(&ctx.disk_id, &query).await?;
    fetched.content.ok_or_else(|| {
        AcontextError::tool_execution(tool, format!("{file_path}{filename} has no text content"))
    })
}

/// `write_file`: create or overwrite a text file.
pub struct WriteFileTool {
    parameters: ToolParameters,
}

impl WriteFileTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("filename", "Name of the file to write, e.g. 'notes.md'", true)
                .string("content", "Full text content of the file", true)
                .string("file_path", "Directory to write into. Defaults to '/'", false)
                .build(),
        }
    }
}

impl Default for WriteFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<DiskContext> for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write a text file to the disk, replacing any existing file with the same path."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut DiskContext, args: &ToolArguments) -> Result<String> {
        let filename = args.get_str("filename")?;
        let content = args.get_str("content")?;
        let file_path = dir_arg(args);

        let artifact = ctx
            .client
            .upsert_artifact(&ctx.disk_id, &file_path, filename, content)
            .await?;

        Ok(format!(
            "File '{}' written successfully to '{}'",
            filename,
            artifact.full_path()
        ))
    }
}

/// `read_file`: read a window of lines from a text file.
pub struct ReadFileTool {
    parameters: ToolParameters,
}

impl ReadFileTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("filename", "Name of the file to read", true)
                .string("file_path", "Directory of the file. Defaults to '/'", false)
                .integer("line_offset", "1-based number of the first line to return. Defaults to 1", false)
                .integer("line_limit", "Maximum number of lines to return. Defaults to 100", false)
                .build(),
        }
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<DiskContext> for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file from the disk. Use line_offset and line_limit to page through long files."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut DiskContext, args: &ToolArguments) -> Result<String> {
        let filename = args.get_str("filename")?;
        let file_path = dir_arg(args);
        let line_offset = args.get_u64_opt("line_offset")?.unwrap_or(1);
        let line_limit = args.get_u64_opt("line_limit")?.unwrap_or(DEFAULT_LINE_LIMIT);

        let content = read_text(ctx, self.name(), &file_path, filename).await?;
        let window = LineWindow::slice(&content, line_offset, line_limit);

        Ok(format!(
            "[{}{} - showing L{}-{} of {} lines]\n{}",
            file_path, filename, window.start, window.end, window.total, window.text
        ))
    }
}

/// Lines `start..end` of a text, 1-based with `end` exclusive.
#[derive(Debug, PartialEq)]
struct LineWindow {
    start: usize,
    end: usize,
    total: usize,
    text: String,
}

impl LineWindow {
    /// `offset` 0 is read as 1.
    fn slice(content: &str, offset: u64, limit: u64) -> Self {
        let lines: Vec<&str> = content.split('\n').collect();
        let total = lines.len();
        let first = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .saturating_sub(1)
            .min(total);
        let last = first
            .saturating_add(usize::try_from(limit).unwrap_or(usize::MAX))
            .min(total);
        Self {
            start: first + 1,
            end: last + 1,
            total,
            text: lines[first..last].join("\n"),
        }
    }
}

/// `replace_string`: replace every occurrence of a string in a file.
pub struct ReplaceStringTool {
    parameters: ToolParameters,
}

impl ReplaceStringTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("filename", "Name of the file to edit", true)
                .string("old_string", "Exact text to replace", true)
                .string("new_string", "Replacement text", true)
                .string("file_path", "Directory of the file. Defaults to '/'", false)
                .build(),
        }
    }
}

impl Default for ReplaceStringTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<DiskContext> for ReplaceStringTool {
    fn name(&self) -> &str {
        "replace_string"
    }

    fn description(&self) -> &str {
        "Replace every occurrence of old_string with new_string in a text file on the disk."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut DiskContext, args: &ToolArguments) -> Result<String> {
        let filename = args.get_str("filename")?;
        let old_string = args.get_str("old_string")?;
        let new_string = args.get_str("new_string")?;
        let file_path = dir_arg(args);

        let content = read_text(ctx, self.name(), &file_path, filename).await?;
        let occurrences = content.matches(old_string).count();
        if occurrences == 0 {
            return Ok(format!(
                "String '{old_string}' not found in file '{file_path}{filename}'"
            ));
        }

        let updated = content.replace(old_string, new_string);
        ctx.client
            .upsert_artifact(&ctx.disk_id, &file_path, filename, &updated)
            .await?;

        Ok(format!(
            "Found {occurrences} occurrence(s) of old_string in '{file_path}{filename}' and replaced them"
        ))
    }
}

/// `list_artifacts`: list files and directories under a path.
pub struct ListArtifactsTool {
    parameters: ToolParameters,
}

impl ListArtifactsTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("file_path", "Directory to list, e.g. '/' or '/notes/'", true)
                .build(),
        }
    }
}

impl Default for ListArtifactsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<DiskContext> for ListArtifactsTool {
    fn name(&self) -> &str {
        "list_artifacts"
    }

    fn description(&self) -> &str {
        "List the files and sub-directories of a directory on the disk."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut DiskContext, args: &ToolArguments) -> Result<String> {
        let file_path = ensure_dir(args.get_str("file_path")?);
        let listing = ctx.client.list_artifacts(&ctx.disk_id, &file_path).await?;

        let mut out = format!("[Listing in {file_path}]");
        if listing.directories.is_empty() && listing.artifacts.is_empty() {
            out.push_str("\nNo files or directories found");
            return Ok(out);
        }
        if !listing.directories.is_empty() {
            let dirs: Vec<String> = listing
                .directories
                .iter()
                .map(|d| format!("{}/", d.trim_end_matches('/')))
                .collect();
            out.push_str(&format!("\nDirectories: {}", dirs.join(", ")));
        }
        if !listing.artifacts.is_empty() {
            let files: Vec<&str> = listing.artifacts.iter().map(|a| a.filename.as_str()).collect();
            out.push_str(&format!("\nFiles: {}", files.join(", ")));
        }
        Ok(out)
    }
}

fn search_parameters(what: &str) -> ToolParameters {
    ToolParameters::object()
        .string("query", what, true)
        .integer("limit", "Maximum number of results. Defaults to 100", false)
        .build()
}

fn render_matches(kind: &str, query: &str, paths: Vec<String>) -> String {
    if paths.is_empty() {
        return format!("No files {kind} '{query}'");
    }
    format!(
        "Found {} file(s) {kind} '{query}':\n{}",
        paths.len(),
        paths.join("\n")
    )
}

/// `grep_artifacts`: search file contents with a regex.
pub struct GrepArtifactsTool {
    parameters: ToolParameters,
}

impl GrepArtifactsTool {
    pub fn new() -> Self {
        Self {
            parameters: search_parameters("Regular expression to search file contents for"),
        }
    }
}

impl Default for GrepArtifactsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<DiskContext> for GrepArtifactsTool {
    fn name(&self) -> &str {
        "grep_artifacts"
    }

    fn description(&self) -> &str {
        "Find text files on the disk whose content matches a regular expression."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut DiskContext, args: &ToolArguments) -> Result<String> {
        let query = args.get_str("query")?;
        let limit = args.get_u64_opt("limit")?.map(|l| l.min(u32::MAX as u64) as u32);
        let found = ctx.client.grep_artifacts(&ctx.disk_id, query, limit).await?;
        let paths = found.iter().map(|a| a.full_path()).collect();
        Ok(render_matches("matching", query, paths))
    }
}

/// `glob_artifacts`: match file paths with a glob pattern.
pub struct GlobArtifactsTool {
    parameters: ToolParameters,
}

impl GlobArtifactsTool {
    pub fn new() -> Self {
        Self {
            parameters: search_parameters("Glob pattern such as '**/*.md'"),
        }
    }
}

impl Default for GlobArtifactsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<DiskContext> for GlobArtifactsTool {
    fn name(&self) -> &str {
        "glob_artifacts"
    }

    fn description(&self) -> &str {
        "Find files on the disk whose path matches a glob pattern."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut DiskContext, args: &ToolArguments) -> Result<String> {
        let query = args.get_str("query")?;
        let limit = args.get_u64_opt("limit")?.map(|l| l.min(u32::MAX as u64) as u32);
        let found = ctx.client.glob_artifacts(&ctx.disk_id, query, limit).await?;
        let paths = found.iter().map(|a| a.full_path()).collect();
        Ok(render_matches("matching pattern", query, paths))
    }
}

/// `download_file`: get a temporary public URL for a file.
pub struct DownloadFileTool {
    parameters: ToolParameters,
}

impl DownloadFileTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("filename", "Name of the file to share", true)
                .string("file_path", "Directory of the file. Defaults to '/'", false)
                .integer("expire", "URL lifetime in seconds. Defaults to 3600", false)
                .build(),
        }
    }
}

impl Default for DownloadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<DiskContext> for DownloadFileTool {
    fn name(&self) -> &str {
        "download_file"
    }

    fn description(&self) -> &str {
        "Create a temporary public download URL for a file on the disk."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut DiskContext, args: &ToolArguments) -> Result<String> {
        let filename = args.get_str("filename")?;
        let file_path = dir_arg(args);
        let expire = args.get_u64_opt("expire")?.unwrap_or(DEFAULT_URL_EXPIRE_SECS);

        let query = ArtifactQuery::builder()
            .file_path(file_path.as_str())
            .filename(filename)
            .with_public_url(true)
            .expire(expire)
            .build();
        let fetched = ctx.client.get_artifact(&ctx.disk_id, &query).await?;
        let url = fetched.public_url.ok_or_else(|| {
            AcontextError::tool_execution(self.name(), "backend returned no public URL")
        })?;

        Ok(format!(
            "Public download URL for '{file_path}{filename}' (valid {expire}s): {url}"
        ))
    }
}
