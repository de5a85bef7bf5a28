//! Tests for the tool pools against an in-memory backend.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use acontext::error::{AcontextError, ErrorCategory, Result};
use acontext::tools::*;
use common::FakeBackend;

fn all_schemas() -> Vec<(Value, Value)> {
    let mut pairs = Vec::new();
    let disk = disk_tools();
    pairs.extend(disk.to_openai_tool_schema().into_iter().zip(disk.to_anthropic_tool_schema()));
    let skill = skill_tools();
    pairs.extend(skill.to_openai_tool_schema().into_iter().zip(skill.to_anthropic_tool_schema()));
    let sandbox = sandbox_tools();
    pairs.extend(
        sandbox
            .to_openai_tool_schema()
            .into_iter()
            .zip(sandbox.to_anthropic_tool_schema()),
    );
    pairs
}

fn assert_valid_parameters(name: &str, params: &Value) {
    assert_eq!(params["type"], "object", "{name}");
    let properties = params["properties"].as_object().expect("properties object");
    for required in params["required"].as_array().expect("required array") {
        let key = required.as_str().unwrap();
        assert!(properties.contains_key(key), "{name}: required {key} not declared");
    }
    for (key, prop) in properties {
        let is_array = prop["type"] == "array"
            || prop["type"]
                .as_array()
                .is_some_and(|types| types.contains(&json!("array")));
        if is_array {
            assert!(prop.get("items").is_some(), "{name}.{key} lacks items");
        }
        assert!(prop["description"].is_string(), "{name}.{key} lacks description");
    }
}

#[test]
fn every_tool_exports_valid_openai_and_anthropic_schemas() {
    let pairs = all_schemas();
    assert_eq!(pairs.len(), 15);

    for (openai, anthropic) in pairs {
        assert_eq!(openai["type"], "function");
        let name = openai["function"]["name"].as_str().unwrap().to_string();
        assert_eq!(anthropic["name"], name.as_str());
        assert_eq!(openai["function"]["description"], anthropic["description"]);
        assert_eq!(openai["function"]["parameters"], anthropic["input_schema"]);
        assert_valid_parameters(&name, &openai["function"]["parameters"]);
    }
}

fn assert_required_matches_tools<C: Send + Sync + 'static>(pool: &ToolPool<C>) {
    let names = pool.tool_names();
    let openai = pool.to_openai_tool_schema();
    let anthropic = pool.to_anthropic_tool_schema();
    assert_eq!(names.len(), openai.len());
    assert_eq!(names.len(), anthropic.len());

    for ((name, openai), anthropic) in names.iter().zip(&openai).zip(&anthropic) {
        let tool = pool.get(name).unwrap();
        let expected = json!(tool.required_arguments());
        assert_eq!(openai["function"]["name"], *name);
        assert_eq!(openai["function"]["parameters"]["required"], expected, "{name}");
        assert_eq!(anthropic["name"], *name);
        assert_eq!(anthropic["input_schema"]["required"], expected, "{name}");
    }
}

#[test]
fn exported_required_lists_equal_each_tools_required_arguments() {
    assert_required_matches_tools(&disk_tools());
    assert_required_matches_tools(&skill_tools());
    assert_required_matches_tools(&sandbox_tools());
}

#[test]
fn schema_export_is_sorted_by_name() {
    let names: Vec<String> = disk_tools()
        .to_anthropic_tool_schema()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn view_range_declares_integer_items() {
    let pool = sandbox_tools();
    let editor = pool.get("text_editor_sandbox").unwrap();
    let schema = editor.parameters().to_json_schema();
    assert_eq!(
        schema["properties"]["view_range"],
        json!({
            "type": "array",
            "items": {"type": "integer"},
            "description": "1-based inclusive [start, end] line range (view). end = -1 reads to the end",
        })
    );
    assert_eq!(schema["required"], json!(["command", "path"]));
}

#[test]
fn extending_with_same_pool_is_idempotent() {
    let mut pool = disk_tools();
    let before = pool.tool_names().iter().map(|s| s.to_string()).collect::<Vec<_>>();
    pool.extend_tool_pool(&disk_tools());
    pool.extend_tool_pool(&disk_tools());
    let after = pool.tool_names().iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(before, after);
    assert_eq!(pool.len(), 7);
}

struct Echo;

#[async_trait]
impl Tool<()> for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the text back."
    }

    fn parameters(&self) -> &ToolParameters {
        static PARAMS: std::sync::OnceLock<ToolParameters> = std::sync::OnceLock::new();
        PARAMS.get_or_init(|| ToolParameters::object().string("text", "Text to echo", true).build())
    }

    async fn execute(&self, _ctx: &mut (), args: &ToolArguments) -> Result<String> {
        Ok(args.get_str("text")?.to_string())
    }
}

#[tokio::test]
async fn custom_tool_pool_rejects_duplicates_and_dispatches() {
    let mut pool = ToolPool::<()>::new();
    pool.add_tool(Echo).unwrap();
    let err = pool.add_tool(Echo).unwrap_err();
    assert!(matches!(err, AcontextError::DuplicateTool(ref n) if n == "echo"));

    let out = pool.execute_tool(&mut (), "echo", json!({"text": "hey"})).await.unwrap();
    assert_eq!(out, "hey");

    let out = pool
        .execute_tool(&mut (), "echo", json!("{\"text\": \"from string\"}"))
        .await
        .unwrap();
    assert_eq!(out, "from string");

    let err = pool.execute_tool(&mut (), "echo", json!([1, 2])).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let backend = Arc::new(FakeBackend::new());
    let pool = disk_tools();
    let mut ctx = pool.format_context(backend, "disk-1");
    let err = pool
        .execute_tool(&mut ctx, "delete_everything", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert!(err.to_string().contains("delete_everything"));
}

#[tokio::test]
async fn write_file_without_content_fails_before_any_write() {
    let backend = Arc::new(FakeBackend::new());
    let pool = disk_tools();
    let mut ctx = pool.format_context(backend.clone(), "disk-1");

    let err = pool
        .execute_tool(&mut ctx, "write_file", json!({"filename": "a.md"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "content is required");

    let err = pool
        .execute_tool(&mut ctx, "write_file", json!({"filename": "a.md", "content": ""}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "content is required");

    assert!(backend.upserts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn write_then_read_file() {
    let backend = Arc::new(FakeBackend::new());
    let pool = disk_tools();
    let mut ctx = pool.format_context(backend.clone(), "disk-1");

    let out = pool
        .execute_tool(
            &mut ctx,
            "write_file",
            json!({"filename": "notes.md", "content": "one\ntwo\nthree", "file_path": "docs"}),
        )
        .await
        .unwrap();
    assert_eq!(out, "File 'notes.md' written successfully to '/docs/notes.md'");

    let out = pool
        .execute_tool(
            &mut ctx,
            "read_file",
            json!({"filename": "notes.md", "file_path": "/docs/", "line_offset": 2, "line_limit": 1}),
        )
        .await
        .unwrap();
    assert_eq!(out, "[/docs/notes.md - showing L2-3 of 3 lines]\ntwo");
}

#[tokio::test]
async fn read_file_defaults_to_first_hundred_lines() {
    let backend = Arc::new(FakeBackend::new());
    let body: Vec<String> = (1..=150).map(|n| format!("line {n}")).collect();
    backend.put_file("/", "long.txt", &body.join("\n"));

    let pool = disk_tools();
    let mut ctx = pool.format_context(backend, "disk-1");
    let out = pool
        .execute_tool(&mut ctx, "read_file", json!({"filename": "long.txt"}))
        .await
        .unwrap();

    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("[/long.txt - showing L1-101 of 150 lines]"));
    assert_eq!(lines.next(), Some("line 1"));
    assert_eq!(lines.last(), Some("line 100"));
}

#[tokio::test]
async fn read_file_reports_one_based_window() {
    let backend = Arc::new(FakeBackend::new());
    backend.put_file("/", "a.txt", "l1\nl2\nl3");
    let pool = disk_tools();
    let mut ctx = pool.format_context(backend, "disk-1");

    let out = pool
        .execute_tool(&mut ctx, "read_file", json!({"filename": "a.txt"}))
        .await
        .unwrap();
    assert_eq!(out, "[/a.txt - showing L1-4 of 3 lines]\nl1\nl2\nl3");

    let out = pool
        .execute_tool(&mut ctx, "read_file", json!({"filename": "a.txt", "line_offset": 1}))
        .await
        .unwrap();
    assert_eq!(out, "[/a.txt - showing L1-4 of 3 lines]\nl1\nl2\nl3");
}

#[tokio::test]
async fn replace_string_reports_count_or_absence() {
    let backend = Arc::new(FakeBackend::new());
    backend.put_file("/", "a.txt", "cat cat dog");
    let pool = disk_tools();
    let mut ctx = pool.format_context(backend.clone(), "disk-1");

    let out = pool
        .execute_tool(
            &mut ctx,
            "replace_string",
            json!({"filename": "a.txt", "old_string": "cat", "new_string": "cow"}),
        )
        .await
        .unwrap();
    assert!(out.starts_with("Found 2 occurrence(s)"), "{out}");
    assert_eq!(backend.file("/", "a.txt").as_deref(), Some("cow cow dog"));

    let out = pool
        .execute_tool(
            &mut ctx,
            "replace_string",
            json!({"filename": "a.txt", "old_string": "bird", "new_string": "x"}),
        )
        .await
        .unwrap();
    assert_eq!(out, "String 'bird' not found in file '/a.txt'");
}

#[tokio::test]
async fn list_grep_glob_and_download() {
    let backend = Arc::new(FakeBackend::new());
    backend.put_file("/", "readme.md", "hello world");
    backend.put_file("/notes/", "todo.md", "buy milk");
    backend.put_file("/notes/", "log.txt", "hello again");
    let pool = disk_tools();
    let mut ctx = pool.format_context(backend, "disk-1");

    let out = pool
        .execute_tool(&mut ctx, "list_artifacts", json!({"file_path": "/"}))
        .await
        .unwrap();
    assert_eq!(out, "[Listing in /]\nDirectories: notes/\nFiles: readme.md");

    let out = pool
        .execute_tool(&mut ctx, "list_artifacts", json!({"file_path": "/empty/"}))
        .await
        .unwrap();
    assert_eq!(out, "[Listing in /empty/]\nNo files or directories found");

    let out = pool
        .execute_tool(&mut ctx, "grep_artifacts", json!({"query": "hello"}))
        .await
        .unwrap();
    assert_eq!(out, "Found 2 file(s) matching 'hello':\n/notes/log.txt\n/readme.md");

    let out = pool
        .execute_tool(&mut ctx, "glob_artifacts", json!({"query": "**/*.md", "limit": 1}))
        .await
        .unwrap();
    assert_eq!(out, "Found 1 file(s) matching pattern '**/*.md':\n/notes/todo.md");

    let out = pool
        .execute_tool(&mut ctx, "download_file", json!({"filename": "readme.md"}))
        .await
        .unwrap();
    assert_eq!(
        out,
        "Public download URL for '/readme.md' (valid 3600s): https://files.example.com/readme.md?expire=3600"
    );
}

#[tokio::test]
async fn get_skill_needs_id_or_name() {
    let backend = Arc::new(FakeBackend::new());
    backend.add_skill("sk-1", "pdf", "Work with PDFs", &["SKILL.md", "scripts/split.py"]);
    let pool = skill_tools();
    let mut ctx = pool.format_context(backend);

    let err = pool
        .execute_tool(&mut ctx, "get_skill", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(err.to_string(), "Either skill_id or name must be provided");

    let by_name = pool
        .execute_tool(&mut ctx, "get_skill", json!({"name": "pdf"}))
        .await
        .unwrap();
    let by_id = pool
        .execute_tool(&mut ctx, "get_skill", json!({"skill_id": "sk-1"}))
        .await
        .unwrap();
    assert_eq!(by_name, by_id);
    assert_eq!(
        by_id,
        "Skill: pdf (id: sk-1)\nDescription: Work with PDFs\nFiles:\n- SKILL.md\n- scripts/split.py"
    );
}

#[tokio::test]
async fn update_skill_requires_a_change() {
    let backend = Arc::new(FakeBackend::new());
    backend.add_skill("sk-1", "pdf", "Work with PDFs", &[]);
    let pool = skill_tools();
    let mut ctx = pool.format_context(backend);

    let err = pool
        .execute_tool(&mut ctx, "update_skill", json!({"skill_id": "sk-1"}))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);

    pool.execute_tool(
        &mut ctx,
        "update_skill",
        json!({"skill_id": "sk-1", "description": "PDF tooling"}),
    )
    .await
    .unwrap();
    let out = pool
        .execute_tool(&mut ctx, "list_skills", json!({}))
        .await
        .unwrap();
    assert_eq!(out, "Available skills:\n- pdf (id: sk-1): PDF tooling");
}

#[tokio::test]
async fn missing_skill_propagates_not_found() {
    let backend = Arc::new(FakeBackend::new());
    let pool = skill_tools();
    let mut ctx = pool.format_context(backend);
    let err = pool
        .execute_tool(&mut ctx, "get_skill", json!({"skill_id": "nope"}))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn mount_skill_is_visible_to_later_calls() {
    let backend = Arc::new(FakeBackend::new());
    backend.add_skill("sk-9", "pptx", "Slides", &["SKILL.md"]);
    let pool = sandbox_tools();
    let mut ctx = pool.format_context(backend, "sbx-1", "disk-1");

    let out = pool
        .execute_tool(&mut ctx, "mount_skill", json!({"skill_id": "sk-9"}))
        .await
        .unwrap();
    assert_eq!(out, "Skill 'pptx' mounted at /skills/pptx");
    assert_eq!(ctx.skill_path("pptx"), Some("/skills/pptx"));
    assert_eq!(ctx.mounted_skills.len(), 1);
}

#[tokio::test]
async fn bash_timeout_is_forwarded_in_milliseconds() {
    let backend = Arc::new(FakeBackend::new());
    backend.queue_exec("ok\n", 0);
    backend.queue_exec("ok\n", 0);
    backend.queue_exec("ok\n", 0);

    let pool = sandbox_tools_with_timeout(30.0);
    let mut ctx = pool.format_context(backend.clone(), "sbx-1", "disk-1");

    let out = pool
        .execute_tool(&mut ctx, "bash_execution_sandbox", json!({"command": "echo ok"}))
        .await
        .unwrap();
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["stdout"], "ok\n");
    assert_eq!(parsed["exit_code"], 0);
    assert_eq!(parsed["truncated"], false);

    pool.execute_tool(
        &mut ctx,
        "bash_execution_sandbox",
        json!({"command": "sleep 1", "timeout": 2.5}),
    )
    .await
    .unwrap();
    pool.execute_tool(
        &mut ctx,
        "bash_execution_sandbox",
        json!({"command": "true", "timeout": null}),
    )
    .await
    .unwrap();

    let timeouts: Vec<Option<u64>> = backend.exec_calls().iter().map(|c| c.timeout_ms).collect();
    assert_eq!(timeouts, vec![Some(30_000), Some(2_500), Some(30_000)]);
}

#[tokio::test]
async fn bash_without_default_timeout_sends_none() {
    let backend = Arc::new(FakeBackend::new());
    let pool = sandbox_tools();
    let mut ctx = pool.format_context(backend.clone(), "sbx-1", "disk-1");
    pool.execute_tool(&mut ctx, "bash_execution_sandbox", json!({"command": "ls"}))
        .await
        .unwrap();
    assert_eq!(backend.exec_calls()[0].timeout_ms, None);
    assert_eq!(backend.exec_calls()[0].sandbox_id, "sbx-1");
}

#[tokio::test]
async fn text_editor_view_and_str_replace() {
    let backend = Arc::new(FakeBackend::new());
    let pool = sandbox_tools();
    let mut ctx = pool.format_context(backend.clone(), "sbx-1", "disk-1");

    backend.queue_exec("alpha\nbeta\ngamma\n", 0);
    let out = pool
        .execute_tool(
            &mut ctx,
            "text_editor_sandbox",
            json!({"command": "view", "path": "/work/a.txt", "view_range": [2, -1]}),
        )
        .await
        .unwrap();
    assert_eq!(out, "     2\tbeta\n     3\tgamma");
    assert_eq!(backend.exec_calls()[0].command, "cat -- '/work/a.txt'");

    backend.queue_exec("x y x", 0);
    let out = pool
        .execute_tool(
            &mut ctx,
            "text_editor_sandbox",
            json!({"command": "str_replace", "path": "/work/a.txt", "old_str": "x", "new_str": "z"}),
        )
        .await
        .unwrap();
    assert!(out.starts_with("No replacement was performed"), "{out}");

    backend.queue_exec("x y", 0);
    backend.queue_exec("", 0);
    let out = pool
        .execute_tool(
            &mut ctx,
            "text_editor_sandbox",
            json!({"command": "str_replace", "path": "/work/a.txt", "old_str": "x", "new_str": "z"}),
        )
        .await
        .unwrap();
    assert_eq!(out, "The file /work/a.txt has been edited successfully");
    let write = &backend.exec_calls()[3].command;
    assert!(write.contains("base64 -d > '/work/a.txt'"), "{write}");
    assert!(write.contains("'eiB5'"), "{write}");
}

#[tokio::test]
async fn text_editor_creates_empty_file() {
    let backend = Arc::new(FakeBackend::new());
    let pool = sandbox_tools();
    let mut ctx = pool.format_context(backend.clone(), "sbx-1", "disk-1");

    let out = pool
        .execute_tool(
            &mut ctx,
            "text_editor_sandbox",
            json!({"command": "create", "path": "/work/empty.txt", "file_text": ""}),
        )
        .await
        .unwrap();
    assert_eq!(out, "File created successfully at: /work/empty.txt");
    let write = &backend.exec_calls()[0].command;
    assert!(write.contains("printf '%s' '' | base64 -d > '/work/empty.txt'"), "{write}");

    let err = pool
        .execute_tool(
            &mut ctx,
            "text_editor_sandbox",
            json!({"command": "create", "path": "/work/none.txt"}),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "file_text is required for create");
    assert_eq!(backend.exec_calls().len(), 1);
}

#[tokio::test]
async fn text_editor_rejects_unknown_command() {
    let backend = Arc::new(FakeBackend::new());
    let pool = sandbox_tools();
    let mut ctx = pool.format_context(backend.clone(), "sbx-1", "disk-1");
    let err = pool
        .execute_tool(&mut ctx, "text_editor_sandbox", json!({"command": "delete", "path": "/a"}))
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(backend.exec_calls().is_empty());
}

#[tokio::test]
async fn export_file_reports_disk_path() {
    let backend = Arc::new(FakeBackend::new());
    let pool = sandbox_tools();
    let mut ctx = pool.format_context(backend, "sbx-1", "disk-7");
    let out = pool
        .execute_tool(
            &mut ctx,
            "export_file_sandbox",
            json!({"sandbox_path": "/workspace", "sandbox_filename": "report.pdf"}),
        )
        .await
        .unwrap();
    assert_eq!(
        out,
        "Exported report.pdf from the sandbox to disk path /workspace/report.pdf\nPublic URL: https://files.example.com/report.pdf"
    );
}
