//! Skill catalog tools.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::pool::ToolPool;
use super::tool::Tool;
use super::types::ToolParameters;
use super::validation::require_any;
use crate::client::{Skill, SkillApi, SkillLookup, SkillUpdate};
use crate::error::Result;

/// Per-run state for skill tools.
#[derive(Clone)]
pub struct SkillContext {
    pub client: Arc<dyn SkillApi>,
}

impl std::fmt::Debug for SkillContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillContext").finish_non_exhaustive()
    }
}

pub type SkillToolPool = ToolPool<SkillContext>;

impl ToolPool<SkillContext> {
    pub fn format_context(&self, client: Arc<dyn SkillApi>) -> SkillContext {
        SkillContext { client }
    }
}

/// A fresh pool holding every skill tool.
pub fn skill_tools() -> SkillToolPool {
    SkillToolPool::from_tools([
        Arc::new(GetSkillTool::new()) as Arc<dyn Tool<SkillContext>>,
        Arc::new(ListSkillsTool::new()),
        Arc::new(UpdateSkillTool::new()),
        Arc::new(GetSkillFileTool::new()),
    ])
}

fn render_skill(skill: &Skill) -> String {
    let mut out = format!(
        "Skill: {} (id: {})\nDescription: {}",
        skill.name, skill.id, skill.description
    );
    if skill.file_index.is_empty() {
        out.push_str("\nFiles: none");
    } else {
        out.push_str("\nFiles:");
        for path in &skill.file_index {
            out.push_str("\n- ");
            out.push_str(path);
        }
    }
    out
}

/// `get_skill`: fetch a skill by id or by name.
pub struct GetSkillTool {
    parameters: ToolParameters,
}

impl GetSkillTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("skill_id", "Id of the skill. Either skill_id or name is required", false)
                .string("name", "Name of the skill. Either skill_id or name is required", false)
                .build(),
        }
    }
}

impl Default for GetSkillTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<SkillContext> for GetSkillTool {
    fn name(&self) -> &str {
        "get_skill"
    }

    fn description(&self) -> &str {
        "Get a skill's description and the list of files it contains."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SkillContext, args: &ToolArguments) -> Result<String> {
        require_any(
            args,
            &["skill_id", "name"],
            "Either skill_id or name must be provided",
        )?;
        let lookup = match args.get_str_opt("skill_id") {
            Some(id) => SkillLookup::Id(id.to_string()),
            None => SkillLookup::Name(args.get_str("name")?.to_string()),
        };

        let skill = ctx.client.get_skill(&lookup).await?;
        Ok(render_skill(&skill))
    }
}

/// `list_skills`: list the catalog.
pub struct ListSkillsTool {
    parameters: ToolParameters,
}

impl ListSkillsTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .integer("limit", "Maximum number of skills to list", false)
                .build(),
        }
    }
}

impl Default for ListSkillsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<SkillContext> for ListSkillsTool {
    fn name(&self) -> &str {
        "list_skills"
    }

    fn description(&self) -> &str {
        "List available skills with their ids and descriptions."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SkillContext, args: &ToolArguments) -> Result<String> {
        let limit = args.get_u64_opt("limit")?.map(|l| l.min(u32::MAX as u64) as u32);
        let skills = ctx.client.list_skills(limit).await?;
        if skills.is_empty() {
            return Ok("No skills found".to_string());
        }
        let lines: Vec<String> = skills
            .iter()
            .map(|s| format!("- {} (id: {}): {}", s.name, s.id, s.description))
            .collect();
        Ok(format!("Available skills:\n{}", lines.join("\n")))
    }
}

/// `update_skill`: change a skill's name, description or meta.
pub struct UpdateSkillTool {
    parameters: ToolParameters,
}

impl UpdateSkillTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("skill_id", "Id of the skill to update", true)
                .string("name", "New name", false)
                .string("description", "New description", false)
                .object("meta", "Replacement metadata object", false)
                .build(),
        }
    }
}

impl Default for UpdateSkillTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<SkillContext> for UpdateSkillTool {
    fn name(&self) -> &str {
        "update_skill"
    }

    fn description(&self) -> &str {
        "Update a skill's name, description or metadata. Unset fields are left unchanged."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SkillContext, args: &ToolArguments) -> Result<String> {
        let skill_id = args.get_str("skill_id")?;
        require_any(
            args,
            &["name", "description", "meta"],
            "At least one of name, description or meta must be provided",
        )?;

        let update = SkillUpdate {
            name: args.get_str_opt("name").map(str::to_string),
            description: args.get_str_opt("description").map(str::to_string),
            meta: args.get_object_opt("meta")?.cloned(),
        };
        let mut changed = Vec::new();
        if update.name.is_some() {
            changed.push("name");
        }
        if update.description.is_some() {
            changed.push("description");
        }
        if update.meta.is_some() {
            changed.push("meta");
        }

        let skill = ctx.client.update_skill(skill_id, &update).await?;
        Ok(format!(
            "Skill '{}' (id: {}) updated: {}",
            skill.name,
            skill.id,
            changed.join(", ")
        ))
    }
}

/// `get_skill_file`: read one file bundled with a skill.
pub struct GetSkillFileTool {
    parameters: ToolParameters,
}

impl GetSkillFileTool {
    pub fn new() -> Self {
        Self {
            parameters: ToolParameters::object()
                .string("skill_id", "Id of the skill", true)
                .string("file_path", "Path of the file inside the skill, e.g. 'SKILL.md'", true)
                .build(),
        }
    }
}

impl Default for GetSkillFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool<SkillContext> for GetSkillFileTool {
    fn name(&self) -> &str {
        "get_skill_file"
    }

    fn description(&self) -> &str {
        "Read a file that belongs to a skill."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, ctx: &mut SkillContext, args: &ToolArguments) -> Result<String> {
        let skill_id = args.get_str("skill_id")?;
        let file_path = args.get_str("file_path")?;

        let file = ctx.client.get_skill_file(skill_id, file_path).await?;
        match file.content {
            Some(content) => Ok(format!("[{}]\n{}", file.path, content)),
            None => Ok(format!(
                "[{}] is not a text file ({})",
                file.path,
                file.mime_type.as_deref().unwrap_or("unknown type")
            )),
        }
    }
}
