//! Named registry of tools sharing one context type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::arguments::ToolArguments;
use super::tool::Tool;
use super::validation::validate_required;
use crate::error::{AcontextError, Result};

/// Tools keyed by name, all executed against a `C` context.
pub struct ToolPool<C: Send + Sync + 'static> {
    tools: HashMap<String, Arc<dyn Tool<C>>>,
}

impl<C: Send + Sync + 'static> Default for ToolPool<C> {
    fn default() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }
}

impl<C: Send + Sync + 'static> Clone for ToolPool<C> {
    fn clone(&self) -> Self {
        Self {
            tools: self.tools.clone(),
        }
    }
}

impl<C: Send + Sync + 'static> fmt::Debug for ToolPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ToolPool").field("tools", &names).finish()
    }
}

impl<C> ToolPool<C>
where
    C: Send + Sync + 'static,
{
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A name that is already taken is rejected.
    pub fn add_tool(&mut self, tool: impl Tool<C> + 'static) -> Result<()> {
        self.add_shared(Arc::new(tool))
    }

    /// Register an already shared tool.
    pub fn add_shared(&mut self, tool: Arc<dyn Tool<C>>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(AcontextError::DuplicateTool(name));
        }
        tracing::debug!(tool = %name, "registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Build a pool from a fixed tool list. Later entries win on a name clash.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool<C>>>) -> Self {
        let tools = tools
            .into_iter()
            .map(|tool| (tool.name().to_string(), tool))
            .collect();
        Self { tools }
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<Arc<dyn Tool<C>>> {
        self.tools.remove(name)
    }

    pub fn tool_exists(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool<C>>> {
        self.tools.get(name)
    }

    /// Registered names, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Merge every tool of `other` into this pool, replacing same-named tools.
    pub fn extend_tool_pool(&mut self, other: &ToolPool<C>) {
        for (name, tool) in &other.tools {
            self.tools.insert(name.clone(), Arc::clone(tool));
        }
    }

    /// OpenAI schemas of every tool, sorted by name.
    pub fn to_openai_tool_schema(&self) -> Vec<Value> {
        self.sorted_tools()
            .map(|tool| tool.to_openai_tool_schema())
            .collect()
    }

    /// Anthropic schemas of every tool, sorted by name.
    pub fn to_anthropic_tool_schema(&self) -> Vec<Value> {
        self.sorted_tools()
            .map(|tool| tool.to_anthropic_tool_schema())
            .collect()
    }

    /// Dispatch a call to the named tool.
    ///
    /// `args` may be an object or a JSON-encoded object string, as models
    /// emit either. Required arguments are checked before the tool runs, so a
    /// failed check never causes a side effect.
    pub async fn execute_tool(&self, ctx: &mut C, name: &str, args: Value) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AcontextError::NotFound(format!("Tool {name} not found")))?;

        let args = ToolArguments::from_value(args)?;
        validate_required(tool.required_arguments(), &args)?;

        tracing::debug!(tool = %name, "executing tool");
        tool.execute(ctx, &args).await
    }

    fn sorted_tools(&self) -> impl Iterator<Item = &Arc<dyn Tool<C>>> {
        let mut tools: Vec<_> = self.tools.iter().collect();
        tools.sort_unstable_by(|a, b| a.0.cmp(b.0));
        tools.into_iter().map(|(_, tool)| tool)
    }
}
