//! Tool registry - name lookup and prompt catalog rendering
//!
//! Central hub for registering tools, resolving names during execution, and
//! formatting tool metadata for the prompt. Read-only during a run.

use std::collections::HashMap;
use std::sync::Arc;

use crate::tools::Tool;

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, so catalog rendering is deterministic
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the built-in tools
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::tools::builtin::CalculatorTool::new()));
        registry.register(Arc::new(crate::tools::builtin::ClockTool::new()));
        registry.register(Arc::new(crate::tools::builtin::EchoTool::new()));
        registry
    }

    /// Register a tool, replacing any previous tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Look up a tool by name
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Render the tool catalog in the wire format embedded in the prompt
    ///
    /// Tag structure is part of the contract with the output format the model
    /// is instructed to follow; changing it breaks parsing.
    pub fn render_catalog(&self) -> String {
        let mut output = String::new();

        for name in &self.order {
            let tool = &self.tools[name];

            output.push_str("<tool>\n");
            output.push_str(&format!("<tool_name>{}</tool_name>\n", tool.name()));
            output.push_str(&format!(
                "<tool_description>{}</tool_description>\n",
                tool.description()
            ));
            output.push_str("<parameters>\n");

            for param in tool.parameters() {
                output.push_str("<parameter>\n");
                output.push_str(&format!("<name>{}</name>\n", param.name));
                output.push_str(&format!("<type>{}</type>\n", param.kind));
                output.push_str(&format!("<description>{}</description>\n", param.description));
                output.push_str(&format!("<required>{}</required>\n", param.required));
                output.push_str("</parameter>\n");
            }

            output.push_str("</parameters>\n");
            output.push_str("</tool>\n");
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Result, ToolInput, ToolOutcome, ToolParameter};
    use async_trait::async_trait;

    struct FakeTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for FakeTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "a fake tool"
        }

        fn parameters(&self) -> Vec<ToolParameter> {
            vec![ToolParameter::required("q", "string", "the query")]
        }

        async fn invoke(&self, _input: &ToolInput) -> Result<ToolOutcome> {
            Ok(ToolOutcome::observation("ok"))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FakeTool { name: "search" }));
        registry.register(Arc::new(FakeTool { name: "weather" }));

        assert!(registry.lookup("search").is_some());
        assert!(registry.lookup("missing").is_none());
        assert_eq!(registry.names(), vec!["search", "weather"]);
    }

    #[test]
    fn test_reregister_keeps_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FakeTool { name: "search" }));
        registry.register(Arc::new(FakeTool { name: "weather" }));
        registry.register(Arc::new(FakeTool { name: "search" }));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["search", "weather"]);
    }

    #[test]
    fn test_catalog_wire_format() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FakeTool { name: "search" }));

        let catalog = registry.render_catalog();
        assert!(catalog.contains("<tool_name>search</tool_name>"));
        assert!(catalog.contains("<tool_description>a fake tool</tool_description>"));
        assert!(catalog.contains("<parameter>\n<name>q</name>\n<type>string</type>"));
        assert!(catalog.contains("<required>true</required>"));
    }

    #[test]
    fn test_catalog_is_deterministic() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FakeTool { name: "b" }));
        registry.register(Arc::new(FakeTool { name: "a" }));

        let first = registry.render_catalog();
        let second = registry.render_catalog();
        assert_eq!(first, second);
        // Registration order, not alphabetical
        assert!(first.find("<tool_name>b<").unwrap() < first.find("<tool_name>a<").unwrap());
    }
}
