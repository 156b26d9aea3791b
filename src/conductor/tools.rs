// SPDX-License-Identifier: MIT

//! Built-in tool types, available to every catalog built from a project file

use crate::adk::catalog::{InMemoryToolCatalog, ToolFactory};
use crate::adk::error::{ConductorError, Result};
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::sync::Arc;

/// `echo`: returns its arguments unchanged
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    async fn invoke(&self, args: Value) -> std::result::Result<Value, Box<dyn Error + Send + Sync>> {
        Ok(args)
    }
}

/// `static`: returns `configuration.response` regardless of arguments
pub struct StaticTool {
    response: Value,
}

impl StaticTool {
    pub fn from_configuration(configuration: &Value) -> Result<Self> {
        let response = configuration
            .get("response")
            .cloned()
            .ok_or_else(|| ConductorError::tool("static", "configuration.response is required"))?;
        Ok(Self { response })
    }
}

#[async_trait]
impl Tool for StaticTool {
    async fn invoke(&self, _args: Value) -> std::result::Result<Value, Box<dyn Error + Send + Sync>> {
        Ok(self.response.clone())
    }
}

/// Register the `echo` and `static` factories
pub fn with_builtin_tools(catalog: InMemoryToolCatalog) -> InMemoryToolCatalog {
    let echo: Arc<dyn ToolFactory> =
        Arc::new(|_: &Value| -> Result<Arc<dyn Tool>> { Ok(Arc::new(EchoTool)) });
    let fixed: Arc<dyn ToolFactory> = Arc::new(|configuration: &Value| -> Result<Arc<dyn Tool>> {
        Ok(Arc::new(StaticTool::from_configuration(configuration)?))
    });

    catalog.with_factory("echo", echo).with_factory("static", fixed)
}
