// SPDX-License-Identifier: MIT

//! Workflow loader - stored records from YAML or JSON files

use super::types::WorkflowRecord;
use crate::adk::error::Result;
use std::fs;
use std::path::Path;

/// Loads workflow records from disk
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a record, choosing the format by file extension (`.json` or YAML)
    pub fn load_record<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowRecord> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::debug!("Loaded workflow file {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::parse_json(&content),
            _ => Self::parse_yaml(&content),
        }
    }

    pub fn parse_yaml(content: &str) -> Result<WorkflowRecord> {
        let record: WorkflowRecord = serde_yaml::from_str(content)?;
        Ok(record)
    }

    pub fn parse_json(content: &str) -> Result<WorkflowRecord> {
        let record: WorkflowRecord = serde_json::from_str(content)?;
        Ok(record)
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::ConductorError;

    #[test]
    fn test_parse_yaml_record() {
        let yaml = r#"
id: 3
name: Research pipeline
workflow_type: sequential
bot_id: 12
agents_config:
  - agentId: 1
    role: researcher
  - agentId: 2
    role: writer
    dependsOn: [1]
"#;
        let record = WorkflowLoader::parse_yaml(yaml).unwrap();
        assert_eq!(record.id.as_deref(), Some("3"));
        assert_eq!(record.name.as_deref(), Some("Research pipeline"));
        assert_eq!(record.agents_config.len(), 2);
        assert_eq!(record.agents_config[1].depends_on, vec!["1"]);
        assert!(record.flow_config.routes.is_empty());
    }

    #[test]
    fn test_parse_yaml_mixed_stages() {
        let yaml = r#"
name: Fan out
bot_id: 1
workflow_type: mixed
agents_config:
  - agentId: a
  - agentId: b
flow_config:
  stages:
    - type: parallel
      agents: [a, b]
"#;
        let record = WorkflowLoader::parse_yaml(yaml).unwrap();
        assert_eq!(record.flow_config.stages.len(), 1);
        assert_eq!(record.flow_config.stages[0].stage_type.as_deref(), Some("parallel"));
        assert_eq!(record.flow_config.stages[0].agents, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_json_record() {
        let record =
            WorkflowLoader::parse_json(r#"{"name": "J", "bot_id": 1, "is_active": false}"#).unwrap();
        assert!(!record.is_active);
        assert!(!record.is_default);
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let err = WorkflowLoader::parse_yaml("agents_config: {not: [a list").unwrap_err();
        assert!(matches!(err, ConductorError::Yaml(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = WorkflowLoader::new()
            .load_record("/definitely/not/here.yaml")
            .unwrap_err();
        assert!(matches!(err, ConductorError::Io(_)));
    }
}
