// SPDX-License-Identifier: MIT

//! Workflow module - stored workflow records and their execution plans
//!
//! - [types] - stored record and parsed definition
//! - [parser] - parse, validate, plan, serialize back
//! - [loader] - read records from YAML or JSON files

pub mod loader;
pub mod parser;
pub mod types;

pub use loader::WorkflowLoader;
pub use parser::WorkflowParser;
pub use types::{
    AgentSlot, ExecutionOrder, ExecutionStrategy, FlowSpec, Route, Stage, ValidationReport,
    WorkflowDefinition, WorkflowRecord, WorkflowType,
};
