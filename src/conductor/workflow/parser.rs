// SPDX-License-Identifier: MIT

//! Workflow parser - stored record to typed plan, and back

use super::types::{
    AgentSlot, CircularCheck, ExecutionOrder, ExecutionStrategy, FlowSpec, RawAgentEntry,
    RawFlowConfig, RawStage, Route, RoutingCondition, Stage, ValidationReport, WorkflowDefinition,
    WorkflowRecord, WorkflowType,
};
use crate::adk::error::Result;
use crate::conductor::graph::DependencyGraph;
use serde_json::Value;
use std::collections::HashSet;

/// Parses, validates and plans stored workflow records
pub struct WorkflowParser;

impl WorkflowParser {
    /// Map a stored record onto a [`WorkflowDefinition`].
    ///
    /// Type defaults to `sequential`; an unknown type is the only error.
    /// Agent entries without an id and stages without a valid type are left
    /// out of the definition; [`validate`](Self::validate) reports them.
    pub fn parse(record: &WorkflowRecord) -> Result<WorkflowDefinition> {
        let workflow_type = match record.workflow_type.as_deref() {
            None => WorkflowType::Sequential,
            Some(raw) => raw.parse()?,
        };

        Ok(WorkflowDefinition {
            id: record.id.clone(),
            name: record.name.clone().unwrap_or_default(),
            description: record.description.clone(),
            workflow_type,
            bot_id: record.bot_id.clone(),
            entry_agent_id: record.entry_agent_id.clone(),
            is_default: record.is_default,
            is_active: record.is_active,
            agents: Self::parse_agents_config(&record.agents_config),
            flow: Self::parse_flow_config(&record.flow_config),
        })
    }

    /// Slots take their array index as `order` unless one is given
    pub fn parse_agents_config(entries: &[RawAgentEntry]) -> Vec<AgentSlot> {
        entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let Some(agent_id) = entry.agent_id.clone() else {
                    log::warn!("Skipping agent at index {}: missing agentId", index);
                    return None;
                };
                Some(AgentSlot {
                    agent_id,
                    order: entry.order.unwrap_or(index as u32),
                    role: entry.role.clone(),
                    config: entry.config.clone(),
                    depends_on: entry.depends_on.clone(),
                })
            })
            .collect()
    }

    pub fn parse_flow_config(flow: &RawFlowConfig) -> FlowSpec {
        let stages = flow
            .stages
            .iter()
            .enumerate()
            .filter_map(|(index, stage)| {
                match stage.stage_type.as_deref().map(str::parse::<ExecutionStrategy>) {
                    Some(Ok(kind)) => Some(Stage {
                        kind,
                        agents: stage.agents.clone(),
                    }),
                    _ => {
                        log::warn!("Skipping stage {}: missing or invalid type", index);
                        None
                    }
                }
            })
            .collect();

        FlowSpec {
            routes: flow.routes.clone(),
            stages,
            conditions: flow.conditions.clone(),
            fallback: flow.fallback.clone(),
        }
    }

    /// Check a stored record, collecting every problem found
    pub fn validate(record: &WorkflowRecord) -> ValidationReport {
        let mut report = ValidationReport::default();

        if record.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            report.error("Workflow name is required");
        }
        if record.bot_id.as_deref().map_or(true, str::is_empty) {
            report.error("Bot ID is required");
        }

        let workflow_type = match record.workflow_type.as_deref() {
            None => Some(WorkflowType::Sequential),
            Some(raw) => match raw.parse::<WorkflowType>() {
                Ok(t) => Some(t),
                Err(_) => {
                    report.error(format!(
                        "Invalid workflow type: {}. Must be one of: sequential, parallel, conditional, mixed",
                        raw
                    ));
                    None
                }
            },
        };

        if record.agents_config.is_empty() {
            report.error("At least one agent is required");
        }

        let mut known: HashSet<&str> = HashSet::new();
        for (index, entry) in record.agents_config.iter().enumerate() {
            match entry.agent_id.as_deref() {
                None => report.error(format!("Agent at index {} is missing agentId", index)),
                Some(id) => {
                    if !known.insert(id) {
                        report.warning(format!("Duplicate agent ID: {}", id));
                    }
                }
            }
        }

        for entry in &record.agents_config {
            let owner = entry.agent_id.as_deref().unwrap_or("?");
            for dep in &entry.depends_on {
                if !known.contains(dep.as_str()) {
                    report.error(format!("Agent {} depends on unknown agent {}", owner, dep));
                }
            }
        }

        match workflow_type {
            Some(WorkflowType::Conditional) => {
                Self::validate_conditional(record, &mut report);
            }
            Some(WorkflowType::Mixed) => {
                Self::validate_stages(&record.flow_config.stages, &mut report);
            }
            _ => {}
        }

        report.finish()
    }

    fn validate_conditional(record: &WorkflowRecord, report: &mut ValidationReport) {
        if record.entry_agent_id.is_none() {
            report.error("Conditional workflow requires entry_agent_id");
        }

        let routes = &record.flow_config.routes;
        if routes.is_empty() {
            report.warning("Conditional workflow has no routes defined");
        }

        if let Some(cycle) = Self::detect_circular_routes(routes).cycle {
            report.error(format!("Circular route detected: {}", cycle.join(" -> ")));
        }
    }

    fn validate_stages(stages: &[RawStage], report: &mut ValidationReport) {
        if stages.is_empty() {
            report.error("Mixed workflow requires at least one stage");
        }

        for (index, stage) in stages.iter().enumerate() {
            match stage.stage_type.as_deref() {
                None => report.error(format!("Stage {} is missing a type", index)),
                Some(raw) if raw.parse::<ExecutionStrategy>().is_err() => report.error(format!(
                    "Stage {} has invalid type: {}. Must be sequential or parallel",
                    index, raw
                )),
                Some(_) => {}
            }
            if stage.agents.is_empty() {
                report.error(format!("Stage {} must include at least one agent", index));
            }
        }
    }

    /// Scheduling order for a parsed workflow; see [`ExecutionOrder`]
    pub fn get_execution_order(workflow: &WorkflowDefinition) -> ExecutionOrder {
        match workflow.workflow_type {
            WorkflowType::Sequential => ExecutionOrder::Sequential(Self::ordered_ids(workflow)),
            WorkflowType::Parallel => ExecutionOrder::Parallel(vec![Self::ordered_ids(workflow)]),
            WorkflowType::Conditional => {
                ExecutionOrder::Conditional(workflow.entry_agent_id.iter().cloned().collect())
            }
            WorkflowType::Mixed => ExecutionOrder::Mixed(workflow.flow.stages.clone()),
        }
    }

    fn ordered_ids(workflow: &WorkflowDefinition) -> Vec<String> {
        let mut slots: Vec<&AgentSlot> = workflow.agents.iter().collect();
        slots.sort_by_key(|s| s.order);
        slots.into_iter().map(|s| s.agent_id.clone()).collect()
    }

    /// Route conditions first, tagged with their endpoints, then flow-level ones
    pub fn get_conditions(workflow: &WorkflowDefinition) -> Vec<RoutingCondition> {
        let from_routes = workflow.flow.routes.iter().filter_map(|route| {
            route.condition.as_ref().map(|condition| RoutingCondition {
                from_agent_id: Some(route.from_agent_id.clone()),
                target_agent_id: Some(route.target_agent_id.clone()),
                condition: condition.clone(),
            })
        });

        let declared = workflow.flow.conditions.iter().map(|raw| RoutingCondition {
            from_agent_id: id_field(raw, "fromAgentId"),
            target_agent_id: id_field(raw, "targetAgentId"),
            condition: raw.get("condition").cloned().unwrap_or_else(|| raw.clone()),
        });

        from_routes.chain(declared).collect()
    }

    pub fn detect_circular_routes(routes: &[Route]) -> CircularCheck {
        let mut graph = DependencyGraph::new();
        for route in routes {
            graph.add_edge(&route.from_agent_id, &route.target_agent_id);
        }

        let cycle = graph.find_cycle();
        CircularCheck {
            has_circular: cycle.is_some(),
            cycle,
        }
    }

    /// Serialize a parsed workflow back into its stored shape
    pub fn to_config(workflow: &WorkflowDefinition) -> WorkflowRecord {
        WorkflowRecord {
            id: workflow.id.clone(),
            name: Some(workflow.name.clone()),
            description: workflow.description.clone(),
            workflow_type: Some(workflow.workflow_type.as_str().to_string()),
            bot_id: workflow.bot_id.clone(),
            entry_agent_id: workflow.entry_agent_id.clone(),
            is_default: workflow.is_default,
            is_active: workflow.is_active,
            agents_config: workflow
                .agents
                .iter()
                .map(|slot| RawAgentEntry {
                    agent_id: Some(slot.agent_id.clone()),
                    order: Some(slot.order),
                    role: slot.role.clone(),
                    depends_on: slot.depends_on.clone(),
                    config: slot.config.clone(),
                })
                .collect(),
            flow_config: RawFlowConfig {
                routes: workflow.flow.routes.clone(),
                stages: workflow
                    .flow
                    .stages
                    .iter()
                    .map(|stage| RawStage {
                        stage_type: Some(stage.kind.as_str().to_string()),
                        agents: stage.agents.clone(),
                    })
                    .collect(),
                conditions: workflow.flow.conditions.clone(),
                fallback: workflow.flow.fallback.clone(),
            },
        }
    }
}

fn id_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::ConductorError;
    use serde_json::json;

    fn record(value: Value) -> WorkflowRecord {
        serde_json::from_value(value).unwrap()
    }

    fn route(from: &str, to: &str) -> Route {
        Route {
            from_agent_id: from.to_string(),
            target_agent_id: to.to_string(),
            condition: None,
        }
    }

    #[test]
    fn test_parse_defaults_to_sequential_and_index_order() {
        let def = WorkflowParser::parse(&record(json!({
            "name": "Pipeline",
            "bot_id": 1,
            "agents_config": [{"agentId": 10}, {"agentId": 11, "config": {"retries": 2}}]
        })))
        .unwrap();

        assert_eq!(def.workflow_type, WorkflowType::Sequential);
        assert_eq!(def.agents[0].order, 0);
        assert_eq!(def.agents[1].order, 1);
        assert_eq!(def.agents[1].config, Some(json!({"retries": 2})));
        assert!(def.agents[0].depends_on.is_empty());
        assert!(def.flow.fallback.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = WorkflowParser::parse(&record(json!({"name": "x", "workflow_type": "loop"})))
            .unwrap_err();
        assert!(matches!(err, ConductorError::Workflow(_)));
    }

    #[test]
    fn test_parse_leaves_malformed_entries_to_validate() {
        let raw = record(json!({
            "name": "Mixed",
            "bot_id": 1,
            "workflow_type": "mixed",
            "agents_config": [{"agentId": 1}, {"role": "orphan"}, {"agentId": 2}],
            "flow_config": {"stages": [
                {"agents": [1]},
                {"type": "loop", "agents": [1]},
                {"type": "parallel", "agents": [1, 2]}
            ]}
        }));

        let def = WorkflowParser::parse(&raw).unwrap();
        let ids: Vec<&str> = def.agents.iter().map(|s| s.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(def.agents[1].order, 2);
        assert_eq!(def.flow.stages.len(), 1);
        assert_eq!(def.flow.stages[0].kind, ExecutionStrategy::Parallel);

        let report = WorkflowParser::validate(&raw);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "Agent at index 1 is missing agentId",
                "Stage 0 is missing a type",
                "Stage 1 has invalid type: loop. Must be sequential or parallel",
            ]
        );
    }

    #[test]
    fn test_validate_unknown_dependency() {
        let report = WorkflowParser::validate(&record(json!({
            "name": "Deps",
            "bot_id": 1,
            "agents_config": [{"agentId": 1, "dependsOn": [999]}]
        })));

        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Agent 1 depends on unknown agent 999"]);
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let report = WorkflowParser::validate(&record(json!({
            "workflow_type": "graph",
            "agents_config": []
        })));

        assert!(!report.valid);
        assert_eq!(report.errors.len(), 4);
        assert!(report.errors[0].contains("name"));
        assert!(report.errors[1].contains("Bot ID"));
        assert!(report.errors[2].contains("Invalid workflow type: graph"));
        assert!(report.errors[3].contains("At least one agent"));
    }

    #[test]
    fn test_validate_missing_agent_id_and_duplicates() {
        let report = WorkflowParser::validate(&record(json!({
            "name": "Dup",
            "bot_id": 1,
            "agents_config": [{"agentId": 1}, {"role": "x"}, {"agentId": 1}]
        })));

        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Agent at index 1 is missing agentId"]);
        assert_eq!(report.warnings, vec!["Duplicate agent ID: 1"]);
    }

    #[test]
    fn test_duplicates_alone_stay_valid() {
        let report = WorkflowParser::validate(&record(json!({
            "name": "Dup",
            "bot_id": 1,
            "agents_config": [{"agentId": 1}, {"agentId": 1}]
        })));
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_validate_conditional() {
        let report = WorkflowParser::validate(&record(json!({
            "name": "Router",
            "bot_id": 1,
            "workflow_type": "conditional",
            "agents_config": [{"agentId": 1}]
        })));
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Conditional workflow requires entry_agent_id"]);
        assert_eq!(report.warnings, vec!["Conditional workflow has no routes defined"]);
    }

    #[test]
    fn test_validate_conditional_cycle() {
        let report = WorkflowParser::validate(&record(json!({
            "name": "Router",
            "bot_id": 1,
            "workflow_type": "conditional",
            "entry_agent_id": 1,
            "agents_config": [{"agentId": 1}, {"agentId": 2}],
            "flow_config": {"routes": [
                {"fromAgentId": 1, "targetAgentId": 2},
                {"fromAgentId": 2, "targetAgentId": 1}
            ]}
        })));
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Circular route detected: 1 -> 2 -> 1"]);
    }

    #[test]
    fn test_validate_mixed_stages() {
        let report = WorkflowParser::validate(&record(json!({
            "name": "Mixed",
            "bot_id": 1,
            "workflow_type": "mixed",
            "agents_config": [{"agentId": 1}],
            "flow_config": {"stages": [
                {"type": "parallel", "agents": [1]},
                {"type": "loop", "agents": []},
                {"agents": [1]}
            ]}
        })));
        assert_eq!(
            report.errors,
            vec![
                "Stage 1 has invalid type: loop. Must be sequential or parallel",
                "Stage 1 must include at least one agent",
                "Stage 2 is missing a type",
            ]
        );

        let empty = WorkflowParser::validate(&record(json!({
            "name": "Mixed",
            "bot_id": 1,
            "workflow_type": "mixed",
            "agents_config": [{"agentId": 1}]
        })));
        assert_eq!(empty.errors, vec!["Mixed workflow requires at least one stage"]);
    }

    #[test]
    fn test_execution_order_per_type() {
        let mut def = WorkflowParser::parse(&record(json!({
            "name": "Order",
            "agents_config": [
                {"agentId": "c", "order": 3},
                {"agentId": "a", "order": 1},
                {"agentId": "b", "order": 1}
            ],
            "flow_config": {"stages": [{"type": "sequential", "agents": ["a"]}]}
        })))
        .unwrap();

        assert_eq!(
            WorkflowParser::get_execution_order(&def),
            ExecutionOrder::Sequential(vec!["a".into(), "b".into(), "c".into()])
        );

        def.workflow_type = WorkflowType::Parallel;
        assert_eq!(
            WorkflowParser::get_execution_order(&def).to_value(),
            json!([["a", "b", "c"]])
        );

        def.workflow_type = WorkflowType::Conditional;
        assert_eq!(
            WorkflowParser::get_execution_order(&def),
            ExecutionOrder::Conditional(vec![])
        );
        def.entry_agent_id = Some("b".into());
        assert_eq!(
            WorkflowParser::get_execution_order(&def),
            ExecutionOrder::Conditional(vec!["b".into()])
        );

        def.workflow_type = WorkflowType::Mixed;
        assert_eq!(
            WorkflowParser::get_execution_order(&def).to_value(),
            json!([{"type": "sequential", "agents": ["a"]}])
        );
    }

    #[test]
    fn test_get_conditions_merges_routes_and_flow() {
        let def = WorkflowParser::parse(&record(json!({
            "name": "Router",
            "workflow_type": "conditional",
            "agents_config": [{"agentId": 1}, {"agentId": 2}],
            "flow_config": {
                "routes": [
                    {"fromAgentId": 1, "targetAgentId": 2, "condition": {"intent": "billing"}},
                    {"fromAgentId": 2, "targetAgentId": 3}
                ],
                "conditions": [{"field": "priority", "equals": "high"}]
            }
        })))
        .unwrap();

        let conditions = WorkflowParser::get_conditions(&def);
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].from_agent_id.as_deref(), Some("1"));
        assert_eq!(conditions[0].condition, json!({"intent": "billing"}));
        assert!(conditions[1].from_agent_id.is_none());
        assert_eq!(conditions[1].condition["field"], "priority");
    }

    #[test]
    fn test_detect_circular_routes() {
        let cyclic = [route("1", "2"), route("2", "3"), route("3", "1")];
        assert!(WorkflowParser::detect_circular_routes(&cyclic).has_circular);

        let chain = [route("1", "2"), route("2", "3")];
        assert!(!WorkflowParser::detect_circular_routes(&chain).has_circular);

        assert!(!WorkflowParser::detect_circular_routes(&[]).has_circular);
    }

    #[test]
    fn test_to_config_round_trip() {
        let original = WorkflowParser::parse(&record(json!({
            "id": 9,
            "name": "Round trip",
            "description": "all the fields",
            "workflow_type": "mixed",
            "bot_id": "bot-1",
            "entry_agent_id": 1,
            "is_default": true,
            "agents_config": [
                {"agentId": 1, "role": "lead", "config": {"tone": "dry"}},
                {"id": 2, "order": 5, "dependsOn": [1]}
            ],
            "flow_config": {
                "routes": [{"fromAgentId": 1, "targetAgentId": 2, "condition": "always"}],
                "stages": [{"type": "parallel", "agents": [1, 2]}],
                "conditions": [{"x": 1}],
                "fallback": 2
            }
        })))
        .unwrap();

        let stored = WorkflowParser::to_config(&original);
        let reparsed = WorkflowParser::parse(&stored).unwrap();
        assert_eq!(reparsed, original);

        // and through an actual serialized form
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["agents_config"][1]["agentId"], "2");
        let from_json = WorkflowParser::parse(&record(json)).unwrap();
        assert_eq!(from_json, original);
    }
}
