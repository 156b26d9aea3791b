// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use conductor_rs::adk::catalog::ToolCatalog;
use conductor_rs::adk::model::http::HttpLlmClient;
use conductor_rs::adk::model::LlmClient;
use conductor_rs::conductor::config::ExecutorSettings;
use conductor_rs::conductor::context::{ContextEntry, ExecutionContext};
use conductor_rs::conductor::executor::AgentExecutor;
use conductor_rs::conductor::project::ProjectFile;
use conductor_rs::conductor::registry::{AgentRegistry, InMemoryAgentRegistry};
use conductor_rs::conductor::workflow::{WorkflowLoader, WorkflowParser, WorkflowRecord};
use dotenv::dotenv;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a workflow file and print the report
    Validate {
        /// Path to the workflow file (.yaml, .yml or .json)
        #[arg(short, long)]
        workflow: PathBuf,
    },
    /// Print the execution order, routing conditions and route cycles of a workflow
    Plan {
        #[arg(short, long)]
        workflow: PathBuf,
    },
    /// Run a workflow against the agents of a project file
    Run {
        /// Project file declaring agents, tools and assignments
        #[arg(short, long)]
        project: PathBuf,

        #[arg(short, long)]
        workflow: PathBuf,

        /// Workflow input; parsed as JSON when possible, otherwise sent as text
        #[arg(short, long)]
        input: String,
    },
    /// Run a single agent from a project file
    Prompt {
        #[arg(short, long)]
        project: PathBuf,

        /// Agent id
        #[arg(short, long)]
        agent: String,

        #[arg(short, long)]
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Validate { workflow } => {
            let record = load_workflow(&workflow)?;
            let report = WorkflowParser::validate(&record);
            print_json(&report)?;
            if !report.valid {
                bail!("workflow {} is invalid", workflow.display());
            }
        }
        Commands::Plan { workflow } => {
            let record = load_workflow(&workflow)?;
            let definition = WorkflowParser::parse(&record)?;
            let plan = json!({
                "workflowType": definition.workflow_type.as_str(),
                "executionOrder": WorkflowParser::get_execution_order(&definition).to_value(),
                "conditions": WorkflowParser::get_conditions(&definition),
                "circularRoutes": WorkflowParser::detect_circular_routes(&definition.flow.routes),
            });
            print_json(&plan)?;
        }
        Commands::Run {
            project,
            workflow,
            input,
        } => {
            let record = load_workflow(&workflow)?;
            let report = WorkflowParser::validate(&record);
            for warning in &report.warnings {
                log::warn!("{}", warning);
            }
            if !report.valid {
                bail!("workflow is invalid: {}", report.errors.join("; "));
            }
            let definition = WorkflowParser::parse(&record)?;

            let (project, registry) = load_project(&project).await?;
            let executor = AgentExecutor::with_settings(executor_settings(&project)?);
            let context = ExecutionContext::new();

            let outcome = executor
                .execute_plan(&definition, &registry, &parse_input(input), &context)
                .await?;
            print_report(&outcome, &context)?;
            if !outcome.success {
                bail!(
                    "workflow failed: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        Commands::Prompt {
            project,
            agent,
            input,
        } => {
            let (project, registry) = load_project(&project).await?;
            let executor = AgentExecutor::with_settings(executor_settings(&project)?);
            let context = ExecutionContext::new();

            let found = registry.get(&agent).await;
            let result = executor
                .execute_agent(found.as_deref(), &parse_input(input), &context)
                .await?;
            print_report(&result, &context)?;
        }
    }

    Ok(())
}

fn load_workflow(path: &Path) -> anyhow::Result<WorkflowRecord> {
    WorkflowLoader::new()
        .load_record(path)
        .with_context(|| format!("failed to load workflow {}", path.display()))
}

async fn load_project(path: &Path) -> anyhow::Result<(ProjectFile, InMemoryAgentRegistry)> {
    let project = ProjectFile::load(path)
        .with_context(|| format!("failed to load project {}", path.display()))?;

    let llm: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::from_env());
    let catalog: Arc<dyn ToolCatalog> = Arc::new(project.build_catalog().await);
    let registry = project.build_registry(llm, catalog).await;

    Ok((project, registry))
}

/// Project settings win over the environment
fn executor_settings(project: &ProjectFile) -> anyhow::Result<ExecutorSettings> {
    match project.executor {
        Some(settings) => Ok(settings),
        None => Ok(ExecutorSettings::from_env()?),
    }
}

fn parse_input(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// A run's result alongside everything its agents recorded
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a, T: Serialize> {
    execution_id: &'a str,
    result: &'a T,
    context: Vec<ContextEntry>,
}

fn print_report<T: Serialize>(result: &T, context: &ExecutionContext) -> anyhow::Result<()> {
    print_json(&RunReport {
        execution_id: context.execution_id(),
        result,
        context: context.entries(),
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
