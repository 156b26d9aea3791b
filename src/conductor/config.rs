// SPDX-License-Identifier: MIT

//! Executor tunables

use crate::adk::error::{ConductorError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_TOOL_ITERATIONS: u32 = 50;
pub const DEFAULT_EXECUTION_TIMEOUT_MS: u64 = 5 * 60 * 1000;

const MAX_TOOL_ITERATIONS_VAR: &str = "CONDUCTOR_MAX_TOOL_ITERATIONS";
const EXECUTION_TIMEOUT_VAR: &str = "CONDUCTOR_EXECUTION_TIMEOUT_SECS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// LLM round-trips allowed in one tool loop
    pub max_tool_iterations: u32,
    /// Wall-clock bound for a single agent run
    pub execution_timeout_ms: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            execution_timeout_ms: DEFAULT_EXECUTION_TIMEOUT_MS,
        }
    }
}

impl ExecutorSettings {
    /// Defaults overridden by `CONDUCTOR_MAX_TOOL_ITERATIONS` and
    /// `CONDUCTOR_EXECUTION_TIMEOUT_SECS` when set
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(raw) = env::var(MAX_TOOL_ITERATIONS_VAR) {
            settings.max_tool_iterations = parse_var(MAX_TOOL_ITERATIONS_VAR, &raw)?;
        }
        if let Ok(raw) = env::var(EXECUTION_TIMEOUT_VAR) {
            let secs: u64 = parse_var(EXECUTION_TIMEOUT_VAR, &raw)?;
            settings.execution_timeout_ms = secs_to_ms(secs)?;
        }

        Ok(settings)
    }

    pub fn with_max_tool_iterations(mut self, max: u32) -> Self {
        self.max_tool_iterations = max;
        self
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ConductorError::config(format!("{} must be a positive integer, got '{}'", name, raw)))
}

fn secs_to_ms(secs: u64) -> Result<u64> {
    secs.checked_mul(1000).ok_or_else(|| {
        ConductorError::config(format!("{} is too large: {} seconds", EXECUTION_TIMEOUT_VAR, secs))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ExecutorSettings::default();
        assert_eq!(settings.max_tool_iterations, 50);
        assert_eq!(settings.execution_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_builders() {
        let settings = ExecutorSettings::default()
            .with_max_tool_iterations(3)
            .with_execution_timeout(Duration::from_millis(250));
        assert_eq!(settings.max_tool_iterations, 3);
        assert_eq!(settings.execution_timeout_ms, 250);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        let err = parse_var::<u32>(MAX_TOOL_ITERATIONS_VAR, "lots").unwrap_err();
        assert!(matches!(err, ConductorError::Config(ref m) if m.contains("lots")));
        assert_eq!(parse_var::<u32>(MAX_TOOL_ITERATIONS_VAR, " 7 ").unwrap(), 7);
    }

    #[test]
    fn test_timeout_secs_overflow_is_config_error() {
        assert_eq!(secs_to_ms(30).unwrap(), 30_000);
        let err = secs_to_ms(u64::MAX).unwrap_err();
        assert!(matches!(err, ConductorError::Config(ref m) if m.contains("too large")));
    }

    #[test]
    fn test_huge_duration_saturates() {
        let settings = ExecutorSettings::default().with_execution_timeout(Duration::MAX);
        assert_eq!(settings.execution_timeout_ms, u64::MAX);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings: ExecutorSettings = serde_yaml::from_str("max_tool_iterations: 4").unwrap();
        assert_eq!(settings.max_tool_iterations, 4);
        assert_eq!(settings.execution_timeout_ms, DEFAULT_EXECUTION_TIMEOUT_MS);
    }
}
