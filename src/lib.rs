// SPDX-License-Identifier: MIT

//! conductor-rs - multi-agent orchestration engine
//!
//! - [adk] - agent development kit: agents, model families, tools, errors
//! - [conductor] - execution strategies, workflow parsing, dependency graphs

pub mod adk;
pub mod conductor;
