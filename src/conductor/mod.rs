// SPDX-License-Identifier: MIT

//! Conductor - multi-agent orchestration
//!
//! - [executor] - runs one agent or composes many (sequential, parallel, dependency levels)
//! - [workflow] - turns stored workflow records into validated execution plans
//! - [graph] - cycle detection shared by both
//! - [context] - the append-only log agents write their outputs to

pub mod config;
pub mod context;
pub mod executor;
pub mod graph;
pub mod project;
pub mod registry;
pub mod result;
pub mod tools;
pub mod workflow;
