// SPDX-License-Identifier: MIT

pub mod agent;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod model;
pub mod tool;
