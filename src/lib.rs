//! modup - Puppet module upgrade library
//!
//! This library provides the core functionality for upgrading one installed
//! module within a local module tree:
//! - scanning a modulepath into a graph of installed modules
//! - resolving an upgrade against the Forge and the installed constraints
//! - building, rendering, and applying the resulting upgrade plan

pub mod catalog;
pub mod cli;
pub mod domain;
pub mod error;
pub mod events;
pub mod graph;
pub mod install;
pub mod output;
pub mod plan;
pub mod progress;
pub mod solve;
