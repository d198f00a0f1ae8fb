//! Core domain models for modup
//!
//! This module contains the fundamental value types used throughout the
//! application:
//! - Module identifiers in their normalized `owner-name` form
//! - Version values with the canonical `v`-prefixed display form
//! - Version constraints attached to dependency edges

mod constraint;
mod module_id;
mod version;

pub use constraint::{ConstraintKind, VersionConstraint};
pub use module_id::ModuleId;
pub use version::Version;
