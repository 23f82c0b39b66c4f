//! Panel nesting engine for flat sheet stock.
//!
//! Given a parts list (rectangular pieces with quantity and thickness) and
//! stock panel settings, computes how many panels each thickness needs and
//! where every piece goes, using a guillotine bin-packing heuristic with
//! 90-degree rotation. Pure and deterministic: identical input always
//! yields an identical plan.

pub mod planner;
pub mod types;

pub use planner::{expand_parts, group_by_thickness, pack_group, Planner};
pub use types::*;
