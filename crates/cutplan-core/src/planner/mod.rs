use crate::types::*;
use std::collections::BTreeMap;

mod packer;
mod report;
#[cfg(test)]
mod tests;

pub use packer::pack_group;

/// Expands every part into `quantity` individual pieces, preserving input
/// order part-by-part. The packer's sort is stable, so this order is the
/// tie-break for pieces of identical size and must not be disturbed.
pub fn expand_parts(parts: &[Part]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for part in parts {
        for _ in 0..part.quantity {
            pieces.push(Piece {
                module_name: part.module_name.clone(),
                part_name: part.part_name.clone(),
                width: part.width,
                height: part.height,
                thickness: Thickness::from_mm(part.thickness),
            });
        }
    }
    pieces
}

/// Stable partition of the parts list by canonical thickness. Within each
/// group the relative input order is preserved.
pub fn group_by_thickness(parts: &[Part]) -> BTreeMap<Thickness, Vec<Part>> {
    let mut groups: BTreeMap<Thickness, Vec<Part>> = BTreeMap::new();
    for part in parts {
        groups
            .entry(Thickness::from_mm(part.thickness))
            .or_default()
            .push(part.clone());
    }
    groups
}

/// Computes a cutting plan for a full parts list: groups pieces by
/// thickness, packs each group independently onto stock panels, and
/// aggregates panel counts, usage, and cost.
pub struct Planner {
    request: PlanRequest,
}

impl Planner {
    /// Validates the request and builds a planner instance.
    ///
    /// An empty parts list is valid (it yields an empty plan); geometry
    /// that can never pack anything is not.
    pub fn new(request: PlanRequest) -> Result<Self> {
        let settings = &request.settings;

        if settings.discard_margin < 0.0 {
            return Err(PlanError::InvalidInput(
                "Discard margin must not be negative".to_string(),
            ));
        }

        if settings.kerf_width < 0.0 {
            return Err(PlanError::InvalidInput(
                "Kerf width must not be negative".to_string(),
            ));
        }

        let usable = settings.usable_area();
        if usable.width <= 0.0 || usable.height <= 0.0 {
            return Err(PlanError::InvalidInput(
                "Stock panel becomes unusable after applying the discard margin".to_string(),
            ));
        }

        for part in &request.parts {
            if part.width <= 0.0 || part.height <= 0.0 {
                return Err(PlanError::InvalidInput(format!(
                    "Part '{}' of module '{}' has non-positive dimensions",
                    part.part_name, part.module_name
                )));
            }
            if part.thickness <= 0.0 {
                return Err(PlanError::InvalidInput(format!(
                    "Part '{}' of module '{}' has non-positive thickness",
                    part.part_name, part.module_name
                )));
            }
        }

        Ok(Self { request })
    }

    /// Runs the full plan: group by thickness, pack each group, aggregate.
    pub fn plan(&self) -> Result<PlanResult> {
        let settings = &self.request.settings;
        let usable = settings.usable_area();

        let mut by_thickness = BTreeMap::new();
        for (thickness, parts) in group_by_thickness(&self.request.parts) {
            let pieces = expand_parts(&parts);
            let packed = pack_group(&pieces, usable, settings.kerf_width);
            let plan = report::group_plan(&parts, packed, usable, settings.price_for(thickness));
            by_thickness.insert(thickness, plan);
        }

        Ok(report::assemble(by_thickness, settings))
    }
}
