use crate::types::*;
use std::collections::BTreeMap;

/// Attaches usage and cost figures to the packing result of one group.
pub(super) fn group_plan(
    parts: &[Part],
    packed: PackResult,
    usable: UsableArea,
    price_per_panel: f64,
) -> GroupPlan {
    // Footprints after rotation, kerf excluded. Oversized placements carry
    // their original dimensions and count toward used area as well.
    let used_area: f64 = packed
        .placements
        .iter()
        .map(|p| p.placed_width * p.placed_height)
        .sum();

    let panel_area = usable.width * usable.height;
    let total_panel_area = packed.panel_count as f64 * panel_area;
    let usage_percent = if total_panel_area > 0.0 {
        used_area / total_panel_area * 100.0
    } else {
        0.0
    };
    let proportional_cost = if panel_area > 0.0 {
        used_area / panel_area * price_per_panel
    } else {
        0.0
    };

    GroupPlan {
        panel_count: packed.panel_count,
        part_count: parts.iter().map(|p| p.quantity).sum(),
        placements: packed.placements,
        price_per_panel,
        cost: packed.panel_count as f64 * price_per_panel,
        used_area,
        total_panel_area,
        usage_percent,
        proportional_cost,
    }
}

/// Sums the per-group plans into grand totals. The overall usage percent
/// comes from the summed areas, not from averaging group percentages.
pub(super) fn assemble(
    by_thickness: BTreeMap<Thickness, GroupPlan>,
    settings: &PlanSettings,
) -> PlanResult {
    let total_panels = by_thickness.values().map(|g| g.panel_count).sum();
    let total_cost = by_thickness.values().map(|g| g.cost).sum();
    let total_proportional_cost = by_thickness.values().map(|g| g.proportional_cost).sum();
    let total_used_area: f64 = by_thickness.values().map(|g| g.used_area).sum();
    let total_panel_area: f64 = by_thickness.values().map(|g| g.total_panel_area).sum();
    let overall_usage_percent = if total_panel_area > 0.0 {
        total_used_area / total_panel_area * 100.0
    } else {
        0.0
    };

    PlanResult {
        by_thickness,
        total_panels,
        total_cost,
        total_proportional_cost,
        total_used_area,
        total_panel_area,
        overall_usage_percent,
        usable: settings.usable_area(),
        stock: settings.stock_size(),
    }
}
