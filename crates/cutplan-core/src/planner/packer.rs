//! Guillotine bin-packing for a single thickness group.
//!
//! Best-short-side-fit over a per-panel free-rectangle list: each placement
//! consumes a free rectangle and splits the remainder with one vertical and
//! one horizontal cut, so placements never overlap by construction.

use crate::types::{PackResult, Piece, Placement, UsableArea, TOO_LARGE_FOR_PANEL};
use std::cmp::Ordering;

/// An axis-aligned rectangle of unused space, in panel-local coordinates.
#[derive(Debug, Clone)]
struct FreeRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl FreeRect {
    fn contains(&self, other: &FreeRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

struct Panel {
    free_rects: Vec<FreeRect>,
    placements: Vec<Placement>,
}

impl Panel {
    fn new(usable: UsableArea) -> Self {
        Self {
            free_rects: vec![FreeRect {
                x: 0.0,
                y: 0.0,
                width: usable.width,
                height: usable.height,
            }],
            placements: Vec::new(),
        }
    }
}

/// The winning (panel, free rect, orientation) combination for one piece.
struct Fit {
    panel: usize,
    rect: usize,
    width: f64,
    height: f64,
    rotated: bool,
    short_side: f64,
}

/// Packs the pieces of one thickness group onto as few panels as the
/// heuristic manages. Pieces too large for an empty panel are emitted with
/// an error marker on their own panel; the run never fails.
pub fn pack_group(pieces: &[Piece], usable: UsableArea, kerf: f64) -> PackResult {
    // Largest-area first; long thin pieces before squarer ones of equal
    // area. Stable sort keeps input order as the final tie-break.
    let mut sorted: Vec<&Piece> = pieces.iter().collect();
    sorted.sort_by(|a, b| {
        let area_a = a.width * a.height;
        let area_b = b.width * b.height;
        area_b
            .partial_cmp(&area_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let long_a = a.width.max(a.height);
                let long_b = b.width.max(b.height);
                long_b.partial_cmp(&long_a).unwrap_or(Ordering::Equal)
            })
    });

    let mut panels: Vec<Panel> = Vec::new();

    for piece in sorted {
        if let Some(fit) = best_fit(&panels, piece, usable) {
            place(&mut panels, piece, fit, kerf);
            continue;
        }

        // No room anywhere: open a fresh panel and retry against it alone.
        let mut panel = Panel::new(usable);
        match best_fit(std::slice::from_ref(&panel), piece, usable) {
            Some(mut fit) => {
                fit.panel = panels.len();
                panels.push(panel);
                place(&mut panels, piece, fit, kerf);
            }
            None => {
                // Exceeds the usable area in both orientations. Flag it and
                // keep going so the rest of the project still gets a plan.
                // The panel stays dedicated to the flagged piece: no free
                // rectangles, so later pieces cannot land on top of it.
                panel.free_rects.clear();
                panel.placements.push(Placement {
                    module_name: piece.module_name.clone(),
                    part_name: piece.part_name.clone(),
                    x: 0.0,
                    y: 0.0,
                    rotated: false,
                    placed_width: piece.width,
                    placed_height: piece.height,
                    panel_index: 0,
                    error: Some(TOO_LARGE_FOR_PANEL.to_string()),
                });
                panels.push(panel);
            }
        }
    }

    let panel_count = panels.len() as u32;
    let mut placements = Vec::new();
    for (index, panel) in panels.into_iter().enumerate() {
        for mut placement in panel.placements {
            placement.panel_index = index;
            placements.push(placement);
        }
    }

    PackResult {
        panel_count,
        placements,
    }
}

/// Scans every free rectangle of every panel, in both orientations, and
/// returns the feasible fit with the smallest short-side leftover. Strict
/// comparison keeps the first candidate on ties, so iteration order
/// (panels in creation order, unrotated before rotated, rects in list
/// order) is part of the contract.
fn best_fit(panels: &[Panel], piece: &Piece, usable: UsableArea) -> Option<Fit> {
    let mut best: Option<Fit> = None;

    for (panel_idx, panel) in panels.iter().enumerate() {
        for (width, height, rotated) in [
            (piece.width, piece.height, false),
            (piece.height, piece.width, true),
        ] {
            if width > usable.width || height > usable.height {
                continue;
            }

            for (rect_idx, rect) in panel.free_rects.iter().enumerate() {
                if width <= rect.width && height <= rect.height {
                    let short_side = (rect.width - width).min(rect.height - height);
                    if best.as_ref().map_or(true, |b| short_side < b.short_side) {
                        best = Some(Fit {
                            panel: panel_idx,
                            rect: rect_idx,
                            width,
                            height,
                            rotated,
                            short_side,
                        });
                    }
                }
            }
        }
    }

    best
}

/// Records the placement and splits the consumed free rectangle.
fn place(panels: &mut [Panel], piece: &Piece, fit: Fit, kerf: f64) {
    let panel = &mut panels[fit.panel];
    let rect = panel.free_rects.remove(fit.rect);

    panel.placements.push(Placement {
        module_name: piece.module_name.clone(),
        part_name: piece.part_name.clone(),
        x: rect.x,
        y: rect.y,
        rotated: fit.rotated,
        placed_width: fit.width,
        placed_height: fit.height,
        panel_index: 0, // assigned when results are flattened
        error: None,
    });

    // Reserve the saw kerf alongside the piece so the next placement does
    // not land on the cut line.
    let placed_w = fit.width + kerf;
    let placed_h = fit.height + kerf;

    if rect.width - placed_w > 0.0 {
        panel.free_rects.push(FreeRect {
            x: rect.x + placed_w,
            y: rect.y,
            width: rect.width - placed_w,
            height: rect.height,
        });
    }

    // The bottom remainder spans only the placed width, not the full rect:
    // the split stays a guillotine cut rather than a shelf.
    if rect.height - placed_h > 0.0 {
        panel.free_rects.push(FreeRect {
            x: rect.x,
            y: rect.y + placed_h,
            width: fit.width,
            height: rect.height - placed_h,
        });
    }

    prune_free_rects(&mut panel.free_rects);
}

/// Drops free rectangles fully contained in another, then orders the list
/// top-left first. Adjacent rectangles are deliberately not merged; the
/// plan output depends on this exact fragmentation behavior.
fn prune_free_rects(rects: &mut Vec<FreeRect>) {
    let mut i = rects.len();
    while i > 0 {
        i -= 1;
        if (0..rects.len()).any(|j| j != i && rects[j].contains(&rects[i])) {
            rects.remove(i);
        }
    }

    rects.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });
}
