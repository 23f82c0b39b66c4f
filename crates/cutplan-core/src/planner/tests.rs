use super::*;
use crate::types::*;

fn piece(width: f64, height: f64) -> Piece {
    Piece {
        module_name: "Cabinet".to_string(),
        part_name: "Panel".to_string(),
        width,
        height,
        thickness: Thickness::from_mm(18.0),
    }
}

fn part(name: &str, quantity: u32, width: f64, height: f64, thickness: f64) -> Part {
    Part {
        module_name: "Cabinet".to_string(),
        part_name: name.to_string(),
        quantity,
        width,
        height,
        thickness,
    }
}

fn default_usable() -> UsableArea {
    PlanSettings::default().usable_area()
}

fn overlaps(a: &Placement, b: &Placement) -> bool {
    a.x < b.x + b.placed_width
        && b.x < a.x + a.placed_width
        && a.y < b.y + b.placed_height
        && b.y < a.y + a.placed_height
}

#[test]
fn single_piece_picks_tighter_rotation() {
    // Unrotated leftover short side is 1400, rotated is 1200, so the
    // best-short-side-fit places even a lone piece rotated.
    let result = pack_group(&[piece(600.0, 400.0)], default_usable(), 3.0);

    assert_eq!(result.panel_count, 1);
    assert_eq!(result.placements.len(), 1);

    let p = &result.placements[0];
    assert_eq!(p.x, 0.0);
    assert_eq!(p.y, 0.0);
    assert!(p.rotated);
    assert_eq!(p.placed_width, 400.0);
    assert_eq!(p.placed_height, 600.0);
    assert_eq!(p.panel_index, 0);
    assert!(p.error.is_none());
}

#[test]
fn oversized_pieces_get_flagged_panels() {
    // 3000 mm exceeds the usable width, and rotating it exceeds the usable
    // height. Each piece lands on its own panel with the error marker.
    let pieces = vec![piece(3000.0, 100.0), piece(3000.0, 100.0)];
    let result = pack_group(&pieces, default_usable(), 3.0);

    assert_eq!(result.panel_count, 2);
    assert_eq!(result.placements.len(), 2);
    for (index, p) in result.placements.iter().enumerate() {
        assert_eq!(p.error.as_deref(), Some(TOO_LARGE_FOR_PANEL));
        assert!(p.is_oversized());
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
        assert!(!p.rotated);
        assert_eq!(p.placed_width, 3000.0);
        assert_eq!(p.placed_height, 100.0);
        assert_eq!(p.panel_index, index);
    }
}

#[test]
fn squares_fill_a_grid_then_overflow() {
    // 1700x1800 usable with kerf 3 holds a 2x2 grid of 800 squares; the
    // fifth opens a second panel. Squares gain nothing from rotation, so
    // the orientation flag stays false throughout.
    let usable = UsableArea {
        width: 1700.0,
        height: 1800.0,
    };
    let pieces: Vec<Piece> = (0..5).map(|_| piece(800.0, 800.0)).collect();
    let result = pack_group(&pieces, usable, 3.0);

    assert_eq!(result.panel_count, 2);
    assert_eq!(result.placements.len(), 5);
    assert!(result.placements.iter().all(|p| !p.rotated));

    let positions: Vec<(usize, f64, f64)> = result
        .placements
        .iter()
        .map(|p| (p.panel_index, p.x, p.y))
        .collect();
    assert_eq!(
        positions,
        vec![
            (0, 0.0, 0.0),
            (0, 0.0, 803.0),
            (0, 803.0, 0.0),
            (0, 803.0, 803.0),
            (1, 0.0, 0.0),
        ]
    );
}

#[test]
fn empty_input_yields_empty_plan() {
    let result = pack_group(&[], default_usable(), 3.0);
    assert_eq!(result.panel_count, 0);
    assert!(result.placements.is_empty());
}

#[test]
fn expand_preserves_order_and_grouping_is_stable() {
    let parts = vec![
        part("Side", 3, 600.0, 720.0, 18.0),
        part("Top", 2, 568.0, 560.0, 18.0),
    ];

    let groups = group_by_thickness(&parts);
    assert_eq!(groups.len(), 1);

    let group = &groups[&Thickness::from_mm(18.0)];
    let pieces = expand_parts(group);
    assert_eq!(pieces.len(), 5);
    assert!(pieces[..3].iter().all(|p| p.part_name == "Side"));
    assert!(pieces[3..].iter().all(|p| p.part_name == "Top"));
}

#[test]
fn zero_quantity_expands_to_nothing() {
    let parts = vec![
        part("Side", 0, 600.0, 720.0, 18.0),
        part("Top", 1, 568.0, 560.0, 18.0),
    ];

    let pieces = expand_parts(&parts);
    assert_eq!(pieces.len(), 1);
    assert_eq!(pieces[0].part_name, "Top");
}

#[test]
fn thickness_canonicalization_collapses_float_noise() {
    assert_eq!(Thickness::from_mm(18.0), Thickness::from_mm(18.0000001));
    assert_ne!(Thickness::from_mm(5.5), Thickness::from_mm(5.0));
    assert_ne!(Thickness::from_mm(5.5), Thickness::from_mm(6.0));
    assert_eq!(Thickness::from_mm(18.0).to_string(), "18");
    assert_eq!(Thickness::from_mm(5.5).to_string(), "5.5");
}

#[test]
fn thickness_prices_deserialize_from_json_keys() {
    let settings: PlanSettings =
        serde_json::from_str(r#"{"panel_prices": {"18": 50.0, "5.5": 20.0}}"#).unwrap();

    assert_eq!(settings.price_for(Thickness::from_mm(18.0)), 50.0);
    assert_eq!(settings.price_for(Thickness::from_mm(5.5)), 20.0);
    assert_eq!(settings.price_for(Thickness::from_mm(3.0)), 0.0);
    // Defaults still apply to the omitted fields.
    assert_eq!(settings.stock_width, DEFAULT_STOCK_WIDTH);
    assert_eq!(settings.kerf_width, DEFAULT_KERF_WIDTH);
}

fn realistic_parts() -> Vec<Part> {
    vec![
        part("Side Panel", 2, 560.0, 720.0, 18.0),
        part("Top Panel", 1, 564.0, 560.0, 18.0),
        part("Base Panel", 1, 564.0, 560.0, 18.0),
        part("Shelf", 3, 564.0, 540.0, 18.0),
        part("Door", 2, 298.0, 717.0, 18.0),
        part("Back Panel", 1, 600.0, 720.0, 3.0),
        part("Drawer Bottom", 2, 510.0, 450.0, 3.0),
        part("Drawer Side", 4, 450.0, 120.0, 5.5),
        part("Drawer Front", 2, 486.0, 120.0, 5.5),
    ]
}

#[test]
fn placements_never_overlap_and_stay_inside_usable_area() {
    let usable = default_usable();

    for (_, parts) in group_by_thickness(&realistic_parts()) {
        let pieces = expand_parts(&parts);
        let result = pack_group(&pieces, usable, 3.0);

        let placed: Vec<&Placement> = result
            .placements
            .iter()
            .filter(|p| !p.is_oversized())
            .collect();

        for p in &placed {
            assert!(p.x >= 0.0 && p.y >= 0.0);
            assert!(p.x + p.placed_width <= usable.width + 1e-9);
            assert!(p.y + p.placed_height <= usable.height + 1e-9);
        }

        for (i, a) in placed.iter().enumerate() {
            for b in placed.iter().skip(i + 1) {
                if a.panel_index == b.panel_index {
                    assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
                }
            }
        }
    }
}

#[test]
fn every_piece_gets_exactly_one_placement() {
    let parts = realistic_parts();
    let expected: u32 = parts.iter().map(|p| p.quantity).sum();

    let planner = Planner::new(PlanRequest {
        settings: PlanSettings::default(),
        parts,
    })
    .unwrap();
    let result = planner.plan().unwrap();

    let placed: usize = result
        .by_thickness
        .values()
        .map(|g| g.placements.len())
        .sum();
    assert_eq!(placed as u32, expected);
}

#[test]
fn identical_input_yields_identical_plan() {
    let request = PlanRequest {
        settings: PlanSettings::default(),
        parts: realistic_parts(),
    };

    let first = Planner::new(request.clone()).unwrap().plan().unwrap();
    let second = Planner::new(request).unwrap().plan().unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn groups_are_packed_in_isolation() {
    let planner = Planner::new(PlanRequest {
        settings: PlanSettings::default(),
        parts: realistic_parts(),
    })
    .unwrap();
    let result = planner.plan().unwrap();

    assert_eq!(result.by_thickness.len(), 3);
    // Panel indices restart at zero for every thickness group.
    for group in result.by_thickness.values() {
        assert!(group.panel_count >= 1);
        assert!(group.placements.iter().any(|p| p.panel_index == 0));
        assert!(group
            .placements
            .iter()
            .all(|p| (p.panel_index as u32) < group.panel_count));
    }
    assert_eq!(
        result.total_panels,
        result.by_thickness.values().map(|g| g.panel_count).sum::<u32>()
    );
}

#[test]
fn usage_stays_within_bounds() {
    let planner = Planner::new(PlanRequest {
        settings: PlanSettings::default(),
        parts: realistic_parts(),
    })
    .unwrap();
    let result = planner.plan().unwrap();

    for group in result.by_thickness.values() {
        assert!(group.used_area <= group.total_panel_area);
        assert!((0.0..=100.0).contains(&group.usage_percent));
    }
    assert!(result.total_used_area <= result.total_panel_area);
    assert!((0.0..=100.0).contains(&result.overall_usage_percent));
}

#[test]
fn costs_follow_panel_count_and_consumed_area() {
    let mut settings = PlanSettings::default();
    settings.panel_prices.insert(Thickness::from_mm(18.0), 50.0);

    let planner = Planner::new(PlanRequest {
        settings,
        parts: vec![part("Worktop", 2, 1000.0, 1000.0, 18.0)],
    })
    .unwrap();
    let result = planner.plan().unwrap();

    let group = &result.by_thickness[&Thickness::from_mm(18.0)];
    assert_eq!(group.panel_count, 1);
    assert_eq!(group.part_count, 2);
    assert_eq!(group.cost, 50.0);

    let panel_area = result.usable.width * result.usable.height;
    let expected_proportional = 2_000_000.0 / panel_area * 50.0;
    assert!((group.proportional_cost - expected_proportional).abs() < 1e-9);
    assert!((group.usage_percent - 2_000_000.0 / panel_area * 100.0).abs() < 1e-9);

    assert_eq!(result.total_cost, 50.0);
    assert!((result.total_proportional_cost - expected_proportional).abs() < 1e-9);
}

#[test]
fn empty_parts_list_is_a_valid_request() {
    let planner = Planner::new(PlanRequest {
        settings: PlanSettings::default(),
        parts: vec![],
    })
    .unwrap();
    let result = planner.plan().unwrap();

    assert!(result.by_thickness.is_empty());
    assert_eq!(result.total_panels, 0);
    assert_eq!(result.overall_usage_percent, 0.0);
}

#[test]
fn unusable_stock_is_rejected() {
    let request = PlanRequest {
        settings: PlanSettings {
            discard_margin: 1300.0,
            ..PlanSettings::default()
        },
        parts: vec![],
    };

    assert!(matches!(
        Planner::new(request),
        Err(PlanError::InvalidInput(_))
    ));
}

#[test]
fn degenerate_part_dimensions_are_rejected() {
    let request = PlanRequest {
        settings: PlanSettings::default(),
        parts: vec![part("Ghost", 1, 0.0, 500.0, 18.0)],
    };

    assert!(matches!(
        Planner::new(request),
        Err(PlanError::InvalidInput(_))
    ));

    let request = PlanRequest {
        settings: PlanSettings {
            kerf_width: -1.0,
            ..PlanSettings::default()
        },
        parts: vec![],
    };
    assert!(matches!(
        Planner::new(request),
        Err(PlanError::InvalidInput(_))
    ));
}

#[test]
fn request_without_settings_uses_defaults() {
    let request: PlanRequest = serde_json::from_str(
        r#"{
            "parts": [
                {"module_name": "M", "part_name": "Side", "quantity": 1,
                 "width": 600.0, "height": 400.0, "thickness": 18}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(request.settings.stock_width, DEFAULT_STOCK_WIDTH);
    assert_eq!(request.settings.stock_height, DEFAULT_STOCK_HEIGHT);
    assert_eq!(request.settings.discard_margin, DEFAULT_DISCARD_MARGIN);
    assert_eq!(request.settings.kerf_width, DEFAULT_KERF_WIDTH);

    let result = Planner::new(request).unwrap().plan().unwrap();
    assert_eq!(result.total_panels, 1);
    assert_eq!(result.stock.width, DEFAULT_STOCK_WIDTH);
    assert_eq!(result.usable.width, DEFAULT_STOCK_WIDTH - 30.0);
}

#[test]
fn oversized_pieces_still_count_in_totals() {
    let planner = Planner::new(PlanRequest {
        settings: PlanSettings::default(),
        parts: vec![
            part("Giant", 1, 3000.0, 2000.0, 18.0),
            part("Shelf", 1, 564.0, 540.0, 18.0),
        ],
    })
    .unwrap();
    let result = planner.plan().unwrap();

    let group = &result.by_thickness[&Thickness::from_mm(18.0)];
    assert_eq!(group.placements.len(), 2);
    assert_eq!(group.panel_count, 2);
    assert_eq!(
        group
            .placements
            .iter()
            .filter(|p| p.is_oversized())
            .count(),
        1
    );
}
