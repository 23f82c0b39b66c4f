use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Default stock sheet size (mm) - a standard MDF panel.
pub const DEFAULT_STOCK_WIDTH: f64 = 2600.0;
pub const DEFAULT_STOCK_HEIGHT: f64 = 1830.0;
/// Border discarded on every side of the sheet (warped/damaged edges).
pub const DEFAULT_DISCARD_MARGIN: f64 = 15.0;
/// Material removed by the saw blade at each cut.
pub const DEFAULT_KERF_WIDTH: f64 = 3.0;

/// Error string carried by placements whose piece cannot fit an empty panel.
pub const TOO_LARGE_FOR_PANEL: &str = "Too large for panel";

/// Material thickness in canonical form: integer tenths of a millimeter.
///
/// Raw thickness values come in as f64 (often via JSON keys); rounding to
/// tenths keeps 18.0 and 18.000001 in the same group instead of fragmenting
/// groups on float noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Thickness(i64);

impl Thickness {
    pub fn from_mm(mm: f64) -> Self {
        Thickness((mm * 10.0).round() as i64)
    }

    pub fn as_mm(self) -> f64 {
        self.0 as f64 / 10.0
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 10 == 0 {
            write!(f, "{}", self.0 / 10)
        } else {
            write!(f, "{:.1}", self.as_mm())
        }
    }
}

impl Serialize for Thickness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct ThicknessVisitor;

impl Visitor<'_> for ThicknessVisitor {
    type Value = Thickness;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a thickness in millimeters (number or numeric string)")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Thickness, E> {
        Ok(Thickness::from_mm(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Thickness, E> {
        Ok(Thickness::from_mm(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Thickness, E> {
        Ok(Thickness::from_mm(value as f64))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Thickness, E> {
        value
            .parse::<f64>()
            .map(Thickness::from_mm)
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }
}

impl<'de> Deserialize<'de> for Thickness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ThicknessVisitor)
    }
}

/// A parts-list entry: one rectangular piece shape and how many are needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub module_name: String,
    pub part_name: String,
    pub quantity: u32,
    pub width: f64,
    pub height: f64,
    /// Thickness in millimeters. Pieces of different thickness never share
    /// a stock panel.
    pub thickness: f64,
}

/// One individual piece to cut, produced by expanding a `Part`'s quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub module_name: String,
    pub part_name: String,
    pub width: f64,
    pub height: f64,
    pub thickness: Thickness,
}

/// Stock panel dimensions minus the discard margin on all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsableArea {
    pub width: f64,
    pub height: f64,
}

/// Raw stock sheet dimensions, echoed in the result for diagram rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockSize {
    pub width: f64,
    pub height: f64,
}

/// Where a piece ended up: panel, position, orientation.
///
/// `placed_width`/`placed_height` are the post-rotation footprint, so a
/// consumer can draw the cutting diagram without re-deriving orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub module_name: String,
    pub part_name: String,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
    pub placed_width: f64,
    pub placed_height: f64,
    pub panel_index: usize,
    /// Set for pieces that do not fit an empty panel in either orientation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Placement {
    pub fn is_oversized(&self) -> bool {
        self.error.is_some()
    }
}

/// Output of packing a single thickness group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackResult {
    pub panel_count: u32,
    pub placements: Vec<Placement>,
}

/// Project-level settings. Every field has a default so a bare parts list
/// is a valid request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSettings {
    #[serde(default = "default_stock_width")]
    pub stock_width: f64,
    #[serde(default = "default_stock_height")]
    pub stock_height: f64,
    #[serde(default = "default_discard_margin")]
    pub discard_margin: f64,
    #[serde(default = "default_kerf_width")]
    pub kerf_width: f64,
    /// Price per whole stock panel, keyed by thickness. Missing key = free.
    #[serde(default)]
    pub panel_prices: BTreeMap<Thickness, f64>,
}

fn default_stock_width() -> f64 {
    DEFAULT_STOCK_WIDTH
}

fn default_stock_height() -> f64 {
    DEFAULT_STOCK_HEIGHT
}

fn default_discard_margin() -> f64 {
    DEFAULT_DISCARD_MARGIN
}

fn default_kerf_width() -> f64 {
    DEFAULT_KERF_WIDTH
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            stock_width: DEFAULT_STOCK_WIDTH,
            stock_height: DEFAULT_STOCK_HEIGHT,
            discard_margin: DEFAULT_DISCARD_MARGIN,
            kerf_width: DEFAULT_KERF_WIDTH,
            panel_prices: BTreeMap::new(),
        }
    }
}

impl PlanSettings {
    pub fn usable_area(&self) -> UsableArea {
        UsableArea {
            width: self.stock_width - self.discard_margin * 2.0,
            height: self.stock_height - self.discard_margin * 2.0,
        }
    }

    pub fn stock_size(&self) -> StockSize {
        StockSize {
            width: self.stock_width,
            height: self.stock_height,
        }
    }

    pub fn price_for(&self, thickness: Thickness) -> f64 {
        self.panel_prices.get(&thickness).copied().unwrap_or(0.0)
    }
}

/// Input: the full parts list plus project settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub settings: PlanSettings,
    pub parts: Vec<Part>,
}

/// Packing outcome for one thickness group, with usage and cost figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPlan {
    pub panel_count: u32,
    /// Number of individual pieces in this group (sum of part quantities).
    pub part_count: u32,
    pub placements: Vec<Placement>,
    pub price_per_panel: f64,
    /// Whole-panel billing: `panel_count * price_per_panel`.
    pub cost: f64,
    /// Sum of placed footprints, kerf excluded.
    pub used_area: f64,
    pub total_panel_area: f64,
    pub usage_percent: f64,
    /// Fractional billing: charge only for the area consumed.
    pub proportional_cost: f64,
}

/// Full cutting plan for a project: one `GroupPlan` per thickness plus
/// grand totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub by_thickness: BTreeMap<Thickness, GroupPlan>,
    pub total_panels: u32,
    pub total_cost: f64,
    pub total_proportional_cost: f64,
    pub total_used_area: f64,
    pub total_panel_area: f64,
    pub overall_usage_percent: f64,
    pub usable: UsableArea,
    pub stock: StockSize,
}

/// Error type for plan requests.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;
