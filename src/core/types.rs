use serde::{Deserialize, Serialize};

/// Stable identifier carried by every stored record.
pub const CONFIG_ID: &str = "1";

/// Return-percent preset shipped with a fresh record.
pub const DEFAULT_RETURN_PERCENT: f64 = 24.8;

const DEFAULT_RESOURCE_LINES: usize = 2;

/// One raw-material line: unit price and quantity consumed per crafted item.
/// The artifact consumed per finished item has the same shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub price: f64,
    pub amount: f64,
}

/// The canonical input record. Serialized with camelCase keys, the shape the
/// calculator has always stored its snapshots in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftingConfig {
    pub id: String,
    /// Ordered and index-addressed; position is the only identity a line has.
    pub resources: Vec<ResourceCost>,
    pub artifact: ResourceCost,
    pub factory_price: f64,
    pub realization_price: f64,
    /// Selected return rate; when set it is a member of `return_percent_list`.
    pub return_percent: Option<f64>,
    /// Distinct presets in (0, 100), kept sorted ascending.
    pub return_percent_list: Vec<f64>,
    pub initial_amount_items: f64,
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            id: CONFIG_ID.to_string(),
            resources: vec![ResourceCost::default(); DEFAULT_RESOURCE_LINES],
            artifact: ResourceCost::default(),
            factory_price: 0.0,
            realization_price: 0.0,
            return_percent: Some(DEFAULT_RETURN_PERCENT),
            return_percent_list: vec![DEFAULT_RETURN_PERCENT],
            initial_amount_items: 0.0,
        }
    }
}

/// Values recomputed in full from a `CraftingConfig`; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub finite_amount_items: f64,
    pub whole_items: f64,
    pub resources_expense_per_unit: f64,
    /// Batch quantity required of each resource line, index-aligned.
    pub resource_totals: Vec<f64>,
    pub general_expenses: f64,
    pub profit: f64,
    pub resources_residual_profit: f64,
    pub total_profit: f64,
}
