mod engine;
mod types;

pub use engine::{
    derive_metrics, finite_amount_items, general_expenses, profit, resource_totals,
    resources_expense_per_unit, resources_residual_profit, sales_revenue,
};
pub use types::{CONFIG_ID, CraftingConfig, DEFAULT_RETURN_PERCENT, DerivedMetrics, ResourceCost};
