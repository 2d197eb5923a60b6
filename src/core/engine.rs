use super::types::{CraftingConfig, DerivedMetrics, ResourceCost};

/// Fixed fee withheld from every realized sale.
const REALIZATION_FEE: f64 = 0.065;

/// A return rate of 1 never lets the recovery loop converge; rates at or
/// above it are capped here.
const MAX_RETURN_RATE: f64 = 0.999;

/// Recomputes every derived value from the full input record, in dependency
/// order. Recomputation is total: nothing is carried over between calls.
pub fn derive_metrics(config: &CraftingConfig) -> DerivedMetrics {
    let finite_amount_items = finite_amount_items(
        config.initial_amount_items,
        config.return_percent.unwrap_or(0.0),
    );
    let resources_expense_per_unit = resources_expense_per_unit(&config.resources);
    let resource_totals = resource_totals(&config.resources, config.initial_amount_items);
    let general_expenses = general_expenses(
        resources_expense_per_unit,
        config.initial_amount_items,
        config.artifact,
        finite_amount_items,
        config.factory_price,
    );
    let profit = profit(finite_amount_items, config.realization_price, general_expenses);
    let resources_residual_profit =
        resources_residual_profit(finite_amount_items, resources_expense_per_unit);

    DerivedMetrics {
        finite_amount_items,
        whole_items: finite_amount_items.floor(),
        resources_expense_per_unit,
        resource_totals,
        general_expenses,
        profit,
        resources_residual_profit,
        total_profit: profit + resources_residual_profit,
    }
}

/// Total items obtainable from a batch once recovered resources are recrafted.
///
/// Each craft returns `return_percent` of its resources, which are themselves
/// recraftable; rounds are accumulated while they yield at least one whole
/// unit, and the first sub-unit round is added once as leftover material
/// rather than a further craft. `return_percent` of 0 yields the batch size
/// exactly.
pub fn finite_amount_items(initial_amount_items: f64, return_percent: f64) -> f64 {
    let batch = sanitize(initial_amount_items);
    let rate = return_rate(return_percent);

    let mut total = batch;
    let mut recovered = batch * rate;
    while recovered >= 1.0 {
        total += recovered;
        recovered *= rate;
    }

    total + recovered
}

/// Cost of the raw material consumed by one crafted item.
pub fn resources_expense_per_unit(resources: &[ResourceCost]) -> f64 {
    resources.iter().map(|res| res.price * res.amount).sum()
}

/// Batch quantity required of each resource line, index-aligned.
pub fn resource_totals(resources: &[ResourceCost], initial_amount_items: f64) -> Vec<f64> {
    resources
        .iter()
        .map(|res| res.amount * initial_amount_items)
        .collect()
}

/// Total cost of a batch: raw material for the whole batch, plus artifact and
/// factory cost for each whole finished item. The fractional remainder from
/// recovered resources consumes neither.
pub fn general_expenses(
    resources_expense_per_unit: f64,
    initial_amount_items: f64,
    artifact: ResourceCost,
    finite_amount_items: f64,
    factory_price: f64,
) -> f64 {
    let whole_items = finite_amount_items.floor();
    resources_expense_per_unit * initial_amount_items
        + artifact.price * artifact.amount * whole_items
        + whole_items * factory_price
}

/// Gross proceeds from selling every whole finished item, net of the
/// realization fee.
pub fn sales_revenue(finite_amount_items: f64, realization_price: f64) -> f64 {
    finite_amount_items.floor() * (realization_price - realization_price * REALIZATION_FEE)
}

pub fn profit(finite_amount_items: f64, realization_price: f64, general_expenses: f64) -> f64 {
    sales_revenue(finite_amount_items, realization_price) - general_expenses
}

/// Value of the leftover fractional material that never became a whole item,
/// priced at raw-material cost.
pub fn resources_residual_profit(
    finite_amount_items: f64,
    resources_expense_per_unit: f64,
) -> f64 {
    (finite_amount_items - finite_amount_items.floor()) * resources_expense_per_unit
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn return_rate(return_percent: f64) -> f64 {
    if !return_percent.is_finite() || return_percent <= 0.0 {
        return 0.0;
    }
    (return_percent / 100.0).min(MAX_RETURN_RATE)
}
