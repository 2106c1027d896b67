//! Consolidated costing engine for catalog products and orders.
//!
//! Every form in the old system carried its own inline copy of this math and
//! the copies had drifted apart; here it lives once, as pure functions over
//! `rust_decimal` values, and every service goes through it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

pub mod stages;

pub use stages::{job_card_status, stage_gate, GatePolicy, JobStatus, Stage};

/// Divisor converting a fabric area in square inches over a roll width in
/// inches into linear meters of roll material (39.39 inches per meter).
pub const INCHES_PER_METER: Decimal = dec!(39.39);

/// Decimal places kept on derived consumption values.
pub const CONSUMPTION_DP: u32 = 4;

/// Decimal places kept on derived money values (costs, rates, margin).
pub const MONEY_DP: u32 = 2;

/// How a component's base consumption is computed from its dimensions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Formula {
    /// `(length x width) / (roll_width x 39.39)` linear meters.
    Standard,
    /// `length / 39.39` linear meters; width and roll width are ignored.
    Linear,
}

/// Consumption of a single component, either derived from its dimensions or
/// pinned by hand.
///
/// A `Manual` value is authoritative: dimension edits never overwrite it.
/// The old boolean-plus-nullable-column encoding allowed a "manual" row with
/// no value; the enum makes that state unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum Consumption {
    Computed(Formula),
    Manual(Decimal),
}

impl Consumption {
    /// Reassembles the enum from the two persisted columns
    /// (`formula`, `consumption`).
    pub fn from_columns(formula: &str, stored: Option<Decimal>) -> Result<Self, String> {
        match formula {
            "manual" => stored
                .map(Consumption::Manual)
                .ok_or_else(|| "manual consumption requires a stored value".to_string()),
            other => other
                .parse::<Formula>()
                .map(Consumption::Computed)
                .map_err(|_| format!("unknown consumption formula '{}'", other)),
        }
    }

    /// The `formula` column value for this variant.
    pub fn formula_column(&self) -> &'static str {
        match self {
            Consumption::Computed(Formula::Standard) => "standard",
            Consumption::Computed(Formula::Linear) => "linear",
            Consumption::Manual(_) => "manual",
        }
    }

    /// Resolves to a concrete per-unit consumption, if the inputs allow one.
    pub fn resolve(&self, dims: &Dimensions) -> Option<Decimal> {
        match self {
            Consumption::Computed(formula) => derive_consumption(*formula, dims),
            Consumption::Manual(value) => Some(*value),
        }
    }
}

/// Component dimensions in inches. Any of the three may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub roll_width: Option<Decimal>,
}

impl Dimensions {
    pub fn new(
        length: Option<Decimal>,
        width: Option<Decimal>,
        roll_width: Option<Decimal>,
    ) -> Self {
        Self {
            length,
            width,
            roll_width,
        }
    }
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| v.is_sign_positive() && !v.is_zero())
}

/// Base (per-unit) material consumption in linear meters.
///
/// Returns `None` when a required input is missing or non-positive; the UI
/// convention this preserves is a blank field, not an error.
pub fn derive_consumption(formula: Formula, dims: &Dimensions) -> Option<Decimal> {
    let length = positive(dims.length)?;
    let meters = match formula {
        Formula::Standard => {
            let width = positive(dims.width)?;
            let roll_width = positive(dims.roll_width)?;
            (length * width) / (roll_width * INCHES_PER_METER)
        }
        Formula::Linear => length / INCHES_PER_METER,
    };
    Some(meters.round_dp(CONSUMPTION_DP))
}

/// Scales a per-unit consumption by an order or catalog quantity.
///
/// Applied as a separate step after the base formula so a manual override
/// still scales with quantity.
pub fn scale_consumption(unit_consumption: Decimal, quantity: i32) -> Decimal {
    (unit_consumption * Decimal::from(quantity)).round_dp(CONSUMPTION_DP)
}

/// Material cost contribution of one component: consumption times the
/// material's unit rate. `None` when either side is unknown.
pub fn component_material_cost(
    consumption: Option<Decimal>,
    material_rate: Option<Decimal>,
) -> Option<Decimal> {
    Some((consumption? * material_rate?).round_dp(MONEY_DP))
}

/// Fixed per-unit charges applied on top of material cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FixedCharges {
    pub cutting: Decimal,
    pub printing: Decimal,
    pub stitching: Decimal,
    pub transport: Decimal,
}

/// Aggregated cost figures for a product or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CostBreakdown {
    pub material_cost: Decimal,
    pub total_cost: Decimal,
}

/// Sums component material costs and folds in the fixed charges.
pub fn derive_costs<I>(charges: &FixedCharges, component_costs: I) -> CostBreakdown
where
    I: IntoIterator<Item = Decimal>,
{
    let material_cost: Decimal = component_costs.into_iter().sum();
    let material_cost = material_cost.round_dp(MONEY_DP);
    let total_cost =
        (charges.cutting + charges.printing + charges.stitching + charges.transport + material_cost)
            .round_dp(MONEY_DP);
    CostBreakdown {
        material_cost,
        total_cost,
    }
}

/// Which pricing field the caller supplied. The reconciliation is
/// one-directional per edit: the supplied field is taken as-is and the other
/// is recomputed from it. The two are never maintained as a bidirectional
/// invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PricingEdit {
    SellingRate(Decimal),
    Margin(Decimal),
}

impl PricingEdit {
    /// Interprets the optional request fields. Exactly one of the two may be
    /// supplied per edit; supplying both is rejected rather than guessing
    /// which one the caller meant.
    pub fn from_options(
        selling_rate: Option<Decimal>,
        margin: Option<Decimal>,
    ) -> Result<Option<Self>, String> {
        match (selling_rate, margin) {
            (Some(_), Some(_)) => Err(
                "supply either selling_rate or margin, not both; the other is derived".to_string(),
            ),
            (Some(rate), None) => Ok(Some(PricingEdit::SellingRate(rate))),
            (None, Some(margin)) => Ok(Some(PricingEdit::Margin(margin))),
            (None, None) => Ok(None),
        }
    }
}

/// Reconciled selling rate and margin after a pricing edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pricing {
    pub selling_rate: Decimal,
    /// Percentage over total cost. `None` when total cost is zero, where a
    /// margin is undefined.
    pub margin: Option<Decimal>,
}

/// Recomputes the counterpart of the edited pricing field.
///
/// Editing the selling rate derives `margin = (rate - cost) / cost * 100`;
/// editing the margin derives `rate = cost * (1 + margin / 100)`.
pub fn reconcile(total_cost: Decimal, edit: PricingEdit) -> Pricing {
    match edit {
        PricingEdit::SellingRate(rate) => {
            let margin = if total_cost.is_zero() {
                None
            } else {
                Some(((rate - total_cost) / total_cost * dec!(100)).round_dp(MONEY_DP))
            };
            Pricing {
                selling_rate: rate,
                margin,
            }
        }
        PricingEdit::Margin(margin) => {
            let selling_rate =
                (total_cost * (Decimal::ONE + margin / dec!(100))).round_dp(MONEY_DP);
            Pricing {
                selling_rate,
                margin: Some(margin),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(length: &str, width: &str, roll_width: &str) -> Dimensions {
        Dimensions::new(
            Some(length.parse().unwrap()),
            Some(width.parse().unwrap()),
            Some(roll_width.parse().unwrap()),
        )
    }

    #[test]
    fn standard_formula_matches_reference_example() {
        // 40 x 24 over a 30in roll -> (40*24)/(30*39.39)
        let got = derive_consumption(Formula::Standard, &dims("40", "24", "30")).unwrap();
        let expected = (dec!(40) * dec!(24)) / (dec!(30) * INCHES_PER_METER);
        assert_eq!(got, expected.round_dp(CONSUMPTION_DP));
        assert_eq!(got, dec!(0.8124));
    }

    #[test]
    fn linear_formula_ignores_width_and_roll() {
        let with_all = derive_consumption(Formula::Linear, &dims("78.78", "24", "30")).unwrap();
        let without = derive_consumption(
            Formula::Linear,
            &Dimensions::new(Some(dec!(78.78)), None, None),
        )
        .unwrap();
        assert_eq!(with_all, without);
        assert_eq!(with_all, dec!(2.0000));
    }

    #[test]
    fn missing_or_nonpositive_inputs_yield_none() {
        let mut d = dims("40", "24", "30");
        d.roll_width = None;
        assert_eq!(derive_consumption(Formula::Standard, &d), None);

        let zero = Dimensions::new(Some(dec!(0)), Some(dec!(24)), Some(dec!(30)));
        assert_eq!(derive_consumption(Formula::Standard, &zero), None);

        let negative = Dimensions::new(Some(dec!(40)), Some(dec!(-24)), Some(dec!(30)));
        assert_eq!(derive_consumption(Formula::Standard, &negative), None);
    }

    #[test]
    fn manual_consumption_is_authoritative() {
        let manual = Consumption::Manual(dec!(1.25));
        // Dimensions that would otherwise derive a different value.
        assert_eq!(manual.resolve(&dims("40", "24", "30")), Some(dec!(1.25)));
        // And resolves even with no dimensions at all.
        assert_eq!(manual.resolve(&Dimensions::default()), Some(dec!(1.25)));
    }

    #[test]
    fn consumption_round_trips_through_columns() {
        let manual = Consumption::from_columns("manual", Some(dec!(2.5))).unwrap();
        assert_eq!(manual, Consumption::Manual(dec!(2.5)));
        assert_eq!(manual.formula_column(), "manual");

        let standard = Consumption::from_columns("standard", None).unwrap();
        assert_eq!(standard, Consumption::Computed(Formula::Standard));

        assert!(Consumption::from_columns("manual", None).is_err());
        assert!(Consumption::from_columns("cubic", None).is_err());
    }

    #[test]
    fn scaling_is_a_separate_multiplicative_step() {
        assert_eq!(scale_consumption(dec!(5), 100), dec!(500.0000));
        assert_eq!(scale_consumption(dec!(0.8128), 250), dec!(203.2000));
    }

    #[test]
    fn total_cost_sums_charges_and_material() {
        let charges = FixedCharges {
            cutting: dec!(2),
            printing: dec!(1.5),
            stitching: dec!(1),
            transport: dec!(0.5),
        };
        let breakdown = derive_costs(&charges, vec![dec!(6), dec!(4)]);
        assert_eq!(breakdown.material_cost, dec!(10.00));
        assert_eq!(breakdown.total_cost, dec!(15.00));
    }

    #[test]
    fn editing_selling_rate_recomputes_margin() {
        let pricing = reconcile(dec!(15), PricingEdit::SellingRate(dec!(18)));
        assert_eq!(pricing.selling_rate, dec!(18));
        assert_eq!(pricing.margin, Some(dec!(20.00)));
    }

    #[test]
    fn editing_margin_recomputes_selling_rate() {
        let pricing = reconcile(dec!(15), PricingEdit::Margin(dec!(20)));
        assert_eq!(pricing.selling_rate, dec!(18.00));
        assert_eq!(pricing.margin, Some(dec!(20)));
    }

    #[test]
    fn zero_cost_leaves_margin_undefined() {
        let pricing = reconcile(Decimal::ZERO, PricingEdit::SellingRate(dec!(10)));
        assert_eq!(pricing.margin, None);
    }

    #[test]
    fn pricing_edit_rejects_both_fields_at_once() {
        assert!(PricingEdit::from_options(Some(dec!(18)), Some(dec!(20))).is_err());
        assert_eq!(
            PricingEdit::from_options(Some(dec!(18)), None).unwrap(),
            Some(PricingEdit::SellingRate(dec!(18)))
        );
        assert_eq!(
            PricingEdit::from_options(None, Some(dec!(20))).unwrap(),
            Some(PricingEdit::Margin(dec!(20)))
        );
        assert_eq!(PricingEdit::from_options(None, None).unwrap(), None);
    }

    #[test]
    fn component_cost_needs_both_inputs() {
        assert_eq!(
            component_material_cost(Some(dec!(0.8128)), Some(dec!(120))),
            Some(dec!(97.54))
        );
        assert_eq!(component_material_cost(None, Some(dec!(120))), None);
        assert_eq!(component_material_cost(Some(dec!(1)), None), None);
    }
}
