//! Break-even yield and price for a cost per hectare.
//!
//! | Field            | Unit    | Meaning |
//! |------------------|---------|---------|
//! | `cost_ha`        | R$/ha   | total production cost |
//! | `price`          | R$/sc   | expected selling price per sack |
//! | `expected_yield` | sc/ha   | expected yield |
//! | `area_ha`        | ha      | optional, to total cost and profit |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use agro_core::calculations::break_even::{BreakEvenInput, MarginStatus};
//! use agro_core::calculations::{BreakEven, Calculator};
//!
//! let input = BreakEvenInput {
//!     cost_ha: dec!(5800),
//!     price: dec!(125),
//!     expected_yield: dec!(65),
//!     area_ha: dec!(0),
//! };
//!
//! let result = BreakEven::compute(&input);
//! assert_eq!(result.break_even_yield, dec!(46.4));
//! assert_eq!(result.status, MarginStatus::Safe);
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_brl, format_fixed, percent_of};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

/// Margin (%) from which the crop is considered safe.
pub const SAFE_MARGIN_PCT: Decimal = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginStatus {
    Safe,
    Warning,
    Danger,
}

impl MarginStatus {
    pub fn classify(margin_pct: Decimal) -> Self {
        if margin_pct >= SAFE_MARGIN_PCT {
            Self::Safe
        } else if margin_pct >= Decimal::ZERO {
            Self::Warning
        } else {
            Self::Danger
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "margem segura",
            Self::Warning => "margem apertada",
            Self::Danger => "prejuízo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEvenInput {
    pub cost_ha: Decimal,
    pub price: Decimal,
    pub expected_yield: Decimal,
    pub area_ha: Decimal,
}

impl From<&FormInputs> for BreakEvenInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            cost_ha: inputs.number("cost_ha"),
            price: inputs.number("price"),
            expected_yield: inputs.number("expected_yield"),
            area_ha: inputs.number("area_ha"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEvenResult {
    /// sc/ha needed to pay the cost.
    pub break_even_yield: Decimal,
    /// R$/sc needed to pay the cost.
    pub break_even_price: Decimal,
    pub safety_margin_pct: Decimal,
    pub revenue_ha: Decimal,
    pub profit_ha: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub status: MarginStatus,
}

impl From<BreakEvenResult> for ResultSet {
    fn from(r: BreakEvenResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("break_even_yield", r.break_even_yield);
        set.insert("break_even_price", r.break_even_price);
        set.insert("safety_margin_pct", r.safety_margin_pct);
        set.insert("revenue_ha", r.revenue_ha);
        set.insert("profit_ha", r.profit_ha);
        set.insert("total_cost", r.total_cost);
        set.insert("total_profit", r.total_profit);
        set.insert("status", r.status.as_str());
        set
    }
}

pub struct BreakEven;

impl Calculator for BreakEven {
    const TYPE: CalculatorType = CalculatorType::BreakEven;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("cost_ha"),
        FieldSpec::number("price"),
        FieldSpec::number("expected_yield"),
        FieldSpec::number("area_ha"),
    ];

    type Input = BreakEvenInput;
    type Output = BreakEvenResult;

    fn try_compute(input: &BreakEvenInput) -> Option<BreakEvenResult> {
        if input.price.is_zero() || input.expected_yield.is_zero() {
            return Some(Self::zero(input));
        }

        let break_even_yield = input.cost_ha.checked_div(input.price)?;
        let break_even_price = input.cost_ha.checked_div(input.expected_yield)?;
        let yield_surplus = input.expected_yield.checked_sub(break_even_yield)?;
        let safety_margin_pct = percent_of(yield_surplus, input.expected_yield)?;
        let revenue_ha = input.expected_yield.checked_mul(input.price)?;
        let profit_ha = revenue_ha.checked_sub(input.cost_ha)?;

        Some(BreakEvenResult {
            break_even_yield,
            break_even_price,
            safety_margin_pct,
            revenue_ha,
            profit_ha,
            total_cost: input.cost_ha.checked_mul(input.area_ha)?,
            total_profit: profit_ha.checked_mul(input.area_ha)?,
            status: MarginStatus::classify(safety_margin_pct),
        })
    }

    fn zero(_input: &BreakEvenInput) -> BreakEvenResult {
        BreakEvenResult {
            break_even_yield: Decimal::ZERO,
            break_even_price: Decimal::ZERO,
            safety_margin_pct: Decimal::ZERO,
            revenue_ha: Decimal::ZERO,
            profit_ha: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            status: MarginStatus::classify(Decimal::ZERO),
        }
    }

    fn summary(
        input: &BreakEvenInput,
        r: &BreakEvenResult,
    ) -> String {
        let mut lines = vec![
            "Ponto de Equilíbrio".to_string(),
            format!("Custo: {}/ha", format_brl(input.cost_ha)),
            format!("Produtividade de equilíbrio: {} sc/ha", format_fixed(r.break_even_yield, 1)),
            format!("Preço de equilíbrio: {}/sc", format_brl(r.break_even_price)),
            format!(
                "Margem de segurança: {}% ({})",
                format_fixed(r.safety_margin_pct, 1),
                r.status.label()
            ),
            format!("Lucro: {}/ha", format_brl(r.profit_ha)),
        ];
        if input.area_ha > Decimal::ZERO {
            lines.push(format!(
                "Lucro total ({} ha): {}",
                input.area_ha.normalize(),
                format_brl(r.total_profit)
            ));
        }
        lines.join("\n")
    }
}
