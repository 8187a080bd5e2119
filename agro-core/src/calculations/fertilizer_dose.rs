//! NPK fertilizer dose from a target and a commercial formula.
//!
//! The dose is sized to meet the target of one priority nutrient exactly; the
//! other two nutrients are whatever that dose of the formula delivers.
//!
//! | Field        | Unit  | Meaning |
//! |--------------|-------|---------|
//! | `target_*`   | kg/ha | nutrient requirement for N, P₂O₅ and K₂O |
//! | `formula_*`  | %     | guarantee of the product (e.g. 04-14-08) |
//! | `priority`   | N/P/K | nutrient the dose is computed for |
//! | `area`       | ha    | optional, to total the product |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use agro_core::calculations::fertilizer_dose::{FertilizerDoseInput, Nutrient};
//! use agro_core::calculations::{Calculator, FertilizerDose};
//!
//! let input = FertilizerDoseInput {
//!     target_n: dec!(80),
//!     target_p: dec!(40),
//!     target_k: dec!(0),
//!     formula_n: dec!(4),
//!     formula_p: dec!(14),
//!     formula_k: dec!(8),
//!     priority: Nutrient::P,
//!     area: dec!(0),
//! };
//!
//! let result = FertilizerDose::compute(&input);
//! assert_eq!(result.dose_ha.round_dp(1), dec!(285.7));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_fixed, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

/// Applied and target amounts closer than this are balanced (kg/ha).
pub const BALANCE_TOLERANCE: Decimal = dec!(0.5);

/// Commercial bag size (kg).
pub const BAG_KG: Decimal = dec!(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Nutrient {
    #[default]
    N,
    P,
    K,
}

impl Nutrient {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::P => "P",
            Self::K => "K",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "N" => Some(Self::N),
            "P" => Some(Self::P),
            "K" => Some(Self::K),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientBalance {
    Balanced,
    Deficit,
    Surplus,
}

impl NutrientBalance {
    pub fn classify(
        applied: Decimal,
        target: Decimal,
    ) -> Self {
        let gap = applied.checked_sub(target).map_or(BALANCE_TOLERANCE, |d| d.abs());
        if gap < BALANCE_TOLERANCE {
            Self::Balanced
        } else if applied < target {
            Self::Deficit
        } else {
            Self::Surplus
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Deficit => "deficit",
            Self::Surplus => "surplus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Balanced => "equilibrado",
            Self::Deficit => "déficit",
            Self::Surplus => "excesso",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FertilizerDoseInput {
    pub target_n: Decimal,
    pub target_p: Decimal,
    pub target_k: Decimal,
    pub formula_n: Decimal,
    pub formula_p: Decimal,
    pub formula_k: Decimal,
    pub priority: Nutrient,
    pub area: Decimal,
}

impl FertilizerDoseInput {
    fn target(
        &self,
        nutrient: Nutrient,
    ) -> Decimal {
        match nutrient {
            Nutrient::N => self.target_n,
            Nutrient::P => self.target_p,
            Nutrient::K => self.target_k,
        }
    }

    fn formula_pct(
        &self,
        nutrient: Nutrient,
    ) -> Decimal {
        match nutrient {
            Nutrient::N => self.formula_n,
            Nutrient::P => self.formula_p,
            Nutrient::K => self.formula_k,
        }
    }
}

impl From<&FormInputs> for FertilizerDoseInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            target_n: inputs.number("target_n"),
            target_p: inputs.number("target_p"),
            target_k: inputs.number("target_k"),
            formula_n: inputs.number("formula_n"),
            formula_p: inputs.number("formula_p"),
            formula_k: inputs.number("formula_k"),
            priority: Nutrient::parse(&inputs.text("priority")).unwrap_or_default(),
            area: inputs.number("area"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FertilizerDoseResult {
    /// Product dose (kg/ha).
    pub dose_ha: Decimal,
    pub applied_n: Decimal,
    pub applied_p: Decimal,
    pub applied_k: Decimal,
    pub balance_n: NutrientBalance,
    pub balance_p: NutrientBalance,
    pub balance_k: NutrientBalance,
    /// Product for the whole area (kg).
    pub total_product_kg: Decimal,
    /// Whole bags needed for the area.
    pub bags: Decimal,
}

impl From<FertilizerDoseResult> for ResultSet {
    fn from(r: FertilizerDoseResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("dose_ha", r.dose_ha);
        set.insert("applied_n", r.applied_n);
        set.insert("applied_p", r.applied_p);
        set.insert("applied_k", r.applied_k);
        set.insert("balance_n", r.balance_n.as_str());
        set.insert("balance_p", r.balance_p.as_str());
        set.insert("balance_k", r.balance_k.as_str());
        set.insert("total_product_kg", r.total_product_kg);
        set.insert("bags", r.bags);
        set
    }
}

pub struct FertilizerDose;

impl Calculator for FertilizerDose {
    const TYPE: CalculatorType = CalculatorType::FertilizerDose;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("target_n"),
        FieldSpec::number("target_p"),
        FieldSpec::number("target_k"),
        FieldSpec::number("formula_n"),
        FieldSpec::number("formula_p"),
        FieldSpec::number("formula_k"),
        FieldSpec::choice("priority", "N"),
        FieldSpec::number("area"),
    ];

    type Input = FertilizerDoseInput;
    type Output = FertilizerDoseResult;

    fn try_compute(input: &FertilizerDoseInput) -> Option<FertilizerDoseResult> {
        let priority_pct = input.formula_pct(input.priority);
        if priority_pct <= Decimal::ZERO {
            return Some(Self::zero(input));
        }

        let dose_ha = scaled(input.target(input.priority), dec!(100), priority_pct)?;
        let applied_n = scaled(dose_ha, input.formula_n, dec!(100))?;
        let applied_p = scaled(dose_ha, input.formula_p, dec!(100))?;
        let applied_k = scaled(dose_ha, input.formula_k, dec!(100))?;
        let total_product_kg = dose_ha.checked_mul(input.area)?;

        Some(FertilizerDoseResult {
            dose_ha,
            applied_n,
            applied_p,
            applied_k,
            balance_n: NutrientBalance::classify(applied_n, input.target_n),
            balance_p: NutrientBalance::classify(applied_p, input.target_p),
            balance_k: NutrientBalance::classify(applied_k, input.target_k),
            total_product_kg,
            bags: (total_product_kg / BAG_KG).ceil(),
        })
    }

    fn zero(input: &FertilizerDoseInput) -> FertilizerDoseResult {
        FertilizerDoseResult {
            dose_ha: Decimal::ZERO,
            applied_n: Decimal::ZERO,
            applied_p: Decimal::ZERO,
            applied_k: Decimal::ZERO,
            balance_n: NutrientBalance::classify(Decimal::ZERO, input.target_n),
            balance_p: NutrientBalance::classify(Decimal::ZERO, input.target_p),
            balance_k: NutrientBalance::classify(Decimal::ZERO, input.target_k),
            total_product_kg: Decimal::ZERO,
            bags: Decimal::ZERO,
        }
    }

    fn summary(
        input: &FertilizerDoseInput,
        r: &FertilizerDoseResult,
    ) -> String {
        let mut lines = vec![
            "Adubação NPK".to_string(),
            format!(
                "Formulado: {}-{}-{} (prioridade {})",
                input.formula_n.normalize(),
                input.formula_p.normalize(),
                input.formula_k.normalize(),
                input.priority.as_str()
            ),
            format!("Dose: {} kg/ha", format_fixed(r.dose_ha, 1)),
            format!(
                "N aplicado: {} kg/ha ({})",
                format_fixed(r.applied_n, 2),
                r.balance_n.label()
            ),
            format!(
                "P aplicado: {} kg/ha ({})",
                format_fixed(r.applied_p, 2),
                r.balance_p.label()
            ),
            format!(
                "K aplicado: {} kg/ha ({})",
                format_fixed(r.applied_k, 2),
                r.balance_k.label()
            ),
        ];
        if input.area > Decimal::ZERO {
            lines.push(format!(
                "Total: {} kg em {} ha ({} sacos de 50 kg)",
                format_fixed(r.total_product_kg, 1),
                input.area.normalize(),
                r.bags.normalize()
            ));
        }
        lines.join("\n")
    }
}
