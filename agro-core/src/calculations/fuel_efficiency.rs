//! Fuel consumption of a field operation, per hectare and per hour.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_brl, format_fixed, percent_of};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionStatus {
    Efficient,
    HighConsumption,
}

impl ConsumptionStatus {
    /// High only against a positive target that the consumption exceeds.
    pub fn classify(
        liters_ha: Decimal,
        target_l_ha: Decimal,
    ) -> Self {
        if target_l_ha > Decimal::ZERO && liters_ha > target_l_ha {
            Self::HighConsumption
        } else {
            Self::Efficient
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Efficient => "efficient",
            Self::HighConsumption => "high_consumption",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Efficient => "eficiente",
            Self::HighConsumption => "consumo elevado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelEfficiencyInput {
    pub area_ha: Decimal,
    pub liters: Decimal,
    pub hours: Decimal,
    pub target_l_ha: Decimal,
    pub fuel_price: Decimal,
}

impl From<&FormInputs> for FuelEfficiencyInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            area_ha: inputs.number("area_ha"),
            liters: inputs.number("liters"),
            hours: inputs.number("hours"),
            target_l_ha: inputs.number("target_l_ha"),
            fuel_price: inputs.number("fuel_price"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelEfficiencyResult {
    pub liters_ha: Decimal,
    pub liters_h: Decimal,
    pub hectares_h: Decimal,
    /// Deviation from the target (%), zero without a target.
    pub deviation_pct: Decimal,
    pub cost_ha: Decimal,
    pub status: ConsumptionStatus,
}

impl FuelEfficiencyResult {
    fn zero() -> Self {
        Self {
            liters_ha: Decimal::ZERO,
            liters_h: Decimal::ZERO,
            hectares_h: Decimal::ZERO,
            deviation_pct: Decimal::ZERO,
            cost_ha: Decimal::ZERO,
            status: ConsumptionStatus::Efficient,
        }
    }
}

impl From<FuelEfficiencyResult> for ResultSet {
    fn from(r: FuelEfficiencyResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("liters_ha", r.liters_ha);
        set.insert("liters_h", r.liters_h);
        set.insert("hectares_h", r.hectares_h);
        set.insert("deviation_pct", r.deviation_pct);
        set.insert("cost_ha", r.cost_ha);
        set.insert("status", r.status.as_str());
        set
    }
}

pub struct FuelEfficiency;

impl Calculator for FuelEfficiency {
    const TYPE: CalculatorType = CalculatorType::FuelEfficiency;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("area_ha"),
        FieldSpec::number("liters"),
        FieldSpec::number("hours"),
        FieldSpec::number("target_l_ha"),
        FieldSpec::number("fuel_price"),
    ];

    type Input = FuelEfficiencyInput;
    type Output = FuelEfficiencyResult;

    fn try_compute(input: &FuelEfficiencyInput) -> Option<FuelEfficiencyResult> {
        if input.area_ha.is_zero() || input.hours.is_zero() {
            return Some(FuelEfficiencyResult::zero());
        }

        let liters_ha = input.liters.checked_div(input.area_ha)?;
        let over_target = liters_ha.checked_sub(input.target_l_ha)?;

        Some(FuelEfficiencyResult {
            liters_ha,
            liters_h: input.liters.checked_div(input.hours)?,
            hectares_h: input.area_ha.checked_div(input.hours)?,
            deviation_pct: percent_of(over_target, input.target_l_ha)?,
            cost_ha: liters_ha.checked_mul(input.fuel_price)?,
            status: ConsumptionStatus::classify(liters_ha, input.target_l_ha),
        })
    }

    fn zero(_input: &FuelEfficiencyInput) -> FuelEfficiencyResult {
        FuelEfficiencyResult::zero()
    }

    fn summary(
        input: &FuelEfficiencyInput,
        r: &FuelEfficiencyResult,
    ) -> String {
        let mut lines = vec![
            "Consumo de Combustível".to_string(),
            format!("Consumo: {} L/ha", format_fixed(r.liters_ha, 2)),
            format!("Consumo horário: {} L/h", format_fixed(r.liters_h, 2)),
            format!("Rendimento: {} ha/h", format_fixed(r.hectares_h, 2)),
        ];
        if input.target_l_ha > Decimal::ZERO {
            lines.push(format!(
                "Meta: {} L/ha ({}%) - {}",
                input.target_l_ha.normalize(),
                format_fixed(r.deviation_pct, 1),
                r.status.label()
            ));
        }
        if input.fuel_price > Decimal::ZERO {
            lines.push(format!("Custo: {}/ha", format_brl(r.cost_ha)));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn input() -> FuelEfficiencyInput {
        FuelEfficiencyInput {
            area_ha: dec!(50),
            liters: dec!(600),
            hours: dec!(12),
            target_l_ha: dec!(0),
            fuel_price: dec!(0),
        }
    }

    #[test]
    fn consumption_per_hectare_and_hour() {
        let r = FuelEfficiency::compute(&input());

        assert_eq!(r.liters_ha, dec!(12));
        assert_eq!(r.liters_h, dec!(50));
        assert_eq!(r.hectares_h.round_dp(2), dec!(4.17));
        assert_eq!(r.status, ConsumptionStatus::Efficient);
    }

    #[test]
    fn above_target_is_high_consumption() {
        let mut i = input();
        i.target_l_ha = dec!(10);

        let r = FuelEfficiency::compute(&i);

        assert_eq!(r.status, ConsumptionStatus::HighConsumption);
        assert_eq!(r.deviation_pct, dec!(20));
    }

    #[test]
    fn at_target_is_efficient() {
        let mut i = input();
        i.target_l_ha = dec!(12);

        assert_eq!(FuelEfficiency::compute(&i).status, ConsumptionStatus::Efficient);
    }

    #[test]
    fn fuel_price_gives_cost_per_hectare() {
        let mut i = input();
        i.fuel_price = dec!(6.10);

        let r = FuelEfficiency::compute(&i);

        assert_eq!(r.cost_ha, dec!(73.2));
        assert!(FuelEfficiency::summary(&i, &r).ends_with("Custo: R$\u{a0}73,20/ha"));
    }

    #[test]
    fn tiny_area_with_huge_volume_gives_zero_result() {
        let i = FuelEfficiencyInput {
            area_ha: dec!(0.001),
            liters: dec!(70000000000000000000000000000),
            ..input()
        };

        assert_eq!(FuelEfficiency::compute(&i), FuelEfficiencyResult::zero());
    }

    #[test]
    fn zero_area_or_hours_gives_zero_result() {
        let mut no_area = input();
        no_area.area_ha = Decimal::ZERO;
        let mut no_hours = input();
        no_hours.hours = Decimal::ZERO;

        assert_eq!(FuelEfficiency::compute(&no_area), FuelEfficiencyResult::zero());
        assert_eq!(FuelEfficiency::compute(&no_hours), FuelEfficiencyResult::zero());
    }
}
