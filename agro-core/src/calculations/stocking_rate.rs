//! Herd stocking rate in animal units (UA, 450 kg of live weight) per hectare.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_fixed, percent_of, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

/// Live weight of one animal unit (kg).
pub const ANIMAL_UNIT_KG: Decimal = dec!(450);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockingStatus {
    Adequate,
    Overstocked,
}

impl StockingStatus {
    pub fn classify(
        ua_ha: Decimal,
        capacity_ua_ha: Decimal,
    ) -> Self {
        if capacity_ua_ha > Decimal::ZERO && ua_ha > capacity_ua_ha {
            Self::Overstocked
        } else {
            Self::Adequate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adequate => "adequate",
            Self::Overstocked => "overstocked",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Adequate => "adequada",
            Self::Overstocked => "superlotação",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockingRateInput {
    pub head_count: Decimal,
    pub avg_weight_kg: Decimal,
    pub area_ha: Decimal,
    /// Carrying capacity of the pasture (UA/ha).
    pub capacity_ua_ha: Decimal,
}

impl From<&FormInputs> for StockingRateInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            head_count: inputs.number("head_count"),
            avg_weight_kg: inputs.number("avg_weight_kg"),
            area_ha: inputs.number("area_ha"),
            capacity_ua_ha: inputs.number("capacity_ua_ha"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockingRateResult {
    pub animal_units: Decimal,
    pub ua_ha: Decimal,
    pub occupancy_pct: Decimal,
    pub status: StockingStatus,
}

impl From<StockingRateResult> for ResultSet {
    fn from(r: StockingRateResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("animal_units", r.animal_units);
        set.insert("ua_ha", r.ua_ha);
        set.insert("occupancy_pct", r.occupancy_pct);
        set.insert("status", r.status.as_str());
        set
    }
}

pub struct StockingRate;

impl Calculator for StockingRate {
    const TYPE: CalculatorType = CalculatorType::StockingRate;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("head_count"),
        FieldSpec::number("avg_weight_kg"),
        FieldSpec::number("area_ha"),
        FieldSpec::number("capacity_ua_ha"),
    ];

    type Input = StockingRateInput;
    type Output = StockingRateResult;

    fn try_compute(input: &StockingRateInput) -> Option<StockingRateResult> {
        if input.area_ha.is_zero() {
            return Some(Self::zero(input));
        }

        let animal_units = scaled(input.head_count, input.avg_weight_kg, ANIMAL_UNIT_KG)?;
        let ua_ha = animal_units.checked_div(input.area_ha)?;

        Some(StockingRateResult {
            animal_units,
            ua_ha,
            occupancy_pct: percent_of(ua_ha, input.capacity_ua_ha)?,
            status: StockingStatus::classify(ua_ha, input.capacity_ua_ha),
        })
    }

    fn zero(_input: &StockingRateInput) -> StockingRateResult {
        StockingRateResult {
            animal_units: Decimal::ZERO,
            ua_ha: Decimal::ZERO,
            occupancy_pct: Decimal::ZERO,
            status: StockingStatus::Adequate,
        }
    }

    fn summary(
        input: &StockingRateInput,
        r: &StockingRateResult,
    ) -> String {
        let mut lines = vec![
            "Taxa de Lotação".to_string(),
            format!(
                "Rebanho: {} cabeças de {} kg",
                input.head_count.normalize(),
                input.avg_weight_kg.normalize()
            ),
            format!("Unidades animais: {} UA", format_fixed(r.animal_units, 1)),
            format!("Lotação: {} UA/ha", format_fixed(r.ua_ha, 2)),
        ];
        if input.capacity_ua_ha > Decimal::ZERO {
            lines.push(format!(
                "Ocupação: {}% da capacidade ({})",
                format_fixed(r.occupancy_pct, 1),
                r.status.label()
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn input() -> StockingRateInput {
        StockingRateInput {
            head_count: dec!(90),
            avg_weight_kg: dec!(400),
            area_ha: dec!(40),
            capacity_ua_ha: dec!(2),
        }
    }

    #[test]
    fn herd_out_of_range_reports_zero_load() {
        let i = StockingRateInput {
            head_count: dec!(1000000000000000000000),
            avg_weight_kg: dec!(1000000000000000000000),
            ..input()
        };

        let r = StockingRate::compute(&i);

        assert_eq!(r, StockingRate::zero(&i));
        assert_eq!(r.status, StockingStatus::Adequate);
    }

    #[test]
    fn animal_units_per_hectare() {
        let r = StockingRate::compute(&input());

        assert_eq!(r.animal_units, dec!(80));
        assert_eq!(r.ua_ha, dec!(2));
        assert_eq!(r.occupancy_pct, dec!(100));
        assert_eq!(r.status, StockingStatus::Adequate);
    }

    #[test]
    fn above_capacity_is_overstocked() {
        let mut i = input();
        i.head_count = dec!(100);

        let r = StockingRate::compute(&i);

        assert_eq!(r.status, StockingStatus::Overstocked);
    }

    #[test]
    fn zero_capacity_never_overstocks() {
        let mut i = input();
        i.capacity_ua_ha = Decimal::ZERO;

        let r = StockingRate::compute(&i);

        assert_eq!(r.occupancy_pct, Decimal::ZERO);
        assert_eq!(r.status, StockingStatus::Adequate);
    }

    #[test]
    fn zero_area_gives_zero_result() {
        let mut i = input();
        i.area_ha = Decimal::ZERO;

        let r = StockingRate::compute(&i);

        assert_eq!(r.animal_units, Decimal::ZERO);
        assert_eq!(r.ua_ha, Decimal::ZERO);
    }
}
