//! Field capacity of a machine.
//!
//! `CCT = speed × width / 10` is the theoretical capacity (ha/h) and
//! `CCE = CCT × efficiency / 100` the effective one, after turns and stops.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_fixed, ratio, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalCapacityInput {
    pub speed_kmh: Decimal,
    pub width_m: Decimal,
    pub efficiency_pct: Decimal,
    pub area_ha: Decimal,
}

impl From<&FormInputs> for OperationalCapacityInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            speed_kmh: inputs.number("speed_kmh"),
            width_m: inputs.number("width_m"),
            efficiency_pct: inputs.number("efficiency_pct"),
            area_ha: inputs.number("area_ha"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalCapacityResult {
    pub theoretical_ha_h: Decimal,
    pub effective_ha_h: Decimal,
    pub hours_needed: Decimal,
}

impl From<OperationalCapacityResult> for ResultSet {
    fn from(r: OperationalCapacityResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("theoretical_ha_h", r.theoretical_ha_h);
        set.insert("effective_ha_h", r.effective_ha_h);
        set.insert("hours_needed", r.hours_needed);
        set
    }
}

pub struct OperationalCapacity;

impl Calculator for OperationalCapacity {
    const TYPE: CalculatorType = CalculatorType::OperationalCapacity;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("speed_kmh"),
        FieldSpec::number("width_m"),
        FieldSpec::number("efficiency_pct"),
        FieldSpec::number("area_ha"),
    ];

    type Input = OperationalCapacityInput;
    type Output = OperationalCapacityResult;

    fn try_compute(input: &OperationalCapacityInput) -> Option<OperationalCapacityResult> {
        let theoretical_ha_h = scaled(input.speed_kmh, input.width_m, dec!(10))?;
        let effective_ha_h = scaled(theoretical_ha_h, input.efficiency_pct, dec!(100))?;

        Some(OperationalCapacityResult {
            theoretical_ha_h,
            effective_ha_h,
            hours_needed: ratio(input.area_ha, effective_ha_h)?,
        })
    }

    fn zero(_input: &OperationalCapacityInput) -> OperationalCapacityResult {
        OperationalCapacityResult {
            theoretical_ha_h: Decimal::ZERO,
            effective_ha_h: Decimal::ZERO,
            hours_needed: Decimal::ZERO,
        }
    }

    fn summary(
        input: &OperationalCapacityInput,
        r: &OperationalCapacityResult,
    ) -> String {
        let mut lines = vec![
            "Capacidade Operacional".to_string(),
            format!(
                "Velocidade: {} km/h | Largura: {} m | Eficiência: {}%",
                input.speed_kmh.normalize(),
                input.width_m.normalize(),
                input.efficiency_pct.normalize()
            ),
            format!("CCT: {} ha/h", format_fixed(r.theoretical_ha_h, 2)),
            format!("CCE: {} ha/h", format_fixed(r.effective_ha_h, 2)),
        ];
        if input.area_ha > Decimal::ZERO {
            lines.push(format!(
                "Tempo para {} ha: {} h",
                input.area_ha.normalize(),
                format_fixed(r.hours_needed, 1)
            ));
        }
        lines.join("\n")
    }
}
