//! Available water in the root zone and irrigation need.
//!
//! Moisture contents are gravimetric (%), bulk density in g/cm³ and root depth
//! in cm, so `(θ × ds × z) / 10` comes out in mm of water.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_fixed, percent_of, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

/// Depletion (%) from which irrigation is recommended.
pub const IRRIGATION_DEPLETION_PCT: Decimal = dec!(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterStatus {
    Adequate,
    Irrigate,
}

impl WaterStatus {
    pub fn classify(depletion_pct: Decimal) -> Self {
        if depletion_pct >= IRRIGATION_DEPLETION_PCT {
            Self::Irrigate
        } else {
            Self::Adequate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adequate => "adequate",
            Self::Irrigate => "irrigate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Adequate => "adequada",
            Self::Irrigate => "irrigar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilWaterInput {
    pub field_capacity_pct: Decimal,
    pub wilting_point_pct: Decimal,
    pub bulk_density: Decimal,
    pub root_depth_cm: Decimal,
    pub current_moisture_pct: Decimal,
}

impl From<&FormInputs> for SoilWaterInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            field_capacity_pct: inputs.number("field_capacity_pct"),
            wilting_point_pct: inputs.number("wilting_point_pct"),
            bulk_density: inputs.number("bulk_density"),
            root_depth_cm: inputs.number("root_depth_cm"),
            current_moisture_pct: inputs.number("current_moisture_pct"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoilWaterResult {
    /// CTA (mm).
    pub total_available_mm: Decimal,
    pub current_stock_mm: Decimal,
    pub irrigation_need_mm: Decimal,
    pub depletion_pct: Decimal,
    pub status: WaterStatus,
}

impl From<SoilWaterResult> for ResultSet {
    fn from(r: SoilWaterResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("total_available_mm", r.total_available_mm);
        set.insert("current_stock_mm", r.current_stock_mm);
        set.insert("irrigation_need_mm", r.irrigation_need_mm);
        set.insert("depletion_pct", r.depletion_pct);
        set.insert("status", r.status.as_str());
        set
    }
}

pub struct SoilWater;

impl SoilWater {
    /// Water (mm) held by a moisture difference over the root depth.
    fn depth_mm(
        moisture_pct: Decimal,
        input: &SoilWaterInput,
    ) -> Option<Decimal> {
        let density_weighted = moisture_pct.checked_mul(input.bulk_density)?;
        scaled(density_weighted, input.root_depth_cm, dec!(10))
    }
}

impl Calculator for SoilWater {
    const TYPE: CalculatorType = CalculatorType::SoilWater;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("field_capacity_pct"),
        FieldSpec::number("wilting_point_pct"),
        FieldSpec::number("bulk_density"),
        FieldSpec::number("root_depth_cm"),
        FieldSpec::number("current_moisture_pct"),
    ];

    type Input = SoilWaterInput;
    type Output = SoilWaterResult;

    fn try_compute(input: &SoilWaterInput) -> Option<SoilWaterResult> {
        let available = input.field_capacity_pct.checked_sub(input.wilting_point_pct)?;
        let above_wilting = input.current_moisture_pct.checked_sub(input.wilting_point_pct)?;
        let to_capacity = input.field_capacity_pct.checked_sub(input.current_moisture_pct)?;

        let total_available_mm = Self::depth_mm(available, input)?;
        let current_stock_mm = Self::depth_mm(above_wilting, input)?
            .min(total_available_mm)
            .max(Decimal::ZERO);
        let irrigation_need_mm = Self::depth_mm(to_capacity, input)?.max(Decimal::ZERO);
        let depletion_pct = if total_available_mm > Decimal::ZERO {
            percent_of(total_available_mm - current_stock_mm, total_available_mm)?
        } else {
            Decimal::ZERO
        };

        Some(SoilWaterResult {
            total_available_mm,
            current_stock_mm,
            irrigation_need_mm,
            depletion_pct,
            status: WaterStatus::classify(depletion_pct),
        })
    }

    fn zero(_input: &SoilWaterInput) -> SoilWaterResult {
        SoilWaterResult {
            total_available_mm: Decimal::ZERO,
            current_stock_mm: Decimal::ZERO,
            irrigation_need_mm: Decimal::ZERO,
            depletion_pct: Decimal::ZERO,
            status: WaterStatus::Adequate,
        }
    }

    fn summary(
        _input: &SoilWaterInput,
        r: &SoilWaterResult,
    ) -> String {
        [
            "Água no Solo".to_string(),
            format!("CTA: {} mm", format_fixed(r.total_available_mm, 1)),
            format!("Armazenamento atual: {} mm", format_fixed(r.current_stock_mm, 1)),
            format!("Depleção: {}%", format_fixed(r.depletion_pct, 1)),
            format!(
                "Lâmina de irrigação: {} mm ({})",
                format_fixed(r.irrigation_need_mm, 1),
                r.status.label()
            ),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn input(current: Decimal) -> SoilWaterInput {
        SoilWaterInput {
            field_capacity_pct: dec!(30),
            wilting_point_pct: dec!(15),
            bulk_density: dec!(1.2),
            root_depth_cm: dec!(40),
            current_moisture_pct: current,
        }
    }

    #[test]
    fn deep_dense_profile_out_of_range_reports_zero() {
        let i = SoilWaterInput {
            bulk_density: dec!(1000000000000000),
            root_depth_cm: dec!(1000000000000000),
            ..input(dec!(20))
        };

        let r = SoilWater::compute(&i);

        assert_eq!(r, SoilWater::zero(&i));
        assert_eq!(r.status, WaterStatus::Adequate);
    }

    #[test]
    fn available_water_and_irrigation_need() {
        let r = SoilWater::compute(&input(dec!(20)));

        // 15 × 1.2 × 40 / 10
        assert_eq!(r.total_available_mm, dec!(72));
        assert_eq!(r.current_stock_mm, dec!(24));
        assert_eq!(r.irrigation_need_mm, dec!(48));
        assert_eq!(r.status, WaterStatus::Irrigate);
    }

    #[test]
    fn stock_is_clipped_to_available_range() {
        let wet = SoilWater::compute(&input(dec!(35)));
        let dry = SoilWater::compute(&input(dec!(10)));

        assert_eq!(wet.current_stock_mm, dec!(72));
        assert_eq!(wet.irrigation_need_mm, Decimal::ZERO);
        assert_eq!(wet.depletion_pct, Decimal::ZERO);
        assert_eq!(dry.current_stock_mm, Decimal::ZERO);
        assert_eq!(dry.depletion_pct, dec!(100));
    }

    #[test]
    fn half_depleted_triggers_irrigation() {
        let half = SoilWater::compute(&input(dec!(22.5)));
        let less = SoilWater::compute(&input(dec!(23)));

        assert_eq!(half.depletion_pct, dec!(50));
        assert_eq!(half.status, WaterStatus::Irrigate);
        assert_eq!(less.status, WaterStatus::Adequate);
    }

    #[test]
    fn zero_available_water_is_adequate() {
        let mut i = input(dec!(20));
        i.root_depth_cm = Decimal::ZERO;

        let r = SoilWater::compute(&i);

        assert_eq!(r.total_available_mm, Decimal::ZERO);
        assert_eq!(r.depletion_pct, Decimal::ZERO);
        assert_eq!(r.status, WaterStatus::Adequate);
    }
}
