//! Seeding rate from a target plant population.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_fixed, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedingRateInput {
    /// Target plants per hectare.
    pub population_ha: Decimal,
    pub germination_pct: Decimal,
    pub row_spacing_cm: Decimal,
    /// Thousand-seed weight (g).
    pub thousand_seed_weight_g: Decimal,
    pub area_ha: Decimal,
}

impl From<&FormInputs> for SeedingRateInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            population_ha: inputs.number("population_ha"),
            germination_pct: inputs.number("germination_pct"),
            row_spacing_cm: inputs.number("row_spacing_cm"),
            thousand_seed_weight_g: inputs.number("thousand_seed_weight_g"),
            area_ha: inputs.number("area_ha"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedingRateResult {
    pub seeds_ha: Decimal,
    /// Seeds per linear metre of row.
    pub seeds_m: Decimal,
    pub kg_ha: Decimal,
    pub total_kg: Decimal,
}

impl From<SeedingRateResult> for ResultSet {
    fn from(r: SeedingRateResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("seeds_ha", r.seeds_ha);
        set.insert("seeds_m", r.seeds_m);
        set.insert("kg_ha", r.kg_ha);
        set.insert("total_kg", r.total_kg);
        set
    }
}

pub struct SeedingRate;

impl Calculator for SeedingRate {
    const TYPE: CalculatorType = CalculatorType::SeedingRate;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("population_ha"),
        FieldSpec::number("germination_pct"),
        FieldSpec::number("row_spacing_cm"),
        FieldSpec::number("thousand_seed_weight_g"),
        FieldSpec::number("area_ha"),
    ];

    type Input = SeedingRateInput;
    type Output = SeedingRateResult;

    fn try_compute(input: &SeedingRateInput) -> Option<SeedingRateResult> {
        if input.germination_pct.is_zero() {
            return Some(Self::zero(input));
        }

        let seeds_ha = scaled(input.population_ha, dec!(100), input.germination_pct)?;
        let seeds_m = scaled(seeds_ha, input.row_spacing_cm, dec!(100))? / dec!(10000);
        let kg_ha = scaled(seeds_ha, input.thousand_seed_weight_g, dec!(1000000))?;

        Some(SeedingRateResult {
            seeds_ha,
            seeds_m,
            kg_ha,
            total_kg: kg_ha.checked_mul(input.area_ha)?,
        })
    }

    fn zero(_input: &SeedingRateInput) -> SeedingRateResult {
        SeedingRateResult {
            seeds_ha: Decimal::ZERO,
            seeds_m: Decimal::ZERO,
            kg_ha: Decimal::ZERO,
            total_kg: Decimal::ZERO,
        }
    }

    fn summary(
        input: &SeedingRateInput,
        r: &SeedingRateResult,
    ) -> String {
        let mut lines = vec![
            "Densidade de Semeadura".to_string(),
            format!(
                "População: {} plantas/ha | Germinação: {}%",
                input.population_ha.normalize(),
                input.germination_pct.normalize()
            ),
            format!("Sementes: {} /ha", format_fixed(r.seeds_ha, 0)),
            format!("Sementes por metro: {}", format_fixed(r.seeds_m, 1)),
            format!("Semente: {} kg/ha", format_fixed(r.kg_ha, 1)),
        ];
        if input.area_ha > Decimal::ZERO {
            lines.push(format!(
                "Total para {} ha: {} kg",
                input.area_ha.normalize(),
                format_fixed(r.total_kg, 1)
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn input() -> SeedingRateInput {
        SeedingRateInput {
            population_ha: dec!(300000),
            germination_pct: dec!(80),
            row_spacing_cm: dec!(50),
            thousand_seed_weight_g: dec!(160),
            area_ha: dec!(10),
        }
    }

    #[test]
    fn population_out_of_range_reports_zero() {
        let i = SeedingRateInput {
            population_ha: dec!(70000000000000000000000000000),
            ..input()
        };

        assert_eq!(SeedingRate::compute(&i), SeedingRate::zero(&i));
    }

    #[test]
    fn soybean_seeding() {
        let r = SeedingRate::compute(&input());

        assert_eq!(r.seeds_ha, dec!(375000));
        assert_eq!(r.seeds_m, dec!(18.75));
        assert_eq!(r.kg_ha, dec!(60));
        assert_eq!(r.total_kg, dec!(600));
    }

    #[test]
    fn zero_germination_gives_zero_result() {
        let mut i = input();
        i.germination_pct = Decimal::ZERO;

        let r = SeedingRate::compute(&i);

        assert_eq!(r.seeds_ha, Decimal::ZERO);
        assert_eq!(r.total_kg, Decimal::ZERO);
    }

    #[test]
    fn summary_lists_total_for_area() {
        let i = input();
        let r = SeedingRate::compute(&i);

        assert!(SeedingRate::summary(&i, &r).ends_with("Total para 10 ha: 600.0 kg"));
    }
}
