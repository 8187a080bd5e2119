//! Liming by base saturation, plus gypsum by clay content.
//!
//! | Field        | Unit     | Meaning |
//! |--------------|----------|---------|
//! | `current_v`  | %        | current base saturation (V1) |
//! | `target_v`   | %        | desired base saturation (V2) |
//! | `ctc`        | cmolc/dm³| cation exchange capacity at pH 7 |
//! | `prnt`       | %        | effective neutralizing power of the limestone |
//! | `clay_pct`   | %        | clay content |
//! | `crop_cycle` | —        | `annual` (factor 50) or `perennial` (factor 75) |
//! | `area`       | ha       | optional, to total both products |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_fixed, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropCycle {
    #[default]
    Annual,
    Perennial,
}

impl CropCycle {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "annual" | "anual" => Some(Self::Annual),
            "perennial" | "perene" => Some(Self::Perennial),
            _ => None,
        }
    }

    /// kg of gypsum per percent of clay.
    pub fn gypsum_factor(&self) -> Decimal {
        match self {
            Self::Annual => dec!(50),
            Self::Perennial => dec!(75),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Annual => "anual",
            Self::Perennial => "perene",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimingInput {
    pub current_v: Decimal,
    pub target_v: Decimal,
    pub ctc: Decimal,
    pub prnt: Decimal,
    pub clay_pct: Decimal,
    pub crop_cycle: CropCycle,
    pub area: Decimal,
}

impl From<&FormInputs> for LimingInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            current_v: inputs.number("current_v"),
            target_v: inputs.number("target_v"),
            ctc: inputs.number("ctc"),
            prnt: inputs.number("prnt"),
            clay_pct: inputs.number("clay_pct"),
            crop_cycle: CropCycle::parse(&inputs.text("crop_cycle")).unwrap_or_default(),
            area: inputs.number("area"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimingResult {
    /// Limestone need, NC (t/ha).
    pub limestone_t_ha: Decimal,
    /// Gypsum need, NG (kg/ha).
    pub gypsum_kg_ha: Decimal,
    /// Gypsum need, NG (t/ha).
    pub gypsum_t_ha: Decimal,
    pub limestone_total_t: Decimal,
    pub gypsum_total_t: Decimal,
}

impl From<LimingResult> for ResultSet {
    fn from(r: LimingResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("limestone_t_ha", r.limestone_t_ha);
        set.insert("gypsum_kg_ha", r.gypsum_kg_ha);
        set.insert("gypsum_t_ha", r.gypsum_t_ha);
        set.insert("limestone_total_t", r.limestone_total_t);
        set.insert("gypsum_total_t", r.gypsum_total_t);
        set
    }
}

pub struct Liming;

impl Liming {
    /// `NC = (V2 − V1) × CTC / PRNT`, zero unless V2 exceeds V1. `None` when
    /// the need is out of range.
    pub fn limestone_need(input: &LimingInput) -> Option<Decimal> {
        if input.target_v > input.current_v && input.prnt > Decimal::ZERO {
            let gap = input.target_v.checked_sub(input.current_v)?;
            scaled(gap, input.ctc, input.prnt)
        } else {
            Some(Decimal::ZERO)
        }
    }
}

impl Calculator for Liming {
    const TYPE: CalculatorType = CalculatorType::Liming;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("current_v"),
        FieldSpec::number("target_v"),
        FieldSpec::number("ctc"),
        FieldSpec::number("prnt"),
        FieldSpec::number("clay_pct"),
        FieldSpec::choice("crop_cycle", "annual"),
        FieldSpec::number("area"),
    ];

    type Input = LimingInput;
    type Output = LimingResult;

    fn try_compute(input: &LimingInput) -> Option<LimingResult> {
        let limestone_t_ha = Self::limestone_need(input)?;
        let gypsum_kg_ha = input.clay_pct.checked_mul(input.crop_cycle.gypsum_factor())?;
        let gypsum_t_ha = gypsum_kg_ha / dec!(1000);

        Some(LimingResult {
            limestone_t_ha,
            gypsum_kg_ha,
            gypsum_t_ha,
            limestone_total_t: limestone_t_ha.checked_mul(input.area)?,
            gypsum_total_t: gypsum_t_ha.checked_mul(input.area)?,
        })
    }

    fn zero(_input: &LimingInput) -> LimingResult {
        LimingResult {
            limestone_t_ha: Decimal::ZERO,
            gypsum_kg_ha: Decimal::ZERO,
            gypsum_t_ha: Decimal::ZERO,
            limestone_total_t: Decimal::ZERO,
            gypsum_total_t: Decimal::ZERO,
        }
    }

    fn summary(
        input: &LimingInput,
        r: &LimingResult,
    ) -> String {
        let mut lines = vec![
            "Calagem e Gessagem".to_string(),
            format!(
                "V atual: {}% | V desejado: {}%",
                input.current_v.normalize(),
                input.target_v.normalize()
            ),
            format!("Calcário (NC): {} t/ha", format_fixed(r.limestone_t_ha, 2)),
            format!(
                "Gesso (NG): {} kg/ha ({} t/ha, cultura {})",
                format_fixed(r.gypsum_kg_ha, 0),
                format_fixed(r.gypsum_t_ha, 2),
                input.crop_cycle.label()
            ),
        ];
        if input.area > Decimal::ZERO {
            lines.push(format!(
                "Total para {} ha: {} t de calcário e {} t de gesso",
                input.area.normalize(),
                format_fixed(r.limestone_total_t, 2),
                format_fixed(r.gypsum_total_t, 2)
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn input() -> LimingInput {
        LimingInput {
            current_v: dec!(35),
            target_v: dec!(60),
            ctc: dec!(8),
            prnt: dec!(80),
            clay_pct: dec!(40),
            crop_cycle: CropCycle::Annual,
            area: dec!(0),
        }
    }

    #[test]
    fn limestone_need_from_base_saturation() {
        let r = Liming::compute(&input());

        // (60 − 35) × 8 / 80
        assert_eq!(r.limestone_t_ha, dec!(2.5));
    }

    #[test]
    fn base_saturation_gap_out_of_range_reports_zero() {
        let i = LimingInput {
            current_v: dec!(-50000000000000000000000000000),
            target_v: dec!(50000000000000000000000000000),
            ..input()
        };

        assert_eq!(Liming::limestone_need(&i), None);
        assert_eq!(Liming::compute(&i), Liming::zero(&i));
    }

    #[test]
    fn no_limestone_when_target_not_above_current() {
        for (current, target) in [(dec!(60), dec!(60)), (dec!(70), dec!(60)), (dec!(0), dec!(0))] {
            for (ctc, prnt) in [(dec!(8), dec!(80)), (dec!(15), dec!(0.1)), (dec!(0), dec!(0))] {
                let mut i = input();
                i.current_v = current;
                i.target_v = target;
                i.ctc = ctc;
                i.prnt = prnt;

                assert_eq!(Liming::compute(&i).limestone_t_ha, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn zero_prnt_gives_zero_limestone() {
        let mut i = input();
        i.prnt = Decimal::ZERO;

        assert_eq!(Liming::compute(&i).limestone_t_ha, Decimal::ZERO);
    }

    #[test]
    fn gypsum_factor_follows_crop_cycle() {
        let annual = Liming::compute(&input());
        let mut i = input();
        i.crop_cycle = CropCycle::Perennial;
        let perennial = Liming::compute(&i);

        assert_eq!(annual.gypsum_kg_ha, dec!(2000));
        assert_eq!(annual.gypsum_t_ha, dec!(2));
        assert_eq!(perennial.gypsum_kg_ha, dec!(3000));
        assert_eq!(perennial.gypsum_t_ha, dec!(3));
    }

    #[test]
    fn area_totals_both_products() {
        let mut i = input();
        i.area = dec!(12);

        let r = Liming::compute(&i);

        assert_eq!(r.limestone_total_t, dec!(30));
        assert_eq!(r.gypsum_total_t, dec!(24));
    }

    #[test]
    fn crop_cycle_accepts_portuguese_names() {
        let inputs = FormInputs::new().with("crop_cycle", "Perene");

        assert_eq!(LimingInput::from(&inputs).crop_cycle, CropCycle::Perennial);
    }
}
