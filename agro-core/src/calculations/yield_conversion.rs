//! Conversion between Brazilian sacks per hectare and US bushels per acre.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{SACK_KG, format_fixed};
use crate::calculations::{Calculator, Crop};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

pub const ACRES_PER_HA: Decimal = dec!(2.47105);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldUnit {
    #[default]
    SacksHa,
    BushelsAcre,
}

impl YieldUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sacks_ha" | "sc/ha" | "sc_ha" => Some(Self::SacksHa),
            "bushels_acre" | "bu/ac" | "bu_ac" => Some(Self::BushelsAcre),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::SacksHa => "sc/ha",
            Self::BushelsAcre => "bu/ac",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldConversionInput {
    pub crop: Crop,
    pub unit: YieldUnit,
    pub value: Decimal,
}

impl From<&FormInputs> for YieldConversionInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            crop: Crop::parse(&inputs.text("crop")).unwrap_or_default(),
            unit: YieldUnit::parse(&inputs.text("unit")).unwrap_or_default(),
            value: inputs.number("value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldConversionResult {
    pub sacks_ha: Decimal,
    pub kg_ha: Decimal,
    pub t_ha: Decimal,
    pub bushels_acre: Decimal,
}

impl From<YieldConversionResult> for ResultSet {
    fn from(r: YieldConversionResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("sacks_ha", r.sacks_ha);
        set.insert("kg_ha", r.kg_ha);
        set.insert("t_ha", r.t_ha);
        set.insert("bushels_acre", r.bushels_acre);
        set
    }
}

pub struct YieldConversion;

impl Calculator for YieldConversion {
    const TYPE: CalculatorType = CalculatorType::YieldConversion;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::choice("crop", "soy"),
        FieldSpec::choice("unit", "sacks_ha"),
        FieldSpec::number("value"),
    ];

    type Input = YieldConversionInput;
    type Output = YieldConversionResult;

    fn try_compute(input: &YieldConversionInput) -> Option<YieldConversionResult> {
        let bushel_kg = input.crop.bushel_kg();
        let kg_ha = match input.unit {
            YieldUnit::SacksHa => input.value.checked_mul(SACK_KG)?,
            YieldUnit::BushelsAcre => input.value.checked_mul(bushel_kg)?.checked_mul(ACRES_PER_HA)?,
        };

        Some(YieldConversionResult {
            sacks_ha: kg_ha / SACK_KG,
            kg_ha,
            t_ha: kg_ha / dec!(1000),
            bushels_acre: kg_ha.checked_div(bushel_kg)?.checked_div(ACRES_PER_HA)?,
        })
    }

    fn zero(_input: &YieldConversionInput) -> YieldConversionResult {
        YieldConversionResult {
            sacks_ha: Decimal::ZERO,
            kg_ha: Decimal::ZERO,
            t_ha: Decimal::ZERO,
            bushels_acre: Decimal::ZERO,
        }
    }

    fn summary(
        input: &YieldConversionInput,
        r: &YieldConversionResult,
    ) -> String {
        [
            format!("Conversão de Produtividade - {}", input.crop.label()),
            format!("Entrada: {} {}", input.value.normalize(), input.unit.symbol()),
            format!("{} sc/ha", format_fixed(r.sacks_ha, 2)),
            format!("{} kg/ha ({} t/ha)", format_fixed(r.kg_ha, 1), format_fixed(r.t_ha, 2)),
            format!("{} bu/ac", format_fixed(r.bushels_acre, 2)),
        ]
        .join("\n")
    }
}
