//! Harvest loss from a ground sample behind the combine.
//!
//! The sample is either weighed directly or counted grain by grain; a count is
//! converted with the crop's grain weight. The result is extrapolated from
//! g/m² to kg/ha and compared to the crop's tolerance.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{SACK_KG, format_brl, format_fixed};
use crate::calculations::{Calculator, Crop};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMethod {
    #[default]
    Weight,
    Count,
}

impl SampleMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "weight" | "peso" => Some(Self::Weight),
            "count" | "contagem" => Some(Self::Count),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossStatus {
    Ok,
    Critical,
}

impl LossStatus {
    /// Critical only when the loss strictly exceeds the crop threshold.
    pub fn classify(
        kg_ha: Decimal,
        crop: Crop,
    ) -> Self {
        if kg_ha > crop.loss_threshold_kg_ha() {
            Self::Critical
        } else {
            Self::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "aceitável",
            Self::Critical => "crítica",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestLossInput {
    pub crop: Crop,
    pub method: SampleMethod,
    /// Weighed sample (g), used with [`SampleMethod::Weight`].
    pub sample_grams: Decimal,
    /// Counted grains, used with [`SampleMethod::Count`].
    pub grain_count: Decimal,
    /// Sampled ground (m²).
    pub sample_area_m2: Decimal,
    /// Optional price per sack, to value the loss.
    pub sack_price: Decimal,
}

impl From<&FormInputs> for HarvestLossInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            crop: Crop::parse(&inputs.text("crop")).unwrap_or_default(),
            method: SampleMethod::parse(&inputs.text("method")).unwrap_or_default(),
            sample_grams: inputs.number("sample_grams"),
            grain_count: inputs.number("grain_count"),
            sample_area_m2: inputs.number("sample_area_m2"),
            sack_price: inputs.number("sack_price"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestLossResult {
    pub grams_m2: Decimal,
    pub kg_ha: Decimal,
    pub sacks_ha: Decimal,
    pub threshold_kg_ha: Decimal,
    pub loss_value_ha: Decimal,
    pub status: LossStatus,
}

impl From<HarvestLossResult> for ResultSet {
    fn from(r: HarvestLossResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("grams_m2", r.grams_m2);
        set.insert("kg_ha", r.kg_ha);
        set.insert("sacks_ha", r.sacks_ha);
        set.insert("threshold_kg_ha", r.threshold_kg_ha);
        set.insert("loss_value_ha", r.loss_value_ha);
        set.insert("status", r.status.as_str());
        set
    }
}

pub struct HarvestLoss;

impl Calculator for HarvestLoss {
    const TYPE: CalculatorType = CalculatorType::HarvestLoss;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::choice("crop", "soy"),
        FieldSpec::choice("method", "weight"),
        FieldSpec::number("sample_grams"),
        FieldSpec::number("grain_count"),
        FieldSpec::number("sample_area_m2"),
        FieldSpec::number("sack_price"),
    ];

    type Input = HarvestLossInput;
    type Output = HarvestLossResult;

    fn try_compute(input: &HarvestLossInput) -> Option<HarvestLossResult> {
        if input.sample_area_m2.is_zero() {
            return Some(Self::zero(input));
        }

        let sample_grams = match input.method {
            SampleMethod::Weight => input.sample_grams,
            SampleMethod::Count => input.grain_count.checked_mul(input.crop.grain_weight_g())?,
        };
        let grams_m2 = sample_grams.checked_div(input.sample_area_m2)?;
        // 1 g/m² = 10 kg/ha
        let kg_ha = grams_m2.checked_mul(dec!(10))?;
        let sacks_ha = kg_ha / SACK_KG;

        Some(HarvestLossResult {
            grams_m2,
            kg_ha,
            sacks_ha,
            threshold_kg_ha: input.crop.loss_threshold_kg_ha(),
            loss_value_ha: sacks_ha.checked_mul(input.sack_price)?,
            status: LossStatus::classify(kg_ha, input.crop),
        })
    }

    fn zero(input: &HarvestLossInput) -> HarvestLossResult {
        HarvestLossResult {
            grams_m2: Decimal::ZERO,
            kg_ha: Decimal::ZERO,
            sacks_ha: Decimal::ZERO,
            threshold_kg_ha: input.crop.loss_threshold_kg_ha(),
            loss_value_ha: Decimal::ZERO,
            status: LossStatus::Ok,
        }
    }

    fn summary(
        input: &HarvestLossInput,
        r: &HarvestLossResult,
    ) -> String {
        let mut lines = vec![
            format!("Perdas na Colheita - {}", input.crop.label()),
            format!("Perda: {} g/m²", format_fixed(r.grams_m2, 2)),
            format!(
                "Perda: {} kg/ha ({} sc/ha)",
                format_fixed(r.kg_ha, 1),
                format_fixed(r.sacks_ha, 2)
            ),
            format!(
                "Situação: {} (limite {} kg/ha)",
                r.status.label(),
                r.threshold_kg_ha.normalize()
            ),
        ];
        if input.sack_price > Decimal::ZERO {
            lines.push(format!("Prejuízo: {}/ha", format_brl(r.loss_value_ha)));
        }
        lines.join("\n")
    }
}
