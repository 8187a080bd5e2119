//! Weight discount for grain delivered above the standard moisture, and the
//! drying cost charged per ton received.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{SACK_KG, format_brl, format_fixed, percent_of, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoistureDiscountInput {
    pub gross_weight_kg: Decimal,
    pub measured_moisture_pct: Decimal,
    pub standard_moisture_pct: Decimal,
    /// Drying fee per ton of gross weight (R$/t).
    pub drying_rate_ton: Decimal,
}

impl From<&FormInputs> for MoistureDiscountInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            gross_weight_kg: inputs.number("gross_weight_kg"),
            measured_moisture_pct: inputs.number("measured_moisture_pct"),
            standard_moisture_pct: inputs.number("standard_moisture_pct"),
            drying_rate_ton: inputs.number("drying_rate_ton"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoistureDiscountResult {
    pub net_weight_kg: Decimal,
    pub loss_kg: Decimal,
    pub loss_pct: Decimal,
    pub drying_cost: Decimal,
    pub net_sacks: Decimal,
}

impl From<MoistureDiscountResult> for ResultSet {
    fn from(r: MoistureDiscountResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("net_weight_kg", r.net_weight_kg);
        set.insert("loss_kg", r.loss_kg);
        set.insert("loss_pct", r.loss_pct);
        set.insert("drying_cost", r.drying_cost);
        set.insert("net_sacks", r.net_sacks);
        set
    }
}

pub struct MoistureDiscount;

impl Calculator for MoistureDiscount {
    const TYPE: CalculatorType = CalculatorType::MoistureDiscount;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("gross_weight_kg"),
        FieldSpec::number("measured_moisture_pct"),
        FieldSpec::number("standard_moisture_pct"),
        FieldSpec::number("drying_rate_ton"),
    ];

    type Input = MoistureDiscountInput;
    type Output = MoistureDiscountResult;

    fn try_compute(input: &MoistureDiscountInput) -> Option<MoistureDiscountResult> {
        let dry_matter_standard = dec!(100).checked_sub(input.standard_moisture_pct)?;
        if dry_matter_standard <= Decimal::ZERO {
            return Some(Self::zero(input));
        }

        let gross = input.gross_weight_kg;
        let net_weight_kg = if input.measured_moisture_pct > input.standard_moisture_pct {
            let dry_matter_measured = dec!(100).checked_sub(input.measured_moisture_pct)?;
            scaled(gross, dry_matter_measured, dry_matter_standard)?
        } else {
            gross
        };
        let loss_kg = gross.checked_sub(net_weight_kg)?;

        Some(MoistureDiscountResult {
            net_weight_kg,
            loss_kg,
            loss_pct: percent_of(loss_kg, gross)?,
            drying_cost: (gross / dec!(1000)).checked_mul(input.drying_rate_ton)?,
            net_sacks: net_weight_kg / SACK_KG,
        })
    }

    fn zero(_input: &MoistureDiscountInput) -> MoistureDiscountResult {
        MoistureDiscountResult {
            net_weight_kg: Decimal::ZERO,
            loss_kg: Decimal::ZERO,
            loss_pct: Decimal::ZERO,
            drying_cost: Decimal::ZERO,
            net_sacks: Decimal::ZERO,
        }
    }

    fn summary(
        input: &MoistureDiscountInput,
        r: &MoistureDiscountResult,
    ) -> String {
        let mut lines = vec![
            "Desconto de Umidade".to_string(),
            format!(
                "Peso bruto: {} kg a {}% (padrão {}%)",
                format_fixed(input.gross_weight_kg, 1),
                input.measured_moisture_pct.normalize(),
                input.standard_moisture_pct.normalize()
            ),
            format!("Peso líquido: {} kg ({} sc)", format_fixed(r.net_weight_kg, 1), format_fixed(r.net_sacks, 2)),
            format!("Quebra: {} kg ({}%)", format_fixed(r.loss_kg, 1), format_fixed(r.loss_pct, 2)),
        ];
        if input.drying_rate_ton > Decimal::ZERO {
            lines.push(format!("Custo de secagem: {}", format_brl(r.drying_cost)));
        }
        lines.join("\n")
    }
}
