//! Two-ingredient ration by the Pearson square.
//!
//! Each ingredient takes as many parts as the distance between the other
//! ingredient's protein and the target. The mix only exists when the target
//! lies between the two ingredients.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::Calculator;
use crate::calculations::common::{format_fixed, percent_of, scaled};
use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixStatus {
    Feasible,
    Infeasible,
}

impl MixStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feasible => "feasible",
            Self::Infeasible => "infeasible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFormulationInput {
    pub protein_a_pct: Decimal,
    pub protein_b_pct: Decimal,
    pub target_protein_pct: Decimal,
    pub batch_kg: Decimal,
}

impl From<&FormInputs> for FeedFormulationInput {
    fn from(inputs: &FormInputs) -> Self {
        Self {
            protein_a_pct: inputs.number("protein_a_pct"),
            protein_b_pct: inputs.number("protein_b_pct"),
            target_protein_pct: inputs.number("target_protein_pct"),
            batch_kg: inputs.number("batch_kg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFormulationResult {
    pub parts_a: Decimal,
    pub parts_b: Decimal,
    pub share_a_pct: Decimal,
    pub share_b_pct: Decimal,
    pub kg_a: Decimal,
    pub kg_b: Decimal,
    pub status: MixStatus,
}

impl From<FeedFormulationResult> for ResultSet {
    fn from(r: FeedFormulationResult) -> Self {
        let mut set = ResultSet::new();
        set.insert("parts_a", r.parts_a);
        set.insert("parts_b", r.parts_b);
        set.insert("share_a_pct", r.share_a_pct);
        set.insert("share_b_pct", r.share_b_pct);
        set.insert("kg_a", r.kg_a);
        set.insert("kg_b", r.kg_b);
        set.insert("status", r.status.as_str());
        set
    }
}

pub struct FeedFormulation;

impl FeedFormulation {
    /// True when the target sits between two distinct ingredients.
    pub fn is_feasible(input: &FeedFormulationInput) -> bool {
        let low = input.protein_a_pct.min(input.protein_b_pct);
        let high = input.protein_a_pct.max(input.protein_b_pct);
        low != high && input.target_protein_pct >= low && input.target_protein_pct <= high
    }
}

impl Calculator for FeedFormulation {
    const TYPE: CalculatorType = CalculatorType::FeedFormulation;
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::number("protein_a_pct"),
        FieldSpec::number("protein_b_pct"),
        FieldSpec::number("target_protein_pct"),
        FieldSpec::number("batch_kg"),
    ];

    type Input = FeedFormulationInput;
    type Output = FeedFormulationResult;

    fn try_compute(input: &FeedFormulationInput) -> Option<FeedFormulationResult> {
        if !Self::is_feasible(input) {
            return Some(Self::zero(input));
        }

        let parts_a = input.protein_b_pct.checked_sub(input.target_protein_pct)?.abs();
        let parts_b = input.protein_a_pct.checked_sub(input.target_protein_pct)?.abs();
        let total = parts_a.checked_add(parts_b)?;
        let share_a_pct = percent_of(parts_a, total)?;
        let share_b_pct = percent_of(parts_b, total)?;

        Some(FeedFormulationResult {
            parts_a,
            parts_b,
            share_a_pct,
            share_b_pct,
            kg_a: scaled(input.batch_kg, share_a_pct, Decimal::ONE_HUNDRED)?,
            kg_b: scaled(input.batch_kg, share_b_pct, Decimal::ONE_HUNDRED)?,
            status: MixStatus::Feasible,
        })
    }

    fn zero(_input: &FeedFormulationInput) -> FeedFormulationResult {
        FeedFormulationResult {
            parts_a: Decimal::ZERO,
            parts_b: Decimal::ZERO,
            share_a_pct: Decimal::ZERO,
            share_b_pct: Decimal::ZERO,
            kg_a: Decimal::ZERO,
            kg_b: Decimal::ZERO,
            status: MixStatus::Infeasible,
        }
    }

    fn summary(
        input: &FeedFormulationInput,
        r: &FeedFormulationResult,
    ) -> String {
        let header = format!(
            "Formulação de Ração (Quadrado de Pearson)\nAlvo: {}% de proteína",
            input.target_protein_pct.normalize()
        );
        if r.status == MixStatus::Infeasible {
            return format!(
                "{header}\nMistura inviável: o alvo deve ficar entre {}% e {}%",
                input.protein_a_pct.normalize(),
                input.protein_b_pct.normalize()
            );
        }

        let mut lines = vec![
            header,
            format!(
                "Ingrediente A ({}%): {} partes ({}%)",
                input.protein_a_pct.normalize(),
                format_fixed(r.parts_a, 2),
                format_fixed(r.share_a_pct, 2)
            ),
            format!(
                "Ingrediente B ({}%): {} partes ({}%)",
                input.protein_b_pct.normalize(),
                format_fixed(r.parts_b, 2),
                format_fixed(r.share_b_pct, 2)
            ),
        ];
        if input.batch_kg > Decimal::ZERO {
            lines.push(format!(
                "Lote de {} kg: {} kg de A e {} kg de B",
                input.batch_kg.normalize(),
                format_fixed(r.kg_a, 1),
                format_fixed(r.kg_b, 1)
            ));
        }
        lines.join("\n")
    }
}
