//! Formula engine: one pure calculator per [`CalculatorType`].
//!
//! Every calculator coerces a [`FormInputs`] map into its typed input, runs a
//! synchronous computation and flattens the typed output into a [`ResultSet`].
//! A divisor that coerces to zero never produces an error or a non-finite
//! value; the calculator returns its zero result instead. The same zero result
//! stands in when an intermediate value leaves the `Decimal` range.

pub mod break_even;
pub mod common;
pub mod crop;
pub mod feed_formulation;
pub mod fertilizer_dose;
pub mod fuel_efficiency;
pub mod harvest_loss;
pub mod liming;
pub mod moisture_discount;
pub mod operational_capacity;
pub mod seeding_rate;
pub mod soil_water;
pub mod stocking_rate;
pub mod yield_conversion;

pub use break_even::BreakEven;
pub use crop::Crop;
pub use feed_formulation::FeedFormulation;
pub use fertilizer_dose::FertilizerDose;
pub use fuel_efficiency::FuelEfficiency;
pub use harvest_loss::HarvestLoss;
pub use liming::Liming;
pub use moisture_discount::MoistureDiscount;
pub use operational_capacity::OperationalCapacity;
pub use seeding_rate::SeedingRate;
pub use soil_water::SoilWater;
pub use stocking_rate::StockingRate;
pub use yield_conversion::YieldConversion;

use crate::input::{FieldSpec, FormInputs, ResultSet};
use crate::models::CalculatorType;

/// Contract every calculator satisfies.
pub trait Calculator {
    /// Tag stored on reports produced by this calculator.
    const TYPE: CalculatorType;

    /// Every input field the page declares, with its default.
    const FIELDS: &'static [FieldSpec];

    /// Coerced input record.
    type Input: for<'a> From<&'a FormInputs>;

    /// Typed result record.
    type Output: Into<ResultSet>;

    /// Pure, deterministic computation in checked arithmetic. `None` means an
    /// intermediate value overflowed.
    fn try_compute(input: &Self::Input) -> Option<Self::Output>;

    /// Result reported for zero divisors and for out-of-range inputs.
    fn zero(input: &Self::Input) -> Self::Output;

    fn compute(input: &Self::Input) -> Self::Output {
        Self::try_compute(input).unwrap_or_else(|| {
            tracing::warn!(calculator = %Self::TYPE, "inputs out of range, reporting the zero result");
            Self::zero(input)
        })
    }

    /// Plain-text summary for sharing.
    fn summary(
        input: &Self::Input,
        output: &Self::Output,
    ) -> String;
}

/// Output of one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub results: ResultSet,
    pub summary: String,
}

/// A calculator with its type erased, so pages and stores can dispatch on
/// [`CalculatorType`] at runtime.
#[derive(Debug, Clone, Copy)]
pub struct FormulaEngine {
    calculator_type: CalculatorType,
    fields: &'static [FieldSpec],
    evaluate: fn(&FormInputs) -> Evaluation,
}

impl FormulaEngine {
    pub fn of<C: Calculator>() -> Self {
        Self {
            calculator_type: C::TYPE,
            fields: C::FIELDS,
            evaluate: evaluate_with::<C>,
        }
    }

    pub fn calculator_type(&self) -> CalculatorType {
        self.calculator_type
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn evaluate(
        &self,
        inputs: &FormInputs,
    ) -> Evaluation {
        (self.evaluate)(inputs)
    }

    pub fn compute(
        &self,
        inputs: &FormInputs,
    ) -> ResultSet {
        self.evaluate(inputs).results
    }
}

fn evaluate_with<C: Calculator>(inputs: &FormInputs) -> Evaluation {
    let input = C::Input::from(inputs);
    let output = C::compute(&input);
    let summary = C::summary(&input, &output);
    Evaluation {
        results: output.into(),
        summary,
    }
}

impl CalculatorType {
    /// The formula engine that produces reports of this type.
    pub fn engine(self) -> FormulaEngine {
        match self {
            Self::FertilizerDose => FormulaEngine::of::<FertilizerDose>(),
            Self::Liming => FormulaEngine::of::<Liming>(),
            Self::HarvestLoss => FormulaEngine::of::<HarvestLoss>(),
            Self::OperationalCapacity => FormulaEngine::of::<OperationalCapacity>(),
            Self::FuelEfficiency => FormulaEngine::of::<FuelEfficiency>(),
            Self::SoilWater => FormulaEngine::of::<SoilWater>(),
            Self::BreakEven => FormulaEngine::of::<BreakEven>(),
            Self::MoistureDiscount => FormulaEngine::of::<MoistureDiscount>(),
            Self::YieldConversion => FormulaEngine::of::<YieldConversion>(),
            Self::StockingRate => FormulaEngine::of::<StockingRate>(),
            Self::FeedFormulation => FormulaEngine::of::<FeedFormulation>(),
            Self::SeedingRate => FormulaEngine::of::<SeedingRate>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn every_engine_reports_its_own_type() {
        for t in CalculatorType::ALL {
            assert_eq!(t.engine().calculator_type(), t);
        }
    }

    #[test]
    fn every_engine_is_deterministic_on_defaults() {
        for t in CalculatorType::ALL {
            let engine = t.engine();
            let inputs = FormInputs::from_defaults(engine.fields());

            assert_eq!(engine.evaluate(&inputs), engine.evaluate(&inputs), "{t}");
        }
    }

    #[test]
    fn empty_forms_never_produce_empty_result_sets() {
        for t in CalculatorType::ALL {
            let results = t.engine().compute(&FormInputs::new());

            assert!(!results.is_empty(), "{t} returned no results");
        }
    }

    #[test]
    fn huge_inputs_fall_back_to_the_zero_result() {
        for t in CalculatorType::ALL {
            let engine = t.engine();
            let mut inputs = FormInputs::from_defaults(engine.fields());
            for field in engine.fields() {
                inputs.set(field.key, "79228162514264337593543950335");
            }

            let eval = engine.evaluate(&inputs);

            assert!(!eval.results.is_empty(), "{t}");
            assert!(!eval.summary.is_empty(), "{t}");
        }
    }

    #[test]
    fn field_keys_are_unique_per_calculator() {
        for t in CalculatorType::ALL {
            let fields = t.engine().fields();
            let mut keys: Vec<_> = fields.iter().map(|f| f.key).collect();
            keys.sort_unstable();
            keys.dedup();

            assert_eq!(keys.len(), fields.len(), "{t}");
        }
    }
}
