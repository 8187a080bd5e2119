use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Grain crops with crop-specific constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crop {
    #[default]
    Soy,
    Corn,
}

impl Crop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soy => "soy",
            Self::Corn => "corn",
        }
    }

    /// Accepts the stored tag or the Portuguese name; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "soy" | "soja" => Some(Self::Soy),
            "corn" | "milho" => Some(Self::Corn),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Soy => "Soja",
            Self::Corn => "Milho",
        }
    }

    /// Grams per counted grain used to weigh a grain count.
    pub fn grain_weight_g(&self) -> Decimal {
        match self {
            Self::Soy => dec!(0.16),
            Self::Corn => dec!(0.35),
        }
    }

    /// Harvest loss above which the loss is critical (kg/ha).
    pub fn loss_threshold_kg_ha(&self) -> Decimal {
        match self {
            Self::Soy => dec!(60),
            Self::Corn => dec!(90),
        }
    }

    /// Mass of one bushel (kg).
    pub fn bushel_kg(&self) -> Decimal {
        match self {
            Self::Soy => dec!(27.2155),
            Self::Corn => dec!(25.4012),
        }
    }
}
