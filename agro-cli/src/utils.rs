use agro_core::{CalculatorType, PageRoute};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    #[error("expected KEY=VALUE, got '{0}'")]
    Assignment(String),

    #[error("unknown calculator '{0}'; run `agrocalc calculators` for the list")]
    UnknownCalculator(String),

    #[error("'{0}' is neither a report id nor a calculator page route")]
    Target(String),
}

/// Splits a `--set key=value` argument. The value may be empty or contain
/// further `=` signs; the key may not be blank.
pub fn parse_assignment(s: &str) -> Result<(String, String), ArgError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ArgError::Assignment(s.to_string())),
    }
}

/// Accepts a calculator's stored tag (`break_even`) or its page slug
/// (`ponto-equilibrio`).
pub fn parse_calculator(s: &str) -> Result<CalculatorType, ArgError> {
    let trimmed = s.trim();
    CalculatorType::parse(trimmed)
        .or_else(|| CalculatorType::from_route_slug(trimmed))
        .ok_or_else(|| ArgError::UnknownCalculator(s.to_string()))
}

/// What `open` was pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTarget {
    Id(i64),
    Route(PageRoute),
}

pub fn parse_report_target(s: &str) -> Result<ReportTarget, ArgError> {
    let trimmed = s.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(ReportTarget::Id(id));
    }
    PageRoute::parse(trimmed)
        .map(ReportTarget::Route)
        .ok_or_else(|| ArgError::Target(s.to_string()))
}
