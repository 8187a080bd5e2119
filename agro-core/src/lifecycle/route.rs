use std::fmt;

use crate::models::CalculatorType;

const ROUTE_PREFIX: &str = "/calculadoras/";

/// Address of a calculator page, optionally pointing at a stored report:
/// `/calculadoras/<slug>[?id=<n>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRoute {
    pub calculator_type: CalculatorType,
    pub report_id: Option<i64>,
}

impl PageRoute {
    pub fn new(calculator_type: CalculatorType) -> Self {
        Self {
            calculator_type,
            report_id: None,
        }
    }

    pub fn with_report(
        calculator_type: CalculatorType,
        report_id: i64,
    ) -> Self {
        Self {
            calculator_type,
            report_id: Some(report_id),
        }
    }

    /// Parses a page path. Unknown slugs are rejected; an `id` that is not an
    /// integer is ignored, as are other query parameters.
    pub fn parse(path: &str) -> Option<Self> {
        let rest = path.trim().strip_prefix(ROUTE_PREFIX)?;
        let (slug, query) = rest.split_once('?').unwrap_or((rest, ""));
        let calculator_type = CalculatorType::from_route_slug(slug.trim_end_matches('/'))?;

        let report_id = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "id")
            .and_then(|(_, value)| value.parse::<i64>().ok());

        Some(Self {
            calculator_type,
            report_id,
        })
    }
}

impl fmt::Display for PageRoute {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{ROUTE_PREFIX}{}", self.calculator_type.route_slug())?;
        if let Some(id) = self.report_id {
            write!(f, "?id={id}")?;
        }
        Ok(())
    }
}
