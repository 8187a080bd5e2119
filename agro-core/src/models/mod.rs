mod calculator_type;
mod client;
mod report;
mod session;

pub use calculator_type::CalculatorType;
pub use client::Client;
pub use report::{NewReport, Report, ReportData, ReportPatch};
pub use session::Session;
