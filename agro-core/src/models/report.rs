use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::input::{FormInputs, ResultSet};
use crate::models::CalculatorType;

/// The snapshot a report carries: the form as it was and the results computed
/// from it at save time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportData {
    pub inputs: FormInputs,
    pub results: ResultSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub owner_id: String,
    pub calculator_type: CalculatorType,
    pub title: String,
    pub client_name: Option<String>,
    pub data: ReportData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// For creating new reports (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReport {
    pub owner_id: String,
    pub calculator_type: CalculatorType,
    pub title: String,
    pub client_name: Option<String>,
    pub data: ReportData,
}

/// Fields to overwrite on an existing report. `None` leaves the stored value
/// alone; `data` replaces inputs and results together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPatch {
    pub title: Option<String>,
    pub client_name: Option<Option<String>>,
    pub data: Option<ReportData>,
}

impl ReportPatch {
    pub fn apply(
        self,
        report: &mut Report,
    ) {
        if let Some(title) = self.title {
            report.title = title;
        }
        if let Some(client_name) = self.client_name {
            report.client_name = client_name;
        }
        if let Some(data) = self.data {
            report.data = data;
        }
    }
}
