use serde::{Deserialize, Serialize};
use validator::Validate;

/// Monthly maintenance budget
///
/// Actual spend is aggregated from maintenance events and never written back
/// into the budget row.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct BudgetPeriod {
    pub year: i32,

    #[validate(range(min = 1, max = 12))]
    pub month: u32,

    #[validate(range(min = 0.0))]
    pub budgeted_labor: f64,

    #[validate(range(min = 0.0))]
    pub budgeted_parts: f64,
}

impl BudgetPeriod {
    pub fn new(year: i32, month: u32, budgeted_labor: f64, budgeted_parts: f64) -> Self {
        Self {
            year,
            month,
            budgeted_labor,
            budgeted_parts,
        }
    }

    /// The (year, month) key; unique across all budget periods
    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    pub fn budgeted_total(&self) -> f64 {
        self.budgeted_labor + self.budgeted_parts
    }
}
