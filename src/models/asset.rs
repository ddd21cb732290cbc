use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A machine or other maintainable asset
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Asset {
    /// Stable asset identifier
    #[validate(length(min = 1, max = 255))]
    pub id: String,

    /// Display name
    #[validate(length(min = 1, max = 500))]
    pub name: String,

    /// Plant area / line the asset belongs to
    pub location: Option<String>,
}

impl Asset {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Failure cause classification used by technicians when closing breakdowns
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CauseCategory {
    #[validate(length(min = 1, max = 255))]
    pub id: String,

    #[validate(length(min = 1, max = 500))]
    pub name: String,
}

impl CauseCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Operating hours an asset logged on a given day
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct OperatingHoursEntry {
    #[validate(length(min = 1, max = 255))]
    pub asset_id: String,

    pub date: NaiveDate,

    #[validate(range(min = 0.0, max = 24.0))]
    pub hours: f64,
}

impl OperatingHoursEntry {
    pub fn new(asset_id: impl Into<String>, date: NaiveDate, hours: f64) -> Self {
        Self {
            asset_id: asset_id.into(),
            date,
            hours,
        }
    }
}
