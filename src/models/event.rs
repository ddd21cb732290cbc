use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// One breakdown, repair or preventive action logged against an asset
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct MaintenanceEvent {
    /// Unique identifier
    pub id: Uuid,

    /// Asset the work was performed on
    #[validate(length(min = 1, max = 255))]
    pub asset_id: String,

    /// Kind of maintenance event
    pub event_type: EventType,

    /// When the event started (breakdown reported / work began)
    pub started_at: DateTime<Utc>,

    /// When the work was marked complete; `None` while the work order is open
    pub ended_at: Option<DateTime<Utc>>,

    /// Cause category, if the technician classified the failure
    pub cause_category_id: Option<String>,

    /// Total labor hours booked, overtime included
    #[validate(range(min = 0.0))]
    pub labor_hours: f64,

    /// Portion of `labor_hours` billed at the overtime rate
    #[validate(range(min = 0.0))]
    pub overtime_hours: f64,

    /// Technician who booked the hours
    pub technician_id: Option<String>,

    /// Role of the technician, used for role-scoped labor rates
    pub technician_role: Option<String>,

    /// Spare parts cost
    #[validate(range(min = 0.0))]
    pub parts_cost: f64,

    /// External service / contractor cost
    #[validate(range(min = 0.0))]
    pub external_cost: f64,

    /// Production downtime caused by the event
    #[validate(range(min = 0.0))]
    pub downtime_hours: f64,
}

impl MaintenanceEvent {
    /// Create a new open event with zeroed quantities
    pub fn new(asset_id: impl Into<String>, event_type: EventType, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id: asset_id.into(),
            event_type,
            started_at,
            ended_at: None,
            cause_category_id: None,
            labor_hours: 0.0,
            overtime_hours: 0.0,
            technician_id: None,
            technician_role: None,
            parts_cost: 0.0,
            external_cost: 0.0,
            downtime_hours: 0.0,
        }
    }

    pub fn with_end(mut self, ended_at: DateTime<Utc>) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    pub fn with_cause(mut self, category_id: impl Into<String>) -> Self {
        self.cause_category_id = Some(category_id.into());
        self
    }

    pub fn with_labor(mut self, labor_hours: f64, overtime_hours: f64) -> Self {
        self.labor_hours = labor_hours;
        self.overtime_hours = overtime_hours;
        self
    }

    pub fn with_technician(
        mut self,
        technician_id: Option<String>,
        technician_role: Option<String>,
    ) -> Self {
        self.technician_id = technician_id;
        self.technician_role = technician_role;
        self
    }

    pub fn with_costs(mut self, parts_cost: f64, external_cost: f64) -> Self {
        self.parts_cost = parts_cost;
        self.external_cost = external_cost;
        self
    }

    pub fn with_downtime(mut self, downtime_hours: f64) -> Self {
        self.downtime_hours = downtime_hours;
        self
    }

    /// Whether the event is a reactive failure
    pub fn is_breakdown(&self) -> bool {
        self.event_type == EventType::Breakdown
    }

    /// Whether the event is corrective work (breakdown or repair)
    pub fn is_corrective(&self) -> bool {
        matches!(self.event_type, EventType::Breakdown | EventType::Repair)
    }

    /// Repair duration in hours, only for closed events
    pub fn repair_hours(&self) -> Option<f64> {
        self.ended_at.map(|end| {
            end.signed_duration_since(self.started_at).num_seconds() as f64 / 3600.0
        })
    }

    /// Labor hours billed at the regular rate
    pub fn regular_hours(&self) -> f64 {
        (self.labor_hours - self.overtime_hours).max(0.0)
    }
}

/// Maintenance event classification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventType {
    Breakdown,
    Preventive,
    Repair,
}
