use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Effective-dated hourly labor rate
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct LaborRate {
    pub id: Uuid,

    /// Who the rate applies to
    pub scope: RateScope,

    #[validate(range(min = 0.0))]
    pub hourly_rate: f64,

    /// Multiplier applied to overtime hours; falls back to the configured default
    #[validate(range(min = 1.0))]
    pub overtime_multiplier: Option<f64>,

    /// First day the rate applies (inclusive)
    pub effective_from: NaiveDate,

    /// Day the rate stops applying (exclusive); `None` is open-ended
    pub effective_to: Option<NaiveDate>,
}

impl LaborRate {
    pub fn new(scope: RateScope, hourly_rate: f64, effective_from: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            hourly_rate,
            overtime_multiplier: None,
            effective_from,
            effective_to: None,
        }
    }

    pub fn until(mut self, effective_to: NaiveDate) -> Self {
        self.effective_to = Some(effective_to);
        self
    }

    pub fn with_overtime_multiplier(mut self, multiplier: f64) -> Self {
        self.overtime_multiplier = Some(multiplier);
        self
    }

    /// Whether the rate is in force on `date`
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.effective_from && self.effective_to.map_or(true, |to| date < to)
    }

    /// Whether the validity windows of two rates intersect
    pub fn overlaps(&self, other: &LaborRate) -> bool {
        let self_before_other = self.effective_to.map_or(false, |to| to <= other.effective_from);
        let other_before_self = other.effective_to.map_or(false, |to| to <= self.effective_from);
        !(self_before_other || other_before_self)
    }

    /// An `effective_to` on or before `effective_from` describes an empty window
    pub fn has_valid_window(&self) -> bool {
        self.effective_to.map_or(true, |to| to > self.effective_from)
    }
}

/// Scope a labor rate applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateScope {
    /// A specific technician
    User(String),
    /// Every technician holding the role
    Role(String),
}

impl fmt::Display for RateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateScope::User(id) => write!(f, "user:{}", id),
            RateScope::Role(role) => write!(f, "role:{}", role),
        }
    }
}
