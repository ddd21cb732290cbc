//! Labor rate resolution and cost settings

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::models::{LaborRate, MaintenanceEvent, RateScope};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cost-rate configuration supplied by the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    /// Monetary cost of one hour of production downtime; `None` leaves
    /// downtime cost unavailable rather than zero
    #[serde(default)]
    pub downtime_cost_per_hour: Option<f64>,

    /// Hourly rate used when no user or role rate applies
    #[serde(default)]
    pub default_labor_rate: Option<f64>,

    /// Overtime multiplier for rates that do not carry their own
    #[serde(default = "default_overtime_multiplier")]
    pub default_overtime_multiplier: f64,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            downtime_cost_per_hour: None,
            default_labor_rate: None,
            default_overtime_multiplier: default_overtime_multiplier(),
        }
    }
}

fn default_overtime_multiplier() -> f64 {
    1.5
}

impl CostSettings {
    /// Rates must be non-negative and the overtime multiplier at least 1
    pub fn validate(&self) -> AnalyticsResult<()> {
        let rates = [
            ("downtime_cost_per_hour", self.downtime_cost_per_hour),
            ("default_labor_rate", self.default_labor_rate),
        ];
        for (name, rate) in rates {
            if let Some(value) = rate {
                if !value.is_finite() || value < 0.0 {
                    return Err(AnalyticsError::InvalidConfiguration(format!(
                        "{} must be a non-negative amount, got {}",
                        name, value
                    )));
                }
            }
        }

        if !self.default_overtime_multiplier.is_finite() || self.default_overtime_multiplier < 1.0 {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "default_overtime_multiplier must be at least 1.0, got {}",
                self.default_overtime_multiplier
            )));
        }
        Ok(())
    }
}

/// Where a resolved rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    User,
    Role,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRate {
    pub hourly_rate: f64,
    pub overtime_multiplier: f64,
    pub source: RateSource,
}

/// Index over labor rates for per-event cost resolution
///
/// Expects rates that already passed overlap validation, so at most one rate
/// per scope is active on any day.
pub struct LaborRateTable<'a> {
    by_scope: HashMap<&'a RateScope, Vec<&'a LaborRate>>,
    settings: &'a CostSettings,
}

impl<'a> LaborRateTable<'a> {
    pub fn new(rates: &'a [LaborRate], settings: &'a CostSettings) -> Self {
        let mut by_scope: HashMap<&RateScope, Vec<&LaborRate>> = HashMap::new();
        for rate in rates {
            by_scope.entry(&rate.scope).or_default().push(rate);
        }
        Self { by_scope, settings }
    }

    fn active(&self, scope: &RateScope, event: &MaintenanceEvent) -> Option<&'a LaborRate> {
        let date = event.started_at.date_naive();
        self.by_scope
            .get(scope)
            .and_then(|rates| rates.iter().find(|r| r.is_active_on(date)).copied())
    }

    /// User rate, then role rate, then the configured default
    pub fn resolve(&self, event: &MaintenanceEvent) -> Option<ResolvedRate> {
        let user_rate = event
            .technician_id
            .as_ref()
            .and_then(|id| self.active(&RateScope::User(id.clone()), event))
            .map(|r| (r, RateSource::User));

        let scoped = user_rate.or_else(|| {
            event
                .technician_role
                .as_ref()
                .and_then(|role| self.active(&RateScope::Role(role.clone()), event))
                .map(|r| (r, RateSource::Role))
        });

        match scoped {
            Some((rate, source)) => Some(ResolvedRate {
                hourly_rate: rate.hourly_rate,
                overtime_multiplier: rate
                    .overtime_multiplier
                    .unwrap_or(self.settings.default_overtime_multiplier),
                source,
            }),
            None => self.settings.default_labor_rate.map(|hourly_rate| ResolvedRate {
                hourly_rate,
                overtime_multiplier: self.settings.default_overtime_multiplier,
                source: RateSource::Default,
            }),
        }
    }

    /// Labor cost of an event; `None` when hours were booked but no rate applies
    pub fn labor_cost(&self, event: &MaintenanceEvent) -> Option<f64> {
        if event.labor_hours == 0.0 {
            return Some(0.0);
        }
        self.resolve(event).map(|rate| {
            event.regular_hours() * rate.hourly_rate
                + event.overtime_hours * rate.hourly_rate * rate.overtime_multiplier
        })
    }
}
