//! Shared fixtures for integration tests
//!
//! `seed_plant` loads a small plant into a store:
//!
//! | asset   | location | May 2024 breakdowns                       |
//! |---------|----------|-------------------------------------------|
//! | PRESS-1 | Line A   | May 2 HYD (4h), May 10 HYD (2h), May 20 ELEC (open) |
//! | LATHE-2 | Line A   | May 5 MECH (6h), plus a preventive on May 15 |
//! | PUMP-3  | Line B   | none                                      |
//!
//! Each asset logs 10 operating hours a day for May 1-20 (200h).

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use cmms_analytics::analytics::AnalysisWindow;
use cmms_analytics::models::{
    Asset, BudgetPeriod, CauseCategory, EventType, LaborRate, MaintenanceEvent,
    OperatingHoursEntry, RateScope,
};
use cmms_analytics::state::MaintenanceStore;

pub fn may(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

pub fn may_window() -> AnalysisWindow {
    AnalysisWindow::for_month(2024, 5).unwrap()
}

pub fn mechanic() -> (Option<String>, Option<String>) {
    (None, Some("mechanic".to_string()))
}

pub fn plant_events() -> Vec<MaintenanceEvent> {
    let (id, role) = mechanic();
    vec![
        MaintenanceEvent::new("PRESS-1", EventType::Breakdown, may(2, 8))
            .with_end(may(2, 12))
            .with_cause("HYD")
            .with_labor(4.0, 0.0)
            .with_technician(id.clone(), role.clone())
            .with_costs(300.0, 0.0)
            .with_downtime(4.0),
        MaintenanceEvent::new("PRESS-1", EventType::Breakdown, may(10, 8))
            .with_end(may(10, 10))
            .with_cause("HYD")
            .with_labor(2.0, 0.0)
            .with_technician(id.clone(), role.clone())
            .with_costs(100.0, 0.0)
            .with_downtime(2.0),
        MaintenanceEvent::new("PRESS-1", EventType::Breakdown, may(20, 8)).with_cause("ELEC"),
        MaintenanceEvent::new("LATHE-2", EventType::Breakdown, may(5, 9))
            .with_end(may(5, 15))
            .with_cause("MECH")
            .with_labor(6.0, 0.0)
            .with_technician(Some("tech-1".to_string()), Some("mechanic".to_string()))
            .with_downtime(6.0),
        MaintenanceEvent::new("LATHE-2", EventType::Preventive, may(15, 7))
            .with_end(may(15, 9))
            .with_labor(2.0, 0.0)
            .with_technician(id, role),
    ]
}

pub async fn seed_plant(store: &dyn MaintenanceStore) {
    for asset in [
        Asset::new("PRESS-1", "Hydraulic Press").with_location("Line A"),
        Asset::new("LATHE-2", "CNC Lathe").with_location("Line A"),
        Asset::new("PUMP-3", "Coolant Pump").with_location("Line B"),
    ] {
        store.save_asset(&asset).await.unwrap();
    }

    for category in [
        CauseCategory::new("HYD", "Hydraulic"),
        CauseCategory::new("ELEC", "Electrical"),
        CauseCategory::new("MECH", "Mechanical"),
    ] {
        store.save_category(&category).await.unwrap();
    }

    let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    store
        .save_labor_rate(&LaborRate::new(RateScope::Role("mechanic".into()), 50.0, from))
        .await
        .unwrap();
    store
        .save_labor_rate(&LaborRate::new(RateScope::User("tech-1".into()), 60.0, from))
        .await
        .unwrap();

    store
        .save_budget(&BudgetPeriod::new(2024, 5, 1000.0, 1000.0))
        .await
        .unwrap();

    for asset in ["PRESS-1", "LATHE-2", "PUMP-3"] {
        for day in 1..=20 {
            let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
            store
                .save_operating_hours(&OperatingHoursEntry::new(asset, date, 10.0))
                .await
                .unwrap();
        }
    }

    for event in plant_events() {
        store.save_event(&event).await.unwrap();
    }
}
