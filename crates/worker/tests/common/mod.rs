#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sda_core::snapshot::EntitySnapshot;
use sda_core::types::Date;
use sda_worker::config::WorkerConfig;
use serde_json::json;

/// The date every fixture expectation is written against.
pub fn today() -> Date {
    Date::from_ymd_opt(2025, 1, 15).unwrap()
}

/// One owner, one property at 10% with two villas, one funded resident,
/// plus compliance records and schedules straddling `today()`.
pub fn fixture_json() -> serde_json::Value {
    json!({
        "owners": [{
            "id": 1,
            "owner_type": "company",
            "company_name": "Harbour Holdings",
            "email": "accounts@harbour.example",
            "is_active": true
        }],
        "properties": [{
            "id": 10,
            "owner_id": 1,
            "property_name": "Banksia House",
            "address_line1": "12 Wattle St",
            "suburb": "Newtown",
            "state": "NSW",
            "postcode": "2042",
            "ownership_type": "investor",
            "management_fee_percent": "10",
            "is_active": true
        }],
        "dwellings": [
            {
                "id": 100,
                "property_id": 10,
                "dwelling_name": "Villa 1",
                "dwelling_type": "villa",
                "sda_design_category": "high_physical_support",
                "max_participants": 1,
                "current_occupancy": 1,
                "occupancy_status": "fully_occupied",
                "is_active": true
            },
            {
                "id": 101,
                "property_id": 10,
                "dwelling_name": "Villa 2",
                "dwelling_type": "villa",
                "sda_design_category": "high_physical_support",
                "max_participants": 1,
                "current_occupancy": 0,
                "occupancy_status": "vacant",
                "vacancy_date": "2024-11-01",
                "is_active": true
            }
        ],
        "participants": [{
            "id": 1000,
            "ndis_number": "430000001",
            "first_name": "Sam",
            "last_name": "Nguyen",
            "dwelling_id": 100,
            "move_in_date": "2024-07-01",
            "status": "active"
        }],
        "plans": [{
            "id": 5000,
            "participant_id": 1000,
            "plan_start_date": "2024-07-01",
            "plan_end_date": "2025-06-30",
            "plan_status": "current",
            "funding_management_type": "ndia_managed",
            "annual_sda_budget": "66431.04",
            "monthly_sda_amount": "5535.92",
            "reasonable_rent_contribution": "381.15",
            "rent_contribution_frequency": "fortnightly"
        }],
        "insurance_policies": [
            {
                "id": 1,
                "insurance_type": "public_liability",
                "policy_name": "Provider liability",
                "insurer": "Coastal Mutual",
                "policy_number": "PL-001",
                "coverage_amount": "20000000",
                "is_organization_wide": true,
                "start_date": "2024-02-10",
                "end_date": "2025-02-10",
                "status": "current"
            },
            {
                "id": 2,
                "insurance_type": "professional_indemnity",
                "policy_name": "Indemnity",
                "insurer": "Coastal Mutual",
                "policy_number": "PI-001",
                "coverage_amount": "5000000",
                "is_organization_wide": true,
                "start_date": "2025-01-01",
                "end_date": "2025-12-31",
                "status": "current"
            },
            {
                "id": 3,
                "insurance_type": "building",
                "policy_name": "Banksia House building",
                "insurer": "Harbour Insure",
                "policy_number": "B-010",
                "coverage_amount": "950000",
                "property_id": 10,
                "start_date": "2024-01-10",
                "end_date": "2025-01-10",
                "status": "pending_renewal"
            }
        ],
        "certifications": [
            {
                "id": 1,
                "certification_type": "sda_registration",
                "certification_name": "SDA enrolment",
                "property_id": 10,
                "issue_date": "2022-03-01",
                "expiry_date": "2025-03-01",
                "status": "current"
            },
            {
                "id": 2,
                "certification_type": "fire_safety",
                "certification_name": "Annual fire safety statement",
                "property_id": 10,
                "issue_date": "2025-01-01",
                "expiry_date": "2026-01-01",
                "status": "current"
            }
        ],
        "schedules": [
            {
                "id": 1,
                "property_id": 10,
                "dwelling_id": 100,
                "task_name": "Smoke alarm test",
                "category": "safety",
                "frequency_type": "monthly",
                "frequency_interval": 1,
                "next_due_date": "2025-01-17",
                "is_active": true
            },
            {
                "id": 2,
                "property_id": 10,
                "task_name": "Gutter clean",
                "category": "grounds",
                "frequency_type": "quarterly",
                "frequency_interval": 1,
                "next_due_date": "2025-01-20",
                "is_active": true
            },
            {
                "id": 3,
                "property_id": 10,
                "dwelling_id": 101,
                "task_name": "Hoist service",
                "category": "appliances",
                "frequency_type": "biannually",
                "frequency_interval": 1,
                "next_due_date": "2025-01-01",
                "is_active": true
            }
        ]
    })
}

pub fn fixture_snapshot() -> EntitySnapshot {
    serde_json::from_value(fixture_json()).unwrap()
}

/// Write the fixture into `dir` and return its path.
pub fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("snapshot.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&fixture_json()).unwrap()).unwrap();
    path
}

pub fn read_snapshot(path: &Path) -> EntitySnapshot {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// A config pointing at `snapshot_path`, with its report next to it.
pub fn test_config(snapshot_path: &Path) -> WorkerConfig {
    let mut config = WorkerConfig::new(snapshot_path);
    config.report_output_path = snapshot_path.with_file_name("report.json");
    config
}
