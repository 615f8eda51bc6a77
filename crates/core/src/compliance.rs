//! Lifecycle status for time-bounded compliance records (insurance
//! policies and compliance certifications).
//!
//! [`derive_status`] is the single authority for a record's status. The
//! `status` field stored on each record is a cache refreshed by the sweep
//! ([`plan_sweep`] / [`apply_sweep`]), which only ever moves a record
//! toward expiry. `pending_renewal` is set by people and is never reset
//! to a less urgent status automatically.

use chrono::Days;
use serde::{Deserialize, Serialize};

use crate::entities::{ComplianceCertification, InsurancePolicy, InsuranceType};
use crate::types::{Date, DbId, Money};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Days before expiry at which an insurance policy becomes `expiring_soon`.
pub const INSURANCE_WARNING_DAYS: i64 = 60;
/// Days before expiry at which a certification becomes `expiring_soon`.
pub const CERTIFICATION_WARNING_DAYS: i64 = 90;

pub const STATUS_CURRENT: &str = "current";
pub const STATUS_EXPIRING_SOON: &str = "expiring_soon";
pub const STATUS_EXPIRED: &str = "expired";
pub const STATUS_PENDING_RENEWAL: &str = "pending_renewal";

/// Minimum public liability cover for NDIS providers (AUD).
pub const PUBLIC_LIABILITY_MINIMUM: i64 = 20_000_000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Current,
    ExpiringSoon,
    Expired,
    PendingRenewal,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => STATUS_CURRENT,
            Self::ExpiringSoon => STATUS_EXPIRING_SOON,
            Self::Expired => STATUS_EXPIRED,
            Self::PendingRenewal => STATUS_PENDING_RENEWAL,
        }
    }

    /// Rank on the path to expiry. `pending_renewal` sits alongside
    /// `expiring_soon`: a renewal is underway but the record has not lapsed.
    pub fn urgency(self) -> u8 {
        match self {
            Self::Current => 0,
            Self::ExpiringSoon | Self::PendingRenewal => 1,
            Self::Expired => 2,
        }
    }
}

/// Warning window applied when deriving status. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPolicy {
    warning_window_days: i64,
}

impl StatusPolicy {
    pub const INSURANCE: Self = Self {
        warning_window_days: INSURANCE_WARNING_DAYS,
    };
    pub const CERTIFICATION: Self = Self {
        warning_window_days: CERTIFICATION_WARNING_DAYS,
    };

    pub fn new(warning_window_days: i64) -> Self {
        Self {
            warning_window_days: warning_window_days.max(0),
        }
    }

    pub fn warning_window_days(&self) -> i64 {
        self.warning_window_days
    }
}

/// Status implied by `expiry` on `today`.
///
/// `expired` strictly after the expiry date; `expiring_soon` from the start
/// of the warning window through the expiry date itself (inclusive at both
/// ends); `current` before that. A window reaching past the calendar's end
/// saturates at `Date::MAX`.
pub fn derive_status(expiry: Date, policy: StatusPolicy, today: Date) -> ComplianceStatus {
    let window = u64::try_from(policy.warning_window_days).unwrap_or(0);
    let window_end = today.checked_add_days(Days::new(window)).unwrap_or(Date::MAX);
    if expiry < today {
        ComplianceStatus::Expired
    } else if expiry <= window_end {
        ComplianceStatus::ExpiringSoon
    } else {
        ComplianceStatus::Current
    }
}

// ---------------------------------------------------------------------------
// Time-bounded records
// ---------------------------------------------------------------------------

/// A record whose status is derived from an expiry date.
pub trait TimeBounded {
    fn record_id(&self) -> DbId;
    fn expiry_date(&self) -> Date;
    fn status(&self) -> ComplianceStatus;
    fn set_status(&mut self, status: ComplianceStatus);
}

impl TimeBounded for InsurancePolicy {
    fn record_id(&self) -> DbId {
        self.id
    }
    fn expiry_date(&self) -> Date {
        self.end_date
    }
    fn status(&self) -> ComplianceStatus {
        self.status
    }
    fn set_status(&mut self, status: ComplianceStatus) {
        self.status = status;
    }
}

impl TimeBounded for ComplianceCertification {
    fn record_id(&self) -> DbId {
        self.id
    }
    fn expiry_date(&self) -> Date {
        self.expiry_date
    }
    fn status(&self) -> ComplianceStatus {
        self.status
    }
    fn set_status(&mut self, status: ComplianceStatus) {
        self.status = status;
    }
}

/// Status to show for a record right now, regardless of how stale its
/// cached field is. A manual `pending_renewal` holds until the record
/// actually lapses.
pub fn effective_status<T: TimeBounded>(record: &T, policy: StatusPolicy, today: Date) -> ComplianceStatus {
    let derived = derive_status(record.expiry_date(), policy, today);
    match (record.status(), derived) {
        (ComplianceStatus::PendingRenewal, ComplianceStatus::Expired) => ComplianceStatus::Expired,
        (ComplianceStatus::PendingRenewal, _) => ComplianceStatus::PendingRenewal,
        (_, derived) => derived,
    }
}

/// Records in their warning window on `today`, soonest expiry first.
pub fn expiring_soon<T: TimeBounded>(records: &[T], policy: StatusPolicy, today: Date) -> Vec<&T> {
    let mut out: Vec<&T> = records
        .iter()
        .filter(|r| derive_status(r.expiry_date(), policy, today) == ComplianceStatus::ExpiringSoon)
        .collect();
    out.sort_by_key(|r| (r.expiry_date(), r.record_id()));
    out
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// One status transition proposed by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub record_id: DbId,
    pub from: ComplianceStatus,
    pub to: ComplianceStatus,
}

impl StatusChange {
    /// Compare-and-set guard: the change is only valid while the stored
    /// status is still the one the sweep read.
    pub fn applies_to(&self, stored: ComplianceStatus) -> bool {
        stored == self.from
    }
}

/// Outcome of sweeping a batch of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub changes: Vec<StatusChange>,
}

impl SweepReport {
    pub fn changed(&self) -> usize {
        self.changes.len()
    }
}

/// Compute the forward-only transitions for a batch without touching it.
///
/// A record moves to its derived status only when that status is strictly
/// more urgent than the cached one, so `expiring_soon` never falls back to
/// `current` and `pending_renewal` only ever advances to `expired`.
pub fn plan_sweep<T: TimeBounded>(records: &[T], policy: StatusPolicy, today: Date) -> SweepReport {
    let changes = records
        .iter()
        .filter_map(|record| {
            let stored = record.status();
            let derived = derive_status(record.expiry_date(), policy, today);
            (derived.urgency() > stored.urgency()).then_some(StatusChange {
                record_id: record.record_id(),
                from: stored,
                to: derived,
            })
        })
        .collect();
    SweepReport {
        examined: records.len(),
        changes,
    }
}

/// Apply planned changes, skipping any record whose status was edited
/// since the sweep read it. Returns the number of records updated.
pub fn apply_sweep<T: TimeBounded>(records: &mut [T], report: &SweepReport) -> usize {
    let mut applied = 0;
    for change in &report.changes {
        let Some(record) = records.iter_mut().find(|r| r.record_id() == change.record_id) else {
            continue;
        };
        if change.applies_to(record.status()) {
            record.set_status(change.to);
            applied += 1;
        } else {
            tracing::debug!(
                record_id = change.record_id,
                expected = change.from.as_str(),
                found = record.status().as_str(),
                "Status sweep: skipping record edited since read"
            );
        }
    }
    applied
}

/// Plan and apply a sweep in one step. Idempotent: a second call with the
/// same `today` reports no changes.
pub fn sweep_statuses<T: TimeBounded>(records: &mut [T], policy: StatusPolicy, today: Date) -> SweepReport {
    let report = plan_sweep(records, policy, today);
    let applied = apply_sweep(records, &report);
    tracing::info!(
        examined = report.examined,
        changed = applied,
        window_days = policy.warning_window_days(),
        "Status sweep complete"
    );
    report
}

// ---------------------------------------------------------------------------
// Required insurance coverage
// ---------------------------------------------------------------------------

/// An insurance class every NDIS provider must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredCoverage {
    pub insurance_type: InsuranceType,
    pub name: &'static str,
    pub minimum: i64,
}

pub const REQUIRED_COVERAGE: &[RequiredCoverage] = &[
    RequiredCoverage {
        insurance_type: InsuranceType::PublicLiability,
        name: "Public Liability ($20M minimum)",
        minimum: PUBLIC_LIABILITY_MINIMUM,
    },
    RequiredCoverage {
        insurance_type: InsuranceType::ProfessionalIndemnity,
        name: "Professional Indemnity",
        minimum: 0,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageCheck {
    pub insurance_type: InsuranceType,
    pub name: &'static str,
    pub has_coverage: bool,
    pub meets_minimum: bool,
    pub total_coverage: Money,
    pub required_coverage: Money,
    pub policy_ids: Vec<DbId>,
}

/// Check each required insurance class against the policies in force on
/// `today`. Lapsed policies, by date or by cached status, do not count.
pub fn check_required_coverage(policies: &[InsurancePolicy], today: Date) -> Vec<CoverageCheck> {
    REQUIRED_COVERAGE
        .iter()
        .map(|required| {
            let matching: Vec<&InsurancePolicy> = policies
                .iter()
                .filter(|p| {
                    p.insurance_type == required.insurance_type
                        && p.status != ComplianceStatus::Expired
                        && derive_status(p.end_date, StatusPolicy::INSURANCE, today)
                            != ComplianceStatus::Expired
                })
                .collect();
            let total_coverage: Money = matching.iter().map(|p| p.coverage_amount).sum();
            let required_coverage = Money::from(required.minimum);
            CoverageCheck {
                insurance_type: required.insurance_type,
                name: required.name,
                has_coverage: !matching.is_empty(),
                meets_minimum: !matching.is_empty() && total_coverage >= required_coverage,
                total_coverage,
                required_coverage,
                policy_ids: matching.iter().map(|p| p.id).collect(),
            }
        })
        .collect()
}
