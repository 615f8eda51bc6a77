//! Periodic status sweep over the entity snapshot.
//!
//! Refreshes the cached `status` of insurance policies and certifications,
//! then reports schedule alerts, plan expiries, coverage gaps and stale
//! dwelling occupancy. Only the status refresh writes anything back.
//!
//! Status changes are planned against one read of the snapshot and applied
//! to a fresh read just before writing, so a status someone edited in the
//! meantime is left alone.

use std::path::Path;

use sda_core::clock::Clock;
use sda_core::compliance::{apply_sweep, check_required_coverage, plan_sweep, StatusPolicy, SweepReport};
use sda_core::occupancy::stale_occupancy;
use sda_core::plans::expiring_plans;
use sda_core::recurrence::{overdue, schedule_alerts, AlertSeverity};
use sda_core::snapshot::EntitySnapshot;
use sda_core::types::Date;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::snapshot_file::{load_snapshot, save_snapshot};

/// Counts from one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub insurance_examined: usize,
    pub insurance_changed: usize,
    pub certifications_examined: usize,
    pub certifications_changed: usize,
    pub schedule_alerts: usize,
    pub critical_schedule_alerts: usize,
    pub overdue_schedules: usize,
    pub expiring_plans: usize,
    pub coverage_gaps: usize,
    pub stale_dwellings: usize,
}

impl SweepSummary {
    /// Records whose cached status was rewritten.
    pub fn changed(&self) -> usize {
        self.insurance_changed + self.certifications_changed
    }
}

/// Status transitions planned against one read of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPlan {
    pub insurance: SweepReport,
    pub certifications: SweepReport,
}

impl StatusPlan {
    pub fn is_empty(&self) -> bool {
        self.insurance.changes.is_empty() && self.certifications.changes.is_empty()
    }
}

/// Number of planned transitions that were actually applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    pub insurance: usize,
    pub certifications: usize,
}

impl AppliedChanges {
    pub fn total(&self) -> usize {
        self.insurance + self.certifications
    }
}

/// Plan the forward-only status transitions for `snapshot` as of `today`.
pub fn plan_status_changes(snapshot: &EntitySnapshot, today: Date, config: &WorkerConfig) -> StatusPlan {
    StatusPlan {
        insurance: plan_sweep(
            &snapshot.insurance_policies,
            StatusPolicy::new(config.insurance_warning_days),
            today,
        ),
        certifications: plan_sweep(
            &snapshot.certifications,
            StatusPolicy::new(config.certification_warning_days),
            today,
        ),
    }
}

/// Apply `plan` to `snapshot`. A record whose status no longer matches
/// what the plan read is skipped.
pub fn apply_status_changes(snapshot: &mut EntitySnapshot, plan: &StatusPlan) -> AppliedChanges {
    AppliedChanges {
        insurance: apply_sweep(&mut snapshot.insurance_policies, &plan.insurance),
        certifications: apply_sweep(&mut snapshot.certifications, &plan.certifications),
    }
}

/// Sweep `snapshot` in place as of `today`.
pub fn run_sweep_once(snapshot: &mut EntitySnapshot, today: Date, config: &WorkerConfig) -> SweepSummary {
    let plan = plan_status_changes(snapshot, today, config);
    let applied = apply_status_changes(snapshot, &plan);
    summarize(snapshot, today, config, &plan, applied)
}

/// Reload `path`, apply `plan` to its current contents, and write it back
/// if any change still applies.
pub async fn commit_status_changes(path: &Path, plan: &StatusPlan) -> Result<AppliedChanges, WorkerError> {
    let mut current = load_snapshot(path).await?;
    let applied = apply_status_changes(&mut current, plan);
    let planned = plan.insurance.changed() + plan.certifications.changed();
    if applied.total() < planned {
        tracing::info!(
            planned,
            applied = applied.total(),
            "Status sweep: some records were edited since they were read"
        );
    }
    if applied.total() > 0 {
        save_snapshot(path, &current).await?;
    }
    Ok(applied)
}

/// Load the snapshot file, sweep it, and write back any status changes
/// that still apply.
pub async fn sweep_snapshot_file(path: &Path, today: Date, config: &WorkerConfig) -> Result<SweepSummary, WorkerError> {
    let mut snapshot = load_snapshot(path).await?;
    let plan = plan_status_changes(&snapshot, today, config);
    let applied = if plan.is_empty() {
        AppliedChanges::default()
    } else {
        commit_status_changes(path, &plan).await?
    };
    apply_status_changes(&mut snapshot, &plan);
    Ok(summarize(&snapshot, today, config, &plan, applied))
}

/// Log and count everything the sweep reports on besides status changes.
fn summarize(
    snapshot: &EntitySnapshot,
    today: Date,
    config: &WorkerConfig,
    plan: &StatusPlan,
    applied: AppliedChanges,
) -> SweepSummary {
    tracing::info!(
        insurance_examined = plan.insurance.examined,
        certifications_examined = plan.certifications.examined,
        changed = applied.total(),
        "Status sweep complete"
    );

    let alerts = schedule_alerts(&snapshot.schedules, today, config.schedule_alert_days);
    for alert in &alerts {
        match alert.severity {
            AlertSeverity::Critical => tracing::warn!(
                schedule_id = alert.schedule_id,
                property_id = alert.property_id,
                days_overdue = -alert.days_until_due,
                "Preventative maintenance overdue"
            ),
            AlertSeverity::Warning | AlertSeverity::Info => tracing::info!(
                schedule_id = alert.schedule_id,
                property_id = alert.property_id,
                days_until_due = alert.days_until_due,
                severity = ?alert.severity,
                "Preventative maintenance due soon"
            ),
        }
    }

    let plans = expiring_plans(&snapshot.plans, today, config.plan_expiry_days);
    for expiring in &plans {
        tracing::info!(
            plan_id = expiring.plan.id,
            participant_id = expiring.plan.participant_id,
            plan_end_date = %expiring.plan.plan_end_date,
            days_until_expiry = expiring.days_until_expiry,
            "NDIS plan expiring soon"
        );
    }

    let coverage = check_required_coverage(&snapshot.insurance_policies, today);
    let coverage_gaps = coverage.iter().filter(|c| !c.meets_minimum).count();
    for gap in coverage.iter().filter(|c| !c.meets_minimum) {
        tracing::warn!(
            insurance = gap.name,
            total_coverage = %gap.total_coverage,
            required = %gap.required_coverage,
            "Required insurance coverage not met"
        );
    }

    let stale = stale_occupancy(&snapshot.dwellings);
    if !stale.is_empty() {
        tracing::warn!(dwelling_ids = ?stale, "Dwelling occupancy status out of date");
    }

    SweepSummary {
        insurance_examined: plan.insurance.examined,
        insurance_changed: applied.insurance,
        certifications_examined: plan.certifications.examined,
        certifications_changed: applied.certifications,
        schedule_alerts: alerts.len(),
        critical_schedule_alerts: alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
            .count(),
        overdue_schedules: overdue(&snapshot.schedules, today).len(),
        expiring_plans: plans.len(),
        coverage_gaps,
        stale_dwellings: stale.len(),
    }
}

/// Run the sweep loop until `cancel` is triggered.
///
/// Failures are logged and retried on the next tick.
pub async fn run<C: Clock>(config: WorkerConfig, clock: C, cancel: CancellationToken) {
    tracing::info!(
        snapshot = %config.snapshot_path.display(),
        interval_secs = config.sweep_interval.as_secs(),
        "Status sweep job started"
    );

    let mut interval = tokio::time::interval(config.sweep_interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Status sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                let today = clock.today();
                match sweep_snapshot_file(&config.snapshot_path, today, &config).await {
                    Ok(summary) => {
                        if summary.changed() > 0 {
                            tracing::info!(%today, changed = summary.changed(), "Status sweep: statuses updated");
                        } else {
                            tracing::debug!(%today, "Status sweep: nothing to update");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Status sweep failed");
                    }
                }
            }
        }
    }
}
