//! Preventative maintenance recurrence (next-due calculation, completion)
//! and the read-only projections dashboards build on it.
//!
//! Month-based frequencies clamp to the end of short months, see
//! [`crate::dates::add_months_clamped`].

use std::collections::BTreeMap;

use chrono::Days;
use serde::{Deserialize, Serialize};

use crate::dates::{add_months_clamped, days_between};
use crate::entities::PreventativeScheduleEntry;
use crate::error::CoreError;
use crate::types::{Date, DbId, Money};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Window used by the dashboard's "due soon" count.
pub const DUE_SOON_DAYS: i64 = 30;
/// Window within which a due schedule raises an alert.
pub const SCHEDULE_ALERT_DAYS: i64 = 7;
/// Alerts due within this many days are warnings rather than info.
pub const WARNING_ALERT_DAYS: i64 = 3;
/// Default number of entries returned by [`upcoming`].
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

pub const MAINTENANCE_REQUEST_TYPE_PREVENTATIVE: &str = "preventative";
pub const MAINTENANCE_PRIORITY_MEDIUM: &str = "medium";
pub const MAINTENANCE_STATUS_COMPLETED: &str = "completed";

// ---------------------------------------------------------------------------
// Frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyType {
    Weekly,
    Monthly,
    Quarterly,
    Biannually,
    Annually,
}

impl FrequencyType {
    pub const ALL: [Self; 5] = [
        Self::Weekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Biannually,
        Self::Annually,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Biannually => "biannually",
            Self::Annually => "annually",
        }
    }

    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "Unknown frequency type: '{s}'. Valid types: weekly, monthly, quarterly, biannually, annually"
                ))
            })
    }

    /// Calendar months per unit, or `None` for day-based frequencies.
    fn months_per_unit(self) -> Option<u32> {
        match self {
            Self::Weekly => None,
            Self::Monthly => Some(1),
            Self::Quarterly => Some(3),
            Self::Biannually => Some(6),
            Self::Annually => Some(12),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleCategory {
    Plumbing,
    Electrical,
    Appliances,
    Building,
    Grounds,
    Safety,
    General,
}

impl ScheduleCategory {
    pub const ALL: [Self; 7] = [
        Self::Plumbing,
        Self::Electrical,
        Self::Appliances,
        Self::Building,
        Self::Grounds,
        Self::Safety,
        Self::General,
    ];
}

/// A validated recurrence: `interval` repetitions of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    kind: FrequencyType,
    interval: u32,
}

impl Frequency {
    pub fn new(kind: FrequencyType, interval: i32) -> Result<Self, CoreError> {
        if interval < 1 {
            return Err(CoreError::InvalidInput(format!(
                "Frequency interval must be at least 1, got {interval}"
            )));
        }
        Ok(Self {
            kind,
            interval: interval as u32,
        })
    }

    pub fn kind(self) -> FrequencyType {
        self.kind
    }

    pub fn interval(self) -> u32 {
        self.interval
    }
}

/// The occurrence after `anchor`.
///
/// Weekly adds `7 x interval` days; month-based kinds add
/// `months_per_unit x interval` calendar months, clamping the day.
pub fn next_due_date(frequency: Frequency, anchor: Date) -> Result<Date, CoreError> {
    let overflow = || {
        CoreError::InvalidInput(format!(
            "Next due date for {} x{} from {anchor} is out of range",
            frequency.kind.as_str(),
            frequency.interval
        ))
    };
    match frequency.kind.months_per_unit() {
        None => {
            let days = u64::from(frequency.interval) * 7;
            anchor.checked_add_days(Days::new(days)).ok_or_else(overflow)
        }
        Some(per_unit) => {
            let months = per_unit.checked_mul(frequency.interval).ok_or_else(overflow)?;
            add_months_clamped(anchor, months)
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub actual_cost: Option<Money>,
    pub notes: Option<String>,
    /// Ask for a completed maintenance record to be drafted.
    pub create_maintenance_record: bool,
}

/// A completed maintenance request the caller may persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceRecordDraft {
    pub schedule_id: DbId,
    pub dwelling_id: DbId,
    pub request_type: &'static str,
    pub category: ScheduleCategory,
    pub priority: &'static str,
    pub status: &'static str,
    pub title: String,
    pub description: String,
    pub reported_date: Date,
    pub completed_date: Date,
    pub contractor_name: Option<String>,
    pub actual_cost: Option<Money>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub next_due_date: Date,
    pub maintenance_record: Option<MaintenanceRecordDraft>,
}

impl PreventativeScheduleEntry {
    /// Record a completion on `completed_on` and roll the next due date
    /// forward from it.
    ///
    /// A maintenance record is drafted only when requested and the
    /// schedule is tied to a dwelling; persisting it is up to the caller.
    pub fn complete(
        &mut self,
        completed_on: Date,
        options: CompletionOptions,
    ) -> Result<CompletionOutcome, CoreError> {
        let next = next_due_date(self.frequency()?, completed_on)?;
        self.last_completed_date = Some(completed_on);
        self.next_due_date = next;

        let maintenance_record = match (options.create_maintenance_record, self.dwelling_id) {
            (true, Some(dwelling_id)) => Some(MaintenanceRecordDraft {
                schedule_id: self.id,
                dwelling_id,
                request_type: MAINTENANCE_REQUEST_TYPE_PREVENTATIVE,
                category: self.category,
                priority: MAINTENANCE_PRIORITY_MEDIUM,
                status: MAINTENANCE_STATUS_COMPLETED,
                title: self.task_name.clone(),
                description: self
                    .description
                    .clone()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| format!("Preventative maintenance: {}", self.task_name)),
                reported_date: completed_on,
                completed_date: completed_on,
                contractor_name: self.contractor_name.clone(),
                actual_cost: options.actual_cost,
                notes: options.notes,
            }),
            (true, None) => {
                tracing::debug!(
                    schedule_id = self.id,
                    "Property-level schedule: no maintenance record drafted"
                );
                None
            }
            (false, _) => None,
        };

        Ok(CompletionOutcome {
            next_due_date: next,
            maintenance_record,
        })
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        self.next_due_date < today
    }

    /// Days from `today` until the due date; negative once overdue.
    pub fn days_until_due(&self, today: Date) -> i64 {
        days_between(today, self.next_due_date)
    }

    /// Days past the due date; negative while not yet due.
    pub fn days_overdue(&self, today: Date) -> i64 {
        days_between(self.next_due_date, today)
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// A schedule entry with its distance from today.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DueEntry<'a> {
    pub entry: &'a PreventativeScheduleEntry,
    pub days_until_due: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverdueEntry<'a> {
    pub entry: &'a PreventativeScheduleEntry,
    pub days_overdue: i64,
}

fn active(entries: &[PreventativeScheduleEntry]) -> impl Iterator<Item = &PreventativeScheduleEntry> {
    entries.iter().filter(|e| e.is_active)
}

/// Active entries due between today and `days` from now (inclusive),
/// soonest first.
pub fn due_within(entries: &[PreventativeScheduleEntry], today: Date, days: i64) -> Vec<DueEntry<'_>> {
    let mut due: Vec<DueEntry<'_>> = active(entries)
        .map(|entry| DueEntry {
            entry,
            days_until_due: entry.days_until_due(today),
        })
        .filter(|d| (0..=days).contains(&d.days_until_due))
        .collect();
    due.sort_by_key(|d| (d.days_until_due, d.entry.id));
    due
}

/// Active entries past their due date, most overdue first.
pub fn overdue(entries: &[PreventativeScheduleEntry], today: Date) -> Vec<OverdueEntry<'_>> {
    let mut late: Vec<OverdueEntry<'_>> = active(entries)
        .filter(|e| e.is_overdue(today))
        .map(|entry| OverdueEntry {
            entry,
            days_overdue: entry.days_overdue(today),
        })
        .collect();
    late.sort_by_key(|o| (std::cmp::Reverse(o.days_overdue), o.entry.id));
    late
}

/// The `limit` active entries closest to (or furthest past) due.
pub fn upcoming(entries: &[PreventativeScheduleEntry], today: Date, limit: usize) -> Vec<DueEntry<'_>> {
    let mut all: Vec<DueEntry<'_>> = active(entries)
        .map(|entry| DueEntry {
            entry,
            days_until_due: entry.days_until_due(today),
        })
        .collect();
    all.sort_by_key(|d| (d.days_until_due, d.entry.id));
    all.truncate(limit);
    all
}

/// Dashboard summary over a schedule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub overdue: usize,
    pub due_within_30_days: usize,
    pub by_category: BTreeMap<ScheduleCategory, usize>,
    pub by_frequency: BTreeMap<FrequencyType, usize>,
}

pub fn schedule_stats(entries: &[PreventativeScheduleEntry], today: Date) -> ScheduleStats {
    let mut by_category: BTreeMap<ScheduleCategory, usize> =
        ScheduleCategory::ALL.into_iter().map(|c| (c, 0)).collect();
    let mut by_frequency: BTreeMap<FrequencyType, usize> =
        FrequencyType::ALL.into_iter().map(|f| (f, 0)).collect();

    let mut active_count = 0;
    for entry in active(entries) {
        active_count += 1;
        *by_category.entry(entry.category).or_default() += 1;
        *by_frequency.entry(entry.frequency_type).or_default() += 1;
    }

    ScheduleStats {
        total: entries.len(),
        active: active_count,
        inactive: entries.len() - active_count,
        overdue: active(entries).filter(|e| e.is_overdue(today)).count(),
        due_within_30_days: due_within(entries, today, DUE_SOON_DAYS).len(),
        by_category,
        by_frequency,
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Overdue is critical, due within [`WARNING_ALERT_DAYS`] is a warning,
/// anything later is informational.
pub fn alert_severity(days_until_due: i64) -> AlertSeverity {
    if days_until_due < 0 {
        AlertSeverity::Critical
    } else if days_until_due <= WARNING_ALERT_DAYS {
        AlertSeverity::Warning
    } else {
        AlertSeverity::Info
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleAlert {
    pub schedule_id: DbId,
    pub property_id: DbId,
    pub dwelling_id: Option<DbId>,
    pub due_date: Date,
    pub days_until_due: i64,
    pub severity: AlertSeverity,
}

/// Alerts for active entries that are overdue or due within
/// `window_days`, most urgent first.
pub fn schedule_alerts(
    entries: &[PreventativeScheduleEntry],
    today: Date,
    window_days: i64,
) -> Vec<ScheduleAlert> {
    let mut alerts: Vec<ScheduleAlert> = active(entries)
        .map(|entry| (entry, entry.days_until_due(today)))
        .filter(|(_, days)| *days <= window_days)
        .map(|(entry, days)| ScheduleAlert {
            schedule_id: entry.id,
            property_id: entry.property_id,
            dwelling_id: entry.dwelling_id,
            due_date: entry.next_due_date,
            days_until_due: days,
            severity: alert_severity(days),
        })
        .collect();
    alerts.sort_by_key(|a| (a.days_until_due, a.schedule_id));
    alerts
}
