use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use sda_core::compliance::{CERTIFICATION_WARNING_DAYS, INSURANCE_WARNING_DAYS};
use sda_core::dates::YearMonth;
use sda_core::distribution::{DistributionOptions, IdleOwnerPolicy};
use sda_core::plans::PLAN_EXPIRY_WARNING_DAYS;
use sda_core::recurrence::SCHEDULE_ALERT_DAYS;
use sda_core::types::Money;

use crate::error::WorkerError;

/// Default seconds between status sweeps.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Upper bound on any look-ahead window, in days.
const MAX_WINDOW_DAYS: i64 = 3650;

/// Default report destination in distribution mode.
const DEFAULT_REPORT_OUTPUT_PATH: &str = "distribution-report.json";

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// JSON entity snapshot the worker reads and writes back.
    pub snapshot_path: PathBuf,
    pub sweep_interval: Duration,
    pub insurance_warning_days: i64,
    pub certification_warning_days: i64,
    pub schedule_alert_days: i64,
    pub plan_expiry_days: i64,
    /// When set, the worker writes one distribution report and exits.
    pub distribution_month: Option<YearMonth>,
    pub report_output_path: PathBuf,
    pub include_idle_owners: bool,
    /// Fee applied when neither plan nor property sets one.
    pub default_fee_percent: Money,
}

impl WorkerConfig {
    /// Defaults for everything except the snapshot location.
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            insurance_warning_days: INSURANCE_WARNING_DAYS,
            certification_warning_days: CERTIFICATION_WARNING_DAYS,
            schedule_alert_days: SCHEDULE_ALERT_DAYS,
            plan_expiry_days: PLAN_EXPIRY_WARNING_DAYS,
            distribution_month: None,
            report_output_path: PathBuf::from(DEFAULT_REPORT_OUTPUT_PATH),
            include_idle_owners: false,
            default_fee_percent: Decimal::ZERO,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var                          | Default                    |
    /// |----------------------------------|----------------------------|
    /// | `SNAPSHOT_PATH`                  | required                   |
    /// | `SWEEP_INTERVAL_SECS`            | `3600`                     |
    /// | `INSURANCE_WARNING_DAYS`         | `60`                       |
    /// | `CERTIFICATION_WARNING_DAYS`     | `90`                       |
    /// | `SCHEDULE_ALERT_DAYS`            | `7`                        |
    /// | `PLAN_EXPIRY_DAYS`               | `30`                       |
    /// | `DISTRIBUTION_MONTH`             | unset (sweep loop)         |
    /// | `REPORT_OUTPUT_PATH`             | `distribution-report.json` |
    /// | `INCLUDE_IDLE_OWNERS`            | `false`                    |
    /// | `DEFAULT_MANAGEMENT_FEE_PERCENT` | `0`                        |
    pub fn from_env() -> Result<Self, WorkerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let snapshot_path = lookup("SNAPSHOT_PATH")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| WorkerError::Config("SNAPSHOT_PATH is required".into()))?;
        let mut config = Self::new(snapshot_path);

        if let Some(secs) = parse_var::<u64>(&lookup, "SWEEP_INTERVAL_SECS")? {
            if secs == 0 {
                return Err(WorkerError::Config(
                    "SWEEP_INTERVAL_SECS must be greater than 0".into(),
                ));
            }
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(days) = parse_window(&lookup, "INSURANCE_WARNING_DAYS")? {
            config.insurance_warning_days = days;
        }
        if let Some(days) = parse_window(&lookup, "CERTIFICATION_WARNING_DAYS")? {
            config.certification_warning_days = days;
        }
        if let Some(days) = parse_window(&lookup, "SCHEDULE_ALERT_DAYS")? {
            config.schedule_alert_days = days;
        }
        if let Some(days) = parse_window(&lookup, "PLAN_EXPIRY_DAYS")? {
            config.plan_expiry_days = days;
        }
        config.distribution_month = parse_var::<YearMonth>(&lookup, "DISTRIBUTION_MONTH")?;
        if let Some(path) = lookup("REPORT_OUTPUT_PATH").filter(|v| !v.trim().is_empty()) {
            config.report_output_path = PathBuf::from(path);
        }
        if let Some(include) = parse_var::<bool>(&lookup, "INCLUDE_IDLE_OWNERS")? {
            config.include_idle_owners = include;
        }
        if let Some(fee) = parse_var::<Decimal>(&lookup, "DEFAULT_MANAGEMENT_FEE_PERCENT")? {
            config.default_fee_percent = fee;
        }

        Ok(config)
    }

    pub fn distribution_options(&self) -> DistributionOptions {
        DistributionOptions {
            default_fee_percent: self.default_fee_percent,
            idle_owners: if self.include_idle_owners {
                IdleOwnerPolicy::Include
            } else {
                IdleOwnerPolicy::Omit
            },
        }
    }
}

/// Parse an optional variable; unset or blank is `None`, garbage is an error.
fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, WorkerError> {
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| WorkerError::Config(format!("{name} has an invalid value: '{raw}'"))),
    }
}

/// Parse a window in days, bounded to `0..=MAX_WINDOW_DAYS`.
fn parse_window(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<i64>, WorkerError> {
    match parse_var::<i64>(lookup, name)? {
        Some(days) if !(0..=MAX_WINDOW_DAYS).contains(&days) => Err(WorkerError::Config(format!(
            "{name} must be between 0 and {MAX_WINDOW_DAYS}, got {days}"
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<WorkerConfig, WorkerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_snapshot_is_set() {
        let config = load(&[("SNAPSHOT_PATH", "/data/snapshot.json")]).unwrap();
        assert_eq!(config.snapshot_path, PathBuf::from("/data/snapshot.json"));
        assert_eq!(config.sweep_interval, Duration::from_secs(3600));
        assert_eq!(config.insurance_warning_days, 60);
        assert_eq!(config.certification_warning_days, 90);
        assert_eq!(config.schedule_alert_days, 7);
        assert_eq!(config.plan_expiry_days, 30);
        assert!(config.distribution_month.is_none());
        assert_eq!(config.distribution_options(), DistributionOptions::default());
    }

    #[test]
    fn snapshot_path_is_required() {
        assert_matches!(load(&[]), Err(WorkerError::Config(_)));
        assert_matches!(load(&[("SNAPSHOT_PATH", "  ")]), Err(WorkerError::Config(_)));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("SNAPSHOT_PATH", "s.json"),
            ("SWEEP_INTERVAL_SECS", "60"),
            ("INSURANCE_WARNING_DAYS", "30"),
            ("DISTRIBUTION_MONTH", "2025-01"),
            ("INCLUDE_IDLE_OWNERS", "true"),
            ("DEFAULT_MANAGEMENT_FEE_PERCENT", "12.5"),
        ])
        .unwrap();
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.insurance_warning_days, 30);
        assert_eq!(config.distribution_month, Some(YearMonth::new(2025, 1).unwrap()));
        let options = config.distribution_options();
        assert_eq!(options.idle_owners, IdleOwnerPolicy::Include);
        assert_eq!(options.default_fee_percent, Decimal::new(125, 1));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert_matches!(
            load(&[("SNAPSHOT_PATH", "s.json"), ("DISTRIBUTION_MONTH", "2025-13")]),
            Err(WorkerError::Config(_))
        );
        assert_matches!(
            load(&[("SNAPSHOT_PATH", "s.json"), ("SWEEP_INTERVAL_SECS", "0")]),
            Err(WorkerError::Config(_))
        );
        assert_matches!(
            load(&[("SNAPSHOT_PATH", "s.json"), ("CERTIFICATION_WARNING_DAYS", "-1")]),
            Err(WorkerError::Config(_))
        );
        assert_matches!(
            load(&[("SNAPSHOT_PATH", "s.json"), ("INCLUDE_IDLE_OWNERS", "yes")]),
            Err(WorkerError::Config(_))
        );
    }

    #[test]
    fn oversized_windows_are_rejected() {
        assert_matches!(
            load(&[("SNAPSHOT_PATH", "s.json"), ("INSURANCE_WARNING_DAYS", "200000000000000")]),
            Err(WorkerError::Config(_))
        );
        assert_matches!(
            load(&[("SNAPSHOT_PATH", "s.json"), ("PLAN_EXPIRY_DAYS", "3651")]),
            Err(WorkerError::Config(_))
        );
        let config = load(&[("SNAPSHOT_PATH", "s.json"), ("PLAN_EXPIRY_DAYS", "3650")]).unwrap();
        assert_eq!(config.plan_expiry_days, 3650);
    }
}
