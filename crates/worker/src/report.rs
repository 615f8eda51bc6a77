use sda_core::clock::Clock;
use sda_core::dates::YearMonth;
use sda_core::distribution::{calculate_distributions, DistributionReport};
use sda_core::snapshot::SnapshotStore;

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::snapshot_file::{load_snapshot, write_json_atomic};

/// Compute the distribution report for the configured month (or the
/// clock's current month) and write it, rounded to cents, to
/// `report_output_path`.
pub async fn write_distribution_report<C: Clock>(
    config: &WorkerConfig,
    clock: &C,
) -> Result<DistributionReport, WorkerError> {
    let month = config
        .distribution_month
        .unwrap_or_else(|| YearMonth::of(clock.today()));

    let store = SnapshotStore::new(load_snapshot(&config.snapshot_path).await?)?;
    let report = calculate_distributions(&store, month, &config.distribution_options())?.rounded();

    write_json_atomic(&config.report_output_path, &report).await?;

    tracing::info!(
        %month,
        owners = report.owners.len(),
        participants = report.participant_count(),
        warnings = report.warnings.len(),
        output = %config.report_output_path.display(),
        "Distribution report written"
    );
    Ok(report)
}
