//! `sda-worker` -- scheduled job runner for the SDA core.
//!
//! Sweeps cached compliance statuses in an entity snapshot file on a
//! fixed interval, or, when `DISTRIBUTION_MONTH` is set, writes that
//! month's owner distribution report once and exits.
//!
//! # Environment variables
//!
//! | Variable                         | Required | Default                    | Description                          |
//! |----------------------------------|----------|----------------------------|--------------------------------------|
//! | `SNAPSHOT_PATH`                  | yes      | --                         | JSON entity snapshot to read/update  |
//! | `SWEEP_INTERVAL_SECS`            | no       | `3600`                     | Seconds between status sweeps        |
//! | `INSURANCE_WARNING_DAYS`         | no       | `60`                       | Insurance `expiring_soon` window     |
//! | `CERTIFICATION_WARNING_DAYS`     | no       | `90`                       | Certification `expiring_soon` window |
//! | `SCHEDULE_ALERT_DAYS`            | no       | `7`                        | Maintenance alert window             |
//! | `PLAN_EXPIRY_DAYS`               | no       | `30`                       | NDIS plan expiry look-ahead          |
//! | `DISTRIBUTION_MONTH`             | no       | --                         | `YYYY-MM`; switches to report mode   |
//! | `REPORT_OUTPUT_PATH`             | no       | `distribution-report.json` | Report destination                   |
//! | `INCLUDE_IDLE_OWNERS`            | no       | `false`                    | List owners with nothing to bill     |
//! | `DEFAULT_MANAGEMENT_FEE_PERCENT` | no       | `0`                        | Fee when plan and property set none  |

use sda_core::clock::SystemClock;
use sda_worker::config::WorkerConfig;
use sda_worker::{report, sweep};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sda_worker=info,sda_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid worker configuration");
        std::process::exit(1);
    });

    if let Some(month) = config.distribution_month {
        tracing::info!(%month, "Starting sda-worker in report mode");
        if let Err(e) = report::write_distribution_report(&config, &SystemClock).await {
            tracing::error!(error = %e, "Distribution report failed");
            std::process::exit(1);
        }
        return;
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                cancel.cancel();
            }
        }
    });

    tracing::info!("Starting sda-worker in sweep mode");
    sweep::run(config, SystemClock, cancel).await;
}
