//! Host CPU usage sampling.
//!
//! Reads the aggregate `cpu` line of `/proc/stat` every interval and
//! publishes the average usage since the first sample in the
//! `cpu_usage_average` gauge.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;

const PROC_STAT: &str = "/proc/stat";

/// Cumulative jiffies from one `/proc/stat` read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSample {
    pub busy: u64,
    pub total: u64,
}

impl CpuSample {
    /// Parse the aggregate `cpu` line of a `/proc/stat` dump.
    pub fn parse(stat: &str) -> Option<Self> {
        let line = stat.lines().find(|l| l.starts_with("cpu "))?;
        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        if fields.len() < 4 {
            return None;
        }
        // A corrupt line can overflow; treat it like an unreadable one.
        let total = fields.iter().try_fold(0u64, |acc, &f| acc.checked_add(f))?;
        // idle + iowait
        let idle = fields[3].checked_add(fields.get(4).copied().unwrap_or(0))?;
        Some(Self {
            busy: total.saturating_sub(idle),
            total,
        })
    }

    /// Percent of time spent busy between `earlier` and `self`.
    pub fn usage_since(&self, earlier: &CpuSample) -> Option<f64> {
        let total = self.total.checked_sub(earlier.total)?;
        if total == 0 {
            return None;
        }
        let busy = self.busy.saturating_sub(earlier.busy);
        Some(busy as f64 * 100.0 / total as f64)
    }
}

async fn read_sample(path: &Path) -> Option<CpuSample> {
    let stat = tokio::fs::read_to_string(path).await.ok()?;
    CpuSample::parse(&stat)
}

/// Sample CPU usage until shutdown.
pub async fn run_cpu_usage_average(interval: Duration, shutdown: ShutdownSignal) {
    run_cpu_usage_average_from(PathBuf::from(PROC_STAT), interval, shutdown).await
}

pub(crate) async fn run_cpu_usage_average_from(
    path: PathBuf,
    interval: Duration,
    mut shutdown: ShutdownSignal,
) {
    let first = read_sample(&path).await;
    if first.is_none() {
        warn!(path = %path.display(), "CPU statistics unavailable; usage will not be reported");
    }

    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let (Some(first), Some(now)) = (first, read_sample(&path).await) else {
                    continue;
                };
                if let Some(usage) = now.usage_since(&first) {
                    debug!(usage, "CPU usage average updated");
                    metrics::record_cpu_usage(usage);
                }
            }
        }
    }

    info!("Telemetry collection stopped");
}
