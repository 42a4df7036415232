use crate::api::GalleryClient;
use crate::charts::{self, SharedCharts, DOWNLOAD_HISTORY_CANVAS, DOWNLOAD_INCREMENT_CANVAS};
use crate::error::AppResult;
use crate::history::{self, Trend, TrendOutcome};
use crate::types::MetricRecord;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailOutcome {
    Trend {
        pkg_name: String,
        trend: Trend,
        history_chart: u64,
        increment_chart: u64,
    },
    NoHistory {
        pkg_name: String,
    },
    FetchFailed {
        pkg_name: String,
        message: String,
    },
    /// A newer open (or a close) superseded this one; nothing was committed.
    Stale {
        pkg_name: String,
    },
}

/// The app detail panel. Each `open` takes a generation number; only the
/// latest generation may commit charts, so a slow response for an app the
/// user already navigated away from is discarded.
pub struct DetailController {
    client: GalleryClient,
    charts: SharedCharts,
    generation: AtomicU64,
    /// Package currently shown. Also serializes the check-and-commit step.
    active: Mutex<Option<String>>,
}

impl DetailController {
    pub fn new(client: GalleryClient, charts: SharedCharts) -> Self {
        Self {
            client,
            charts,
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    pub async fn open(&self, pkg_name: &str) -> DetailOutcome {
        let generation = self.begin();
        tracing::info!(pkg = %pkg_name, generation, "loading download history");
        let result = self.client.metrics_history(pkg_name).await;
        self.finish(generation, pkg_name, result)
    }

    /// Start a new request generation.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Commit a fetched history if `generation` is still the latest.
    pub fn finish(
        &self,
        generation: u64,
        pkg_name: &str,
        result: AppResult<Vec<MetricRecord>>,
    ) -> DetailOutcome {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(generation) {
            tracing::debug!(pkg = %pkg_name, generation, "discarding stale history response");
            return DetailOutcome::Stale {
                pkg_name: pkg_name.to_string(),
            };
        }
        *active = Some(pkg_name.to_string());

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(pkg = %pkg_name, error = %e, "failed to load download history");
                self.clear_charts();
                return DetailOutcome::FetchFailed {
                    pkg_name: pkg_name.to_string(),
                    message: "failed to load download history".to_string(),
                };
            }
        };

        let samples = history::samples_from_records(&records);
        match history::build_trend(&samples) {
            TrendOutcome::NoHistory => {
                self.clear_charts();
                DetailOutcome::NoHistory {
                    pkg_name: pkg_name.to_string(),
                }
            }
            TrendOutcome::Trend(trend) => {
                let history_chart = self.charts.mount(
                    DOWNLOAD_HISTORY_CANVAS,
                    charts::download_history_chart(&trend.series),
                );
                let increment_chart = self.charts.mount(
                    DOWNLOAD_INCREMENT_CANVAS,
                    charts::increment_chart(&trend.series),
                );
                tracing::info!(
                    pkg = %pkg_name,
                    points = trend.series.downloads.len(),
                    total_gain = trend.summary.total_gain,
                    "download trend ready"
                );
                DetailOutcome::Trend {
                    pkg_name: pkg_name.to_string(),
                    trend,
                    history_chart,
                    increment_chart,
                }
            }
        }
    }

    /// Close the panel: invalidate in-flight opens and drop its charts.
    pub fn close(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        *active = None;
        self.clear_charts();
    }

    pub fn active_pkg(&self) -> Option<String> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn clear_charts(&self) {
        self.charts.unmount(DOWNLOAD_HISTORY_CANVAS);
        self.charts.unmount(DOWNLOAD_INCREMENT_CANVAS);
    }
}
