use crate::history::{SeriesPoint, TrendSeries};
use crate::types::{RankingEntry, StarDistribution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const DOWNLOAD_HISTORY_CANVAS: &str = "downloadHistoryChart";
pub const DOWNLOAD_INCREMENT_CANVAS: &str = "downloadIncrementChart";
pub const STAR_CANVAS: &str = "starChart";
pub const TOP_DOWNLOADS_CANVAS: &str = "top_down_chart";
pub const TOP_DOWNLOADS_FILTERED_CANVAS: &str = "top_down_no_hw_chart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetData {
    Points(Vec<SeriesPoint>),
    Values(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: DatasetData,
}

/// Renderer-agnostic chart description handed to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub title: String,
    /// `true` when datasets are `{x, y}` points on a time axis.
    pub time_axis: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Lower bound for the value axis as a fraction of the smallest value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_min_ratio: Option<f64>,
}

pub fn download_history_chart(series: &TrendSeries) -> ChartConfig {
    ChartConfig {
        kind: ChartKind::Line,
        title: "Downloads".to_string(),
        time_axis: true,
        labels: Vec::new(),
        datasets: vec![Dataset {
            label: "downloads".to_string(),
            data: DatasetData::Points(series.downloads.clone()),
        }],
        y_min_ratio: None,
    }
}

pub fn increment_chart(series: &TrendSeries) -> ChartConfig {
    ChartConfig {
        kind: ChartKind::Line,
        title: "Download increments".to_string(),
        time_axis: true,
        labels: Vec::new(),
        datasets: vec![
            Dataset {
                label: "increment".to_string(),
                data: DatasetData::Points(series.increments.clone()),
            },
            Dataset {
                label: "hourly increment".to_string(),
                data: DatasetData::Points(series.hourly_increments.clone()),
            },
        ],
        y_min_ratio: None,
    }
}

pub fn ranking_chart(title: &str, entries: &[RankingEntry], y_min_ratio: f64) -> ChartConfig {
    ChartConfig {
        kind: ChartKind::Bar,
        title: title.to_string(),
        time_axis: false,
        labels: entries.iter().map(|e| e.name.clone()).collect(),
        datasets: vec![Dataset {
            label: "downloads".to_string(),
            data: DatasetData::Values(entries.iter().map(|e| e.download_count).collect()),
        }],
        y_min_ratio: Some(y_min_ratio),
    }
}

pub fn star_chart(dist: &StarDistribution) -> ChartConfig {
    ChartConfig {
        kind: ChartKind::Doughnut,
        title: "Rating distribution".to_string(),
        time_axis: false,
        labels: (1..=5).map(|n| format!("{n}★")).collect(),
        datasets: vec![Dataset {
            label: "ratings".to_string(),
            data: DatasetData::Values(dist.counts().to_vec()),
        }],
        y_min_ratio: None,
    }
}

/// A chart currently bound to a canvas.
#[derive(Debug, Clone, Serialize)]
pub struct LiveChart {
    pub instance: u64,
    pub canvas: String,
    pub created_at: DateTime<Utc>,
    pub config: ChartConfig,
}

/// Owns the live chart for every canvas id. Mounting onto a canvas destroys
/// whatever was there first, so there is never more than one instance per canvas.
pub struct ChartRegistry {
    live: Mutex<HashMap<String, LiveChart>>,
    next_instance: AtomicU64,
}

pub type SharedCharts = Arc<ChartRegistry>;

impl ChartRegistry {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(HashMap::new()),
            next_instance: AtomicU64::new(1),
        }
    }

    /// Destroy the chart on `canvas` (if any) and create a new one from `config`.
    /// Returns the new instance id.
    pub fn mount(&self, canvas: &str, config: ChartConfig) -> u64 {
        let instance = self.next_instance.fetch_add(1, Ordering::Relaxed);
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = live.remove(canvas) {
            tracing::debug!(canvas, instance = old.instance, "destroying chart");
        }
        live.insert(
            canvas.to_string(),
            LiveChart {
                instance,
                canvas: canvas.to_string(),
                created_at: Utc::now(),
                config,
            },
        );
        tracing::debug!(canvas, instance, "chart mounted");
        instance
    }

    pub fn unmount(&self, canvas: &str) -> Option<LiveChart> {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(canvas);
        if let Some(ref chart) = removed {
            tracing::debug!(canvas, instance = chart.instance, "destroying chart");
        }
        removed
    }

    pub fn get(&self, canvas: &str) -> Option<LiveChart> {
        self.live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(canvas)
            .cloned()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for ChartRegistry {
    fn default() -> Self {
        Self::new()
    }
}
