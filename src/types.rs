use serde::{Deserialize, Serialize};

/// Common response wrapper used by every gallery API endpoint. `data` stays
/// untyped until `success` has been checked, since failures carry
/// `{"error": ...}` in the same slot.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Envelope {
    pub fn error_message(&self) -> String {
        match &self.data {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => match map.get("error") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "unknown error".to_string(),
            },
            serde_json::Value::Null => "unknown error".to_string(),
            other => other.to_string(),
        }
    }
}

/// One row of `/api/apps/metrics/{pkg}`. The upstream sends the full metric
/// record; only the fields the trend pipeline needs are kept.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricRecord {
    pub created_at: String,
    pub download_count: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppInfo {
    pub app_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pkg_name: Option<String>,
    #[serde(default)]
    pub developer_name: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub kind_type_name: Option<String>,
    #[serde(default)]
    pub kind_name: Option<String>,
    #[serde(default)]
    pub main_device_codes: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub listed_at: Option<String>,
}

impl AppInfo {
    pub fn devices(&self) -> Vec<DeviceKind> {
        self.main_device_codes
            .iter()
            .map(|c| DeviceKind::from_code(c))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppMetric {
    #[serde(default)]
    pub download_count: i64,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub version_code: Option<i64>,
    #[serde(default)]
    pub target_sdk: Option<i32>,
    #[serde(default)]
    pub minsdk: Option<i32>,
    #[serde(default)]
    pub compile_sdk_version: Option<i32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppRating {
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_star_rating_count: Option<i64>,
}

/// Payload of `/api/apps/app_id/{id}` and `/api/apps/pkg_name/{pkg}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppDetail {
    pub info: AppInfo,
    pub metric: AppMetric,
    #[serde(default)]
    pub rating: Option<AppRating>,
    /// `false` when the upstream could not refresh the listing (app probably delisted).
    #[serde(default = "default_true")]
    pub get_data: bool,
}

/// App detail as served to the dashboard: the upstream payload plus
/// readable device names for `main_device_codes`.
#[derive(Debug, Clone, Serialize)]
pub struct AppDetailView {
    #[serde(flatten)]
    pub detail: AppDetail,
    pub devices: Vec<String>,
}

impl From<AppDetail> for AppDetailView {
    fn from(detail: AppDetail) -> Self {
        let devices = detail.info.devices().iter().map(|d| d.to_string()).collect();
        Self { detail, devices }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppCount {
    pub total: i64,
    pub apps: i64,
    pub atomic_services: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketInfo {
    pub app_count: AppCount,
    pub developer_count: i64,
}

/// Table row for the paginated app list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppRow {
    pub info: AppInfo,
    pub metric: AppMetric,
    #[serde(default)]
    pub rating: Option<AppRating>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppPage {
    pub data: Vec<AppRow>,
    pub total_count: u64,
    pub current_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingMetric {
    pub download_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankingEntry {
    pub name: String,
    pub app_id: String,
    pub pkg_name: Option<String>,
    pub icon_url: Option<String>,
    pub download_count: i64,
}

impl From<(AppInfo, RankingMetric)> for RankingEntry {
    fn from((info, metric): (AppInfo, RankingMetric)) -> Self {
        Self {
            name: info.name,
            app_id: info.app_id,
            pkg_name: info.pkg_name,
            icon_url: info.icon_url,
            download_count: metric.download_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StarDistribution {
    pub star_1: i64,
    pub star_2: i64,
    pub star_3: i64,
    pub star_4: i64,
    pub star_5: i64,
}

impl StarDistribution {
    pub fn counts(&self) -> [i64; 5] {
        [self.star_1, self.star_2, self.star_3, self.star_4, self.star_5]
    }

    pub fn total(&self) -> i64 {
        self.counts().iter().sum()
    }
}

/// Body for `/api/submit`: ask the upstream to start tracking an app.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitRequest {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub pkg_name: Option<String>,
}

impl SubmitRequest {
    pub fn validate(&self) -> Result<(), String> {
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has(&self.app_id) && !has(&self.pkg_name) {
            return Err("either app_id or pkg_name is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Phone,
    SmartScreen,
    Tablet,
    SmartWatch,
    SportsWatch,
    Pc,
    Unknown(String),
}

impl DeviceKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => DeviceKind::Phone,
            "3" => DeviceKind::SmartScreen,
            "4" => DeviceKind::Tablet,
            "7" => DeviceKind::SmartWatch,
            "9" => DeviceKind::SportsWatch,
            "15" => DeviceKind::Pc,
            other => DeviceKind::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Phone => f.write_str("phone"),
            DeviceKind::SmartScreen => f.write_str("smart screen"),
            DeviceKind::Tablet => f.write_str("tablet"),
            DeviceKind::SmartWatch => f.write_str("smart watch"),
            DeviceKind::SportsWatch => f.write_str("sports watch"),
            DeviceKind::Pc => f.write_str("pc"),
            DeviceKind::Unknown(code) => write!(f, "unknown {code}"),
        }
    }
}

/// Sort direction + field for the app table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: String,
    pub desc: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            field: "download_count".to_string(),
            desc: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub term: String,
    pub key: String,
    pub exact: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            term: String::new(),
            key: "name".to_string(),
            exact: false,
        }
    }
}

/// Query string accepted by `/api/apps` and forwarded to `/api/apps/list/{page}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppListQuery {
    pub page: Option<u32>,
    pub sort: Option<String>,
    pub desc: Option<bool>,
    pub page_size: Option<u32>,
    pub search_key: Option<String>,
    pub search_value: Option<String>,
    pub search_exact: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RankingQueryParams {
    pub limit: Option<u32>,
    pub exclude_pattern: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub upstream_ok: bool,
    pub live_charts: usize,
    pub live_sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_codes() {
        assert_eq!(DeviceKind::from_code("0"), DeviceKind::Phone);
        assert_eq!(DeviceKind::from_code("15"), DeviceKind::Pc);
        assert_eq!(
            DeviceKind::from_code("42"),
            DeviceKind::Unknown("42".to_string())
        );
        assert_eq!(DeviceKind::from_code("42").to_string(), "unknown 42");
    }

    #[test]
    fn test_detail_view_names_devices() {
        let raw = serde_json::json!({
            "info": {"app_id": "C1", "name": "Maps", "main_device_codes": ["0", "4", "99"]},
            "metric": {"download_count": 5, "size_bytes": 1}
        });
        let detail: AppDetail = serde_json::from_value(raw).unwrap();
        let view = AppDetailView::from(detail);
        assert_eq!(view.devices, vec!["phone", "tablet", "unknown 99"]);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["info"]["app_id"], "C1");
        assert_eq!(json["devices"][1], "tablet");
    }

    #[test]
    fn test_ranking_entry_from_tuple() {
        let raw = serde_json::json!([
            [{"app_id": "C1", "name": "Maps", "pkg_name": "com.maps"}, {"download_count": 900}]
        ]);
        let rows: Vec<(AppInfo, RankingMetric)> = serde_json::from_value(raw).unwrap();
        let entries: Vec<RankingEntry> = rows.into_iter().map(RankingEntry::from).collect();
        assert_eq!(entries[0].name, "Maps");
        assert_eq!(entries[0].pkg_name.as_deref(), Some("com.maps"));
        assert_eq!(entries[0].download_count, 900);
    }

    #[test]
    fn test_metric_record_ignores_extra_fields() {
        let raw = serde_json::json!({
            "id": 7,
            "app_id": "C1",
            "download_count": 42,
            "created_at": "2025-01-01T10:00:00+08:00",
            "version": "1.0.0"
        });
        let rec: MetricRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(rec.download_count, 42);
    }

    #[test]
    fn test_submit_validation() {
        let empty = SubmitRequest {
            app_id: Some("  ".into()),
            pkg_name: None,
        };
        assert!(empty.validate().is_err());
        let ok = SubmitRequest {
            app_id: None,
            pkg_name: Some("com.example".into()),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_envelope_error_message() {
        let env: Envelope = serde_json::from_value(serde_json::json!({
            "success": false,
            "data": {"error": "Database error"}
        }))
        .unwrap();
        assert_eq!(env.error_message(), "Database error");

        let env: Envelope =
            serde_json::from_value(serde_json::json!({"success": false})).unwrap();
        assert_eq!(env.error_message(), "unknown error");
    }

    #[test]
    fn test_star_total() {
        let d = StarDistribution {
            star_1: 1,
            star_2: 2,
            star_3: 3,
            star_4: 4,
            star_5: 5,
        };
        assert_eq!(d.total(), 15);
    }
}
