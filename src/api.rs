use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use crate::types::{
    AppDetail, AppInfo, AppListQuery, AppPage, Envelope, MarketInfo, MetricRecord, RankingEntry,
    RankingMetric, StarDistribution, SubmitRequest,
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Typed client for the gallery REST API (`{base_url}/api/...`).
#[derive(Clone)]
pub struct GalleryClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GalleryClient {
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Validation(format!("invalid upstream URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "upstream URL cannot be used as a base: {base_url}"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// Build `{base}/api/{segments...}` with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = self.endpoint(segments);
        tracing::debug!(url = %url, "upstream GET");
        let resp = self.client.get(url).query(query).send().await?;
        Self::unwrap_envelope(resp).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus(status.as_u16()));
        }
        let envelope: Envelope = resp.json().await?;
        if !envelope.success {
            return Err(AppError::UpstreamRejected(envelope.error_message()));
        }
        serde_json::from_value(envelope.data)
            .map_err(|e| AppError::Internal(format!("unexpected upstream payload: {e}")))
    }

    pub async fn market_info(&self) -> AppResult<MarketInfo> {
        self.get(&["market_info"], &[]).await
    }

    pub async fn app_list(&self, page: u32, query: &AppListQuery) -> AppResult<AppPage> {
        let page = page.max(1).to_string();
        let mut params: Vec<(&str, String)> = vec![("page", page.clone())];
        if let Some(ref sort) = query.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(desc) = query.desc {
            params.push(("desc", desc.to_string()));
        }
        if let Some(size) = query.page_size {
            params.push(("page_size", size.to_string()));
        }
        if let Some(value) = query.search_value.as_deref().filter(|v| !v.trim().is_empty()) {
            params.push((
                "search_key",
                query.search_key.clone().unwrap_or_else(|| "name".to_string()),
            ));
            params.push(("search_value", value.to_string()));
            params.push(("search_exact", query.search_exact.unwrap_or(false).to_string()));
        }
        self.get(&["apps", "list", page.as_str()], &params).await
    }

    pub async fn app_by_id(&self, app_id: &str) -> AppResult<AppDetail> {
        self.get(&["apps", "app_id", app_id], &[]).await
    }

    pub async fn app_by_pkg(&self, pkg_name: &str) -> AppResult<AppDetail> {
        self.get(&["apps", "pkg_name", pkg_name], &[]).await
    }

    /// Download history for one package, newest-first as sent by the upstream.
    pub async fn metrics_history(&self, pkg_name: &str) -> AppResult<Vec<MetricRecord>> {
        let data: Option<Vec<MetricRecord>> =
            self.get(&["apps", "metrics", pkg_name], &[]).await?;
        Ok(data.unwrap_or_default())
    }

    pub async fn top_downloads(
        &self,
        limit: u32,
        exclude_pattern: Option<&str>,
    ) -> AppResult<Vec<RankingEntry>> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(pattern) = exclude_pattern.filter(|p| !p.is_empty()) {
            params.push(("exclude_pattern", pattern.to_string()));
        }
        let rows: Vec<(AppInfo, RankingMetric)> =
            self.get(&["rankings", "top-downloads"], &params).await?;
        Ok(rows.into_iter().map(RankingEntry::from).collect())
    }

    pub async fn star_distribution(&self) -> AppResult<StarDistribution> {
        self.get(&["charts", "star-distribution"], &[]).await
    }

    /// Forward a submission; returns the upstream's `data` verbatim.
    pub async fn submit(&self, request: &SubmitRequest) -> AppResult<serde_json::Value> {
        let url = self.endpoint(&["submit"]);
        let resp = self.client.post(url).json(request).send().await?;
        Self::unwrap_envelope(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GalleryClient {
        GalleryClient::new(&UpstreamConfig {
            base_url: base.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let c = client("http://gallery.local:8080");
        assert_eq!(
            c.endpoint(&["apps", "metrics", "com.example.app"]).as_str(),
            "http://gallery.local:8080/api/apps/metrics/com.example.app"
        );
    }

    #[test]
    fn test_endpoint_respects_base_path_and_trailing_slash() {
        let c = client("https://host.example/gallery/");
        assert_eq!(
            c.endpoint(&["market_info"]).as_str(),
            "https://host.example/gallery/api/market_info"
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let c = client("http://h");
        assert_eq!(
            c.endpoint(&["apps", "app_id", "a b/c"]).as_str(),
            "http://h/api/apps/app_id/a%20b%2Fc"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = GalleryClient::new(&UpstreamConfig {
            base_url: "mailto:someone@example.com".to_string(),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
