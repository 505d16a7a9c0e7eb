// Graphite backend implementation
use crate::application::metrics_backend::{MetricsBackend, MetricsRequest, TargetQuery};
use crate::domain::datapoint::{MetricSeries, RawDatapoint};
use crate::domain::error::BackendError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GraphiteBackend {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

/// One entry of Graphite's `format=json` render output. Timestamps are
/// seconds.
#[derive(Debug, Deserialize)]
struct GraphiteSeries {
    target: String,
    datapoints: Vec<(Option<f64>, Option<i64>)>,
}

impl GraphiteBackend {
    pub fn new(url: String, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn target_expression(query: &TargetQuery) -> String {
        match query.bucket_size {
            Some(bucket) => format!("summarize({},\"{}s\")", query.target, bucket),
            None => query.target.clone(),
        }
    }

    fn build_render_url(&self, request: &MetricsRequest) -> String {
        let mut url = format!(
            "{}/render/?format=json&from=-{}s",
            self.url, request.from_seconds
        );
        for query in &request.targets {
            url.push_str("&target=");
            url.push_str(&urlencoding::encode(&Self::target_expression(query)));
        }
        url
    }

    fn map_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Request(err)
        }
    }
}

/// Parses a render response, converting timestamps to milliseconds.
fn parse_render_response(body: &str) -> Result<Vec<MetricSeries>, BackendError> {
    let series: Vec<GraphiteSeries> =
        serde_json::from_str(body).map_err(|e| BackendError::Malformed(e.to_string()))?;

    Ok(series
        .into_iter()
        .map(|s| {
            let datapoints = s
                .datapoints
                .into_iter()
                .map(|(value, time)| RawDatapoint::new(value, time.map(|t| t.saturating_mul(1000))))
                .collect();
            MetricSeries::new(s.target, datapoints)
        })
        .collect())
}

#[async_trait]
impl MetricsBackend for GraphiteBackend {
    async fn fetch(&self, request: &MetricsRequest) -> Result<Vec<MetricSeries>, BackendError> {
        let url = self.build_render_url(request);
        tracing::debug!("Executing Graphite render request: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_error(e))?;
        let series = parse_render_response(&body)?;

        tracing::debug!(
            "Graphite returned {} series: {:?}",
            series.len(),
            series.iter().map(|s| s.target.as_str()).collect::<Vec<_>>()
        );
        Ok(series)
    }
}
