// Backend trait for time-series data access
use crate::domain::datapoint::MetricSeries;
use crate::domain::error::BackendError;
use async_trait::async_trait;

/// One target to fetch, optionally bucketed server side.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetQuery {
    pub target: String,
    /// Seconds per bucket.
    pub bucket_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRequest {
    pub targets: Vec<TargetQuery>,
    /// How far back from now to fetch, in seconds.
    pub from_seconds: u64,
}

#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Fetch one series per requested target, in request order.
    ///
    /// Timestamps in the returned datapoints are epoch milliseconds.
    async fn fetch(&self, request: &MetricsRequest) -> Result<Vec<MetricSeries>, BackendError>;
}
