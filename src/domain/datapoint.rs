// Time-series datapoints as received from the backend and as sent to clients
use serde::Serialize;

/// A backend datapoint before null handling. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDatapoint {
    pub value: Option<f64>,
    pub timestamp: Option<i64>,
}

impl RawDatapoint {
    pub fn new(value: Option<f64>, timestamp: Option<i64>) -> Self {
        Self { value, timestamp }
    }
}

/// A client-ready datapoint: `x` is epoch milliseconds, `y` the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Datapoint {
    pub x: i64,
    pub y: f64,
}

impl Datapoint {
    pub fn new(x: i64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One series returned by the backend, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub target: String,
    pub datapoints: Vec<RawDatapoint>,
}

impl MetricSeries {
    pub fn new(target: String, datapoints: Vec<RawDatapoint>) -> Self {
        Self { target, datapoints }
    }
}
