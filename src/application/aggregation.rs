// Turns filtered datapoints into client payloads, per widget type
use crate::domain::datapoint::Datapoint;
use crate::domain::format::{format_time_ms, format_value};
use crate::domain::metric::Metric;
use serde_json::{Map, Value, json};

/// Cuts every series down to the shortest one so clients never see jagged
/// arrays.
pub fn aggregate_graph(mut series: Vec<Vec<Datapoint>>) -> Vec<Vec<Datapoint>> {
    let length = series.iter().map(Vec::len).min().unwrap_or(0);
    for points in &mut series {
        points.truncate(length);
    }
    series
}

/// `{metric_name: [{x, y}, ...], ...}` in metric order.
pub fn format_graph(metrics: &[Metric], series: &[Vec<Datapoint>]) -> Value {
    let mut payload = Map::new();
    for (metric, points) in metrics.iter().zip(series) {
        let points: Vec<Value> = points.iter().map(|p| json!({"x": p.x, "y": p.y})).collect();
        payload.insert(metric.name.clone(), Value::Array(points));
    }
    Value::Object(payload)
}

/// Picks the previous and latest datapoints, padding with zero-valued points
/// at time 0 when fewer than two are available.
pub fn aggregate_lvalue(datapoints: &[Datapoint]) -> (Datapoint, Datapoint) {
    let zero = Datapoint::new(0, 0.0);
    match datapoints {
        [] => (zero, zero),
        [only] => (zero, *only),
        [.., prev, last] => (*prev, *last),
    }
}

/// `time_range` is in seconds; datapoint times are milliseconds.
pub fn format_lvalue(prev: Datapoint, last: Datapoint, time_range: u64) -> Value {
    let diff = last.y - prev.y;
    let percentage = if prev.y == 0.0 {
        0.0
    } else {
        diff / prev.y * 100.0
    };

    let range_ms = i64::try_from(time_range)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    let to = last.x.saturating_add(range_ms).saturating_sub(1);
    let sign = if diff >= 0.0 { "+" } else { "" };

    json!({
        "lvalue": format_value(last.y),
        "from": format_time_ms(last.x),
        "to": format_time_ms(to),
        "diff": format!("{}{}", sign, format_value(diff)),
        "percentage": format!("{:.0}%", percentage),
    })
}

pub fn format_text(text: &str) -> Value {
    json!({ "text": text })
}
