// Render service - Resolves a widget and runs fetch, filter, aggregate and format
use crate::application::aggregation::{
    aggregate_graph, aggregate_lvalue, format_graph, format_lvalue, format_text,
};
use crate::application::dashboard_store::DashboardCatalog;
use crate::application::metrics_backend::{MetricsBackend, MetricsRequest, TargetQuery};
use crate::domain::dashboard::Dashboard;
use crate::domain::datapoint::{Datapoint, MetricSeries};
use crate::domain::error::{BackendError, RenderError};
use crate::domain::metric::Metric;
use crate::domain::null_filter::NullFilter;
use crate::domain::widget::{GraphSettings, LValueSettings, Widget, WidgetKind};
use serde_json::Value;
use std::sync::Arc;

/// Payload for render requests naming an unknown dashboard or widget.
pub const EMPTY_PAYLOAD: &str = "{}";

#[derive(Debug)]
enum NotFound {
    Dashboard,
    Widget,
}

#[derive(Clone)]
pub struct RenderService {
    backend: Arc<dyn MetricsBackend>,
}

impl RenderService {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Renders one widget to its JSON payload.
    ///
    /// Unknown dashboards and widgets give `{}`; backend failures are
    /// returned to the caller untouched.
    pub async fn handle_render_request(
        &self,
        catalog: &DashboardCatalog,
        dashboard_name: &str,
        widget_name: &str,
    ) -> Result<String, RenderError> {
        let widget = match resolve(catalog, dashboard_name, widget_name) {
            Ok((_, widget)) => widget,
            Err(missing) => {
                tracing::debug!(
                    "Render request for {}/{} found no {:?}",
                    dashboard_name,
                    widget_name,
                    missing
                );
                return Ok(EMPTY_PAYLOAD.to_string());
            }
        };

        let payload = self.render_widget(widget).await?;
        Ok(payload.to_string())
    }

    pub async fn render_widget(&self, widget: &Widget) -> Result<Value, RenderError> {
        match &widget.kind {
            WidgetKind::Graph(graph) => {
                let series = self.backend.fetch(&graph_request(graph)).await?;
                render_graph(&graph.metrics, &series)
            }
            WidgetKind::LValue(lvalue) => {
                let series = self.backend.fetch(&lvalue_request(lvalue)).await?;
                render_lvalue(widget.null_filter, &series, lvalue.time_range)
            }
            WidgetKind::Text(text) => Ok(format_text(&text.text)),
        }
    }
}

fn resolve<'a>(
    catalog: &'a DashboardCatalog,
    dashboard_name: &str,
    widget_name: &str,
) -> Result<(&'a Dashboard, &'a Widget), NotFound> {
    let dashboard = catalog.get(dashboard_name).ok_or(NotFound::Dashboard)?;
    let widget = dashboard.get_widget(widget_name).ok_or(NotFound::Widget)?;
    Ok((dashboard.as_ref(), widget))
}

fn graph_request(graph: &GraphSettings) -> MetricsRequest {
    MetricsRequest {
        targets: graph
            .metrics
            .iter()
            .map(|m| TargetQuery {
                target: m.target.clone(),
                bucket_size: Some(graph.bucket_size),
            })
            .collect(),
        from_seconds: graph.time_range,
    }
}

/// Two buckets of `time_range` each: the previous window and the latest.
fn lvalue_request(lvalue: &LValueSettings) -> MetricsRequest {
    MetricsRequest {
        targets: vec![TargetQuery {
            target: lvalue.target.clone(),
            bucket_size: Some(lvalue.time_range),
        }],
        from_seconds: lvalue.time_range.saturating_mul(2),
    }
}

/// Series pair with metrics by position, so the backend must answer with
/// exactly one series per metric. An expanded wildcard or an unmatched target
/// is an error.
fn render_graph(metrics: &[Metric], series: &[MetricSeries]) -> Result<Value, RenderError> {
    if series.len() != metrics.len() {
        return Err(BackendError::Malformed(format!(
            "expected one series per metric ({}), got {}",
            metrics.len(),
            series.len()
        ))
        .into());
    }

    let filtered: Vec<Vec<Datapoint>> = metrics
        .iter()
        .zip(series)
        .map(|(metric, s)| metric.null_filter.apply(&s.datapoints))
        .collect();

    Ok(format_graph(metrics, &aggregate_graph(filtered)))
}

/// No series at all renders as zeros; more than one cannot be told apart.
fn render_lvalue(
    null_filter: NullFilter,
    series: &[MetricSeries],
    time_range: u64,
) -> Result<Value, RenderError> {
    if series.len() > 1 {
        return Err(BackendError::Malformed(format!(
            "expected at most one series for a single value, got {}",
            series.len()
        ))
        .into());
    }

    let datapoints = series
        .first()
        .map(|s| null_filter.apply(&s.datapoints))
        .unwrap_or_default();
    if datapoints.len() < 2 {
        tracing::debug!("LValue widget received too few datapoints ({} < 2)", datapoints.len());
    }

    let (prev, last) = aggregate_lvalue(&datapoints);
    Ok(format_lvalue(prev, last, time_range))
}
