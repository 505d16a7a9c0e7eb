// Widget domain models: graph, single value (lvalue) and static text
use super::config_registry::{
    ConfigInstance, ConfigMap, ConfigRegistry, GRAPH_KIND, LVALUE_KIND, TEXT_KIND,
};
use super::error::ConfigError;
use super::interval::interval_from_value;
use super::metric::{Metric, MetricClientConfig};
use super::null_filter::NullFilter;
use super::slug::slugify;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Widest a widget may be, in dashboard columns.
pub const MAX_COLUMN_SPAN: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Graph,
    LValue,
    Text,
}

impl WidgetType {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            GRAPH_KIND => Some(WidgetType::Graph),
            LVALUE_KIND => Some(WidgetType::LValue),
            TEXT_KIND => Some(WidgetType::Text),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            WidgetType::Graph => GRAPH_KIND,
            WidgetType::LValue => LVALUE_KIND,
            WidgetType::Text => TEXT_KIND,
        }
    }

    pub fn max_column_span(&self) -> u32 {
        match self {
            WidgetType::Graph => MAX_COLUMN_SPAN,
            WidgetType::LValue | WidgetType::Text => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphSettings {
    pub metrics: Vec<Metric>,
    /// Seconds of history to show.
    pub time_range: u64,
    /// Seconds per backend bucket.
    pub bucket_size: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LValueSettings {
    pub target: String,
    pub time_range: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSettings {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    Graph(GraphSettings),
    LValue(LValueSettings),
    Text(TextSettings),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub name: String,
    pub title: String,
    pub width: u32,
    pub null_filter: NullFilter,
    pub kind: WidgetKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetClientConfig {
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub width: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<MetricClientConfig>,
}

/// Reads a width as an integer and clamps it to `[1, max]`.
pub fn parse_width(value: &Value, max: u32, entity: &str) -> Result<u32, ConfigError> {
    let width = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ConfigError::invalid(entity, "width", "expected an integer"))?;

    Ok(width.clamp(1, i64::from(max)) as u32)
}

fn interval_option(config: &ConfigInstance, field: &str, entity: &str) -> Result<u64, ConfigError> {
    config
        .get(field)
        .and_then(interval_from_value)
        .ok_or_else(|| ConfigError::invalid(entity, field, "expected an interval such as 30, \"5m\" or \"1d\""))
}

impl Widget {
    /// Builds a widget from its raw config. `owner` names the enclosing
    /// dashboard for error messages.
    pub fn from_config(
        raw: &ConfigMap,
        owner: &str,
        inherited: &ConfigMap,
        registry: &ConfigRegistry,
    ) -> Result<Self, ConfigError> {
        let type_key = raw.get("type").and_then(Value::as_str).unwrap_or(GRAPH_KIND);
        let widget_type = WidgetType::from_key(type_key)
            .ok_or_else(|| ConfigError::UnknownKind(type_key.to_string()))?;

        let config = registry.resolve(widget_type.key(), raw, inherited)?;
        let raw_name = config.get_str("name");
        let entity = format!("widget '{}' on {}", raw_name.unwrap_or("<unnamed>"), owner);

        let mut missing = Vec::new();
        if raw_name.is_none() {
            missing.push("name");
        }
        if config.get_str("title").is_none() {
            missing.push("title");
        }
        match widget_type {
            WidgetType::Graph if !config.contains("metrics") && !config.contains("metric") => {
                missing.push("metrics");
            }
            WidgetType::LValue if !config.contains("target") && !config.contains("metric") => {
                missing.push("target");
            }
            WidgetType::Text if !config.contains("text") => missing.push("text"),
            _ => {}
        }
        if !missing.is_empty() {
            return Err(ConfigError::missing(entity, missing));
        }

        let name = slugify(raw_name.unwrap_or_default());
        if name.is_empty() {
            return Err(ConfigError::invalid(&entity, "name", "name has no usable characters"));
        }
        let title = config.get_str("title").unwrap_or_default().to_string();

        let width = match config.get("width") {
            Some(value) => parse_width(value, widget_type.max_column_span(), &entity)?,
            None => 1,
        };

        let filter_name = config.get_str("null_filter").unwrap_or("skip");
        if !NullFilter::is_known(filter_name) {
            tracing::warn!("Unknown null filter '{}' on {}, using zero", filter_name, entity);
        }
        let null_filter = NullFilter::from_name(filter_name);

        let kind = match widget_type {
            WidgetType::Graph => WidgetKind::Graph(GraphSettings {
                metrics: Self::parse_metrics(&config, &entity, null_filter, registry)?,
                time_range: interval_option(&config, "time_range", &entity)?,
                bucket_size: interval_option(&config, "bucket_size", &entity)?,
            }),
            WidgetType::LValue => WidgetKind::LValue(LValueSettings {
                target: Self::parse_target(&config, &entity)?,
                time_range: interval_option(&config, "time_range", &entity)?,
            }),
            WidgetType::Text => WidgetKind::Text(TextSettings {
                text: config
                    .get_str("text")
                    .ok_or_else(|| ConfigError::invalid(&entity, "text", "expected a string"))?
                    .to_string(),
            }),
        };

        Ok(Self {
            name,
            title,
            width,
            null_filter,
            kind,
        })
    }

    fn parse_metrics(
        config: &ConfigInstance,
        entity: &str,
        null_filter: NullFilter,
        registry: &ConfigRegistry,
    ) -> Result<Vec<Metric>, ConfigError> {
        // Mapping entries take their name from the key unless they set one.
        let raws: Vec<Value> = match (config.get("metrics"), config.get("metric")) {
            (Some(Value::Array(items)), _) => items.clone(),
            (Some(Value::Object(map)), _) => map
                .iter()
                .map(|(key, value)| match value {
                    Value::Object(m) => {
                        let mut m = m.clone();
                        m.entry("name").or_insert_with(|| Value::from(key.as_str()));
                        Value::Object(m)
                    }
                    Value::String(target) => {
                        serde_json::json!({"name": key, "target": target})
                    }
                    other => other.clone(),
                })
                .collect(),
            (Some(_), _) => {
                return Err(ConfigError::invalid(entity, "metrics", "expected a list or a mapping"));
            }
            (None, Some(single)) => vec![single.clone()],
            (None, None) => Vec::new(),
        };

        if raws.is_empty() {
            return Err(ConfigError::missing(entity, vec!["metrics"]));
        }

        let mut seen = HashSet::new();
        let mut metrics = Vec::with_capacity(raws.len());
        for raw in &raws {
            let metric = Metric::from_config(raw, entity, null_filter, config.defaults(), registry)?;
            if !seen.insert(metric.name.clone()) {
                return Err(ConfigError::DuplicateName {
                    entity: entity.to_string(),
                    name: metric.name,
                });
            }
            metrics.push(metric);
        }

        Ok(metrics)
    }

    fn parse_target(config: &ConfigInstance, entity: &str) -> Result<String, ConfigError> {
        let target = match (config.get("target"), config.get("metric")) {
            (Some(value), _) => value.as_str(),
            (None, Some(Value::Object(metric))) => metric.get("target").and_then(Value::as_str),
            (None, Some(value)) => value.as_str(),
            (None, None) => None,
        };

        target
            .map(str::to_string)
            .ok_or_else(|| ConfigError::missing(entity, vec!["target"]))
    }

    pub fn widget_type(&self) -> WidgetType {
        match self.kind {
            WidgetKind::Graph(_) => WidgetType::Graph,
            WidgetKind::LValue(_) => WidgetType::LValue,
            WidgetKind::Text(_) => WidgetType::Text,
        }
    }

    pub fn client_config(&self) -> WidgetClientConfig {
        let metrics = match &self.kind {
            WidgetKind::Graph(graph) => graph.metrics.iter().map(Metric::client_config).collect(),
            _ => Vec::new(),
        };

        WidgetClientConfig {
            name: self.name.clone(),
            title: self.title.clone(),
            widget_type: self.widget_type(),
            width: self.width,
            metrics,
        }
    }
}
