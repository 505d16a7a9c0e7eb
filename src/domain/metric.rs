// Metric domain model
use super::config_registry::{ConfigMap, ConfigRegistry, METRIC_KIND};
use super::error::ConfigError;
use super::null_filter::NullFilter;
use super::slug::slugify;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub title: String,
    pub target: String,
    pub null_filter: NullFilter,
}

/// The part of a metric the browser gets to see. Targets stay server side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricClientConfig {
    pub name: String,
    pub title: String,
}

impl Metric {
    /// Builds a metric from a target string or a mapping with a `target`.
    ///
    /// `null_filter` is the owning widget's policy, used unless the metric
    /// sets its own.
    pub fn from_config(
        raw: &Value,
        owner: &str,
        null_filter: NullFilter,
        inherited: &ConfigMap,
        registry: &ConfigRegistry,
    ) -> Result<Self, ConfigError> {
        let items = match raw {
            Value::String(target) => {
                let mut items = ConfigMap::new();
                items.insert("target".into(), Value::from(target.as_str()));
                items
            }
            Value::Object(map) => map.clone(),
            _ => {
                return Err(ConfigError::invalid(
                    format!("metric of {}", owner),
                    "metric",
                    "expected a target string or a mapping",
                ));
            }
        };

        let config = registry.resolve(METRIC_KIND, &items, inherited)?;

        let target = match config.get_str("target") {
            Some(target) => target.to_string(),
            None => {
                let label = config.get_str("name").unwrap_or("<unnamed>");
                return Err(ConfigError::missing(
                    format!("metric '{}' of {}", label, owner),
                    vec!["target"],
                ));
            }
        };

        let raw_name = config.get_str("name").unwrap_or(target.as_str()).to_string();
        let name = slugify(&raw_name);
        if name.is_empty() {
            return Err(ConfigError::invalid(
                format!("metric '{}' of {}", raw_name, owner),
                "name",
                "name has no usable characters",
            ));
        }
        let title = config.get_str("title").unwrap_or(raw_name.as_str()).to_string();

        // Own or kind-keyed settings first, then the widget's policy.
        let null_filter = match config.get_str("null_filter") {
            Some(filter_name) => {
                if !NullFilter::is_known(filter_name) {
                    tracing::warn!(
                        "Unknown null filter '{}' on metric '{}' of {}, using zero",
                        filter_name,
                        name,
                        owner
                    );
                }
                NullFilter::from_name(filter_name)
            }
            None => null_filter,
        };

        Ok(Self {
            name,
            title,
            target,
            null_filter,
        })
    }

    pub fn client_config(&self) -> MetricClientConfig {
        MetricClientConfig {
            name: self.name.clone(),
            title: self.title.clone(),
        }
    }
}
