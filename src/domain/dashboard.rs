// Dashboard domain model
use super::config_registry::{ConfigMap, ConfigRegistry, DASHBOARD_KIND, as_map};
use super::error::ConfigError;
use super::interval::interval_from_value;
use super::slug::slugify;
use super::widget::{Widget, WidgetClientConfig};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub name: String,
    pub title: String,
    /// Enables an unlisted public URL when set.
    pub share_id: Option<String>,
    /// Seconds between client refreshes.
    pub request_interval: u64,
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardClientConfig {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_id: Option<String>,
    /// Milliseconds, the client's convention.
    pub request_interval: u64,
    pub widgets: Vec<WidgetClientConfig>,
}

impl Dashboard {
    pub fn from_config(
        raw: &ConfigMap,
        inherited: &ConfigMap,
        registry: &ConfigRegistry,
    ) -> Result<Self, ConfigError> {
        let config = registry.resolve(DASHBOARD_KIND, raw, inherited)?;
        let raw_name = config.get_str("name");
        let entity = format!("dashboard '{}'", raw_name.unwrap_or("<unnamed>"));

        let mut missing = Vec::new();
        if raw_name.is_none() {
            missing.push("name");
        }
        if !config.contains("widgets") {
            missing.push("widgets");
        }
        if !missing.is_empty() {
            return Err(ConfigError::missing(entity, missing));
        }

        let raw_name = raw_name.unwrap_or_default();
        let name = slugify(raw_name);
        if name.is_empty() {
            return Err(ConfigError::invalid(&entity, "name", "name has no usable characters"));
        }
        let title = config.get_str("title").unwrap_or(raw_name).to_string();

        let share_id = match config.get("share_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(_) => return Err(ConfigError::invalid(&entity, "share_id", "expected a string")),
        };

        let request_interval = config
            .get("request_interval")
            .and_then(interval_from_value)
            .ok_or_else(|| ConfigError::invalid(&entity, "request_interval", "expected an interval"))?;

        let raw_widgets: Vec<ConfigMap> = match config.get("widgets") {
            Some(Value::Object(widgets)) => widgets
                .iter()
                .map(|(key, value)| {
                    let mut widget = as_map(value, &entity, key)?.clone();
                    widget
                        .entry("name")
                        .or_insert_with(|| Value::from(key.as_str()));
                    Ok(widget)
                })
                .collect::<Result<_, ConfigError>>()?,
            Some(Value::Array(widgets)) => widgets
                .iter()
                .map(|value| as_map(value, &entity, "widgets").cloned())
                .collect::<Result<_, ConfigError>>()?,
            _ => {
                return Err(ConfigError::invalid(&entity, "widgets", "expected a mapping or a list"));
            }
        };

        let mut seen = HashSet::new();
        let mut widgets = Vec::with_capacity(raw_widgets.len());
        for raw_widget in &raw_widgets {
            let widget = Widget::from_config(raw_widget, &entity, config.defaults(), registry)?;
            if !seen.insert(widget.name.clone()) {
                return Err(ConfigError::DuplicateName {
                    entity,
                    name: widget.name,
                });
            }
            widgets.push(widget);
        }

        Ok(Self {
            name,
            title,
            share_id,
            request_interval,
            widgets,
        })
    }

    pub fn get_widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    pub fn client_config(&self) -> DashboardClientConfig {
        DashboardClientConfig {
            name: self.name.clone(),
            title: self.title.clone(),
            share_id: self.share_id.clone(),
            request_interval: self.request_interval * 1000,
            widgets: self.widgets.iter().map(Widget::client_config).collect(),
        }
    }
}
