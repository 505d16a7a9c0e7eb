// Config kinds, default inheritance and the deep-merge rules behind them
use super::error::ConfigError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Ordered option mapping. Insertion order is preserved.
pub type ConfigMap = Map<String, Value>;

pub const BASE_KIND: &str = "base";
pub const DASHBOARD_KIND: &str = "dashboard";
pub const WIDGET_KIND: &str = "widget";
pub const GRAPH_KIND: &str = "graph";
pub const LVALUE_KIND: &str = "lvalue";
pub const TEXT_KIND: &str = "text";
pub const METRIC_KIND: &str = "metric";

/// Key under which a raw config carries its own kind-keyed defaults.
pub const DEFAULTS_KEY: &str = "defaults";

/// Deep-merges `over` onto `base`. Mappings merge key by key, anything else is
/// replaced by `over`. Neither input is modified.
pub fn merge(base: &Value, over: &Value) -> Value {
    match (base, over) {
        (Value::Object(b), Value::Object(o)) => Value::Object(merge_maps(b, o)),
        _ => over.clone(),
    }
}

pub fn merge_maps(base: &ConfigMap, over: &ConfigMap) -> ConfigMap {
    let mut merged = base.clone();
    for (key, value) in over {
        let value = match merged.get(key) {
            Some(existing) => merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

/// Merges two kind-keyed default mappings, kind by kind, with `new` winning.
pub fn merge_defaults(old: &ConfigMap, new: &ConfigMap) -> ConfigMap {
    let empty = Value::Object(ConfigMap::new());
    let mut merged = ConfigMap::new();

    for kind in old.keys().chain(new.keys()) {
        if merged.contains_key(kind) {
            continue;
        }
        let value = merge(old.get(kind).unwrap_or(&empty), new.get(kind).unwrap_or(&empty));
        merged.insert(kind.clone(), value);
    }

    merged
}

#[derive(Debug, Clone)]
pub struct ConfigKind {
    pub key: String,
    pub parent: Option<String>,
    pub defaults: ConfigMap,
}

impl ConfigKind {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            parent: None,
            defaults: ConfigMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_default(mut self, option: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(option.into(), value);
        self
    }
}

/// A resolved config: the kind's effective defaults, then the caller's
/// kind-keyed defaults, then the raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigInstance {
    kind: String,
    items: ConfigMap,
    defaults: ConfigMap,
}

impl ConfigInstance {
    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.get(key)
    }

    /// Returns the option as a string, treating explicit nulls as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.items.get(key).and_then(Value::as_str)
    }

    /// Kind-keyed defaults in effect for this instance, handed down to nested
    /// configs.
    pub fn defaults(&self) -> &ConfigMap {
        &self.defaults
    }
}

impl ConfigInstance {
    pub fn new(kind: impl Into<String>, items: ConfigMap) -> Self {
        Self {
            kind: kind.into(),
            items,
            defaults: ConfigMap::new(),
        }
    }

    #[allow(dead_code)]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Administrative override; loading and rendering only read.
    #[allow(dead_code)]
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.items.insert(key.into(), value);
    }

    #[allow(dead_code)]
    pub fn to_value(&self) -> Value {
        Value::Object(self.items.clone())
    }

    #[allow(dead_code)]
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

impl Serialize for ConfigInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    kinds: HashMap<String, ConfigKind>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the dashboard, widget-type and metric kinds.
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        registry.register(ConfigKind::new(BASE_KIND))?;
        registry.register(
            ConfigKind::new(DASHBOARD_KIND)
                .with_parent(BASE_KIND)
                .with_default("request_interval", json!("10s")),
        )?;
        registry.register(
            ConfigKind::new(WIDGET_KIND)
                .with_parent(BASE_KIND)
                .with_default("width", json!(1))
                .with_default("null_filter", json!("skip")),
        )?;
        registry.register(
            ConfigKind::new(GRAPH_KIND)
                .with_parent(WIDGET_KIND)
                .with_default("time_range", json!("1d"))
                .with_default("bucket_size", json!("1h")),
        )?;
        registry.register(
            ConfigKind::new(LVALUE_KIND)
                .with_parent(WIDGET_KIND)
                .with_default("time_range", json!("1d")),
        )?;
        registry.register(ConfigKind::new(TEXT_KIND).with_parent(WIDGET_KIND))?;
        // Metrics take their null filter from the owning widget unless
        // configured otherwise.
        registry.register(ConfigKind::new(METRIC_KIND).with_parent(BASE_KIND))?;

        Ok(registry)
    }

    /// Adds a kind. Its parent, if any, must already be registered, which also
    /// rules out ancestry cycles.
    pub fn register(&mut self, kind: ConfigKind) -> Result<(), ConfigError> {
        if self.kinds.contains_key(&kind.key) {
            return Err(ConfigError::DuplicateKind(kind.key));
        }
        if let Some(parent) = &kind.parent {
            if !self.kinds.contains_key(parent) {
                return Err(ConfigError::UnknownKind(parent.clone()));
            }
        }

        tracing::debug!("Registered config kind {}", kind.key);
        self.kinds.insert(kind.key.clone(), kind);
        Ok(())
    }

    /// The kind and its ancestors, root first.
    pub fn ancestry(&self, key: &str) -> Result<Vec<&ConfigKind>, ConfigError> {
        let mut chain = Vec::new();
        let mut current = Some(key);

        while let Some(k) = current {
            let kind = self
                .kinds
                .get(k)
                .ok_or_else(|| ConfigError::UnknownKind(k.to_string()))?;
            chain.push(kind);
            current = kind.parent.as_deref();
        }

        chain.reverse();
        Ok(chain)
    }

    pub fn effective_defaults(&self, key: &str) -> Result<ConfigMap, ConfigError> {
        Ok(self
            .ancestry(key)?
            .into_iter()
            .fold(ConfigMap::new(), |acc, kind| merge_maps(&acc, &kind.defaults)))
    }

    /// Resolves `raw` as an instance of kind `key`.
    ///
    /// `inherited` holds kind-keyed defaults from the enclosing scope; a
    /// `defaults` mapping inside `raw` is merged over it. Defaults for every
    /// kind in the ancestry apply, root first.
    pub fn resolve(
        &self,
        key: &str,
        raw: &ConfigMap,
        inherited: &ConfigMap,
    ) -> Result<ConfigInstance, ConfigError> {
        let chain = self.ancestry(key)?;

        let defaults = match raw.get(DEFAULTS_KEY) {
            Some(Value::Object(local)) => merge_defaults(inherited, local),
            Some(Value::Null) | None => inherited.clone(),
            Some(_) => {
                return Err(ConfigError::invalid(
                    format!("{} config", key),
                    DEFAULTS_KEY,
                    "expected a mapping of kind to options",
                ));
            }
        };

        let mut items = self.effective_defaults(key)?;
        for kind in &chain {
            if let Some(Value::Object(scoped)) = defaults.get(&kind.key) {
                items = merge_maps(&items, scoped);
            }
        }

        let mut own = raw.clone();
        own.remove(DEFAULTS_KEY);
        items = merge_maps(&items, &own);

        let mut instance = ConfigInstance::new(key, items);
        instance.defaults = defaults;
        Ok(instance)
    }
}

/// Borrows `value` as a mapping, for callers that accept nested configs.
pub fn as_map<'a>(value: &'a Value, entity: &str, field: &str) -> Result<&'a ConfigMap, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| ConfigError::invalid(entity, field, "expected a mapping"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(value: Value) -> ConfigMap {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn toy_registry() -> ConfigRegistry {
        let mut registry = ConfigRegistry::new();
        registry
            .register(ConfigKind::new("toy").with_default("foo", json!("bar")))
            .unwrap();
        registry
            .register(
                ConfigKind::new("toy_a")
                    .with_parent("toy")
                    .with_default("spam", json!("ham")),
            )
            .unwrap();
        registry
            .register(
                ConfigKind::new("toy_b")
                    .with_parent("toy")
                    .with_default("foo", json!("larp")),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_defaults_inheritance() {
        let registry = toy_registry();
        assert_eq!(
            registry.effective_defaults("toy_a").unwrap(),
            obj(json!({"foo": "bar", "spam": "ham"}))
        );
        assert_eq!(
            registry.effective_defaults("toy_b").unwrap(),
            obj(json!({"foo": "larp"}))
        );
        // the parent is untouched by its children
        assert_eq!(registry.effective_defaults("toy").unwrap(), obj(json!({"foo": "bar"})));
    }

    #[test]
    fn test_effective_defaults_follow_ancestry_order() {
        let mut registry = ConfigRegistry::new();
        let a = obj(json!({"x": 1, "nested": {"p": 1, "q": 1}}));
        let b = obj(json!({"y": 2, "nested": {"q": 2}}));
        let k = obj(json!({"x": 3, "nested": {"r": 3}}));

        let mut kind_a = ConfigKind::new("a");
        kind_a.defaults = a.clone();
        let mut kind_b = ConfigKind::new("b").with_parent("a");
        kind_b.defaults = b.clone();
        let mut kind_k = ConfigKind::new("k").with_parent("b");
        kind_k.defaults = k.clone();
        registry.register(kind_a).unwrap();
        registry.register(kind_b).unwrap();
        registry.register(kind_k).unwrap();

        let expected = merge_maps(&merge_maps(&a, &b), &k);
        assert_eq!(registry.effective_defaults("k").unwrap(), expected);
        assert_eq!(
            Value::Object(expected),
            json!({"x": 3, "nested": {"p": 1, "q": 2, "r": 3}, "y": 2})
        );
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = toy_registry();
        let err = registry.register(ConfigKind::new("toy")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKind(k) if k == "toy"));
    }

    #[test]
    fn test_register_requires_known_parent() {
        let mut registry = ConfigRegistry::new();
        let err = registry
            .register(ConfigKind::new("orphan").with_parent("nobody"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind(k) if k == "nobody"));
    }

    #[test]
    fn test_unknown_kind_lookup_fails() {
        let registry = toy_registry();
        assert!(matches!(
            registry.effective_defaults("pie"),
            Err(ConfigError::UnknownKind(_))
        ));
        assert!(matches!(
            registry.resolve("pie", &ConfigMap::new(), &ConfigMap::new()),
            Err(ConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_merge_keeps_base_only_keys() {
        let base = json!({"a": 1, "n": {"x": 1, "y": 1}});
        let over = json!({"b": 2, "n": {"y": 2}});
        assert_eq!(
            merge(&base, &over),
            json!({"a": 1, "n": {"x": 1, "y": 2}, "b": 2})
        );
        assert_eq!(merge(&json!({"a": 1}), &json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_merge_defaults() {
        let old = obj(json!({"toy": {"foo": "bar", "n": {"a": 1}}, "other": {"k": 1}}));
        let new = obj(json!({"toy": {"baz": "qux", "n": {"b": 2}}, "late": {"z": 0}}));

        assert_eq!(
            Value::Object(merge_defaults(&old, &new)),
            json!({
                "toy": {"foo": "bar", "n": {"a": 1, "b": 2}, "baz": "qux"},
                "other": {"k": 1},
                "late": {"z": 0},
            })
        );

        assert_eq!(old, obj(json!({"toy": {"foo": "bar", "n": {"a": 1}}, "other": {"k": 1}})));
        assert_eq!(new, obj(json!({"toy": {"baz": "qux", "n": {"b": 2}}, "late": {"z": 0}})));
    }

    #[test]
    fn test_resolve_layers_defaults() {
        let registry = toy_registry();
        let inherited = obj(json!({"toy": {"baz": "qux"}, "toy_a": {"spam": "eggs"}}));
        let raw = obj(json!({
            "name": "thing",
            "defaults": {"toy": {"lerp": "larp"}},
        }));

        let config = registry.resolve("toy_a", &raw, &inherited).unwrap();
        assert_eq!(config.kind(), "toy_a");
        assert_eq!(
            config.to_value(),
            json!({
                "foo": "bar",
                "spam": "eggs",
                "baz": "qux",
                "lerp": "larp",
                "name": "thing",
            })
        );
        assert_eq!(
            Value::Object(config.defaults().clone()),
            json!({"toy": {"baz": "qux", "lerp": "larp"}, "toy_a": {"spam": "eggs"}})
        );
    }

    #[test]
    fn test_resolve_starts_from_effective_defaults() {
        let registry = toy_registry();
        let config = registry.resolve("toy_a", &ConfigMap::new(), &ConfigMap::new()).unwrap();
        assert_eq!(config.to_value(), Value::Object(registry.effective_defaults("toy_a").unwrap()));
    }

    #[test]
    fn test_resolve_raw_values_win() {
        let registry = toy_registry();
        let raw = obj(json!({"foo": "mine", "defaults": {"toy": {"foo": "scoped"}}}));
        let config = registry.resolve("toy", &raw, &ConfigMap::new()).unwrap();
        assert_eq!(config.get_str("foo"), Some("mine"));
        assert!(!config.contains("defaults"));
    }

    #[test]
    fn test_resolve_rejects_non_mapping_defaults() {
        let registry = toy_registry();
        let raw = obj(json!({"defaults": 3}));
        assert!(matches!(
            registry.resolve("toy", &raw, &ConfigMap::new()),
            Err(ConfigError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_instance_access_and_serialization() {
        let mut config = ConfigInstance::new("toy", ConfigMap::new());
        assert!(!config.contains("foo"));
        config.set("foo", json!("bar"));
        config.set("baz", ConfigInstance::new("toy", obj(json!({"lerp": "larp"}))).to_value());

        assert_eq!(config.get_str("foo"), Some("bar"));
        assert_eq!(config.to_json(), r#"{"foo":"bar","baz":{"lerp":"larp"}}"#);
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"foo": "bar", "baz": {"lerp": "larp"}})
        );
    }

    #[test]
    fn test_builtin_kinds() {
        let registry = ConfigRegistry::builtin().unwrap();
        assert_eq!(
            registry.effective_defaults(GRAPH_KIND).unwrap(),
            obj(json!({
                "width": 1,
                "null_filter": "skip",
                "time_range": "1d",
                "bucket_size": "1h",
            }))
        );
        assert_eq!(
            registry
                .ancestry(LVALUE_KIND)
                .unwrap()
                .iter()
                .map(|k| k.key.as_str())
                .collect::<Vec<_>>(),
            vec![BASE_KIND, WIDGET_KIND, LVALUE_KIND]
        );
    }
}
