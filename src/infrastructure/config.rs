use crate::application::dashboard_store::DashboardCatalog;
use crate::domain::config_registry::{ConfigMap, ConfigRegistry};
use crate::domain::dashboard::Dashboard;
use crate::domain::error::ConfigError;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the settings file, without extension.
pub const SETTINGS_PATH_ENV: &str = "DIAMONDASH_SETTINGS";
const DEFAULT_SETTINGS_PATH: &str = "config/diamondash";

/// Process-wide defaults keyed by kind, inside the config dir.
pub const DEFAULTS_FILENAME: &str = "defaults.yml";
/// Directory of dashboard files, inside the config dir.
pub const DASHBOARDS_DIRNAME: &str = "dashboards";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub dashboards: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub config_dir: PathBuf,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let path = std::env::var(SETTINGS_PATH_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    load_settings_from(&path)
}

/// Built-in defaults, then the optional file at `path`, then `DIAMONDASH__*`
/// environment variables (e.g. `DIAMONDASH__BACKEND__URL`).
pub fn load_settings_from(path: &str) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .set_default("server.bind", "0.0.0.0:8080")?
        .set_default("backend.url", "http://127.0.0.1:8000")?
        .set_default("backend.timeout_secs", 10_i64)?
        .set_default("dashboards.config_dir", "etc/diamondash")?
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("DIAMONDASH")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn read_yaml(path: &Path) -> Result<ConfigMap, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ConfigMap::new()),
        _ => Err(ConfigError::invalid(
            path.display().to_string(),
            "document",
            "expected a mapping at the top level",
        )),
    }
}

/// Reads the kind-keyed defaults file, if there is one.
pub fn load_defaults(config_dir: &Path) -> Result<ConfigMap, ConfigError> {
    let path = config_dir.join(DEFAULTS_FILENAME);
    if !path.exists() {
        return Ok(ConfigMap::new());
    }
    read_yaml(&path)
}

pub fn dashboard_from_file(
    path: &Path,
    defaults: &ConfigMap,
    registry: &ConfigRegistry,
) -> Result<Dashboard, ConfigError> {
    let raw = read_yaml(path)?;
    Dashboard::from_config(&raw, defaults, registry)
}

/// Loads every `*.yml`/`*.yaml` file in `dir`, in file name order. Each file
/// succeeds or fails on its own.
pub fn dashboards_from_dir(
    dir: &Path,
    defaults: &ConfigMap,
    registry: &ConfigRegistry,
) -> Result<Vec<(PathBuf, Result<Dashboard, ConfigError>)>, ConfigError> {
    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yml" | "yaml")
                )
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let dashboard = dashboard_from_file(&path, defaults, registry);
            (path, dashboard)
        })
        .collect())
}

/// Builds the catalog for a config dir. Dashboards that fail to load are
/// logged and left out; the defaults file and the directory itself must be
/// readable.
pub fn load_catalog(config_dir: &Path, registry: &ConfigRegistry) -> Result<DashboardCatalog, ConfigError> {
    let defaults = load_defaults(config_dir)?;
    let dashboards_dir = config_dir.join(DASHBOARDS_DIRNAME);

    let mut catalog = DashboardCatalog::new();
    if !dashboards_dir.is_dir() {
        tracing::warn!("No dashboards directory at {}", dashboards_dir.display());
        return Ok(catalog);
    }

    for (path, dashboard) in dashboards_from_dir(&dashboards_dir, &defaults, registry)? {
        let inserted = dashboard.and_then(|d| catalog.insert(d));
        if let Err(e) = inserted {
            tracing::error!("Skipping dashboard {}: {}", path.display(), e);
        }
    }

    tracing::info!(
        "Loaded {} dashboard(s) from {}",
        catalog.len(),
        dashboards_dir.display()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn config_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let dashboards = tmp.path().join(DASHBOARDS_DIRNAME);
        fs::create_dir(&dashboards).unwrap();

        write(
            tmp.path(),
            DEFAULTS_FILENAME,
            "widget:\n  width: 2\ngraph:\n  time_range: 2h\n",
        );
        write(
            &dashboards,
            "a_ops.yml",
            r#"
name: Ops
share_id: ops-share
defaults:
  graph:
    bucket_size: 5m
widgets:
  load:
    title: Load
    metric: servers.load
"#,
        );
        write(
            &dashboards,
            "b_broken.yml",
            "title: No name here\nwidgets: {}\n",
        );
        write(
            &dashboards,
            "c_duplicate.yaml",
            "name: ops\nwidgets:\n  w:\n    title: W\n    metric: a.b\n",
        );
        write(
            &dashboards,
            "d_sales.yaml",
            "name: Sales\nwidgets:\n  - name: notes\n    title: Notes\n    type: text\n    text: hello\n",
        );
        write(&dashboards, "readme.txt", "not a dashboard");
        tmp
    }

    #[test]
    fn test_dashboards_from_dir_reports_each_file() {
        let tmp = config_dir();
        let registry = ConfigRegistry::builtin().unwrap();
        let defaults = load_defaults(tmp.path()).unwrap();

        let loaded =
            dashboards_from_dir(&tmp.path().join(DASHBOARDS_DIRNAME), &defaults, &registry).unwrap();

        let files: Vec<_> = loaded
            .iter()
            .map(|(path, _)| path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(files, vec!["a_ops.yml", "b_broken.yml", "c_duplicate.yaml", "d_sales.yaml"]);

        assert!(loaded[0].1.is_ok());
        assert!(matches!(
            &loaded[1].1,
            Err(ConfigError::MissingFields { fields, .. }) if fields == &vec!["name".to_string()]
        ));
    }

    #[test]
    fn test_load_catalog_applies_defaults_and_skips_failures() {
        let tmp = config_dir();
        let registry = ConfigRegistry::builtin().unwrap();

        let catalog = load_catalog(tmp.path(), &registry).unwrap();
        let names: Vec<_> = catalog.dashboards().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ops", "sales"]);

        let ops = catalog.get_shared("ops-share").unwrap();
        let load = ops.get_widget("load").unwrap();
        assert_eq!(load.width, 2);
        match &load.kind {
            crate::domain::widget::WidgetKind::Graph(graph) => {
                assert_eq!(graph.time_range, 7200);
                assert_eq!(graph.bucket_size, 300);
            }
            other => panic!("expected a graph, got {other:?}"),
        }
    }

    #[test]
    fn test_file_defaults_override_process_wide_defaults() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), DEFAULTS_FILENAME, "widget:\n  width: 2\n  null_filter: zero\n");
        write(
            tmp.path(),
            "local.yml",
            "name: Local\ndefaults:\n  widget:\n    width: 3\nwidgets:\n  w:\n    title: W\n    metric: a.b\n",
        );
        let registry = ConfigRegistry::builtin().unwrap();
        let defaults = load_defaults(tmp.path()).unwrap();

        let dashboard = dashboard_from_file(&tmp.path().join("local.yml"), &defaults, &registry).unwrap();
        let widget = dashboard.get_widget("w").unwrap();
        assert_eq!(widget.width, 3);
        assert_eq!(widget.null_filter, crate::domain::null_filter::NullFilter::Zero);
    }

    #[test]
    fn test_load_catalog_without_dashboards_dir() {
        let tmp = TempDir::new().unwrap();
        let registry = ConfigRegistry::builtin().unwrap();
        assert!(load_catalog(tmp.path(), &registry).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_and_invalid_files() {
        let tmp = TempDir::new().unwrap();
        let registry = ConfigRegistry::builtin().unwrap();

        let err = dashboard_from_file(&tmp.path().join("missing.yml"), &ConfigMap::new(), &registry)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        write(tmp.path(), "bad.yml", "name: [unclosed\n");
        let err = dashboard_from_file(&tmp.path().join("bad.yml"), &ConfigMap::new(), &registry)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        write(tmp.path(), "list.yml", "- a\n- b\n");
        let err = dashboard_from_file(&tmp.path().join("list.yml"), &ConfigMap::new(), &registry)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn test_load_settings_from_file() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "diamondash.toml",
            "[backend]\nurl = \"http://graphite:8080\"\n\n[dashboards]\nconfig_dir = \"/srv/dash\"\n",
        );

        let path = tmp.path().join("diamondash");
        let settings = load_settings_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.backend.url, "http://graphite:8080");
        assert_eq!(settings.backend.timeout_secs, 10);
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        assert_eq!(settings.dashboards.config_dir, PathBuf::from("/srv/dash"));
    }

    #[test]
    fn test_load_settings_defaults_when_file_is_absent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nothing-here");
        let settings = load_settings_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.backend.url, "http://127.0.0.1:8000");
        assert_eq!(settings.dashboards.config_dir, PathBuf::from("etc/diamondash"));
    }
}
