// Loaded dashboards, looked up by name or share id, swapped whole on reload
use crate::domain::dashboard::Dashboard;
use crate::domain::error::ConfigError;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only set of dashboards in load order.
#[derive(Debug, Default)]
pub struct DashboardCatalog {
    dashboards: Vec<Arc<Dashboard>>,
    by_name: HashMap<String, usize>,
    by_share_id: HashMap<String, usize>,
}

impl DashboardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dashboard. A name or share id already in use rejects the
    /// newcomer and leaves the catalog unchanged.
    pub fn insert(&mut self, dashboard: Dashboard) -> Result<(), ConfigError> {
        if self.by_name.contains_key(&dashboard.name) {
            return Err(ConfigError::DuplicateName {
                entity: "dashboards".to_string(),
                name: dashboard.name,
            });
        }
        if let Some(share_id) = &dashboard.share_id {
            if self.by_share_id.contains_key(share_id) {
                return Err(ConfigError::DuplicateName {
                    entity: format!("share id of dashboard '{}'", dashboard.name),
                    name: share_id.clone(),
                });
            }
        }

        let index = self.dashboards.len();
        self.by_name.insert(dashboard.name.clone(), index);
        if let Some(share_id) = &dashboard.share_id {
            self.by_share_id.insert(share_id.clone(), index);
        }
        self.dashboards.push(Arc::new(dashboard));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Dashboard>> {
        self.by_name.get(name).map(|&i| &self.dashboards[i])
    }

    pub fn get_shared(&self, share_id: &str) -> Option<&Arc<Dashboard>> {
        self.by_share_id.get(share_id).map(|&i| &self.dashboards[i])
    }

    pub fn dashboards(&self) -> &[Arc<Dashboard>] {
        &self.dashboards
    }

    pub fn len(&self) -> usize {
        self.dashboards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dashboards.is_empty()
    }
}

/// Holds the current catalog. Readers take a snapshot and keep it for the
/// whole request; a reload replaces the catalog in one step.
#[derive(Debug, Default)]
pub struct DashboardStore {
    current: ArcSwap<DashboardCatalog>,
}

impl DashboardStore {
    pub fn new(catalog: DashboardCatalog) -> Self {
        Self {
            current: ArcSwap::from_pointee(catalog),
        }
    }

    pub fn snapshot(&self) -> Arc<DashboardCatalog> {
        self.current.load_full()
    }

    pub fn replace(&self, catalog: DashboardCatalog) {
        self.current.store(Arc::new(catalog));
    }
}
