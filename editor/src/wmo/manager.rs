use std::{collections::HashMap, sync::Arc};

use log::{debug, error};
use mpq::ArchiveManager;

use crate::EditorResult;

use super::model::{Wmo, WmoModel};

fn normalize_path(path: &str) -> String {
    path.replace('/', "\\").to_lowercase()
}

/// Loads each WMO once and shares it between the instances placing it.
pub struct WmoManager {
    disk_search_path: String,
    wmos: HashMap<String, Arc<dyn WmoModel>>,
}

impl WmoManager {
    pub fn new(disk_search_path: &str) -> Self {
        Self {
            disk_search_path: disk_search_path.to_owned(),
            wmos: HashMap::new(),
        }
    }

    pub fn resolve(
        &mut self,
        path: &str,
        archives: &mut ArchiveManager,
    ) -> EditorResult<Arc<dyn WmoModel>> {
        let key = normalize_path(path);
        if let Some(wmo) = self.wmos.get(&key) {
            return Ok(wmo.clone());
        }

        let wmo: Arc<dyn WmoModel> = match Wmo::load(path, archives, &self.disk_search_path) {
            Ok(wmo) => Arc::new(wmo),
            Err(e) => {
                error!("Unable to load WMO {}: {}", path, e);
                return Err(e);
            }
        };
        debug!("Loaded WMO {} ({} groups)", path, wmo.groups().len());

        self.wmos.insert(key, wmo.clone());
        Ok(wmo)
    }

    /// Registers an already loaded asset under `path`.
    pub fn insert(&mut self, path: &str, wmo: Arc<dyn WmoModel>) {
        self.wmos.insert(normalize_path(path), wmo);
    }

    /// Drops the assets no instance references anymore.
    pub fn purge_unused(&mut self) -> usize {
        let before = self.wmos.len();
        self.wmos.retain(|_, wmo| Arc::strong_count(wmo) > 1);
        before - self.wmos.len()
    }

    pub fn len(&self) -> usize {
        self.wmos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wmos.is_empty()
    }
}
