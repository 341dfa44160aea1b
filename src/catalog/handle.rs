//! Host-owned catalog handle.
//!
//! The catalog is rebuilt only when settings change. Requests take a cheap
//! `Arc` snapshot at start and never observe a rebuild midway.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::categories::{configuration_changed, CategoryCatalog};
use crate::config::settings::Settings;

#[derive(Debug)]
struct Snapshot {
    fingerprint: String,
    catalog: Arc<CategoryCatalog>,
}

/// Current catalog plus the fingerprint of the settings it was built from.
#[derive(Debug)]
pub struct CatalogHandle {
    current: RwLock<Snapshot>,
}

impl CatalogHandle {
    pub fn new(settings: &Settings) -> Self {
        Self {
            current: RwLock::new(Snapshot {
                fingerprint: settings.fingerprint(),
                catalog: Arc::new(configuration_changed(settings)),
            }),
        }
    }

    /// Catalog for the request about to be served.
    pub fn snapshot(&self) -> Arc<CategoryCatalog> {
        Arc::clone(&self.current.read().catalog)
    }

    /// Fingerprint of the settings behind the current catalog.
    pub fn fingerprint(&self) -> String {
        self.current.read().fingerprint.clone()
    }

    /// Rebuild if the settings differ from the ones last applied.
    ///
    /// Returns `true` when a new catalog was installed.
    pub fn apply(&self, settings: &Settings) -> bool {
        let fingerprint = settings.fingerprint();
        if self.current.read().fingerprint == fingerprint {
            log::debug!("CATALOG_UNCHANGED fingerprint={}", &fingerprint[..12]);
            return false;
        }

        let catalog = Arc::new(configuration_changed(settings));
        let mut current = self.current.write();
        log::info!(
            "CATALOG_REPLACED old={} new={}",
            &current.fingerprint[..12],
            &fingerprint[..12]
        );
        *current = Snapshot {
            fingerprint,
            catalog,
        };
        true
    }
}
