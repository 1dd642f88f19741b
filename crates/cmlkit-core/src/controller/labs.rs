// ── Lab operations ──
//
// Reads and writes reconcile into the lab cache (when enabled) so that
// every holder of a lab handle sees the latest title, state and nodes.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::Controller;
use crate::convert::lab_request;
use crate::error::CoreError;
use crate::model::{Lab, LabHandle};

impl Controller {
    /// Create a lab from `lab`'s title, description and notes.
    pub async fn lab_create(&self, lab: &Lab) -> Result<LabHandle, CoreError> {
        let created = self.inner.api.create_lab(&lab_request(lab)).await?;
        info!(lab = %created.id, title = %created.title, "lab created");
        Ok(self.inner.cache.reconcile(Lab::from(created)))
    }

    /// Update title, description and notes of the lab with `lab.id`.
    pub async fn lab_update(&self, lab: &Lab) -> Result<LabHandle, CoreError> {
        let updated = self
            .inner
            .api
            .update_lab(&lab.id, &lab_request(lab))
            .await?;
        Ok(self.inner.cache.reconcile(Lab::from(updated)))
    }

    /// Fetch a lab. Shallow reads may be served from the cache; deep
    /// reads always walk the whole lab and refresh the cache entry.
    pub async fn lab_get(&self, id: &str, deep: bool) -> Result<LabHandle, CoreError> {
        if let Some(cached) = self.inner.cache.get_if_cached(id, deep) {
            debug!(lab = id, "lab served from cache");
            return Ok(cached);
        }
        let lab = Lab::from(self.inner.api.get_lab(id).await?);
        if !deep {
            return Ok(self.inner.cache.reconcile(lab));
        }
        let lab = self.assemble_lab(lab).await?;
        Ok(self.inner.cache.reconcile_deep(lab))
    }

    /// Find a lab by title. Shallow results are not cached since they
    /// carry no nodes.
    pub async fn lab_get_by_title(&self, title: &str, deep: bool) -> Result<LabHandle, CoreError> {
        let tiles = self.inner.api.lab_tiles().await?;
        let found = tiles
            .lab_tiles
            .into_values()
            .find(|tile| tile.title == title)
            .ok_or_else(|| CoreError::not_found("lab", title))?;

        let lab = Lab::from(found);
        if !deep {
            return Ok(Arc::new(RwLock::new(lab)));
        }
        let lab = self.assemble_lab(lab).await?;
        Ok(self.inner.cache.reconcile_deep(lab))
    }

    /// Import a topology document and return the resulting lab, fully
    /// populated.
    pub async fn lab_import(&self, topology: &str) -> Result<LabHandle, CoreError> {
        let imported = self.inner.api.import_lab(topology).await?;
        for warning in &imported.warnings {
            warn!(lab = %imported.id, warning = %warning, "import warning");
        }
        self.lab_get(&imported.id, true).await
    }

    pub async fn lab_start(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.inner.api.start_lab(id).await?)
    }

    pub async fn lab_stop(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.inner.api.stop_lab(id).await?)
    }

    pub async fn lab_wipe(&self, id: &str) -> Result<(), CoreError> {
        Ok(self.inner.api.wipe_lab(id).await?)
    }

    /// Delete the lab and drop it from the cache.
    pub async fn lab_destroy(&self, id: &str) -> Result<(), CoreError> {
        let deleted = self.inner.api.delete_lab(id).await.map_err(CoreError::from);
        self.inner.cache.evict(id, deleted)?;
        info!(lab = id, "lab destroyed");
        Ok(())
    }

    /// Whether every node in the lab reached its target state.
    pub async fn lab_has_converged(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.inner.api.lab_converged(id).await?)
    }
}
