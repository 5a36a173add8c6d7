//! Static model catalog.
//!
//! Enumeration needs neither a handle nor any I/O; it reads the backend's
//! model registry, which is fixed for the life of the process.

use rigbridge_core::types::{ModelId, ModelInfo};

use crate::config::Bridge;

impl Bridge {
    /// Every model the driver backend supports, ordered by model id.
    pub fn supported_models(&self) -> Vec<ModelInfo> {
        let mut models = self.backend().models();
        models.sort_by_key(|m| m.model_id);
        models
    }

    /// Catalog entry for one model.
    pub fn model_info(&self, model: ModelId) -> Option<ModelInfo> {
        self.backend()
            .models()
            .into_iter()
            .find(|m| m.model_id == model)
    }

    /// Models whose manufacturer matches `manufacturer`, ignoring case.
    pub fn models_by_manufacturer(&self, manufacturer: &str) -> Vec<ModelInfo> {
        self.supported_models()
            .into_iter()
            .filter(|m| m.manufacturer.eq_ignore_ascii_case(manufacturer))
            .collect()
    }
}
